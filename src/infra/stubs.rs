use anyhow::Result;

use crate::infra::{config::AppConfig, contracts::ConfigAdapter, contracts::TokenStore};

#[derive(Debug, Clone, Default)]
pub struct StubConfigAdapter;

impl ConfigAdapter for StubConfigAdapter {
    fn load(&self) -> Result<AppConfig> {
        Ok(AppConfig::default())
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticTokenStore {
    pub token: Option<String>,
}

impl StaticTokenStore {
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Some(token.to_owned()),
        }
    }
}

impl TokenStore for StaticTokenStore {
    fn token(&self) -> Option<String> {
        self.token.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_config_returns_defaults() {
        let adapter = StubConfigAdapter;
        let config = adapter.load().expect("stub config must load");

        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn static_token_store_returns_its_token() {
        assert_eq!(StaticTokenStore::with_token("t").token().as_deref(), Some("t"));
        assert_eq!(StaticTokenStore::default().token(), None);
    }
}
