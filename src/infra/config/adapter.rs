use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::infra::{
    config::{load, AppConfig},
    contracts::ConfigAdapter,
};

pub const API_URL_ENV: &str = "ROOMCHAT_API_URL";
pub const WS_URL_ENV: &str = "ROOMCHAT_WS_URL";

/// Loads `config.toml` (or the given path) and then applies server URL
/// overrides from the environment.
#[derive(Debug, Clone, Default)]
pub struct FileConfigAdapter {
    path: Option<PathBuf>,
}

impl FileConfigAdapter {
    pub fn new(path: Option<&Path>) -> Self {
        Self {
            path: path.map(Path::to_path_buf),
        }
    }
}

impl ConfigAdapter for FileConfigAdapter {
    fn load(&self) -> Result<AppConfig> {
        let mut config = load(self.path.as_deref())?;
        apply_env_overrides(&mut config, |key| std::env::var(key).ok());
        Ok(config)
    }
}

fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(api_url) = non_empty(API_URL_ENV) {
        config.server.api_base_url = api_url;
    }

    if let Some(ws_url) = non_empty(WS_URL_ENV) {
        config.server.ws_base_url = ws_url;
    }
}
