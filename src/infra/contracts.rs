use anyhow::Result;

use crate::infra::config::AppConfig;

pub trait ConfigAdapter {
    fn load(&self) -> Result<AppConfig>;
}

/// Source of the bearer token used for REST calls and the room socket.
pub trait TokenStore {
    fn token(&self) -> Option<String>;
}
