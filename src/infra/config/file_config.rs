use serde::Deserialize;

use crate::infra::config::{AppConfig, AuthConfig, LogConfig, ServerConfig, TransportSettings};

#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    pub logging: Option<FileLogConfig>,
    pub server: Option<FileServerConfig>,
    pub transport: Option<FileTransportConfig>,
    pub auth: Option<FileAuthConfig>,
}

impl FileConfig {
    pub fn merge_into(self, config: &mut AppConfig) {
        if let Some(logging) = self.logging {
            logging.merge_into(&mut config.logging);
        }

        if let Some(server) = self.server {
            server.merge_into(&mut config.server);
        }

        if let Some(transport) = self.transport {
            transport.merge_into(&mut config.transport);
        }

        if let Some(auth) = self.auth {
            auth.merge_into(&mut config.auth);
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileLogConfig {
    pub level: Option<String>,
    pub to_file: Option<bool>,
}

impl FileLogConfig {
    fn merge_into(self, config: &mut LogConfig) {
        if let Some(level) = self.level {
            config.level = level;
        }

        if let Some(to_file) = self.to_file {
            config.to_file = to_file;
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileServerConfig {
    pub api_base_url: Option<String>,
    pub ws_base_url: Option<String>,
}

impl FileServerConfig {
    fn merge_into(self, config: &mut ServerConfig) {
        if let Some(api_base_url) = self.api_base_url {
            config.api_base_url = api_base_url;
        }

        if let Some(ws_base_url) = self.ws_base_url {
            config.ws_base_url = ws_base_url;
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileTransportConfig {
    pub reconnect_base_delay_ms: Option<u64>,
    pub max_reconnect_attempts: Option<u32>,
}

impl FileTransportConfig {
    fn merge_into(self, config: &mut TransportSettings) {
        if let Some(delay_ms) = self.reconnect_base_delay_ms {
            config.reconnect_base_delay_ms = delay_ms;
        }

        if let Some(attempts) = self.max_reconnect_attempts {
            config.max_reconnect_attempts = attempts;
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileAuthConfig {
    pub token: Option<String>,
}

impl FileAuthConfig {
    fn merge_into(self, config: &mut AuthConfig) {
        if let Some(token) = self.token.filter(|token| !token.trim().is_empty()) {
            config.token = Some(token);
        }
    }
}
