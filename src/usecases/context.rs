use tracing_appender::non_blocking::WorkerGuard;

use crate::infra::{config::AppConfig, storage_layout::StorageLayout, token_store::LayeredTokenStore};

#[derive(Debug)]
pub struct AppContext {
    pub config: AppConfig,
    pub layout: StorageLayout,
    pub tokens: LayeredTokenStore,
    /// Flushes the file log on drop; kept for the lifetime of the app.
    log_guard: Option<WorkerGuard>,
}

impl AppContext {
    pub fn new(config: AppConfig, layout: StorageLayout) -> Self {
        let tokens = LayeredTokenStore::new(config.auth.token.clone(), layout.token_file());
        Self {
            config,
            layout,
            tokens,
            log_guard: None,
        }
    }

    pub fn keep_log_guard(&mut self, guard: Option<WorkerGuard>) {
        self.log_guard = guard;
    }
}
