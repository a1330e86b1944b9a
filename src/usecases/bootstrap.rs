use std::path::Path;

use crate::{
    infra::{
        self, config::FileConfigAdapter, contracts::ConfigAdapter, error::AppError,
        storage_layout::StorageLayout,
    },
    usecases::context::AppContext,
};

pub fn bootstrap(config_path: Option<&Path>) -> Result<AppContext, AppError> {
    let layout = StorageLayout::resolve()?;
    let mut context = build_context(config_path, layout)?;
    context.layout.ensure_dirs()?;

    let guard = infra::logging::init(&context.config.logging, &context.layout.log_dir)?;
    context.keep_log_guard(guard);
    tracing::debug!(
        config_dir = %context.layout.config_dir.display(),
        api = %context.config.server.api_base_url,
        "bootstrap complete"
    );

    Ok(context)
}

fn build_context(config_path: Option<&Path>, layout: StorageLayout) -> Result<AppContext, AppError> {
    let config_adapter = FileConfigAdapter::new(config_path);
    let config = config_adapter.load().map_err(AppError::Other)?;

    Ok(AppContext::new(config, layout))
}
