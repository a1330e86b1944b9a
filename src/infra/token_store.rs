use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::infra::{contracts::TokenStore, error::AppError};

pub const TOKEN_ENV: &str = "ROOMCHAT_TOKEN";

/// Resolves the bearer token from, in order: the `ROOMCHAT_TOKEN`
/// environment variable, the `[auth] token` config value and the session
/// token file written by `login`.
#[derive(Debug, Clone)]
pub struct LayeredTokenStore {
    config_token: Option<String>,
    token_file: PathBuf,
}

impl LayeredTokenStore {
    pub fn new(config_token: Option<String>, token_file: PathBuf) -> Self {
        Self {
            config_token,
            token_file,
        }
    }

    pub fn token_file(&self) -> &Path {
        &self.token_file
    }

    pub fn save(&self, token: &str) -> Result<(), AppError> {
        let token_error = |source| AppError::TokenFile {
            path: self.token_file.clone(),
            source,
        };

        if let Some(parent) = self.token_file.parent() {
            fs::create_dir_all(parent).map_err(|source| AppError::StorageDirCreate {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&self.token_file, token.trim()).map_err(token_error)?;
        restrict_permissions(&self.token_file).map_err(token_error)?;

        tracing::info!(code = "TOKEN_SAVED", "session token stored");
        Ok(())
    }

    /// Removes the stored token file. Returns whether a file was removed.
    pub fn clear(&self) -> Result<bool, AppError> {
        match fs::remove_file(&self.token_file) {
            Ok(()) => Ok(true),
            Err(source) if source.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(AppError::TokenFile {
                path: self.token_file.clone(),
                source,
            }),
        }
    }

    fn file_token(&self) -> Option<String> {
        match fs::read_to_string(&self.token_file) {
            Ok(contents) => non_blank(contents),
            Err(error) if error.kind() == ErrorKind::NotFound => None,
            Err(error) => {
                tracing::warn!(
                    code = "TOKEN_FILE_UNREADABLE",
                    path = %self.token_file.display(),
                    error = %error,
                    "ignoring unreadable token file"
                );
                None
            }
        }
    }
}

impl TokenStore for LayeredTokenStore {
    fn token(&self) -> Option<String> {
        std::env::var(TOKEN_ENV)
            .ok()
            .and_then(non_blank)
            .or_else(|| self.config_token.clone().and_then(non_blank))
            .or_else(|| self.file_token())
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
