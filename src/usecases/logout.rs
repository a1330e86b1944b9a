use crate::infra::{error::AppError, token_store::LayeredTokenStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutOutcome {
    pub token_removed: bool,
}

/// Stores `token` for later sessions. Blank tokens are rejected.
pub fn login_with_token(tokens: &LayeredTokenStore, token: &str) -> Result<(), AppError> {
    if token.trim().is_empty() {
        return Err(AppError::MissingToken);
    }

    tokens.save(token)
}

pub fn logout(tokens: &LayeredTokenStore) -> Result<LogoutOutcome, AppError> {
    let token_removed = tokens.clear()?;
    tracing::info!(code = "TOKEN_CLEARED", token_removed, "logged out");

    Ok(LogoutOutcome { token_removed })
}
