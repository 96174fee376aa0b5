use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthGateError {
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("user account disabled")]
    UserDisabled,
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    TokenExpired,
    #[error("API key disabled")]
    ApiKeyDisabled,
    #[error("API key expired")]
    ApiKeyExpired,
    #[error("unknown API key")]
    UnknownApiKey,
    #[error("missing credentials")]
    MissingCredentials,
    #[error("insufficient scope: requires {0}")]
    InsufficientScope(String),
    #[error("tenant mismatch: caller cannot access this resource")]
    TenantMismatch,
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
    #[error("internal auth error: {0}")]
    Internal(String),
}
