use thiserror::Error;

#[derive(Debug, Error)]
pub enum HybridEngineError {
    #[error("io error on {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },

    #[error("native helper call timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("native helper error: {0}")]
    NativeHelper(String),

    #[error("native helper not available")]
    NotAvailable,
}
