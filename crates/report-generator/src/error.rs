use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("io error writing report to {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },

    #[error("report not found: {0}")]
    NotFound(uuid::Uuid),

    #[error("session {0} has no validation result to report on")]
    MissingValidationResult(uuid::Uuid),
}
