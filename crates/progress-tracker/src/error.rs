use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("no tracker registered for session {session_id}, step {step_id:?}")]
    NotFound { session_id: uuid::Uuid, step_id: Option<String> },
}
