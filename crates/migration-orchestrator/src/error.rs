use migration_core::CoreError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("session not found: {0}")]
    NotFound(Uuid),

    #[error("invalid session state: expected {expected}, found {actual}")]
    InvalidState { expected: String, actual: String },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("step {step_id} failed: {message}")]
    StepFailed { step_id: String, message: String },

    #[error("no {0} collaborator configured")]
    CollaboratorMissing(&'static str),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Maps step-graph construction failures to the message shape
/// `orchestrator.py` raises `ConfigurationError` with (spec.md §8
/// scenario 4).
pub(crate) fn configuration_error(err: CoreError) -> OrchestratorError {
    match err {
        CoreError::CircularDependency { step_id } => {
            OrchestratorError::Configuration(format!("Circular dependency detected involving step {step_id}"))
        }
        CoreError::UnknownDependency(step, dep) => {
            OrchestratorError::Configuration(format!("step {step} references undefined step {dep}"))
        }
        other => OrchestratorError::Configuration(other.to_string()),
    }
}
