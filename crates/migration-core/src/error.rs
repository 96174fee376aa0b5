use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Severity of an [`ErrorInfo`], mirroring the Python original's
/// `ErrorSeverity` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    Info,
    Warning,
    High,
    Critical,
}

/// Structured error attached to a failed step or session (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
    pub severity: ErrorSeverity,
    pub component: String,
    pub step_id: Option<String>,
    pub retry_possible: bool,
    pub rollback_required: bool,
    pub remediation_steps: Vec<String>,
    pub documentation_links: Vec<String>,
}

impl ErrorInfo {
    pub fn new(code: impl Into<String>, message: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            severity: ErrorSeverity::High,
            component: component.into(),
            step_id: None,
            retry_possible: false,
            rollback_required: false,
            remediation_steps: Vec::new(),
            documentation_links: Vec::new(),
        }
    }

    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_step(mut self, step_id: impl Into<String>) -> Self {
        self.step_id = Some(step_id.into());
        self
    }

    pub fn with_rollback_required(mut self, required: bool) -> Self {
        self.rollback_required = required;
        self
    }
}

/// Errors surfaced by `migration-core` (config validation, store lookups,
/// step-graph construction). Stage-scoped collaborator errors
/// (TransferError, DatabaseError, …) live in `migration-orchestrator`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("session not found: {0}")]
    SessionNotFound(uuid::Uuid),

    #[error("circular dependency detected involving step {step_id}")]
    CircularDependency { step_id: String },

    #[error("unknown step dependency: {0} references undefined step {1}")]
    UnknownDependency(String, String),

    #[error("invalid session state: expected {expected}, found {actual}")]
    InvalidState { expected: String, actual: String },

    #[error("configuration error: {0}")]
    Configuration(String),
}
