//! Session/step data model, the in-memory `SessionStore`, and `StepGraph`
//! construction for the migration control plane.

pub mod backup;
pub mod config;
pub mod error;
pub mod session;
pub mod step;
pub mod step_graph;
pub mod store;

pub use backup::{BackupRecord, BackupType};
pub use config::{
    AuthConfig, CloudConfig, ControlPanelConfig, DatabaseConfig, MigrationConfig, MigrationOptions,
    PathConfig, SystemConfig, SystemVariant, TransferConfig, TransferMethodKind,
};
pub use error::{CoreError, ErrorInfo, ErrorSeverity};
pub use session::{Issue, LogEntry, LogLevel, MigrationSession, MigrationStatus, ValidationResult};
pub use step::{MigrationStep, ProgressInfo, ProgressUnit, StepStatus};
pub use step_graph::build_steps;
pub use store::SessionStore;
