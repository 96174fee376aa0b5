//! Collaborator contracts (spec.md §6 "External interfaces"). Only the
//! traits and a `NoopCollaborators` test double ship here; concrete
//! transfer/database/backup implementations are explicitly out of scope
//! (spec.md §1 Non-goals).

use async_trait::async_trait;
use migration_core::{
    BackupRecord, DatabaseConfig, MigrationConfig, MigrationOptions, TransferConfig, TransferMethodKind,
    ValidationResult,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationPhase {
    Pre,
    Post,
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct CollaboratorError(pub String);

impl CollaboratorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[async_trait]
pub trait ValidationEngine: Send + Sync {
    async fn validate(&self, config: &MigrationConfig, phase: ValidationPhase) -> Result<ValidationResult, CollaboratorError>;
}

#[async_trait]
pub trait BackupManager: Send + Sync {
    async fn create_full_system_backup(
        &self,
        config: &MigrationConfig,
        options: &MigrationOptions,
    ) -> Result<Vec<BackupRecord>, CollaboratorError>;
}

#[async_trait]
pub trait RollbackManager: Send + Sync {
    async fn restore(&self, record: &BackupRecord) -> Result<(), CollaboratorError>;
}

#[async_trait]
pub trait TransferMethod: Send + Sync {
    async fn transfer_files(
        &self,
        source_root: &str,
        destination_root: &str,
        options: &MigrationOptions,
        cancellation: CancellationToken,
    ) -> Result<u64, CollaboratorError>;
}

pub trait TransferMethodFactory: Send + Sync {
    fn create(&self, method: &TransferMethodKind, config: &TransferConfig) -> Result<Box<dyn TransferMethod>, CollaboratorError>;
}

#[async_trait]
pub trait DatabaseMigrator: Send + Sync {
    async fn migrate(&self, cancellation: CancellationToken) -> Result<u64, CollaboratorError>;
}

pub trait DatabaseMigrationFactory: Send + Sync {
    fn create(&self, source: &DatabaseConfig, destination: Option<&DatabaseConfig>) -> Result<Box<dyn DatabaseMigrator>, CollaboratorError>;
}

/// Bundles one instance of each collaborator role.
pub struct Collaborators {
    pub validation: std::sync::Arc<dyn ValidationEngine>,
    pub backup: std::sync::Arc<dyn BackupManager>,
    pub rollback: std::sync::Arc<dyn RollbackManager>,
    pub transfer_factory: std::sync::Arc<dyn TransferMethodFactory>,
    pub database_factory: std::sync::Arc<dyn DatabaseMigrationFactory>,
}
