//! In-memory collaborator doubles, grounded on `tests/test_end_to_end.py`'s
//! mock collaborators. Used by this crate's own tests and available to
//! callers (e.g. `control-api`) that want a working demo stack without a
//! production transfer/database backend.

use crate::collaborators::{
    BackupManager, Collaborators, CollaboratorError, DatabaseMigrationFactory, DatabaseMigrator, TransferMethod,
    TransferMethodFactory, ValidationEngine, ValidationPhase,
};
use async_trait::async_trait;
use migration_core::{BackupRecord, BackupType, DatabaseConfig, MigrationConfig, MigrationOptions, TransferConfig, TransferMethodKind, ValidationResult};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub struct NoopValidationEngine {
    pub can_proceed: bool,
}

impl Default for NoopValidationEngine {
    fn default() -> Self {
        Self { can_proceed: true }
    }
}

#[async_trait]
impl ValidationEngine for NoopValidationEngine {
    async fn validate(&self, _config: &MigrationConfig, _phase: ValidationPhase) -> Result<ValidationResult, CollaboratorError> {
        Ok(ValidationResult {
            can_proceed: self.can_proceed,
            total_checks: 1,
            passed: if self.can_proceed { 1 } else { 0 },
            failed: if self.can_proceed { 0 } else { 1 },
            warnings: 0,
            warning_issues: Vec::new(),
            critical_issues: Vec::new(),
            estimated_fix_time_text: None,
        })
    }
}

#[derive(Default)]
pub struct NoopBackupManager;

#[async_trait]
impl BackupManager for NoopBackupManager {
    async fn create_full_system_backup(
        &self,
        _config: &MigrationConfig,
        _options: &MigrationOptions,
    ) -> Result<Vec<BackupRecord>, CollaboratorError> {
        Ok(vec![BackupRecord::new(BackupType::Full, 1024, "memory://noop-backup")])
    }
}

/// Records every restored backup id so tests can assert rollback ran
/// exactly once per `BackupRecord` (spec.md §8 scenario 2).
#[derive(Clone, Default)]
pub struct RecordingRollbackManager {
    pub restored: Arc<Mutex<Vec<Uuid>>>,
}

#[async_trait]
impl crate::collaborators::RollbackManager for RecordingRollbackManager {
    async fn restore(&self, record: &BackupRecord) -> Result<(), CollaboratorError> {
        self.restored.lock().unwrap().push(record.id);
        Ok(())
    }
}

pub struct NoopTransferMethod;

#[async_trait]
impl TransferMethod for NoopTransferMethod {
    async fn transfer_files(
        &self,
        _source_root: &str,
        _destination_root: &str,
        _options: &MigrationOptions,
        _cancellation: CancellationToken,
    ) -> Result<u64, CollaboratorError> {
        Ok(0)
    }
}

pub struct FailingTransferMethod {
    pub message: String,
}

#[async_trait]
impl TransferMethod for FailingTransferMethod {
    async fn transfer_files(
        &self,
        _source_root: &str,
        _destination_root: &str,
        _options: &MigrationOptions,
        _cancellation: CancellationToken,
    ) -> Result<u64, CollaboratorError> {
        Err(CollaboratorError::new(self.message.clone()))
    }
}

/// Blocks until cancelled, matching a real transfer method that should
/// observe cooperative cancellation rather than run to completion
/// (spec.md §8 scenario 3).
pub struct CancellableTransferMethod;

#[async_trait]
impl TransferMethod for CancellableTransferMethod {
    async fn transfer_files(
        &self,
        _source_root: &str,
        _destination_root: &str,
        _options: &MigrationOptions,
        cancellation: CancellationToken,
    ) -> Result<u64, CollaboratorError> {
        cancellation.cancelled().await;
        Err(CollaboratorError::new("transfer cancelled"))
    }
}

pub enum TransferBehavior {
    Succeed,
    Fail(String),
    WaitForCancellation,
}

pub struct NoopTransferMethodFactory {
    pub behavior: TransferBehavior,
}

impl Default for NoopTransferMethodFactory {
    fn default() -> Self {
        Self { behavior: TransferBehavior::Succeed }
    }
}

impl TransferMethodFactory for NoopTransferMethodFactory {
    fn create(&self, _method: &TransferMethodKind, _config: &TransferConfig) -> Result<Box<dyn TransferMethod>, CollaboratorError> {
        Ok(match &self.behavior {
            TransferBehavior::Succeed => Box::new(NoopTransferMethod) as Box<dyn TransferMethod>,
            TransferBehavior::Fail(message) => Box::new(FailingTransferMethod { message: message.clone() }),
            TransferBehavior::WaitForCancellation => Box::new(CancellableTransferMethod),
        })
    }
}

#[derive(Default)]
pub struct NoopDatabaseMigrator;

#[async_trait]
impl DatabaseMigrator for NoopDatabaseMigrator {
    async fn migrate(&self, _cancellation: CancellationToken) -> Result<u64, CollaboratorError> {
        Ok(0)
    }
}

#[derive(Default)]
pub struct NoopDatabaseMigrationFactory;

impl DatabaseMigrationFactory for NoopDatabaseMigrationFactory {
    fn create(&self, _source: &DatabaseConfig, _destination: Option<&DatabaseConfig>) -> Result<Box<dyn DatabaseMigrator>, CollaboratorError> {
        Ok(Box::new(NoopDatabaseMigrator))
    }
}

/// An all-succeeding collaborator set, useful as a starting point for
/// tests that only need to override one role.
pub fn noop_collaborators() -> Collaborators {
    Collaborators {
        validation: Arc::new(NoopValidationEngine::default()),
        backup: Arc::new(NoopBackupManager),
        rollback: Arc::new(RecordingRollbackManager::default()),
        transfer_factory: Arc::new(NoopTransferMethodFactory::default()),
        database_factory: Arc::new(NoopDatabaseMigrationFactory),
    }
}
