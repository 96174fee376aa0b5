//! Session driver (spec.md §4.G), grounded on `orchestrator.py`'s
//! `_execute_step`/`_execute_<name>_step` dispatch and
//! `_sort_steps_by_dependencies`. `execute()` runs the whole step walk to
//! completion; callers that want concurrent cancellation (as
//! `control-api` does for `/migrations/{id}/cancel`) spawn it with
//! `tokio::spawn`.

use crate::collaborators::{Collaborators, ValidationPhase};
use crate::error::{configuration_error, OrchestratorError};
use chrono::Utc;
use dashmap::DashMap;
use migration_core::{
    build_steps, ErrorInfo, ErrorSeverity, LogEntry, LogLevel, MigrationConfig, MigrationSession, MigrationStatus,
    ProgressUnit, SessionStore,
};
use performance_monitor::PerformanceMonitor;
use progress_tracker::ProgressTracker;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub struct Orchestrator {
    store: SessionStore,
    collaborators: Collaborators,
    progress: Arc<ProgressTracker>,
    performance: Arc<PerformanceMonitor>,
    cancel_tokens: DashMap<Uuid, CancellationToken>,
}

impl Orchestrator {
    pub fn new(collaborators: Collaborators, progress: Arc<ProgressTracker>, performance: Arc<PerformanceMonitor>) -> Self {
        Self { store: SessionStore::new(), collaborators, progress, performance, cancel_tokens: DashMap::new() }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Exposes the validation collaborator for synchronous pre-creation
    /// validation (spec.md §4.I `POST /validate`), which runs outside any
    /// session's step walk.
    pub fn validation_engine(&self) -> std::sync::Arc<dyn crate::collaborators::ValidationEngine> {
        self.collaborators.validation.clone()
    }

    /// Exposes the progress tracker so callers (e.g. `control-api`'s
    /// `GET /migrations/{id}/status`) can read live metrics alongside the
    /// session snapshot.
    pub fn progress(&self) -> &Arc<ProgressTracker> {
        &self.progress
    }

    pub fn create_session(&self, config: MigrationConfig) -> Result<Uuid, OrchestratorError> {
        let steps = build_steps(&config).map_err(configuration_error)?;
        let mut session = MigrationSession::new(config, steps);
        session.log(LogEntry::new(LogLevel::Info, "session created"));
        Ok(self.store.insert(session))
    }

    pub fn get_session(&self, id: Uuid) -> Result<MigrationSession, OrchestratorError> {
        self.store.get(id).ok_or(OrchestratorError::NotFound(id))
    }

    /// `cancel(session_id)` (spec.md §4.G "Cancellation contract"). A
    /// session that hasn't started executing is cancelled in place; a
    /// running session has its token signalled and is expected to unwind
    /// within `execute()`'s loop.
    pub fn cancel(&self, session_id: Uuid) -> Result<(), OrchestratorError> {
        let session = self.get_session(session_id)?;
        if !matches!(session.status, MigrationStatus::Pending | MigrationStatus::Validating | MigrationStatus::Running) {
            return Err(OrchestratorError::InvalidState {
                expected: "pending, validating, or running".into(),
                actual: format!("{:?}", session.status),
            });
        }

        if let Some(token) = self.cancel_tokens.get(&session_id) {
            token.cancel();
        } else {
            self.store.update(session_id, |s| {
                s.status = MigrationStatus::Cancelled;
                s.log(LogEntry::new(LogLevel::Warning, "cancelled before execution started"));
            })?;
        }
        Ok(())
    }

    pub async fn execute(&self, session_id: Uuid, auto_rollback: bool) -> Result<MigrationSession, OrchestratorError> {
        let session = self.get_session(session_id)?;
        if session.status != MigrationStatus::Pending {
            return Err(OrchestratorError::InvalidState { expected: "pending".into(), actual: format!("{:?}", session.status) });
        }

        if session.steps.is_empty() {
            let now = Utc::now();
            return Ok(self.store.update(session_id, |s| {
                s.status = MigrationStatus::Completed;
                s.started_at = Some(now);
                s.ended_at = Some(now);
                s.log(LogEntry::new(LogLevel::Info, "no steps to execute; completed immediately"));
            })?);
        }

        let config = session.config.clone();
        let step_ids: Vec<String> = session.steps.iter().map(|s| s.id.clone()).collect();

        let token = CancellationToken::new();
        self.cancel_tokens.insert(session_id, token.clone());

        self.store.update(session_id, |s| {
            s.status = MigrationStatus::Running;
            s.started_at = Some(Utc::now());
            s.log(LogEntry::new(LogLevel::Info, "execution started"));
        })?;
        self.progress.start(session_id, None, step_ids.len() as u64, ProgressUnit::Operations, None);

        let mut cancelled = false;
        let mut failure: Option<(String, OrchestratorError)> = None;

        for (index, step_id) in step_ids.iter().enumerate() {
            if token.is_cancelled() {
                cancelled = true;
                self.store.update(session_id, |s| {
                    if let Some(step) = s.step_mut(step_id) {
                        step.cancel();
                    }
                })?;
                break;
            }

            self.store.update(session_id, |s| {
                if let Some(step) = s.step_mut(step_id) {
                    step.start();
                }
                s.current_step_id = Some(step_id.clone());
            })?;
            self.progress.start(session_id, Some(step_id.clone()), 1, ProgressUnit::Operations, None);

            match self.execute_step(session_id, step_id, &config, token.clone()).await {
                Ok(()) => {
                    self.store.update(session_id, |s| {
                        if let Some(step) = s.step_mut(step_id) {
                            step.complete();
                        }
                    })?;
                    let _ = self.progress.complete(session_id, Some(step_id.clone()), None);
                    let _ = self.progress.update(session_id, None, (index + 1) as u64, None, None, Default::default());
                }
                Err(err) if token.is_cancelled() => {
                    cancelled = true;
                    self.store.update(session_id, |s| {
                        if let Some(step) = s.step_mut(step_id) {
                            step.cancel();
                        }
                    })?;
                    let _ = self.progress.cancel(session_id, Some(step_id.clone()), None);
                    let _ = err;
                    break;
                }
                Err(err) => {
                    let error_info = ErrorInfo::new(format!("STEP_FAILED_{}", step_id.to_uppercase()), err.to_string(), "Orchestrator")
                        .with_severity(ErrorSeverity::Critical)
                        .with_step(step_id.clone());
                    self.store.update(session_id, |s| {
                        if let Some(step) = s.step_mut(step_id) {
                            step.fail(error_info.clone());
                        }
                        s.error = Some(error_info.clone());
                    })?;
                    let _ = self.progress.fail(session_id, Some(step_id.clone()), None, Some(err.to_string()));
                    failure = Some((step_id.clone(), err));
                    break;
                }
            }
        }

        self.cancel_tokens.remove(&session_id);

        let mut session = if cancelled {
            let _ = self.progress.cancel(session_id, None, None);
            self.store.update(session_id, |s| {
                s.status = MigrationStatus::Cancelled;
                s.ended_at = Some(Utc::now());
                s.log(LogEntry::new(LogLevel::Warning, "execution cancelled"));
            })?
        } else if let Some((step_id, err)) = failure {
            let _ = self.progress.fail(session_id, None, None, Some(err.to_string()));
            self.store.update(session_id, |s| {
                s.status = MigrationStatus::Failed;
                s.ended_at = Some(Utc::now());
                s.log(LogEntry::new(LogLevel::Error, format!("step {step_id} failed: {err}")));
            })?
        } else {
            let _ = self.progress.complete(session_id, None, None);
            self.store.update(session_id, |s| {
                s.status = MigrationStatus::Completed;
                s.ended_at = Some(Utc::now());
                s.log(LogEntry::new(LogLevel::Info, "execution completed"));
            })?
        };

        let wants_rollback = matches!(session.status, MigrationStatus::Failed | MigrationStatus::Cancelled)
            && auto_rollback
            && session.config.options.rollback_on_failure
            && !session.backups.is_empty();
        if wants_rollback {
            session = self.rollback(session_id).await?;
        }

        self.progress.cleanup_session(session_id);
        self.performance.cleanup_session(session_id);
        Ok(session)
    }

    /// `POST /migrations/{id}/rollback` (spec.md §4.I): the
    /// externally-triggered counterpart to `execute()`'s automatic
    /// rollback-on-failure path. Valid only for a session that has
    /// already reached a terminal failure/cancellation state and holds
    /// at least one backup record; idempotent once `rolled_back`.
    pub async fn rollback_session(&self, session_id: Uuid) -> Result<MigrationSession, OrchestratorError> {
        let session = self.get_session(session_id)?;
        if session.status == MigrationStatus::RolledBack {
            return Ok(session);
        }
        if !matches!(session.status, MigrationStatus::Failed | MigrationStatus::Cancelled) {
            return Err(OrchestratorError::InvalidState { expected: "failed or cancelled".into(), actual: format!("{:?}", session.status) });
        }
        if session.backups.is_empty() {
            return Err(OrchestratorError::Configuration("no backup records to roll back".into()));
        }
        self.rollback(session_id).await
    }

    /// `_rollback` (spec.md §4.G "Rollback contract"): restores every
    /// `BackupRecord` in reverse creation order. A session already
    /// `rolled_back` is left untouched — rollback must be idempotent.
    async fn rollback(&self, session_id: Uuid) -> Result<MigrationSession, OrchestratorError> {
        let session = self.get_session(session_id)?;
        if session.status == MigrationStatus::RolledBack {
            return Ok(session);
        }

        let mut last_error = None;
        for record in session.backups.iter().rev() {
            if let Err(e) = self.collaborators.rollback.restore(record).await {
                last_error = Some(e);
            }
        }

        if let Some(err) = last_error {
            Ok(self.store.update(session_id, |s| {
                s.log(LogEntry::new(LogLevel::Error, format!("rollback failed: {}", err.0)));
            })?)
        } else {
            Ok(self.store.update(session_id, |s| {
                s.status = MigrationStatus::RolledBack;
                s.log(LogEntry::new(LogLevel::Info, "rollback completed"));
            })?)
        }
    }

    async fn execute_step(
        &self,
        session_id: Uuid,
        step_id: &str,
        config: &MigrationConfig,
        cancellation: CancellationToken,
    ) -> Result<(), OrchestratorError> {
        let failed = |message: String| OrchestratorError::StepFailed { step_id: step_id.to_string(), message };

        match step_id {
            "initialize" | "cleanup" | "enable_maintenance" | "disable_maintenance" => Ok(()),

            "validate_pre_migration" => {
                let result = self
                    .collaborators
                    .validation
                    .validate(config, ValidationPhase::Pre)
                    .await
                    .map_err(|e| failed(e.0))?;
                let can_proceed = result.can_proceed;
                self.store.update(session_id, |s| s.validation = Some(result.clone()))?;
                if can_proceed {
                    Ok(())
                } else {
                    Err(failed("pre-migration validation failed".into()))
                }
            }

            "validate_post_migration" => {
                let result = self
                    .collaborators
                    .validation
                    .validate(config, ValidationPhase::Post)
                    .await
                    .map_err(|e| failed(e.0))?;
                let can_proceed = result.can_proceed;
                self.store.update(session_id, |s| s.validation = Some(result.clone()))?;
                if can_proceed {
                    Ok(())
                } else {
                    Err(failed("post-migration validation failed".into()))
                }
            }

            "create_backups" => {
                let records = self
                    .collaborators
                    .backup
                    .create_full_system_backup(config, &config.options)
                    .await
                    .map_err(|e| failed(e.0))?;
                self.store.update(session_id, |s| s.backups.extend(records.clone()))?;
                Ok(())
            }

            "transfer_files" => {
                self.performance.start_transfer_tracking(session_id, Some(step_id.to_string()), 0, 0);
                let transfer = self
                    .collaborators
                    .transfer_factory
                    .create(&config.transfer.method, &config.transfer)
                    .map_err(|e| failed(e.0))?;
                let result = transfer
                    .transfer_files(&config.source.paths.root_path, &config.destination.paths.root_path, &config.options, cancellation)
                    .await;
                let bytes = result.as_ref().ok().copied().unwrap_or(0);
                self.performance.update_transfer_progress(session_id, Some(step_id.to_string()), bytes, 0, u64::from(result.is_err()), 0);
                result.map(|_| ()).map_err(|e| failed(e.0))
            }

            "migrate_database" => {
                self.performance.start_database_tracking(session_id, Some(step_id.to_string()), "migrate".to_string(), 0);
                let source_db = config
                    .source
                    .database
                    .as_ref()
                    .ok_or_else(|| OrchestratorError::Configuration("migrate_database step requires source.database".into()))?;
                let destination_db = config.destination.database.as_ref();
                let migrator = self.collaborators.database_factory.create(source_db, destination_db).map_err(|e| failed(e.0))?;
                let result = migrator.migrate(cancellation).await;
                let records = result.as_ref().ok().copied().unwrap_or(0);
                self.performance.update_database_progress(
                    session_id,
                    Some(step_id.to_string()),
                    records,
                    None,
                    None,
                    None,
                    u64::from(result.is_err()),
                );
                result.map(|_| ()).map_err(|e| failed(e.0))
            }

            other => Err(OrchestratorError::Configuration(format!("unknown step id: {other}"))),
        }
    }
}
