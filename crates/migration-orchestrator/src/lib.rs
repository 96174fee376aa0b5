mod collaborators;
mod error;
mod orchestrator;
pub mod noop;

pub use collaborators::{
    BackupManager, Collaborators, CollaboratorError, DatabaseMigrationFactory, DatabaseMigrator, TransferMethod,
    TransferMethodFactory, ValidationEngine, ValidationPhase,
};
pub use error::OrchestratorError;
pub use orchestrator::Orchestrator;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noop::{noop_collaborators, NoopTransferMethodFactory, NoopValidationEngine, TransferBehavior};
    use migration_core::{
        AuthConfig, DatabaseConfig, MigrationConfig, MigrationOptions, MigrationStatus, PathConfig, StepStatus,
        SystemConfig, SystemVariant, TransferConfig,
    };
    use performance_monitor::{PerformanceMonitor, PerformanceMonitorConfig};
    use progress_tracker::ProgressTracker;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn endpoint(host: &str, with_database: bool) -> SystemConfig {
        SystemConfig {
            variant: SystemVariant::WebCms,
            host: host.into(),
            port: 443,
            auth: AuthConfig::Password { username: "admin".into(), password: "secret".into() },
            paths: PathConfig { root_path: "/var/www/site".into(), ..Default::default() },
            database: if with_database {
                Some(DatabaseConfig {
                    engine: "mysql".into(),
                    host: host.into(),
                    port: 3306,
                    database_name: "app".into(),
                    username: "u".into(),
                    password: "p".into(),
                    ssl_enabled: false,
                })
            } else {
                None
            },
            cloud: None,
            control_panel: None,
        }
    }

    fn sample_config() -> MigrationConfig {
        MigrationConfig {
            name: "wordpress-to-s3".into(),
            source: endpoint("src.example.com", true),
            destination: endpoint("s3.amazonaws.com", true),
            transfer: TransferConfig::default(),
            options: MigrationOptions {
                backup_before: true,
                maintenance_mode: true,
                rollback_on_failure: true,
                ..Default::default()
            },
            tenant_id: None,
            created_by: "tester".into(),
            metadata: HashMap::new(),
        }
    }

    fn test_harness() -> (Arc<ProgressTracker>, Arc<PerformanceMonitor>) {
        let progress = Arc::new(ProgressTracker::default());
        let performance = PerformanceMonitor::new(PerformanceMonitorConfig::default(), Default::default());
        (progress, performance)
    }

    #[tokio::test]
    async fn happy_path_completes_all_nine_steps_in_order() {
        let (progress, performance) = test_harness();
        let orchestrator = Orchestrator::new(noop_collaborators(), progress, performance);

        let session_id = orchestrator.create_session(sample_config()).unwrap();
        let session = orchestrator.execute(session_id, true).await.unwrap();

        assert_eq!(session.status, MigrationStatus::Completed);
        assert!(session.steps.iter().all(|s| s.status == StepStatus::Completed));
        assert!(!session.backups.is_empty());
        let ids: Vec<&str> = session.steps.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "initialize",
                "validate_pre_migration",
                "create_backups",
                "enable_maintenance",
                "transfer_files",
                "migrate_database",
                "validate_post_migration",
                "disable_maintenance",
                "cleanup",
            ]
        );
    }

    #[tokio::test]
    async fn transfer_failure_triggers_rollback() {
        let (progress, performance) = test_harness();
        let mut collaborators = noop_collaborators();
        collaborators.transfer_factory =
            Arc::new(NoopTransferMethodFactory { behavior: TransferBehavior::Fail("network reset".into()) });
        let rollback = crate::noop::RecordingRollbackManager::default();
        collaborators.rollback = Arc::new(rollback.clone());

        let orchestrator = Orchestrator::new(collaborators, progress, performance);
        let session_id = orchestrator.create_session(sample_config()).unwrap();
        let session = orchestrator.execute(session_id, true).await.unwrap();

        assert_eq!(session.status, MigrationStatus::RolledBack);
        let failed_step = session.steps.iter().find(|s| s.id == "transfer_files").unwrap();
        assert_eq!(failed_step.status, StepStatus::Failed);
        assert_eq!(session.error.as_ref().unwrap().code, "STEP_FAILED_TRANSFER_FILES");
        assert_eq!(rollback.restored.lock().unwrap().len(), session.backups.len());
    }

    #[tokio::test]
    async fn cancellation_mid_transfer_rolls_back() {
        let (progress, performance) = test_harness();
        let mut collaborators = noop_collaborators();
        collaborators.transfer_factory = Arc::new(NoopTransferMethodFactory { behavior: TransferBehavior::WaitForCancellation });
        let rollback = crate::noop::RecordingRollbackManager::default();
        collaborators.rollback = Arc::new(rollback.clone());

        let orchestrator = Arc::new(Orchestrator::new(collaborators, progress, performance));
        let session_id = orchestrator.create_session(sample_config()).unwrap();

        let driver = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.execute(session_id, true).await })
        };

        // Give the transfer_files step time to start and block on cancellation.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        orchestrator.cancel(session_id).unwrap();

        let session = driver.await.unwrap().unwrap();
        assert_eq!(session.status, MigrationStatus::RolledBack);
        let transfer_step = session.steps.iter().find(|s| s.id == "transfer_files").unwrap();
        assert_eq!(transfer_step.status, StepStatus::Cancelled);
        assert!(!rollback.restored.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancelling_a_pending_session_skips_execution() {
        let (progress, performance) = test_harness();
        let orchestrator = Orchestrator::new(noop_collaborators(), progress, performance);
        let session_id = orchestrator.create_session(sample_config()).unwrap();

        orchestrator.cancel(session_id).unwrap();
        let session = orchestrator.get_session(session_id).unwrap();
        assert_eq!(session.status, MigrationStatus::Cancelled);

        let err = orchestrator.execute(session_id, true).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn zero_step_session_completes_instantly() {
        let (progress, performance) = test_harness();
        let orchestrator = Orchestrator::new(noop_collaborators(), progress, performance);

        let session = migration_core::MigrationSession::new(sample_config(), vec![]);
        let session_id = orchestrator.store().insert(session);

        let session = orchestrator.execute(session_id, true).await.unwrap();
        assert_eq!(session.status, MigrationStatus::Completed);
        assert!(session.steps.is_empty());
        assert!(session.log.iter().any(|e| e.message.contains("no steps to execute")));
    }

    #[tokio::test]
    async fn migrate_database_step_tolerates_a_databaseless_destination() {
        let (progress, performance) = test_harness();
        let orchestrator = Orchestrator::new(noop_collaborators(), progress, performance);

        let mut config = sample_config();
        config.destination = endpoint("s3.amazonaws.com", false);
        config.destination.variant = SystemVariant::CloudBucket;

        let session_id = orchestrator.create_session(config).unwrap();
        let session = orchestrator.execute(session_id, true).await.unwrap();

        assert_eq!(session.status, MigrationStatus::Completed);
        let db_step = session.steps.iter().find(|s| s.id == "migrate_database").unwrap();
        assert_eq!(db_step.status, StepStatus::Completed);
    }

    #[tokio::test]
    async fn failed_validation_fails_the_session_without_rollback() {
        let (progress, performance) = test_harness();
        let mut collaborators = noop_collaborators();
        collaborators.validation = Arc::new(NoopValidationEngine { can_proceed: false });
        let mut config = sample_config();
        config.options.backup_before = false;

        let orchestrator = Orchestrator::new(collaborators, progress, performance);
        let session_id = orchestrator.create_session(config).unwrap();
        let session = orchestrator.execute(session_id, true).await.unwrap();

        assert_eq!(session.status, MigrationStatus::Failed);
        assert!(session.backups.is_empty());
    }
}
