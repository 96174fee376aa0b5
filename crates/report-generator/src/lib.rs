mod error;
mod generator;
mod render;
mod sections;
mod types;

pub use error::ReportError;
pub use generator::ReportGenerator;
pub use types::{ReportFormat, ReportInfo, ReportKind, ReportSection, ReportSeverity};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use migration_core::{
        AuthConfig, ErrorInfo, ErrorSeverity, LogEntry, LogLevel, MigrationConfig, MigrationSession,
        MigrationOptions, MigrationStatus, MigrationStep, PathConfig, SystemConfig, SystemVariant,
        TransferConfig, ValidationResult,
    };
    use serde_json::json;
    use std::collections::HashMap;
    use uuid::Uuid;

    fn endpoint(host: &str) -> SystemConfig {
        SystemConfig {
            variant: SystemVariant::WebCms,
            host: host.into(),
            port: 443,
            auth: AuthConfig::Password { username: "admin".into(), password: "secret".into() },
            paths: PathConfig::default(),
            database: None,
            cloud: None,
            control_panel: None,
        }
    }

    fn sample_session() -> MigrationSession {
        let config = MigrationConfig {
            name: "test-migration".into(),
            source: endpoint("old.example.com"),
            destination: endpoint("new.example.com"),
            transfer: TransferConfig::default(),
            options: MigrationOptions::default(),
            tenant_id: None,
            created_by: "tester".into(),
            metadata: HashMap::new(),
        };
        let mut step = MigrationStep::new("backup", "Backup", "Back up the source system", vec![]);
        step.start();
        step.complete();

        let mut session = MigrationSession::new(config, vec![step]);
        session.status = MigrationStatus::Completed;
        session.started_at = Some(Utc::now() - chrono::Duration::seconds(60));
        session.ended_at = Some(Utc::now());
        session.log(LogEntry::new(LogLevel::Info, "started"));
        session
    }

    #[test]
    fn generates_validation_report_with_deterministic_filename() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ReportGenerator::new(dir.path()).unwrap();
        let mut session = sample_session();
        session.validation = Some(ValidationResult {
            can_proceed: true,
            total_checks: 10,
            passed: 9,
            failed: 1,
            warnings: 1,
            estimated_fix_time_text: Some("5 minutes".into()),
            warning_issues: vec![],
            critical_issues: vec![],
        });

        let info = generator.generate_validation_report(&session, ReportFormat::Json, true).unwrap();
        assert_eq!(info.kind, ReportKind::Validation);
        assert!(info.path.exists());
        assert!(info.path.file_name().unwrap().to_str().unwrap().starts_with("validation_"));
        assert!(info.size > 0);
    }

    #[test]
    fn validation_report_on_a_session_without_a_validation_result_errors_instead_of_panicking() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ReportGenerator::new(dir.path()).unwrap();
        let session = sample_session();
        assert!(session.validation.is_none());

        let err = generator.generate_validation_report(&session, ReportFormat::Json, true).unwrap_err();
        assert!(matches!(err, ReportError::MissingValidationResult(id) if id == session.id));
    }

    #[test]
    fn all_four_formats_render_without_panicking() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ReportGenerator::new(dir.path()).unwrap();
        let session = sample_session();

        for format in [ReportFormat::Json, ReportFormat::Html, ReportFormat::Markdown, ReportFormat::Text] {
            let info = generator.generate_summary_report(&session, None, format).unwrap();
            assert!(info.path.exists());
            let contents = std::fs::read_to_string(&info.path).unwrap();
            assert!(!contents.is_empty());
        }
    }

    #[test]
    fn error_report_includes_rollback_and_recovery_options() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ReportGenerator::new(dir.path()).unwrap();
        let mut session = sample_session();
        session.status = MigrationStatus::RolledBack;
        let error = ErrorInfo::new("STEP_FAILED_transfer", "transfer timed out", "transfer")
            .with_severity(ErrorSeverity::Critical);
        let error = ErrorInfo { retry_possible: true, ..error };

        let info = generator.generate_error_report(&session, &error, ReportFormat::Json, true).unwrap();
        let contents = std::fs::read_to_string(&info.path).unwrap();
        assert!(contents.contains("rollback_performed"));
        assert!(contents.contains("Retry the failed operation"));
    }

    #[test]
    fn performance_report_pulls_nested_metric_groups() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ReportGenerator::new(dir.path()).unwrap();
        let perf = json!({
            "transfer_metrics": {"rate_mbps": 12.5},
            "database_metrics": {"rows_per_second": 900},
            "resource_usage": {"cpu_percent": 55.0, "memory_percent": 40.0},
        });

        let info = generator.generate_performance_report(Uuid::new_v4(), &perf, ReportFormat::Json).unwrap();
        assert_eq!(info.summary.get("peak_cpu_percent").unwrap(), &json!(55.0));
    }

    #[test]
    fn list_reports_filters_by_session_and_kind() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ReportGenerator::new(dir.path()).unwrap();
        let session_a = sample_session();
        let session_b = sample_session();

        generator.generate_summary_report(&session_a, None, ReportFormat::Json).unwrap();
        generator.generate_summary_report(&session_b, None, ReportFormat::Json).unwrap();

        let for_a = generator.list_reports(Some(session_a.id), None);
        assert_eq!(for_a.len(), 1);
        assert_eq!(for_a[0].session_id, Some(session_a.id));

        let all_summaries = generator.list_reports(None, Some(ReportKind::Summary));
        assert_eq!(all_summaries.len(), 2);
    }

    #[test]
    fn cleanup_old_reports_removes_stale_files_and_entries() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ReportGenerator::new(dir.path()).unwrap();
        let session = sample_session();
        let info = generator.generate_summary_report(&session, None, ReportFormat::Json).unwrap();
        assert!(info.path.exists());

        generator.cleanup_old_reports(-1);

        assert!(!info.path.exists());
        assert!(generator.get_report(info.id).is_none());
    }
}
