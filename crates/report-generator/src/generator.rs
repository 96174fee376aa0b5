use crate::error::ReportError;
use crate::render;
use crate::sections;
use crate::types::{ReportFormat, ReportInfo, ReportKind, ReportSection, ReportSeverity};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use migration_core::{ErrorInfo, MigrationSession, MigrationStatus, StepStatus};
use serde_json::{json, Value};
use std::path::PathBuf;
use uuid::Uuid;

/// Produces the four report kinds in four serializations and persists
/// them under a configured directory with a deterministic filename
/// (spec.md §4.E), grounded on `report_generator.py`'s `ReportGenerator`.
pub struct ReportGenerator {
    output_directory: PathBuf,
    generated: DashMap<Uuid, ReportInfo>,
}

impl ReportGenerator {
    pub fn new(output_directory: impl Into<PathBuf>) -> Result<Self, ReportError> {
        let output_directory = output_directory.into();
        std::fs::create_dir_all(&output_directory)
            .map_err(|e| ReportError::Io { path: output_directory.display().to_string(), source: e })?;
        Ok(Self { output_directory, generated: DashMap::new() })
    }

    fn filename(&self, kind: ReportKind, session_id: Option<Uuid>, timestamp: DateTime<Utc>, format: ReportFormat) -> PathBuf {
        let session_part = session_id.map(|s| s.to_string()).unwrap_or_else(|| "none".to_string());
        let stamp = timestamp.format("%Y%m%d_%H%M%S");
        self.output_directory.join(format!("{}_{}_{}.{}", kind.as_str(), session_part, stamp, format.extension()))
    }

    fn save(
        &self,
        kind: ReportKind,
        report_id: Uuid,
        session_id: Option<Uuid>,
        timestamp: DateTime<Utc>,
        sections: &[ReportSection],
        format: ReportFormat,
        title: String,
        summary: Value,
    ) -> Result<ReportInfo, ReportError> {
        let body = match format {
            ReportFormat::Json => render::render_json(report_id, kind, session_id, timestamp, sections),
            ReportFormat::Html => render::render_html(kind, session_id, timestamp, sections),
            ReportFormat::Markdown => render::render_markdown(kind, session_id, timestamp, sections),
            ReportFormat::Text => render::render_text(kind, session_id, timestamp, sections),
        };

        let path = self.filename(kind, session_id, timestamp, format);
        std::fs::write(&path, &body).map_err(|e| ReportError::Io { path: path.display().to_string(), source: e })?;
        let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);

        let summary_map = match summary {
            Value::Object(map) => map.into_iter().collect(),
            _ => Default::default(),
        };

        let info = ReportInfo {
            id: report_id,
            kind,
            session_id,
            title,
            generated_at: timestamp,
            format,
            path,
            size,
            summary: summary_map,
        };
        self.generated.insert(report_id, info.clone());
        Ok(info)
    }

    pub fn generate_validation_report(
        &self,
        session: &MigrationSession,
        format: ReportFormat,
        include_remediation: bool,
    ) -> Result<ReportInfo, ReportError> {
        let result = session.validation.as_ref().ok_or(ReportError::MissingValidationResult(session.id))?;
        let report_id = Uuid::new_v4();
        let timestamp = Utc::now();

        let mut body = vec![sections::validation_summary(result), sections::validation_details(result)];
        if !result.critical_issues.is_empty() {
            body.push(sections::error_analysis(&result.critical_issues));
        }
        if include_remediation {
            let recommendations: Vec<String> = result
                .warning_issues
                .iter()
                .chain(result.critical_issues.iter())
                .filter_map(|i| i.remediation.clone())
                .collect();
            if !recommendations.is_empty() {
                body.push(sections::remediation(&recommendations));
            }
        }

        self.save(
            ReportKind::Validation,
            report_id,
            Some(session.id),
            timestamp,
            &body,
            format,
            format!("Validation Report - {}", session.config.name),
            json!({
                "can_proceed": result.can_proceed,
                "total_checks": result.total_checks,
                "checks_failed": result.failed,
                "warnings": result.warnings,
            }),
        )
    }

    pub fn generate_summary_report(
        &self,
        session: &MigrationSession,
        performance_data: Option<&Value>,
        format: ReportFormat,
    ) -> Result<ReportInfo, ReportError> {
        let report_id = Uuid::new_v4();
        let timestamp = Utc::now();

        let steps_completed = session.steps.iter().filter(|s| s.status == StepStatus::Completed).count();
        let errors_count = session.log.iter().filter(|l| l.level == migration_core::LogLevel::Error).count();
        let warnings_count = session.log.iter().filter(|l| l.level == migration_core::LogLevel::Warning).count();

        let empty = json!({});
        let performance_value = performance_data.unwrap_or(&empty);

        let mut body = vec![
            sections::migration_overview(session),
            sections::steps_summary(&session.steps),
            sections::performance_summary(performance_value),
        ];
        if !session.backups.is_empty() {
            body.push(sections::backup_info(&session.backups));
        }
        if errors_count > 0 || warnings_count > 0 {
            body.push(sections::issues(&session.log));
        }

        let duration_seconds = match (session.started_at, session.ended_at) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds() as f64 / 1000.0),
            _ => None,
        };

        self.save(
            ReportKind::Summary,
            report_id,
            Some(session.id),
            timestamp,
            &body,
            format,
            format!("Migration Summary - {}", session.config.name),
            json!({
                "status": session.status,
                "steps_completed": steps_completed,
                "steps_total": session.steps.len(),
                "duration_seconds": duration_seconds,
                "errors_count": errors_count,
            }),
        )
    }

    pub fn generate_error_report(
        &self,
        session: &MigrationSession,
        primary_error: &ErrorInfo,
        format: ReportFormat,
        include_logs: bool,
    ) -> Result<ReportInfo, ReportError> {
        let report_id = Uuid::new_v4();
        let timestamp = Utc::now();

        let affected_steps: Vec<String> = session
            .steps
            .iter()
            .filter(|s| s.error.is_some() || s.status == StepStatus::Failed)
            .map(|s| s.id.clone())
            .collect();
        let rollback_performed = session.status == MigrationStatus::RolledBack;

        let mut recovery_options = Vec::new();
        if !session.backups.is_empty() {
            recovery_options.push("Restore from backup and retry migration".to_string());
        }
        if primary_error.retry_possible {
            recovery_options.push("Retry the failed operation".to_string());
        }
        recovery_options.push("Review error details and fix configuration".to_string());
        recovery_options.push("Contact support for assistance".to_string());
        recovery_options.push("Perform manual migration steps".to_string());

        let mut body = vec![
            sections::error_summary(primary_error, &affected_steps, rollback_performed),
            sections::error_timeline(&session.log),
            sections::recovery_options(&recovery_options),
        ];
        if include_logs {
            body.push(sections::detailed_logs(&session.log));
        }

        self.save(
            ReportKind::Error,
            report_id,
            Some(session.id),
            timestamp,
            &body,
            format,
            format!("Error Report - {}", session.config.name),
            json!({
                "error_code": primary_error.code,
                "severity": primary_error.severity,
                "affected_steps": affected_steps.len(),
                "rollback_performed": rollback_performed,
            }),
        )
    }

    pub fn generate_performance_report(
        &self,
        session_id: Uuid,
        performance_data: &Value,
        format: ReportFormat,
    ) -> Result<ReportInfo, ReportError> {
        let report_id = Uuid::new_v4();
        let timestamp = Utc::now();

        let transfer_metrics = performance_data.get("transfer_metrics").cloned().unwrap_or_else(|| json!({}));
        let database_metrics = performance_data.get("database_metrics").cloned().unwrap_or_else(|| json!({}));
        let resource_usage = performance_data.get("resource_usage").cloned().unwrap_or_else(|| json!({}));

        let body = vec![
            ReportSection::new("Performance Overview", performance_data.clone(), ReportSeverity::Info),
            ReportSection::new("Transfer Performance", transfer_metrics, ReportSeverity::Info),
            ReportSection::new("Database Performance", database_metrics, ReportSeverity::Info),
            ReportSection::new("Resource Usage", resource_usage.clone(), ReportSeverity::Info),
        ];

        self.save(
            ReportKind::Performance,
            report_id,
            Some(session_id),
            timestamp,
            &body,
            format,
            format!("Performance Report - {session_id}"),
            json!({
                "peak_cpu_percent": resource_usage.get("cpu_percent"),
                "peak_memory_percent": resource_usage.get("memory_percent"),
            }),
        )
    }

    pub fn get_report(&self, report_id: Uuid) -> Option<ReportInfo> {
        self.generated.get(&report_id).map(|e| e.value().clone())
    }

    pub fn list_reports(&self, session_id: Option<Uuid>, kind: Option<ReportKind>) -> Vec<ReportInfo> {
        let mut reports: Vec<ReportInfo> = self
            .generated
            .iter()
            .map(|e| e.value().clone())
            .filter(|r| kind.map(|k| k == r.kind).unwrap_or(true))
            .filter(|r| session_id.map(|s| r.session_id == Some(s)).unwrap_or(true))
            .collect();
        reports.sort_by(|a, b| b.generated_at.cmp(&a.generated_at));
        reports
    }

    /// Deletes reports (and their files) older than `days`.
    pub fn cleanup_old_reports(&self, days: i64) {
        let cutoff = Utc::now() - chrono::Duration::days(days);
        let stale: Vec<Uuid> = self.generated.iter().filter(|e| e.generated_at < cutoff).map(|e| *e.key()).collect();
        for id in stale {
            if let Some((_, info)) = self.generated.remove(&id) {
                if info.path.exists() {
                    if let Err(e) = std::fs::remove_file(&info.path) {
                        tracing::warn!(error = %e, path = %info.path.display(), "failed to delete stale report file");
                    }
                }
            }
        }
    }
}
