//! Section builders, one per `_create_*_section` method in
//! `report_generator.py`, rendered with `serde_json::json!` instead of
//! Python dict literals.

use crate::types::{ReportSection, ReportSeverity};
use migration_core::{
    BackupRecord, ErrorInfo, LogEntry, LogLevel, MigrationSession, MigrationStatus, MigrationStep,
    StepStatus, ValidationResult,
};
use serde_json::{json, Value};

pub fn validation_summary(result: &ValidationResult) -> ReportSection {
    let severity = if result.can_proceed { ReportSeverity::Info } else { ReportSeverity::Error };
    let success_rate = if result.total_checks > 0 {
        100.0 * result.passed as f64 / result.total_checks as f64
    } else {
        0.0
    };
    ReportSection::new(
        "Validation Summary",
        json!({
            "can_proceed": result.can_proceed,
            "total_checks": result.total_checks,
            "checks_passed": result.passed,
            "checks_failed": result.failed,
            "warnings_count": result.warnings,
            "success_rate": success_rate,
            "estimated_fix_time": result.estimated_fix_time_text,
        }),
        severity,
    )
}

pub fn validation_details(result: &ValidationResult) -> ReportSection {
    ReportSection::new(
        "Validation Details",
        json!({
            "warning_issues": result.warning_issues,
            "critical_issues": result.critical_issues,
        }),
        ReportSeverity::Info,
    )
}

pub fn error_analysis(critical_issues: &[migration_core::Issue]) -> ReportSection {
    ReportSection::new(
        "Error Analysis",
        json!({
            "issues": critical_issues,
            "total": critical_issues.len(),
        }),
        ReportSeverity::Error,
    )
}

pub fn remediation(recommendations: &[String]) -> ReportSection {
    let priority: Vec<&String> = recommendations.iter().take(3).collect();
    ReportSection::new(
        "Remediation Suggestions",
        json!({
            "recommendations": recommendations,
            "priority_actions": priority,
            "total_recommendations": recommendations.len(),
        }),
        ReportSeverity::Warning,
    )
}

pub fn migration_overview(session: &MigrationSession) -> ReportSection {
    let steps_total = session.steps.len();
    let steps_completed = session.steps.iter().filter(|s| s.status == StepStatus::Completed).count();
    let completion_rate = if steps_total > 0 { 100.0 * steps_completed as f64 / steps_total as f64 } else { 0.0 };
    let severity = if session.status == MigrationStatus::Failed { ReportSeverity::Error } else { ReportSeverity::Info };

    ReportSection::new(
        "Migration Overview",
        json!({
            "migration_name": session.config.name,
            "status": session.status,
            "source_system": format!("{:?} ({})", session.config.source.variant, session.config.source.host),
            "destination_system": format!("{:?} ({})", session.config.destination.variant, session.config.destination.host),
            "start_time": session.started_at,
            "end_time": session.ended_at,
            "completion_rate": completion_rate,
        }),
        severity,
    )
}

pub fn steps_summary(steps: &[MigrationStep]) -> ReportSection {
    let step_summary: Vec<Value> = steps
        .iter()
        .map(|s| {
            let duration_seconds = match (s.started_at, s.ended_at) {
                (Some(start), Some(end)) => Some((end - start).num_milliseconds() as f64 / 1000.0),
                _ => None,
            };
            json!({
                "id": s.id,
                "name": s.name,
                "status": s.status,
                "duration_seconds": duration_seconds,
                "error": s.error,
            })
        })
        .collect();
    let completed = steps.iter().filter(|s| s.status == StepStatus::Completed).count();
    let failed = steps.iter().filter(|s| s.status == StepStatus::Failed).count();

    ReportSection::new(
        "Steps Summary",
        json!({
            "steps": step_summary,
            "total_steps": steps.len(),
            "completed_steps": completed,
            "failed_steps": failed,
        }),
        ReportSeverity::Info,
    )
}

pub fn performance_summary(performance_data: &Value) -> ReportSection {
    ReportSection::new("Performance Summary", performance_data.clone(), ReportSeverity::Info)
}

pub fn backup_info(backups: &[BackupRecord]) -> ReportSection {
    let total_size_mb: f64 = backups.iter().map(|b| b.size_bytes as f64 / (1024.0 * 1024.0)).sum();
    let verified = backups.iter().filter(|b| b.verified).count();
    ReportSection::new(
        "Backup Information",
        json!({
            "backups": backups,
            "total_backups": backups.len(),
            "total_size_mb": total_size_mb,
            "verified_backups": verified,
        }),
        ReportSeverity::Info,
    )
}

pub fn issues(log: &[LogEntry]) -> ReportSection {
    let errors: Vec<&LogEntry> = log.iter().filter(|l| l.level == LogLevel::Error).collect();
    let warnings: Vec<&LogEntry> = log.iter().filter(|l| l.level == LogLevel::Warning).collect();
    let severity = if errors.is_empty() { ReportSeverity::Warning } else { ReportSeverity::Error };
    ReportSection::new(
        "Issues and Warnings",
        json!({
            "errors": errors,
            "warnings": warnings,
            "total_errors": errors.len(),
            "total_warnings": warnings.len(),
        }),
        severity,
    )
}

pub fn error_summary(error: &ErrorInfo, affected_steps: &[String], rollback_performed: bool) -> ReportSection {
    ReportSection::new(
        "Error Summary",
        json!({
            "code": error.code,
            "message": error.message,
            "severity": error.severity,
            "component": error.component,
            "affected_steps": affected_steps,
            "rollback_performed": rollback_performed,
        }),
        ReportSeverity::Critical,
    )
}

pub fn error_timeline(log: &[LogEntry]) -> ReportSection {
    let timeline: Vec<&LogEntry> = log.iter().filter(|l| l.level == LogLevel::Error).collect();
    ReportSection::new(
        "Error Timeline",
        json!({ "timeline": timeline, "total_events": timeline.len() }),
        ReportSeverity::Error,
    )
}

pub fn recovery_options(options: &[String]) -> ReportSection {
    ReportSection::new(
        "Recovery Options",
        json!({
            "recovery_options": options,
            "recommended_action": options.first().cloned().unwrap_or_else(|| "Contact support".to_string()),
        }),
        ReportSeverity::Warning,
    )
}

/// Last 100 log entries, matching `_create_logs_section`'s `logs[-100:]`.
pub fn detailed_logs(log: &[LogEntry]) -> ReportSection {
    let start = log.len().saturating_sub(100);
    let recent = &log[start..];
    ReportSection::new(
        "Detailed Logs",
        json!({ "log_entries": recent, "total_logs": log.len(), "showing_recent": recent.len() }),
        ReportSeverity::Info,
    )
}
