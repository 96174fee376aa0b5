use crate::backup::BackupRecord;
use crate::config::MigrationConfig;
use crate::error::ErrorInfo;
use crate::step::MigrationStep;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationStatus {
    Pending,
    Validating,
    Running,
    Completed,
    Failed,
    Cancelled,
    RolledBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// An append-only log line recorded against a session for every state
/// transition, step boundary, and error (spec.md §4.G "Observable side
/// effects").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub step_id: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            step_id: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_step(mut self, step_id: impl Into<String>) -> Self {
        self.step_id = Some(step_id.into());
        self
    }
}

/// A single validation finding (spec.md §6 `ValidationEngine` contract).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub code: String,
    pub message: String,
    pub remediation: Option<String>,
}

/// Summary returned by the `ValidationEngine` collaborator contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub can_proceed: bool,
    pub total_checks: u32,
    pub passed: u32,
    pub failed: u32,
    pub warnings: u32,
    pub warning_issues: Vec<Issue>,
    pub critical_issues: Vec<Issue>,
    pub estimated_fix_time_text: Option<String>,
}

/// A live migration run (spec.md §3). Single-writer: only the session
/// driver task in `migration-orchestrator` mutates it; other components
/// read via clones/snapshots taken through `SessionStore`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationSession {
    pub id: Uuid,
    pub config: MigrationConfig,
    pub tenant_id: Option<String>,
    pub status: MigrationStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub steps: Vec<MigrationStep>,
    pub current_step_id: Option<String>,
    pub log: Vec<LogEntry>,
    pub backups: Vec<BackupRecord>,
    pub validation: Option<ValidationResult>,
    pub error: Option<ErrorInfo>,
}

impl MigrationSession {
    pub fn new(config: MigrationConfig, steps: Vec<MigrationStep>) -> Self {
        let tenant_id = config.tenant_id.clone();
        Self {
            id: Uuid::new_v4(),
            config,
            tenant_id,
            status: MigrationStatus::Pending,
            created_at: Utc::now(),
            started_at: None,
            ended_at: None,
            steps,
            current_step_id: None,
            log: Vec::new(),
            backups: Vec::new(),
            validation: None,
            error: None,
        }
    }

    pub fn log(&mut self, entry: LogEntry) {
        self.log.push(entry);
    }

    pub fn step_mut(&mut self, step_id: &str) -> Option<&mut MigrationStep> {
        self.steps.iter_mut().find(|s| s.id == step_id)
    }

    pub fn step(&self, step_id: &str) -> Option<&MigrationStep> {
        self.steps.iter().find(|s| s.id == step_id)
    }

    pub fn is_owned_by(&self, tenant_id: Option<&str>, is_admin: bool) -> bool {
        is_admin || self.tenant_id.as_deref() == tenant_id
    }
}
