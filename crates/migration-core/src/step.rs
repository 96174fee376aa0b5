use crate::error::ErrorInfo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
    Cancelled,
}

impl StepStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            StepStatus::Completed | StepStatus::Failed | StepStatus::Skipped | StepStatus::Cancelled
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressUnit {
    Items,
    Bytes,
    Files,
    Records,
    Percent,
    Operations,
}

/// Progress snapshot for a step or session (spec.md §3).
///
/// Invariant: `current <= total` always holds after construction; see
/// `ProgressTracker`'s Open-Question resolution in DESIGN.md for how a
/// caller supplying `current > total` is handled at the tracking layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressInfo {
    pub current: u64,
    pub total: u64,
    pub unit: ProgressUnit,
    pub message: Option<String>,
}

impl ProgressInfo {
    pub fn new(total: u64, unit: ProgressUnit) -> Self {
        Self { current: 0, total, unit, message: None }
    }

    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            100.0 * (self.current as f64) / (self.total as f64)
        }
    }
}

/// One step in a session's [`crate::step_graph::StepGraph`] (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationStep {
    pub id: String,
    pub name: String,
    pub description: String,
    pub dependencies: Vec<String>,
    pub status: StepStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub progress: ProgressInfo,
    pub error: Option<ErrorInfo>,
}

impl MigrationStep {
    pub fn new(id: impl Into<String>, name: impl Into<String>, description: impl Into<String>, dependencies: Vec<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            dependencies,
            status: StepStatus::Pending,
            started_at: None,
            ended_at: None,
            progress: ProgressInfo::new(0, ProgressUnit::Operations),
            error: None,
        }
    }

    pub fn start(&mut self) {
        self.status = StepStatus::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn complete(&mut self) {
        self.status = StepStatus::Completed;
        self.ended_at = Some(Utc::now());
        self.progress.current = self.progress.total;
    }

    pub fn fail(&mut self, error: ErrorInfo) {
        self.status = StepStatus::Failed;
        self.ended_at = Some(Utc::now());
        self.error = Some(error);
    }

    pub fn cancel(&mut self) {
        self.status = StepStatus::Cancelled;
        self.ended_at = Some(Utc::now());
    }

    pub fn skip(&mut self) {
        self.status = StepStatus::Skipped;
        self.started_at = Some(Utc::now());
        self.ended_at = Some(Utc::now());
    }
}
