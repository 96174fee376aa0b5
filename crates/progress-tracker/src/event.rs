use chrono::{DateTime, Utc};
use migration_core::ProgressUnit;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressEventType {
    Started,
    Progress,
    Completed,
    Failed,
    Paused,
    Resumed,
    Cancelled,
}

/// Event delivered to subscribers on every tracker state change
/// (spec.md §4.C).
#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    pub event: ProgressEventType,
    pub session_id: Uuid,
    pub step_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub current: u64,
    pub total: u64,
    pub unit: ProgressUnit,
    pub rate: Option<f64>,
    pub eta_seconds: Option<i64>,
    pub message: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}
