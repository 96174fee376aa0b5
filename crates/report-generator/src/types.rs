use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    Json,
    Html,
    Markdown,
    Text,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Html => "html",
            Self::Markdown => "md",
            Self::Text => "txt",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Validation,
    Summary,
    Error,
    Performance,
}

impl ReportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Summary => "summary",
            Self::Error => "error",
            Self::Performance => "performance",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// One composable block of a report (spec.md §4.E "Composition").
#[derive(Debug, Clone, Serialize)]
pub struct ReportSection {
    pub title: String,
    pub content: Value,
    pub severity: ReportSeverity,
}

impl ReportSection {
    pub fn new(title: impl Into<String>, content: Value, severity: ReportSeverity) -> Self {
        Self { title: title.into(), content, severity }
    }
}

/// Metadata record returned for every generated report (spec.md §4.E).
#[derive(Debug, Clone, Serialize)]
pub struct ReportInfo {
    pub id: Uuid,
    pub kind: ReportKind,
    pub session_id: Option<Uuid>,
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub format: ReportFormat,
    pub path: std::path::PathBuf,
    pub size: u64,
    pub summary: HashMap<String, Value>,
}
