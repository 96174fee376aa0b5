use migration_core::ProgressUnit;
use serde::Serialize;

/// Point-in-time snapshot returned by `get_metrics` (spec.md §4.C).
#[derive(Debug, Clone, Serialize)]
pub struct ProgressMetrics {
    pub current: u64,
    pub total: u64,
    pub unit: ProgressUnit,
    pub percentage: f64,
    pub average_rate: f64,
    pub current_rate: f64,
    pub eta_seconds: Option<i64>,
    pub peak_rate: f64,
    pub min_rate: f64,
    pub rate_history: Vec<f64>,
}
