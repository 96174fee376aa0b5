use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Grounded on `performance_monitor.py`'s `MetricType` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    TransferRate,
    Cpu,
    Memory,
    DiskIo,
    NetworkIo,
    DbOps,
}

/// Event emitted to subscribers on every sample or progress update
/// (spec.md §4.D's subscriber contract, same fan-out shape as
/// progress-tracker's).
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceEvent {
    pub timestamp: DateTime<Utc>,
    pub metric_type: MetricKind,
    pub value: f64,
    pub unit: String,
    pub session_id: Option<uuid::Uuid>,
    pub step_id: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Host-wide resource snapshot, one entry in the bounded sampling
/// history ring (`performance_monitor.py`'s `ResourceUsage`).
#[derive(Debug, Clone, Serialize)]
pub struct ResourceUsage {
    pub timestamp: DateTime<Utc>,
    pub cpu_percent: f32,
    pub memory_percent: f64,
    pub memory_used_mb: f64,
    pub memory_available_mb: f64,
    pub disk_read_mb_per_sec: f64,
    pub disk_write_mb_per_sec: f64,
    pub network_sent_mb_per_sec: f64,
    pub network_recv_mb_per_sec: f64,
    pub active_connections: usize,
    pub process_count: usize,
}

/// Per-(session,step) file transfer aggregator (spec.md §4.D).
#[derive(Debug, Clone, Serialize)]
pub struct TransferMetrics {
    pub session_id: uuid::Uuid,
    pub step_id: Option<String>,
    pub start_time: DateTime<Utc>,
    pub current_time: DateTime<Utc>,
    pub bytes_transferred: u64,
    pub total_bytes: u64,
    pub files_transferred: u64,
    pub total_files: u64,
    pub current_rate_mbps: f64,
    pub average_rate_mbps: f64,
    pub peak_rate_mbps: f64,
    pub efficiency_percent: f64,
    pub errors_count: u64,
    pub retries_count: u64,
}

/// Per-(session,step) database operation aggregator (spec.md §4.D).
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseMetrics {
    pub session_id: uuid::Uuid,
    pub step_id: Option<String>,
    pub operation_type: String,
    pub start_time: DateTime<Utc>,
    pub current_time: DateTime<Utc>,
    pub records_processed: u64,
    pub total_records: u64,
    pub current_rate_rps: f64,
    pub average_rate_rps: f64,
    pub connection_pool_size: u32,
    pub active_connections: u32,
    pub query_time_avg_ms: f64,
    pub errors_count: u64,
}
