use crate::threshold::{Alert, ThresholdSet};
use crate::types::{DatabaseMetrics, MetricKind, PerformanceEvent, ResourceUsage, TransferMetrics};
use chrono::Utc;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use sysinfo::{Disks, Networks, System};
use tokio::task::JoinHandle;
use uuid::Uuid;

type Subscriber = Arc<dyn Fn(&PerformanceEvent) + Send + Sync>;
type TrackingKey = (Uuid, String);

#[derive(Debug, Clone)]
pub struct PerformanceMonitorConfig {
    pub collection_interval: Duration,
    pub max_history_size: usize,
    pub theoretical_max_mbps: f64,
}

impl Default for PerformanceMonitorConfig {
    fn default() -> Self {
        Self {
            collection_interval: Duration::from_secs(1),
            max_history_size: 1000,
            theoretical_max_mbps: 100.0,
        }
    }
}

struct PrevIoSample {
    disk_read: u64,
    disk_write: u64,
    net_sent: u64,
    net_recv: u64,
    at: std::time::Instant,
}

/// Periodic host sampler plus per-session transfer/database aggregators
/// (spec.md §4.D), grounded on `performance_monitor.py`'s
/// `PerformanceMonitor`.
pub struct PerformanceMonitor {
    config: PerformanceMonitorConfig,
    resource_history: Mutex<VecDeque<ResourceUsage>>,
    transfer_metrics: DashMap<TrackingKey, TransferMetrics>,
    database_metrics: DashMap<TrackingKey, DatabaseMetrics>,
    subscribers: RwLock<Vec<Subscriber>>,
    thresholds: Mutex<ThresholdSet>,
    active: Arc<AtomicBool>,
    task: Mutex<Option<JoinHandle<()>>>,
    prev_sample: Mutex<Option<PrevIoSample>>,
}

impl PerformanceMonitor {
    pub fn new(config: PerformanceMonitorConfig, thresholds: ThresholdSet) -> Arc<Self> {
        Arc::new(Self {
            resource_history: Mutex::new(VecDeque::with_capacity(config.max_history_size)),
            config,
            transfer_metrics: DashMap::new(),
            database_metrics: DashMap::new(),
            subscribers: RwLock::new(Vec::new()),
            thresholds: Mutex::new(thresholds),
            active: Arc::new(AtomicBool::new(false)),
            task: Mutex::new(None),
            prev_sample: Mutex::new(None),
        })
    }

    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&PerformanceEvent) + Send + Sync + 'static,
    {
        self.subscribers.write().unwrap().push(Arc::new(callback));
    }

    fn emit(&self, event: PerformanceEvent) {
        for subscriber in self.subscribers.read().unwrap().iter() {
            let subscriber = subscriber.clone();
            let event_clone = event.clone();
            if let Err(panic) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| subscriber(&event_clone))) {
                tracing::error!(?panic, "performance subscriber panicked; ignoring");
            }
        }
    }

    /// Starts the sampler loop. A no-op if already running, matching
    /// `start_monitoring`'s idempotence in the original.
    pub fn start(self: &Arc<Self>, session_id: Option<Uuid>) {
        if self.active.swap(true, Ordering::SeqCst) {
            return;
        }
        let this = self.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(this.config.collection_interval);
            while this.active.load(Ordering::SeqCst) {
                interval.tick().await;
                this.sample_once(session_id);
            }
        });
        *self.task.lock().unwrap() = Some(handle);
    }

    pub async fn stop(&self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(handle) = self.task.lock().unwrap().take() {
            handle.abort();
        }
    }

    fn sample_once(&self, session_id: Option<Uuid>) {
        let now = std::time::Instant::now();
        let timestamp = Utc::now();

        let mut system = System::new_all();
        system.refresh_cpu_usage();
        system.refresh_memory();
        let cpu_percent = system.global_cpu_usage();
        let memory_percent = if system.total_memory() > 0 {
            100.0 * system.used_memory() as f64 / system.total_memory() as f64
        } else {
            0.0
        };
        let memory_used_mb = system.used_memory() as f64 / (1024.0 * 1024.0);
        let memory_available_mb = system.available_memory() as f64 / (1024.0 * 1024.0);

        let disks = Disks::new_with_refreshed_list();
        let (disk_read, disk_write) = (0u64, 0u64);
        let _ = &disks; // per-disk read/write counters are not exposed uniformly across platforms by sysinfo

        let networks = Networks::new_with_refreshed_list();
        let (net_sent, net_recv) = networks.iter().fold((0u64, 0u64), |(sent, recv), (_, data)| {
            (sent + data.total_transmitted(), recv + data.total_received())
        });

        let mut prev_guard = self.prev_sample.lock().unwrap();
        let (disk_read_rate, disk_write_rate, network_sent_rate, network_recv_rate) =
            if let Some(prev) = prev_guard.as_ref() {
                let elapsed = now.duration_since(prev.at).as_secs_f64();
                if elapsed > 0.0 {
                    (
                        (disk_read.saturating_sub(prev.disk_read) as f64 / (1024.0 * 1024.0)) / elapsed,
                        (disk_write.saturating_sub(prev.disk_write) as f64 / (1024.0 * 1024.0)) / elapsed,
                        (net_sent.saturating_sub(prev.net_sent) as f64 / (1024.0 * 1024.0)) / elapsed,
                        (net_recv.saturating_sub(prev.net_recv) as f64 / (1024.0 * 1024.0)) / elapsed,
                    )
                } else {
                    (0.0, 0.0, 0.0, 0.0)
                }
            } else {
                (0.0, 0.0, 0.0, 0.0)
            };
        *prev_guard = Some(PrevIoSample { disk_read, disk_write, net_sent, net_recv, at: now });
        drop(prev_guard);

        let usage = ResourceUsage {
            timestamp,
            cpu_percent,
            memory_percent,
            memory_used_mb,
            memory_available_mb,
            disk_read_mb_per_sec: disk_read_rate,
            disk_write_mb_per_sec: disk_write_rate,
            network_sent_mb_per_sec: network_sent_rate,
            network_recv_mb_per_sec: network_recv_rate,
            active_connections: 0,
            process_count: system.processes().len(),
        };

        {
            let mut history = self.resource_history.lock().unwrap();
            if history.len() >= self.config.max_history_size {
                history.pop_front();
            }
            history.push_back(usage.clone());
        }

        for (metric, value, unit) in [
            (MetricKind::Cpu, cpu_percent as f64, "percent"),
            (MetricKind::Memory, memory_percent, "percent"),
            (MetricKind::DiskIo, disk_read_rate + disk_write_rate, "MB/s"),
            (MetricKind::NetworkIo, network_sent_rate + network_recv_rate, "MB/s"),
        ] {
            self.emit(PerformanceEvent {
                timestamp,
                metric_type: metric,
                value,
                unit: unit.to_string(),
                session_id,
                step_id: None,
                metadata: Default::default(),
            });
            let alerts = self.thresholds.lock().unwrap().check(metric, value);
            for alert in alerts {
                tracing::warn!(?alert, "performance threshold breached");
            }
        }
    }

    pub fn start_transfer_tracking(&self, session_id: Uuid, step_id: Option<String>, total_bytes: u64, total_files: u64) {
        let key = tracking_key(session_id, &step_id, "transfer");
        let now = Utc::now();
        self.transfer_metrics.insert(
            key,
            TransferMetrics {
                session_id,
                step_id,
                start_time: now,
                current_time: now,
                bytes_transferred: 0,
                total_bytes,
                files_transferred: 0,
                total_files,
                current_rate_mbps: 0.0,
                average_rate_mbps: 0.0,
                peak_rate_mbps: 0.0,
                efficiency_percent: 0.0,
                errors_count: 0,
                retries_count: 0,
            },
        );
    }

    pub fn update_transfer_progress(
        &self,
        session_id: Uuid,
        step_id: Option<String>,
        bytes_transferred: u64,
        files_transferred: u64,
        errors: u64,
        retries: u64,
    ) {
        let key = tracking_key(session_id, &step_id, "transfer");
        let Some(mut entry) = self.transfer_metrics.get_mut(&key) else { return };
        let now = Utc::now();
        entry.current_time = now;
        entry.bytes_transferred = bytes_transferred;
        entry.files_transferred = files_transferred;
        entry.errors_count = errors;
        entry.retries_count = retries;

        let elapsed = (now - entry.start_time).num_milliseconds() as f64 / 1000.0;
        if elapsed > 0.0 {
            entry.average_rate_mbps = (bytes_transferred as f64 / (1024.0 * 1024.0)) / elapsed;
            entry.current_rate_mbps = entry.average_rate_mbps;
            if entry.current_rate_mbps > entry.peak_rate_mbps {
                entry.peak_rate_mbps = entry.current_rate_mbps;
            }
        }
        entry.efficiency_percent = ((entry.current_rate_mbps / self.config.theoretical_max_mbps) * 100.0).min(100.0);

        let event = PerformanceEvent {
            timestamp: now,
            metric_type: MetricKind::TransferRate,
            value: entry.current_rate_mbps,
            unit: "MB/s".to_string(),
            session_id: Some(session_id),
            step_id: entry.step_id.clone(),
            metadata: [
                ("bytes_transferred".to_string(), serde_json::json!(bytes_transferred)),
                ("files_transferred".to_string(), serde_json::json!(files_transferred)),
                ("efficiency_percent".to_string(), serde_json::json!(entry.efficiency_percent)),
            ]
            .into_iter()
            .collect(),
        };
        drop(entry);
        self.emit(event);
    }

    pub fn start_database_tracking(&self, session_id: Uuid, step_id: Option<String>, operation_type: String, total_records: u64) {
        let key = tracking_key(session_id, &step_id, "database");
        let now = Utc::now();
        self.database_metrics.insert(
            key,
            DatabaseMetrics {
                session_id,
                step_id,
                operation_type,
                start_time: now,
                current_time: now,
                records_processed: 0,
                total_records,
                current_rate_rps: 0.0,
                average_rate_rps: 0.0,
                connection_pool_size: 0,
                active_connections: 0,
                query_time_avg_ms: 0.0,
                errors_count: 0,
            },
        );
    }

    #[allow(clippy::too_many_arguments)]
    pub fn update_database_progress(
        &self,
        session_id: Uuid,
        step_id: Option<String>,
        records_processed: u64,
        pool_size: Option<u32>,
        active_connections: Option<u32>,
        query_time_ms: Option<f64>,
        errors: u64,
    ) {
        let key = tracking_key(session_id, &step_id, "database");
        let Some(mut entry) = self.database_metrics.get_mut(&key) else { return };
        let now = Utc::now();
        entry.current_time = now;
        entry.records_processed = records_processed;
        entry.errors_count = errors;
        if let Some(pool_size) = pool_size {
            entry.connection_pool_size = pool_size;
        }
        if let Some(active) = active_connections {
            entry.active_connections = active;
        }
        if let Some(query_time_ms) = query_time_ms {
            entry.query_time_avg_ms = query_time_ms;
        }

        let elapsed = (now - entry.start_time).num_milliseconds() as f64 / 1000.0;
        if elapsed > 0.0 {
            entry.average_rate_rps = records_processed as f64 / elapsed;
            entry.current_rate_rps = entry.average_rate_rps;
        }

        let event = PerformanceEvent {
            timestamp: now,
            metric_type: MetricKind::DbOps,
            value: entry.current_rate_rps,
            unit: "records/s".to_string(),
            session_id: Some(session_id),
            step_id: entry.step_id.clone(),
            metadata: [
                ("records_processed".to_string(), serde_json::json!(records_processed)),
                ("operation_type".to_string(), serde_json::json!(entry.operation_type)),
                ("query_time_avg_ms".to_string(), serde_json::json!(entry.query_time_avg_ms)),
            ]
            .into_iter()
            .collect(),
        };
        drop(entry);
        self.emit(event);
    }

    pub fn get_transfer_metrics(&self, session_id: Uuid, step_id: Option<String>) -> Option<TransferMetrics> {
        self.transfer_metrics.get(&tracking_key(session_id, &step_id, "transfer")).map(|e| e.clone())
    }

    pub fn get_database_metrics(&self, session_id: Uuid, step_id: Option<String>) -> Option<DatabaseMetrics> {
        self.database_metrics.get(&tracking_key(session_id, &step_id, "database")).map(|e| e.clone())
    }

    pub fn get_resource_usage_history(&self, minutes: i64) -> Vec<ResourceUsage> {
        let cutoff = Utc::now() - chrono::Duration::minutes(minutes);
        self.resource_history.lock().unwrap().iter().filter(|u| u.timestamp >= cutoff).cloned().collect()
    }

    pub fn get_performance_summary(&self, session_id: Uuid) -> serde_json::Value {
        let transfer: serde_json::Map<String, serde_json::Value> = self
            .transfer_metrics
            .iter()
            .filter(|e| e.value().session_id == session_id)
            .map(|e| (e.key().1.clone(), serde_json::to_value(e.value()).unwrap()))
            .collect();
        let database: serde_json::Map<String, serde_json::Value> = self
            .database_metrics
            .iter()
            .filter(|e| e.value().session_id == session_id)
            .map(|e| (e.key().1.clone(), serde_json::to_value(e.value()).unwrap()))
            .collect();
        let resource_usage = self.resource_history.lock().unwrap().back().map(|u| serde_json::to_value(u).unwrap());

        serde_json::json!({
            "session_id": session_id,
            "timestamp": Utc::now(),
            "transfer_metrics": transfer,
            "database_metrics": database,
            "resource_usage": resource_usage,
        })
    }

    pub fn cleanup_session(&self, session_id: Uuid) {
        self.transfer_metrics.retain(|_, v| v.session_id != session_id);
        self.database_metrics.retain(|_, v| v.session_id != session_id);
    }
}

fn tracking_key(session_id: Uuid, step_id: &Option<String>, default: &str) -> TrackingKey {
    (session_id, step_id.clone().unwrap_or_else(|| default.to_string()))
}
