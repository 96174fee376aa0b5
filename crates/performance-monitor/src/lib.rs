mod monitor;
mod threshold;
mod types;

pub use monitor::{PerformanceMonitor, PerformanceMonitorConfig};
pub use threshold::{Alert, AlertLevel, Comparison, ThresholdRule, ThresholdSet};
pub use types::{DatabaseMetrics, MetricKind, PerformanceEvent, ResourceUsage, TransferMetrics};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use uuid::Uuid;

    #[test]
    fn transfer_tracking_computes_rate_and_efficiency() {
        let monitor = PerformanceMonitor::new(PerformanceMonitorConfig::default(), ThresholdSet::default());
        let session_id = Uuid::new_v4();
        monitor.start_transfer_tracking(session_id, None, 1_000_000, 10);
        std::thread::sleep(Duration::from_millis(20));
        monitor.update_transfer_progress(session_id, None, 500_000, 5, 0, 0);

        let metrics = monitor.get_transfer_metrics(session_id, None).unwrap();
        assert_eq!(metrics.bytes_transferred, 500_000);
        assert!(metrics.average_rate_mbps > 0.0);
        assert!(metrics.efficiency_percent <= 100.0);
    }

    #[test]
    fn database_tracking_computes_rps() {
        let monitor = PerformanceMonitor::new(PerformanceMonitorConfig::default(), ThresholdSet::default());
        let session_id = Uuid::new_v4();
        monitor.start_database_tracking(session_id, None, "dump".to_string(), 1000);
        std::thread::sleep(Duration::from_millis(20));
        monitor.update_database_progress(session_id, None, 200, Some(10), Some(4), Some(12.5), 0);

        let metrics = monitor.get_database_metrics(session_id, None).unwrap();
        assert_eq!(metrics.records_processed, 200);
        assert_eq!(metrics.query_time_avg_ms, 12.5);
        assert!(metrics.average_rate_rps > 0.0);
    }

    #[test]
    fn cleanup_session_removes_its_aggregators() {
        let monitor = PerformanceMonitor::new(PerformanceMonitorConfig::default(), ThresholdSet::default());
        let session_id = Uuid::new_v4();
        monitor.start_transfer_tracking(session_id, None, 100, 1);
        monitor.start_database_tracking(session_id, None, "migrate".to_string(), 100);
        monitor.cleanup_session(session_id);

        assert!(monitor.get_transfer_metrics(session_id, None).is_none());
        assert!(monitor.get_database_metrics(session_id, None).is_none());
    }

    #[test]
    fn threshold_set_dedups_within_window() {
        let mut thresholds = ThresholdSet::new(vec![ThresholdRule {
            metric: MetricKind::Cpu,
            warning: 70.0,
            critical: 90.0,
            comparison: Comparison::GreaterThan,
            duration: Duration::from_secs(0),
        }]);

        let first = thresholds.check(MetricKind::Cpu, 95.0);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].level, AlertLevel::Critical);

        let second = thresholds.check(MetricKind::Cpu, 96.0);
        assert!(second.is_empty(), "duplicate alert within dedup window must be suppressed");
    }

    #[tokio::test]
    async fn sampler_loop_emits_events_to_subscribers() {
        let monitor = PerformanceMonitor::new(
            PerformanceMonitorConfig { collection_interval: Duration::from_millis(10), ..Default::default() },
            ThresholdSet::default(),
        );
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        monitor.subscribe(move |_event| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        monitor.start(None);
        tokio::time::sleep(Duration::from_millis(50)).await;
        monitor.stop().await;

        assert!(count.load(Ordering::SeqCst) > 0);
    }

    #[test]
    fn resource_history_filters_by_age() {
        let monitor = PerformanceMonitor::new(PerformanceMonitorConfig::default(), ThresholdSet::default());
        assert!(monitor.get_resource_usage_history(10).is_empty());
    }
}
