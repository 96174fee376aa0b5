use serde::Serialize;

/// Point-in-time pool metrics (spec.md §4.B).
#[derive(Debug, Clone, Default, Serialize)]
pub struct PoolStats {
    pub total_connections: usize,
    pub active_connections: usize,
    pub idle_connections: usize,
    pub pending_waiters: usize,
    pub total_created: u64,
    pub total_destroyed: u64,
    pub total_requests: u64,
    pub total_errors: u64,
    pub avg_wait_time_ms: f64,
    pub max_wait_time_ms: f64,
}

/// Running accumulators backing [`PoolStats`]. Kept separate from the
/// point-in-time struct so wait-time averaging can use a cheap running
/// sum instead of retaining every sample.
#[derive(Debug, Default)]
pub(crate) struct StatsAccumulator {
    pub total_created: u64,
    pub total_destroyed: u64,
    pub total_requests: u64,
    pub total_errors: u64,
    pub wait_time_sum_ms: f64,
    pub wait_time_samples: u64,
    pub max_wait_time_ms: f64,
}

impl StatsAccumulator {
    pub fn record_wait(&mut self, wait_ms: f64) {
        self.wait_time_sum_ms += wait_ms;
        self.wait_time_samples += 1;
        if wait_ms > self.max_wait_time_ms {
            self.max_wait_time_ms = wait_ms;
        }
    }

    pub fn avg_wait_ms(&self) -> f64 {
        if self.wait_time_samples == 0 {
            0.0
        } else {
            self.wait_time_sum_ms / self.wait_time_samples as f64
        }
    }
}
