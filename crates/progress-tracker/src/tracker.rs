//! Progress tracking engine (spec.md §4.C). Grounded on
//! `migration_assistant/monitoring/progress_tracker.py`: rate samples
//! recorded as `(current - prev_current) / (now - prev_update_time)`,
//! kept in a bounded ring, averaged over the last 10 samples, with an
//! ETA derived from that average.

use crate::error::ProgressError;
use crate::event::{ProgressEvent, ProgressEventType};
use crate::metrics::ProgressMetrics;
use chrono::Utc;
use dashmap::DashMap;
use migration_core::ProgressUnit;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;
use uuid::Uuid;

const DEFAULT_RATE_HISTORY_SIZE: usize = 100;
const AVERAGE_RATE_SAMPLE_WINDOW: usize = 10;

/// Identifies a tracked operation: `(session_id, None)` for session-level
/// progress, `(session_id, Some(step_id))` otherwise (spec.md §4.C).
pub type TrackingKey = (Uuid, Option<String>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackerStatus {
    Running,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

struct TrackerState {
    current: u64,
    total: u64,
    unit: ProgressUnit,
    message: Option<String>,
    status: TrackerStatus,
    last_update: Option<(Instant, u64)>,
    rate_history: VecDeque<f64>,
    max_history_size: usize,
}

impl TrackerState {
    fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            100.0 * (self.current as f64) / (self.total as f64)
        }
    }

    fn average_rate(&self) -> f64 {
        if self.rate_history.is_empty() {
            return 0.0;
        }
        let window = self.rate_history.len().min(AVERAGE_RATE_SAMPLE_WINDOW);
        let sum: f64 = self.rate_history.iter().rev().take(window).sum();
        sum / window as f64
    }

    fn current_rate(&self) -> f64 {
        self.rate_history.back().copied().unwrap_or(0.0)
    }

    fn peak_rate(&self) -> f64 {
        self.rate_history.iter().cloned().fold(0.0, f64::max)
    }

    fn min_rate(&self) -> f64 {
        self.rate_history.iter().cloned().fold(f64::INFINITY, f64::min).max(if self.rate_history.is_empty() { 0.0 } else { f64::NEG_INFINITY })
    }

    fn eta_seconds(&self) -> Option<i64> {
        let rate = self.average_rate();
        if rate <= 0.0 {
            return None;
        }
        let remaining = self.total.saturating_sub(self.current) as f64;
        Some((remaining / rate).round() as i64)
    }
}

type Subscriber = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;

/// Tracks progress of named operations identified by `(session_id,
/// step_id | None)` and fans out events to registered subscribers
/// best-effort: a panicking subscriber is caught and logged, never
/// propagated (spec.md §4.C).
pub struct ProgressTracker {
    trackers: DashMap<TrackingKey, Mutex<TrackerState>>,
    subscribers: RwLock<Vec<Subscriber>>,
    max_history_size: usize,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_HISTORY_SIZE)
    }
}

impl ProgressTracker {
    pub fn new(max_history_size: usize) -> Self {
        Self { trackers: DashMap::new(), subscribers: RwLock::new(Vec::new()), max_history_size }
    }

    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&ProgressEvent) + Send + Sync + 'static,
    {
        self.subscribers.write().unwrap().push(Arc::new(callback));
    }

    fn emit(&self, key: &TrackingKey, event_type: ProgressEventType, state: &TrackerState, metadata: HashMap<String, Value>) {
        let event = ProgressEvent {
            event: event_type,
            session_id: key.0,
            step_id: key.1.clone(),
            timestamp: Utc::now(),
            current: state.current,
            total: state.total,
            unit: state.unit,
            rate: if state.status == TrackerStatus::Paused { None } else { Some(state.current_rate()) },
            eta_seconds: state.eta_seconds(),
            message: state.message.clone(),
            metadata,
        };
        for subscriber in self.subscribers.read().unwrap().iter() {
            let subscriber = subscriber.clone();
            let event_clone = event.clone();
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| subscriber(&event_clone)));
            if let Err(panic) = result {
                tracing::error!(?panic, "progress subscriber panicked; ignoring");
            }
        }
    }

    pub fn start(&self, session_id: Uuid, step_id: Option<String>, total: u64, unit: ProgressUnit, message: Option<String>) {
        let key: TrackingKey = (session_id, step_id);
        let state = TrackerState {
            current: 0,
            total,
            unit,
            message,
            status: TrackerStatus::Running,
            last_update: Some((Instant::now(), 0)),
            rate_history: VecDeque::with_capacity(self.max_history_size),
            max_history_size: self.max_history_size,
        };
        self.emit(&key, ProgressEventType::Started, &state, HashMap::new());
        self.trackers.insert(key, Mutex::new(state));
    }

    pub fn update(
        &self,
        session_id: Uuid,
        step_id: Option<String>,
        mut current: u64,
        total: Option<u64>,
        message: Option<String>,
        metadata: HashMap<String, Value>,
    ) -> Result<(), ProgressError> {
        let key: TrackingKey = (session_id, step_id.clone());
        let entry = self
            .trackers
            .get(&key)
            .ok_or(ProgressError::NotFound { session_id, step_id: step_id.clone() })?;
        let mut state = entry.lock().unwrap();

        if state.status == TrackerStatus::Paused {
            // Updates to a paused tracker are ignored (spec.md §4.C invariant).
            return Ok(());
        }

        if let Some(t) = total {
            state.total = t;
        }
        // Open Question (spec.md §9) resolved in DESIGN.md: raise total to
        // current rather than rejecting the update.
        if current > state.total {
            state.total = current;
        }
        if let Some(m) = message {
            state.message = Some(m);
        }

        let now = Instant::now();
        if let Some((prev_time, prev_current)) = state.last_update {
            let elapsed = now.duration_since(prev_time).as_secs_f64();
            if elapsed > 0.0 {
                let rate = (current as i64 - prev_current as i64) as f64 / elapsed;
                if state.rate_history.len() >= state.max_history_size {
                    state.rate_history.pop_front();
                }
                state.rate_history.push_back(rate);
            }
        }
        state.last_update = Some((now, current));
        std::mem::swap(&mut current, &mut state.current);

        self.emit(&key, ProgressEventType::Progress, &state, metadata);
        Ok(())
    }

    pub fn complete(&self, session_id: Uuid, step_id: Option<String>, message: Option<String>) -> Result<(), ProgressError> {
        self.finish(session_id, step_id, TrackerStatus::Completed, ProgressEventType::Completed, message, HashMap::new())
    }

    pub fn fail(&self, session_id: Uuid, step_id: Option<String>, message: Option<String>, error: Option<String>) -> Result<(), ProgressError> {
        let mut metadata = HashMap::new();
        if let Some(e) = error {
            metadata.insert("error".to_string(), Value::String(e));
        }
        self.finish(session_id, step_id, TrackerStatus::Failed, ProgressEventType::Failed, message, metadata)
    }

    pub fn cancel(&self, session_id: Uuid, step_id: Option<String>, message: Option<String>) -> Result<(), ProgressError> {
        self.finish(session_id, step_id, TrackerStatus::Cancelled, ProgressEventType::Cancelled, message, HashMap::new())
    }

    fn finish(
        &self,
        session_id: Uuid,
        step_id: Option<String>,
        status: TrackerStatus,
        event_type: ProgressEventType,
        message: Option<String>,
        metadata: HashMap<String, Value>,
    ) -> Result<(), ProgressError> {
        let key: TrackingKey = (session_id, step_id.clone());
        let entry = self
            .trackers
            .get(&key)
            .ok_or(ProgressError::NotFound { session_id, step_id })?;
        let mut state = entry.lock().unwrap();
        state.status = status;
        if status == TrackerStatus::Completed {
            state.current = state.total;
        }
        if let Some(m) = message {
            state.message = Some(m);
        }
        self.emit(&key, event_type, &state, metadata);
        Ok(())
    }

    pub fn pause(&self, session_id: Uuid, step_id: Option<String>) -> Result<(), ProgressError> {
        let key: TrackingKey = (session_id, step_id.clone());
        let entry = self
            .trackers
            .get(&key)
            .ok_or(ProgressError::NotFound { session_id, step_id })?;
        let mut state = entry.lock().unwrap();
        state.status = TrackerStatus::Paused;
        state.last_update = None;
        self.emit(&key, ProgressEventType::Paused, &state, HashMap::new());
        Ok(())
    }

    pub fn resume(&self, session_id: Uuid, step_id: Option<String>) -> Result<(), ProgressError> {
        let key: TrackingKey = (session_id, step_id.clone());
        let entry = self
            .trackers
            .get(&key)
            .ok_or(ProgressError::NotFound { session_id, step_id })?;
        let mut state = entry.lock().unwrap();
        state.status = TrackerStatus::Running;
        state.last_update = Some((Instant::now(), state.current));
        self.emit(&key, ProgressEventType::Resumed, &state, HashMap::new());
        Ok(())
    }

    pub fn get_metrics(&self, session_id: Uuid, step_id: Option<String>) -> Option<ProgressMetrics> {
        let key: TrackingKey = (session_id, step_id);
        let entry = self.trackers.get(&key)?;
        let state = entry.lock().unwrap();
        Some(ProgressMetrics {
            current: state.current,
            total: state.total,
            unit: state.unit,
            percentage: state.percentage(),
            average_rate: state.average_rate(),
            current_rate: state.current_rate(),
            eta_seconds: state.eta_seconds(),
            peak_rate: state.peak_rate(),
            min_rate: if state.rate_history.is_empty() { 0.0 } else { state.min_rate() },
            rate_history: state.rate_history.iter().cloned().collect(),
        })
    }

    /// Remove all trackers for a session (called after the session
    /// driver tears down, matching `cleanup_session` in the original).
    pub fn cleanup_session(&self, session_id: Uuid) {
        self.trackers.retain(|key, _| key.0 != session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn complete_sets_current_to_total() {
        let tracker = ProgressTracker::default();
        let session_id = Uuid::new_v4();
        tracker.start(session_id, Some("transfer_files".into()), 100, ProgressUnit::Files, None);
        tracker.update(session_id, Some("transfer_files".into()), 40, None, None, HashMap::new()).unwrap();
        tracker.complete(session_id, Some("transfer_files".into()), None).unwrap();

        let metrics = tracker.get_metrics(session_id, Some("transfer_files".into())).unwrap();
        assert_eq!(metrics.current, metrics.total);
        assert_eq!(metrics.current, 100);
    }

    #[test]
    fn update_beyond_total_raises_total() {
        let tracker = ProgressTracker::default();
        let session_id = Uuid::new_v4();
        tracker.start(session_id, None, 10, ProgressUnit::Items, None);
        tracker.update(session_id, None, 15, None, None, HashMap::new()).unwrap();

        let metrics = tracker.get_metrics(session_id, None).unwrap();
        assert_eq!(metrics.current, 15);
        assert_eq!(metrics.total, 15);
        assert!(metrics.current <= metrics.total);
    }

    #[test]
    fn paused_tracker_ignores_updates() {
        let tracker = ProgressTracker::default();
        let session_id = Uuid::new_v4();
        tracker.start(session_id, None, 100, ProgressUnit::Bytes, None);
        tracker.update(session_id, None, 10, None, None, HashMap::new()).unwrap();
        tracker.pause(session_id, None).unwrap();
        tracker.update(session_id, None, 90, None, None, HashMap::new()).unwrap();

        let metrics = tracker.get_metrics(session_id, None).unwrap();
        assert_eq!(metrics.current, 10, "paused tracker must ignore updates");
    }

    #[test]
    fn subscriber_panic_does_not_abort_tracker() {
        let tracker = ProgressTracker::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        tracker.subscribe(move |_event| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            panic!("boom");
        });

        let session_id = Uuid::new_v4();
        tracker.start(session_id, None, 10, ProgressUnit::Items, None);
        tracker.update(session_id, None, 5, None, None, HashMap::new()).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn eta_is_none_when_rate_non_positive() {
        let tracker = ProgressTracker::default();
        let session_id = Uuid::new_v4();
        tracker.start(session_id, None, 100, ProgressUnit::Bytes, None);
        let metrics = tracker.get_metrics(session_id, None).unwrap();
        assert_eq!(metrics.eta_seconds, None);
    }

    #[test]
    fn cleanup_session_removes_all_its_trackers() {
        let tracker = ProgressTracker::default();
        let session_id = Uuid::new_v4();
        tracker.start(session_id, None, 10, ProgressUnit::Items, None);
        tracker.start(session_id, Some("step-a".into()), 10, ProgressUnit::Items, None);
        tracker.cleanup_session(session_id);
        assert!(tracker.get_metrics(session_id, None).is_none());
        assert!(tracker.get_metrics(session_id, Some("step-a".into())).is_none());
    }
}
