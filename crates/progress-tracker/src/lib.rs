mod error;
mod event;
mod metrics;
mod tracker;

pub use error::ProgressError;
pub use event::{ProgressEvent, ProgressEventType};
pub use metrics::ProgressMetrics;
pub use tracker::{ProgressTracker, TrackingKey};
