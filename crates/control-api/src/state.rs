use crate::presets::InMemoryPresetCatalog;
use auth_gate::AuthGate;
use migration_orchestrator::Orchestrator;
use report_generator::ReportGenerator;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state, generalizing
/// `rust-auth-service/src/handlers.rs`'s `AppState` (auth service + user
/// store + start time + request counter) to the full migration surface.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthGate>,
    pub orchestrator: Arc<Orchestrator>,
    pub reports: Arc<ReportGenerator>,
    pub presets: Arc<InMemoryPresetCatalog>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(auth: AuthGate, orchestrator: Orchestrator, reports: ReportGenerator, presets: InMemoryPresetCatalog) -> Self {
        Self {
            auth: Arc::new(auth),
            orchestrator: Arc::new(orchestrator),
            reports: Arc::new(reports),
            presets: Arc::new(presets),
            start_time: Instant::now(),
        }
    }
}
