//! Binary entry point (spec.md §6 "Configuration"), generalizing
//! `rust-auth-service/src/server.rs`'s env-var bootstrap to the full
//! migration control plane: builds the [`auth_gate::AuthGate`],
//! [`migration_orchestrator::Orchestrator`], [`report_generator::ReportGenerator`],
//! and preset catalog, then serves the router with real client IPs.
//!
//! Concrete transfer/database/backup collaborators are explicitly out of
//! scope (spec.md §1 Non-goals); this binary wires the orchestrator to
//! the noop collaborator set shipped for that contract, the same one the
//! orchestrator's own test suite exercises. A real deployment supplies
//! its own [`migration_orchestrator::Collaborators`] implementation.

use control_api::{build_router, AppState};
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let jwt_secret = env::var("SECRET_KEY").unwrap_or_else(|_| {
        tracing::warn!("SECRET_KEY not set, using an insecure development default");
        "development-secret-change-in-production".to_string()
    });
    let token_expiry_minutes: i64 = env::var("ACCESS_TOKEN_EXPIRE_MINUTES").ok().and_then(|v| v.parse().ok()).unwrap_or(30);
    let rate_limit_requests: usize = env::var("RATE_LIMIT_REQUESTS").ok().and_then(|v| v.parse().ok()).unwrap_or(100);
    let rate_limit_window: u64 = env::var("RATE_LIMIT_WINDOW").ok().and_then(|v| v.parse().ok()).unwrap_or(60);
    let report_directory = env::var("REPORT_DIRECTORY").unwrap_or_else(|_| "./reports".to_string());
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "8080".to_string());

    let auth = auth_gate::AuthGate::new(jwt_secret).with_token_expiry_minutes(token_expiry_minutes).with_rate_limit(rate_limit_requests, rate_limit_window);

    let progress = Arc::new(progress_tracker::ProgressTracker::default());
    let performance = performance_monitor::PerformanceMonitor::new(Default::default(), Default::default());
    let collaborators = migration_orchestrator::noop::noop_collaborators();
    let orchestrator = migration_orchestrator::Orchestrator::new(collaborators, progress, performance);

    let reports = report_generator::ReportGenerator::new(report_directory).expect("failed to initialize report directory");
    let presets = control_api::InMemoryPresetCatalog::new();

    let state = AppState::new(auth, orchestrator, reports, presets);
    let app = build_router(state);

    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr).await.expect("failed to bind listener");
    tracing::info!(%addr, "control-api listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await.expect("server error");
}
