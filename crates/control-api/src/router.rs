//! Route table (spec.md §4.I), generalizing
//! `rust-auth-service/src/server.rs`'s public/protected/admin grouping:
//! here scopes rather than a single admin flag gate each group, and
//! `/auth/token` gets its own IP-keyed rate limit since it runs before
//! any [`auth_gate::Principal`] exists.

use crate::handlers;
use crate::middleware::{auth_middleware, public_rate_limit_middleware};
use crate::state::AppState;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new().route("/health", get(handlers::health_check));

    let auth_routes = Router::new()
        .route("/auth/token", post(handlers::issue_token))
        .route_layer(from_fn_with_state(state.clone(), public_rate_limit_middleware));

    let authenticated_routes = Router::new()
        .route("/auth/me", get(handlers::whoami))
        .route("/migrations", post(handlers::create_migration).get(handlers::list_migrations))
        .route("/migrations/:id/status", get(handlers::migration_status))
        .route("/migrations/:id/start", post(handlers::start_migration))
        .route("/migrations/:id/cancel", post(handlers::cancel_migration))
        .route("/migrations/:id/rollback", post(handlers::rollback_migration))
        .route("/presets", get(handlers::list_presets))
        .route("/presets/:id/create-migration", post(handlers::create_migration_from_preset))
        .route("/validate", post(handlers::validate_config))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(authenticated_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
