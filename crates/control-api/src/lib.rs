//! HTTP control plane (spec.md §4.H/§4.I): authenticates callers via
//! [`auth_gate`], drives [`migration_orchestrator::Orchestrator`]
//! sessions, and surfaces the preset catalog. Generalizes
//! `rust-auth-service`'s axum surface to the full migration API.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod presets;
pub mod router;
pub mod state;

pub use error::ControlApiError;
pub use presets::{InMemoryPresetCatalog, PresetCatalog, PresetSummary};
pub use router::build_router;
pub use state::AppState;

#[cfg(test)]
mod tests {
    use super::*;
    use auth_gate::{AuthGate, Role, User};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use migration_orchestrator::{noop::noop_collaborators, Orchestrator};
    use performance_monitor::{PerformanceMonitor, PerformanceMonitorConfig};
    use progress_tracker::ProgressTracker;
    use report_generator::ReportGenerator;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let auth = AuthGate::new("test-secret-key-long-enough");
        auth.users.insert(
            "alice".to_string(),
            User {
                username: "alice".to_string(),
                password_hash: auth.hash_password("hunter2").unwrap(),
                role: Role::User,
                tenant_id: Some("tenant-a".to_string()),
                scopes: vec!["migrations:read".to_string(), "migrations:write".to_string(), "presets:read".to_string()],
                disabled: false,
            },
        );

        let progress = Arc::new(ProgressTracker::default());
        let performance = PerformanceMonitor::new(PerformanceMonitorConfig::default(), Default::default());
        let orchestrator = Orchestrator::new(noop_collaborators(), progress, performance);
        let reports = ReportGenerator::new(std::env::temp_dir().join("control-api-test-reports")).unwrap();
        let presets = presets::InMemoryPresetCatalog::new();

        AppState::new(auth, orchestrator, reports, presets)
    }

    #[tokio::test]
    async fn health_check_requires_no_auth() {
        let app = build_router(test_state());
        let response = app.oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_route_without_credentials_is_rejected() {
        let app = build_router(test_state());
        let response = app.oneshot(Request::builder().uri("/migrations").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn token_then_authenticated_request_round_trips() {
        let app = build_router(test_state());

        let token_response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/auth/token")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"username":"alice","password":"hunter2"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(token_response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(token_response.into_body(), usize::MAX).await.unwrap();
        let token: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let bearer = token["token"].as_str().unwrap();

        let whoami_response = app
            .oneshot(
                Request::builder()
                    .uri("/auth/me")
                    .header("authorization", format!("Bearer {bearer}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(whoami_response.status(), StatusCode::OK);
    }
}
