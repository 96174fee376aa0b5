//! Consistent JSON error envelope (spec.md §4.I): `{error:{code, message,
//! type, details?}}`. Generalizes `rust-auth-service/src/handlers.rs`'s
//! per-handler `.map_err(|_| StatusCode::X)` pattern into a single
//! `IntoResponse` impl, since the envelope here carries more than a bare
//! status code.

use auth_gate::AuthGateError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use migration_core::CoreError;
use migration_orchestrator::OrchestratorError;
use report_generator::ReportError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControlApiError {
    #[error(transparent)]
    Auth(#[from] AuthGateError),
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl ControlApiError {
    fn status_code_and_type(&self) -> (StatusCode, &'static str) {
        match self {
            ControlApiError::Auth(AuthGateError::InvalidCredentials)
            | ControlApiError::Auth(AuthGateError::InvalidToken)
            | ControlApiError::Auth(AuthGateError::TokenExpired)
            | ControlApiError::Auth(AuthGateError::UserDisabled)
            | ControlApiError::Auth(AuthGateError::ApiKeyDisabled)
            | ControlApiError::Auth(AuthGateError::ApiKeyExpired)
            | ControlApiError::Auth(AuthGateError::UnknownApiKey)
            | ControlApiError::Auth(AuthGateError::MissingCredentials) => (StatusCode::UNAUTHORIZED, "http_error"),
            ControlApiError::Auth(AuthGateError::InsufficientScope(_)) | ControlApiError::Auth(AuthGateError::TenantMismatch) => {
                (StatusCode::FORBIDDEN, "http_error")
            }
            ControlApiError::Auth(AuthGateError::RateLimited { .. }) => (StatusCode::TOO_MANY_REQUESTS, "http_error"),
            ControlApiError::Auth(AuthGateError::Internal(_)) => (StatusCode::INTERNAL_SERVER_ERROR, "server_error"),
            ControlApiError::Orchestrator(OrchestratorError::NotFound(_)) => (StatusCode::NOT_FOUND, "http_error"),
            ControlApiError::Orchestrator(OrchestratorError::InvalidState { .. }) => (StatusCode::CONFLICT, "http_error"),
            ControlApiError::Orchestrator(OrchestratorError::Configuration(_)) => (StatusCode::BAD_REQUEST, "http_error"),
            ControlApiError::Orchestrator(OrchestratorError::StepFailed { .. })
            | ControlApiError::Orchestrator(OrchestratorError::CollaboratorMissing(_))
            | ControlApiError::Orchestrator(OrchestratorError::Core(_)) => (StatusCode::INTERNAL_SERVER_ERROR, "server_error"),
            ControlApiError::Core(CoreError::SessionNotFound(_)) => (StatusCode::NOT_FOUND, "http_error"),
            ControlApiError::Core(CoreError::CircularDependency { .. }) | ControlApiError::Core(CoreError::UnknownDependency(..)) => {
                (StatusCode::BAD_REQUEST, "http_error")
            }
            ControlApiError::Core(_) => (StatusCode::BAD_REQUEST, "http_error"),
            ControlApiError::Report(_) => (StatusCode::INTERNAL_SERVER_ERROR, "server_error"),
            ControlApiError::NotFound(_) => (StatusCode::NOT_FOUND, "http_error"),
            ControlApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "http_error"),
        }
    }
}

impl IntoResponse for ControlApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_code_and_type();
        let code = match &self {
            ControlApiError::Auth(AuthGateError::RateLimited { .. }) => "RATE_LIMITED",
            ControlApiError::Auth(_) => "AUTH_ERROR",
            ControlApiError::Orchestrator(_) => "ORCHESTRATOR_ERROR",
            ControlApiError::Core(_) => "CONFIGURATION_ERROR",
            ControlApiError::Report(_) => "REPORT_ERROR",
            ControlApiError::NotFound(_) => "NOT_FOUND",
            ControlApiError::BadRequest(_) => "BAD_REQUEST",
        };

        let mut body = json!({
            "error": {
                "code": code,
                "message": self.to_string(),
                "type": kind,
            }
        });

        if let ControlApiError::Auth(AuthGateError::RateLimited { retry_after_secs }) = &self {
            body["error"]["details"] = json!({ "retry_after_secs": retry_after_secs });
            let mut response = (status, Json(body)).into_response();
            response.headers_mut().insert("Retry-After", retry_after_secs.to_string().parse().unwrap());
            return response;
        }

        (status, Json(body)).into_response()
    }
}
