//! Auth + rate-limit middleware, generalizing
//! `rust-auth-service/src/middleware.rs`'s `auth_middleware` (which
//! re-derived an `AuthService` from the environment on every call — fixed
//! here by threading the real `AuthGate` through `State`) into the
//! JWT-or-API-key, scope-aware surface spec.md §4.H describes.

use crate::error::ControlApiError;
use crate::state::AppState;
use auth_gate::Principal;
use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;

fn client_ip(req: &Request) -> String {
    req.extensions().get::<ConnectInfo<SocketAddr>>().map(|ci| ci.0.ip().to_string()).unwrap_or_else(|| "unknown".to_string())
}

fn user_agent(req: &Request) -> String {
    req.headers().get(axum::http::header::USER_AGENT).and_then(|v| v.to_str().ok()).unwrap_or("").to_string()
}

fn bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.to_string())
}

fn api_key_header(req: &Request) -> Option<String> {
    req.headers().get("x-api-key").and_then(|v| v.to_str().ok()).map(|s| s.to_string())
}

/// Authenticates the caller (JWT takes precedence over API key, spec.md
/// §6), applies the sliding-window rate limit keyed by the resolved
/// identity, and inserts the [`Principal`] into request extensions for
/// handlers to read via `Extension<Principal>`.
pub async fn auth_middleware(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let ip = client_ip(&req);
    let ua = user_agent(&req);
    let bearer = bearer_token(&req);
    let api_key = api_key_header(&req);

    let principal = match state.auth.authenticate(bearer.as_deref(), api_key.as_deref(), &ip, &ua) {
        Ok(principal) => principal,
        Err(err) => return ControlApiError::from(err).into_response(),
    };

    if let Err(err) = state.auth.check_rate_limit(&principal.identifier()) {
        return ControlApiError::from(err).into_response();
    }

    req.extensions_mut().insert(principal);
    next.run(req).await
}

/// Rate-limits unauthenticated endpoints (e.g. `/auth/token`) by client
/// IP, mirroring the same sliding-window contract applied post-auth.
pub async fn public_rate_limit_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let ip = client_ip(&req);
    if let Err(err) = state.auth.check_rate_limit(&format!("ip:{ip}")) {
        return ControlApiError::from(err).into_response();
    }
    next.run(req).await
}

pub fn require_scope(principal: &Principal, scope: &str) -> Result<(), ControlApiError> {
    if principal.has_scope(scope) {
        Ok(())
    } else {
        Err(ControlApiError::Auth(auth_gate::AuthGateError::InsufficientScope(scope.to_string())))
    }
}
