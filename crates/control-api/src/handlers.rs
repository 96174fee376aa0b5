use crate::error::ControlApiError;
use crate::middleware::require_scope;
use crate::state::AppState;
use auth_gate::Principal;
use axum::extract::{Extension, Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use migration_core::MigrationConfig;
use migration_orchestrator::ValidationPhase;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

// ---------------------------------------------------------------- health

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_seconds: u64,
    pub components: Value,
}

/// `GET /health` (spec.md §4.I): no auth required.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        uptime_seconds: state.start_time.elapsed().as_secs(),
        components: json!({
            "orchestrator": "up",
            "session_store": "up",
            "report_generator": "up",
        }),
    })
}

// ------------------------------------------------------------------ auth

#[derive(Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
    pub scopes: Option<Vec<String>>,
}

/// `POST /auth/token` (spec.md §4.H).
pub async fn issue_token(
    State(state): State<AppState>,
    connect_info: Option<axum::extract::ConnectInfo<std::net::SocketAddr>>,
    headers: axum::http::HeaderMap,
    Json(req): Json<TokenRequest>,
) -> Result<impl IntoResponse, ControlApiError> {
    let ip = connect_info.map(|c| c.0.ip().to_string()).unwrap_or_else(|| "unknown".to_string());
    let user_agent = headers.get(axum::http::header::USER_AGENT).and_then(|v| v.to_str().ok()).unwrap_or("");
    let response = state.auth.issue_token(&req.username, &req.password, req.scopes.as_deref(), &ip, user_agent)?;
    Ok(Json(response))
}

#[derive(Serialize)]
pub struct WhoAmI {
    pub subject: String,
    pub tenant_id: Option<String>,
    pub scopes: Vec<String>,
    pub is_admin: bool,
}

/// `GET /auth/me` (spec.md §4.I).
pub async fn whoami(Extension(principal): Extension<Principal>) -> Json<WhoAmI> {
    let subject = match &principal {
        Principal::Jwt(claims) => claims.sub.clone(),
        Principal::ApiKey(key) => key.name.clone(),
    };
    Json(WhoAmI {
        subject,
        tenant_id: principal.tenant_id().map(|s| s.to_string()),
        scopes: principal.scopes().to_vec(),
        is_admin: principal.is_admin(),
    })
}

// ------------------------------------------------------------ migrations

#[derive(Deserialize)]
pub struct CreateMigrationRequest {
    #[serde(flatten)]
    pub config: MigrationConfig,
}

#[derive(Serialize)]
pub struct CreateMigrationResponse {
    pub id: Uuid,
}

/// `POST /migrations` (spec.md §4.I, scope `migrations:write`). A
/// non-admin caller's config is pinned to their own tenant regardless of
/// what the request body supplied, preserving the tenant-isolation
/// invariant (spec.md §3) at creation time rather than leaving it to be
/// caught later.
pub async fn create_migration(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CreateMigrationRequest>,
) -> Result<impl IntoResponse, ControlApiError> {
    require_scope(&principal, "migrations:write")?;

    let mut config = req.config;
    if !principal.is_admin() {
        config.tenant_id = principal.tenant_id().map(|s| s.to_string());
    }

    let id = state.orchestrator.create_session(config)?;
    Ok((StatusCode::CREATED, Json(CreateMigrationResponse { id })))
}

#[derive(Deserialize)]
pub struct ListMigrationsQuery {
    pub status: Option<String>,
}

/// `GET /migrations` (spec.md §4.I, scope `migrations:read`).
pub async fn list_migrations(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ListMigrationsQuery>,
) -> Result<impl IntoResponse, ControlApiError> {
    require_scope(&principal, "migrations:read")?;

    let sessions = state.orchestrator.store().list_for_tenant(principal.tenant_id(), principal.is_admin());
    let filtered: Vec<_> = sessions
        .into_iter()
        .filter(|s| query.status.as_deref().map(|st| format!("{:?}", s.status).to_lowercase() == st.to_lowercase()).unwrap_or(true))
        .collect();
    Ok(Json(filtered))
}

async fn authorize_session_access(state: &AppState, principal: &Principal, id: Uuid, scope: &str) -> Result<migration_core::MigrationSession, ControlApiError> {
    require_scope(principal, scope)?;
    let session = state.orchestrator.get_session(id)?;
    state.auth.require_tenant(principal, session.tenant_id.as_deref())?;
    Ok(session)
}

/// `GET /migrations/{id}/status` (spec.md §4.I, scope `migrations:read`).
pub async fn migration_status(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ControlApiError> {
    let session = authorize_session_access(&state, &principal, id, "migrations:read").await?;
    let progress = state.orchestrator.progress().get_metrics(id, None);
    Ok(Json(json!({
        "id": session.id,
        "status": session.status,
        "current_step_id": session.current_step_id,
        "steps": session.steps,
        "started_at": session.started_at,
        "ended_at": session.ended_at,
        "error": session.error,
        "progress": progress,
    })))
}

#[derive(Deserialize, Default)]
pub struct StartMigrationRequest {
    #[serde(default)]
    pub auto_rollback: bool,
}

/// `POST /migrations/{id}/start` (spec.md §4.I, scope `migrations:write`).
/// Returns immediately after spawning the session driver; progress is
/// polled via `migration_status`.
pub async fn start_migration(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    body: Option<Json<StartMigrationRequest>>,
) -> Result<impl IntoResponse, ControlApiError> {
    authorize_session_access(&state, &principal, id, "migrations:write").await?;
    let auto_rollback = body.map(|Json(b)| b.auto_rollback).unwrap_or(true);

    let orchestrator = state.orchestrator.clone();
    tokio::spawn(async move {
        if let Err(err) = orchestrator.execute(id, auto_rollback).await {
            tracing::warn!(session_id = %id, error = %err, "session execution returned an error");
        }
    });

    Ok(StatusCode::ACCEPTED)
}

/// `POST /migrations/{id}/cancel` (spec.md §4.I, scope `migrations:write`).
pub async fn cancel_migration(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ControlApiError> {
    authorize_session_access(&state, &principal, id, "migrations:write").await?;
    state.orchestrator.cancel(id)?;
    Ok(StatusCode::ACCEPTED)
}

/// `POST /migrations/{id}/rollback` (spec.md §4.I, scope
/// `migrations:write`).
pub async fn rollback_migration(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ControlApiError> {
    authorize_session_access(&state, &principal, id, "migrations:write").await?;
    let session = state.orchestrator.rollback_session(id).await?;
    Ok(Json(session))
}

// ---------------------------------------------------------------- presets

/// `GET /presets` (spec.md §4.I, scope `presets:read`).
pub async fn list_presets(State(state): State<AppState>, Extension(principal): Extension<Principal>) -> Result<impl IntoResponse, ControlApiError> {
    require_scope(&principal, "presets:read")?;
    Ok(Json(state.presets.list()))
}

#[derive(Deserialize, Default)]
pub struct CreateFromPresetRequest {
    #[serde(default)]
    pub overrides: Option<Value>,
}

/// `POST /presets/{id}/create-migration` (spec.md §4.I, scope
/// `migrations:write`).
pub async fn create_migration_from_preset(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    Json(req): Json<CreateFromPresetRequest>,
) -> Result<impl IntoResponse, ControlApiError> {
    require_scope(&principal, "migrations:write")?;

    let result = state
        .presets
        .create_migration_config(&id, req.overrides.as_ref())
        .ok_or_else(|| ControlApiError::NotFound(format!("preset '{id}' not found")))?;
    let mut config = result.map_err(|e| ControlApiError::BadRequest(format!("invalid preset configuration: {e}")))?;

    if !principal.is_admin() {
        config.tenant_id = principal.tenant_id().map(|s| s.to_string());
    }

    let session_id = state.orchestrator.create_session(config)?;
    Ok((StatusCode::CREATED, Json(CreateMigrationResponse { id: session_id })))
}

// --------------------------------------------------------------- validate

/// `POST /validate` (spec.md §4.I, scope `migrations:read`): synchronous
/// validation of a `MigrationConfig` outside of any session.
pub async fn validate_config(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(config): Json<MigrationConfig>,
) -> Result<impl IntoResponse, ControlApiError> {
    require_scope(&principal, "migrations:read")?;
    let result = state
        .orchestrator
        .validation_engine()
        .validate(&config, ValidationPhase::Pre)
        .await
        .map_err(|e| ControlApiError::BadRequest(e.to_string()))?;
    Ok(Json(result))
}
