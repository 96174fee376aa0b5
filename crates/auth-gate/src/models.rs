use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Coarse role, checked before scopes: admin implicitly satisfies every
/// scope and bypasses tenant isolation (spec.md §4.H).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    User,
    Viewer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub tenant_id: Option<String>,
    pub scopes: Vec<String>,
    pub disabled: bool,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// A long-lived credential resolved from the `X-API-Key` header
/// (spec.md §4.H "API keys").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKey {
    pub key: String,
    pub name: String,
    pub tenant_id: Option<String>,
    pub scopes: Vec<String>,
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
    pub disabled: bool,
}

impl ApiKey {
    pub fn is_expired(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        self.expires_at.map(|exp| exp <= now).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    pub settings: HashMap<String, serde_json::Value>,
    pub disabled: bool,
}

/// JWT claims, signed HMAC-SHA-256 (spec.md §4.H "Token issuance").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub tenant_id: Option<String>,
    pub scopes: Vec<String>,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub ip_address: String,
    pub user_agent_hash: String,
}

/// The authenticated caller for a request, resolved from either a JWT or
/// an API key (spec.md §4.H: "Either is sufficient; both may be sent but
/// JWT takes precedence").
#[derive(Debug, Clone)]
pub enum Principal {
    Jwt(Claims),
    ApiKey(ApiKey),
}

impl Principal {
    pub fn tenant_id(&self) -> Option<&str> {
        match self {
            Principal::Jwt(claims) => claims.tenant_id.as_deref(),
            Principal::ApiKey(key) => key.tenant_id.as_deref(),
        }
    }

    pub fn scopes(&self) -> &[String] {
        match self {
            Principal::Jwt(claims) => &claims.scopes,
            Principal::ApiKey(key) => &key.scopes,
        }
    }

    /// API keys never carry a role; only JWT-authenticated users can be
    /// admins (spec.md §4.H "Admin role implicitly satisfies every
    /// scope").
    pub fn is_admin(&self) -> bool {
        matches!(self, Principal::Jwt(claims) if claims.role == Role::Admin)
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.is_admin() || self.scopes().iter().any(|s| s == scope)
    }

    pub fn identifier(&self) -> String {
        match self {
            Principal::Jwt(claims) => format!("user:{}", claims.sub),
            Principal::ApiKey(key) => format!("apikey:{}", key.name),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub scopes: Vec<String>,
}
