//! In-memory `username -> User` / `key -> ApiKey` / `id -> Tenant` maps,
//! generalizing `rust-auth-service/src/store.rs`'s single `UserStore`
//! into the three stores spec.md §9 "Global mutable state" calls for
//! (plus tenants). Each is constructed empty; callers seed test data
//! explicitly rather than relying on a baked-in admin account, per
//! spec.md §9 ("tests construct fresh ones per scenario").

use crate::models::{ApiKey, Tenant, User};
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct UserStore {
    users: Arc<DashMap<String, User>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user: User) {
        self.users.insert(user.username.clone(), user);
    }

    pub fn get(&self, username: &str) -> Option<User> {
        self.users.get(username).map(|e| e.clone())
    }
}

#[derive(Clone, Default)]
pub struct ApiKeyStore {
    keys: Arc<DashMap<String, ApiKey>>,
}

impl ApiKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, api_key: ApiKey) {
        self.keys.insert(api_key.key.clone(), api_key);
    }

    pub fn get(&self, key: &str) -> Option<ApiKey> {
        self.keys.get(key).map(|e| e.clone())
    }
}

#[derive(Clone, Default)]
pub struct TenantStore {
    tenants: Arc<DashMap<String, Tenant>>,
}

impl TenantStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, tenant: Tenant) {
        self.tenants.insert(tenant.id.clone(), tenant);
    }

    pub fn get(&self, id: &str) -> Option<Tenant> {
        self.tenants.get(id).map(|e| e.clone())
    }

    pub fn is_disabled(&self, id: &str) -> bool {
        self.tenants.get(id).map(|t| t.disabled).unwrap_or(false)
    }
}

/// Revoked-token set keyed by `jti` (spec.md §4.H "Token validation":
/// "Optionally consult a revocation set keyed by `jti`").
#[derive(Clone, Default)]
pub struct RevocationStore {
    revoked: Arc<DashMap<String, ()>>,
}

impl RevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revoke(&self, jti: &str) {
        self.revoked.insert(jti.to_string(), ());
    }

    pub fn is_revoked(&self, jti: &str) -> bool {
        self.revoked.contains_key(jti)
    }
}
