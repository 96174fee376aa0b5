//! `AuthGate`: the single struct that replaces the five module-level
//! singletons (users/API-keys/tenants/rate-limit/audit) the Python
//! original keeps as globals (spec.md §9 "Global mutable state"). Every
//! protected `control-api` handler goes through one of these methods.

use crate::audit::{AuditEventType, AuditLog};
use crate::error::AuthGateError;
use crate::models::{ApiKey, Principal, TokenResponse};
use crate::rate_limit::RateLimiter;
use crate::store::{ApiKeyStore, RevocationStore, TenantStore, UserStore};
use crate::token::TokenService;
use chrono::Utc;

#[derive(Clone)]
pub struct AuthGate {
    pub users: UserStore,
    pub api_keys: ApiKeyStore,
    pub tenants: TenantStore,
    pub revocations: RevocationStore,
    pub rate_limiter: RateLimiter,
    pub audit: AuditLog,
    tokens: TokenService,
}

impl AuthGate {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            users: UserStore::new(),
            api_keys: ApiKeyStore::new(),
            tenants: TenantStore::new(),
            revocations: RevocationStore::new(),
            rate_limiter: RateLimiter::default(),
            audit: AuditLog::new(),
            tokens: TokenService::new(jwt_secret),
        }
    }

    pub fn with_token_expiry_minutes(mut self, minutes: i64) -> Self {
        self.tokens = self.tokens.with_expiry_minutes(minutes);
        self
    }

    pub fn with_rate_limit(mut self, max_requests: usize, window_secs: u64) -> Self {
        self.rate_limiter = RateLimiter::new(max_requests, window_secs);
        self
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AuthGateError> {
        self.tokens.hash_password(password)
    }

    /// `POST /auth/token` (spec.md §4.H "Token issuance").
    pub fn issue_token(
        &self,
        username: &str,
        password: &str,
        requested_scopes: Option<&[String]>,
        ip_address: &str,
        user_agent: &str,
    ) -> Result<TokenResponse, AuthGateError> {
        let user = self.users.get(username).ok_or(AuthGateError::InvalidCredentials)?;

        if user.disabled {
            self.audit.record(AuditEventType::DisabledUserAccess, Some(username.to_string()), ip_address, TokenService::hash_user_agent(user_agent), "login attempt on disabled user");
            return Err(AuthGateError::UserDisabled);
        }

        let valid = self.tokens.verify_password(password, &user.password_hash)?;
        if !valid {
            self.audit.record(AuditEventType::LoginFailure, Some(username.to_string()), ip_address, TokenService::hash_user_agent(user_agent), "bad password");
            return Err(AuthGateError::InvalidCredentials);
        }

        let (token, claims) = self.tokens.issue(&user, requested_scopes, ip_address, user_agent)?;
        self.audit.record(AuditEventType::LoginSuccess, Some(username.to_string()), ip_address, claims.user_agent_hash.clone(), "token issued");

        Ok(TokenResponse {
            token,
            token_type: "Bearer",
            expires_at: chrono::DateTime::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now),
            scopes: claims.scopes,
        })
    }

    /// Validates a bearer token: signature, expiry, revocation, disabled
    /// user. The IP/user-agent drift check is soft — on mismatch it
    /// records an audit event but does not reject (spec.md §4.H, §9 Open
    /// Questions: "a deployment concern, not a core decision").
    pub fn authenticate_jwt(&self, token: &str, ip_address: &str, user_agent: &str) -> Result<Principal, AuthGateError> {
        let claims = self.tokens.decode(token)?;

        if self.revocations.is_revoked(&claims.jti) {
            return Err(AuthGateError::InvalidToken);
        }

        if let Some(user) = self.users.get(&claims.sub) {
            if user.disabled {
                self.audit.record(AuditEventType::DisabledUserAccess, Some(claims.sub.clone()), ip_address, claims.user_agent_hash.clone(), "request with disabled user's token");
                return Err(AuthGateError::UserDisabled);
            }
        }

        let current_ua_hash = TokenService::hash_user_agent(user_agent);
        if claims.ip_address != ip_address || claims.user_agent_hash != current_ua_hash {
            self.audit.record(
                AuditEventType::UserAgentOrIpDrift,
                Some(claims.sub.clone()),
                ip_address,
                current_ua_hash,
                format!("token issued for ip={} ua_hash={}", claims.ip_address, claims.user_agent_hash),
            );
        } else {
            self.audit.record(AuditEventType::TokenValidated, Some(claims.sub.clone()), ip_address, claims.user_agent_hash.clone(), "token validated");
        }

        Ok(Principal::Jwt(claims))
    }

    /// `X-API-Key` resolution (spec.md §4.H "API keys").
    pub fn authenticate_api_key(&self, key: &str, ip_address: &str, user_agent: &str) -> Result<Principal, AuthGateError> {
        let record: ApiKey = self.api_keys.get(key).ok_or(AuthGateError::UnknownApiKey)?;
        let ua_hash = TokenService::hash_user_agent(user_agent);

        if record.disabled {
            self.audit.record(AuditEventType::DisabledApiKeyAccess, None, ip_address, ua_hash, format!("disabled api key '{}'", record.name));
            return Err(AuthGateError::ApiKeyDisabled);
        }
        if record.is_expired(Utc::now()) {
            return Err(AuthGateError::ApiKeyExpired);
        }

        Ok(Principal::ApiKey(record))
    }

    /// JWT takes precedence over API key when both headers are present
    /// (spec.md §6 "Auth headers").
    pub fn authenticate(&self, bearer: Option<&str>, api_key: Option<&str>, ip_address: &str, user_agent: &str) -> Result<Principal, AuthGateError> {
        if let Some(token) = bearer {
            return self.authenticate_jwt(token, ip_address, user_agent);
        }
        if let Some(key) = api_key {
            return self.authenticate_api_key(key, ip_address, user_agent);
        }
        Err(AuthGateError::MissingCredentials)
    }

    pub fn require_scope(&self, principal: &Principal, scope: &str) -> Result<(), AuthGateError> {
        if principal.has_scope(scope) {
            Ok(())
        } else {
            Err(AuthGateError::InsufficientScope(scope.to_string()))
        }
    }

    /// Tenant isolation invariant (spec.md §3: "An APIKey or session-bound
    /// JWT grants access only to its `tenant_id`'s sessions (admin role
    /// bypasses)").
    pub fn require_tenant(&self, principal: &Principal, resource_tenant_id: Option<&str>) -> Result<(), AuthGateError> {
        if principal.is_admin() || principal.tenant_id() == resource_tenant_id {
            Ok(())
        } else {
            Err(AuthGateError::TenantMismatch)
        }
    }

    /// Sliding-window rate limit check, recording a `rate_limit_exceeded`
    /// audit event on rejection (spec.md §8 scenario 5).
    pub fn check_rate_limit(&self, client_id: &str) -> Result<(), AuthGateError> {
        match self.rate_limiter.check(client_id) {
            None => Ok(()),
            Some(retry_after_secs) => {
                self.audit.record(AuditEventType::RateLimitExceeded, None, client_id, "", format!("client {client_id} exceeded rate limit"));
                Err(AuthGateError::RateLimited { retry_after_secs })
            }
        }
    }

    pub fn revoke_token(&self, jti: &str) {
        self.revocations.revoke(jti);
    }
}
