//! Password hashing and JWT issuance/validation, generalized from
//! `rust-auth-service/src/auth.rs`'s `AuthService` (bcrypt + HS256 via
//! `jsonwebtoken`). Adds the claim fields spec.md §4.H requires beyond
//! the teacher's `sub`/`username`/`roles`/`exp`/`iat`: `tenant_id`,
//! `scopes`, `jti`, `ip_address`, `user_agent_hash`.

use crate::error::AuthGateError;
use crate::models::{Claims, Role, User};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sha2::{Digest, Sha256};
use uuid::Uuid;

pub const DEFAULT_TOKEN_EXPIRY_MINUTES: i64 = 30;

#[derive(Clone)]
pub struct TokenService {
    secret: String,
    expiry_minutes: i64,
}

impl TokenService {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into(), expiry_minutes: DEFAULT_TOKEN_EXPIRY_MINUTES }
    }

    pub fn with_expiry_minutes(mut self, minutes: i64) -> Self {
        self.expiry_minutes = minutes;
        self
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AuthGateError> {
        hash(password, DEFAULT_COST).map_err(|e| AuthGateError::Internal(e.to_string()))
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthGateError> {
        verify(password, hash).map_err(|e| AuthGateError::Internal(e.to_string()))
    }

    /// Hashes a user-agent string to the first 16 hex chars of its
    /// SHA-256 digest (spec.md §4.H "Token issuance").
    pub fn hash_user_agent(user_agent: &str) -> String {
        let digest = Sha256::digest(user_agent.as_bytes());
        let full = format!("{digest:x}");
        full[..16].to_string()
    }

    /// Issues a signed token scoped to the intersection of `requested`
    /// and the user's own scopes (spec.md §4.H).
    pub fn issue(
        &self,
        user: &User,
        requested_scopes: Option<&[String]>,
        ip_address: &str,
        user_agent: &str,
    ) -> Result<(String, Claims), AuthGateError> {
        let scopes = match requested_scopes {
            Some(requested) => user.scopes.iter().filter(|s| requested.contains(s)).cloned().collect(),
            None => user.scopes.clone(),
        };

        let now = Utc::now();
        let claims = Claims {
            sub: user.username.clone(),
            tenant_id: user.tenant_id.clone(),
            scopes,
            role: user.role,
            iat: now.timestamp(),
            exp: (now + chrono::Duration::minutes(self.expiry_minutes)).timestamp(),
            jti: Uuid::new_v4().to_string(),
            ip_address: ip_address.to_string(),
            user_agent_hash: Self::hash_user_agent(user_agent),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(self.secret.as_ref()))
            .map_err(|e| AuthGateError::Internal(e.to_string()))?;
        Ok((token, claims))
    }

    /// Decodes and verifies a token's signature and expiry. Does not
    /// check IP/user-agent drift or revocation — those are soft checks
    /// performed by the caller (`AuthGate::authenticate_jwt`).
    pub fn decode(&self, token: &str) -> Result<Claims, AuthGateError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        decode::<Claims>(token, &DecodingKey::from_secret(self.secret.as_ref()), &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthGateError::TokenExpired,
                _ => AuthGateError::InvalidToken,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn sample_user() -> User {
        User {
            username: "alice".into(),
            password_hash: String::new(),
            role: Role::User,
            tenant_id: Some("tenant-a".into()),
            scopes: vec!["migrations:read".into(), "migrations:write".into()],
            disabled: false,
        }
    }

    #[test]
    fn password_hash_round_trips() {
        let svc = TokenService::new("secret");
        let hash = svc.hash_password("hunter2").unwrap();
        assert!(svc.verify_password("hunter2", &hash).unwrap());
        assert!(!svc.verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn issued_token_decodes_with_requested_scope_intersection() {
        let svc = TokenService::new("secret");
        let user = sample_user();
        let (token, claims) = svc.issue(&user, Some(&["migrations:read".to_string()]), "1.2.3.4", "curl/8.0").unwrap();
        assert_eq!(claims.scopes, vec!["migrations:read".to_string()]);

        let decoded = svc.decode(&token).unwrap();
        assert_eq!(decoded.sub, "alice");
        assert_eq!(decoded.tenant_id.as_deref(), Some("tenant-a"));
    }

    #[test]
    fn expired_token_is_rejected() {
        let svc = TokenService::new("secret").with_expiry_minutes(-1);
        let user = sample_user();
        let (token, _) = svc.issue(&user, None, "1.2.3.4", "curl/8.0").unwrap();
        let err = svc.decode(&token).unwrap_err();
        assert!(matches!(err, AuthGateError::TokenExpired));
    }

    #[test]
    fn user_agent_hash_is_sixteen_hex_chars() {
        let hash = TokenService::hash_user_agent("Mozilla/5.0");
        assert_eq!(hash.len(), 16);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
