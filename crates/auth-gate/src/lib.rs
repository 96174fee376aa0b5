//! JWT + API-key authentication, scope/role gating, tenant isolation,
//! sliding-window rate limiting, and audit logging (spec.md §4.H).
//!
//! Generalizes `rust-auth-service` end to end: `TokenService` keeps that
//! crate's bcrypt + `jsonwebtoken` HS256 shape, `UserStore`/`ApiKeyStore`/
//! `TenantStore` keep its `DashMap`-backed store pattern, and `AuthGate`
//! replaces the Python original's five module-level singletons with
//! explicit fields constructed at startup (spec.md §9).

mod audit;
mod error;
mod gate;
mod models;
mod rate_limit;
mod store;
mod token;

pub use audit::{AuditEvent, AuditEventType, AuditLog};
pub use error::AuthGateError;
pub use gate::AuthGate;
pub use models::{ApiKey, Claims, Principal, Role, Tenant, TokenResponse, User};
pub use rate_limit::RateLimiter;
pub use store::{ApiKeyStore, RevocationStore, TenantStore, UserStore};
pub use token::TokenService;

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_gate() -> AuthGate {
        let gate = AuthGate::new("test-secret");
        let password_hash = gate.hash_password("s3cret!").unwrap();
        gate.users.insert(User {
            username: "alice".into(),
            password_hash,
            role: Role::User,
            tenant_id: Some("tenant-a".into()),
            scopes: vec!["migrations:read".into(), "migrations:write".into()],
            disabled: false,
        });
        gate.users.insert(User {
            username: "root".into(),
            password_hash: gate.hash_password("adminpass").unwrap(),
            role: Role::Admin,
            tenant_id: None,
            scopes: vec![],
            disabled: false,
        });
        gate.users.insert(User {
            username: "disabled".into(),
            password_hash: gate.hash_password("whatever").unwrap(),
            role: Role::User,
            tenant_id: Some("tenant-a".into()),
            scopes: vec![],
            disabled: true,
        });
        gate
    }

    #[test]
    fn issues_and_validates_a_token_round_trip() {
        let gate = seeded_gate();
        let response = gate.issue_token("alice", "s3cret!", None, "1.2.3.4", "curl/8.0").unwrap();
        let principal = gate.authenticate(Some(&response.token), None, "1.2.3.4", "curl/8.0").unwrap();
        assert_eq!(principal.tenant_id(), Some("tenant-a"));
        assert!(principal.has_scope("migrations:read"));
    }

    #[test]
    fn wrong_password_is_rejected() {
        let gate = seeded_gate();
        let err = gate.issue_token("alice", "wrong", None, "1.2.3.4", "curl/8.0").unwrap_err();
        assert!(matches!(err, AuthGateError::InvalidCredentials));
    }

    #[test]
    fn disabled_user_cannot_get_a_token() {
        let gate = seeded_gate();
        let err = gate.issue_token("disabled", "whatever", None, "1.2.3.4", "curl/8.0").unwrap_err();
        assert!(matches!(err, AuthGateError::UserDisabled));
    }

    #[test]
    fn ip_drift_is_soft_and_does_not_reject() {
        let gate = seeded_gate();
        let response = gate.issue_token("alice", "s3cret!", None, "1.2.3.4", "curl/8.0").unwrap();
        let principal = gate.authenticate(Some(&response.token), None, "9.9.9.9", "curl/8.0").unwrap();
        assert!(principal.has_scope("migrations:read"));
        assert!(gate.audit.recent(5).iter().any(|e| matches!(e.event_type, AuditEventType::UserAgentOrIpDrift)));
    }

    #[test]
    fn revoked_token_is_rejected() {
        let gate = seeded_gate();
        let response = gate.issue_token("alice", "s3cret!", None, "1.2.3.4", "curl/8.0").unwrap();
        let principal = gate.authenticate(Some(&response.token), None, "1.2.3.4", "curl/8.0").unwrap();
        let jti = match principal {
            Principal::Jwt(claims) => claims.jti,
            _ => unreachable!(),
        };
        gate.revoke_token(&jti);
        let err = gate.authenticate(Some(&response.token), None, "1.2.3.4", "curl/8.0").unwrap_err();
        assert!(matches!(err, AuthGateError::InvalidToken));
    }

    #[test]
    fn admin_bypasses_tenant_isolation() {
        let gate = seeded_gate();
        let response = gate.issue_token("root", "adminpass", None, "1.2.3.4", "curl/8.0").unwrap();
        let principal = gate.authenticate(Some(&response.token), None, "1.2.3.4", "curl/8.0").unwrap();
        assert!(gate.require_tenant(&principal, Some("tenant-b")).is_ok());
    }

    #[test]
    fn non_admin_is_confined_to_own_tenant() {
        let gate = seeded_gate();
        let response = gate.issue_token("alice", "s3cret!", None, "1.2.3.4", "curl/8.0").unwrap();
        let principal = gate.authenticate(Some(&response.token), None, "1.2.3.4", "curl/8.0").unwrap();
        assert!(gate.require_tenant(&principal, Some("tenant-a")).is_ok());
        assert!(gate.require_tenant(&principal, Some("tenant-b")).is_err());
    }

    #[test]
    fn api_key_disabled_is_rejected() {
        let gate = seeded_gate();
        gate.api_keys.insert(ApiKey {
            key: "key-123".into(),
            name: "ci-bot".into(),
            tenant_id: Some("tenant-a".into()),
            scopes: vec!["migrations:read".into()],
            expires_at: None,
            disabled: true,
        });
        let err = gate.authenticate(None, Some("key-123"), "1.2.3.4", "curl/8.0").unwrap_err();
        assert!(matches!(err, AuthGateError::ApiKeyDisabled));
    }

    #[test]
    fn api_key_expired_is_rejected() {
        let gate = seeded_gate();
        gate.api_keys.insert(ApiKey {
            key: "key-456".into(),
            name: "old-key".into(),
            tenant_id: None,
            scopes: vec![],
            expires_at: Some(chrono::Utc::now() - chrono::Duration::days(1)),
            disabled: false,
        });
        let err = gate.authenticate(None, Some("key-456"), "1.2.3.4", "curl/8.0").unwrap_err();
        assert!(matches!(err, AuthGateError::ApiKeyExpired));
    }

    #[test]
    fn jwt_takes_precedence_over_api_key_when_both_present() {
        let gate = seeded_gate();
        let response = gate.issue_token("alice", "s3cret!", None, "1.2.3.4", "curl/8.0").unwrap();
        gate.api_keys.insert(ApiKey {
            key: "irrelevant".into(),
            name: "ignored".into(),
            tenant_id: Some("tenant-z".into()),
            scopes: vec![],
            expires_at: None,
            disabled: false,
        });
        let principal = gate.authenticate(Some(&response.token), Some("irrelevant"), "1.2.3.4", "curl/8.0").unwrap();
        assert_eq!(principal.tenant_id(), Some("tenant-a"));
    }

    #[test]
    fn rate_limit_trips_after_the_configured_max() {
        let gate = AuthGate::new("secret").with_rate_limit(3, 60);
        for _ in 0..3 {
            assert!(gate.check_rate_limit("ip:5.6.7.8").is_ok());
        }
        let err = gate.check_rate_limit("ip:5.6.7.8").unwrap_err();
        match err {
            AuthGateError::RateLimited { retry_after_secs } => assert_eq!(retry_after_secs, 60),
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[test]
    fn requested_scope_intersection_narrows_token_scopes() {
        let gate = seeded_gate();
        let response = gate.issue_token("alice", "s3cret!", Some(&["migrations:read".to_string()]), "1.2.3.4", "curl/8.0").unwrap();
        assert_eq!(response.scopes, vec!["migrations:read".to_string()]);
        let principal = gate.authenticate(Some(&response.token), None, "1.2.3.4", "curl/8.0").unwrap();
        assert!(!principal.has_scope("migrations:write"));
    }
}
