//! In-memory session store (spec.md §4.F). No persistence is mandated;
//! the store lives for the process lifetime only.

use crate::error::CoreError;
use crate::session::MigrationSession;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Thread-safe `session_id -> MigrationSession` map. Reads are cheap
/// clones; the session driver in `migration-orchestrator` is the sole
/// writer for any given session (spec.md §5 "Shared-resource policy").
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<DashMap<Uuid, MigrationSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self { sessions: Arc::new(DashMap::new()) }
    }

    pub fn insert(&self, session: MigrationSession) -> Uuid {
        let id = session.id;
        self.sessions.insert(id, session);
        id
    }

    pub fn get(&self, id: Uuid) -> Option<MigrationSession> {
        self.sessions.get(&id).map(|entry| entry.clone())
    }

    /// Mutate a session in place via `f`, returning a clone of the result.
    /// This is the only write path used outside of `insert`.
    pub fn update<F>(&self, id: Uuid, f: F) -> Result<MigrationSession, CoreError>
    where
        F: FnOnce(&mut MigrationSession),
    {
        let mut entry = self.sessions.get_mut(&id).ok_or(CoreError::SessionNotFound(id))?;
        f(&mut entry);
        Ok(entry.clone())
    }

    pub fn remove(&self, id: Uuid) -> Option<MigrationSession> {
        self.sessions.remove(&id).map(|(_, session)| session)
    }

    /// List sessions visible to a caller: admins see everything, everyone
    /// else is filtered to their own tenant (spec.md §3 invariant).
    pub fn list_for_tenant(&self, tenant_id: Option<&str>, is_admin: bool) -> Vec<MigrationSession> {
        self.sessions
            .iter()
            .filter(|entry| entry.value().is_owned_by(tenant_id, is_admin))
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::*;
    use crate::step_graph::build_steps;

    fn sample_config(tenant: &str) -> MigrationConfig {
        MigrationConfig {
            name: "t".into(),
            source: SystemConfig {
                variant: SystemVariant::StaticSite,
                host: "a".into(),
                port: 80,
                auth: AuthConfig::ApiKey { key: "k".into() },
                paths: PathConfig { root_path: "/site".into(), ..Default::default() },
                database: None,
                cloud: None,
                control_panel: None,
            },
            destination: SystemConfig {
                variant: SystemVariant::StaticSite,
                host: "b".into(),
                port: 80,
                auth: AuthConfig::ApiKey { key: "k".into() },
                paths: PathConfig::default(),
                database: None,
                cloud: None,
                control_panel: None,
            },
            transfer: TransferConfig::default(),
            options: MigrationOptions::default(),
            tenant_id: Some(tenant.into()),
            created_by: "u".into(),
            metadata: Default::default(),
        }
    }

    #[test]
    fn tenant_isolation_filters_sessions() {
        let store = SessionStore::new();
        let cfg_a = sample_config("tenant-a");
        let steps_a = build_steps(&cfg_a).unwrap();
        store.insert(MigrationSession::new(cfg_a, steps_a));

        let cfg_b = sample_config("tenant-b");
        let steps_b = build_steps(&cfg_b).unwrap();
        store.insert(MigrationSession::new(cfg_b, steps_b));

        let visible = store.list_for_tenant(Some("tenant-a"), false);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].tenant_id.as_deref(), Some("tenant-a"));

        let admin_visible = store.list_for_tenant(Some("tenant-a"), true);
        assert_eq!(admin_visible.len(), 2);
    }

    #[test]
    fn update_missing_session_errors() {
        let store = SessionStore::new();
        let err = store.update(Uuid::new_v4(), |_| {}).unwrap_err();
        assert!(matches!(err, CoreError::SessionNotFound(_)));
    }
}
