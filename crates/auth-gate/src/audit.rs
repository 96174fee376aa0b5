//! Append-only audit buffer (spec.md §4.H "Audit log"), bounded in
//! memory per spec.md §5's ring-buffer convention used throughout the
//! monitoring crates.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

const DEFAULT_CAPACITY: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    LoginSuccess,
    LoginFailure,
    TokenValidated,
    TokenExpired,
    TokenInvalid,
    UserAgentOrIpDrift,
    RateLimitExceeded,
    DisabledUserAccess,
    DisabledApiKeyAccess,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: AuditEventType,
    pub user_id: Option<String>,
    pub ip_address: String,
    pub user_agent_hash: String,
    pub details: String,
}

#[derive(Clone)]
pub struct AuditLog {
    capacity: usize,
    events: Arc<RwLock<VecDeque<AuditEvent>>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { capacity, events: Arc::new(RwLock::new(VecDeque::with_capacity(capacity.min(1024)))) }
    }

    pub fn record(
        &self,
        event_type: AuditEventType,
        user_id: Option<String>,
        ip_address: impl Into<String>,
        user_agent_hash: impl Into<String>,
        details: impl Into<String>,
    ) {
        let event = AuditEvent {
            timestamp: Utc::now(),
            event_type,
            user_id,
            ip_address: ip_address.into(),
            user_agent_hash: user_agent_hash.into(),
            details: details.into(),
        };
        let mut events = self.events.write().unwrap();
        if events.len() >= self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    pub fn recent(&self, limit: usize) -> Vec<AuditEvent> {
        let events = self.events.read().unwrap();
        events.iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}
