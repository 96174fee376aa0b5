use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupType {
    Files,
    Database,
    Config,
    Full,
}

/// A backup artifact created during the `create_backups` step, consumed
/// only by rollback of the same session (spec.md §3 invariant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupRecord {
    pub id: Uuid,
    pub backup_type: BackupType,
    pub size_bytes: u64,
    pub location: String,
    pub created_at: DateTime<Utc>,
    pub verified: bool,
}

impl BackupRecord {
    pub fn new(backup_type: BackupType, size_bytes: u64, location: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            backup_type,
            size_bytes,
            location: location.into(),
            created_at: Utc::now(),
            verified: false,
        }
    }
}
