use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tag for a [`SystemConfig`] identifying what kind of system it
/// describes, realized as a tagged enum rather than the original's class
/// hierarchy (spec.md §9, "Dynamic dispatch").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SystemVariant {
    WebCms,
    WebFramework,
    CloudBucket,
    Container,
    ControlPanel,
    StaticSite,
    DatabaseOnly,
}

/// How a system authenticates, one variant per spec.md §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuthConfig {
    Password { username: String, password: String },
    SshKey { username: String, private_key_path: String, passphrase: Option<String> },
    ApiKey { key: String },
    OAuth2 { client_id: String, client_secret: String, token_url: String },
    Jwt { token: String },
    CloudIam { role_arn: String, external_id: Option<String> },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathConfig {
    pub root_path: String,
    pub web_root: Option<String>,
    pub config_path: Option<String>,
    pub exclude_patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub engine: String,
    pub host: String,
    pub port: u16,
    pub database_name: String,
    pub username: String,
    pub password: String,
    pub ssl_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudConfig {
    pub provider: String,
    pub region: String,
    pub bucket_or_container: String,
    pub credentials_profile: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlPanelConfig {
    pub panel_type: String,
    pub api_endpoint: String,
    pub account_identifier: String,
}

/// One endpoint of a migration (source or destination).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    pub variant: SystemVariant,
    pub host: String,
    pub port: u16,
    pub auth: AuthConfig,
    pub paths: PathConfig,
    pub database: Option<DatabaseConfig>,
    pub cloud: Option<CloudConfig>,
    pub control_panel: Option<ControlPanelConfig>,
}

/// Transfer method tag, consumed only by contract (spec.md §1 non-goals).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransferMethodKind {
    Ssh,
    Sftp,
    Rsync,
    S3,
    Gcs,
    Azure,
    KubernetesVolume,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    pub method: TransferMethodKind,
    pub parallel_transfers: usize,
    pub compression_enabled: bool,
    pub verify_checksums: bool,
    pub use_native_acceleration: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            method: TransferMethodKind::Rsync,
            parallel_transfers: 4,
            compression_enabled: true,
            verify_checksums: true,
            use_native_acceleration: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationOptions {
    pub maintenance_mode: bool,
    pub backup_before: bool,
    pub backup_destination: Option<String>,
    pub verify_after: bool,
    pub rollback_on_failure: bool,
    pub preserve_permissions: bool,
    pub preserve_timestamps: bool,
    /// Hint threaded to collaborators, not a separate orchestrator code
    /// path (spec.md §9 Open Questions).
    pub dry_run: bool,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            maintenance_mode: false,
            backup_before: true,
            backup_destination: None,
            verify_after: true,
            rollback_on_failure: true,
            preserve_permissions: true,
            preserve_timestamps: true,
            dry_run: false,
        }
    }
}

/// Immutable-after-creation migration request (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    pub name: String,
    pub source: SystemConfig,
    pub destination: SystemConfig,
    pub transfer: TransferConfig,
    pub options: MigrationOptions,
    pub tenant_id: Option<String>,
    pub created_by: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}
