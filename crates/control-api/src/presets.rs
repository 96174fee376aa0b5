//! Preset lookup + materialization (spec.md §4.I `/presets*`). Preset
//! *contents* (the WordPress/Django/... catalog) are an explicit
//! non-goal (spec.md §1); only the lookup/override-merge mechanism is
//! implemented, grounded on `preset_manager.py`'s
//! `PresetManager.get_preset_config` /
//! `create_migration_config_from_preset` (JSON-merge overrides, then
//! deserialize into the typed config).

use dashmap::DashMap;
use migration_core::MigrationConfig;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct PresetSummary {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// Contract consumed by `control-api`'s `/presets*` handlers. Concrete
/// catalog contents belong to a deployment, not the core (spec.md §1).
pub trait PresetCatalog: Send + Sync {
    fn list(&self) -> Vec<PresetSummary>;
    fn get(&self, id: &str) -> Option<Value>;
}

/// Merges `overrides` onto `base` recursively (object keys merge,
/// non-object values are replaced wholesale), matching
/// `preset_manager.py::_merge_overrides`'s shallow-then-recursive
/// dict merge.
fn merge_overrides(base: &mut Value, overrides: &Value) {
    match (base, overrides) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            for (key, value) in override_map {
                merge_overrides(base_map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (slot, value) => {
            *slot = value.clone();
        }
    }
}

#[derive(Default, Clone)]
pub struct InMemoryPresetCatalog {
    presets: Arc<DashMap<String, (PresetSummary, Value)>>,
}

impl InMemoryPresetCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, id: impl Into<String>, name: impl Into<String>, description: impl Into<String>, config: Value) {
        let id = id.into();
        let summary = PresetSummary { id: id.clone(), name: name.into(), description: description.into() };
        self.presets.insert(id, (summary, config));
    }

    /// `create_migration_config_from_preset` (spec.md §8 round-trip
    /// property: calling with an empty override map twice yields
    /// structurally equal configs).
    pub fn create_migration_config(&self, id: &str, overrides: Option<&Value>) -> Option<Result<MigrationConfig, serde_json::Error>> {
        let (_, base) = self.presets.get(id).map(|e| e.value().clone())?;
        let mut merged = base;
        if let Some(overrides) = overrides {
            merge_overrides(&mut merged, overrides);
        }
        Some(serde_json::from_value(merged))
    }
}

impl PresetCatalog for InMemoryPresetCatalog {
    fn list(&self) -> Vec<PresetSummary> {
        let mut summaries: Vec<PresetSummary> = self.presets.iter().map(|e| e.value().0.clone()).collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }

    fn get(&self, id: &str) -> Option<Value> {
        self.presets.get(id).map(|e| e.value().1.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_config_json() -> Value {
        json!({
            "name": "wordpress-to-s3",
            "source": {
                "variant": "web-cms",
                "host": "src.example.com",
                "port": 22,
                "auth": {"kind": "password", "username": "u", "password": "p"},
                "paths": {"root_path": "/var/www", "exclude_patterns": []},
                "database": null,
                "cloud": null,
                "control_panel": null
            },
            "destination": {
                "variant": "cloud-bucket",
                "host": "s3.amazonaws.com",
                "port": 443,
                "auth": {"kind": "api_key", "key": "k"},
                "paths": {"root_path": "", "exclude_patterns": []},
                "database": null,
                "cloud": null,
                "control_panel": null
            },
            "transfer": {"method": "s3", "parallel_transfers": 4, "compression_enabled": true, "verify_checksums": true, "use_native_acceleration": true},
            "options": {
                "maintenance_mode": true,
                "backup_before": true,
                "backup_destination": null,
                "verify_after": true,
                "rollback_on_failure": true,
                "preserve_permissions": true,
                "preserve_timestamps": true,
                "dry_run": false
            },
            "tenant_id": null,
            "created_by": "preset",
            "metadata": {}
        })
    }

    #[test]
    fn empty_overrides_yield_structurally_equal_config() {
        let catalog = InMemoryPresetCatalog::new();
        catalog.register("wordpress-to-s3", "WordPress to S3", "desc", sample_config_json());

        let without = catalog.create_migration_config("wordpress-to-s3", None).unwrap().unwrap();
        let with_empty = catalog.create_migration_config("wordpress-to-s3", Some(&json!({}))).unwrap().unwrap();

        assert_eq!(serde_json::to_value(&without).unwrap(), serde_json::to_value(&with_empty).unwrap());
    }

    #[test]
    fn overrides_patch_nested_fields_without_losing_siblings() {
        let catalog = InMemoryPresetCatalog::new();
        catalog.register("wordpress-to-s3", "WordPress to S3", "desc", sample_config_json());

        let overridden = catalog
            .create_migration_config("wordpress-to-s3", Some(&json!({"source": {"host": "other.example.com"}})))
            .unwrap()
            .unwrap();

        assert_eq!(overridden.source.host, "other.example.com");
        assert_eq!(overridden.source.port, 22);
    }

    #[test]
    fn unknown_preset_returns_none() {
        let catalog = InMemoryPresetCatalog::new();
        assert!(catalog.create_migration_config("nope", None).is_none());
    }
}
