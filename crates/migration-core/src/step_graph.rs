//! Step synthesis and topological ordering (spec.md §4.F).
//!
//! Step inclusion follows the fixed template from `orchestrator.py`'s
//! `_initialize_step_definitions` / `_is_step_needed`, and the sort is the
//! same DFS-with-cycle-detection `_sort_steps_by_dependencies` uses.

use crate::config::MigrationConfig;
use crate::error::CoreError;
use crate::step::MigrationStep;
use std::collections::{HashMap, HashSet};

struct StepTemplate {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    dependencies: &'static [&'static str],
}

const TEMPLATE: &[StepTemplate] = &[
    StepTemplate { id: "initialize", name: "Initialize", description: "Prepare migration session and internal bookkeeping", dependencies: &[] },
    StepTemplate { id: "validate_pre_migration", name: "Validate (pre-migration)", description: "Validate connectivity, compatibility, and dependencies", dependencies: &["initialize"] },
    StepTemplate { id: "create_backups", name: "Create backups", description: "Back up files, database, and configuration", dependencies: &["validate_pre_migration"] },
    StepTemplate { id: "enable_maintenance", name: "Enable maintenance mode", description: "Put the source system into maintenance mode", dependencies: &["create_backups"] },
    StepTemplate { id: "transfer_files", name: "Transfer files", description: "Transfer application files to the destination", dependencies: &["enable_maintenance"] },
    StepTemplate { id: "migrate_database", name: "Migrate database", description: "Migrate the database to the destination", dependencies: &["transfer_files"] },
    StepTemplate { id: "validate_post_migration", name: "Validate (post-migration)", description: "Run post-migration integrity checks", dependencies: &["migrate_database"] },
    StepTemplate { id: "disable_maintenance", name: "Disable maintenance mode", description: "Take the destination system out of maintenance mode", dependencies: &["validate_post_migration"] },
    StepTemplate { id: "cleanup", name: "Cleanup", description: "Release temporary resources and finalize the session", dependencies: &["disable_maintenance"] },
];

/// Whether a templated step is included for a given config, per the
/// inclusion table in spec.md §4.F.
fn is_step_needed(step_id: &str, config: &MigrationConfig) -> bool {
    match step_id {
        "initialize" | "validate_pre_migration" | "validate_post_migration" | "cleanup" => true,
        "create_backups" => config.options.backup_before || config.options.backup_destination.is_some(),
        "enable_maintenance" | "disable_maintenance" => config.options.maintenance_mode,
        "transfer_files" => !config.source.paths.root_path.is_empty(),
        "migrate_database" => config.source.database.is_some(),
        _ => false,
    }
}

/// Build the step list for a config: synthesize from the template,
/// filtering out excluded steps and their dangling dependency references,
/// then defensively re-sort (a no-op for the built-in template, but
/// required once callers add steps of their own).
pub fn build_steps(config: &MigrationConfig) -> Result<Vec<MigrationStep>, CoreError> {
    let mut steps: Vec<MigrationStep> = Vec::new();
    let included: HashSet<&str> = TEMPLATE.iter().map(|t| t.id).filter(|id| is_step_needed(id, config)).collect();

    for tmpl in TEMPLATE {
        if !included.contains(tmpl.id) {
            continue;
        }
        let deps: Vec<String> = tmpl
            .dependencies
            .iter()
            .filter(|d| included.contains(*d))
            .map(|d| d.to_string())
            .collect();
        steps.push(MigrationStep::new(tmpl.id, tmpl.name, tmpl.description, deps));
    }

    topo_sort(steps)
}

/// Defensive topological sort over `dependencies`, Kahn/DFS-hybrid: DFS
/// with a recursion-stack set so a cycle is reported with the step id
/// that closes the loop, matching `orchestrator.py`'s error message
/// shape ("Circular dependency detected involving step X").
pub fn topo_sort(steps: Vec<MigrationStep>) -> Result<Vec<MigrationStep>, CoreError> {
    let by_id: HashMap<String, MigrationStep> = steps.into_iter().map(|s| (s.id.clone(), s)).collect();
    for step in by_id.values() {
        for dep in &step.dependencies {
            if !by_id.contains_key(dep) {
                return Err(CoreError::UnknownDependency(step.id.clone(), dep.clone()));
            }
        }
    }

    let mut visited: HashSet<String> = HashSet::new();
    let mut in_progress: HashSet<String> = HashSet::new();
    let mut ordered: Vec<String> = Vec::new();

    fn visit(
        id: &str,
        by_id: &HashMap<String, MigrationStep>,
        visited: &mut HashSet<String>,
        in_progress: &mut HashSet<String>,
        ordered: &mut Vec<String>,
    ) -> Result<(), CoreError> {
        if visited.contains(id) {
            return Ok(());
        }
        if in_progress.contains(id) {
            return Err(CoreError::CircularDependency { step_id: id.to_string() });
        }
        in_progress.insert(id.to_string());
        if let Some(step) = by_id.get(id) {
            for dep in &step.dependencies {
                visit(dep, by_id, visited, in_progress, ordered)?;
            }
        }
        in_progress.remove(id);
        visited.insert(id.to_string());
        ordered.push(id.to_string());
        Ok(())
    }

    let mut ids: Vec<&String> = by_id.keys().collect();
    ids.sort();
    for id in ids {
        visit(id, &by_id, &mut visited, &mut in_progress, &mut ordered)?;
    }

    let mut by_id = by_id;
    Ok(ordered.into_iter().map(|id| by_id.remove(&id).expect("visited id must exist")).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::*;

    fn base_config() -> MigrationConfig {
        MigrationConfig {
            name: "test".into(),
            source: SystemConfig {
                variant: SystemVariant::WebCms,
                host: "src.example.com".into(),
                port: 22,
                auth: AuthConfig::Password { username: "u".into(), password: "p".into() },
                paths: PathConfig { root_path: "/var/www".into(), ..Default::default() },
                database: Some(DatabaseConfig {
                    engine: "mysql".into(),
                    host: "db".into(),
                    port: 3306,
                    database_name: "app".into(),
                    username: "u".into(),
                    password: "p".into(),
                    ssl_enabled: false,
                }),
                cloud: None,
                control_panel: None,
            },
            destination: SystemConfig {
                variant: SystemVariant::CloudBucket,
                host: "s3.amazonaws.com".into(),
                port: 443,
                auth: AuthConfig::ApiKey { key: "k".into() },
                paths: PathConfig::default(),
                database: None,
                cloud: None,
                control_panel: None,
            },
            transfer: TransferConfig::default(),
            options: MigrationOptions { backup_before: true, maintenance_mode: true, ..Default::default() },
            tenant_id: Some("tenant-a".into()),
            created_by: "user-1".into(),
            metadata: Default::default(),
        }
    }

    #[test]
    fn full_config_includes_all_nine_steps_in_template_order() {
        let steps = build_steps(&base_config()).unwrap();
        let ids: Vec<&str> = steps.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "initialize",
                "validate_pre_migration",
                "create_backups",
                "enable_maintenance",
                "transfer_files",
                "migrate_database",
                "validate_post_migration",
                "disable_maintenance",
                "cleanup",
            ]
        );
    }

    #[test]
    fn minimal_config_skips_optional_steps() {
        let mut config = base_config();
        config.options.backup_before = false;
        config.options.maintenance_mode = false;
        config.source.database = None;
        config.source.paths.root_path = String::new();

        let steps = build_steps(&config).unwrap();
        let ids: Vec<&str> = steps.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["initialize", "validate_pre_migration", "validate_post_migration", "cleanup"]);
    }

    #[test]
    fn cyclic_dependency_is_rejected() {
        let a = MigrationStep::new("a", "A", "", vec!["b".into()]);
        let b = MigrationStep::new("b", "B", "", vec!["a".into()]);
        let err = topo_sort(vec![a, b]).unwrap_err();
        match err {
            CoreError::CircularDependency { step_id } => assert!(step_id == "a" || step_id == "b"),
            other => panic!("expected CircularDependency, got {other:?}"),
        }
    }

    #[test]
    fn unknown_dependency_is_rejected() {
        let a = MigrationStep::new("a", "A", "", vec!["missing".into()]);
        let err = topo_sort(vec![a]).unwrap_err();
        assert!(matches!(err, CoreError::UnknownDependency(_, _)));
    }
}
