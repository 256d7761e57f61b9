use anyhow::Context;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

use super::context::RunContext;
use super::error::ModelError;
use super::locator::SourceLocator;
use super::naming::{GroupNaming, SymbolScope};
use super::types::{
    ApiObject, ApiObjectGroup, GlobalVersionConfig, ObjectModel, ReconciledObject,
    VersionConfig, VersionedApiObjectCollection, VersionedApiObjectGroup, VersionedApiObjects,
};
use crate::config::{
    compare_versions, validate_config, ApiObjectGroupConfig, MigrationOrder, SdkConfig,
    BASE_VERSION,
};
use crate::inspect::{Marker, SourceFacts, SourceInspector, TypeFacts};

/// Migration ordering the base project needs when the config gives none:
/// control planes reference the Kubernetes runtimes they run on.
pub fn default_migration_order() -> Vec<MigrationOrder> {
    vec![
        MigrationOrder::new(
            "KubernetesRuntimeDefinition",
            "ControlPlaneDefinition",
            BASE_VERSION,
        ),
        MigrationOrder::new(
            "KubernetesRuntimeInstance",
            "ControlPlaneInstance",
            BASE_VERSION,
        ),
    ]
}

/// Merges configuration with source facts into an [`ObjectModel`].
///
/// The build is all-or-nothing: the first contract violation aborts it and
/// no partial model is returned.
pub struct ModelBuilder<'a> {
    ctx: &'a RunContext,
    inspector: &'a dyn SourceInspector,
    locator: &'a dyn SourceLocator,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(
        ctx: &'a RunContext,
        inspector: &'a dyn SourceInspector,
        locator: &'a dyn SourceLocator,
    ) -> Self {
        ModelBuilder {
            ctx,
            inspector,
            locator,
        }
    }

    /// Build the model for `config`.
    ///
    /// # Errors
    ///
    /// Returns the first of: a [`ConfigError`](crate::config::ConfigError), a
    /// source read or parse failure, or a [`ModelError`]. Typed errors can be
    /// recovered with `downcast_ref`.
    pub fn build(&self, config: &SdkConfig) -> anyhow::Result<ObjectModel> {
        validate_config(config)?;

        let mut groups = Vec::with_capacity(config.api_object_groups.len());
        for group_config in &config.api_object_groups {
            groups.push(self.build_group(group_config)?);
        }
        check_symbol_collisions(&groups)?;

        let (mut version_config, versioned) = build_indices(&groups);
        let constraints = self.migration_constraints(config);
        apply_migration_order(&mut version_config, &constraints)?;

        info!(
            groups = groups.len(),
            objects = groups.iter().map(|g| g.objects.len()).sum::<usize>(),
            versions = version_config.versions.len(),
            extension = self.ctx.is_extension(),
            "built object model"
        );

        Ok(ObjectModel {
            api_namespace: config.api_namespace.clone(),
            image_repo: config.image_repo.clone(),
            api_docs: config.api_docs.clone(),
            groups,
            version_config,
            versioned,
        })
    }

    fn build_group(&self, config: &ApiObjectGroupConfig) -> anyhow::Result<ApiObjectGroup> {
        let naming = GroupNaming::new(&config.name);

        let mut sources: BTreeMap<String, SourceFacts> = BTreeMap::new();
        for version in config.versions() {
            let path = self.locator.locate(&version, &config.name);
            let facts = self.inspector.inspect(&path).with_context(|| {
                format!("Failed to inspect group {} ({version})", config.name)
            })?;
            sources.insert(version, facts);
        }

        let mut group = ApiObjectGroup {
            name: config.name.clone(),
            naming,
            objects: Vec::new(),
            reconciled_objects: Vec::new(),
            tptctl_objects: BTreeSet::new(),
            tptctl_config_path_objects: BTreeSet::new(),
            allow_duplicate_names_objects: BTreeSet::new(),
            custom_middleware_objects: BTreeSet::new(),
            db_load_associations_objects: BTreeSet::new(),
            struct_tags: BTreeMap::new(),
        };
        let mut reconcilers: BTreeSet<String> = BTreeSet::new();

        for object_config in &config.objects {
            let mut versions = object_config.versions.clone();
            versions.sort_by(|a, b| compare_versions(a, b));
            versions.dedup();

            for version in versions {
                let mut object = ApiObject::from_config(object_config, &version);
                match sources.get(&version).and_then(|s| s.get(&object.type_name)) {
                    Some(facts) => merge_facts(&mut object, facts),
                    None => warn!(
                        group = %group.name,
                        object = %object.type_name,
                        version = %version,
                        "API object not declared in model source; using config only"
                    ),
                }
                record_group_lists(&mut group, &mut reconcilers, &object);
                group
                    .struct_tags
                    .entry(version)
                    .or_default()
                    .insert(object.type_name.clone(), object.field_tags.clone());
                group.objects.push(object);
            }
        }

        if let Some(object) = group
            .objects
            .iter()
            .find(|o| o.type_name == group.naming.controller_domain)
        {
            return Err(ModelError::NamingConflict {
                group: group.name.clone(),
                object: object.type_name.clone(),
            }
            .into());
        }

        let type_names: BTreeSet<String> =
            group.objects.iter().map(|o| o.type_name.clone()).collect();
        for object in &mut group.objects {
            if !object.is_definition() {
                continue;
            }
            if let Some(instance) = object.definition_root().map(|r| format!("{r}Instance")) {
                object.defined_instance = type_names.contains(&instance);
            }
        }

        for object in &mut group.objects {
            object.reconciler |= reconcilers.contains(&object.type_name);
            if object.reconciler && !object.reconciled_field {
                if self.ctx.is_extension() {
                    warn!(
                        group = %group.name,
                        object = %object.type_name,
                        version = %object.version,
                        "reconciled object has no Reconciled field"
                    );
                } else {
                    return Err(ModelError::MissingReconciledField {
                        group: group.name.clone(),
                        object: object.type_name.clone(),
                        version: object.version.clone(),
                    }
                    .into());
                }
            }
        }

        for object in &mut group.objects {
            let name = object.type_name.as_str();
            object.tptctl_commands |= group.tptctl_objects.contains(name);
            object.tptctl_config_path |= group.tptctl_config_path_objects.contains(name);
            object.allow_duplicate_names |= group.allow_duplicate_names_objects.contains(name);
            object.allow_custom_middleware |= group.custom_middleware_objects.contains(name);
            object.db_load_associations |= group.db_load_associations_objects.contains(name);
        }

        group.reconciled_objects = reconciled_objects(&group.objects);

        debug!(
            group = %group.name,
            objects = group.objects.len(),
            reconciled = group.reconciled_objects.len(),
            "built API object group"
        );
        Ok(group)
    }

    /// Configured constraints replace the defaults. The defaults apply to
    /// the base project only and must find both of their objects.
    fn migration_constraints(&self, config: &SdkConfig) -> Vec<MigrationOrder> {
        match &config.database_migration_order {
            Some(constraints) => constraints.clone(),
            None if self.ctx.is_extension() => Vec::new(),
            None => default_migration_order(),
        }
    }
}

/// OR-merge what the source says into a config-seeded object.
fn merge_facts(object: &mut ApiObject, facts: &TypeFacts) {
    object.name_field |= facts.has_name_field();
    object.reconciled_field = facts.reconciled_field;
    object.field_tags = facts.tag_map();
    for marker in &facts.markers {
        match marker {
            Marker::Reconciler => object.reconciler = true,
            Marker::AllowDuplicateNames => object.allow_duplicate_names = true,
            Marker::AddCustomMiddleware => object.allow_custom_middleware = true,
            Marker::DbLoadAssociations => object.db_load_associations = true,
            Marker::TptctlEnabled => object.tptctl_commands = true,
            Marker::TptctlConfigPath => object.tptctl_config_path = true,
        }
    }
}

fn record_group_lists(
    group: &mut ApiObjectGroup,
    reconcilers: &mut BTreeSet<String>,
    object: &ApiObject,
) {
    let name = &object.type_name;
    let lists = [
        (object.reconciler, &mut *reconcilers),
        (object.tptctl_commands, &mut group.tptctl_objects),
        (object.tptctl_config_path, &mut group.tptctl_config_path_objects),
        (
            object.allow_duplicate_names,
            &mut group.allow_duplicate_names_objects,
        ),
        (
            object.allow_custom_middleware,
            &mut group.custom_middleware_objects,
        ),
        (
            object.db_load_associations,
            &mut group.db_load_associations_objects,
        ),
    ];
    for (flag, list) in lists {
        if flag {
            list.insert(name.clone());
        }
    }
}

fn reconciled_objects(objects: &[ApiObject]) -> Vec<ReconciledObject> {
    let mut reconciled: Vec<ReconciledObject> = Vec::new();
    for object in objects.iter().filter(|o| o.reconciler) {
        match reconciled.iter_mut().find(|r| r.name == object.type_name) {
            Some(entry) => {
                entry.versions.push(object.version.clone());
                entry.disable_notification_persistence |= object.disable_notification_persistence;
            }
            None => reconciled.push(ReconciledObject {
                name: object.type_name.clone(),
                versions: vec![object.version.clone()],
                disable_notification_persistence: object.disable_notification_persistence,
            }),
        }
    }
    for entry in &mut reconciled {
        entry.versions.sort_by(|a, b| compare_versions(a, b));
    }
    reconciled
}

/// Two objects generating the same identifier in one package of one version
/// would produce Go that does not compile.
fn check_symbol_collisions(groups: &[ApiObjectGroup]) -> Result<(), ModelError> {
    let mut owners: BTreeMap<(String, SymbolScope, String), String> = BTreeMap::new();
    for group in groups {
        for object in &group.objects {
            let owner = format!("{}.{}", group.name, object.type_name);
            for (scope, symbol) in object.symbols.identifiers() {
                match owners.entry((object.version.clone(), scope, symbol.to_string())) {
                    Entry::Occupied(entry) if entry.get() != &owner => {
                        return Err(ModelError::SymbolCollision {
                            version: object.version.clone(),
                            symbol: symbol.to_string(),
                            first: entry.get().clone(),
                            second: owner,
                        });
                    }
                    Entry::Occupied(_) => {}
                    Entry::Vacant(entry) => {
                        entry.insert(owner.clone());
                    }
                }
            }
        }
    }
    Ok(())
}

/// Derive the version-keyed indices from the finished groups in one pass.
fn build_indices(
    groups: &[ApiObjectGroup],
) -> (GlobalVersionConfig, VersionedApiObjectCollection) {
    let mut configs: BTreeMap<&str, VersionConfig> = BTreeMap::new();
    let mut sliced: BTreeMap<&str, Vec<VersionedApiObjectGroup>> = BTreeMap::new();

    for group in groups {
        for object in &group.objects {
            let version = object.version.as_str();

            let config = configs.entry(version).or_insert_with(|| VersionConfig {
                version: version.to_string(),
                ..VersionConfig::default()
            });
            if !object.exclude_route {
                config.route_names.push(object.type_name.clone());
            }
            if !object.exclude_from_db {
                config.database_init_names.push(object.type_name.clone());
            }
            if object.reconciler {
                config.reconciled_names.push(object.type_name.clone());
            }

            let slices = sliced.entry(version).or_default();
            let needs_slice = slices.last().map_or(true, |s| s.name != group.name);
            if needs_slice {
                slices.push(VersionedApiObjectGroup {
                    name: group.name.clone(),
                    naming: group.naming.clone(),
                    objects: Vec::new(),
                    struct_tags: group.struct_tags.get(version).cloned().unwrap_or_default(),
                });
            }
            if let Some(slice) = slices.last_mut() {
                slice.objects.push(object.clone());
            }
        }
    }

    let mut versions: Vec<VersionConfig> = configs.into_values().collect();
    for config in &mut versions {
        config.route_names.sort();
        config.database_init_names.sort();
        config.reconciled_names.sort();
    }
    versions.sort_by(|a, b| compare_versions(&a.version, &b.version));

    let mut collection: Vec<VersionedApiObjects> = sliced
        .into_iter()
        .map(|(version, groups)| VersionedApiObjects {
            version: version.to_string(),
            groups,
        })
        .collect();
    collection.sort_by(|a, b| compare_versions(&a.version, &b.version));

    (
        GlobalVersionConfig { versions },
        VersionedApiObjectCollection {
            versions: collection,
        },
    )
}

/// Enforce `before`-ahead-of-`after` constraints on the database migration
/// lists. A violated constraint swaps the two entries in place.
///
/// # Errors
///
/// [`ModelError::MigrationOrderTargetMissing`] when a constraint names an
/// object that is not migrated in its version.
pub fn apply_migration_order(
    config: &mut GlobalVersionConfig,
    constraints: &[MigrationOrder],
) -> Result<(), ModelError> {
    for constraint in constraints {
        let names = config
            .versions
            .iter_mut()
            .find(|v| v.version == constraint.version)
            .map(|v| &mut v.database_init_names);
        let Some(names) = names else {
            return Err(ModelError::MigrationOrderTargetMissing {
                version: constraint.version.clone(),
                missing: vec![constraint.before.clone(), constraint.after.clone()],
            });
        };

        let before = names.iter().position(|n| n == &constraint.before);
        let after = names.iter().position(|n| n == &constraint.after);
        match (before, after) {
            (Some(b), Some(a)) => {
                if b > a {
                    names.swap(b, a);
                    debug!(
                        version = %constraint.version,
                        before = %constraint.before,
                        after = %constraint.after,
                        "reordered database migrations"
                    );
                }
            }
            _ => {
                let missing = [(before, &constraint.before), (after, &constraint.after)]
                    .into_iter()
                    .filter(|(position, _)| position.is_none())
                    .map(|(_, name)| name.clone())
                    .collect();
                return Err(ModelError::MigrationOrderTargetMissing {
                    version: constraint.version.clone(),
                    missing,
                });
            }
        }
    }
    Ok(())
}
