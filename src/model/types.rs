use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::naming::{GroupNaming, ObjectSymbols};
use crate::config::{ApiDocs, ApiObjectConfig};
use crate::inspect::TagMap;

/// Object name → field name → tag key → tag value.
pub type StructTagIndex = BTreeMap<String, BTreeMap<String, TagMap>>;

/// The resolved model one generation run works from.
///
/// Built once by [`ModelBuilder`](super::ModelBuilder) and never mutated
/// afterwards. The group list and both secondary indices are derived from
/// the same object set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectModel {
    pub api_namespace: String,
    pub image_repo: String,
    pub api_docs: ApiDocs,
    pub groups: Vec<ApiObjectGroup>,
    pub version_config: GlobalVersionConfig,
    pub versioned: VersionedApiObjectCollection,
}

impl ObjectModel {
    /// Every API version in the model, ascending.
    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.version_config.versions.iter().map(|v| v.version.as_str())
    }

    pub fn group(&self, name: &str) -> Option<&ApiObjectGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Every object version across all groups.
    pub fn objects(&self) -> impl Iterator<Item = &ApiObject> {
        self.groups.iter().flat_map(|g| g.objects.iter())
    }

    pub fn object(&self, type_name: &str, version: &str) -> Option<&ApiObject> {
        self.objects()
            .find(|o| o.type_name == type_name && o.version == version)
    }
}

/// One controller domain and the objects it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiObjectGroup {
    pub name: String,
    #[serde(flatten)]
    pub naming: GroupNaming,
    /// One entry per object per version: config order, versions ascending.
    pub objects: Vec<ApiObject>,
    pub reconciled_objects: Vec<ReconciledObject>,
    pub tptctl_objects: BTreeSet<String>,
    pub tptctl_config_path_objects: BTreeSet<String>,
    pub allow_duplicate_names_objects: BTreeSet<String>,
    pub custom_middleware_objects: BTreeSet<String>,
    pub db_load_associations_objects: BTreeSet<String>,
    /// Version → struct tags of this group's objects in that version.
    pub struct_tags: BTreeMap<String, StructTagIndex>,
}

impl ApiObjectGroup {
    /// Versions this group has objects in, ascending.
    pub fn versions(&self) -> Vec<&str> {
        let mut versions: Vec<&str> = Vec::new();
        for obj in &self.objects {
            if !versions.contains(&obj.version.as_str()) {
                versions.push(&obj.version);
            }
        }
        versions.sort_by(|a, b| crate::config::compare_versions(a, b));
        versions
    }

    pub fn objects_in(&self, version: &str) -> impl Iterator<Item = &ApiObject> + '_ {
        let version = version.to_string();
        self.objects.iter().filter(move |o| o.version == version)
    }

    /// Latest version of each distinct object, in config order.
    pub fn latest_objects(&self) -> Vec<&ApiObject> {
        let mut latest: Vec<&ApiObject> = Vec::new();
        for obj in &self.objects {
            match latest.iter_mut().find(|o| o.type_name == obj.type_name) {
                Some(slot) => {
                    if crate::config::compare_versions(&obj.version, &slot.version).is_gt() {
                        *slot = obj;
                    }
                }
                None => latest.push(obj),
            }
        }
        latest
    }

    pub fn tptctl_enabled(&self) -> bool {
        !self.tptctl_objects.is_empty()
    }

    pub fn has_reconcilers(&self) -> bool {
        !self.reconciled_objects.is_empty()
    }
}

/// One object type at one API version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiObject {
    pub type_name: String,
    pub version: String,
    /// The object is unique by name
    pub name_field: bool,
    /// A controller reconciles this object
    pub reconciler: bool,
    /// The source declares reconciliation state
    pub reconciled_field: bool,
    /// A `<Root>Definition` with a matching `<Root>Instance` in its group
    pub defined_instance: bool,
    pub tptctl_commands: bool,
    pub tptctl_config_path: bool,
    pub allow_duplicate_names: bool,
    pub allow_custom_middleware: bool,
    pub db_load_associations: bool,
    pub exclude_route: bool,
    pub exclude_from_db: bool,
    pub disable_notification_persistence: bool,
    /// Field name → tag key → tag value
    pub field_tags: BTreeMap<String, TagMap>,
    pub symbols: ObjectSymbols,
}

impl ApiObject {
    /// Seed an object version from its configuration entry alone.
    pub fn from_config(config: &ApiObjectConfig, version: &str) -> Self {
        ApiObject {
            type_name: config.name.clone(),
            version: version.to_string(),
            name_field: config.name_field,
            reconciler: config.reconcilable,
            reconciled_field: false,
            defined_instance: false,
            tptctl_commands: config.tptctl.enabled,
            tptctl_config_path: config.tptctl.config_path,
            allow_duplicate_names: config.allow_duplicate_model_names,
            allow_custom_middleware: config.allow_custom_middleware,
            db_load_associations: config.load_associations_from_db,
            exclude_route: config.exclude_route,
            exclude_from_db: config.exclude_from_db,
            disable_notification_persistence: config.disable_notification_persistence,
            field_tags: BTreeMap::new(),
            symbols: ObjectSymbols::new(&config.name, version),
        }
    }

    /// `Workload` for `WorkloadDefinition` or `WorkloadInstance`.
    pub fn definition_root(&self) -> Option<&str> {
        self.type_name
            .strip_suffix("Definition")
            .or_else(|| self.type_name.strip_suffix("Instance"))
            .filter(|root| !root.is_empty())
    }

    pub fn is_definition(&self) -> bool {
        self.type_name.len() > "Definition".len() && self.type_name.ends_with("Definition")
    }

    /// The paired instance type of a defined-instance definition.
    pub fn instance_type(&self) -> Option<String> {
        if self.defined_instance {
            self.definition_root().map(|root| format!("{root}Instance"))
        } else {
            None
        }
    }

    /// False when the `Data` field is tagged `persist:"false"`.
    pub fn data_persisted(&self) -> bool {
        self.field_tags
            .get("Data")
            .and_then(|tags| tags.get("persist"))
            .map_or(true, |v| v != "false")
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.field_tags.contains_key(field)
    }
}

/// An object a controller reconciles, across all of its versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciledObject {
    pub name: String,
    /// Ascending
    pub versions: Vec<String>,
    pub disable_notification_persistence: bool,
}

impl ReconciledObject {
    pub fn latest_version(&self) -> Option<&str> {
        self.versions.last().map(String::as_str)
    }
}

/// Per-version name lists, each sorted alphabetically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VersionConfig {
    pub version: String,
    pub route_names: Vec<String>,
    /// Alphabetical, then adjusted by migration-order constraints
    pub database_init_names: Vec<String>,
    pub reconciled_names: Vec<String>,
}

/// The version-keyed view of the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GlobalVersionConfig {
    /// Ascending by version
    pub versions: Vec<VersionConfig>,
}

impl GlobalVersionConfig {
    pub fn get(&self, version: &str) -> Option<&VersionConfig> {
        self.versions.iter().find(|v| v.version == version)
    }
}

/// Objects sliced by version, then by group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VersionedApiObjectCollection {
    /// Ascending by version
    pub versions: Vec<VersionedApiObjects>,
}

impl VersionedApiObjectCollection {
    pub fn get(&self, version: &str) -> Option<&VersionedApiObjects> {
        self.versions.iter().find(|v| v.version == version)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionedApiObjects {
    pub version: String,
    /// Groups with at least one object in this version, config order
    pub groups: Vec<VersionedApiObjectGroup>,
}

impl VersionedApiObjects {
    pub fn objects(&self) -> impl Iterator<Item = &ApiObject> {
        self.groups.iter().flat_map(|g| g.objects.iter())
    }
}

/// One group's objects at one version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionedApiObjectGroup {
    pub name: String,
    #[serde(flatten)]
    pub naming: GroupNaming,
    pub objects: Vec<ApiObject>,
    pub struct_tags: StructTagIndex,
}
