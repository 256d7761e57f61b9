//! Generated names.
//!
//! Everything here is a pure function of a group name or of an object's type
//! name and version. Emitters never build names themselves; they read them
//! from [`GroupNaming`] and [`ObjectSymbols`] so that a route constant, the
//! handler it points at and the client function calling it always agree.

use convert_case::{Case, Casing};
use serde::Serialize;

pub fn pascal_case(s: &str) -> String {
    s.to_case(Case::Pascal)
}

pub fn camel_case(s: &str) -> String {
    s.to_case(Case::Camel)
}

pub fn kebab_case(s: &str) -> String {
    s.to_case(Case::Kebab)
}

pub fn snake_case(s: &str) -> String {
    s.to_case(Case::Snake)
}

/// Lowercase with separators removed, as Go package names are written.
pub fn package_case(s: &str) -> String {
    snake_case(s).replace('_', "")
}

/// English plural for identifiers and REST paths.
pub fn plural(s: &str) -> String {
    let lower = s.to_ascii_lowercase();
    if lower.ends_with('s')
        || lower.ends_with('x')
        || lower.ends_with("ch")
        || lower.ends_with("sh")
    {
        return format!("{s}es");
    }
    if let Some(stem) = s.strip_suffix('y') {
        let before = stem.chars().last().map(|c| c.to_ascii_lowercase());
        if before.is_some_and(|c| !"aeiou".contains(c)) {
            return format!("{stem}ies");
        }
    }
    format!("{s}s")
}

/// Names derived from an API object group (a controller domain).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupNaming {
    /// `KubernetesRuntime`
    pub controller_domain: String,
    /// `kubernetes-runtime-controller`
    pub controller_name: String,
    /// `kubernetes-runtime`
    pub controller_short_name: String,
    /// `kubernetesruntime`
    pub controller_package_name: String,
    /// `KubernetesRuntimeStreamName`
    pub stream_name: String,
    /// `kubernetes_runtime.go`
    pub source_file: String,
}

impl GroupNaming {
    pub fn new(group: &str) -> Self {
        let domain = pascal_case(group);
        let short = kebab_case(group);
        GroupNaming {
            controller_name: format!("{short}-controller"),
            controller_package_name: package_case(group),
            stream_name: format!("{domain}StreamName"),
            source_file: format!("{}.go", snake_case(group)),
            controller_short_name: short,
            controller_domain: domain,
        }
    }
}

/// A NATS subject constant and its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subject {
    pub constant: String,
    pub value: String,
}

/// REST handler names for one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerNames {
    pub get_versions: String,
    pub add: String,
    pub get_all: String,
    pub get_one: String,
    pub update: String,
    pub replace: String,
    pub delete: String,
}

impl HandlerNames {
    fn new(type_name: &str, plural: &str, suffix: &str) -> Self {
        HandlerNames {
            get_versions: format!("Get{type_name}Versions{suffix}"),
            add: format!("Add{type_name}{suffix}"),
            get_all: format!("Get{plural}{suffix}"),
            get_one: format!("Get{type_name}{suffix}"),
            update: format!("Update{type_name}{suffix}"),
            replace: format!("Replace{type_name}{suffix}"),
            delete: format!("Delete{type_name}{suffix}"),
        }
    }

    pub fn all(&self) -> [&str; 7] {
        [
            &self.get_versions,
            &self.add,
            &self.get_all,
            &self.get_one,
            &self.update,
            &self.replace,
            &self.delete,
        ]
    }
}

/// Client library function names for one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientNames {
    pub get_all: String,
    pub get_by_id: String,
    pub get_by_name: String,
    pub create: String,
    pub update: String,
    pub delete: String,
}

/// Package a generated symbol lives in. Names only need to be unique within
/// one scope of one version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SymbolScope {
    Api,
    Handlers,
    Client,
}

/// Every generated name for one object version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectSymbols {
    /// `ObjectTypeWorkloadDefinition`
    pub object_type: String,
    /// `WorkloadDefinitions`
    pub plural: String,
    /// `/v0/workload-definitions`
    pub path: String,
    /// `PathWorkloadDefinitions`
    pub path_const: String,
    /// `/workload-definitions/versions`
    pub versions_path: String,
    /// `PathWorkloadDefinitionVersions`
    pub versions_path_const: String,
    pub subject: Subject,
    pub create_subject: Subject,
    pub update_subject: Subject,
    pub delete_subject: Subject,
    pub handlers: HandlerNames,
    pub middleware: HandlerNames,
    pub client: ClientNames,
    /// `workloadDefinition`, for local variables
    pub variable: String,
    /// `WorkloadDefinitionReconciler`
    pub reconciler: String,
    /// `workload-definition`
    pub tptctl_command: String,
    /// `workload-definitions`
    pub tptctl_command_plural: String,
}

impl ObjectSymbols {
    pub fn new(type_name: &str, version: &str) -> Self {
        let plural = plural(type_name);
        let kebab = kebab_case(type_name);
        let kebab_plural = kebab_case(&plural);
        let camel = camel_case(type_name);
        let subject = |suffix: &str, value: &str| Subject {
            constant: format!("{type_name}{suffix}Subject"),
            value: format!("{camel}.{value}"),
        };

        ObjectSymbols {
            object_type: format!("ObjectType{type_name}"),
            path: format!("/{version}/{kebab_plural}"),
            path_const: format!("Path{plural}"),
            versions_path: format!("/{kebab_plural}/versions"),
            versions_path_const: format!("Path{type_name}Versions"),
            subject: subject("", "*"),
            create_subject: subject("Create", "create"),
            update_subject: subject("Update", "update"),
            delete_subject: subject("Delete", "delete"),
            handlers: HandlerNames::new(type_name, &plural, ""),
            middleware: HandlerNames::new(type_name, &plural, "Middleware"),
            client: ClientNames {
                get_all: format!("Get{plural}"),
                get_by_id: format!("Get{type_name}ByID"),
                get_by_name: format!("Get{type_name}ByName"),
                create: format!("Create{type_name}"),
                update: format!("Update{type_name}"),
                delete: format!("Delete{type_name}"),
            },
            reconciler: format!("{type_name}Reconciler"),
            variable: camel,
            tptctl_command: kebab,
            tptctl_command_plural: kebab_plural,
            plural,
        }
    }

    /// Package-level identifiers this object contributes, by scope.
    pub fn identifiers(&self) -> Vec<(SymbolScope, &str)> {
        let mut ids = vec![
            (SymbolScope::Api, self.object_type.as_str()),
            (SymbolScope::Api, self.path_const.as_str()),
            (SymbolScope::Api, self.versions_path_const.as_str()),
            (SymbolScope::Api, self.subject.constant.as_str()),
            (SymbolScope::Api, self.create_subject.constant.as_str()),
            (SymbolScope::Api, self.update_subject.constant.as_str()),
            (SymbolScope::Api, self.delete_subject.constant.as_str()),
        ];
        ids.extend(
            self.handlers
                .all()
                .into_iter()
                .chain(self.middleware.all())
                .map(|h| (SymbolScope::Handlers, h)),
        );
        ids.extend(
            [
                &self.client.get_all,
                &self.client.get_by_id,
                &self.client.get_by_name,
                &self.client.create,
                &self.client.update,
                &self.client.delete,
            ]
            .into_iter()
            .map(|c| (SymbolScope::Client, c.as_str())),
        );
        ids
    }
}
