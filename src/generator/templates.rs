//! Template data for every generated file.
//!
//! Templates stay free of logic beyond loops and flags: strings that end up
//! as Go literals are quoted here, and imports are resolved against the
//! [`RunContext`](crate::model::RunContext) before rendering.

use askama::Template;
use std::collections::BTreeSet;

use crate::inspect::TagMap;
use crate::model::{ApiObject, ObjectSymbols, StructTagIndex};

/// Quote `s` as a Go interpreted string literal.
///
/// # Errors
///
/// Only fails if JSON serialization of a string fails.
pub fn go_quote(s: &str) -> anyhow::Result<String> {
    Ok(serde_json::to_string(s)?)
}

/// A named Go import.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct GoImport {
    pub alias: String,
    pub path: String,
}

impl GoImport {
    pub fn new(alias: impl Into<String>, path: impl Into<String>) -> Self {
        GoImport {
            alias: alias.into(),
            path: path.into(),
        }
    }
}

/// Package aliases for one API version referenced from a
/// version-independent file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct VersionAliases {
    pub version: String,
    pub api: String,
    pub client: String,
}

impl VersionAliases {
    pub fn new(version: &str) -> Self {
        VersionAliases {
            version: version.to_string(),
            api: format!("api_{version}"),
            client: format!("client_{version}"),
        }
    }
}

/// An object version with its Go literals precomputed.
#[derive(Debug, Clone)]
pub struct ObjectView<'a> {
    pub obj: &'a ApiObject,
    pub s: &'a ObjectSymbols,
    pub q_type: String,
    pub q_path: String,
    pub q_versions_path: String,
    pub q_subject: String,
    pub q_create_subject: String,
    pub q_update_subject: String,
    pub q_delete_subject: String,
    /// Adds are rejected when the name is already taken
    pub duplicate_check: bool,
    /// Re-read the record before notifying; off for objects whose `Data`
    /// is never persisted
    pub refetch_latest: bool,
    /// `Preload(...)` call prefix, empty unless associations are loaded
    pub preload: &'static str,
}

impl<'a> ObjectView<'a> {
    pub fn new(obj: &'a ApiObject) -> anyhow::Result<Self> {
        let s = &obj.symbols;
        Ok(ObjectView {
            obj,
            s,
            q_type: go_quote(&obj.type_name)?,
            q_path: go_quote(&s.path)?,
            q_versions_path: go_quote(&s.versions_path)?,
            q_subject: go_quote(&s.subject.value)?,
            q_create_subject: go_quote(&s.create_subject.value)?,
            q_update_subject: go_quote(&s.update_subject.value)?,
            q_delete_subject: go_quote(&s.delete_subject.value)?,
            duplicate_check: obj.name_field && !obj.allow_duplicate_names,
            refetch_latest: obj.data_persisted(),
            preload: if obj.db_load_associations {
                "Preload(gorm_clause.Associations)."
            } else {
                ""
            },
        })
    }
}

/// A tptctl-enabled object at its latest version.
#[derive(Debug, Clone)]
pub struct TptctlObjectView<'a> {
    pub obj: &'a ApiObject,
    pub s: &'a ObjectSymbols,
    pub aliases: VersionAliases,
    pub plural_variable: String,
}

/// A reconciled object at its latest version.
#[derive(Debug, Clone)]
pub struct ReconcilerView<'a> {
    pub obj: &'a ApiObject,
    pub s: &'a ObjectSymbols,
    pub aliases: VersionAliases,
    pub durable: bool,
    /// Command-line flag setting the reconciler's concurrency
    pub concurrency_flag: String,
    pub concurrency_var: String,
}

#[derive(Debug, Clone)]
pub struct TaggedFieldView {
    pub name: String,
    pub tags: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct TaggedObjectView<'a> {
    pub name: String,
    pub object_type: &'a str,
    pub fields: Vec<TaggedFieldView>,
}

/// Quote a group's struct tag index for emission. Fields without tags are
/// dropped; objects keep their slot even when empty.
pub fn tagged_objects<'a>(
    index: &StructTagIndex,
    objects: &[&'a ApiObject],
) -> anyhow::Result<Vec<TaggedObjectView<'a>>> {
    let mut views = Vec::new();
    for obj in objects {
        let mut fields = Vec::new();
        if let Some(by_field) = index.get(&obj.type_name) {
            for (field, tags) in by_field {
                if tags.is_empty() {
                    continue;
                }
                fields.push(TaggedFieldView {
                    name: go_quote(field)?,
                    tags: quote_tags(tags)?,
                });
            }
        }
        views.push(TaggedObjectView {
            name: go_quote(&obj.type_name)?,
            object_type: &obj.symbols.object_type,
            fields,
        });
    }
    Ok(views)
}

fn quote_tags(tags: &TagMap) -> anyhow::Result<Vec<(String, String)>> {
    tags.iter()
        .map(|(k, v)| Ok((go_quote(k)?, go_quote(v)?)))
        .collect()
}

#[derive(Template)]
#[template(path = "api_object.go.txt", escape = "none")]
pub struct ApiObjectTemplate<'a> {
    pub version: &'a str,
    pub stream_name: &'a str,
    pub q_stream: String,
    pub notifications_import: String,
    pub objects: Vec<ObjectView<'a>>,
}

#[derive(Template)]
#[template(path = "notifications.go.txt", escape = "none")]
pub struct NotificationsTemplate<'a> {
    pub version: &'a str,
    pub streams: Vec<&'a str>,
    pub reconciled: Vec<&'a ApiObject>,
}

#[derive(Template)]
#[template(path = "tagged_fields.go.txt", escape = "none")]
pub struct TaggedFieldsTemplate<'a> {
    pub version: &'a str,
    pub q_version: String,
    pub group: &'a str,
    pub domain: &'a str,
    pub api_import: String,
    pub objects: Vec<TaggedObjectView<'a>>,
}

#[derive(Template)]
#[template(path = "routes.go.txt", escape = "none")]
pub struct RoutesTemplate<'a> {
    pub group: &'a str,
    pub domain: &'a str,
    pub api_import: String,
    pub handlers_import: String,
    pub objects: Vec<ObjectView<'a>>,
}

#[derive(Template)]
#[template(path = "route_registry.go.txt", escape = "none")]
pub struct RouteRegistryTemplate<'a> {
    pub version: &'a str,
    pub handlers_import: String,
    pub domains: Vec<&'a str>,
    pub route_names: Vec<String>,
}

#[derive(Template)]
#[template(path = "handlers.go.txt", escape = "none")]
pub struct HandlersTemplate<'a> {
    pub imports: BTreeSet<GoImport>,
    pub objects: Vec<ObjectView<'a>>,
}

#[derive(Template)]
#[template(path = "database.go.txt", escape = "none")]
pub struct DatabaseTemplate<'a> {
    pub version: &'a str,
    pub api_import: String,
    pub names: &'a [String],
}

#[derive(Template)]
#[template(path = "client.go.txt", escape = "none")]
pub struct ClientTemplate<'a> {
    pub version: &'a str,
    pub api_import: String,
    pub client_lib_import: String,
    pub objects: Vec<ObjectView<'a>>,
}

#[derive(Template)]
#[template(path = "tptctl_commands.go.txt", escape = "none")]
pub struct TptctlCommandsTemplate<'a> {
    pub imports: BTreeSet<GoImport>,
    pub objects: Vec<TptctlObjectView<'a>>,
}

#[derive(Template)]
#[template(path = "tptctl_output.go.txt", escape = "none")]
pub struct TptctlOutputTemplate<'a> {
    pub imports: BTreeSet<GoImport>,
    pub objects: Vec<TptctlObjectView<'a>>,
}

#[derive(Template)]
#[template(path = "controller_main.go.txt", escape = "none")]
pub struct ControllerMainTemplate<'a> {
    pub controller_name: &'a str,
    pub domain: &'a str,
    pub package: &'a str,
    pub stream_name: &'a str,
    pub stream_alias: String,
    pub imports: BTreeSet<GoImport>,
    pub reconcilers: Vec<ReconcilerView<'a>>,
}

#[derive(Template)]
#[template(path = "reconcilers.go.txt", escape = "none")]
pub struct ReconcilersTemplate<'a> {
    pub package: &'a str,
    pub imports: BTreeSet<GoImport>,
    pub reconcilers: Vec<ReconcilerView<'a>>,
}

#[derive(Template)]
#[template(path = "reconciler_stub.go.txt", escape = "none")]
pub struct ReconcilerStubTemplate<'a> {
    pub package: &'a str,
    pub imports: BTreeSet<GoImport>,
    pub reconciler: ReconcilerView<'a>,
}

#[derive(Template)]
#[template(path = "Dockerfile.txt", escape = "none")]
pub struct DockerfileTemplate<'a> {
    pub controller_name: &'a str,
    pub image_repo: &'a str,
}

/// One struct stub in a scaffolded model source file.
#[derive(Debug, Clone)]
pub struct ModelStructView {
    pub type_name: String,
    pub kebab: String,
    pub markers: Vec<&'static str>,
    pub embeds: Vec<&'static str>,
    pub name_field: bool,
}

#[derive(Template)]
#[template(path = "model_source.go.txt", escape = "none")]
pub struct ModelSourceTemplate<'a> {
    pub version: &'a str,
    pub group: &'a str,
    pub objects: Vec<ModelStructView>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::inspect::TagMap;

    #[test]
    fn test_go_quote_escapes() {
        assert_eq!(go_quote("v0").unwrap(), "\"v0\"");
        assert_eq!(go_quote(r#"a "b""#).unwrap(), r#""a \"b\"""#);
    }

    #[test]
    fn test_dockerfile_render() {
        let rendered = DockerfileTemplate {
            controller_name: "gateway-controller",
            image_repo: "ghcr.io/example",
        }
        .render()
        .unwrap();
        assert!(rendered.contains("go build -a -o gateway-controller ./cmd/gateway-controller"));
        assert!(rendered.contains("ENTRYPOINT [\"/gateway-controller\"]"));
    }

    #[test]
    fn test_tagged_objects_skip_untagged_fields() {
        let mut obj = ApiObject::from_config(
            &crate::config::ApiObjectConfig {
                name: "Gateway".into(),
                versions: vec!["v0".into()],
                ..Default::default()
            },
            "v0",
        );
        obj.field_tags.insert("Port".into(), TagMap::new());

        let mut fields = std::collections::BTreeMap::new();
        fields.insert("Port".to_string(), TagMap::new());
        let mut tags = TagMap::new();
        tags.insert("validate".into(), "required".into());
        fields.insert("Name".to_string(), tags);
        let mut index = StructTagIndex::new();
        index.insert("Gateway".into(), fields);

        let views = tagged_objects(&index, &[&obj]).unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].name, "\"Gateway\"");
        assert_eq!(views[0].fields.len(), 1);
        assert_eq!(views[0].fields[0].name, "\"Name\"");
        assert_eq!(
            views[0].fields[0].tags,
            vec![("\"validate\"".to_string(), "\"required\"".to_string())]
        );
    }
}
