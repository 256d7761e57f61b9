use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use super::tag::TagMap;

/// Field identifiers (or embedded type names) that make an object unique by
/// name.
pub const NAME_FIELDS: &[&str] = &["Name", "Definition", "Instance"];

/// Field name that records reconciliation state.
pub const RECONCILED_FIELD: &str = "Reconciled";

/// Embedded type that carries the reconciliation fields.
pub const RECONCILIATION_TYPE: &str = "Reconciliation";

/// Doc-comment sentinel placed above a model struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Marker {
    Reconciler,
    AllowDuplicateNames,
    AddCustomMiddleware,
    DbLoadAssociations,
    TptctlEnabled,
    TptctlConfigPath,
}

impl Marker {
    pub const ALL: [Marker; 6] = [
        Marker::Reconciler,
        Marker::AllowDuplicateNames,
        Marker::AddCustomMiddleware,
        Marker::DbLoadAssociations,
        Marker::TptctlEnabled,
        Marker::TptctlConfigPath,
    ];

    /// The substring searched for in doc comments.
    pub fn sentinel(self) -> &'static str {
        match self {
            Marker::Reconciler => "threeport-sdk:reconciler",
            Marker::AllowDuplicateNames => "threeport-sdk:allow-duplicate-names",
            Marker::AddCustomMiddleware => "threeport-sdk:add-custom-middleware",
            Marker::DbLoadAssociations => "threeport-sdk:db-load-associations",
            Marker::TptctlEnabled => "threeport-sdk:tptctl-enabled",
            Marker::TptctlConfigPath => "threeport-sdk:tptctl-config-path",
        }
    }

    /// Every marker whose sentinel occurs in `doc`.
    pub fn scan(doc: &str) -> BTreeSet<Marker> {
        Marker::ALL
            .into_iter()
            .filter(|m| doc.contains(m.sentinel()))
            .collect()
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sentinel())
    }
}

/// One struct field. Identifier lists (`A, B int`) produce one entry per name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldFacts {
    /// Field name; for embedded fields the embedded type's last segment
    pub name: String,
    pub embedded: bool,
    /// Source text of the field type, e.g. `*string` or `v0.Common`
    pub type_expr: String,
    pub exported: bool,
    pub tags: TagMap,
}

/// Facts about one struct type declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeFacts {
    pub name: String,
    pub line: usize,
    pub markers: BTreeSet<Marker>,
    /// Fields matching [`NAME_FIELDS`]
    pub name_fields: Vec<String>,
    pub reconciled_field: bool,
    /// Fields in declaration order
    pub fields: Vec<FieldFacts>,
}

impl TypeFacts {
    pub(crate) fn new(
        name: String,
        line: usize,
        markers: BTreeSet<Marker>,
        fields: Vec<FieldFacts>,
    ) -> Self {
        let name_fields = fields
            .iter()
            .filter(|f| NAME_FIELDS.contains(&f.name.as_str()))
            .map(|f| f.name.clone())
            .collect();
        let reconciled_field = fields.iter().any(|f| {
            f.name == RECONCILED_FIELD || (f.embedded && f.name == RECONCILIATION_TYPE)
        });
        TypeFacts {
            name,
            line,
            markers,
            name_fields,
            reconciled_field,
            fields,
        }
    }

    pub fn has_name_field(&self) -> bool {
        !self.name_fields.is_empty()
    }

    pub fn has_marker(&self, marker: Marker) -> bool {
        self.markers.contains(&marker)
    }

    pub fn exported_fields(&self) -> impl Iterator<Item = &FieldFacts> {
        self.fields.iter().filter(|f| f.exported)
    }

    /// Field name → tag map. A struct with no fields yields an empty map.
    pub fn tag_map(&self) -> BTreeMap<String, TagMap> {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), f.tags.clone()))
            .collect()
    }
}

/// Everything learned from one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFacts {
    pub path: PathBuf,
    pub package: String,
    /// Struct types in declaration order
    pub types: Vec<TypeFacts>,
}

impl SourceFacts {
    pub fn get(&self, type_name: &str) -> Option<&TypeFacts> {
        self.types.iter().find(|t| t.name == type_name)
    }
}
