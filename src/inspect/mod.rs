//! # Source Inspector
//!
//! Reads the hand-written Go data-model files and reports struct-level facts:
//! which fields a struct declares, which doc-comment markers sit above it and
//! the parsed struct tags of every field.
//!
//! ```text
//! pkg/api/v0/workload.go → lexer → declaration parser → SourceFacts
//! ```
//!
//! Only declarations are parsed. Function bodies, imports and values are
//! skipped with bracket balancing, so the inspector never needs a Go
//! toolchain.
//!
//! ## Markers
//!
//! A marker is a sentinel string anywhere in the doc comment of a struct:
//!
//! ```go
//! // WorkloadInstance is a deployed workload.
//! // threeport-sdk:reconciler
//! // threeport-sdk:tptctl-enabled
//! type WorkloadInstance struct {
//!     Common         `swaggerignore:"true" mapstructure:",squash"`
//!     Reconciliation `mapstructure:",squash"`
//!     Instance       `mapstructure:",squash"`
//! }
//! ```

mod error;
mod facts;
mod lexer;
mod parser;
mod tag;


pub use error::ParseError;
pub use facts::{
    FieldFacts, Marker, SourceFacts, TypeFacts, NAME_FIELDS, RECONCILED_FIELD,
    RECONCILIATION_TYPE,
};
pub use parser::parse_go_source;
pub use tag::{parse_struct_tag, TagMap};

use anyhow::Context;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Produces struct-level facts for one model source file.
///
/// The builder only talks to this trait, so tests can hand it canned facts
/// and other source languages can plug in without touching the model.
pub trait SourceInspector {
    /// Inspect the file at `path`.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or does not parse. Parse failures
    /// carry a [`ParseError`] that callers may downcast to.
    fn inspect(&self, path: &Path) -> anyhow::Result<SourceFacts>;
}

/// Inspector for Go source files.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoInspector;

impl SourceInspector for GoInspector {
    fn inspect(&self, path: &Path) -> anyhow::Result<SourceFacts> {
        let src = fs::read_to_string(path)
            .with_context(|| format!("Failed to read model source {}", path.display()))?;
        let facts = parse_go_source(&src, path)?;
        debug!(
            path = %path.display(),
            package = %facts.package,
            structs = facts.types.len(),
            "inspected model source"
        );
        Ok(facts)
    }
}
