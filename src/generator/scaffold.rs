use askama::Template;
use std::path::PathBuf;
use tracing::info;

use super::emitter::WriteMode;
use super::templates::{ModelSourceTemplate, ModelStructView};
use super::writer::{FileWriter, WriteOutcome};
use crate::config::{ApiObjectConfig, SdkConfig};
use crate::inspect::Marker;
use crate::model::{kebab_case, ApiSourceLocator, SourceLocator};

/// Doc markers mirroring an object's configuration flags.
fn markers(object: &ApiObjectConfig) -> Vec<&'static str> {
    [
        (object.reconcilable, Marker::Reconciler),
        (object.allow_duplicate_model_names, Marker::AllowDuplicateNames),
        (object.allow_custom_middleware, Marker::AddCustomMiddleware),
        (object.load_associations_from_db, Marker::DbLoadAssociations),
        (object.tptctl.enabled, Marker::TptctlEnabled),
        (object.tptctl.config_path, Marker::TptctlConfigPath),
    ]
    .into_iter()
    .filter(|(on, _)| *on)
    .map(|(_, marker)| marker.sentinel())
    .collect()
}

fn struct_view(object: &ApiObjectConfig) -> ModelStructView {
    let mut embeds = Vec::new();
    if object.reconcilable {
        embeds.push("Reconciliation");
    }
    let is_definition = object.name.len() > "Definition".len() && object.name.ends_with("Definition");
    let is_instance = object.name.len() > "Instance".len() && object.name.ends_with("Instance");
    if is_definition {
        embeds.push("Definition");
    } else if is_instance {
        embeds.push("Instance");
    }

    ModelStructView {
        type_name: object.name.clone(),
        kebab: kebab_case(&object.name),
        markers: markers(object),
        name_field: !is_definition && !is_instance,
        embeds,
    }
}

/// Write a model source stub for every group and version in `config`.
///
/// Existing files are never touched. Returns the relative paths written (or,
/// in dry-run mode, that would be written).
///
/// # Errors
///
/// Propagates template and write failures.
pub fn scaffold_model_sources(
    config: &SdkConfig,
    writer: &mut FileWriter,
) -> anyhow::Result<Vec<PathBuf>> {
    let locator = ApiSourceLocator::new("");
    let mut produced = Vec::new();

    for group in &config.api_object_groups {
        for version in group.versions() {
            let objects: Vec<ModelStructView> = group
                .objects
                .iter()
                .filter(|o| o.versions.contains(&version))
                .map(struct_view)
                .collect();
            let content = ModelSourceTemplate {
                version: &version,
                group: &group.name,
                objects,
            }
            .render()?;

            let path = locator.locate(&version, &group.name);
            match writer.write(&path, &content, WriteMode::Scaffold)? {
                WriteOutcome::Skipped => {
                    info!(path = %path.display(), "model source exists; skipping")
                }
                WriteOutcome::Written | WriteOutcome::WouldWrite => produced.push(path),
            }
        }
    }
    Ok(produced)
}
