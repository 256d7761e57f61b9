use std::path::PathBuf;
use tracing::info;

use super::emitter::Stage;
use super::emitters::DEFAULT_EMITTERS;
use super::pipeline::{FailurePolicy, Pipeline};
use super::scaffold::scaffold_model_sources;
use super::sync::prune_stale;
use super::writer::{FileWriter, WriteReport};
use crate::config::SdkConfig;
use crate::inspect::GoInspector;
use crate::model::{ApiSourceLocator, ModelBuilder, ObjectModel, RunContext};

/// Options for one `gen` run.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Stages to run; empty runs all
    pub only: Vec<Stage>,
    pub dry_run: bool,
    pub policy: FailurePolicy,
}

/// Result of a `sync` run.
#[derive(Debug, Clone, Default)]
pub struct SyncOutcome {
    pub report: WriteReport,
    /// Generated files deleted (or, in dry-run mode, that would be)
    pub pruned: Vec<PathBuf>,
}

/// Build the object model from the model sources under the project root.
///
/// # Errors
///
/// Returns any configuration, inspection or model validation failure.
pub fn build_model(config: &SdkConfig, ctx: &RunContext) -> anyhow::Result<ObjectModel> {
    let locator = ApiSourceLocator::new(&ctx.project_root);
    ModelBuilder::new(ctx, &GoInspector, &locator).build(config)
}

/// Build the model and run the emission pipeline.
///
/// # Errors
///
/// Fails if the model cannot be built or, depending on the failure policy,
/// if any emitter fails.
pub fn generate_project(
    config: &SdkConfig,
    ctx: &RunContext,
    options: &GenerateOptions,
) -> anyhow::Result<WriteReport> {
    let model = build_model(config, ctx)?;
    let pipeline = Pipeline::with_defaults()
        .only(&options.only)
        .policy(options.policy);

    let mut writer = FileWriter::new(&ctx.project_root).dry_run(options.dry_run);
    let artifacts = pipeline.run(&model, ctx, &mut writer)?;
    info!(
        artifacts,
        emitters = pipeline.emitters().len(),
        dry_run = options.dry_run,
        "generation complete"
    );
    Ok(writer.into_report())
}

/// Regenerate everything, then delete generated files no longer produced.
///
/// # Errors
///
/// Fails like [`generate_project`]; nothing is pruned when generation fails.
pub fn sync_project(
    config: &SdkConfig,
    ctx: &RunContext,
    dry_run: bool,
) -> anyhow::Result<SyncOutcome> {
    let options = GenerateOptions {
        dry_run,
        ..GenerateOptions::default()
    };
    let report = generate_project(config, ctx, &options)?;
    let pruned = prune_stale(&ctx.project_root, &report, DEFAULT_EMITTERS, dry_run)?;
    Ok(SyncOutcome { report, pruned })
}

/// Scaffold the hand-written model source files for every configured group.
///
/// # Errors
///
/// Propagates template and write failures.
pub fn create_api_objects(
    config: &SdkConfig,
    ctx: &RunContext,
    dry_run: bool,
) -> anyhow::Result<WriteReport> {
    crate::config::validate_config(config)?;
    let mut writer = FileWriter::new(&ctx.project_root).dry_run(dry_run);
    let produced = scaffold_model_sources(config, &mut writer)?;
    info!(files = produced.len(), "model sources scaffolded");
    Ok(writer.into_report())
}
