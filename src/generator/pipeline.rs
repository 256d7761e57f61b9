use anyhow::{bail, Context};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{error, info, info_span};

use super::emitter::{EmitterSpec, Stage};
use super::emitters::DEFAULT_EMITTERS;
use super::writer::FileWriter;
use crate::model::{ObjectModel, RunContext};

/// What a run does after an emitter fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop at the first failure
    #[default]
    HaltOnFirst,
    /// Run every emitter, log each failure and fail at the end
    CollectAll,
}

/// Runs emitters in stage order and writes their artifacts.
#[derive(Debug, Clone)]
pub struct Pipeline {
    emitters: Vec<EmitterSpec>,
    policy: FailurePolicy,
}

impl Pipeline {
    pub fn new(mut emitters: Vec<EmitterSpec>) -> Self {
        emitters.sort_by_key(|e| e.stage);
        Pipeline {
            emitters,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_defaults() -> Self {
        Pipeline::new(DEFAULT_EMITTERS.to_vec())
    }

    /// Keep only emitters of the given stages. An empty list keeps all.
    pub fn only(mut self, stages: &[Stage]) -> Self {
        if !stages.is_empty() {
            self.emitters.retain(|e| stages.contains(&e.stage));
        }
        self
    }

    pub fn policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn emitters(&self) -> &[EmitterSpec] {
        &self.emitters
    }

    /// Render every emitter against `model` and write the results.
    ///
    /// Returns the number of artifacts handed to the writer.
    ///
    /// # Errors
    ///
    /// Under [`FailurePolicy::HaltOnFirst`] the first render or write
    /// failure is returned. Under [`FailurePolicy::CollectAll`] every
    /// failure is logged and a summary error is returned at the end.
    pub fn run(
        &self,
        model: &ObjectModel,
        ctx: &RunContext,
        writer: &mut FileWriter,
    ) -> anyhow::Result<usize> {
        let mut owners: BTreeMap<PathBuf, &'static str> = BTreeMap::new();
        let mut failures: Vec<String> = Vec::new();
        let mut count = 0;

        for emitter in &self.emitters {
            let _span = info_span!("emitter", name = emitter.name, stage = %emitter.stage).entered();
            match self.emit(emitter, model, ctx, writer, &mut owners) {
                Ok(n) => {
                    info!(artifacts = n, "emitter finished");
                    count += n;
                }
                Err(e) if self.policy == FailurePolicy::CollectAll => {
                    error!(error = %format!("{e:#}"), "emitter failed");
                    failures.push(emitter.name.to_string());
                }
                Err(e) => return Err(e),
            }
        }

        if !failures.is_empty() {
            bail!(
                "{} emitter(s) failed: {}",
                failures.len(),
                failures.join(", ")
            );
        }
        Ok(count)
    }

    fn emit(
        &self,
        emitter: &EmitterSpec,
        model: &ObjectModel,
        ctx: &RunContext,
        writer: &mut FileWriter,
        owners: &mut BTreeMap<PathBuf, &'static str>,
    ) -> anyhow::Result<usize> {
        let artifacts = emitter.artifacts(model, ctx)?;
        for artifact in &artifacts {
            if let Some(previous) = owners.insert(artifact.path.clone(), artifact.emitter) {
                bail!(
                    "Emitters {previous} and {} both produce {}",
                    artifact.emitter,
                    artifact.path.display()
                );
            }
            writer
                .write(&artifact.path, &artifact.content, artifact.mode)
                .with_context(|| {
                    format!(
                        "Emitter {} could not write {}",
                        artifact.emitter,
                        artifact.path.display()
                    )
                })?;
        }
        Ok(artifacts.len())
    }
}
