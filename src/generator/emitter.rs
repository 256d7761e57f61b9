use anyhow::{bail, Context};
use clap::ValueEnum;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::model::{
    snake_case, ApiObjectGroup, GroupNaming, ObjectModel, ReconciledObject, RunContext,
    VersionConfig, VersionedApiObjectGroup, VersionedApiObjects,
};

/// Emission stage. Stages run in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    ApiModel,
    Routes,
    Handlers,
    Database,
    Client,
    Tptctl,
    Controller,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ApiModel => "api-model",
            Stage::Routes => "routes",
            Stage::Handlers => "handlers",
            Stage::Database => "database",
            Stage::Client => "client",
            Stage::Tptctl => "tptctl",
            Stage::Controller => "controller",
        };
        f.write_str(name)
    }
}

/// What one emitter invocation covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// Once per API version
    Version,
    /// Once per group per version it has objects in
    VersionGroup,
    /// Once per group
    Group,
    /// Once per reconciled object of a group
    ReconciledObject,
}

/// How an artifact treats an existing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteMode {
    /// Regenerated on every run
    Overwrite,
    /// Written once, then owned by the developer
    Scaffold,
}

/// The slice of the model one render call sees.
#[derive(Debug, Clone, Copy)]
pub enum Target<'m> {
    Version {
        model: &'m ObjectModel,
        version: &'m VersionedApiObjects,
        config: &'m VersionConfig,
    },
    VersionGroup {
        model: &'m ObjectModel,
        version: &'m VersionedApiObjects,
        group: &'m VersionedApiObjectGroup,
    },
    Group {
        model: &'m ObjectModel,
        group: &'m ApiObjectGroup,
    },
    ReconciledObject {
        model: &'m ObjectModel,
        group: &'m ApiObjectGroup,
        object: &'m ReconciledObject,
    },
}

impl<'m> Target<'m> {
    /// Every target of `granularity`, in model order.
    pub fn all(model: &'m ObjectModel, granularity: Granularity) -> Vec<Target<'m>> {
        match granularity {
            Granularity::Version => model
                .versioned
                .versions
                .iter()
                .filter_map(|version| {
                    model
                        .version_config
                        .get(&version.version)
                        .map(|config| Target::Version {
                            model,
                            version,
                            config,
                        })
                })
                .collect(),
            Granularity::VersionGroup => model
                .versioned
                .versions
                .iter()
                .flat_map(|version| {
                    version.groups.iter().map(move |group| Target::VersionGroup {
                        model,
                        version,
                        group,
                    })
                })
                .collect(),
            Granularity::Group => model
                .groups
                .iter()
                .map(|group| Target::Group { model, group })
                .collect(),
            Granularity::ReconciledObject => model
                .groups
                .iter()
                .flat_map(|group| {
                    group
                        .reconciled_objects
                        .iter()
                        .map(move |object| Target::ReconciledObject {
                            model,
                            group,
                            object,
                        })
                })
                .collect(),
        }
    }

    pub fn model(&self) -> &'m ObjectModel {
        match *self {
            Target::Version { model, .. }
            | Target::VersionGroup { model, .. }
            | Target::Group { model, .. }
            | Target::ReconciledObject { model, .. } => model,
        }
    }

    fn group_name(&self) -> Option<&'m str> {
        match *self {
            Target::Version { .. } => None,
            Target::VersionGroup { group, .. } => Some(&group.name),
            Target::Group { group, .. } | Target::ReconciledObject { group, .. } => {
                Some(&group.name)
            }
        }
    }

    fn naming(&self) -> Option<&'m GroupNaming> {
        match *self {
            Target::Version { .. } => None,
            Target::VersionGroup { group, .. } => Some(&group.naming),
            Target::Group { group, .. } | Target::ReconciledObject { group, .. } => {
                Some(&group.naming)
            }
        }
    }

    /// Value of a path placeholder, if this target defines it.
    pub fn placeholder(&self, key: &str) -> Option<String> {
        match key {
            "version" => match *self {
                Target::Version { version, .. } | Target::VersionGroup { version, .. } => {
                    Some(version.version.clone())
                }
                Target::ReconciledObject { object, .. } => {
                    object.latest_version().map(str::to_string)
                }
                Target::Group { .. } => None,
            },
            "group" => self.group_name().map(snake_case),
            "object" => match *self {
                Target::ReconciledObject { object, .. } => Some(snake_case(&object.name)),
                _ => None,
            },
            "controller" => self.naming().map(|n| n.controller_name.clone()),
            "package" => self.naming().map(|n| n.controller_package_name.clone()),
            _ => None,
        }
    }

    /// Short description for log lines and error context.
    pub fn describe(&self) -> String {
        match *self {
            Target::Version { version, .. } => version.version.clone(),
            Target::VersionGroup { version, group, .. } => {
                format!("{} ({})", group.name, version.version)
            }
            Target::Group { group, .. } => group.name.clone(),
            Target::ReconciledObject { group, object, .. } => {
                format!("{}.{}", group.name, object.name)
            }
        }
    }
}

/// Substitute `{placeholder}`s in a path template.
///
/// # Errors
///
/// Fails on an unterminated brace or a placeholder the target does not
/// define.
pub fn expand_path(template: &str, target: &Target<'_>) -> anyhow::Result<PathBuf> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            bail!("Unterminated placeholder in path template '{template}'");
        };
        let key = &after[..end];
        let value = target.placeholder(key).with_context(|| {
            format!(
                "Placeholder '{{{key}}}' in '{template}' is not defined for {}",
                target.describe()
            )
        })?;
        out.push_str(&value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(PathBuf::from(out))
}

/// One rendered file, not yet written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub emitter: &'static str,
    /// Relative to the project root
    pub path: PathBuf,
    pub mode: WriteMode,
    pub content: String,
}

/// Descriptor of one kind of generated file.
#[derive(Clone, Copy)]
pub struct EmitterSpec {
    pub name: &'static str,
    pub stage: Stage,
    pub granularity: Granularity,
    pub mode: WriteMode,
    pub path: &'static str,
    pub applies: fn(&Target<'_>) -> bool,
    pub render: fn(&Target<'_>, &RunContext) -> anyhow::Result<String>,
}

impl fmt::Debug for EmitterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmitterSpec")
            .field("name", &self.name)
            .field("stage", &self.stage)
            .field("granularity", &self.granularity)
            .field("mode", &self.mode)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl EmitterSpec {
    /// Render every applicable target. Does not touch the filesystem.
    ///
    /// # Errors
    ///
    /// Returns the first path expansion or render failure, naming the
    /// emitter and target.
    pub fn artifacts(
        &self,
        model: &ObjectModel,
        ctx: &RunContext,
    ) -> anyhow::Result<Vec<Artifact>> {
        let mut artifacts = Vec::new();
        for target in Target::all(model, self.granularity) {
            if !(self.applies)(&target) {
                continue;
            }
            let path = expand_path(self.path, &target)?;
            let content = (self.render)(&target, ctx).with_context(|| {
                format!(
                    "Emitter {} failed for {} ({})",
                    self.name,
                    target.describe(),
                    path.display()
                )
            })?;
            artifacts.push(Artifact {
                emitter: self.name,
                path,
                mode: self.mode,
                content,
            });
        }
        Ok(artifacts)
    }
}
