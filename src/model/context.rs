use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Go module path of the base project.
pub const BASE_MODULE_PATH: &str = "github.com/threeport/threeport";

static MODULE_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r#"(?m)^\s*module\s+"?([^"\s]+)"?\s*$"#).expect("valid module regex")
});

/// Whether the run targets the base project or a project built on top of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ProjectKind {
    Base,
    /// An out-of-tree project. Generated imports of its own packages use
    /// `module_path` instead of the base module.
    Extension { module_path: String },
}

/// Per-run settings threaded through the builder and every emitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunContext {
    pub project_root: PathBuf,
    pub kind: ProjectKind,
}

impl RunContext {
    pub fn base(project_root: impl Into<PathBuf>) -> Self {
        RunContext {
            project_root: project_root.into(),
            kind: ProjectKind::Base,
        }
    }

    pub fn extension(project_root: impl Into<PathBuf>, module_path: impl Into<String>) -> Self {
        RunContext {
            project_root: project_root.into(),
            kind: ProjectKind::Extension {
                module_path: module_path.into(),
            },
        }
    }

    /// Resolve the project kind for `project_root`.
    ///
    /// An explicit `module_override` wins; otherwise the module path is read
    /// from `go.mod`. Either way the base module path means [`ProjectKind::Base`].
    ///
    /// # Errors
    ///
    /// Fails when no override is given and `go.mod` is missing or has no
    /// `module` directive.
    pub fn detect(project_root: &Path, module_override: Option<&str>) -> anyhow::Result<Self> {
        let module_path = match module_override {
            Some(m) => m.to_string(),
            None => {
                let go_mod = project_root.join("go.mod");
                let content = fs::read_to_string(&go_mod).with_context(|| {
                    format!(
                        "Failed to read {} (pass --extension-module to skip detection)",
                        go_mod.display()
                    )
                })?;
                parse_module_path(&content)
                    .with_context(|| format!("No module directive in {}", go_mod.display()))?
            }
        };

        let ctx = if module_path == BASE_MODULE_PATH {
            RunContext::base(project_root)
        } else {
            RunContext::extension(project_root, module_path)
        };
        info!(
            root = %ctx.project_root.display(),
            module = %ctx.module_path(),
            extension = ctx.is_extension(),
            "resolved project"
        );
        Ok(ctx)
    }

    pub fn is_extension(&self) -> bool {
        matches!(self.kind, ProjectKind::Extension { .. })
    }

    /// Module path of the project being generated.
    pub fn module_path(&self) -> &str {
        match &self.kind {
            ProjectKind::Base => BASE_MODULE_PATH,
            ProjectKind::Extension { module_path } => module_path,
        }
    }

    /// Import path of a package inside the project, e.g. `pkg/api/v0`.
    pub fn import_path(&self, package: &str) -> String {
        format!("{}/{}", self.module_path(), package.trim_matches('/'))
    }

    /// Import path of a package that always comes from the base project.
    pub fn base_import_path(&self, package: &str) -> String {
        format!("{BASE_MODULE_PATH}/{}", package.trim_matches('/'))
    }
}

/// Module path declared by a `go.mod` file.
pub fn parse_module_path(go_mod: &str) -> Option<String> {
    MODULE_RE
        .captures(go_mod)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
