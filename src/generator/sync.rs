use anyhow::Context;
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use super::emitter::{EmitterSpec, WriteMode};
use super::writer::WriteReport;

/// Directories, relative to the project root, that hold generated files.
pub const GENERATED_DIRS: &[&str] = &["pkg/api", "pkg/api-server", "pkg/client", "cmd", "internal"];

/// Suffix that marks a file as owned by the generator.
pub const GENERATED_SUFFIX: &str = "_gen.go";

/// Compile an emitter path template into a regex matching every path the
/// template can expand to. Each `{placeholder}` matches one non-empty
/// path segment part.
///
/// # Errors
///
/// Fails on an unterminated placeholder.
pub fn path_matcher(template: &str) -> anyhow::Result<Regex> {
    let mut pattern = String::from("^");
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        pattern.push_str(&regex::escape(&rest[..start]));
        let after = &rest[start + 1..];
        let end = after
            .find('}')
            .with_context(|| format!("Unterminated placeholder in path template '{template}'"))?;
        pattern.push_str("[^/]+");
        rest = &after[end + 1..];
    }
    pattern.push_str(&regex::escape(rest));
    pattern.push('$');
    Regex::new(&pattern).with_context(|| format!("Invalid path template '{template}'"))
}

/// Matchers for the overwritten `_gen.go` outputs of `emitters`.
fn generated_matchers(emitters: &[EmitterSpec]) -> anyhow::Result<Vec<Regex>> {
    emitters
        .iter()
        .filter(|e| e.mode == WriteMode::Overwrite && e.path.ends_with(GENERATED_SUFFIX))
        .map(|e| path_matcher(e.path))
        .collect()
}

/// `relative` joined with `/`, whatever the platform separator.
fn slash_path(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Delete generated files that the run described by `report` did not
/// produce.
///
/// A file is a candidate only when it lies below [`GENERATED_DIRS`] and its
/// path matches the path template of one of `emitters` that overwrites a
/// [`GENERATED_SUFFIX`] file. Other `_gen.go` files are left alone. In
/// dry-run mode nothing is deleted. Returns the stale paths relative to
/// `root`, sorted.
///
/// # Errors
///
/// Fails if a directory cannot be walked or a file cannot be removed.
pub fn prune_stale(
    root: &Path,
    report: &WriteReport,
    emitters: &[EmitterSpec],
    dry_run: bool,
) -> anyhow::Result<Vec<PathBuf>> {
    let matchers = generated_matchers(emitters)?;
    let produced: BTreeSet<&Path> = report.produced().map(PathBuf::as_path).collect();
    let mut stale = Vec::new();

    for dir in GENERATED_DIRS {
        let base = root.join(dir);
        if !base.is_dir() {
            continue;
        }
        for entry in WalkDir::new(&base).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to walk {}", base.display()))?;
            if !entry.file_type().is_file()
                || !entry.file_name().to_string_lossy().ends_with(GENERATED_SUFFIX)
            {
                continue;
            }
            let relative = entry.path().strip_prefix(root).with_context(|| {
                format!("{} is outside {}", entry.path().display(), root.display())
            })?;
            if produced.contains(relative) {
                continue;
            }
            let slashed = slash_path(relative);
            if !matchers.iter().any(|m| m.is_match(&slashed)) {
                debug!(path = %slashed, "keeping file not owned by any emitter");
                continue;
            }

            if dry_run {
                info!(path = %relative.display(), "would delete stale generated file");
            } else {
                fs::remove_file(entry.path())
                    .with_context(|| format!("Failed to delete {}", entry.path().display()))?;
                info!(path = %relative.display(), "deleted stale generated file");
            }
            stale.push(relative.to_path_buf());
        }
    }

    stale.sort();
    stale.dedup();
    Ok(stale)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::generator::DEFAULT_EMITTERS;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "package x\n").unwrap();
    }

    #[test]
    fn test_prunes_only_unproduced_gen_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "pkg/api/v0/gateway_gen.go");
        touch(root, "pkg/api/v0/retired_gen.go");
        touch(root, "pkg/api/v0/gateway.go");
        touch(root, "docs/old_gen.go");

        let report = WriteReport {
            written: vec![PathBuf::from("pkg/api/v0/gateway_gen.go")],
            ..Default::default()
        };
        let stale = prune_stale(root, &report, DEFAULT_EMITTERS, false).unwrap();

        assert_eq!(stale, vec![PathBuf::from("pkg/api/v0/retired_gen.go")]);
        assert!(!root.join("pkg/api/v0/retired_gen.go").exists());
        assert!(root.join("pkg/api/v0/gateway_gen.go").exists());
        assert!(root.join("pkg/api/v0/gateway.go").exists());
        assert!(root.join("docs/old_gen.go").exists());
    }

    #[test]
    fn test_dry_run_keeps_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "internal/gateway/reconcilers_gen.go");

        let stale = prune_stale(dir.path(), &WriteReport::default(), DEFAULT_EMITTERS, true).unwrap();
        assert_eq!(stale, vec![PathBuf::from("internal/gateway/reconcilers_gen.go")]);
        assert!(dir.path().join("internal/gateway/reconcilers_gen.go").exists());
    }

    #[test]
    fn test_foreign_gen_files_survive() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "internal/version/version_gen.go");
        touch(root, "internal/gateway/reconcilers_gen.go");
        touch(root, "internal/gateway/mocks_gen.go");
        touch(root, "pkg/api-server/v0/routes/extra/more_gen.go");
        touch(root, "cmd/tptctl/cmd/gateway_gen.go");

        let stale = prune_stale(root, &WriteReport::default(), DEFAULT_EMITTERS, false).unwrap();

        assert_eq!(
            stale,
            vec![
                PathBuf::from("cmd/tptctl/cmd/gateway_gen.go"),
                PathBuf::from("internal/gateway/reconcilers_gen.go"),
            ]
        );
        assert!(root.join("internal/version/version_gen.go").exists());
        assert!(root.join("internal/gateway/mocks_gen.go").exists());
        assert!(root.join("pkg/api-server/v0/routes/extra/more_gen.go").exists());
    }

    #[test]
    fn test_path_matcher_follows_template() {
        let matcher = path_matcher("pkg/api-server/{version}/routes/{group}_gen.go").unwrap();
        assert!(matcher.is_match("pkg/api-server/v0/routes/gateway_gen.go"));
        assert!(matcher.is_match("pkg/api-server/v1alpha2/routes/routes_gen.go"));
        assert!(!matcher.is_match("pkg/api-server/v0/routes/gateway.go"));
        assert!(!matcher.is_match("pkg/api-server/v0/extra/routes/gateway_gen.go"));
        assert!(!matcher.is_match("xpkg/api-server/v0/routes/gateway_gen.go"));

        let literal = path_matcher("internal/{package}/reconcilers_gen.go").unwrap();
        assert!(!literal.is_match("internal/gateway/reconcilersXgen.go"));

        assert!(path_matcher("cmd/{controller/main_gen.go").is_err());
    }
}
