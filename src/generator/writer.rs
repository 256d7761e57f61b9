use anyhow::Context;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::emitter::WriteMode;

/// Write `content` to `path`, creating parent directories.
///
/// Returns `Ok(false)` without touching the file when `overwrite` is false
/// and the file already exists.
///
/// # Errors
///
/// Returns an error naming the path if a directory cannot be created or the
/// file cannot be written.
pub fn write_file(path: &Path, content: &str, overwrite: bool) -> anyhow::Result<bool> {
    if !overwrite && path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}

/// What happened to one write request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// Scaffold target already exists
    Skipped,
    /// Dry run: the file would have been written
    WouldWrite,
}

/// Paths touched during a run, relative to the project root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub would_write: Vec<PathBuf>,
}

impl WriteReport {
    /// Every path this run produced or would have produced, including
    /// scaffolds that were left alone.
    pub fn produced(&self) -> impl Iterator<Item = &PathBuf> {
        self.written
            .iter()
            .chain(self.would_write.iter())
            .chain(self.skipped.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.written.is_empty() && self.skipped.is_empty() && self.would_write.is_empty()
    }
}

/// Persists generated files below a project root.
#[derive(Debug)]
pub struct FileWriter {
    root: PathBuf,
    dry_run: bool,
    report: WriteReport,
}

impl FileWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileWriter {
            root: root.into(),
            dry_run: false,
            report: WriteReport::default(),
        }
    }

    /// In dry-run mode nothing is written; the report lists what would be.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `content` to `relative` below the root.
    ///
    /// [`WriteMode::Scaffold`] never replaces an existing file, even outside
    /// dry-run mode.
    ///
    /// # Errors
    ///
    /// Propagates [`write_file`] failures.
    pub fn write(
        &mut self,
        relative: &Path,
        content: &str,
        mode: WriteMode,
    ) -> anyhow::Result<WriteOutcome> {
        let path = self.root.join(relative);
        let overwrite = mode == WriteMode::Overwrite;

        if !overwrite && path.exists() {
            debug!(path = %relative.display(), "scaffold exists; leaving it alone");
            self.report.skipped.push(relative.to_path_buf());
            return Ok(WriteOutcome::Skipped);
        }
        if self.dry_run {
            info!(path = %relative.display(), bytes = content.len(), "would write");
            self.report.would_write.push(relative.to_path_buf());
            return Ok(WriteOutcome::WouldWrite);
        }

        write_file(&path, content, overwrite)?;
        debug!(path = %relative.display(), bytes = content.len(), "wrote file");
        self.report.written.push(relative.to_path_buf());
        Ok(WriteOutcome::Written)
    }

    pub fn report(&self) -> &WriteReport {
        &self.report
    }

    pub fn into_report(self) -> WriteReport {
        self.report
    }
}
