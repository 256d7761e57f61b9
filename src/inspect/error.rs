use std::fmt;
use std::path::{Path, PathBuf};

/// Syntax error in a hand-written model source file.
///
/// Generation cannot proceed until the source is fixed, so this is always
/// fatal for the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// File being parsed
    pub path: PathBuf,
    /// 1-based line of the offending token
    pub line: usize,
    /// 1-based column of the offending token
    pub column: usize,
    /// What was wrong
    pub message: String,
}

impl ParseError {
    pub(crate) fn new(path: &Path, line: usize, column: usize, message: impl Into<String>) -> Self {
        ParseError {
            path: path.to_path_buf(),
            line,
            column,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}",
            self.path.display(),
            self.line,
            self.column,
            self.message
        )
    }
}

impl std::error::Error for ParseError {}
