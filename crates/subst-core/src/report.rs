//! Collection of recoverable problems hit during resolution

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Which loader gave up on a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Override,
    Secret,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Override => write!(f, "override"),
            Self::Secret => write!(f, "secret"),
        }
    }
}

/// A file that was skipped instead of aborting the run
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub kind: SourceKind,
    pub path: PathBuf,
    pub reason: String,
}

/// Recoverable events collected while assembling a context
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolutionReport {
    pub skipped: Vec<SkippedFile>,
}

impl ResolutionReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a skipped file and emit a warning
    pub fn skip(&mut self, kind: SourceKind, path: impl Into<PathBuf>, reason: impl fmt::Display) {
        let path = path.into();
        let reason = reason.to_string();
        tracing::warn!(%kind, path = %path.display(), %reason, "skipping file");
        self.skipped.push(SkippedFile { kind, path, reason });
    }

    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }

    pub fn skipped_of(&self, kind: SourceKind) -> impl Iterator<Item = &SkippedFile> {
        self.skipped.iter().filter(move |s| s.kind == kind)
    }
}
