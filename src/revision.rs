//! Marker file holding the upstream revision of the last import.

use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File recording the upstream revision of the last import
#[derive(Debug, Clone)]
pub struct RevisionMarker {
    path: PathBuf,
}

impl RevisionMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Recorded revision, `None` if nothing was recorded yet
    pub fn read(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(content
                .lines()
                .next()
                .map(str::trim)
                .filter(|revision| !revision.is_empty())
                .map(str::to_string)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to read revision file: {:?}", self.path))
            }
        }
    }

    pub fn write(&self, revision: &str) -> Result<()> {
        std::fs::write(&self.path, format!("{}\n", revision))
            .with_context(|| format!("Failed to write revision file: {:?}", self.path))
    }
}
