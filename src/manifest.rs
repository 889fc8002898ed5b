//! File manifests describing what gets imported from the Gecko tree.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const HEADER_FILES: &str = "header_files.json";
pub const SOURCE_FILES: &str = "src_files.json";
pub const OBJDIR_FILES: &str = "objdir_files.json";
pub const GLUE_FILES: &str = "glue_files.json";

/// The four manifests, loaded once per run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifests {
    /// Destination path under `include/` -> path in the Gecko tree
    pub headers: BTreeMap<String, String>,
    /// Paths in the Gecko tree, copied to the same path under `src/`
    pub sources: Vec<String>,
    /// Paths relative to `<objdir>/dist/include`, copied under `include/`
    pub objdir: Vec<String>,
    /// Glue file name -> upstream file it was derived from
    pub glue: BTreeMap<String, String>,
}

impl Manifests {
    /// Load all manifests from `data_dir`
    pub fn load(data_dir: &Path) -> Result<Self> {
        Ok(Self {
            headers: read_json(&data_dir.join(HEADER_FILES))?,
            sources: read_json(&data_dir.join(SOURCE_FILES))?,
            objdir: read_json(&data_dir.join(OBJDIR_FILES))?,
            glue: read_json(&data_dir.join(GLUE_FILES))?,
        })
    }
}

/// Join a manifest path onto a tree root. Manifest paths are always
/// relative, a leading `/` included.
pub fn tree_path(root: &Path, relative: &str) -> PathBuf {
    root.join(relative.trim_start_matches('/'))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {:?}", path))?;

    serde_json::from_str(&content).with_context(|| format!("Failed to parse manifest: {:?}", path))
}
