//! Copying manifested files into the destination tree.

use anyhow::{Context, Result};
use filetime::FileTime;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info};

use crate::manifest::{tree_path, Manifests};

pub const INCLUDE_DIR: &str = "include";
pub const SRC_DIR: &str = "src";

/// Number of files copied per manifest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopySummary {
    pub headers: usize,
    pub sources: usize,
    pub objdir: usize,
}

impl CopySummary {
    pub fn total(&self) -> usize {
        self.headers + self.sources + self.objdir
    }
}

/// Remove `include/` and `src/` left over from the previous import
pub fn remove_previous_copy(dst_dir: &Path) -> Result<()> {
    for sub_dir in [INCLUDE_DIR, SRC_DIR] {
        let path = dst_dir.join(sub_dir);
        match std::fs::remove_dir_all(&path) {
            Ok(()) => debug!("Removed previous copy: {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to remove {:?}", path));
            }
        }
    }
    Ok(())
}

/// Copy headers and object-dir headers to `include/`, sources to `src/`
pub fn copy_files(
    manifests: &Manifests,
    src_dir: &Path,
    obj_include_dir: &Path,
    dst_dir: &Path,
) -> Result<CopySummary> {
    let include_dir = dst_dir.join(INCLUDE_DIR);
    let source_dir = dst_dir.join(SRC_DIR);
    let mut summary = CopySummary::default();

    for (dst, src) in &manifests.headers {
        copy_file(&tree_path(src_dir, src), &tree_path(&include_dir, dst))?;
        summary.headers += 1;
    }

    for src in &manifests.sources {
        copy_file(&tree_path(src_dir, src), &tree_path(&source_dir, src))?;
        summary.sources += 1;
    }

    for src in &manifests.objdir {
        copy_file(&tree_path(obj_include_dir, src), &tree_path(&include_dir, src))?;
        summary.objdir += 1;
    }

    info!(
        "Copied {} files ({} headers, {} sources, {} object dir headers)",
        summary.total(),
        summary.headers,
        summary.sources,
        summary.objdir
    );

    Ok(summary)
}

/// Copy contents and permissions, then carry over access and modification
/// times
pub fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    std::fs::copy(from, to).with_context(|| format!("Failed to copy {:?} to {:?}", from, to))?;

    let metadata =
        std::fs::metadata(from).with_context(|| format!("Failed to stat {:?}", from))?;
    filetime::set_file_times(
        to,
        FileTime::from_last_access_time(&metadata),
        FileTime::from_last_modification_time(&metadata),
    )
    .with_context(|| format!("Failed to set file times on {:?}", to))?;

    Ok(())
}
