//! Filename collisions between the imported tree and the glue layer.
//!
//! Glue files replace upstream files of the same name. When an import brings
//! in a file whose base name is already provided by the glue tree, the build
//! would pick up both.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::DuplicateCheck;

/// Files under `root`, recursively and sorted by name, whose extension
/// (with leading dot, e.g. `.h`) is in `extensions`
pub fn gather_files(root: &Path, extensions: &[String]) -> Vec<PathBuf> {
    if !root.is_dir() {
        return Vec::new();
    }

    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| has_extension(path, extensions))
        .collect()
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .is_some_and(|ext| extensions.iter().any(|wanted| *wanted == ext))
}

/// Glue files whose base name also appears under `dst_dir/sub_dir`.
/// One entry is reported per colliding imported file.
pub fn find_glue_duplicates(
    dst_dir: &Path,
    glue_dir: &str,
    sub_dir: &str,
    extensions: &[String],
) -> Vec<PathBuf> {
    let glue_files: HashMap<OsString, PathBuf> =
        gather_files(&dst_dir.join(glue_dir), extensions)
            .into_iter()
            .filter_map(|path| path.file_name().map(|name| (name.to_os_string(), path.clone())))
            .collect();

    let imported = gather_files(&dst_dir.join(sub_dir), extensions);
    debug!(
        "Comparing {} files under {} with {} glue files",
        imported.len(),
        sub_dir,
        glue_files.len()
    );

    imported
        .iter()
        .filter_map(|path| path.file_name())
        .filter_map(|name| glue_files.get(name).cloned())
        .collect()
}

/// Run every configured check and collect all duplicates
pub fn check_for_duplicates(
    dst_dir: &Path,
    glue_dir: &str,
    checks: &[DuplicateCheck],
) -> Vec<PathBuf> {
    checks
        .iter()
        .flat_map(|check| find_glue_duplicates(dst_dir, glue_dir, &check.sub_dir, &check.extensions))
        .collect()
}
