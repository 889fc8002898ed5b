//! Pre-copy verification that every manifested file exists.

use std::fmt;
use std::path::Path;
use tracing::{debug, error};

use crate::manifest::{tree_path, Manifests};

/// Which manifest a missing entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Header,
    Source,
    ObjDir,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Header => write!(f, "Header file"),
            FileKind::Source => write!(f, "Source file"),
            FileKind::ObjDir => write!(f, "Object dir file"),
        }
    }
}

/// A manifested path that does not resolve to a regular file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingFile {
    pub kind: FileKind,
    /// Path as written in the manifest
    pub path: String,
}

impl fmt::Display for MissingFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' is not a valid file.", self.kind, self.path)
    }
}

/// Outcome of the verification pass
#[derive(Debug, Clone, Default)]
pub struct VerificationReport {
    pub checked: usize,
    pub missing: Vec<MissingFile>,
}

impl VerificationReport {
    pub fn is_ok(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Check every header, source and object-dir entry. All entries are checked
/// so the report lists every missing file, not just the first.
pub fn verify_files_present(
    manifests: &Manifests,
    src_dir: &Path,
    obj_include_dir: &Path,
) -> VerificationReport {
    let mut report = VerificationReport::default();

    let entries = manifests
        .headers
        .values()
        .map(|src| (FileKind::Header, src_dir, src))
        .chain(manifests.sources.iter().map(|src| (FileKind::Source, src_dir, src)))
        .chain(
            manifests
                .objdir
                .iter()
                .map(|src| (FileKind::ObjDir, obj_include_dir, src)),
        );

    for (kind, root, relative) in entries {
        report.checked += 1;
        let path = tree_path(root, relative);
        if !path.is_file() {
            let missing = MissingFile {
                kind,
                path: relative.clone(),
            };
            error!("{}", missing);
            report.missing.push(missing);
        }
    }

    debug!(
        "Verified {} manifested files, {} missing",
        report.checked,
        report.missing.len()
    );

    report
}
