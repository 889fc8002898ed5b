//! Diffs of the upstream files the glue layer was derived from.
//!
//! Between two imports, upstream changes to a glue file's origin usually
//! need porting by hand. For every glue entry, the upstream diff between the
//! recorded and the current revision is saved under
//! `<diffs_dir>/<current revision>/`.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::manifest::tree_path;
use crate::vcs::Vcs;

/// What the diff pass did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlueDiffOutcome {
    /// Current upstream revision could not be determined
    NoCurrentRevision,
    /// No revision was recorded by a previous import
    NoRecordedRevision,
    /// Recorded and current revision are the same
    UpToDate,
    /// The recorded revision is unknown to the upstream checkout
    BaseUnavailable,
    /// Diffs were saved
    Diffed {
        revision: String,
        written: Vec<PathBuf>,
        failed: Vec<String>,
    },
}

/// File name a diff of `src_file` is saved as
pub fn diff_file_name(src_file: &str) -> String {
    format!("{}.diff", src_file.replace(['/', '\\'], "_"))
}

/// Save the glue diffs between `old_revision` and `new_revision`
pub async fn write_glue_diffs(
    vcs: &dyn Vcs,
    src_dir: &Path,
    glue_files: &BTreeMap<String, String>,
    diffs_dir: &Path,
    old_revision: Option<&str>,
    new_revision: Option<&str>,
) -> Result<GlueDiffOutcome> {
    let Some(new_revision) = new_revision else {
        warn!("Cannot show diff of glue files. Use a mercurial or git-cinnabar repo as source dir");
        return Ok(GlueDiffOutcome::NoCurrentRevision);
    };

    let Some(old_revision) = old_revision else {
        warn!("No recorded revision, skipping diff of glue files");
        return Ok(GlueDiffOutcome::NoRecordedRevision);
    };

    if old_revision == new_revision {
        return Ok(GlueDiffOutcome::UpToDate);
    }

    info!(
        "Getting diffs from glue files ({} -> {}, {})",
        old_revision,
        new_revision,
        vcs.name()
    );

    let base = match vcs.resolve_base(old_revision).await {
        Ok(base) => base,
        Err(e) => {
            warn!("Cannot show diff of glue files: {:#}", e);
            return Ok(GlueDiffOutcome::BaseUnavailable);
        }
    };

    let out_dir = diffs_dir.join(new_revision);
    match std::fs::remove_dir_all(&out_dir) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e).with_context(|| format!("Failed to clear {:?}", out_dir)),
    }
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create diffs directory: {:?}", out_dir))?;

    let mut written = Vec::new();
    let mut failed = Vec::new();

    for src_file in glue_files.values() {
        let file_path = tree_path(src_dir, src_file);
        let diff = match vcs.diff_file(&base, new_revision, &file_path).await {
            Ok(diff) => diff,
            Err(e) => {
                warn!("Diff of {} failed: {:#}", src_file, e);
                failed.push(src_file.clone());
                continue;
            }
        };

        if !diff.stderr.is_empty() {
            warn!(
                "Diff of {} failed: {}",
                src_file,
                String::from_utf8_lossy(&diff.stderr).trim()
            );
            failed.push(src_file.clone());
            continue;
        }

        if !diff.stdout.is_empty() {
            let patch = out_dir.join(diff_file_name(src_file));
            info!("Saving diff for {} to {}", src_file, patch.display());
            std::fs::write(&patch, &diff.stdout)
                .with_context(|| format!("Failed to write diff: {:?}", patch))?;
            written.push(patch);
        }
    }

    Ok(GlueDiffOutcome::Diffed {
        revision: new_revision.to_string(),
        written,
        failed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcs::{DiffOutput, MockVcs};
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    fn glue_files() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("nsThread.cpp".to_string(), "xpcom/threads/nsThread.cpp".to_string()),
            ("Preferences.cpp".to_string(), "modules/libpref/Preferences.cpp".to_string()),
            ("Logging.cpp".to_string(), "xpcom/base/Logging.cpp".to_string()),
        ])
    }

    #[test]
    fn test_diff_file_name() {
        assert_eq!(
            diff_file_name("xpcom/threads/nsThread.cpp"),
            "xpcom_threads_nsThread.cpp.diff"
        );
    }

    #[tokio::test]
    async fn test_no_current_revision_skips() {
        let temp_dir = TempDir::new().unwrap();
        let vcs = MockVcs::new();

        let outcome = write_glue_diffs(
            &vcs,
            Path::new("/gecko"),
            &glue_files(),
            temp_dir.path(),
            Some("abc"),
            None,
        )
        .await
        .unwrap();

        assert_eq!(outcome, GlueDiffOutcome::NoCurrentRevision);
        assert!(std::fs::read_dir(temp_dir.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn test_same_revision_skips() {
        let temp_dir = TempDir::new().unwrap();
        let vcs = MockVcs::new();

        let outcome = write_glue_diffs(
            &vcs,
            Path::new("/gecko"),
            &glue_files(),
            temp_dir.path(),
            Some("abc"),
            Some("abc"),
        )
        .await
        .unwrap();

        assert_eq!(outcome, GlueDiffOutcome::UpToDate);
    }

    #[tokio::test]
    async fn test_no_recorded_revision_skips() {
        let temp_dir = TempDir::new().unwrap();
        let vcs = MockVcs::new();

        let outcome = write_glue_diffs(
            &vcs,
            Path::new("/gecko"),
            &glue_files(),
            temp_dir.path(),
            None,
            Some("def"),
        )
        .await
        .unwrap();

        assert_eq!(outcome, GlueDiffOutcome::NoRecordedRevision);
    }

    #[tokio::test]
    async fn test_unresolvable_base_skips() {
        let temp_dir = TempDir::new().unwrap();
        let mut vcs = MockVcs::new();
        vcs.expect_name().return_const("mock");
        vcs.expect_resolve_base()
            .returning(|_| Err(anyhow::anyhow!("unknown changeset")));
        vcs.expect_diff_file().never();

        let outcome = write_glue_diffs(
            &vcs,
            Path::new("/gecko"),
            &glue_files(),
            temp_dir.path(),
            Some("abc"),
            Some("def"),
        )
        .await
        .unwrap();

        assert_eq!(outcome, GlueDiffOutcome::BaseUnavailable);
        assert!(!temp_dir.path().join("def").exists());
    }

    #[tokio::test]
    async fn test_diff_command_error_marks_file_failed() {
        let temp_dir = TempDir::new().unwrap();
        let mut vcs = MockVcs::new();
        vcs.expect_name().return_const("mock");
        vcs.expect_resolve_base()
            .returning(|revision| Ok(revision.to_string()));
        vcs.expect_diff_file().times(3).returning(|_, _, path| {
            if path.ends_with("xpcom/threads/nsThread.cpp") {
                Err(anyhow::anyhow!("Failed to execute git diff"))
            } else {
                Ok(DiffOutput {
                    stdout: b"+x\n".to_vec(),
                    stderr: Vec::new(),
                })
            }
        });

        let outcome = write_glue_diffs(
            &vcs,
            Path::new("/gecko"),
            &glue_files(),
            temp_dir.path(),
            Some("abc"),
            Some("def"),
        )
        .await
        .unwrap();

        assert_matches!(outcome, GlueDiffOutcome::Diffed { ref written, ref failed, .. } => {
            assert_eq!(written.len(), 2);
            assert_eq!(failed, &vec!["xpcom/threads/nsThread.cpp".to_string()]);
        });
    }

    #[tokio::test]
    async fn test_writes_non_empty_diffs() {
        let temp_dir = TempDir::new().unwrap();
        let diffs_dir = temp_dir.path().join("glue_diffs");
        let stale = diffs_dir.join("def").join("stale.diff");
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, "old").unwrap();

        let mut vcs = MockVcs::new();
        vcs.expect_name().return_const("mock");
        vcs.expect_resolve_base()
            .withf(|revision| revision == "abc")
            .times(1)
            .returning(|_| Ok("git-abc".to_string()));
        vcs.expect_diff_file().times(3).returning(|base, new, path| {
            assert_eq!(base, "git-abc");
            assert_eq!(new, "def");
            let path = path.to_string_lossy();
            Ok(if path.ends_with("nsThread.cpp") {
                DiffOutput {
                    stdout: b"--- a\n+++ b\n".to_vec(),
                    stderr: Vec::new(),
                }
            } else if path.ends_with("Logging.cpp") {
                DiffOutput {
                    stdout: Vec::new(),
                    stderr: b"abort: unknown revision".to_vec(),
                }
            } else {
                DiffOutput::default()
            })
        });

        let outcome = write_glue_diffs(
            &vcs,
            Path::new("/gecko"),
            &glue_files(),
            &diffs_dir,
            Some("abc"),
            Some("def"),
        )
        .await
        .unwrap();

        let expected = diffs_dir.join("def").join("xpcom_threads_nsThread.cpp.diff");
        assert_matches!(outcome, GlueDiffOutcome::Diffed { ref revision, ref written, ref failed } => {
            assert_eq!(revision, "def");
            assert_eq!(written, &vec![expected.clone()]);
            assert_eq!(failed, &vec!["xpcom/base/Logging.cpp".to_string()]);
        });
        assert_eq!(std::fs::read_to_string(&expected).unwrap(), "--- a\n+++ b\n");
        assert!(!stale.exists());
    }
}
