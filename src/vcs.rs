//! Upstream version control access.
//!
//! The Gecko tree is either a Mercurial checkout or a git clone made with
//! git-cinnabar, which can map between git commits and Mercurial changesets.
//! Revisions are always reported as Mercurial ids so the recorded marker is
//! the same whichever checkout was used.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command as AsyncCommand;
use tracing::{debug, warn};

/// Id git-cinnabar reports for a commit it has no Mercurial mapping for
const NULL_REVISION: &str = "0000000000000000000000000000000000000000";

/// Captured output of a diff command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Operations needed from the upstream repository
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Vcs: Send + Sync {
    /// Mercurial id of the checked out revision, `None` when unavailable
    async fn current_revision(&self) -> Option<String>;

    /// Translate a recorded Mercurial id into something `diff_file` accepts
    async fn resolve_base(&self, revision: &str) -> Result<String>;

    /// Diff one file between `base` and `new`
    async fn diff_file(&self, base: &str, new: &str, path: &Path) -> Result<DiffOutput>;

    /// Name for display/logging
    fn name(&self) -> &'static str;
}

/// Whether `src_dir` is a Mercurial checkout
pub fn is_mercurial_repo(src_dir: &Path) -> bool {
    src_dir.join(".hg").is_dir()
}

/// Pick the backend matching the checkout in `src_dir`
pub fn detect(src_dir: &Path) -> Box<dyn Vcs> {
    if is_mercurial_repo(src_dir) {
        Box::new(Mercurial::new(src_dir))
    } else {
        Box::new(Cinnabar::new(src_dir))
    }
}

/// Mercurial checkout
pub struct Mercurial {
    src_dir: PathBuf,
}

impl Mercurial {
    pub fn new(src_dir: &Path) -> Self {
        Self {
            src_dir: src_dir.to_path_buf(),
        }
    }
}

#[async_trait]
impl Vcs for Mercurial {
    async fn current_revision(&self) -> Option<String> {
        let output = match AsyncCommand::new("hg")
            .args(["id", "-i"])
            .arg(&self.src_dir)
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                warn!("Failed to run hg: {}", e);
                return None;
            }
        };

        if !output.status.success() {
            debug!("hg id failed: {}", String::from_utf8_lossy(&output.stderr).trim());
            return None;
        }

        non_empty(&output.stdout)
    }

    async fn resolve_base(&self, revision: &str) -> Result<String> {
        Ok(revision.to_string())
    }

    async fn diff_file(&self, base: &str, new: &str, path: &Path) -> Result<DiffOutput> {
        let output = AsyncCommand::new("hg")
            .args(["diff", "-r", base, "-r", new])
            .arg(path)
            .output()
            .await
            .context("Failed to execute hg diff")?;

        Ok(diff_output(output))
    }

    fn name(&self) -> &'static str {
        "mercurial"
    }
}

/// git clone with git-cinnabar metadata
pub struct Cinnabar {
    src_dir: PathBuf,
}

impl Cinnabar {
    pub fn new(src_dir: &Path) -> Self {
        Self {
            src_dir: src_dir.to_path_buf(),
        }
    }

    async fn cinnabar(&self, args: &[&str]) -> Result<Output> {
        AsyncCommand::new("git")
            .arg("cinnabar")
            .args(args)
            .current_dir(&self.src_dir)
            .output()
            .await
            .context("Failed to execute git cinnabar")
    }
}

#[async_trait]
impl Vcs for Cinnabar {
    async fn current_revision(&self) -> Option<String> {
        let output = match self.cinnabar(&["git2hg", "HEAD"]).await {
            Ok(output) => output,
            Err(e) => {
                warn!("{:#}", e);
                return None;
            }
        };

        git2hg_revision(&output)
    }

    async fn resolve_base(&self, revision: &str) -> Result<String> {
        let output = self.cinnabar(&["hg2git", revision]).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("git cinnabar hg2git {} failed: {}", revision, stderr.trim()));
        }

        non_empty(&output.stdout)
            .ok_or_else(|| anyhow!("git cinnabar hg2git {} returned nothing", revision))
    }

    async fn diff_file(&self, base: &str, _new: &str, path: &Path) -> Result<DiffOutput> {
        let output = AsyncCommand::new("git")
            .args(["diff", base, "--"])
            .arg(path)
            .current_dir(&self.src_dir)
            .output()
            .await
            .context("Failed to execute git diff")?;

        Ok(diff_output(output))
    }

    fn name(&self) -> &'static str {
        "git-cinnabar"
    }
}

/// Mercurial id from `git cinnabar git2hg` output. A failed command and the
/// null id both mean the commit has no Mercurial counterpart.
fn git2hg_revision(output: &Output) -> Option<String> {
    if !output.status.success() {
        debug!(
            "git cinnabar git2hg failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return None;
    }

    non_empty(&output.stdout).filter(|revision| revision != NULL_REVISION)
}

fn non_empty(stdout: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn diff_output(output: Output) -> DiffOutput {
    DiffOutput {
        stdout: output.stdout,
        stderr: output.stderr,
    }
}
