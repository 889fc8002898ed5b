//! Import workflow - runs every step of an import in order
//!
//! verify -> filter prefs -> replace copy -> unified file -> glue diffs ->
//! revision marker -> duplicate check. Nothing is copied unless every
//! manifested file exists.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::copy::{copy_files, remove_previous_copy, CopySummary};
use crate::duplicates::check_for_duplicates;
use crate::glue_diff::{write_glue_diffs, GlueDiffOutcome};
use crate::manifest::{tree_path, Manifests};
use crate::platform::{host_obj_dir_name, obj_dir_include_path};
use crate::prefs::{copy_prefs, PrefFilter};
use crate::revision::RevisionMarker;
use crate::unified::write_unified_file;
use crate::verify::{verify_files_present, VerificationReport};
use crate::vcs::{self, Vcs};
use crate::Config;

/// Everything an import run did
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub verification: VerificationReport,
    /// (label, lines kept) per preference file
    pub prefs: Vec<(String, usize)>,
    pub copied: CopySummary,
    pub unified: Vec<String>,
    pub glue_diff: Option<GlueDiffOutcome>,
    /// Upstream revision recorded for the next run
    pub revision: Option<String>,
    pub duplicates: Vec<PathBuf>,
    pub duration: Duration,
}

impl ImportOutcome {
    fn verification_failed(verification: VerificationReport, duration: Duration) -> Self {
        Self {
            verification,
            prefs: Vec::new(),
            copied: CopySummary::default(),
            unified: Vec::new(),
            glue_diff: None,
            revision: None,
            duplicates: Vec::new(),
            duration,
        }
    }

    /// Successful when every file was present and nothing collides with glue
    pub fn is_success(&self) -> bool {
        self.verification.is_ok() && self.duplicates.is_empty()
    }
}

/// Imports the manifested part of a Gecko tree into a gecko-media tree
pub struct Importer {
    config: Config,
    manifests: Manifests,
    src_dir: PathBuf,
    dst_dir: PathBuf,
    obj_dir: String,
    vcs: Box<dyn Vcs>,
}

impl Importer {
    /// Load manifests, resolve the object directory and detect the upstream VCS
    pub fn new(config: Config, src_dir: &Path, dst_dir: &Path) -> Result<Self> {
        let manifests = Manifests::load(Path::new(&config.data_dir))
            .context("Failed to load file manifests")?;
        let vcs = vcs::detect(src_dir);
        Self::with_parts(config, manifests, src_dir, dst_dir, vcs)
    }

    /// Build an importer from already loaded parts
    pub fn with_parts(
        config: Config,
        manifests: Manifests,
        src_dir: &Path,
        dst_dir: &Path,
        vcs: Box<dyn Vcs>,
    ) -> Result<Self> {
        let obj_dir = match &config.objdir {
            Some(obj_dir) => obj_dir.clone(),
            None => host_obj_dir_name()?,
        };
        debug!("Using object directory {}", obj_dir);

        Ok(Self {
            config,
            manifests,
            src_dir: src_dir.to_path_buf(),
            dst_dir: dst_dir.to_path_buf(),
            obj_dir,
            vcs,
        })
    }

    pub fn obj_include_dir(&self) -> PathBuf {
        obj_dir_include_path(&self.src_dir, &self.obj_dir)
    }

    /// Run a complete import
    pub async fn run(&self) -> Result<ImportOutcome> {
        let start_time = Instant::now();
        let obj_include_dir = self.obj_include_dir();

        info!(
            "Importing {} into {}",
            self.src_dir.display(),
            self.dst_dir.display()
        );

        let verification = verify_files_present(&self.manifests, &self.src_dir, &obj_include_dir);
        if !verification.is_ok() {
            warn!(
                "{} manifested files are missing, nothing was copied",
                verification.missing.len()
            );
            return Ok(ImportOutcome::verification_failed(
                verification,
                start_time.elapsed(),
            ));
        }

        let prefs = self.copy_prefs()?;

        remove_previous_copy(&self.dst_dir)?;
        let copied = copy_files(&self.manifests, &self.src_dir, &obj_include_dir, &self.dst_dir)?;

        let unified = self.write_unified()?;

        let marker = RevisionMarker::new(&self.config.revision_file);
        let current = self.vcs.current_revision().await;
        let recorded = marker.read()?;
        let glue_diff = write_glue_diffs(
            self.vcs.as_ref(),
            &self.src_dir,
            &self.manifests.glue,
            Path::new(&self.config.diffs_dir),
            recorded.as_deref(),
            current.as_deref(),
        )
        .await
        .context("Failed to diff glue files")?;

        if let Some(revision) = &current {
            marker.write(revision)?;
            info!("Recorded upstream revision {}", revision);
        }

        let duplicates = check_for_duplicates(
            &self.dst_dir,
            &self.config.glue_dir,
            &self.config.duplicates,
        );

        let outcome = ImportOutcome {
            verification,
            prefs,
            copied,
            unified,
            glue_diff: Some(glue_diff),
            revision: current,
            duplicates,
            duration: start_time.elapsed(),
        };

        info!(
            "Import completed in {:.2}s: {} files copied, {} duplicates",
            outcome.duration.as_secs_f64(),
            outcome.copied.total(),
            outcome.duplicates.len()
        );

        Ok(outcome)
    }

    fn copy_prefs(&self) -> Result<Vec<(String, usize)>> {
        let filter = PrefFilter::new(&self.config.prefs.pattern)?;
        let mut written = Vec::new();

        for pref in &self.config.prefs.files {
            let src = tree_path(&self.src_dir, &pref.source);
            let dst = tree_path(&self.dst_dir, &pref.destination);
            let kept = copy_prefs(&src, &dst, &filter)?;
            info!("{} prefs: kept {} lines of {}", pref.label, kept, pref.source);
            written.push((pref.label.clone(), kept));
        }

        Ok(written)
    }

    fn write_unified(&self) -> Result<Vec<String>> {
        let dir = tree_path(&self.dst_dir, &self.config.unified.directory);
        if !dir.is_dir() {
            warn!("No {} after copy, skipping unified file", dir.display());
            return Ok(Vec::new());
        }
        write_unified_file(&dir, &self.config.unified)
    }
}
