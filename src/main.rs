use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gecko_import::glue_diff::GlueDiffOutcome;
use gecko_import::{Config, ImportOutcome, Importer};

#[derive(Parser)]
#[command(name = "gecko-import")]
#[command(about = "Import a manifested subset of the Gecko tree into gecko-media")]
#[command(version)]
struct Cli {
    /// Root of the Gecko checkout
    src_dir: PathBuf,

    /// Root of the gecko-media tree
    dst_dir: PathBuf,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;
    info!("Starting gecko-import v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(cli.config)?;
    let src_dir = absolute(&cli.src_dir)?;
    let dst_dir = absolute(&cli.dst_dir)?;

    let importer = Importer::new(config, &src_dir, &dst_dir)?;
    let outcome = importer.run().await?;

    print_report(&outcome);

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}

/// Load configuration from specified path or default location
fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load(&path),
        None => Config::load_or_default(),
    }
}

/// Absolute, lexically normalized form of a command line path
fn absolute(path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .context("Failed to get current directory")?
            .join(path)
    };
    Ok(path_clean::clean(joined))
}

/// Print the outcome of an import to stdout
fn print_report(outcome: &ImportOutcome) {
    if !outcome.verification.is_ok() {
        for missing in &outcome.verification.missing {
            println!("ERROR: {}", missing);
        }
        println!(
            "❌ {} of {} manifested files are missing, nothing was imported",
            outcome.verification.missing.len(),
            outcome.verification.checked
        );
        return;
    }

    println!("📥 Imported {} files", outcome.copied.total());
    println!("   Headers: {}", outcome.copied.headers);
    println!("   Sources: {}", outcome.copied.sources);
    println!("   Object dir headers: {}", outcome.copied.objdir);
    for (label, kept) in &outcome.prefs {
        println!("   {} prefs: {} lines", label, kept);
    }
    println!("   Unified includes: {}", outcome.unified.len());

    match &outcome.glue_diff {
        Some(GlueDiffOutcome::NoCurrentRevision) => println!(
            "⚠️  Cannot show diff of glue files. Use a mercurial or git-cinnabar repo as source dir"
        ),
        Some(GlueDiffOutcome::NoRecordedRevision) => {
            println!("⚠️  No previous revision recorded, glue diffs skipped")
        }
        Some(GlueDiffOutcome::BaseUnavailable) => {
            println!("⚠️  Recorded revision not found upstream, glue diffs skipped")
        }
        Some(GlueDiffOutcome::UpToDate) | None => {}
        Some(GlueDiffOutcome::Diffed {
            revision,
            written,
            failed,
        }) => {
            println!("📝 Glue diffs for {}: {} saved", revision, written.len());
            for patch in written {
                println!("   {}", patch.display());
            }
            for src_file in failed {
                println!("   ❌ Could not diff {}", src_file);
            }
        }
    }

    if let Some(revision) = &outcome.revision {
        println!("   Upstream revision: {}", revision);
    }

    if !outcome.duplicates.is_empty() {
        for duplicate in &outcome.duplicates {
            println!("Duplicate file found: {}", duplicate.display());
        }
        let paths: Vec<String> = outcome
            .duplicates
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        println!("To remove them: rm {}", paths.join(" "));
    }
}
