//! wallcal-images - calendar page fetcher and layer extractor
//!
//! Downloads the pages of a 1987 tear-off calendar, extracts red and
//! black layers sized for the WallCalendar e-paper display and packs them
//! into the firmware's image format.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (configuration, I/O, etc.)
//!   2 - Run completed but some pages failed

mod cli;
mod config;
mod error;
mod extract;
mod fetch;
mod models;
mod pack;
mod progress;
mod report;
mod status;

use anyhow::{Context, Result};
use cli::{Cli, Command};
use config::{Config, DEFAULT_CONFIG_FILE};
use models::RunSummary;
use status::StatusReport;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Where the configuration came from; logged once tracing is set up.
enum ConfigSource {
    Explicit(PathBuf),
    DefaultFile,
    Builtin,
    Invalid(anyhow::Error),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Cli::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if let Command::InitConfig = args.command {
        return handle_init_config();
    }

    // The config decides the log level, so it is read before logging starts
    let (mut config, source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(args.log_level(config.general.verbose));

    info!("wallcal-images v{}", env!("CARGO_PKG_VERSION"));
    log_config_source(source);
    debug!("Arguments: {:?}", args);

    match run(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle init-config: generate a default .wallcal.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to change the image source, fallback folders and request pacing.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Dispatch the selected stage. Returns exit code (0 or 2).
async fn run(args: Cli, config: Config) -> Result<i32> {
    let quiet = args.quiet;
    let show_progress = !quiet;

    let summary = match &args.command {
        Command::Download { target, force, .. } => {
            if !quiet {
                println!("📥 Downloading calendar pages into {}", target.display());
                println!("   Source: {}", config.download.url_template);
                println!("   Folders: {}", config.download.upload_folders.join(", "));
                if *force {
                    println!("   Re-downloading pages already on disk");
                }
            }

            let downloader =
                fetch::Downloader::new(config.download.clone(), target.clone(), *force)?;
            downloader
                .run(&models::download_dates(), show_progress)
                .await?
        }
        Command::Extract { source, target } => {
            if !quiet {
                println!(
                    "🖼️  Extracting layers from {} into {}",
                    source.display(),
                    target.display()
                );
            }

            let processor = extract::Processor::new(source.clone(), target.clone());
            processor.run(&models::extract_dates(), show_progress)?
        }
        Command::Pack { source } => {
            if !quiet {
                println!("📦 Packing PNG layers in {}", source.display());
            }

            pack::Packer::new(source.clone()).run(show_progress)?
        }
        Command::Status { source, target } => {
            return handle_status(source, target.as_deref(), &args);
        }
        Command::InitConfig => return Ok(0),
    };

    if !quiet {
        print_summary(&summary);
    }

    if let Some(ref path) = args.report {
        report::write_report(&summary, path, args.format)?;
        info!("Report saved to: {}", path.display());
        if !quiet {
            println!("   Report saved to: {}", path.display());
        }
    }

    if summary.has_failures() {
        eprintln!(
            "\n⛔ {} item(s) failed. Exiting with code 2.",
            summary.failed()
        );
        return Ok(2);
    }

    Ok(0)
}

/// Handle status: print what is on disk, touch nothing but the report.
fn handle_status(source: &Path, target: Option<&Path>, args: &Cli) -> Result<i32> {
    let scan = StatusReport::collect(source, target, &models::download_dates());
    let totals = &scan.summary;
    info!(
        "Status of {}: {}/{} downloaded, {} extracted",
        source.display(),
        totals.downloaded,
        totals.total,
        totals.extracted
    );

    if !args.quiet {
        println!("\n🔍 Calendar pages in {}\n", source.display());
        println!("   Downloaded: {}/{}", totals.downloaded, totals.total);
        if target.is_some() {
            println!("   Extracted:  {}/{}", totals.extracted, totals.total);
        }

        let missing = scan.not_downloaded();
        if !missing.is_empty() {
            println!("\n   Not downloaded ({}):", missing.len());
            for name in &missing {
                println!("     📄 {}", name);
            }
        }
    }

    if let Some(ref path) = args.report {
        report::write_status_report(&scan, path, args.format)?;
        info!("Report saved to: {}", path.display());
        if !args.quiet {
            println!("\n   Report saved to: {}", path.display());
        }
    }

    Ok(0)
}

fn print_summary(summary: &RunSummary) {
    println!("\n📊 {} Summary:", summary.stage);
    println!("   Saved: {}", summary.saved);
    if summary.skipped > 0 {
        println!("   Skipped (already present): {}", summary.skipped);
    }
    if summary.missing > 0 {
        println!("   Missing inputs: {}", summary.missing);
    }
    println!("   Failed: {}", summary.failed());
    for failure in &summary.failures {
        println!("     ✗ {}: {}", failure.file, failure.reason);
    }
    println!("   Duration: {:.1}s", summary.duration_seconds);
}

/// Load configuration from file or use defaults.
fn load_config(args: &Cli) -> Result<(Config, ConfigSource)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigSource::Explicit(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigSource::DefaultFile)),
        Ok(None) => Ok((Config::default(), ConfigSource::Builtin)),
        Err(e) => Ok((Config::default(), ConfigSource::Invalid(e))),
    }
}

fn log_config_source(source: ConfigSource) {
    match source {
        ConfigSource::Explicit(path) => info!("Loaded config from: {}", path.display()),
        ConfigSource::DefaultFile => info!("Loaded default config from {}", DEFAULT_CONFIG_FILE),
        ConfigSource::Builtin => debug!("No config file found, using defaults"),
        ConfigSource::Invalid(e) => warn!("Failed to load config: {:#}", e),
    }
}
