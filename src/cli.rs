//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// wallcal-images - calendar page fetcher and layer extractor
///
/// Downloads the 1987 tear-off calendar pages and turns them into
/// red/black layers sized for a three-color e-paper panel.
///
/// Examples:
///   wallcal-images download ./downloads
///   wallcal-images download ./downloads --force
///   wallcal-images extract ./downloads ./layers
///   wallcal-images status ./downloads ./layers
///   wallcal-images pack ./layers
///   wallcal-images init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file
    ///
    /// If not specified, looks for .wallcal.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Write a run report to this file
    #[arg(long, value_name = "FILE", global = true)]
    pub report: Option<PathBuf>,

    /// Report format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT", global = true)]
    pub format: ReportFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Download calendar pages into a directory
    Download {
        /// Where to store downloaded images
        target: PathBuf,

        /// Force download of already downloaded files
        #[arg(short, long)]
        force: bool,

        /// Pause between dates in milliseconds
        #[arg(long, value_name = "MS", env = "WALLCAL_DELAY_MS")]
        delay_ms: Option<u64>,

        /// Request timeout in seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },

    /// Extract red/black layers from downloaded pages
    Extract {
        /// Where downloaded images are stored
        source: PathBuf,

        /// Where to store extracted images
        target: PathBuf,
    },

    /// Show which pages are downloaded and extracted
    Status {
        /// Where downloaded images are stored
        source: PathBuf,

        /// Where extracted images are stored
        target: Option<PathBuf>,
    },

    /// Convert extracted PNG layers into firmware .bin images
    Pack {
        /// Directory of 8-bit grayscale PNG layers; .bin files are written beside them
        source: PathBuf,
    },

    /// Generate a default .wallcal.toml configuration file
    InitConfig,
}

/// Output format for the run report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        match &self.command {
            Command::Download { timeout, .. } => {
                if *timeout == Some(0) {
                    return Err("Timeout must be at least 1 second".to_string());
                }
            }
            Command::Extract { source, .. }
            | Command::Status { source, .. }
            | Command::Pack { source } => {
                if !source.exists() {
                    return Err(format!(
                        "Source directory does not exist: {}",
                        source.display()
                    ));
                }
                if !source.is_dir() {
                    return Err(format!(
                        "Source path is not a directory: {}",
                        source.display()
                    ));
                }
            }
            Command::InitConfig => {}
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is the `[general] verbose` setting; `--quiet` wins over both.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_cli(command: Command) -> Cli {
        Cli {
            config: None,
            verbose: false,
            quiet: false,
            report: None,
            format: ReportFormat::Markdown,
            command,
        }
    }

    #[test]
    fn test_parse_download() {
        let cli = Cli::try_parse_from(["wallcal-images", "download", "out", "-f"]).unwrap();
        match cli.command {
            Command::Download { target, force, .. } => {
                assert_eq!(target, PathBuf::from("out"));
                assert!(force);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "wallcal-images",
            "extract",
            "in",
            "out",
            "--report",
            "run.json",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.report, Some(PathBuf::from("run.json")));
        assert_eq!(cli.format, ReportFormat::Json);
    }

    #[test]
    fn test_parse_pack() {
        let cli = Cli::try_parse_from(["wallcal-images", "pack", "layers", "-q"]).unwrap();
        assert!(cli.quiet);
        match cli.command {
            Command::Pack { source } => assert_eq!(source, PathBuf::from("layers")),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut cli = make_cli(Command::InitConfig);
        cli.verbose = true;
        cli.quiet = true;
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_validation_zero_timeout() {
        let cli = make_cli(Command::Download {
            target: PathBuf::from("out"),
            force: false,
            delay_ms: None,
            timeout: Some(0),
        });
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_validation_source_directory() {
        let temp_dir = TempDir::new().unwrap();
        let ok = make_cli(Command::Extract {
            source: temp_dir.path().to_path_buf(),
            target: temp_dir.path().join("out"),
        });
        assert!(ok.validate().is_ok());

        let missing = make_cli(Command::Status {
            source: temp_dir.path().join("nope"),
            target: None,
        });
        assert!(missing.validate().is_err());

        let file = temp_dir.path().join("file.jpg");
        std::fs::write(&file, b"").unwrap();
        let not_dir = make_cli(Command::Extract {
            source: file.clone(),
            target: temp_dir.path().join("out"),
        });
        assert!(not_dir.validate().is_err());

        assert!(make_cli(Command::Pack { source: file }).validate().is_err());
        let pack = make_cli(Command::Pack {
            source: temp_dir.path().to_path_buf(),
        });
        assert!(pack.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut cli = make_cli(Command::InitConfig);
        assert_eq!(cli.log_level(false), tracing::Level::INFO);

        cli.verbose = true;
        assert_eq!(cli.log_level(false), tracing::Level::DEBUG);

        cli.verbose = false;
        cli.quiet = true;
        assert_eq!(cli.log_level(false), tracing::Level::ERROR);
    }

    #[test]
    fn test_log_level_from_config() {
        let mut cli = make_cli(Command::InitConfig);
        assert_eq!(cli.log_level(true), tracing::Level::DEBUG);

        cli.quiet = true;
        assert_eq!(cli.log_level(true), tracing::Level::ERROR);
    }
}
