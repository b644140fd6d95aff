//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.wallcal.toml` files. Image processing constants are fixed and
//! deliberately absent from the file.

use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".wallcal.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Download settings.
    #[serde(default)]
    pub download: DownloadConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Remote image source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// URL with `{folder}`, `{month}`, `{day}` and `{side}` placeholders.
    #[serde(default = "default_url_template")]
    pub url_template: String,

    /// Upload folders tried in order; later ones are fallbacks.
    #[serde(default = "default_upload_folders")]
    pub upload_folders: Vec<String>,

    /// Pause after each date that hit the network, in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            url_template: default_url_template(),
            upload_folders: default_upload_folders(),
            delay_ms: default_delay_ms(),
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_url_template() -> String {
    "https://www.visualhistory.ru/wp-content/uploads/2015/{folder}/fw87_{month}-{day}{side}-484x700.jpg"
        .to_string()
}

fn default_upload_folders() -> Vec<String> {
    vec!["01".to_string(), "02".to_string()]
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("wallcal-images/{}", env!("CARGO_PKG_VERSION"))
}

impl DownloadConfig {
    /// Check the template and folder list are usable.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        for placeholder in ["{month}", "{day}", "{side}"] {
            if !self.url_template.contains(placeholder) {
                return Err(ConfigError::MissingPlaceholder(placeholder));
            }
        }
        if self.upload_folders.is_empty() {
            return Err(ConfigError::NoUploadFolders);
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Cli) {
        if args.verbose {
            self.general.verbose = true;
        }

        if let crate::cli::Command::Download {
            delay_ms, timeout, ..
        } = &args.command
        {
            if let Some(delay) = delay_ms {
                self.download.delay_ms = *delay;
            }
            if let Some(timeout) = timeout {
                self.download.timeout_seconds = *timeout;
            }
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Command, ReportFormat};
    use std::path::PathBuf;

    fn download_cli(delay_ms: Option<u64>, timeout: Option<u64>) -> Cli {
        Cli {
            config: None,
            verbose: false,
            quiet: false,
            report: None,
            format: ReportFormat::Markdown,
            command: Command::Download {
                target: PathBuf::from("images"),
                force: false,
                delay_ms,
                timeout,
            },
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.download.upload_folders, vec!["01", "02"]);
        assert_eq!(config.download.delay_ms, 1000);
        assert!(config.download.url_template.contains("fw87_"));
        assert!(config.download.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
verbose = true

[download]
url_template = "http://localhost:8080/{folder}/{month}-{day}{side}.jpg"
upload_folders = ["03"]
delay_ms = 0
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert!(config.general.verbose);
        assert_eq!(config.download.upload_folders, vec!["03"]);
        assert_eq!(config.download.delay_ms, 0);
        assert_eq!(config.download.timeout_seconds, 30);
    }

    #[test]
    fn test_validate_rejects_bad_template() {
        let config = DownloadConfig {
            url_template: "http://example.com/{month}.jpg".to_string(),
            ..DownloadConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::MissingPlaceholder("{day}"))
        );
    }

    #[test]
    fn test_validate_rejects_empty_folders() {
        let config = DownloadConfig {
            upload_folders: vec![],
            ..DownloadConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoUploadFolders));
    }

    #[test]
    fn test_merge_with_args() {
        let mut config = Config::default();
        config.merge_with_args(&download_cli(None, None));
        assert_eq!(config.download.delay_ms, 1000);
        assert_eq!(config.download.timeout_seconds, 30);

        config.merge_with_args(&download_cli(Some(0), Some(5)));
        assert_eq!(config.download.delay_ms, 0);
        assert_eq!(config.download.timeout_seconds, 5);
    }

    #[test]
    fn test_config_verbose_drives_log_level() {
        let mut config: Config = toml::from_str("[general]\nverbose = true\n").unwrap();
        let mut cli = download_cli(None, None);
        config.merge_with_args(&cli);
        assert_eq!(cli.log_level(config.general.verbose), tracing::Level::DEBUG);

        cli.quiet = true;
        assert_eq!(cli.log_level(config.general.verbose), tracing::Level::ERROR);

        let mut quiet_default = Config::default();
        quiet_default.merge_with_args(&download_cli(None, None));
        assert_eq!(
            download_cli(None, None).log_level(quiet_default.general.verbose),
            tracing::Level::INFO
        );
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "[download]\ndelay_ms = 250\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.download.delay_ms, 250);

        std::fs::write(&path, "[download\n").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[download]"));
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.download.upload_folders, vec!["01", "02"]);
    }
}
