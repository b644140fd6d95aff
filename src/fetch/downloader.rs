//! HTTP downloader for calendar pages.
//!
//! Each page is looked up in the configured upload folders in order; the
//! first `200 OK` wins. Pages already on disk are skipped unless forced.

use crate::config::DownloadConfig;
use crate::error::FetchError;
use crate::models::{CalendarDate, RunSummary, Side, Stage};
use crate::progress::progress_bar;
use anyhow::{Context, Result};
use reqwest::StatusCode;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Result of fetching one page side.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Written to disk from `url`.
    Saved { url: String, bytes: usize },
    /// Already present and not forced.
    Skipped,
    /// No candidate URL produced the page.
    Failed { url: String, reason: String },
}

impl FetchOutcome {
    /// Whether producing this outcome touched the network.
    pub fn hit_network(&self) -> bool {
        !matches!(self, FetchOutcome::Skipped)
    }
}

/// Sequential page downloader.
pub struct Downloader {
    config: DownloadConfig,
    http_client: reqwest::Client,
    target_dir: PathBuf,
    force: bool,
}

impl Downloader {
    /// Create a downloader writing into `target_dir`.
    pub fn new(config: DownloadConfig, target_dir: PathBuf, force: bool) -> Result<Self> {
        config.validate()?;

        info!(
            "Initializing downloader into {} (force: {})",
            target_dir.display(),
            force
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            http_client,
            target_dir,
            force,
        })
    }

    /// Local path for a page side.
    pub fn target_path(&self, date: CalendarDate, side: Side) -> PathBuf {
        self.target_dir.join(date.source_file_name(side))
    }

    /// Candidate URLs for a page side, primary first.
    pub fn candidate_urls(&self, date: CalendarDate, side: Side) -> Vec<String> {
        self.config
            .upload_folders
            .iter()
            .map(|folder| render_url(&self.config.url_template, folder, date, side))
            .collect()
    }

    /// Fetch one page side unless it is already on disk.
    pub async fn get_image(&self, date: CalendarDate, side: Side) -> FetchOutcome {
        let filename = self.target_path(date, side);

        if !self.force && filename.is_file() {
            info!("{} already downloaded, skipping", filename.display());
            return FetchOutcome::Skipped;
        }

        let urls = self.candidate_urls(date, side);
        let mut last_error = None;

        for url in &urls {
            match self.fetch(url).await {
                Ok(body) => {
                    if let Err(e) = write_atomically(&filename, &body).await {
                        warn!("Failed to write {}: {}", filename.display(), e);
                        return FetchOutcome::Failed {
                            url: url.clone(),
                            reason: format!("failed to write {}: {}", filename.display(), e),
                        };
                    }
                    info!("Saved {}", filename.display());
                    return FetchOutcome::Saved {
                        url: url.clone(),
                        bytes: body.len(),
                    };
                }
                Err(e) => {
                    debug!("{}", e);
                    last_error = Some(e);
                }
            }
        }

        let first_url = urls.first().cloned().unwrap_or_default();
        let reason = last_error
            .map(|e| match e {
                FetchError::Status { status, .. } => status.to_string(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| "no candidate URLs".to_string());

        warn!("{} errored with {}", first_url, reason);
        FetchOutcome::Failed {
            url: first_url,
            reason,
        }
    }

    /// GET a single URL, accepting only `200 OK`.
    async fn fetch(&self, url: &str) -> std::result::Result<Vec<u8>, FetchError> {
        let transport = |source: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self.http_client.get(url).send().await.map_err(transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.bytes().await.map_err(transport)?;
        Ok(body.to_vec())
    }

    /// Download both sides of every date, pausing between dates.
    pub async fn run(&self, dates: &[CalendarDate], show_progress: bool) -> Result<RunSummary> {
        std::fs::create_dir_all(&self.target_dir).with_context(|| {
            format!(
                "Failed to create target directory: {}",
                self.target_dir.display()
            )
        })?;

        let mut summary = RunSummary::new(Stage::Download);
        let progress = progress_bar(dates.len() as u64, show_progress)?;
        let delay = Duration::from_millis(self.config.delay_ms);

        for date in dates {
            if let Some(ref pb) = progress {
                pb.set_message(date.to_string());
            }

            let mut hit_network = false;
            for side in Side::ALL {
                let outcome = self.get_image(*date, side).await;
                hit_network |= outcome.hit_network();

                match outcome {
                    FetchOutcome::Saved { .. } => summary.saved += 1,
                    FetchOutcome::Skipped => summary.skipped += 1,
                    FetchOutcome::Failed { url, reason } => {
                        summary.record_failure(
                            date.source_file_name(side),
                            format!("{} errored with {}", url, reason),
                        );
                    }
                }
            }

            if hit_network && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            if let Some(ref pb) = progress {
                pb.inc(1);
            }
        }

        if let Some(pb) = progress {
            pb.finish_with_message("Download complete");
        }

        summary.finish();
        info!(
            "Download finished: {} saved, {} skipped, {} failed",
            summary.saved,
            summary.skipped,
            summary.failed()
        );

        Ok(summary)
    }
}

/// Write `body` next to `path` as `<name>.part`, then rename it into place.
///
/// A partially written page never carries the final name, so it is not
/// mistaken for a completed download on the next run.
async fn write_atomically(path: &Path, body: &[u8]) -> std::io::Result<()> {
    let mut part_name = path.as_os_str().to_owned();
    part_name.push(".part");
    let part = PathBuf::from(part_name);

    let result = match tokio::fs::write(&part, body).await {
        Ok(()) => tokio::fs::rename(&part, path).await,
        Err(e) => Err(e),
    };
    if result.is_err() {
        let _ = tokio::fs::remove_file(&part).await;
    }
    result
}

/// Substitute the placeholders of a URL template.
pub fn render_url(template: &str, folder: &str, date: CalendarDate, side: Side) -> String {
    template
        .replace("{folder}", folder)
        .replace("{month}", &format!("{:02}", date.month))
        .replace("{day}", &format!("{:02}", date.day))
        .replace("{side}", side.tag())
}
