//! Progress bar helpers shared by the pipeline stages.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

/// Create a progress bar over `len` items, or `None` when hidden.
pub fn progress_bar(len: u64, show: bool) -> Result<Option<ProgressBar>> {
    if !show {
        return Ok(None);
    }

    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("#>-"),
    );
    Ok(Some(pb))
}
