//! Per-date extraction driver.

use crate::error::ExtractError;
use crate::extract::ops::{extract_side_a, extract_side_b};
use crate::models::{CalendarDate, RunSummary, Side, Stage};
use crate::progress::progress_bar;
use anyhow::{Context, Result};
use image::{GrayImage, ImageError, ImageReader, RgbImage};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Result of processing one page side.
#[derive(Debug, Clone, PartialEq)]
pub enum SideOutcome {
    /// Layers written, in output order.
    Written(Vec<PathBuf>),
    /// No source image for this side.
    Missing,
}

/// Reads pages from `source` and writes layers to `target`.
pub struct Processor {
    source: PathBuf,
    target: PathBuf,
}

impl Processor {
    pub fn new(source: PathBuf, target: PathBuf) -> Self {
        Self { source, target }
    }

    /// Process both sides of a date, recording the results in `summary`.
    pub fn process(&self, date: CalendarDate, summary: &mut RunSummary) {
        for side in Side::ALL {
            let result = match side {
                Side::A => self.process_a_side(date),
                Side::B => self.process_b_side(date),
            };

            match result {
                Ok(SideOutcome::Written(paths)) => summary.saved += paths.len(),
                Ok(SideOutcome::Missing) => summary.missing += 1,
                Err(e) => {
                    warn!("{}", e);
                    summary.record_failure(date.source_file_name(side), e.to_string());
                }
            }
        }
    }

    /// Write the red and black layers of the front page.
    pub fn process_a_side(&self, date: CalendarDate) -> Result<SideOutcome, ExtractError> {
        let input = self.source.join(date.source_file_name(Side::A));
        if !input.is_file() {
            debug!("{} not found, skipping", input.display());
            return Ok(SideOutcome::Missing);
        }

        let layers = extract_side_a(&read_page(&input)?)?;
        let outputs = self.output_paths(date, Side::A);

        write_layer(&layers.red, &outputs[0])?;
        write_layer(&layers.black, &outputs[1])?;
        Ok(SideOutcome::Written(outputs))
    }

    /// Write the black layer of the back page.
    pub fn process_b_side(&self, date: CalendarDate) -> Result<SideOutcome, ExtractError> {
        let input = self.source.join(date.source_file_name(Side::B));
        if !input.is_file() {
            debug!("{} not found, skipping", input.display());
            return Ok(SideOutcome::Missing);
        }

        let layer = extract_side_b(&read_page(&input)?)?;
        let outputs = self.output_paths(date, Side::B);

        write_layer(&layer, &outputs[0])?;
        Ok(SideOutcome::Written(outputs))
    }

    fn output_paths(&self, date: CalendarDate, side: Side) -> Vec<PathBuf> {
        date.output_file_names(side)
            .into_iter()
            .map(|name| self.target.join(name))
            .collect()
    }

    /// Process every date in `dates`.
    pub fn run(&self, dates: &[CalendarDate], show_progress: bool) -> Result<RunSummary> {
        std::fs::create_dir_all(&self.target).with_context(|| {
            format!("Failed to create target directory: {}", self.target.display())
        })?;

        info!(
            "Extracting layers from {} into {}",
            self.source.display(),
            self.target.display()
        );

        let mut summary = RunSummary::new(Stage::Extract);
        let progress = progress_bar(dates.len() as u64, show_progress)?;

        for date in dates {
            if let Some(ref pb) = progress {
                pb.set_message(date.to_string());
            }

            self.process(*date, &mut summary);

            if let Some(ref pb) = progress {
                pb.inc(1);
            }
        }

        if let Some(pb) = progress {
            pb.finish_with_message("Extraction complete");
        }

        summary.finish();
        info!(
            "Extraction finished: {} layers written, {} pages missing, {} failed",
            summary.saved,
            summary.missing,
            summary.failed()
        );

        Ok(summary)
    }
}

/// Decode a page, picking the decoder from the file contents rather than its extension.
fn read_page(path: &Path) -> Result<RgbImage, ExtractError> {
    let img = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(ImageError::IoError)
        .and_then(|reader| reader.decode())
        .map_err(|source| ExtractError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(img.to_rgb8())
}

fn write_layer(layer: &GrayImage, path: &Path) -> Result<(), ExtractError> {
    layer.save(path).map_err(|source| ExtractError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Wrote {}", path.display());
    Ok(())
}
