//! Download and extraction progress inspection.
//!
//! Reports which calendar pages are present on disk without touching
//! the network or writing anything.

use crate::models::{CalendarDate, Side};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Disk state of one page side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageStatus {
    pub date: CalendarDate,
    pub side: Side,
    pub downloaded: bool,
    /// `None` when no extraction directory was given
    pub extracted: Option<bool>,
}

/// Totals over a status scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusSummary {
    pub total: usize,
    pub downloaded: usize,
    pub extracted: usize,
}

/// Inspect `source` (and optionally `target`) for every date/side.
pub fn collect_status(
    source: &Path,
    target: Option<&Path>,
    dates: &[CalendarDate],
) -> Vec<PageStatus> {
    dates
        .iter()
        .flat_map(|date| Side::ALL.into_iter().map(move |side| (*date, side)))
        .map(|(date, side)| PageStatus {
            date,
            side,
            downloaded: source.join(date.source_file_name(side)).is_file(),
            extracted: target.map(|dir| {
                date.output_file_names(side)
                    .iter()
                    .all(|name| dir.join(name).is_file())
            }),
        })
        .collect()
}

pub fn summarize(pages: &[PageStatus]) -> StatusSummary {
    StatusSummary {
        total: pages.len(),
        downloaded: pages.iter().filter(|p| p.downloaded).count(),
        extracted: pages.iter().filter(|p| p.extracted == Some(true)).count(),
    }
}

/// A status scan, as written by `status --report`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub generated_at: DateTime<Utc>,
    pub source: PathBuf,
    pub target: Option<PathBuf>,
    pub summary: StatusSummary,
    pub pages: Vec<PageStatus>,
}

impl StatusReport {
    /// Scan `source` (and optionally `target`) for every date/side.
    pub fn collect(source: &Path, target: Option<&Path>, dates: &[CalendarDate]) -> Self {
        let pages = collect_status(source, target, dates);
        Self {
            generated_at: Utc::now(),
            source: source.to_path_buf(),
            target: target.map(Path::to_path_buf),
            summary: summarize(&pages),
            pages,
        }
    }

    /// Source file names not downloaded yet.
    pub fn not_downloaded(&self) -> Vec<String> {
        self.pages
            .iter()
            .filter(|p| !p.downloaded)
            .map(|p| p.date.source_file_name(p.side))
            .collect()
    }
}
