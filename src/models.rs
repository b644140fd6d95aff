//! Data models for the calendar image pipeline.
//!
//! This module contains the date grid, page sides, file naming rules
//! and the per-run accounting shared by the pipeline stages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Months whose last day is not the 31st (1987 is not a leap year).
const DAY_LIMITS: [(u8, u8); 5] = [(2, 28), (4, 30), (6, 30), (9, 30), (11, 30)];

/// Side of a tear-off calendar page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Front page: date printed in red and black ink
    A,
    /// Back page: black text only
    B,
}

impl Side {
    /// Both sides, in fetch order.
    pub const ALL: [Side; 2] = [Side::A, Side::B];

    /// Tag used in URLs and file names.
    pub fn tag(&self) -> &'static str {
        match self {
            Side::A => "a",
            Side::B => "b",
        }
    }

    /// Tags of the layers extracted from this side.
    pub fn output_tags(&self) -> &'static [&'static str] {
        match self {
            Side::A => &["a-red", "a-black"],
            Side::B => &["b"],
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// A single day of the calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CalendarDate {
    pub month: u8,
    pub day: u8,
}

impl CalendarDate {
    pub fn new(month: u8, day: u8) -> Self {
        Self { month, day }
    }

    /// Whether this date exists in the calendar year.
    pub fn is_valid(&self) -> bool {
        (1..=12).contains(&self.month) && self.day >= 1 && self.day <= days_in_month(self.month)
    }

    /// Source image name, e.g. `03-08-a.jpg`.
    pub fn source_file_name(&self, side: Side) -> String {
        file_name(*self, side.tag(), "jpg")
    }

    /// Extracted layer names, e.g. `03-08-a-red.png`, `03-08-a-black.png`.
    pub fn output_file_names(&self, side: Side) -> Vec<String> {
        side.output_tags()
            .iter()
            .map(|tag| file_name(*self, tag, "png"))
            .collect()
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

/// Number of days in a month of the calendar year.
pub fn days_in_month(month: u8) -> u8 {
    DAY_LIMITS
        .iter()
        .find(|(m, _)| *m == month)
        .map(|(_, limit)| *limit)
        .unwrap_or(31)
}

/// Every date that exists in the calendar year, in order.
pub fn download_dates() -> Vec<CalendarDate> {
    extract_dates()
        .into_iter()
        .filter(CalendarDate::is_valid)
        .collect()
}

/// The full 12x31 grid. Dates without an input file are skipped downstream.
pub fn extract_dates() -> Vec<CalendarDate> {
    (1..=12u8)
        .flat_map(|month| (1..=31u8).map(move |day| CalendarDate::new(month, day)))
        .collect()
}

/// Build a file name of the form `MM-DD-<tag>.<ext>`.
pub fn file_name(date: CalendarDate, tag: &str, ext: &str) -> String {
    format!("{:02}-{:02}-{}.{}", date.month, date.day, tag, ext)
}

/// Pipeline stage a summary belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Download,
    Extract,
    Pack,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Download => write!(f, "Download"),
            Stage::Extract => write!(f, "Extract"),
            Stage::Pack => write!(f, "Pack"),
        }
    }
}

/// An item that could not be processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedItem {
    /// File the item would have produced or consumed
    pub file: String,
    /// Human readable reason
    pub reason: String,
}

/// Accounting for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub stage: Stage,
    pub started_at: DateTime<Utc>,
    pub duration_seconds: f64,
    /// Files written
    pub saved: usize,
    /// Already present, left untouched
    pub skipped: usize,
    /// Inputs that do not exist (extract only)
    pub missing: usize,
    pub failures: Vec<FailedItem>,
}

impl RunSummary {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            started_at: Utc::now(),
            duration_seconds: 0.0,
            saved: 0,
            skipped: 0,
            missing: 0,
            failures: Vec::new(),
        }
    }

    pub fn record_failure(&mut self, file: impl Into<String>, reason: impl Into<String>) {
        self.failures.push(FailedItem {
            file: file.into(),
            reason: reason.into(),
        });
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Stamp the elapsed wall time since `started_at`.
    pub fn finish(&mut self) {
        let elapsed = Utc::now().signed_duration_since(self.started_at);
        self.duration_seconds = elapsed.num_milliseconds().max(0) as f64 / 1000.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(1), 31);
        assert_eq!(days_in_month(2), 28);
        assert_eq!(days_in_month(4), 30);
        assert_eq!(days_in_month(11), 30);
        assert_eq!(days_in_month(12), 31);
    }

    #[test]
    fn test_download_dates_cover_year() {
        let dates = download_dates();
        assert_eq!(dates.len(), 365);
        assert_eq!(dates.first(), Some(&CalendarDate::new(1, 1)));
        assert_eq!(dates.last(), Some(&CalendarDate::new(12, 31)));
        assert!(!dates.contains(&CalendarDate::new(2, 29)));
        assert!(!dates.contains(&CalendarDate::new(4, 31)));
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_extract_dates_full_grid() {
        let dates = extract_dates();
        assert_eq!(dates.len(), 12 * 31);
        assert!(dates.contains(&CalendarDate::new(2, 31)));
    }

    #[test]
    fn test_date_validity() {
        assert!(CalendarDate::new(2, 28).is_valid());
        assert!(!CalendarDate::new(2, 29).is_valid());
        assert!(!CalendarDate::new(13, 1).is_valid());
        assert!(!CalendarDate::new(5, 0).is_valid());
    }

    #[test]
    fn test_file_names() {
        let date = CalendarDate::new(3, 8);
        assert_eq!(date.source_file_name(Side::A), "03-08-a.jpg");
        assert_eq!(date.source_file_name(Side::B), "03-08-b.jpg");
        assert_eq!(file_name(date, "a-red", "png"), "03-08-a-red.png");
        assert_eq!(
            date.output_file_names(Side::A),
            vec!["03-08-a-red.png", "03-08-a-black.png"]
        );
        assert_eq!(date.output_file_names(Side::B), vec!["03-08-b.png"]);
        assert_eq!(date.to_string(), "03-08");
    }

    #[test]
    fn test_run_summary_failures() {
        let mut summary = RunSummary::new(Stage::Extract);
        assert!(!summary.has_failures());
        summary.record_failure("01-01-a.jpg", "decode error");
        assert_eq!(summary.failed(), 1);
        assert!(summary.has_failures());
        summary.finish();
        assert!(summary.duration_seconds >= 0.0);
    }
}
