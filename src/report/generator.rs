//! Markdown and JSON run reports.
//!
//! This module generates reports from the summary of a pipeline run, and
//! from a `status` scan.

use crate::cli::ReportFormat;
use crate::models::{FailedItem, RunSummary, Stage};
use crate::status::StatusReport;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(summary: &RunSummary) -> String {
    let mut output = String::new();

    output.push_str(&format!("# WallCalendar {} Report\n\n", summary.stage));
    output.push_str(&generate_metadata_section(summary));
    output.push_str(&generate_counts_section(summary));
    output.push_str(&generate_failures_section(&summary.failures));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(summary: &RunSummary) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Stage:** {}\n", summary.stage));
    section.push_str(&format!(
        "- **Started:** {}\n",
        summary.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        summary.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the counts table.
fn generate_counts_section(summary: &RunSummary) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str("| Outcome | Count |\n");
    section.push_str("|---------|-------|\n");

    let saved_label = match summary.stage {
        Stage::Download => "Downloaded",
        Stage::Extract => "Layers written",
        Stage::Pack => "Images packed",
    };
    section.push_str(&format!("| {} | {} |\n", saved_label, summary.saved));

    match summary.stage {
        Stage::Download => {
            section.push_str(&format!("| Already present | {} |\n", summary.skipped));
        }
        Stage::Extract => {
            section.push_str(&format!("| Missing pages | {} |\n", summary.missing));
        }
        Stage::Pack => {}
    }
    section.push_str(&format!("| Failed | {} |\n", summary.failed()));
    section.push('\n');

    section
}

/// Generate the failure list.
fn generate_failures_section(failures: &[FailedItem]) -> String {
    let mut section = String::new();

    section.push_str("## Failures\n\n");
    if failures.is_empty() {
        section.push_str("No failures.\n\n");
        return section;
    }

    for failure in failures {
        section.push_str(&format!("- `{}`: {}\n", failure.file, failure.reason));
    }
    section.push('\n');

    section
}

fn generate_footer() -> String {
    "---\n\n*Report generated by wallcal-images*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(summary: &RunSummary) -> Result<String> {
    serde_json::to_string_pretty(summary).map_err(Into::into)
}

/// Generate a Markdown status report.
pub fn generate_status_markdown(report: &StatusReport) -> String {
    let mut output = String::new();

    output.push_str("# WallCalendar Status Report\n\n");
    output.push_str("## Metadata\n\n");
    output.push_str(&format!(
        "- **Generated:** {}\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str(&format!("- **Source:** `{}`\n", report.source.display()));
    if let Some(ref target) = report.target {
        output.push_str(&format!("- **Target:** `{}`\n", target.display()));
    }
    output.push('\n');

    output.push_str("## Summary\n\n");
    output.push_str("| Pages | Count |\n");
    output.push_str("|-------|-------|\n");
    output.push_str(&format!("| Total | {} |\n", report.summary.total));
    output.push_str(&format!("| Downloaded | {} |\n", report.summary.downloaded));
    if report.target.is_some() {
        output.push_str(&format!("| Extracted | {} |\n", report.summary.extracted));
    }
    output.push('\n');

    output.push_str("## Not Downloaded\n\n");
    let missing = report.not_downloaded();
    if missing.is_empty() {
        output.push_str("All pages downloaded.\n\n");
    } else {
        for name in &missing {
            output.push_str(&format!("- `{}`\n", name));
        }
        output.push('\n');
    }

    output.push_str(&generate_footer());
    output
}

/// Write the run report to a file in the requested format.
pub fn write_report(summary: &RunSummary, path: &Path, format: ReportFormat) -> Result<()> {
    let content = match format {
        ReportFormat::Markdown => generate_markdown_report(summary),
        ReportFormat::Json => generate_json_report(summary)?,
    };
    write_content(&content, path)
}

/// Write the status report to a file in the requested format.
pub fn write_status_report(report: &StatusReport, path: &Path, format: ReportFormat) -> Result<()> {
    let content = match format {
        ReportFormat::Markdown => generate_status_markdown(report),
        ReportFormat::Json => serde_json::to_string_pretty(report)?,
    };
    write_content(&content, path)
}

fn write_content(content: &str, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create report file: {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CalendarDate;
    use tempfile::TempDir;

    fn create_test_summary() -> RunSummary {
        let mut summary = RunSummary::new(Stage::Download);
        summary.saved = 700;
        summary.skipped = 26;
        summary.duration_seconds = 812.4;
        summary.record_failure("02-14-b.jpg", "https://example.com/02-14b.jpg errored with 404");
        summary
    }

    #[test]
    fn test_generate_markdown_report() {
        let summary = create_test_summary();
        let markdown = generate_markdown_report(&summary);

        assert!(markdown.contains("# WallCalendar Download Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("| Downloaded | 700 |"));
        assert!(markdown.contains("| Already present | 26 |"));
        assert!(markdown.contains("| Failed | 1 |"));
        assert!(markdown.contains("`02-14-b.jpg`"));
        assert!(markdown.contains("812.4s"));
    }

    #[test]
    fn test_extract_counts_section() {
        let mut summary = RunSummary::new(Stage::Extract);
        summary.saved = 3;
        summary.missing = 5;

        let section = generate_counts_section(&summary);
        assert!(section.contains("| Layers written | 3 |"));
        assert!(section.contains("| Missing pages | 5 |"));
        assert!(!section.contains("Already present"));
    }

    #[test]
    fn test_empty_failures_section() {
        let section = generate_failures_section(&[]);
        assert!(section.contains("No failures."));
    }

    #[test]
    fn test_generate_json_report() {
        let summary = create_test_summary();
        let json = generate_json_report(&summary).unwrap();

        assert!(json.contains("\"stage\": \"download\""));
        assert!(json.contains("\"failures\""));
        assert!(json.contains("\"saved\": 700"));
    }

    #[test]
    fn test_write_report() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("run.json");
        write_report(&create_test_summary(), &path, ReportFormat::Json).unwrap();

        let parsed: RunSummary =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.saved, 700);
        assert_eq!(parsed.failures.len(), 1);
    }

    #[test]
    fn test_pack_counts_section() {
        let mut summary = RunSummary::new(Stage::Pack);
        summary.saved = 12;

        let section = generate_counts_section(&summary);
        assert!(section.contains("| Images packed | 12 |"));
        assert!(!section.contains("Missing pages"));
    }

    #[test]
    fn test_status_reports() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("downloads");
        std::fs::create_dir(&source).unwrap();
        std::fs::write(source.join("01-01-a.jpg"), b"").unwrap();
        let report = StatusReport::collect(&source, None, &[CalendarDate::new(1, 1)]);

        let markdown = generate_status_markdown(&report);
        assert!(markdown.contains("# WallCalendar Status Report"));
        assert!(markdown.contains("| Downloaded | 1 |"));
        assert!(markdown.contains("- `01-01-b.jpg`"));
        assert!(!markdown.contains("| Extracted |"));

        let path = temp_dir.path().join("status.json");
        write_status_report(&report, &path, ReportFormat::Json).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["summary"]["total"], 2);
        assert_eq!(json["pages"][1]["side"], "b");
        assert_eq!(json["pages"][1]["downloaded"], false);
    }
}
