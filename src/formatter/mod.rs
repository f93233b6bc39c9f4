//! Output formatters for audit reports.

pub mod json;
pub mod plain;

use crate::audit::AuditReport;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Colored text grouped by resource.
    #[default]
    Plain,
    /// JSON output.
    Json,
}

/// Format an audit report to a string.
pub fn format_report_to_string(report: &AuditReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Plain => plain::format(report),
        OutputFormat::Json => json::format(report),
    }
}

/// Format and print an audit report.
pub fn format_report(report: &AuditReport, format: OutputFormat) {
    print!("{}", format_report_to_string(report, format));
}
