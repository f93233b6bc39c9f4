//! Plain text formatter.

use crate::audit::{AuditReport, SectionReport};
use crate::sanitize::types::{Issue, ROOT_GROUP, Severity, max_severity};
use colored::*;

/// Format an audit report as plain text.
///
/// Resources are listed per kind in fqn order; container findings are
/// indented under the container name.
pub fn format(report: &AuditReport) -> String {
    let mut output = String::new();

    for section in &report.sections {
        format_section(&mut output, section);
    }

    let counts = &report.counts;
    if counts.total() == 0 {
        output.push_str(&format!(
            "\n{}\n",
            format!("No issues found in {} resource(s).", report.resource_count()).green()
        ));
    } else {
        output.push_str(&format!(
            "\nFound {} issue(s) in {} resource(s): {} error(s), {} warning(s), {} info.\n",
            counts.total(),
            report.resource_count(),
            counts.error.to_string().red(),
            counts.warning.to_string().yellow(),
            counts.info.to_string().blue()
        ));
    }

    output
}

fn format_section(output: &mut String, section: &SectionReport) {
    output.push_str(&format!(
        "\n{} ({})\n",
        section.kind.to_uppercase().bright_white().bold(),
        section.outcomes.len()
    ));

    if let Some(err) = &section.error {
        output.push_str(&format!("  {} {}\n", "unavailable:".red(), err));
        return;
    }

    for (fqn, outcome) in &section.outcomes {
        let mark = match max_severity(outcome) {
            Some(severity) => severity_label(severity),
            None => "ok".green().to_string(),
        };
        output.push_str(&format!("  {} {}\n", fqn.cyan().bold(), mark));

        for issue in outcome.iter().filter(|i| i.is_root()) {
            output.push_str(&format!("    {}\n", issue_line(issue)));
        }

        let mut group: Option<&str> = None;
        for issue in outcome.iter().filter(|i| i.group != ROOT_GROUP) {
            if group != Some(issue.group.as_str()) {
                output.push_str(&format!("    {}\n", issue.group.bright_white()));
                group = Some(issue.group.as_str());
            }
            output.push_str(&format!("      {}\n", issue_line(issue)));
        }
    }
}

fn issue_line(issue: &Issue) -> String {
    format!(
        "{} [{}] {}",
        severity_label(issue.severity),
        issue.code.to_string().dimmed(),
        issue.message
    )
}

fn severity_label(severity: Severity) -> String {
    match severity {
        Severity::Error => "error".red().bold().to_string(),
        Severity::Warning => "warning".yellow().bold().to_string(),
        Severity::Info => "info".blue().to_string(),
    }
}
