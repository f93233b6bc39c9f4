//! Handler for the `codes` command.

use crate::sanitize::codes::list_codes;
use crate::sanitize::types::Severity;
use colored::*;

/// Print every issue code with its severity and message template.
pub fn handle_codes() {
    print!("{}", codes_table());
}

fn codes_table() -> String {
    let header = format!("{:<6}{:<10}{}", "CODE", "SEVERITY", "MESSAGE");
    let mut output = format!("{}\n", header.bold());
    for (code, spec) in list_codes() {
        let severity = format!("{:<10}", spec.severity.as_str());
        let severity = match spec.severity {
            Severity::Error => severity.red(),
            Severity::Warning => severity.yellow(),
            Severity::Info => severity.blue(),
        };
        output.push_str(&format!("{:<6}{}{}\n", code.to_string(), severity, spec.message));
    }
    output
}
