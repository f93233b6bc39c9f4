//! JSON formatter.

use crate::audit::AuditReport;
use crate::sanitize::types::{Issue, SeverityCounts};
use serde::Serialize;
use std::collections::BTreeMap;

/// Format an audit report as JSON.
pub fn format(report: &AuditReport) -> String {
    let output = JsonOutput::from(report);
    let mut json = serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string());
    json.push('\n');
    json
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    sections: Vec<JsonSection<'a>>,
    summary: JsonSummary,
}

#[derive(Serialize)]
struct JsonSection<'a> {
    kind: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    outcomes: BTreeMap<&'a str, &'a [Issue]>,
    counts: SeverityCounts,
}

#[derive(Serialize)]
struct JsonSummary {
    resources: usize,
    total_issues: usize,
    max_severity: Option<String>,
    counts: SeverityCounts,
}

impl<'a> From<&'a AuditReport> for JsonOutput<'a> {
    fn from(report: &'a AuditReport) -> Self {
        Self {
            sections: report
                .sections
                .iter()
                .map(|s| JsonSection {
                    kind: &s.kind,
                    error: s.error.as_deref(),
                    outcomes: s
                        .outcomes
                        .iter()
                        .map(|(fqn, o)| (fqn.as_str(), o.as_slice()))
                        .collect(),
                    counts: s.counts,
                })
                .collect(),
            summary: JsonSummary {
                resources: report.resource_count(),
                total_issues: report.counts.total(),
                max_severity: report.max_severity().map(|s| s.to_string()),
                counts: report.counts,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::SectionReport;
    use crate::sanitize::codes;
    use crate::sanitize::collector::Collector;

    #[test]
    fn test_json_shape() {
        let c = Collector::new();
        c.init_outcome("default/fred");
        c.add_sub_code(codes::UNTAGGED_IMAGE, "default/fred", "fred", &[]);
        let counts = c.severity_counts();
        let report = AuditReport {
            sections: vec![SectionReport {
                kind: "DaemonSet".to_string(),
                outcomes: c.into_outcomes(),
                counts,
                error: None,
            }],
            counts,
        };

        let value: serde_json::Value = serde_json::from_str(&format(&report)).unwrap();
        let section = &value["sections"][0];
        assert_eq!(section["kind"], "DaemonSet");
        assert!(section.get("error").is_none());

        let issue = &section["outcomes"]["default/fred"][0];
        assert_eq!(issue["code"], 100);
        assert_eq!(issue["group"], "fred");
        assert_eq!(issue["severity"], "error");
        assert_eq!(issue["message"], "Untagged docker image in use");

        assert_eq!(value["summary"]["resources"], 1);
        assert_eq!(value["summary"]["total_issues"], 1);
        assert_eq!(value["summary"]["max_severity"], "error");
        assert_eq!(value["summary"]["counts"]["error"], 1);
    }
}
