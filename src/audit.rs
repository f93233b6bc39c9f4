//! One audit run over a cluster.
//!
//! Each resource kind gets its own [`Collector`], so a daemon set and a pod
//! sharing a `namespace/name` never write to the same outcome.

use crate::sanitize::listers::{ControllerLister, PodLister, PodsMetricsLister, ThresholdProvider};
use crate::sanitize::types::{Outcome, Severity, SeverityCounts};
use crate::sanitize::{Collector, DaemonSetSanitizer, DeploymentSanitizer, PodSanitizer};
use k8s_openapi::Resource;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment};
use k8s_openapi::api::core::v1::Pod;
use serde::Serialize;
use std::collections::BTreeMap;

/// Findings for one resource kind.
#[derive(Debug, Clone, Serialize)]
pub struct SectionReport {
    pub kind: String,
    /// Outcomes sorted by fqn
    pub outcomes: BTreeMap<String, Outcome>,
    pub counts: SeverityCounts,
    /// Set when the kind could not be listed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SectionReport {
    fn from_collector(kind: &str, collector: Collector, error: Option<String>) -> Self {
        let counts = collector.severity_counts();
        Self {
            kind: kind.to_string(),
            outcomes: collector.into_outcomes(),
            counts,
            error,
        }
    }

    /// Highest severity recorded for one resource.
    pub fn max_severity(&self, fqn: &str) -> Option<Severity> {
        self.outcomes
            .get(fqn)
            .and_then(|o| crate::sanitize::types::max_severity(o))
    }
}

/// Findings for a whole run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditReport {
    pub sections: Vec<SectionReport>,
    pub counts: SeverityCounts,
}

impl AuditReport {
    fn push(&mut self, section: SectionReport) {
        self.counts.merge(&section.counts);
        self.sections.push(section);
    }

    /// Highest severity across the run.
    pub fn max_severity(&self) -> Option<Severity> {
        self.counts.max_severity()
    }

    /// Number of audited resources.
    pub fn resource_count(&self) -> usize {
        self.sections.iter().map(|s| s.outcomes.len()).sum()
    }

    pub fn section(&self, kind: &str) -> Option<&SectionReport> {
        self.sections.iter().find(|s| s.kind == kind)
    }
}

/// Sanitize daemon sets, deployments and pods.
///
/// A kind that cannot be listed is reported with its error; the other kinds
/// still run.
pub fn run<L>(lister: &L) -> AuditReport
where
    L: ControllerLister<DaemonSet>
        + ControllerLister<Deployment>
        + PodLister
        + PodsMetricsLister
        + ThresholdProvider
        + Sync,
{
    let mut report = AuditReport::default();

    let collector = Collector::new();
    let error = DaemonSetSanitizer::new(&collector, lister).sanitize().err();
    report.push(section(DaemonSet::KIND, collector, error));

    let collector = Collector::new();
    let error = DeploymentSanitizer::new(&collector, lister).sanitize().err();
    report.push(section(Deployment::KIND, collector, error));

    let collector = Collector::new();
    let error = PodSanitizer::new(&collector, lister).sanitize().err();
    report.push(section(Pod::KIND, collector, error));

    log::info!(
        "Audited {} resource(s): {} error(s), {} warning(s), {} info",
        report.resource_count(),
        report.counts.error,
        report.counts.warning,
        report.counts.info
    );
    report
}

fn section(kind: &str, collector: Collector, error: Option<crate::error::AuditError>) -> SectionReport {
    if let Some(e) = &error {
        log::error!("Unable to sanitize {}: {}", kind, e);
    }
    SectionReport::from_collector(kind, collector, error.map(|e| e.to_string()))
}
