//! Issue collection for one audit run.
//!
//! The collector maps a fully-qualified resource name (fqn) to the ordered
//! issues recorded while sanitizing that resource. Distinct fqns may be
//! written concurrently; a single fqn must only be written by the one pass
//! sanitizing that resource.

use crate::sanitize::codes;
use crate::sanitize::pragma::SkipCodes;
use crate::sanitize::types::{
    Issue, IssueCode, Outcome, ROOT_GROUP, Severity, SeverityCounts, max_severity,
};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::fmt;

/// Collects issues keyed by resource fqn.
#[derive(Debug, Default)]
pub struct Collector {
    outcomes: DashMap<String, Outcome>,
}

impl Collector {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the outcome for a resource. Calling it again resets it.
    pub fn init_outcome(&self, fqn: &str) {
        self.outcomes.insert(fqn.to_string(), Outcome::new());
    }

    /// Record an issue against the resource itself.
    pub fn add_code(&self, code: IssueCode, fqn: &str, args: &[&dyn fmt::Display]) {
        self.add_issue(fqn, ROOT_GROUP, code, args);
    }

    /// Record an issue against a sub-resource (e.g. a container) of `fqn`.
    pub fn add_sub_code(
        &self,
        code: IssueCode,
        fqn: &str,
        group: &str,
        args: &[&dyn fmt::Display],
    ) {
        self.add_issue(fqn, group, code, args);
    }

    /// Same as [`Collector::add_sub_code`] unless `code` is in `skip`, in
    /// which case nothing is recorded.
    pub fn add_sub_code_with_skip_check(
        &self,
        skip: &SkipCodes,
        code: IssueCode,
        fqn: &str,
        group: &str,
        args: &[&dyn fmt::Display],
    ) {
        if skip.contains(code) {
            log::trace!("{}: skipping code {} for {}", fqn, code, group);
            return;
        }
        self.add_issue(fqn, group, code, args);
    }

    fn add_issue(&self, fqn: &str, group: &str, code: IssueCode, args: &[&dyn fmt::Display]) {
        let issue = match codes::lookup(code) {
            Some(spec) => Issue::new(group, code, spec.severity, spec.render(args)),
            None => {
                debug_assert!(false, "unregistered issue code {}", code);
                Issue::new(group, code, Severity::Warning, format!("Unknown issue code {}", code))
            }
        };

        self.outcomes
            .entry(fqn.to_string())
            .or_default()
            .push(issue);
    }

    /// Issues recorded for a resource.
    pub fn outcome(&self, fqn: &str) -> Option<Outcome> {
        self.outcomes.get(fqn).map(|o| o.value().clone())
    }

    /// Highest severity recorded for a resource.
    pub fn max_severity(&self, fqn: &str) -> Option<Severity> {
        self.outcomes.get(fqn).and_then(|o| max_severity(o.value()))
    }

    /// Issue counts per severity across all resources.
    pub fn severity_counts(&self) -> SeverityCounts {
        let mut counts = SeverityCounts::default();
        for entry in self.outcomes.iter() {
            for issue in entry.value() {
                counts.record(issue.severity);
            }
        }
        counts
    }

    /// Number of resources with an outcome.
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Snapshot of all outcomes, sorted by fqn.
    pub fn outcomes(&self) -> BTreeMap<String, Outcome> {
        self.outcomes
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    /// Consume the collector, returning all outcomes sorted by fqn.
    pub fn into_outcomes(self) -> BTreeMap<String, Outcome> {
        self.outcomes.into_iter().collect()
    }
}
