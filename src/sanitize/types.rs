//! Core types for the sanitizer.
//!
//! - `Severity` - Issue severity levels
//! - `IssueCode` - Stable numeric issue identifiers (e.g. `101`)
//! - `Issue` - A single rendered finding
//! - `Outcome` - The ordered findings recorded for one resource

use serde::{Deserialize, Serialize};
use std::fmt;

/// Group used for findings attributed to the resource itself rather than
/// one of its containers.
pub const ROOT_GROUP: &str = "__root__";

/// How urgent an issue is.
///
/// Variants are declared least urgent first so the derived ordering puts
/// `Error` on top.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    #[default]
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stable numeric issue identifier.
///
/// Codes are grouped by concern: `1xx` container checks, `4xx` API
/// deprecation, `5xx` controller-level checks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct IssueCode(pub u16);

impl IssueCode {
    /// Get the raw numeric value.
    pub fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for IssueCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

/// A single finding recorded by the collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// The sub-resource the issue is attributed to, or [`ROOT_GROUP`].
    pub group: String,
    /// The issue code.
    pub code: IssueCode,
    /// The rendered message.
    pub message: String,
    /// The issue severity.
    pub severity: Severity,
}

impl Issue {
    /// Create a new issue.
    pub fn new(
        group: impl Into<String>,
        code: IssueCode,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            code,
            message: message.into(),
            severity,
        }
    }

    /// Whether the issue is attributed to the resource itself.
    pub fn is_root(&self) -> bool {
        self.group == ROOT_GROUP
    }
}

/// Issues recorded for one resource, in the order the checks ran.
pub type Outcome = Vec<Issue>;

/// Highest severity found in an outcome.
pub fn max_severity(outcome: &[Issue]) -> Option<Severity> {
    outcome.iter().map(|i| i.severity).max()
}

/// Per-severity issue counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

impl SeverityCounts {
    /// Count one issue of the given severity.
    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Error => self.error += 1,
            Severity::Warning => self.warning += 1,
            Severity::Info => self.info += 1,
        }
    }

    /// Add another set of counts to this one.
    pub fn merge(&mut self, other: &SeverityCounts) {
        self.error += other.error;
        self.warning += other.warning;
        self.info += other.info;
    }

    /// Total number of issues.
    pub fn total(&self) -> usize {
        self.error + self.warning + self.info
    }

    /// Highest severity with a non-zero count.
    pub fn max_severity(&self) -> Option<Severity> {
        if self.error > 0 {
            Some(Severity::Error)
        } else if self.warning > 0 {
            Some(Severity::Warning)
        } else if self.info > 0 {
            Some(Severity::Info)
        } else {
            None
        }
    }
}
