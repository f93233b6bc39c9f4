//! Annotation-based issue suppression.
//!
//! A pod template (or pod) may carry a comma-separated list of issue codes
//! that its container checks should not report.
//!
//! # Example
//!
//! ```yaml
//! template:
//!   metadata:
//!     annotations:
//!       workload-audit.io/skip-codes: "101, 106"
//! ```

use crate::sanitize::types::IssueCode;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::{BTreeMap, HashSet};

/// Annotation listing the codes to skip.
pub const SKIP_CODES_ANNOTATION: &str = "workload-audit.io/skip-codes";

/// Set of issue codes suppressed for one object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipCodes(HashSet<IssueCode>);

impl SkipCodes {
    /// An empty set; suppresses nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Resolve the skip set from an object's metadata.
    ///
    /// Tokens that do not parse as an integer code are dropped.
    pub fn from_meta(meta: Option<&ObjectMeta>) -> Self {
        Self::from_annotations(meta.and_then(|m| m.annotations.as_ref()))
    }

    /// Resolve the skip set from an annotation map.
    pub fn from_annotations(annotations: Option<&BTreeMap<String, String>>) -> Self {
        annotations
            .and_then(|a| a.get(SKIP_CODES_ANNOTATION))
            .map(|value| Self::parse(value))
            .unwrap_or_default()
    }

    /// Parse a raw annotation value.
    pub fn parse(value: &str) -> Self {
        Self(
            value
                .split(',')
                .filter_map(|token| token.trim().parse::<u16>().ok())
                .map(IssueCode)
                .collect(),
        )
    }

    /// Whether a code is suppressed.
    pub fn contains(&self, code: IssueCode) -> bool {
        self.0.contains(&code)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
