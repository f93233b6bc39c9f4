//! Label selector matching.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, LabelSelectorRequirement};
use std::collections::BTreeMap;

/// Whether `labels` satisfy `selector`.
///
/// An empty selector selects nothing, so a controller without a selector
/// never aggregates a whole namespace. Unknown operators never match.
pub fn matches(selector: &LabelSelector, labels: Option<&BTreeMap<String, String>>) -> bool {
    let match_labels = selector.match_labels.as_ref().filter(|m| !m.is_empty());
    let expressions = selector.match_expressions.as_ref().filter(|e| !e.is_empty());
    if match_labels.is_none() && expressions.is_none() {
        return false;
    }

    let empty = BTreeMap::new();
    let labels = labels.unwrap_or(&empty);

    let labels_ok = match_labels
        .into_iter()
        .flatten()
        .all(|(k, v)| labels.get(k) == Some(v));

    labels_ok
        && expressions
            .into_iter()
            .flatten()
            .all(|req| requirement_matches(req, labels))
}

fn requirement_matches(req: &LabelSelectorRequirement, labels: &BTreeMap<String, String>) -> bool {
    let value = labels.get(&req.key);
    let in_values = |v: &String| req.values.iter().flatten().any(|candidate| candidate == v);

    match req.operator.as_str() {
        "In" => value.is_some_and(in_values),
        "NotIn" => !value.is_some_and(in_values),
        "Exists" => value.is_some(),
        "DoesNotExist" => value.is_none(),
        other => {
            log::debug!("Unsupported selector operator {:?} on {}", other, req.key);
            false
        }
    }
}
