//! API version resolution for the deprecation check.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::Deserialize;
use thiserror::Error;

/// Annotation kubectl writes on apply, holding the manifest as JSON.
pub const LAST_APPLIED_ANNOTATION: &str = "kubectl.kubernetes.io/last-applied-configuration";

#[derive(Debug, Error)]
pub enum RevisionError {
    #[error("no last applied configuration annotation")]
    MissingAnnotation,

    #[error("unable to parse last applied configuration: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("last applied configuration has no apiVersion")]
    MissingApiVersion,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LastApplied {
    api_version: Option<String>,
}

/// The api version recorded in the last applied configuration.
pub fn resource_rev(meta: &ObjectMeta) -> Result<String, RevisionError> {
    let raw = meta
        .annotations
        .as_ref()
        .and_then(|a| a.get(LAST_APPLIED_ANNOTATION))
        .ok_or(RevisionError::MissingAnnotation)?;

    let applied: LastApplied = serde_json::from_str(raw)?;
    applied
        .api_version
        .filter(|v| !v.is_empty())
        .ok_or(RevisionError::MissingApiVersion)
}

/// The api version embedded in a self link.
///
/// - `/apis/apps/v1/namespaces/default/daemonsets/fred` -> `apps/v1`
/// - `/api/v1/namespaces/default/pods/fred` -> `v1`
pub fn rev_from_link(link: &str) -> Option<String> {
    let mut tokens = link.trim_start_matches('/').split('/');
    match (tokens.next()?, tokens.next(), tokens.next()) {
        ("api", Some(version), Some(_)) if !version.is_empty() => Some(version.to_string()),
        ("apis", Some(group), Some(version)) if !group.is_empty() && !version.is_empty() => {
            Some(format!("{}/{}", group, version))
        }
        _ => None,
    }
}

/// Resolve the version an object was created with: the last applied
/// configuration first, then the self link.
pub fn resolve_api_version(fqn: &str, meta: &ObjectMeta) -> Option<String> {
    match resource_rev(meta) {
        Ok(rev) => Some(rev),
        Err(e) => {
            log::debug!("{}: {}, falling back to self link", fqn, e);
            meta.self_link.as_deref().and_then(rev_from_link)
        }
    }
}
