//! Snapshot loading from YAML manifests.
//!
//! Accepts multi-document files, `List` wrappers and `PodMetrics` documents
//! (as printed by `kubectl get --raw /apis/metrics.k8s.io/v1beta1/pods`).

use crate::cluster::{ClusterSnapshot, PodMetricsItem};
use crate::error::{AuditError, Result};
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment};
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::Deserialize;
use serde_yaml::Value;
use std::path::Path;

const DEFAULT_NAMESPACE: &str = "default";

/// Parse a YAML string into a snapshot.
pub fn from_yaml_str(content: &str) -> Result<ClusterSnapshot> {
    let mut snapshot = ClusterSnapshot::new();
    load_str_into(&mut snapshot, content, Path::new("<stdin>"))?;
    Ok(snapshot)
}

/// Load a YAML file, or every `.yaml`/`.yml` file under a directory.
///
/// Files in a directory that fail to parse are skipped with a warning.
pub fn load_path(path: &Path) -> Result<ClusterSnapshot> {
    let mut snapshot = ClusterSnapshot::new();

    if path.is_file() {
        load_file_into(&mut snapshot, path)?;
        return Ok(snapshot);
    }
    if !path.is_dir() {
        return Err(AuditError::Snapshot {
            path: path.to_path_buf(),
            message: "no such file or directory".to_string(),
        });
    }

    for entry in walkdir::WalkDir::new(path)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let entry_path = entry.path();
        let ext = entry_path.extension().and_then(|e| e.to_str());
        if entry_path.is_file() && matches!(ext, Some("yaml") | Some("yml")) {
            if let Err(e) = load_file_into(&mut snapshot, entry_path) {
                log::warn!("Skipping {}: {}", entry_path.display(), e);
            }
        }
    }

    log::debug!("Loaded {} object(s) from {}", snapshot.len(), path.display());
    Ok(snapshot)
}

fn load_file_into(snapshot: &mut ClusterSnapshot, path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)?;
    load_str_into(snapshot, &content, path)
}

fn load_str_into(snapshot: &mut ClusterSnapshot, content: &str, path: &Path) -> Result<()> {
    for doc in serde_yaml::Deserializer::from_str(content) {
        let value = Value::deserialize(doc)?;
        if value.is_null() {
            continue;
        }
        add_value(snapshot, value).map_err(|e| AuditError::Snapshot {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    }
    Ok(())
}

fn add_value(snapshot: &mut ClusterSnapshot, value: Value) -> std::result::Result<(), serde_yaml::Error> {
    let kind = value.get("kind").and_then(Value::as_str).unwrap_or_default().to_string();

    match kind.as_str() {
        "DaemonSet" => {
            let mut ds: DaemonSet = serde_yaml::from_value(value)?;
            default_namespace(&mut ds.metadata);
            snapshot.add_daemon_set(ds);
        }
        "Deployment" => {
            let mut dp: Deployment = serde_yaml::from_value(value)?;
            default_namespace(&mut dp.metadata);
            snapshot.add_deployment(dp);
        }
        "Pod" => {
            let mut pod: Pod = serde_yaml::from_value(value)?;
            default_namespace(&mut pod.metadata);
            snapshot.add_pod(pod);
        }
        "PodMetrics" => {
            let item: PodMetricsItem = serde_yaml::from_value(value)?;
            snapshot.add_pod_metrics(item);
        }
        "List" | "PodMetricsList" => {
            if let Some(Value::Sequence(items)) = value.get("items").cloned() {
                for item in items {
                    add_value(snapshot, with_list_kind(item, &kind))?;
                }
            }
        }
        other => log::debug!("Skipping unsupported kind {:?}", other),
    }
    Ok(())
}

// Items of a `kubectl get --raw` metrics list carry no kind of their own.
fn with_list_kind(mut item: Value, list_kind: &str) -> Value {
    if list_kind == "PodMetricsList" && item.get("kind").is_none() {
        if let Value::Mapping(map) = &mut item {
            map.insert("kind".into(), "PodMetrics".into());
        }
    }
    item
}

fn default_namespace(meta: &mut ObjectMeta) {
    if meta.namespace.as_deref().unwrap_or_default().is_empty() {
        meta.namespace = Some(DEFAULT_NAMESPACE.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const DAEMON_SET: &str = r#"
apiVersion: apps/v1
kind: DaemonSet
metadata:
  name: fluentd
  namespace: kube-system
spec:
  selector:
    matchLabels: {app: fluentd}
  template:
    metadata:
      labels: {app: fluentd}
    spec:
      containers:
        - name: fluentd
          image: fluentd:v1.16
"#;

    #[test]
    fn test_multi_document() {
        let content = format!(
            "{}\n---\napiVersion: v1\nkind: Pod\nmetadata:\n  name: p1\n---\napiVersion: v1\nkind: Service\nmetadata:\n  name: svc\n",
            DAEMON_SET
        );
        let snapshot = from_yaml_str(&content).unwrap();
        assert!(snapshot.daemon_sets.contains_key("kube-system/fluentd"));
        assert!(snapshot.pods.contains_key("default/p1"));
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.metrics.is_none());
    }

    #[test]
    fn test_list_wrappers() {
        let content = r#"
apiVersion: v1
kind: List
items:
  - apiVersion: apps/v1
    kind: Deployment
    metadata: {name: web, namespace: shop}
    spec:
      selector: {matchLabels: {app: web}}
      template:
        metadata: {labels: {app: web}}
        spec:
          containers: [{name: web, image: "web:1.0"}]
---
kind: PodMetricsList
apiVersion: metrics.k8s.io/v1beta1
items:
  - metadata: {name: web-1, namespace: shop}
    containers:
      - name: web
        usage: {cpu: 5m, memory: 10Mi}
"#;
        let snapshot = from_yaml_str(content).unwrap();
        assert!(snapshot.deployments.contains_key("shop/web"));
        let metrics = snapshot.metrics.unwrap();
        assert_eq!(metrics["shop/web-1"][0].current_cpu, 5);
    }

    #[test]
    fn test_invalid_document_is_an_error() {
        let content = "apiVersion: v1\nkind: Pod\nmetadata: [not, a, map]\n";
        assert!(matches!(
            from_yaml_str(content),
            Err(AuditError::Snapshot { .. })
        ));
    }

    #[test]
    fn test_load_directory() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("ds.yaml"), DAEMON_SET).unwrap();
        fs::write(
            dir.path().join("nested/pod.yml"),
            "apiVersion: v1\nkind: Pod\nmetadata: {name: p1, namespace: kube-system}\n",
        )
        .unwrap();
        fs::write(dir.path().join("broken.yaml"), "kind: Pod\nmetadata: 12\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "kind: Pod").unwrap();

        let snapshot = load_path(dir.path()).unwrap();
        assert_eq!(snapshot.daemon_sets.len(), 1);
        assert_eq!(snapshot.pods.len(), 1);

        let single = load_path(&dir.path().join("ds.yaml")).unwrap();
        assert_eq!(single.daemon_sets.len(), 1);

        assert!(load_path(&dir.path().join("missing")).is_err());
    }
}
