//! Cluster data for an audit run.
//!
//! [`ClusterSnapshot`] holds the objects to audit, loaded either from YAML
//! manifests ([`yaml`]) or from a live cluster ([`live`]). [`Cluster`] pairs
//! a snapshot with thresholds and serves every lister the sanitizers need.

pub mod live;
pub mod selector;
pub mod yaml;

use crate::error::{AuditError, Result};
use crate::sanitize::listers::{
    AllocationLimits, InstanceLister, PodLimits, PodSelectorLister, PodsMetricsLister,
    ThresholdProvider,
};
use crate::sanitize::metrics::{ContainerMetrics, PodsMetrics};
use crate::sanitize::quantity::{parse_cpu_to_millicores, parse_memory_to_bytes};
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment};
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

/// Fully-qualified name of an object: `namespace/name`, or just `name` for
/// cluster scoped objects.
pub fn fqn(meta: &ObjectMeta) -> String {
    let name = meta.name.as_deref().unwrap_or_default();
    match meta.namespace.as_deref() {
        Some(ns) if !ns.is_empty() => format!("{}/{}", ns, name),
        _ => name.to_string(),
    }
}

/// Objects to audit, keyed by fqn.
#[derive(Debug, Clone, Default)]
pub struct ClusterSnapshot {
    pub daemon_sets: BTreeMap<String, DaemonSet>,
    pub deployments: BTreeMap<String, Deployment>,
    pub pods: BTreeMap<String, Pod>,
    /// `None` when no metrics source was available.
    pub metrics: Option<PodsMetrics>,
}

impl ClusterSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_daemon_set(&mut self, ds: DaemonSet) {
        self.daemon_sets.insert(fqn(&ds.metadata), ds);
    }

    pub fn add_deployment(&mut self, dp: Deployment) {
        self.deployments.insert(fqn(&dp.metadata), dp);
    }

    pub fn add_pod(&mut self, pod: Pod) {
        self.pods.insert(fqn(&pod.metadata), pod);
    }

    /// Record a metrics.k8s.io pod sample.
    pub fn add_pod_metrics(&mut self, item: PodMetricsItem) {
        let pfqn = format!("{}/{}", item.metadata.namespace, item.metadata.name);
        let containers = item.containers.iter().map(ContainerMetricsItem::to_metrics).collect();
        self.metrics
            .get_or_insert_with(HashMap::new)
            .insert(pfqn, containers);
    }

    /// Number of audited objects.
    pub fn len(&self) -> usize {
        self.daemon_sets.len() + self.deployments.len() + self.pods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// metrics.k8s.io/v1beta1 payloads
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PodMetricsList {
    pub items: Vec<PodMetricsItem>,
}

#[derive(Debug, Deserialize)]
pub struct PodMetricsItem {
    pub metadata: PodMetricsMetadata,
    #[serde(default)]
    pub containers: Vec<ContainerMetricsItem>,
}

#[derive(Debug, Deserialize)]
pub struct PodMetricsMetadata {
    pub name: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_namespace() -> String {
    "default".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ContainerMetricsItem {
    pub name: String,
    pub usage: ResourceUsage,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResourceUsage {
    #[serde(default)]
    pub cpu: String,
    #[serde(default)]
    pub memory: String,
}

impl ContainerMetricsItem {
    fn to_metrics(&self) -> ContainerMetrics {
        ContainerMetrics {
            name: self.name.clone(),
            current_cpu: parse_cpu_to_millicores(&self.usage.cpu).unwrap_or(0),
            current_mem: parse_memory_to_bytes(&self.usage.memory).unwrap_or(0),
        }
    }
}

// ============================================================================
// Listers
// ============================================================================

/// A snapshot plus the thresholds to audit it with.
#[derive(Debug)]
pub struct Cluster<'a, T> {
    snapshot: &'a ClusterSnapshot,
    thresholds: &'a T,
}

impl<'a, T: ThresholdProvider> Cluster<'a, T> {
    pub fn new(snapshot: &'a ClusterSnapshot, thresholds: &'a T) -> Self {
        Self {
            snapshot,
            thresholds,
        }
    }
}

fn entries<K>(map: &BTreeMap<String, K>) -> Vec<(String, &K)> {
    map.iter().map(|(fqn, k)| (fqn.clone(), k)).collect()
}

impl<T> InstanceLister<DaemonSet> for Cluster<'_, T> {
    fn list_instances(&self) -> Result<Vec<(String, &DaemonSet)>> {
        Ok(entries(&self.snapshot.daemon_sets))
    }
}

impl<T> InstanceLister<Deployment> for Cluster<'_, T> {
    fn list_instances(&self) -> Result<Vec<(String, &Deployment)>> {
        Ok(entries(&self.snapshot.deployments))
    }
}

impl<T> InstanceLister<Pod> for Cluster<'_, T> {
    fn list_instances(&self) -> Result<Vec<(String, &Pod)>> {
        Ok(entries(&self.snapshot.pods))
    }
}

impl<T> PodSelectorLister for Cluster<'_, T> {
    fn list_pods_by_selector(
        &self,
        namespace: Option<&str>,
        selector: &LabelSelector,
    ) -> Vec<(String, &Pod)> {
        self.snapshot
            .pods
            .iter()
            .filter(|(_, pod)| pod.metadata.namespace.as_deref() == namespace)
            .filter(|(_, pod)| selector::matches(selector, pod.metadata.labels.as_ref()))
            .map(|(fqn, pod)| (fqn.clone(), pod))
            .collect()
    }
}

impl<T> PodsMetricsLister for Cluster<'_, T> {
    fn list_pods_metrics(&self) -> Result<PodsMetrics> {
        self.snapshot
            .metrics
            .clone()
            .ok_or(AuditError::MetricsUnavailable)
    }
}

impl<T: ThresholdProvider> ThresholdProvider for Cluster<'_, T> {
    fn cpu_allocations(&self) -> AllocationLimits {
        self.thresholds.cpu_allocations()
    }

    fn mem_allocations(&self) -> AllocationLimits {
        self.thresholds.mem_allocations()
    }

    fn over_allocs(&self) -> bool {
        self.thresholds.over_allocs()
    }

    fn pod_limits(&self) -> PodLimits {
        self.thresholds.pod_limits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::Config;

    const PODS: &str = r#"
apiVersion: v1
kind: Pod
metadata:
  name: web-1
  namespace: default
  labels: {app: web}
---
apiVersion: v1
kind: Pod
metadata:
  name: web-1
  namespace: staging
  labels: {app: web}
---
apiVersion: v1
kind: Pod
metadata:
  name: db-1
  namespace: default
  labels: {app: db}
---
apiVersion: metrics.k8s.io/v1beta1
kind: PodMetrics
metadata:
  name: web-1
  namespace: default
containers:
  - name: nginx
    usage: {cpu: 250000000n, memory: 64Mi}
"#;

    #[test]
    fn test_fqn() {
        let meta = ObjectMeta {
            name: Some("fred".into()),
            namespace: Some("blee".into()),
            ..Default::default()
        };
        assert_eq!(fqn(&meta), "blee/fred");
        assert_eq!(
            fqn(&ObjectMeta {
                name: Some("node-1".into()),
                ..Default::default()
            }),
            "node-1"
        );
    }

    #[test]
    fn test_selector_scoped_to_namespace() {
        let snapshot = yaml::from_yaml_str(PODS).unwrap();
        let config = Config::default();
        let cluster = Cluster::new(&snapshot, &config);

        let sel: LabelSelector = serde_yaml::from_str("matchLabels: {app: web}").unwrap();
        let pods = cluster.list_pods_by_selector(Some("default"), &sel);
        let fqns: Vec<_> = pods.iter().map(|(f, _)| f.as_str()).collect();
        assert_eq!(fqns, vec!["default/web-1"]);
    }

    #[test]
    fn test_metrics() {
        let snapshot = yaml::from_yaml_str(PODS).unwrap();
        let config = Config::default();
        let cluster = Cluster::new(&snapshot, &config);

        let pmx = cluster.list_pods_metrics().unwrap();
        assert_eq!(
            pmx["default/web-1"],
            vec![ContainerMetrics {
                name: "nginx".into(),
                current_cpu: 250,
                current_mem: 64 * 1024 * 1024,
            }]
        );

        let empty = ClusterSnapshot::new();
        let cluster = Cluster::new(&empty, &config);
        assert!(matches!(
            cluster.list_pods_metrics(),
            Err(AuditError::MetricsUnavailable)
        ));
    }
}
