//! Read-only data sources the sanitizers consume.
//!
//! The engine never talks to a cluster. Everything it inspects comes
//! through these traits; [`crate::cluster::Cluster`] implements all of them.

use crate::error::Result;
use crate::sanitize::metrics::PodsMetrics;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use serde::{Deserialize, Serialize};

/// Lists every instance of one resource kind, keyed by fqn.
pub trait InstanceLister<K> {
    fn list_instances(&self) -> Result<Vec<(String, &K)>>;
}

/// Lists every pod.
pub trait PodLister: InstanceLister<Pod> {}

impl<T: InstanceLister<Pod>> PodLister for T {}

/// Selects the pods a controller owns.
pub trait PodSelectorLister {
    /// Pods in `namespace` matching `selector`, ordered by fqn.
    fn list_pods_by_selector(
        &self,
        namespace: Option<&str>,
        selector: &LabelSelector,
    ) -> Vec<(String, &Pod)>;
}

/// Live container usage for every pod with samples.
pub trait PodsMetricsLister {
    fn list_pods_metrics(&self) -> Result<PodsMetrics>;
}

/// Under/over allocation percentages for one resource dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationLimits {
    /// Usage above this percentage of the request is under allocation.
    pub under_perc: u32,
    /// Usage below this percentage of the request is over allocation.
    pub over_perc: u32,
}

impl Default for AllocationLimits {
    fn default() -> Self {
        Self {
            under_perc: 200,
            over_perc: 50,
        }
    }
}

/// Per-container utilization thresholds, as percentages of the declared
/// request (Burstable) or limit (Guaranteed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PodLimits {
    pub cpu: u32,
    pub memory: u32,
}

impl Default for PodLimits {
    fn default() -> Self {
        Self { cpu: 80, memory: 75 }
    }
}

/// Thresholds for the current run.
pub trait ThresholdProvider {
    fn cpu_allocations(&self) -> AllocationLimits;
    fn mem_allocations(&self) -> AllocationLimits;
    /// Whether over allocation is reported at all.
    fn over_allocs(&self) -> bool;
    fn pod_limits(&self) -> PodLimits;
}

/// Everything a controller sanitizer needs for kind `K`.
pub trait ControllerLister<K>:
    InstanceLister<K> + PodSelectorLister + PodsMetricsLister + ThresholdProvider + Sync
{
}

impl<K, T> ControllerLister<K> for T where
    T: InstanceLister<K> + PodSelectorLister + PodsMetricsLister + ThresholdProvider + Sync
{
}
