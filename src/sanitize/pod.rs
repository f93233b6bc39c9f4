//! Pod sanitizer.
//!
//! Checks every pod's containers with the pod's own skip annotation, then
//! measures each container against its live sample.

use crate::error::Result;
use crate::sanitize::collector::Collector;
use crate::sanitize::container::ContainerSanitizer;
use crate::sanitize::listers::{PodLister, PodsMetricsLister, ThresholdProvider};
use crate::sanitize::metrics::PodsMetrics;
use crate::sanitize::pragma::SkipCodes;
use k8s_openapi::api::core::v1::Pod;
use rayon::prelude::*;

pub struct PodSanitizer<'a, L> {
    collector: &'a Collector,
    lister: &'a L,
}

impl<'a, L> PodSanitizer<'a, L>
where
    L: PodLister + PodsMetricsLister + ThresholdProvider + Sync,
{
    pub fn new(collector: &'a Collector, lister: &'a L) -> Self {
        Self { collector, lister }
    }

    pub fn sanitize(&self) -> Result<()> {
        let pods = self.lister.list_instances()?;
        log::debug!("Sanitizing {} Pod(s)", pods.len());

        let pmx = self.lister.list_pods_metrics().unwrap_or_else(|e| {
            log::warn!("No metrics for Pod utilization: {}", e);
            PodsMetrics::new()
        });

        pods.par_iter()
            .for_each(|(fqn, pod)| self.sanitize_pod(fqn, pod, &pmx));
        Ok(())
    }

    fn sanitize_pod(&self, fqn: &str, pod: &Pod, pmx: &PodsMetrics) {
        self.collector.init_outcome(fqn);
        let Some(spec) = pod.spec.as_ref() else {
            return;
        };

        let skip = SkipCodes::from_meta(Some(&pod.metadata));
        let c = ContainerSanitizer::new(self.collector, fqn);
        for co in spec.init_containers.iter().flatten() {
            c.sanitize(&skip, co, false);
        }
        for co in &spec.containers {
            c.sanitize(&skip, co, true);
        }

        let Some(samples) = pmx.get(fqn) else {
            return;
        };
        let limits = self.lister.pod_limits();
        for co in &spec.containers {
            if let Some(cmx) = samples.iter().find(|m| m.name == co.name) {
                c.check_utilization(co, cmx, &limits);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{Cluster, yaml};
    use crate::config::types::Config;
    use crate::sanitize::codes;

    const PODS: &str = r#"
apiVersion: v1
kind: Pod
metadata:
  name: api-1
  namespace: shop
  annotations:
    workload-audit.io/skip-codes: "102"
spec:
  initContainers:
    - name: migrate
      image: migrate
      resources: {limits: {cpu: 500m, memory: 64Mi}}
  containers:
    - name: api
      image: api:1.2
      resources:
        requests: {cpu: 100m, memory: 100Mi}
    - name: sidecar
      image: proxy:1.0
      resources:
        limits: {cpu: 100m, memory: 100Mi}
      livenessProbe: {tcpSocket: {port: 15000}}
      readinessProbe: {tcpSocket: {port: 15000}}
---
apiVersion: v1
kind: Pod
metadata:
  name: idle
  namespace: shop
---
apiVersion: metrics.k8s.io/v1beta1
kind: PodMetrics
metadata: {name: api-1, namespace: shop}
containers:
  - name: api
    usage: {cpu: 95m, memory: 20Mi}
  - name: sidecar
    usage: {cpu: 10m, memory: 90Mi}
  - name: gone
    usage: {cpu: 900m, memory: 900Mi}
"#;

    #[test]
    fn test_pod_checks_and_utilization() {
        let snapshot = yaml::from_yaml_str(PODS).unwrap();
        let config = Config::default();
        let cluster = Cluster::new(&snapshot, &config);
        let collector = Collector::new();
        PodSanitizer::new(&collector, &cluster).sanitize().unwrap();

        let outcome = collector.outcome("shop/api-1").unwrap();
        let found: Vec<_> = outcome.iter().map(|i| (i.group.as_str(), i.code)).collect();
        assert_eq!(
            found,
            vec![
                ("migrate", codes::UNTAGGED_IMAGE),
                ("api", codes::NO_LIMITS),
                ("api", codes::BURSTABLE_CPU_THRESHOLD),
                ("sidecar", codes::GUARANTEED_MEM_THRESHOLD),
            ]
        );
        assert_eq!(
            outcome[3].message,
            "Memory Current/Limit (90Mi/100Mi) reached user 75% threshold (90%)"
        );

        assert!(collector.outcome("shop/idle").unwrap().is_empty());
        assert_eq!(collector.len(), 2);
    }
}
