//! DaemonSet sanitizer.
//!
//! Daemon set containers are not probe checked.

use crate::sanitize::workload::{ControllerSanitizer, ProbePolicy, Workload};
use k8s_openapi::api::apps::v1::DaemonSet;
use k8s_openapi::api::core::v1::PodTemplateSpec;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;

pub type DaemonSetSanitizer<'a, L> = ControllerSanitizer<'a, DaemonSet, L>;

impl Workload for DaemonSet {
    const PROBE_POLICY: ProbePolicy = ProbePolicy::Skip;

    fn selector(&self) -> Option<&LabelSelector> {
        self.spec.as_ref().map(|s| &s.selector)
    }

    fn template(&self) -> Option<&PodTemplateSpec> {
        self.spec.as_ref().map(|s| &s.template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{Cluster, yaml};
    use crate::config::types::Config;
    use crate::sanitize::codes;
    use crate::sanitize::collector::Collector;
    use crate::sanitize::listers::AllocationLimits;
    use crate::sanitize::types::{Issue, IssueCode, ROOT_GROUP};

    const FQN: &str = "default/fred";

    fn daemon_set(api_version: &str, annotations: &str) -> String {
        format!(
            r#"
apiVersion: apps/v1
kind: DaemonSet
metadata:
  name: fred
  namespace: default
  annotations:
    kubectl.kubernetes.io/last-applied-configuration: '{{"apiVersion":"{}"}}'
spec:
  selector:
    matchLabels: {{app: fred}}
  template:
    metadata:
      labels: {{app: fred}}
      annotations: {{{}}}
    spec:
      initContainers:
        - name: init
          image: busybox:latest
          resources:
            limits: {{cpu: 100m}}
      containers:
        - name: fred
          image: fred:1.0
          resources:
            requests: {{cpu: 1000m, memory: 100Mi}}
            limits: {{cpu: 2000m, memory: 200Mi}}
          ports:
            - containerPort: 8080
"#,
            api_version, annotations
        )
    }

    fn pod(name: &str, cpu: &str, mem: &str) -> String {
        format!(
            r#"
---
apiVersion: v1
kind: Pod
metadata:
  name: {name}
  namespace: default
  labels: {{app: fred}}
spec:
  containers:
    - name: fred
      image: fred:1.0
      resources:
        requests: {{cpu: 1000m, memory: 100Mi}}
status:
  qosClass: Burstable
---
apiVersion: metrics.k8s.io/v1beta1
kind: PodMetrics
metadata: {{name: {name}, namespace: default}}
containers:
  - name: fred
    usage: {{cpu: {cpu}, memory: {mem}}}
"#
        )
    }

    fn sanitize(manifest: &str, config: &Config) -> Vec<Issue> {
        let snapshot = yaml::from_yaml_str(manifest).unwrap();
        let cluster = Cluster::new(&snapshot, config);
        let collector = Collector::new();
        DaemonSetSanitizer::new(&collector, &cluster).sanitize().unwrap();
        collector.outcome(FQN).unwrap()
    }

    fn root_codes(issues: &[Issue]) -> Vec<IssueCode> {
        issues.iter().filter(|i| i.is_root()).map(|i| i.code).collect()
    }

    fn under_20() -> Config {
        let mut config = Config::default();
        config.allocations.cpu = AllocationLimits {
            under_perc: 20,
            over_perc: 50,
        };
        config
    }

    #[test]
    fn test_container_checks_skip_probes() {
        let issues = sanitize(&daemon_set("apps/v1", ""), &Config::default());
        let found: Vec<_> = issues.iter().map(|i| (i.group.as_str(), i.code)).collect();
        assert_eq!(
            found,
            vec![("init", codes::LATEST_TAG), ("fred", codes::UNNAMED_PORT)]
        );
    }

    #[test]
    fn test_template_skip_annotation() {
        let manifest = daemon_set("apps/v1", r#""workload-audit.io/skip-codes": "101, 108""#);
        assert!(sanitize(&manifest, &Config::default()).is_empty());
    }

    #[test]
    fn test_template_skip_annotation_keeps_controller_codes() {
        let manifest = daemon_set(
            "extensions/v1beta1",
            r#""workload-audit.io/skip-codes": "403, 404, 503""#,
        ) + &pod("fred-1", "1300m", "50Mi");
        let issues = sanitize(&manifest, &under_20());

        assert_eq!(
            root_codes(&issues),
            vec![codes::DEPRECATED_API, codes::CPU_UNDER_ALLOCATED]
        );
        // Container codes are not in the skip list and are still reported.
        assert!(issues.iter().any(|i| i.code == codes::UNNAMED_PORT));
    }

    #[test]
    fn test_controller_annotation_does_not_skip_container_codes() {
        let manifest = daemon_set("apps/v1", "").replace(
            "  annotations:\n    kubectl",
            "  annotations:\n    workload-audit.io/skip-codes: \"101, 108\"\n    kubectl",
        );
        assert!(manifest.contains("workload-audit.io/skip-codes: \"101, 108\""));

        let issues = sanitize(&manifest, &Config::default());
        let found: Vec<_> = issues.iter().map(|i| (i.group.as_str(), i.code)).collect();
        assert_eq!(
            found,
            vec![("init", codes::LATEST_TAG), ("fred", codes::UNNAMED_PORT)]
        );
    }

    #[test]
    fn test_deprecated_api() {
        let issues = sanitize(&daemon_set("extensions/v1beta1", ""), &Config::default());
        assert_eq!(issues[0].code, codes::DEPRECATED_API);
        assert_eq!(issues[0].group, ROOT_GROUP);
        assert_eq!(
            issues[0].message,
            "Deprecated DaemonSet API group \"extensions/v1beta1\". Use \"apps/v1\" instead"
        );
    }

    #[test]
    fn test_unresolved_api_version() {
        let manifest = daemon_set("apps/v1", "").replace(
            "    kubectl.kubernetes.io/last-applied-configuration: '{\"apiVersion\":\"apps/v1\"}'\n",
            "    team: infra\n",
        );
        let issues = sanitize(&manifest, &Config::default());
        assert_eq!(issues[0].code, codes::UNRESOLVED_API_VERSION);
        assert_eq!(
            issues[0].message,
            "Deprecation check failed. Unable to assert resource version"
        );
        // Container checks still run.
        assert!(issues.iter().any(|i| i.code == codes::UNNAMED_PORT));
    }

    #[test]
    fn test_cpu_under_allocated() {
        let manifest = daemon_set("apps/v1", "") + &pod("fred-1", "1300m", "50Mi");
        let issues = sanitize(&manifest, &under_20());

        assert_eq!(root_codes(&issues), vec![codes::CPU_UNDER_ALLOCATED]);
        let issue = issues.iter().find(|i| i.is_root()).unwrap();
        assert_eq!(
            issue.message,
            "At current load, CPU under allocated. Current:1300m vs Requested:1000m (130%)"
        );
    }

    #[test]
    fn test_cpu_over_allocated_only_when_enabled() {
        let manifest = daemon_set("apps/v1", "") + &pod("fred-1", "200m", "100Mi");

        let issues = sanitize(&manifest, &under_20());
        assert!(root_codes(&issues).is_empty());

        let mut config = under_20();
        config.over_allocs = true;
        let issues = sanitize(&manifest, &config);
        assert_eq!(root_codes(&issues), vec![codes::CPU_OVER_ALLOCATED]);
        let issue = issues.iter().find(|i| i.is_root()).unwrap();
        assert_eq!(
            issue.message,
            "At current load, CPU over allocated. Current:200m vs Requested:1000m (20%)"
        );
    }

    #[test]
    fn test_usage_sums_owned_pods() {
        let manifest = daemon_set("apps/v1", "")
            + &pod("fred-1", "1500m", "150Mi")
            + &pod("fred-2", "1500m", "150Mi");
        let mut config = under_20();
        config.allocations.memory = AllocationLimits {
            under_perc: 120,
            over_perc: 50,
        };
        let issues = sanitize(&manifest, &config);

        assert_eq!(
            root_codes(&issues),
            vec![codes::CPU_UNDER_ALLOCATED, codes::MEM_UNDER_ALLOCATED]
        );
        let mem = issues
            .iter()
            .find(|i| i.code == codes::MEM_UNDER_ALLOCATED)
            .unwrap();
        assert_eq!(
            mem.message,
            "At current load, Memory under allocated. Current:300Mi vs Requested:200Mi (150%)"
        );
    }

    #[test]
    fn test_one_sided_request_reports_other_dimension() {
        let owned = pod("fred-1", "1000m", "100Mi").replace(
            "        requests: {cpu: 1000m, memory: 100Mi}\n",
            "        requests: {cpu: 1000m}\n",
        );
        let manifest = daemon_set("apps/v1", "") + &owned;
        let mut config = under_20();
        config.over_allocs = true;
        let issues = sanitize(&manifest, &config);

        assert_eq!(root_codes(&issues), vec![codes::MEM_OVER_ALLOCATED]);
        let issue = issues.iter().find(|i| i.is_root()).unwrap();
        assert_eq!(
            issue.message,
            "At current load, Memory over allocated. Current:100Mi vs Requested:0Mi (0%)"
        );
    }

    #[test]
    fn test_zero_requests_skip_utilization() {
        let owned = pod("fred-1", "5000m", "1Gi")
            .replace("        requests: {cpu: 1000m, memory: 100Mi}\n", "");
        let manifest = daemon_set("apps/v1", "") + &owned;
        let mut config = under_20();
        config.over_allocs = true;
        assert!(root_codes(&sanitize(&manifest, &config)).is_empty());
    }

    #[test]
    fn test_missing_metrics_is_not_fatal() {
        let owned = pod("fred-1", "1300m", "50Mi");
        let without_metrics = owned.split("---\napiVersion: metrics").next().unwrap();
        let manifest = daemon_set("apps/v1", "") + without_metrics;

        let issues = sanitize(&manifest, &under_20());
        assert!(root_codes(&issues).is_empty());
        assert!(issues.iter().any(|i| i.code == codes::UNNAMED_PORT));
    }
}
