//! Requested vs. live resource consumption.

use crate::sanitize::quantity::{cpu_millicores, memory_bytes};
use k8s_openapi::api::core::v1::{Container, Pod, PodSpec, ResourceRequirements};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Live usage sample for one container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerMetrics {
    pub name: String,
    /// CPU usage in millicores
    pub current_cpu: u64,
    /// Memory usage in bytes
    pub current_mem: u64,
}

/// Container samples keyed by pod fqn.
pub type PodsMetrics = HashMap<String, Vec<ContainerMetrics>>;

/// Pod quality of service class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Qos {
    BestEffort,
    Burstable,
    Guaranteed,
}

impl Qos {
    /// Parse the class reported in a pod's status.
    pub fn from_class(class: &str) -> Option<Self> {
        match class {
            "BestEffort" => Some(Self::BestEffort),
            "Burstable" => Some(Self::Burstable),
            "Guaranteed" => Some(Self::Guaranteed),
            _ => None,
        }
    }

    /// Class reported in a pod's status, if any.
    pub fn of_pod(pod: &Pod) -> Option<Self> {
        pod.status
            .as_ref()
            .and_then(|s| s.qos_class.as_deref())
            .and_then(Self::from_class)
    }
}

/// Aggregate consumption for one workload.
///
/// CPU values are millicores, memory values bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumptionMetrics {
    pub qos: Option<Qos>,
    pub request_cpu: u64,
    pub request_mem: u64,
    pub current_cpu: u64,
    pub current_mem: u64,
}

impl ConsumptionMetrics {
    /// Whether no cpu and no memory was requested.
    pub fn requests_zero(&self) -> bool {
        self.request_cpu == 0 && self.request_mem == 0
    }

    /// Current cpu as a rounded percentage of the request.
    pub fn req_cpu_ratio(&self) -> f64 {
        self.req_abs_cpu_ratio().round()
    }

    /// Current cpu as an unrounded percentage of the request.
    pub fn req_abs_cpu_ratio(&self) -> f64 {
        ratio(self.current_cpu, self.request_cpu)
    }

    /// Current memory as a rounded percentage of the request.
    pub fn req_mem_ratio(&self) -> f64 {
        self.req_abs_mem_ratio().round()
    }

    /// Current memory as an unrounded percentage of the request.
    pub fn req_abs_mem_ratio(&self) -> f64 {
        ratio(self.current_mem, self.request_mem)
    }

    /// Fold one owned pod into the aggregate.
    ///
    /// Requests always count; usage only when the pod has samples. Sums
    /// saturate at `u64::MAX`.
    pub fn add_pod(&mut self, pod: &Pod, samples: Option<&[ContainerMetrics]>) {
        if let Some(spec) = pod.spec.as_ref() {
            let (cpu, mem) = pod_requests(spec);
            self.request_cpu = self.request_cpu.saturating_add(cpu);
            self.request_mem = self.request_mem.saturating_add(mem);
        }
        self.qos = Qos::of_pod(pod);

        for sample in samples.unwrap_or_default() {
            self.current_cpu = self.current_cpu.saturating_add(sample.current_cpu);
            self.current_mem = self.current_mem.saturating_add(sample.current_mem);
        }
    }
}

fn ratio(current: u64, requested: u64) -> f64 {
    if requested == 0 {
        return 0.0;
    }
    current as f64 / requested as f64 * 100.0
}

fn cpu_of(list: &BTreeMap<String, Quantity>) -> u64 {
    list.get("cpu").map(cpu_millicores).unwrap_or(0)
}

fn mem_of(list: &BTreeMap<String, Quantity>) -> u64 {
    list.get("memory").map(memory_bytes).unwrap_or(0)
}

/// Requested (cpu millicores, memory bytes) summed over a pod's regular
/// containers.
pub fn pod_requests(spec: &PodSpec) -> (u64, u64) {
    spec.containers
        .iter()
        .filter_map(|co| co.resources.as_ref()?.requests.as_ref())
        .fold((0u64, 0u64), |(cpu, mem), req| {
            (cpu.saturating_add(cpu_of(req)), mem.saturating_add(mem_of(req)))
        })
}

/// Declared (cpu, memory, qos) for one container.
///
/// Limits take precedence and make the container Guaranteed; requests alone
/// make it Burstable. `None` when nothing is declared.
pub fn container_resources(co: &Container) -> Option<(u64, u64, Qos)> {
    let ResourceRequirements {
        requests, limits, ..
    } = co.resources.as_ref()?;

    let non_empty = |m: &Option<BTreeMap<String, Quantity>>| m.clone().filter(|m| !m.is_empty());
    match (non_empty(requests), non_empty(limits)) {
        (_, Some(limits)) => Some((cpu_of(&limits), mem_of(&limits), Qos::Guaranteed)),
        (Some(requests), None) => Some((cpu_of(&requests), mem_of(&requests), Qos::Burstable)),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(yaml: &str) -> Container {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_ratios() {
        let mx = ConsumptionMetrics {
            request_cpu: 1000,
            current_cpu: 1300,
            request_mem: 300,
            current_mem: 100,
            ..Default::default()
        };
        assert_eq!(mx.req_cpu_ratio(), 130.0);
        assert_eq!(mx.req_mem_ratio(), 33.0);
        assert!((mx.req_abs_mem_ratio() - 33.333).abs() < 0.01);
        assert!(!mx.requests_zero());

        let empty = ConsumptionMetrics::default();
        assert!(empty.requests_zero());
        assert_eq!(empty.req_cpu_ratio(), 0.0);
        assert_eq!(empty.req_abs_mem_ratio(), 0.0);
    }

    #[test]
    fn test_container_resources() {
        let burstable = container(
            r#"
name: c1
resources:
  requests:
    cpu: 100m
    memory: 64Mi
"#,
        );
        assert_eq!(
            container_resources(&burstable),
            Some((100, 64 * 1024 * 1024, Qos::Burstable))
        );

        let guaranteed = container(
            r#"
name: c1
resources:
  requests:
    cpu: 100m
  limits:
    cpu: "1"
    memory: 1Gi
"#,
        );
        assert_eq!(
            container_resources(&guaranteed),
            Some((1000, 1024 * 1024 * 1024, Qos::Guaranteed))
        );

        assert_eq!(container_resources(&container("name: c1")), None);
        assert_eq!(
            container_resources(&container("name: c1\nresources: {requests: {}}")),
            None
        );
    }

    #[test]
    fn test_pod_requests_and_aggregation() {
        let pod: Pod = serde_yaml::from_str(
            r#"
apiVersion: v1
kind: Pod
metadata:
  name: p1
spec:
  initContainers:
    - name: init
      resources:
        requests:
          cpu: "2"
  containers:
    - name: c1
      resources:
        requests:
          cpu: 250m
          memory: 128Mi
    - name: c2
      resources:
        requests:
          cpu: 250m
    - name: c3
status:
  qosClass: Burstable
"#,
        )
        .unwrap();

        assert_eq!(
            pod_requests(pod.spec.as_ref().unwrap()),
            (500, 128 * 1024 * 1024)
        );

        let mut mx = ConsumptionMetrics::default();
        let samples = vec![
            ContainerMetrics { name: "c1".into(), current_cpu: 300, current_mem: 10 },
            ContainerMetrics { name: "c2".into(), current_cpu: 100, current_mem: 5 },
        ];
        mx.add_pod(&pod, Some(&samples));
        mx.add_pod(&pod, None);

        assert_eq!(mx.request_cpu, 1000);
        assert_eq!(mx.current_cpu, 400);
        assert_eq!(mx.current_mem, 15);
        assert_eq!(mx.qos, Some(Qos::Burstable));
    }

    #[test]
    fn test_huge_requests_saturate() {
        let pod: Pod = serde_yaml::from_str(
            r#"
apiVersion: v1
kind: Pod
metadata:
  name: big
spec:
  containers:
    - name: a
      resources:
        requests: {memory: 10Ei}
    - name: b
      resources:
        requests: {memory: 10Ei}
"#,
        )
        .unwrap();

        assert_eq!(pod_requests(pod.spec.as_ref().unwrap()), (0, u64::MAX));

        let mut mx = ConsumptionMetrics::default();
        let samples = vec![ContainerMetrics {
            name: "a".into(),
            current_cpu: u64::MAX,
            current_mem: u64::MAX,
        }];
        mx.add_pod(&pod, Some(&samples));
        mx.add_pod(&pod, Some(&samples));

        assert_eq!(mx.request_mem, u64::MAX);
        assert_eq!(mx.current_cpu, u64::MAX);
        assert_eq!(mx.current_mem, u64::MAX);
        assert_eq!(mx.req_mem_ratio(), 100.0);
    }
}
