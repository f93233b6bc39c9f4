//! Deployment sanitizer.

use crate::sanitize::codes;
use crate::sanitize::collector::Collector;
use crate::sanitize::workload::{ControllerSanitizer, ProbePolicy, Workload};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::PodTemplateSpec;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;

pub type DeploymentSanitizer<'a, L> = ControllerSanitizer<'a, Deployment, L>;

// Replicas the API server assumes when none are set.
const DEFAULT_REPLICAS: i32 = 1;

impl Workload for Deployment {
    const PROBE_POLICY: ProbePolicy = ProbePolicy::Check;

    fn selector(&self) -> Option<&LabelSelector> {
        self.spec.as_ref().map(|s| &s.selector)
    }

    fn template(&self) -> Option<&PodTemplateSpec> {
        self.spec.as_ref().map(|s| &s.template)
    }

    fn check_workload(&self, fqn: &str, collector: &Collector) {
        let replicas = self
            .spec
            .as_ref()
            .and_then(|s| s.replicas)
            .unwrap_or(DEFAULT_REPLICAS);
        if replicas == 0 {
            collector.add_code(codes::ZERO_SCALE, fqn, &[]);
            return;
        }

        let available = self
            .status
            .as_ref()
            .and_then(|s| s.available_replicas)
            .unwrap_or(0);
        if available == 0 {
            collector.add_code(codes::NO_AVAILABLE_REPLICAS, fqn, &[]);
        }
    }
}
