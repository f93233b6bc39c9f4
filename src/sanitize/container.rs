//! Container checks.
//!
//! Runs against one container spec and records findings under the parent
//! resource's fqn, grouped by container name.

use crate::sanitize::codes;
use crate::sanitize::collector::Collector;
use crate::sanitize::listers::PodLimits;
use crate::sanitize::metrics::{ContainerMetrics, Qos, container_resources};
use crate::sanitize::pragma::SkipCodes;
use crate::sanitize::quantity::{as_mb, as_mc, to_perc};
use crate::sanitize::types::IssueCode;
use k8s_openapi::api::core::v1::{Container, Probe};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use std::collections::BTreeMap;
use std::fmt;

const IMAGE_TAG_LATEST: &str = "latest";

/// Tag portion of an image reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageTag<'a> {
    Missing,
    /// Pinned by digest (`image@sha256:...`)
    Digest,
    Tag(&'a str),
}

fn image_tag(image: &str) -> ImageTag<'_> {
    if image.contains('@') {
        return ImageTag::Digest;
    }
    // A registry host may carry a port, so only the last path segment holds
    // the tag.
    let name = image.rsplit('/').next().unwrap_or(image);
    match name.split_once(':') {
        Some((_, tag)) if !tag.is_empty() => ImageTag::Tag(tag),
        _ => ImageTag::Missing,
    }
}

fn declared(list: Option<&BTreeMap<String, Quantity>>) -> bool {
    list.is_some_and(|l| !l.is_empty())
}

/// Checks one container at a time on behalf of `fqn`.
pub struct ContainerSanitizer<'a> {
    collector: &'a Collector,
    fqn: &'a str,
}

impl<'a> ContainerSanitizer<'a> {
    pub fn new(collector: &'a Collector, fqn: &'a str) -> Self {
        Self { collector, fqn }
    }

    /// Run the static checks: image tag, probes (when `check_probes`),
    /// resources and named ports.
    pub fn sanitize(&self, skip: &SkipCodes, co: &Container, check_probes: bool) {
        self.check_image_tags(skip, co);
        if check_probes {
            self.check_probes(skip, co);
        }
        self.check_resources(skip, co);
        self.check_named_ports(skip, co);
    }

    fn check_image_tags(&self, skip: &SkipCodes, co: &Container) {
        match image_tag(co.image.as_deref().unwrap_or_default()) {
            ImageTag::Missing => self.add(skip, codes::UNTAGGED_IMAGE, co, &[]),
            ImageTag::Tag(IMAGE_TAG_LATEST) => self.add(skip, codes::LATEST_TAG, co, &[]),
            ImageTag::Tag(_) | ImageTag::Digest => {}
        }
    }

    fn check_probes(&self, skip: &SkipCodes, co: &Container) {
        let (liveness, readiness) = (co.liveness_probe.as_ref(), co.readiness_probe.as_ref());
        if liveness.is_none() && readiness.is_none() {
            self.add(skip, codes::NO_PROBES, co, &[]);
            return;
        }

        if liveness.is_none() {
            self.add(skip, codes::NO_LIVENESS_PROBE, co, &[]);
        }
        self.check_named_probe(skip, co, liveness, "Liveness");

        if readiness.is_none() {
            self.add(skip, codes::NO_READINESS_PROBE, co, &[]);
        }
        self.check_named_probe(skip, co, readiness, "Readiness");
    }

    fn check_named_probe(&self, skip: &SkipCodes, co: &Container, probe: Option<&Probe>, kind: &str) {
        let numeric = probe
            .and_then(|p| p.http_get.as_ref())
            .is_some_and(|http| matches!(http.port, IntOrString::Int(_)));
        if numeric {
            self.add(skip, codes::NUMERIC_PROBE_PORT, co, &[&kind]);
        }
    }

    fn check_resources(&self, skip: &SkipCodes, co: &Container) {
        let res = co.resources.as_ref();
        let requests = declared(res.and_then(|r| r.requests.as_ref()));
        let limits = declared(res.and_then(|r| r.limits.as_ref()));

        if !requests && !limits {
            self.add(skip, codes::NO_RESOURCES, co, &[]);
            return;
        }
        if requests && !limits {
            self.add(skip, codes::NO_LIMITS, co, &[]);
        }
    }

    fn check_named_ports(&self, skip: &SkipCodes, co: &Container) {
        for port in co.ports.iter().flatten() {
            if port.name.as_deref().unwrap_or_default().is_empty() {
                self.add(skip, codes::UNNAMED_PORT, co, &[&port.container_port]);
            }
        }
    }

    /// Compare a container's live sample against its declared resources.
    ///
    /// Burstable containers are measured against requests, Guaranteed ones
    /// against limits. Containers declaring nothing are not measured.
    pub fn check_utilization(&self, co: &Container, cmx: &ContainerMetrics, limits: &PodLimits) {
        let Some((cpu, mem, qos)) = container_resources(co) else {
            return;
        };
        let (cpu_code, mem_code) = match qos {
            Qos::Burstable => (codes::BURSTABLE_CPU_THRESHOLD, codes::BURSTABLE_MEM_THRESHOLD),
            Qos::Guaranteed => (codes::GUARANTEED_CPU_THRESHOLD, codes::GUARANTEED_MEM_THRESHOLD),
            Qos::BestEffort => return,
        };

        let perc_cpu = to_perc(cmx.current_cpu, cpu);
        if perc_cpu > u64::from(limits.cpu) {
            self.collector.add_sub_code(
                cpu_code,
                self.fqn,
                &co.name,
                &[&as_mc(cmx.current_cpu), &as_mc(cpu), &limits.cpu, &perc_cpu],
            );
        }

        let perc_mem = to_perc(cmx.current_mem, mem);
        if perc_mem > u64::from(limits.memory) {
            self.collector.add_sub_code(
                mem_code,
                self.fqn,
                &co.name,
                &[&as_mb(cmx.current_mem), &as_mb(mem), &limits.memory, &perc_mem],
            );
        }
    }

    fn add(&self, skip: &SkipCodes, code: IssueCode, co: &Container, args: &[&dyn fmt::Display]) {
        self.collector
            .add_sub_code_with_skip_check(skip, code, self.fqn, &co.name, args);
    }
}
