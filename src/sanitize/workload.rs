//! Controller checks shared by every workload kind.
//!
//! A kind plugs in by implementing [`Workload`]; the orchestration and the
//! utilization arithmetic live here once.

use crate::error::Result;
use crate::sanitize::codes;
use crate::sanitize::collector::Collector;
use crate::sanitize::container::ContainerSanitizer;
use crate::sanitize::deprecation::resolve_api_version;
use crate::sanitize::listers::{AllocationLimits, ControllerLister};
use crate::sanitize::metrics::{ConsumptionMetrics, PodsMetrics};
use crate::sanitize::pragma::SkipCodes;
use crate::sanitize::quantity::{as_mb, as_mc, as_perc};
use crate::sanitize::types::IssueCode;
use k8s_openapi::api::core::v1::PodTemplateSpec;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::{Metadata, Resource};
use rayon::prelude::*;
use std::marker::PhantomData;

/// Whether regular containers of a kind get probe checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbePolicy {
    Check,
    Skip,
}

impl ProbePolicy {
    pub fn checks_probes(self) -> bool {
        self == Self::Check
    }
}

/// A controller kind that owns pods through a selector and a template.
pub trait Workload: Resource + Metadata<Ty = ObjectMeta> + Sync {
    const PROBE_POLICY: ProbePolicy;

    fn selector(&self) -> Option<&LabelSelector>;

    fn template(&self) -> Option<&PodTemplateSpec>;

    /// Checks only this kind performs. Runs after the container checks.
    fn check_workload(&self, _fqn: &str, _collector: &Collector) {}
}

/// One dimension of a utilization comparison.
struct Allocation {
    current: String,
    requested: String,
    ratio: f64,
    abs_ratio: f64,
    limits: AllocationLimits,
    under: IssueCode,
    over: IssueCode,
}

/// Sanitizes every instance of kind `K` listed by `L`.
pub struct ControllerSanitizer<'a, K, L> {
    collector: &'a Collector,
    lister: &'a L,
    _kind: PhantomData<fn() -> K>,
}

impl<'a, K, L> ControllerSanitizer<'a, K, L>
where
    K: Workload,
    L: ControllerLister<K>,
{
    pub fn new(collector: &'a Collector, lister: &'a L) -> Self {
        Self {
            collector,
            lister,
            _kind: PhantomData,
        }
    }

    /// Check every instance. Fails only when the instances cannot be listed.
    pub fn sanitize(&self) -> Result<()> {
        let instances = self.lister.list_instances()?;
        log::debug!("Sanitizing {} {}(s)", instances.len(), K::KIND);

        let pmx = self.lister.list_pods_metrics().unwrap_or_else(|e| {
            log::warn!("No metrics for {} utilization: {}", K::KIND, e);
            PodsMetrics::new()
        });
        let over = self.lister.over_allocs();

        instances
            .par_iter()
            .for_each(|(fqn, k)| self.sanitize_instance(over, fqn, k, &pmx));

        log::debug!("Finished {} sanitization", K::KIND);
        Ok(())
    }

    fn sanitize_instance(&self, over: bool, fqn: &str, k: &K, pmx: &PodsMetrics) {
        self.collector.init_outcome(fqn);
        self.check_deprecation(fqn, k);
        self.check_containers(fqn, k);
        k.check_workload(fqn, self.collector);
        self.check_utilization(over, fqn, k, pmx);
    }

    fn check_deprecation(&self, fqn: &str, k: &K) {
        let current = K::API_VERSION;
        match resolve_api_version(fqn, k.metadata()) {
            None => self.collector.add_code(
                codes::UNRESOLVED_API_VERSION,
                fqn,
                &[&"Unable to assert resource version"],
            ),
            Some(rev) if rev != current => self.collector.add_code(
                codes::DEPRECATED_API,
                fqn,
                &[&K::KIND, &rev, &current],
            ),
            Some(_) => {}
        }
    }

    fn check_containers(&self, fqn: &str, k: &K) {
        let Some(template) = k.template() else {
            return;
        };
        let Some(spec) = template.spec.as_ref() else {
            return;
        };

        let skip = SkipCodes::from_meta(template.metadata.as_ref());
        let c = ContainerSanitizer::new(self.collector, fqn);
        for co in spec.init_containers.iter().flatten() {
            c.sanitize(&skip, co, false);
        }
        for co in &spec.containers {
            c.sanitize(&skip, co, K::PROBE_POLICY.checks_probes());
        }
    }

    /// Aggregate requests and live usage over the pods `k` owns.
    pub fn usage(&self, k: &K, pmx: &PodsMetrics) -> ConsumptionMetrics {
        let mut mx = ConsumptionMetrics::default();
        let Some(selector) = k.selector() else {
            return mx;
        };

        let namespace = k.metadata().namespace.as_deref();
        for (pfqn, pod) in self.lister.list_pods_by_selector(namespace, selector) {
            mx.add_pod(pod, pmx.get(&pfqn).map(Vec::as_slice));
        }
        mx
    }

    fn check_utilization(&self, over: bool, fqn: &str, k: &K, pmx: &PodsMetrics) {
        let mx = self.usage(k, pmx);
        if mx.requests_zero() {
            return;
        }

        self.check_allocation(
            over,
            fqn,
            Allocation {
                current: as_mc(mx.current_cpu),
                requested: as_mc(mx.request_cpu),
                ratio: mx.req_cpu_ratio(),
                abs_ratio: mx.req_abs_cpu_ratio(),
                limits: self.lister.cpu_allocations(),
                under: codes::CPU_UNDER_ALLOCATED,
                over: codes::CPU_OVER_ALLOCATED,
            },
        );
        self.check_allocation(
            over,
            fqn,
            Allocation {
                current: as_mb(mx.current_mem),
                requested: as_mb(mx.request_mem),
                ratio: mx.req_mem_ratio(),
                abs_ratio: mx.req_abs_mem_ratio(),
                limits: self.lister.mem_allocations(),
                under: codes::MEM_UNDER_ALLOCATED,
                over: codes::MEM_OVER_ALLOCATED,
            },
        );
    }

    fn check_allocation(&self, over: bool, fqn: &str, a: Allocation) {
        if a.ratio > 100.0 && a.ratio > f64::from(a.limits.under_perc) {
            self.collector.add_code(
                a.under,
                fqn,
                &[&a.current, &a.requested, &as_perc(a.ratio)],
            );
        } else if over && a.ratio < f64::from(a.limits.over_perc) {
            self.collector.add_code(
                a.over,
                fqn,
                &[&a.current, &a.requested, &as_perc(a.abs_ratio)],
            );
        }
    }
}
