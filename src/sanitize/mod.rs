//! Workload sanitizers.
//!
//! Rule checks over daemon sets, deployments and pods. Findings are recorded
//! in a [`Collector`] as issues with a stable numeric code and a severity.
//!
//! # Issue codes
//!
//! | Range | Concern |
//! |-------|---------|
//! | 100-108 | Container image, probes, resources, ports |
//! | 109-112 | Container utilization by QOS class |
//! | 403-404 | API version deprecation |
//! | 500-506 | Controller replicas and utilization |
//!
//! # Suppression
//!
//! A pod template (or pod) annotated with `workload-audit.io/skip-codes`
//! suppresses the listed codes for its container checks. Controller level
//! codes are never suppressed.

pub mod codes;
pub mod collector;
pub mod container;
pub mod daemonset;
pub mod deployment;
pub mod deprecation;
pub mod listers;
pub mod metrics;
pub mod pod;
pub mod pragma;
pub mod quantity;
pub mod types;
pub mod workload;

pub use collector::Collector;
pub use daemonset::DaemonSetSanitizer;
pub use deployment::DeploymentSanitizer;
pub use listers::{
    AllocationLimits, ControllerLister, InstanceLister, PodLimits, PodLister, PodSelectorLister,
    PodsMetricsLister, ThresholdProvider,
};
pub use pod::PodSanitizer;
pub use pragma::SkipCodes;
pub use types::{Issue, IssueCode, Outcome, Severity, SeverityCounts};
pub use workload::{ControllerSanitizer, ProbePolicy, Workload};
