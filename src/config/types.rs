use crate::sanitize::listers::{AllocationLimits, PodLimits, ThresholdProvider};
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub allocations: AllocationsConfig,
    pub pod: PodConfig,
    /// Report over allocated controllers (codes 504 and 506)
    pub over_allocs: bool,
}

/// Controller request vs. usage thresholds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationsConfig {
    pub cpu: AllocationLimits,
    pub memory: AllocationLimits,
}

/// Per container thresholds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PodConfig {
    pub limits: PodLimits,
}

impl ThresholdProvider for Config {
    fn cpu_allocations(&self) -> AllocationLimits {
        self.allocations.cpu
    }

    fn mem_allocations(&self) -> AllocationLimits {
        self.allocations.memory
    }

    fn over_allocs(&self) -> bool {
        self.over_allocs
    }

    fn pod_limits(&self) -> PodLimits {
        self.pod.limits
    }
}
