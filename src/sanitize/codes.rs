//! Issue taxonomy.
//!
//! Every issue code is bound to a message template and a default severity.
//! Templates use `{}` placeholders filled positionally at record time.

use crate::sanitize::types::{IssueCode, Severity};
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

// Container checks.
pub const UNTAGGED_IMAGE: IssueCode = IssueCode(100);
pub const LATEST_TAG: IssueCode = IssueCode(101);
pub const NO_PROBES: IssueCode = IssueCode(102);
pub const NO_LIVENESS_PROBE: IssueCode = IssueCode(103);
pub const NO_READINESS_PROBE: IssueCode = IssueCode(104);
pub const NUMERIC_PROBE_PORT: IssueCode = IssueCode(105);
pub const NO_RESOURCES: IssueCode = IssueCode(106);
pub const NO_LIMITS: IssueCode = IssueCode(107);
pub const UNNAMED_PORT: IssueCode = IssueCode(108);

// Container utilization, by QOS class.
pub const BURSTABLE_CPU_THRESHOLD: IssueCode = IssueCode(109);
pub const BURSTABLE_MEM_THRESHOLD: IssueCode = IssueCode(110);
pub const GUARANTEED_CPU_THRESHOLD: IssueCode = IssueCode(111);
pub const GUARANTEED_MEM_THRESHOLD: IssueCode = IssueCode(112);

// API deprecation.
pub const DEPRECATED_API: IssueCode = IssueCode(403);
pub const UNRESOLVED_API_VERSION: IssueCode = IssueCode(404);

// Controllers.
pub const ZERO_SCALE: IssueCode = IssueCode(500);
pub const NO_AVAILABLE_REPLICAS: IssueCode = IssueCode(501);
pub const CPU_UNDER_ALLOCATED: IssueCode = IssueCode(503);
pub const CPU_OVER_ALLOCATED: IssueCode = IssueCode(504);
pub const MEM_UNDER_ALLOCATED: IssueCode = IssueCode(505);
pub const MEM_OVER_ALLOCATED: IssueCode = IssueCode(506);

/// Template and default severity for one code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeSpec {
    pub message: &'static str,
    pub severity: Severity,
}

impl CodeSpec {
    const fn new(message: &'static str, severity: Severity) -> Self {
        Self { message, severity }
    }

    /// Number of positional placeholders in the template.
    pub fn arity(&self) -> usize {
        self.message.matches("{}").count()
    }

    /// Render the template with positional arguments.
    ///
    /// Callers must pass exactly [`CodeSpec::arity`] arguments.
    pub fn render(&self, args: &[&dyn fmt::Display]) -> String {
        debug_assert_eq!(
            self.arity(),
            args.len(),
            "argument count mismatch for template {:?}",
            self.message
        );

        let mut out = String::with_capacity(self.message.len() + 16);
        let mut args = args.iter();
        let mut parts = self.message.split("{}").peekable();
        while let Some(part) = parts.next() {
            out.push_str(part);
            if parts.peek().is_some() {
                if let Some(arg) = args.next() {
                    out.push_str(&arg.to_string());
                }
            }
        }
        out
    }
}

static REGISTRY: OnceLock<HashMap<IssueCode, CodeSpec>> = OnceLock::new();

/// Get the code registry, initializing if needed.
pub fn registry() -> &'static HashMap<IssueCode, CodeSpec> {
    REGISTRY.get_or_init(|| {
        use Severity::*;

        HashMap::from([
            (UNTAGGED_IMAGE, CodeSpec::new("Untagged docker image in use", Error)),
            (LATEST_TAG, CodeSpec::new("Image tagged \"latest\" in use", Warning)),
            (NO_PROBES, CodeSpec::new("No probes defined", Warning)),
            (NO_LIVENESS_PROBE, CodeSpec::new("No liveness probe", Warning)),
            (NO_READINESS_PROBE, CodeSpec::new("No readiness probe", Warning)),
            (
                NUMERIC_PROBE_PORT,
                CodeSpec::new("{} probe uses a port#, prefer a named port", Info),
            ),
            (
                NO_RESOURCES,
                CodeSpec::new("No resources requests/limits defined", Warning),
            ),
            (NO_LIMITS, CodeSpec::new("No resource limits defined", Warning)),
            (UNNAMED_PORT, CodeSpec::new("Unnamed port {}", Info)),
            (
                BURSTABLE_CPU_THRESHOLD,
                CodeSpec::new(
                    "CPU Current/Request ({}/{}) reached user {}% threshold ({}%)",
                    Warning,
                ),
            ),
            (
                BURSTABLE_MEM_THRESHOLD,
                CodeSpec::new(
                    "Memory Current/Request ({}/{}) reached user {}% threshold ({}%)",
                    Warning,
                ),
            ),
            (
                GUARANTEED_CPU_THRESHOLD,
                CodeSpec::new(
                    "CPU Current/Limit ({}/{}) reached user {}% threshold ({}%)",
                    Error,
                ),
            ),
            (
                GUARANTEED_MEM_THRESHOLD,
                CodeSpec::new(
                    "Memory Current/Limit ({}/{}) reached user {}% threshold ({}%)",
                    Error,
                ),
            ),
            (
                DEPRECATED_API,
                CodeSpec::new("Deprecated {} API group \"{}\". Use \"{}\" instead", Warning),
            ),
            (
                UNRESOLVED_API_VERSION,
                CodeSpec::new("Deprecation check failed. {}", Error),
            ),
            (ZERO_SCALE, CodeSpec::new("Zero scale detected", Warning)),
            (
                NO_AVAILABLE_REPLICAS,
                CodeSpec::new("Used? No available replicas found", Info),
            ),
            (
                CPU_UNDER_ALLOCATED,
                CodeSpec::new(
                    "At current load, CPU under allocated. Current:{} vs Requested:{} ({})",
                    Warning,
                ),
            ),
            (
                CPU_OVER_ALLOCATED,
                CodeSpec::new(
                    "At current load, CPU over allocated. Current:{} vs Requested:{} ({})",
                    Info,
                ),
            ),
            (
                MEM_UNDER_ALLOCATED,
                CodeSpec::new(
                    "At current load, Memory under allocated. Current:{} vs Requested:{} ({})",
                    Warning,
                ),
            ),
            (
                MEM_OVER_ALLOCATED,
                CodeSpec::new(
                    "At current load, Memory over allocated. Current:{} vs Requested:{} ({})",
                    Info,
                ),
            ),
        ])
    })
}

/// Look up a code.
pub fn lookup(code: IssueCode) -> Option<&'static CodeSpec> {
    registry().get(&code)
}

/// All registered codes, in ascending order.
pub fn list_codes() -> Vec<(IssueCode, &'static CodeSpec)> {
    let mut codes: Vec<_> = registry().iter().map(|(c, s)| (*c, s)).collect();
    codes.sort_by_key(|(c, _)| *c);
    codes
}
