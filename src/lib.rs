//! # workload-audit
//!
//! Sanitizes Kubernetes workloads for common misconfigurations.
//!
//! Daemon sets, deployments and pods are checked for untagged or `latest`
//! images, missing probes and resources, unnamed ports, deprecated API
//! groups and zero scale. With pod metrics available, declared CPU and
//! memory are compared with live usage.
//!
//! ## Example
//!
//! ```rust,no_run
//! use workload_audit::{audit, cluster::{yaml, Cluster}, config::types::Config};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let snapshot = yaml::load_path(Path::new("./cluster.yaml"))?;
//! let config = Config::default();
//! let report = audit::run(&Cluster::new(&snapshot, &config));
//! println!("{:?}", report.max_severity());
//! # Ok(())
//! # }
//! ```

pub mod audit;
pub mod cli;
pub mod cluster;
pub mod config;
pub mod error;
pub mod formatter;
pub mod handlers;
pub mod sanitize;

// Re-export commonly used types and functions
pub use audit::{AuditReport, SectionReport};
pub use error::{AuditError, Result};
pub use handlers::{handle_audit, handle_codes};
pub use sanitize::{Collector, Issue, IssueCode, Outcome, Severity};
