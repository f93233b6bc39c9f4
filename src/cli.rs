use crate::formatter::OutputFormat;
use crate::sanitize::types::Severity;
use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "workload-audit")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Sanitize Kubernetes workloads for common misconfigurations")]
#[command(long_about = "Audits daemon sets, deployments and pods from a YAML snapshot or a live cluster. Reports untagged images, missing probes and resources, deprecated API groups, zero scale and CPU/memory allocations that drift from live usage.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Audit workloads and report issues
    Audit(AuditArgs),

    /// List every issue code with its severity and message
    Codes,
}

#[derive(Args, Debug, Clone)]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .args(["snapshot", "live", "context"]),
))]
pub struct AuditArgs {
    /// YAML file or directory of manifests and pod metrics
    #[arg(short, long, value_name = "PATH")]
    pub snapshot: Option<PathBuf>,

    /// Audit the cluster of the current kubeconfig context
    #[arg(long)]
    pub live: bool,

    /// Audit the cluster of a named kubeconfig context
    #[arg(long, value_name = "NAME")]
    pub context: Option<String>,

    /// Restrict a live audit to one namespace
    #[arg(short, long, value_name = "NAMESPACE")]
    pub namespace: Option<String>,

    /// Also report over allocated CPU and memory
    #[arg(long)]
    pub over_allocs: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,

    /// Exit with a non-zero code when an issue of this severity or higher is found
    #[arg(long, value_enum, default_value = "error")]
    pub fail_on: FailOn,
}

impl AuditArgs {
    /// Whether the audit reads from a cluster rather than a snapshot.
    pub fn is_live(&self) -> bool {
        self.live || self.context.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FailOn {
    Error,
    Warning,
    Info,
    Never,
}

impl FailOn {
    /// Whether a run with this highest severity should fail.
    pub fn fails(&self, max: Option<Severity>) -> bool {
        let threshold = match self {
            Self::Error => Severity::Error,
            Self::Warning => Severity::Warning,
            Self::Info => Severity::Info,
            Self::Never => return false,
        };
        max.is_some_and(|s| s >= threshold)
    }
}

impl Cli {
    /// Initialize logging based on verbosity level
    pub fn init_logging(&self) {
        if self.quiet {
            return;
        }

        let level = match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };

        env_logger::Builder::from_default_env()
            .filter_level(level)
            .init();
    }
}
