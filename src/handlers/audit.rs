//! Handler for the `audit` command.

use crate::audit::{self, AuditReport};
use crate::cli::AuditArgs;
use crate::cluster::live::LiveLoader;
use crate::cluster::{Cluster, ClusterSnapshot, yaml};
use crate::config::{self, types::Config};
use crate::error::Result;
use crate::formatter::format_report;
use std::path::Path;

/// Handle the `audit` command.
///
/// Returns whether the run should fail under `--fail-on`.
pub async fn handle_audit(args: &AuditArgs, config_path: Option<&Path>) -> Result<bool> {
    let cwd = std::env::current_dir()?;
    let mut config = config::load_config(config_path, Some(&cwd))?;
    if args.over_allocs {
        config.over_allocs = true;
    }

    let snapshot = load_snapshot(args).await?;
    let report = run_audit(&snapshot, &config);
    format_report(&report, args.format);

    Ok(args.fail_on.fails(report.max_severity()))
}

/// Audit a loaded snapshot.
pub fn run_audit(snapshot: &ClusterSnapshot, config: &Config) -> AuditReport {
    audit::run(&Cluster::new(snapshot, config))
}

async fn load_snapshot(args: &AuditArgs) -> Result<ClusterSnapshot> {
    if let Some(path) = &args.snapshot {
        log::info!("Loading snapshot from {}", path.display());
        return yaml::load_path(path);
    }

    let loader = match &args.context {
        Some(context) => LiveLoader::with_context(context).await?,
        None => LiveLoader::new().await?,
    };
    loader.snapshot(args.namespace.as_deref()).await
}
