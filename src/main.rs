use anyhow::Context;
use clap::Parser;
use std::process;
use workload_audit::cli::{Cli, Commands};
use workload_audit::handlers::{handle_audit, handle_codes};

#[tokio::main]
async fn main() {
    match run().await {
        Ok(true) => process::exit(1),
        Ok(false) => {}
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(2);
        }
    }
}

/// Returns whether the audit found issues at or above `--fail-on`.
async fn run() -> anyhow::Result<bool> {
    let cli = Cli::parse();
    cli.init_logging();

    match &cli.command {
        Commands::Audit(args) => handle_audit(args, cli.config.as_deref())
            .await
            .context("audit failed"),
        Commands::Codes => {
            handle_codes();
            Ok(false)
        }
    }
}
