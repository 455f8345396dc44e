//! cpup - Platform upgrade test orchestration CLI tool.
//!
//! Drives an end-to-end upgrade test for a multi-component streaming
//! platform: provision a molecule scenario at the starting version of the
//! automation codebase, check out the ending version, then run the
//! per-component upgrade playbooks in order against the provisioned
//! hosts, and finally tear the scenario down. The first failing external
//! command aborts the run and its exit code becomes ours.

mod config;
mod error;
mod exec;
mod output;
mod platform;
mod version;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use dialoguer::Confirm;
use tracing::{debug, error};

use config::{Args, Config};
use error::CpupError;
use exec::ProcessRunner;
use platform::{git, upgrade};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let config = match Config::from_args(args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    if let Err(e) = init_tracing(&config.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    debug!("Starting cpup - platform upgrade test orchestrator");

    if let Err(e) = run(&config).await {
        error!("{}", e);
        std::process::exit(exit_code_for(&e));
    }
}

/// Main application logic.
async fn run(config: &Config) -> Result<()> {
    let runner = ProcessRunner::new();

    let end_branch = if config.current_version {
        git::current_branch(&runner).await?
    } else {
        config
            .end_branch
            .clone()
            .ok_or(CpupError::MissingEndBranch)?
    };
    debug!("Effective end branch: {}", end_branch);

    let plan = upgrade::build_plan(config, &end_branch)?;
    output::print_plan(&plan);

    if config.dry_run {
        println!();
        println!("{}", "[DRY RUN] Upgrade test plan generated.".yellow());
        return Ok(());
    }

    if !config.yes {
        println!();
        let proceed = Confirm::new()
            .with_prompt(format!(
                "Run {} steps against scenario '{}'?",
                plan.scheduled_count(),
                plan.scenario
            ))
            .default(false)
            .interact()?;
        if !proceed {
            return Err(CpupError::UserCancelled.into());
        }
    }

    let summary = upgrade::execute(&runner, &plan).await?;
    output::print_summary(&summary);

    Ok(())
}

/// Initialize tracing subscriber.
fn init_tracing(log_level: &str) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| anyhow::anyhow!("Failed to initialize log filter: {}", e))?;

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}

/// Exit code for a failed run.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<CpupError>() {
        Some(e) => e.exit_code(),
        None => 1,
    }
}
