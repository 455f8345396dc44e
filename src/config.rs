//! CLI configuration and argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::error::CpupError;
use crate::version::PlatformVersion;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const COMMIT: &str = env!("BUILD_COMMIT");
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Platform upgrade test orchestration CLI tool.
///
/// Converges a molecule scenario at the starting version of the automation
/// codebase, then replays the upgrade playbooks from the ending version
/// against the provisioned hosts, component by component.
#[derive(Parser, Debug, Clone)]
#[command(name = "cpup")]
#[command(about = "Platform upgrade test orchestration CLI tool")]
#[command(version = const_format::formatcp!(
    "{} (commit: {}, build date: {})",
    VERSION, COMMIT, BUILD_DATE
))]
pub struct Args {
    /// Branch of the automation codebase the environment is provisioned from
    #[arg(long, env = "START_BRANCH")]
    pub start_branch: String,

    /// Branch the upgrade playbooks run from (required unless --current-version)
    #[arg(long, env = "END_BRANCH")]
    pub end_branch: Option<String>,

    /// Test scenario to converge and tear down
    #[arg(long, env = "SCENARIO_NAME")]
    pub scenario: String,

    /// Platform version the environment starts at (e.g. 5.3)
    #[arg(long, env = "START_UPGRADE_VERSION")]
    pub start_version: String,

    /// Run the admin API configuration playbook after the component upgrades
    #[arg(long, env = "ADMIN_API", default_value = "false")]
    pub admin_api: bool,

    /// Use the currently checked-out branch as the end branch
    #[arg(long, env = "CURRENT_VERSION", default_value = "false")]
    pub current_version: bool,

    /// Skip the confirmation prompt
    #[arg(short, long, default_value = "false")]
    pub yes: bool,

    /// Show the step plan without executing
    #[arg(long, default_value = "false")]
    pub dry_run: bool,

    /// Scenario cache root (defaults to ~/.cache/molecule)
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", env = "CPUP_LOG_LEVEL")]
    pub log_level: String,
}

/// Application configuration derived from CLI args.
///
/// Built once at startup and read-only afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    pub start_branch: String,
    pub end_branch: Option<String>,
    pub scenario: String,
    pub start_version: PlatformVersion,
    pub admin_api: bool,
    pub current_version: bool,
    pub yes: bool,
    pub dry_run: bool,
    pub cache_dir: Option<PathBuf>,
    pub log_level: String,
}

impl Config {
    /// Validate CLI arguments into an immutable run configuration.
    ///
    /// Rejects a malformed start version and a missing end branch here,
    /// before anything external runs.
    pub fn from_args(args: Args) -> Result<Self, CpupError> {
        let start_version: PlatformVersion = args.start_version.parse()?;

        if args.end_branch.is_none() && !args.current_version {
            return Err(CpupError::MissingEndBranch);
        }

        Ok(Self {
            start_branch: args.start_branch,
            end_branch: args.end_branch,
            scenario: args.scenario,
            start_version,
            admin_api: args.admin_api,
            current_version: args.current_version,
            yes: args.yes,
            dry_run: args.dry_run,
            cache_dir: args.cache_dir,
            log_level: args.log_level,
        })
    }
}
