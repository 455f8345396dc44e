//! Upgrade test sequencing.
//!
//! A run is planned up front as a fixed, ordered list of steps; gated
//! steps stay in the plan with the reason they will not run. Execution
//! then walks the list strictly in order, stopping at the first failing
//! external command. There is no rollback and no retry; scenario teardown
//! is itself the last step and is only reached when everything before it
//! succeeded.

use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Local};
use colored::Colorize;
use tracing::info;

use super::{git, molecule, playbook};
use crate::config::Config;
use crate::error::CpupError;
use crate::exec::{CommandRunner, CommandSpec, CommandStatus};
use crate::version::KSQL_REMOVED_VERSION;

/// One entry of the upgrade test plan.
#[derive(Debug, Clone)]
pub struct UpgradeStep {
    pub name: &'static str,
    pub command: CommandSpec,
    /// Present when the step is carried for display only and will not run.
    pub skip_reason: Option<String>,
}

impl UpgradeStep {
    fn run(name: &'static str, command: CommandSpec) -> Self {
        Self {
            name,
            command,
            skip_reason: None,
        }
    }

    fn skip(name: &'static str, command: CommandSpec, reason: impl Into<String>) -> Self {
        Self {
            name,
            command,
            skip_reason: Some(reason.into()),
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.skip_reason.is_none()
    }
}

/// Ordered step list for one upgrade test run.
#[derive(Debug, Clone)]
pub struct UpgradePlan {
    pub scenario: String,
    pub start_branch: String,
    pub end_branch: String,
    pub steps: Vec<UpgradeStep>,
}

impl UpgradePlan {
    /// Number of steps that will actually execute.
    pub fn scheduled_count(&self) -> usize {
        self.steps.iter().filter(|s| s.is_scheduled()).count()
    }
}

/// Build the fixed step sequence for the given configuration.
///
/// `end_branch` is the already-resolved branch the upgrade playbooks run
/// from (see [`git::current_branch`] for the --current-version path).
pub fn build_plan(config: &Config, end_branch: &str) -> Result<UpgradePlan> {
    let cache_dir = match &config.cache_dir {
        Some(dir) => dir.clone(),
        None => molecule::default_cache_dir()?,
    };
    let inventory = molecule::inventory_path(&cache_dir, &config.scenario);

    let mut steps = Vec::with_capacity(13);

    steps.push(UpgradeStep::run(
        "checkout start branch",
        git::checkout(&config.start_branch),
    ));
    steps.push(UpgradeStep::run(
        "converge scenario",
        molecule::converge(&config.scenario),
    ));
    steps.push(UpgradeStep::run(
        "checkout end branch",
        git::checkout(end_branch),
    ));

    steps.push(UpgradeStep::run(
        "upgrade zookeeper",
        playbook::run(&inventory, playbook::ZOOKEEPER),
    ));
    steps.push(UpgradeStep::run(
        "upgrade kafka broker",
        playbook::run_with_extra_var(
            &inventory,
            playbook::KAFKA_BROKER,
            "kafka_broker_upgrade_start_version",
            &config.start_version.to_string(),
        ),
    ));
    steps.push(UpgradeStep::run(
        "upgrade schema registry",
        playbook::run(&inventory, playbook::SCHEMA_REGISTRY),
    ));
    steps.push(UpgradeStep::run(
        "upgrade kafka connect",
        playbook::run(&inventory, playbook::KAFKA_CONNECT),
    ));

    let ksql = playbook::run(&inventory, playbook::KSQL);
    steps.push(if config.start_version.needs_standalone_ksql_upgrade() {
        UpgradeStep::run("upgrade ksql", ksql)
    } else {
        UpgradeStep::skip(
            "upgrade ksql",
            ksql,
            format!(
                "start version {} is {} or later",
                config.start_version, KSQL_REMOVED_VERSION
            ),
        )
    });

    steps.push(UpgradeStep::run(
        "upgrade kafka rest",
        playbook::run(&inventory, playbook::KAFKA_REST),
    ));
    steps.push(UpgradeStep::run(
        "upgrade control center",
        playbook::run(&inventory, playbook::CONTROL_CENTER),
    ));
    steps.push(UpgradeStep::run(
        "upgrade broker log format",
        playbook::run(&inventory, playbook::KAFKA_BROKER_LOG_FORMAT),
    ));

    let admin_api = playbook::run(&inventory, playbook::ADMIN_API);
    steps.push(if config.admin_api {
        UpgradeStep::run("configure admin api", admin_api)
    } else {
        UpgradeStep::skip("configure admin api", admin_api, "admin API not requested")
    });

    steps.push(UpgradeStep::run(
        "destroy scenario",
        molecule::destroy(&config.scenario),
    ));

    Ok(UpgradePlan {
        scenario: config.scenario.clone(),
        start_branch: config.start_branch.clone(),
        end_branch: end_branch.to_string(),
        steps,
    })
}

/// Outcome of a single step in a finished run.
#[derive(Debug, Clone)]
pub enum StepOutcome {
    Completed { duration: Duration },
    Skipped { reason: String },
}

/// Per-step record of a finished run.
#[derive(Debug, Clone)]
pub struct StepReport {
    pub name: &'static str,
    pub outcome: StepOutcome,
}

/// Result of a run in which every scheduled step succeeded.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Local>,
    pub steps: Vec<StepReport>,
    pub total: Duration,
}

/// Execute the plan strictly in order, stopping at the first failure.
///
/// Skipped steps execute nothing and count as vacuously successful. The
/// first non-zero exit aborts the run with [`CpupError::StepFailed`]
/// carrying that step's exit code.
pub async fn execute<R: CommandRunner>(runner: &R, plan: &UpgradePlan) -> Result<RunSummary> {
    let started_at = Local::now();
    let run_start = Instant::now();
    let total = plan.steps.len();
    let mut reports = Vec::with_capacity(total);

    for (index, step) in plan.steps.iter().enumerate() {
        println!();
        let header = format!("Step [{}/{}]: {}", index + 1, total, step.name);

        if let Some(reason) = &step.skip_reason {
            println!("{}", format!("{} [SKIPPED: {}]", header, reason).dimmed());
            info!("Skipping {}: {}", step.name, reason);
            reports.push(StepReport {
                name: step.name,
                outcome: StepOutcome::Skipped {
                    reason: reason.clone(),
                },
            });
            continue;
        }

        println!("{}", header.cyan().bold());
        let step_start = Instant::now();

        match runner.status(&step.command).await? {
            CommandStatus::Exited(0) => {
                let duration = step_start.elapsed();
                println!("  {} Done", "✓".green());
                reports.push(StepReport {
                    name: step.name,
                    outcome: StepOutcome::Completed { duration },
                });
            }
            CommandStatus::Exited(code) => {
                return Err(CpupError::StepFailed {
                    step: step.name.to_string(),
                    code,
                }
                .into());
            }
            CommandStatus::Interrupted => {
                return Err(CpupError::StepInterrupted {
                    step: step.name.to_string(),
                }
                .into());
            }
        }
    }

    Ok(RunSummary {
        started_at,
        steps: reports,
        total: run_start.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::exec::testing::ScriptedRunner;
    use crate::version::PlatformVersion;

    fn test_config(start_version: &str, admin_api: bool) -> Config {
        Config {
            start_branch: "6.0.x".to_string(),
            end_branch: Some("7.0.x".to_string()),
            scenario: "upgrade-zk-kafka".to_string(),
            start_version: start_version.parse::<PlatformVersion>().unwrap(),
            admin_api,
            current_version: false,
            yes: true,
            dry_run: false,
            cache_dir: Some(PathBuf::from("/cache")),
            log_level: "warn".to_string(),
        }
    }

    fn step_names(plan: &UpgradePlan) -> Vec<&'static str> {
        plan.steps.iter().map(|s| s.name).collect()
    }

    #[test]
    fn test_plan_has_fixed_step_order() {
        let plan = build_plan(&test_config("5.3", true), "7.0.x").unwrap();
        assert_eq!(
            step_names(&plan),
            vec![
                "checkout start branch",
                "converge scenario",
                "checkout end branch",
                "upgrade zookeeper",
                "upgrade kafka broker",
                "upgrade schema registry",
                "upgrade kafka connect",
                "upgrade ksql",
                "upgrade kafka rest",
                "upgrade control center",
                "upgrade broker log format",
                "configure admin api",
                "destroy scenario",
            ]
        );
    }

    #[test]
    fn test_plan_commands_end_to_end() {
        let plan = build_plan(&test_config("5.3", true), "7.0.x").unwrap();
        let commands: Vec<String> = plan.steps.iter().map(|s| s.command.display()).collect();
        assert_eq!(
            commands,
            vec![
                "git checkout 6.0.x",
                "molecule converge -s upgrade-zk-kafka",
                "git checkout 7.0.x",
                "ansible-playbook -i /cache/upgrade-zk-kafka/inventory upgrade_zookeeper.yml",
                "ansible-playbook -i /cache/upgrade-zk-kafka/inventory upgrade_kafka_broker.yml \
                 -e kafka_broker_upgrade_start_version=5.3",
                "ansible-playbook -i /cache/upgrade-zk-kafka/inventory upgrade_schema_registry.yml",
                "ansible-playbook -i /cache/upgrade-zk-kafka/inventory upgrade_kafka_connect.yml",
                "ansible-playbook -i /cache/upgrade-zk-kafka/inventory upgrade_ksql.yml",
                "ansible-playbook -i /cache/upgrade-zk-kafka/inventory upgrade_kafka_rest.yml",
                "ansible-playbook -i /cache/upgrade-zk-kafka/inventory upgrade_control_center.yml",
                "ansible-playbook -i /cache/upgrade-zk-kafka/inventory \
                 upgrade_kafka_broker_log_format.yml",
                "ansible-playbook -i /cache/upgrade-zk-kafka/inventory upgrade_admin_api.yml",
                "molecule destroy -s upgrade-zk-kafka",
            ]
        );
        // Everything is scheduled in this configuration.
        assert_eq!(plan.scheduled_count(), plan.steps.len());
    }

    fn ksql_step(plan: &UpgradePlan) -> &UpgradeStep {
        plan.steps.iter().find(|s| s.name == "upgrade ksql").unwrap()
    }

    #[test]
    fn test_ksql_scheduled_below_removal_version() {
        for start in ["5.3", "4.9"] {
            let plan = build_plan(&test_config(start, false), "7.0.x").unwrap();
            assert!(ksql_step(&plan).is_scheduled(), "start={}", start);
        }
    }

    #[test]
    fn test_ksql_skipped_at_and_above_removal_version() {
        for start in ["5.4", "5.5", "6.0"] {
            let plan = build_plan(&test_config(start, false), "7.0.x").unwrap();
            let step = ksql_step(&plan);
            assert!(!step.is_scheduled(), "start={}", start);
            assert!(step.skip_reason.as_ref().unwrap().contains("5.4"));
        }
    }

    #[test]
    fn test_admin_api_scheduled_between_log_format_and_destroy() {
        let plan = build_plan(&test_config("5.3", true), "7.0.x").unwrap();
        let names = step_names(&plan);
        let admin = names.iter().position(|n| *n == "configure admin api").unwrap();
        assert!(plan.steps[admin].is_scheduled());
        assert_eq!(names[admin - 1], "upgrade broker log format");
        assert_eq!(names[admin + 1], "destroy scenario");
        assert_eq!(
            names.iter().filter(|n| **n == "configure admin api").count(),
            1
        );
    }

    #[test]
    fn test_admin_api_carried_as_skipped_when_disabled() {
        let plan = build_plan(&test_config("5.3", false), "7.0.x").unwrap();
        let step = plan
            .steps
            .iter()
            .find(|s| s.name == "configure admin api")
            .unwrap();
        assert!(!step.is_scheduled());
    }

    #[tokio::test]
    async fn test_execute_runs_scheduled_steps_in_order() {
        let plan = build_plan(&test_config("5.3", true), "7.0.x").unwrap();
        let runner = ScriptedRunner::ok();

        let summary = execute(&runner, &plan).await.unwrap();

        let expected: Vec<String> = plan.steps.iter().map(|s| s.command.display()).collect();
        assert_eq!(runner.calls(), expected);
        assert_eq!(summary.steps.len(), plan.steps.len());
        assert!(summary
            .steps
            .iter()
            .all(|r| matches!(r.outcome, StepOutcome::Completed { .. })));
    }

    #[tokio::test]
    async fn test_execute_does_not_invoke_skipped_steps() {
        // 6.0 start: ksql gated off; admin api disabled.
        let plan = build_plan(&test_config("6.0", false), "7.0.x").unwrap();
        let runner = ScriptedRunner::ok();

        let summary = execute(&runner, &plan).await.unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), plan.scheduled_count());
        assert!(calls.iter().all(|c| !c.contains("upgrade_ksql.yml")));
        assert!(calls.iter().all(|c| !c.contains("upgrade_admin_api.yml")));

        // Skipped steps still report, as vacuously successful.
        let skipped: Vec<&str> = summary
            .steps
            .iter()
            .filter(|r| matches!(r.outcome, StepOutcome::Skipped { .. }))
            .map(|r| r.name)
            .collect();
        assert_eq!(skipped, vec!["upgrade ksql", "configure admin api"]);
    }

    #[tokio::test]
    async fn test_execute_halts_on_first_failure() {
        let plan = build_plan(&test_config("5.3", true), "7.0.x").unwrap();
        let runner = ScriptedRunner::failing_on("upgrade_schema_registry.yml", 2);

        let err = execute(&runner, &plan).await.unwrap_err();
        let cpup_err = err.downcast_ref::<CpupError>().unwrap();
        assert!(matches!(
            cpup_err,
            CpupError::StepFailed { code: 2, .. }
        ));
        assert_eq!(cpup_err.exit_code(), 2);

        // Nothing after the failing step ran; teardown was never reached.
        let calls = runner.calls();
        assert!(calls.last().unwrap().contains("upgrade_schema_registry.yml"));
        assert!(calls.iter().all(|c| !c.contains("molecule destroy")));
    }

    #[tokio::test]
    async fn test_execute_propagates_failing_converge() {
        let plan = build_plan(&test_config("5.3", true), "7.0.x").unwrap();
        let runner = ScriptedRunner::failing_on("molecule converge", 137);

        let err = execute(&runner, &plan).await.unwrap_err();
        let cpup_err = err.downcast_ref::<CpupError>().unwrap();
        assert_eq!(cpup_err.exit_code(), 137);
        assert_eq!(runner.calls().len(), 2);
    }
}
