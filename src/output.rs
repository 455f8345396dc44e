//! Terminal output formatting.

use colored::Colorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::platform::upgrade::{RunSummary, StepOutcome, UpgradePlan};

#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Step")]
    step: String,
    #[tabled(rename = "Command")]
    command: String,
    #[tabled(rename = "Status")]
    status: String,
}

/// Print the plan as a numbered table, skipped steps marked with reason.
pub fn print_plan(plan: &UpgradePlan) {
    println!();
    println!(
        "{}",
        format!(
            "Upgrade test plan: {} ({} -> {})",
            plan.scenario, plan.start_branch, plan.end_branch
        )
        .bold()
    );

    let rows: Vec<PlanRow> = plan
        .steps
        .iter()
        .enumerate()
        .map(|(i, step)| PlanRow {
            index: i + 1,
            step: step.name.to_string(),
            command: step.command.display(),
            status: match &step.skip_reason {
                Some(reason) => format!("skip ({})", reason),
                None => "run".to_string(),
            },
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{}", table);

    println!(
        "{} of {} steps scheduled",
        plan.scheduled_count(),
        plan.steps.len()
    );
}

/// Print the final run summary with per-step durations.
pub fn print_summary(summary: &RunSummary) {
    println!();
    println!("{}", "=".repeat(60));
    println!("{}", "Upgrade test complete".green().bold());
    println!(
        "Started: {}",
        summary.started_at.format("%Y-%m-%d %H:%M:%S")
    );

    for report in &summary.steps {
        match &report.outcome {
            StepOutcome::Completed { duration } => {
                println!(
                    "  {} {} ({})",
                    "✓".green(),
                    report.name,
                    format_duration(duration.as_secs())
                );
            }
            StepOutcome::Skipped { reason } => {
                println!(
                    "  {}",
                    format!("- {} (skipped: {})", report.name, reason).dimmed()
                );
            }
        }
    }

    println!(
        "Total time: {}",
        format_duration(summary.total.as_secs())
    );
    println!("{}", "=".repeat(60));
}

/// Format seconds into a human-readable duration string.
fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
