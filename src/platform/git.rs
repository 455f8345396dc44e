//! Version-control operations on the automation codebase.

use anyhow::Result;

use crate::error::CpupError;
use crate::exec::{CommandRunner, CommandSpec};

/// Checkout of a branch or ref in the working directory.
pub fn checkout(branch: &str) -> CommandSpec {
    CommandSpec::new("git").arg("checkout").arg(branch)
}

/// Name of the branch currently checked out in the working directory.
pub async fn current_branch<R: CommandRunner>(runner: &R) -> Result<String> {
    let spec = CommandSpec::new("git")
        .arg("rev-parse")
        .arg("--abbrev-ref")
        .arg("HEAD");

    let captured = runner.capture(&spec).await?;
    if !captured.status.success() {
        return Err(CpupError::BranchDetection(format!(
            "git rev-parse finished with {}",
            captured.status
        ))
        .into());
    }

    let branch = captured.stdout.trim();
    if branch.is_empty() {
        return Err(CpupError::BranchDetection("git rev-parse printed nothing".to_string()).into());
    }

    Ok(branch.to_string())
}
