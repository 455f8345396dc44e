//! Scenario runner invocations and the inventory artifact they produce.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::error::CpupError;
use crate::exec::CommandSpec;

/// Provision and converge the named scenario.
pub fn converge(scenario: &str) -> CommandSpec {
    CommandSpec::new("molecule")
        .arg("converge")
        .arg("-s")
        .arg(scenario)
}

/// Tear the named scenario down.
pub fn destroy(scenario: &str) -> CommandSpec {
    CommandSpec::new("molecule")
        .arg("destroy")
        .arg("-s")
        .arg(scenario)
}

/// Cache root the scenario runner writes under when none is configured.
pub fn default_cache_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or(CpupError::NoHomeDir)?;
    Ok(home.join(".cache").join("molecule"))
}

/// Path of the inventory artifact the converge step produces.
///
/// Each upgrade playbook is pointed at this file; its contents are opaque
/// to cpup.
pub fn inventory_path(cache_dir: &Path, scenario: &str) -> PathBuf {
    cache_dir.join(scenario).join("inventory")
}
