//! Upgrade playbook invocations.
//!
//! The playbooks themselves are opaque; cpup only knows their file names,
//! the inventory they run against, and their exit status.

use std::path::Path;

use crate::exec::CommandSpec;

pub const ZOOKEEPER: &str = "upgrade_zookeeper.yml";
pub const KAFKA_BROKER: &str = "upgrade_kafka_broker.yml";
pub const SCHEMA_REGISTRY: &str = "upgrade_schema_registry.yml";
pub const KAFKA_CONNECT: &str = "upgrade_kafka_connect.yml";
pub const KSQL: &str = "upgrade_ksql.yml";
pub const KAFKA_REST: &str = "upgrade_kafka_rest.yml";
pub const CONTROL_CENTER: &str = "upgrade_control_center.yml";
pub const KAFKA_BROKER_LOG_FORMAT: &str = "upgrade_kafka_broker_log_format.yml";
pub const ADMIN_API: &str = "upgrade_admin_api.yml";

/// `ansible-playbook` invocation against the scenario inventory.
pub fn run(inventory: &Path, playbook: &str) -> CommandSpec {
    CommandSpec::new("ansible-playbook")
        .arg("-i")
        .arg(inventory.display().to_string())
        .arg(playbook)
}

/// Same as [`run`], with a single `-e key=value` extra variable.
pub fn run_with_extra_var(
    inventory: &Path,
    playbook: &str,
    key: &str,
    value: &str,
) -> CommandSpec {
    run(inventory, playbook)
        .arg("-e")
        .arg(format!("{}={}", key, value))
}
