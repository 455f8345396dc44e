//! External process execution.
//!
//! Every action the sequencer takes is an external command. [`CommandSpec`]
//! describes one invocation, [`CommandRunner`] executes it; the production
//! implementation spawns real processes while tests substitute a scripted
//! runner to observe invocation order.

use std::process::Stdio;

use anyhow::Result;
use tracing::debug;

use crate::error::CpupError;

/// A fully-resolved external command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Shell-style rendering for logs and the plan table.
    pub fn display(&self) -> String {
        let mut rendered = self.program.clone();
        for arg in &self.args {
            rendered.push(' ');
            if arg.contains(' ') {
                rendered.push('\'');
                rendered.push_str(arg);
                rendered.push('\'');
            } else {
                rendered.push_str(arg);
            }
        }
        rendered
    }
}

/// Exit information from a finished external command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    /// Exited normally with the given code.
    Exited(i32),
    /// Terminated without an exit code (killed by a signal).
    Interrupted,
}

impl CommandStatus {
    pub fn success(&self) -> bool {
        matches!(self, CommandStatus::Exited(0))
    }
}

impl std::fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandStatus::Exited(code) => write!(f, "exit code {}", code),
            CommandStatus::Interrupted => write!(f, "terminated by signal"),
        }
    }
}

/// Output captured from a finished external command.
#[derive(Debug, Clone)]
pub struct Captured {
    pub status: CommandStatus,
    pub stdout: String,
}

/// Executes external commands on behalf of the sequencer.
pub trait CommandRunner {
    /// Run a command with inherited standard streams, returning its exit
    /// status once it completes.
    async fn status(&self, spec: &CommandSpec) -> Result<CommandStatus>;

    /// Run a command and capture its standard output.
    async fn capture(&self, spec: &CommandSpec) -> Result<Captured>;
}

/// Spawns real processes, blocking the sequencer until each completes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    fn command(spec: &CommandSpec) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&spec.program);
        cmd.args(&spec.args);
        cmd
    }
}

impl CommandRunner for ProcessRunner {
    async fn status(&self, spec: &CommandSpec) -> Result<CommandStatus> {
        debug!("Running: {}", spec.display());

        let status = Self::command(spec)
            .status()
            .await
            .map_err(|source| CpupError::CommandLaunch {
                program: spec.program.clone(),
                source,
            })?;

        Ok(to_command_status(status))
    }

    async fn capture(&self, spec: &CommandSpec) -> Result<Captured> {
        debug!("Running (captured): {}", spec.display());

        let output = Self::command(spec)
            .stdout(Stdio::piped())
            .output()
            .await
            .map_err(|source| CpupError::CommandLaunch {
                program: spec.program.clone(),
                source,
            })?;

        Ok(Captured {
            status: to_command_status(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

fn to_command_status(status: std::process::ExitStatus) -> CommandStatus {
    match status.code() {
        Some(code) => CommandStatus::Exited(code),
        None => CommandStatus::Interrupted,
    }
}
