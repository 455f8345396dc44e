//! Custom error types for cpup.

use thiserror::Error;

/// Errors that can occur while driving an upgrade test run.
#[derive(Error, Debug)]
pub enum CpupError {
    #[error("Invalid start version '{0}': expected <major>.<minor> (e.g. 5.3)")]
    InvalidVersion(String),

    #[error("--end-branch is required unless --current-version is set")]
    MissingEndBranch,

    #[error("Step '{step}' failed with exit code {code}")]
    StepFailed { step: String, code: i32 },

    #[error("Step '{step}' was terminated by a signal")]
    StepInterrupted { step: String },

    #[error("Failed to launch '{program}': {source}")]
    CommandLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not determine the current branch: {0}")]
    BranchDetection(String),

    #[error("Could not resolve the home directory for the scenario cache")]
    NoHomeDir,

    #[error("Operation cancelled by user")]
    UserCancelled,
}

impl CpupError {
    /// Process exit code a fatal error maps to.
    ///
    /// A failed step propagates the exit code of the external command that
    /// failed; everything else exits 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            CpupError::StepFailed { code, .. } => *code,
            _ => 1,
        }
    }
}
