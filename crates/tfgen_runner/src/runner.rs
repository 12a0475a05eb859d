//! Process runner trait and types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::CommandConfig;
use crate::error::{RunnerError, RunnerResult};

/// Exit code recorded when the process ended without one (killed by a signal).
pub const NO_EXIT_CODE: i64 = -1;

/// Result of a process execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Exit code from the process, or [`NO_EXIT_CODE`]
    pub exit_code: i64,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
    /// Execution start time
    pub started_at: DateTime<Utc>,
    /// Execution end time
    pub finished_at: DateTime<Utc>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl ExecutionResult {
    /// Check if execution was successful (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Whether the process exited on its own rather than being killed.
    pub fn exited(&self) -> bool {
        self.exit_code != NO_EXIT_CODE
    }

    /// Get combined output (stdout + stderr).
    pub fn combined_output(&self) -> String {
        if self.stdout.is_empty() {
            self.stderr.clone()
        } else if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Blocking process runner.
///
/// A non-zero exit is reported through [`ExecutionResult::exit_code`], not as
/// an error. Errors are reserved for processes that could not be started.
pub trait ProcessRunner: Send + Sync {
    /// Run a command to completion and capture its output.
    fn run_command(&self, config: &CommandConfig) -> RunnerResult<ExecutionResult>;

    /// Run an argv-style command line and capture its output.
    fn run_and_capture(&self, argv: &[String]) -> RunnerResult<ExecutionResult> {
        let config = CommandConfig::from_argv(argv).ok_or(RunnerError::EmptyCommand)?;
        self.run_command(&config)
    }
}
