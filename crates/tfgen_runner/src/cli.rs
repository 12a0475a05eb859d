//! Runner that spawns real child processes.

use std::process::{Command, Stdio};

use chrono::Utc;
use tracing::{debug, warn};

use crate::config::CommandConfig;
use crate::error::{RunnerError, RunnerResult};
use crate::runner::{ExecutionResult, ProcessRunner, NO_EXIT_CODE};

/// Process runner backed by [`std::process::Command`].
///
/// Blocks until the child exits. There is no timeout; a hung child blocks
/// the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct CliRunner;

impl CliRunner {
    pub fn new() -> Self {
        Self
    }

    fn build_command(config: &CommandConfig) -> Command {
        let mut cmd = Command::new(&config.program);
        cmd.args(&config.args);
        cmd.stdin(Stdio::null());
        cmd
    }
}

impl ProcessRunner for CliRunner {
    fn run_command(&self, config: &CommandConfig) -> RunnerResult<ExecutionResult> {
        debug!("Executing: {}", config.display_line());

        let started_at = Utc::now();
        let output = Self::build_command(config)
            .output()
            .map_err(|source| RunnerError::SpawnFailed {
                program: config.program.clone(),
                source,
            })?;
        let finished_at = Utc::now();
        let duration_ms = (finished_at - started_at).num_milliseconds().max(0) as u64;

        let exit_code = output.status.code().map(i64::from).unwrap_or(NO_EXIT_CODE);
        if exit_code == NO_EXIT_CODE {
            warn!("{} terminated without an exit code", config.program);
        } else {
            debug!(
                "{} exited with code {} after {}ms",
                config.program, exit_code, duration_ms
            );
        }

        Ok(ExecutionResult {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            started_at,
            finished_at,
            duration_ms,
        })
    }
}
