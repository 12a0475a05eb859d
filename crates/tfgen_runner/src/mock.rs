//! Mock process runner for testing.
//!
//! Provides a configurable mock implementation of the ProcessRunner trait
//! for use in unit tests without spawning real processes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;

use crate::config::CommandConfig;
use crate::error::{RunnerError, RunnerResult};
use crate::runner::{ExecutionResult, ProcessRunner, NO_EXIT_CODE};

/// Predefined mock response for a process execution.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub exit_code: i64,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

impl MockResponse {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
            duration_ms: 10,
        }
    }

    pub fn failure(exit_code: i64, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
            duration_ms: 10,
        }
    }

    /// A process that was killed before it could report an exit code.
    pub fn killed() -> Self {
        Self::failure(NO_EXIT_CODE, "")
    }

    pub fn with_duration(mut self, ms: u64) -> Self {
        self.duration_ms = ms;
        self
    }
}

/// Captured call information for verification.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub program: String,
    pub args: Vec<String>,
}

impl CapturedCall {
    /// Full argv, program first.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }
}

/// Mock process runner for testing.
///
/// This runner captures all calls and returns predefined responses,
/// cycling through them when more calls are made than responses exist.
#[derive(Clone)]
pub struct MockRunner {
    /// Predefined responses for run_command calls.
    responses: Arc<RwLock<Vec<MockResponse>>>,
    /// Index of next response to return.
    response_index: Arc<AtomicUsize>,
    /// Captured calls for verification.
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
    /// Simulated spawn failure.
    simulate_failure: Arc<RwLock<Option<String>>>,
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRunner {
    /// Create a new mock runner.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(RwLock::new(Vec::new())),
            response_index: Arc::new(AtomicUsize::new(0)),
            captured_calls: Arc::new(RwLock::new(Vec::new())),
            simulate_failure: Arc::new(RwLock::new(None)),
        }
    }

    /// Add a mock response for the next run_command call.
    pub fn add_response(self, response: MockResponse) -> Self {
        self.responses.write().push(response);
        self
    }

    /// Set multiple responses.
    pub fn with_responses(self, responses: Vec<MockResponse>) -> Self {
        *self.responses.write() = responses;
        self
    }

    /// Make every call fail as if the program could not be spawned.
    pub fn simulate_failure(self, message: impl Into<String>) -> Self {
        *self.simulate_failure.write() = Some(message.into());
        self
    }

    /// Clear all captured calls.
    pub fn clear_calls(&self) {
        self.captured_calls.write().clear();
    }

    /// Get all captured calls.
    pub fn get_calls(&self) -> Vec<CapturedCall> {
        self.captured_calls.read().clone()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    /// Check if a specific program was invoked.
    pub fn was_called(&self, program: &str) -> bool {
        self.captured_calls
            .read()
            .iter()
            .any(|c| c.program == program)
    }

    fn next_response(&self) -> MockResponse {
        let responses = self.responses.read();
        if responses.is_empty() {
            return MockResponse::success("");
        }
        let index = self.response_index.fetch_add(1, Ordering::SeqCst);
        responses
            .get(index % responses.len())
            .cloned()
            .unwrap_or_else(|| MockResponse::success(""))
    }
}

impl ProcessRunner for MockRunner {
    fn run_command(&self, config: &CommandConfig) -> RunnerResult<ExecutionResult> {
        self.captured_calls.write().push(CapturedCall {
            program: config.program.clone(),
            args: config.args.clone(),
        });

        if let Some(msg) = self.simulate_failure.read().clone() {
            return Err(RunnerError::ExecutionFailed(msg));
        }

        let response = self.next_response();
        let started_at = Utc::now();
        let finished_at = started_at + chrono::Duration::milliseconds(response.duration_ms as i64);

        Ok(ExecutionResult {
            exit_code: response.exit_code,
            stdout: response.stdout,
            stderr: response.stderr,
            started_at,
            finished_at,
            duration_ms: response.duration_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_runner_basic() {
        let runner = MockRunner::new().add_response(MockResponse::success("Terraform v1.8.2"));

        let result = runner
            .run_and_capture(&["terraform".to_string(), "-version".to_string()])
            .unwrap();

        assert_eq!(result.exit_code, 0);
        assert_eq!(result.stdout, "Terraform v1.8.2");
    }

    #[test]
    fn test_mock_runner_captures_calls() {
        let runner = MockRunner::new();
        let config = CommandConfig::new("terraform").args(["plan", "-lock=false"]);

        let _ = runner.run_command(&config);

        let calls = runner.get_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].argv(),
            vec!["terraform".to_string(), "plan".to_string(), "-lock=false".to_string()]
        );
        assert!(runner.was_called("terraform"));
        assert!(!runner.was_called("terraform-provider-dynatrace"));

        runner.clear_calls();
        assert_eq!(runner.call_count(), 0);
    }

    #[test]
    fn test_mock_runner_failure_simulation() {
        let runner = MockRunner::new().simulate_failure("simulated error");
        let config = CommandConfig::new("terraform");

        assert!(runner.run_command(&config).is_err());
        assert_eq!(runner.call_count(), 1);
    }

    #[test]
    fn test_mock_runner_multiple_responses() {
        let runner = MockRunner::new().with_responses(vec![
            MockResponse::success("first"),
            MockResponse::failure(1, "second failed"),
            MockResponse::killed(),
        ]);
        let config = CommandConfig::new("terraform");

        let r1 = runner.run_command(&config).unwrap();
        assert_eq!(r1.stdout, "first");

        let r2 = runner.run_command(&config).unwrap();
        assert_eq!(r2.exit_code, 1);
        assert_eq!(r2.stderr, "second failed");

        let r3 = runner.run_command(&config).unwrap();
        assert!(!r3.exited());

        let r4 = runner.run_command(&config).unwrap();
        assert_eq!(r4.stdout, "first");
    }
}
