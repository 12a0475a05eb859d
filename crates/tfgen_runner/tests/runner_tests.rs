//! Integration tests for the process execution layer.

use tfgen_runner::{
    CliRunner, CommandConfig, MockResponse, MockRunner, ProcessRunner, RunnerError,
};

/// Runners are used behind trait objects by the tooling layer.
fn version_output(runner: &dyn ProcessRunner, program: &str) -> Option<String> {
    let argv = vec![program.to_string(), "-version".to_string()];
    runner
        .run_and_capture(&argv)
        .ok()
        .filter(|r| r.success())
        .map(|r| r.combined_output())
}

#[test]
fn test_mock_runner_behind_trait_object() {
    let runner = MockRunner::new().add_response(MockResponse::success("Terraform v1.9.0\non linux_amd64"));

    let output = version_output(&runner, "terraform").unwrap();
    assert!(output.starts_with("Terraform v1.9.0"));

    let calls = runner.get_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].program, "terraform");
    assert_eq!(calls[0].args, vec!["-version".to_string()]);
}

#[test]
fn test_non_zero_exit_is_not_an_error() {
    let runner = MockRunner::new().add_response(MockResponse::failure(1, "boom"));

    let result = runner
        .run_command(&CommandConfig::new("terraform").arg("-version"))
        .unwrap();

    assert_eq!(result.exit_code, 1);
    assert_eq!(result.combined_output(), "boom");
    assert!(version_output(&runner, "terraform").is_none());
}

#[test]
fn test_spawn_failure_is_an_error() {
    let runner = CliRunner::new();
    let argv = vec!["tfgen-missing-binary-for-tests".to_string()];

    match runner.run_and_capture(&argv) {
        Err(RunnerError::SpawnFailed { program, .. }) => {
            assert_eq!(program, "tfgen-missing-binary-for-tests")
        }
        other => panic!("expected spawn failure, got {:?}", other),
    }
}

#[test]
fn test_mock_duration_is_reported() {
    let runner = MockRunner::new().add_response(MockResponse::success("").with_duration(250));

    let result = runner.run_command(&CommandConfig::new("terraform")).unwrap();
    assert_eq!(result.duration_ms, 250);
    assert_eq!((result.finished_at - result.started_at).num_milliseconds(), 250);
}
