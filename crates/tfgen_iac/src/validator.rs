//! Terraform and provider environment validation.
//!
//! Validation is advisory: nothing here fails because a tool is missing or
//! outdated. Every probe is recomputed on each call and reported as a record
//! whose optional fields mean "unknown".

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use tfgen_runner::{ExecutionResult, ProcessRunner, RunnerResult};

use crate::config::TerraformSettings;
use crate::locator::ExecutableLocator;
use crate::platform::TargetPlatform;
use crate::version::TerraformVersion;

/// Status reported by a blank provider run that started and exited normally.
pub const BLANK_RUN_OK: u16 = 200;

/// Status reported by a blank provider run that could not start or was killed.
pub const BLANK_RUN_FAILED: u16 = 500;

/// Blank-run statuses at or above this value mark the provider as not runnable.
pub const BLANK_RUN_ERROR_THRESHOLD: u16 = 300;

/// Where Terraform was looked for and what was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerraformProbe {
    /// Found on the search path
    #[serde(rename = "is_terraform_installed")]
    pub installed_on_path: bool,
    /// Found on the search path and executable
    #[serde(rename = "is_terraform_executable")]
    pub executable_on_path: bool,
    /// Present in the local install directory
    #[serde(rename = "is_terraform_installed_locally")]
    pub installed_locally: bool,
    /// Present in the local install directory and executable
    #[serde(rename = "is_terraform_executable_locally")]
    pub executable_locally: bool,
    /// Absolute local install directory (forward slashes)
    #[serde(rename = "local_terraform_path")]
    pub local_dir: String,
    /// Absolute path of the local executable (forward slashes)
    #[serde(rename = "absolute_terraform_exec_path_local")]
    pub local_exec_path: String,
}

/// Provider executable diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderProbe {
    pub is_darwin: bool,
    #[serde(rename = "is_terraform_provider_executable")]
    pub executable: bool,
    /// False only when a smoke test ran and failed
    #[serde(rename = "is_terraform_provider_runnable")]
    pub runnable: bool,
    #[serde(rename = "absolute_terraform_provider_exec_path_local")]
    pub local_exec_path: String,
}

/// Installed Terraform version compared to the required minimum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionCheck {
    #[serde(rename = "terraform_version")]
    pub installed: TerraformVersion,
    #[serde(rename = "terraform_performance_version")]
    pub required: TerraformVersion,
    #[serde(rename = "is_terraform_exec_update_required")]
    pub update_required: bool,
}

/// Combined result of all environment checks.
///
/// The version fields are absent, not zeroed, when no version is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerraformChecks {
    #[serde(flatten)]
    pub terraform: TerraformProbe,
    #[serde(flatten)]
    pub provider: ProviderProbe,
    #[serde(flatten)]
    pub version: Option<VersionCheck>,
}

/// How Terraform will be invoked, if at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TerraformStatus {
    /// The local install is used
    LocalInstall { path: String },
    /// A local copy exists but lacks execute permission
    LocalNotExecutable { chmod_hint: String },
    /// The copy on the search path is used
    PathInstall,
    /// No usable Terraform
    Missing { local_dir: String },
}

/// A problem an operator must fix before the generated scripts can run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum EnvironmentIssue {
    TerraformNotExecutable { chmod_hint: String },
    TerraformMissing { local_dir: String },
    ProviderBlocked { path: String },
    ProviderNotExecutable { chmod_hint: String },
}

impl std::fmt::Display for EnvironmentIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TerraformNotExecutable { chmod_hint } => {
                write!(f, "Terraform installed locally but not executable; run: {}", chmod_hint)
            }
            Self::TerraformMissing { local_dir } => write!(
                f,
                "Terraform not found; install it or copy the executable to {}",
                local_dir
            ),
            Self::ProviderBlocked { path } => write!(
                f,
                "Terraform provider is blocked by the OS; run {} once and allow it under Privacy & Security",
                path
            ),
            Self::ProviderNotExecutable { chmod_hint } => {
                write!(f, "Terraform provider not executable; run: {}", chmod_hint)
            }
        }
    }
}

impl TerraformChecks {
    pub fn terraform_status(&self) -> TerraformStatus {
        let tf = &self.terraform;
        if tf.installed_locally && tf.executable_locally {
            TerraformStatus::LocalInstall {
                path: tf.local_exec_path.clone(),
            }
        } else if tf.installed_locally {
            TerraformStatus::LocalNotExecutable {
                chmod_hint: chmod_hint(&tf.local_exec_path),
            }
        } else if tf.installed_on_path && tf.executable_on_path {
            TerraformStatus::PathInstall
        } else {
            TerraformStatus::Missing {
                local_dir: tf.local_dir.clone(),
            }
        }
    }

    /// Blocking problems, in display order.
    pub fn issues(&self) -> Vec<EnvironmentIssue> {
        let mut issues = Vec::new();

        match self.terraform_status() {
            TerraformStatus::LocalNotExecutable { chmod_hint } => {
                issues.push(EnvironmentIssue::TerraformNotExecutable { chmod_hint })
            }
            TerraformStatus::Missing { local_dir } => {
                issues.push(EnvironmentIssue::TerraformMissing { local_dir })
            }
            TerraformStatus::LocalInstall { .. } | TerraformStatus::PathInstall => {}
        }

        let provider = &self.provider;
        if provider.is_darwin {
            if !provider.runnable {
                issues.push(EnvironmentIssue::ProviderBlocked {
                    path: provider.local_exec_path.clone(),
                });
            }
        } else if !provider.executable {
            issues.push(EnvironmentIssue::ProviderNotExecutable {
                chmod_hint: chmod_hint(&provider.local_exec_path),
            });
        }

        issues
    }

    pub fn is_ready(&self) -> bool {
        self.issues().is_empty()
    }

    /// `Some(true)` only when a version was detected and is too old.
    pub fn update_required(&self) -> Option<bool> {
        self.version.as_ref().map(|v| v.update_required)
    }
}

fn chmod_hint(path: &str) -> String {
    format!("chmod +x {}", path)
}

/// Absolute form of `path` with forward slashes.
fn absolute_forward_slash(path: &Path) -> String {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    absolute.to_string_lossy().replace('\\', "/")
}

fn forward_slash_join(dir: &str, file: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), file)
}

/// Map a blank provider run to an HTTP-style status code.
fn blank_run_status(result: &RunnerResult<ExecutionResult>) -> u16 {
    match result {
        Ok(r) if r.exited() => BLANK_RUN_OK,
        _ => BLANK_RUN_FAILED,
    }
}

/// Locates Terraform and the provider and checks the Terraform version.
pub struct EnvironmentValidator {
    settings: TerraformSettings,
    locator: Arc<dyn ExecutableLocator>,
    runner: Arc<dyn ProcessRunner>,
}

impl EnvironmentValidator {
    pub fn new(
        settings: TerraformSettings,
        locator: Arc<dyn ExecutableLocator>,
        runner: Arc<dyn ProcessRunner>,
    ) -> Self {
        Self {
            settings,
            locator,
            runner,
        }
    }

    fn platform(&self) -> TargetPlatform {
        self.settings.platform
    }

    /// Probe the search path and the local install directory for Terraform.
    ///
    /// All four flags are computed independently.
    pub fn probe_terraform(&self) -> TerraformProbe {
        let name = &self.settings.terraform_exec;
        let installed_on_path = self.locator.which(name, false).is_some();
        let executable_on_path = self.locator.which(name, true).is_some();

        let local_dir = absolute_forward_slash(&self.settings.terraform_dir);
        let local_exec_path = forward_slash_join(&local_dir, &self.settings.terraform_file_name());

        let installed_locally = self.locator.exists(Path::new(&local_exec_path));
        let executable_locally = self.locator.is_executable(Path::new(&local_exec_path));

        debug!(
            "Terraform probe: path={}/{} local={}/{} at {}",
            installed_on_path, executable_on_path, installed_locally, executable_locally, local_exec_path
        );

        TerraformProbe {
            installed_on_path,
            executable_on_path,
            installed_locally,
            executable_locally,
            local_dir,
            local_exec_path,
        }
    }

    /// Probe the provider executable, smoke testing it where the platform
    /// requires one.
    pub fn probe_provider(&self) -> ProviderProbe {
        let dir = absolute_forward_slash(self.settings.provider_install_dir());
        let local_exec_path = forward_slash_join(&dir, &self.settings.provider_file_name());
        let executable = self.locator.is_executable(Path::new(&local_exec_path));

        let mut runnable = true;
        if self.platform().requires_provider_smoke_test() {
            let result = self.runner.run_and_capture(&[local_exec_path.clone()]);
            let status = blank_run_status(&result);
            debug!("Provider blank run status: {}", status);
            if status >= BLANK_RUN_ERROR_THRESHOLD {
                warn!("Provider at {} could not be started", local_exec_path);
                runnable = false;
            }
        }

        ProviderProbe {
            is_darwin: self.platform() == TargetPlatform::Darwin,
            executable,
            runnable,
            local_exec_path,
        }
    }

    /// Executable to put in generated commands.
    ///
    /// Prefers the local install (absolute path) over the search path (bare
    /// name). `None` means no usable Terraform was found.
    pub fn resolve_executable(&self) -> Option<String> {
        let probe = self.probe_terraform();
        if probe.executable_locally {
            Some(probe.local_exec_path)
        } else if probe.executable_on_path {
            Some(self.settings.terraform_exec.clone())
        } else {
            None
        }
    }

    /// Query the resolved Terraform for its version.
    ///
    /// `None` when no executable resolves, the query fails, or the output has
    /// no recognizable version.
    pub fn validate_version(&self) -> Option<VersionCheck> {
        let exec = self.resolve_executable()?;
        let installed = self.query_version(&exec)?;
        let required = self.settings.required_version;

        Some(VersionCheck {
            installed,
            required,
            update_required: installed < required,
        })
    }

    fn query_version(&self, exec: &str) -> Option<TerraformVersion> {
        let argv = [exec.to_string(), "-version".to_string()];
        let result = match self.runner.run_and_capture(&argv) {
            Ok(result) => result,
            Err(e) => {
                warn!("Terraform version query failed: {}", e);
                return None;
            }
        };

        if !result.success() {
            warn!("Terraform version query exited with code {}", result.exit_code);
            return None;
        }

        let version = TerraformVersion::from_version_output(&result.combined_output());
        if version.is_none() {
            warn!("No Terraform version found in output of {} -version", exec);
        }
        version
    }

    /// Run every probe and merge the results.
    pub fn run_checks(&self) -> TerraformChecks {
        let provider = self.probe_provider();
        let terraform = self.probe_terraform();
        let version = self.validate_version();

        let checks = TerraformChecks {
            terraform,
            provider,
            version,
        };

        match &checks.version {
            Some(v) => info!(
                "Terraform {} detected (required {}, update required: {})",
                v.installed, v.required, v.update_required
            ),
            None => info!("Terraform version unknown"),
        }

        checks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::MockLocator;
    use tfgen_runner::{MockResponse, MockRunner};

    fn settings(platform: TargetPlatform) -> TerraformSettings {
        TerraformSettings::default()
            .with_platform(platform)
            .with_terraform_dir("/opt/tf")
            .with_provider_dir("/opt/provider")
    }

    fn validator(
        platform: TargetPlatform,
        locator: MockLocator,
        runner: MockRunner,
    ) -> EnvironmentValidator {
        EnvironmentValidator::new(settings(platform), Arc::new(locator), Arc::new(runner))
    }

    #[test]
    fn test_resolve_prefers_local_install() {
        let locator = MockLocator::new()
            .with_executable("/opt/tf/terraform")
            .with_on_path("terraform", "/usr/bin/terraform", true);
        let v = validator(TargetPlatform::Linux, locator, MockRunner::new());

        assert_eq!(v.resolve_executable().as_deref(), Some("/opt/tf/terraform"));
    }

    #[test]
    fn test_resolve_falls_back_to_bare_name() {
        let locator = MockLocator::new()
            .with_file("/opt/tf/terraform")
            .with_on_path("terraform", "/usr/bin/terraform", true);
        let v = validator(TargetPlatform::Linux, locator, MockRunner::new());

        assert_eq!(v.resolve_executable().as_deref(), Some("terraform"));
    }

    #[test]
    fn test_resolve_nothing_usable() {
        let locator = MockLocator::new().with_on_path("terraform", "/usr/bin/terraform", false);
        let v = validator(TargetPlatform::Linux, locator, MockRunner::new());

        assert_eq!(v.resolve_executable(), None);
    }

    #[test]
    fn test_probe_reports_every_flag() {
        let locator = MockLocator::new()
            .with_executable("/opt/tf/terraform.exe")
            .with_on_path("terraform", "/usr/bin/terraform", false);
        let v = validator(TargetPlatform::Windows, locator, MockRunner::new());

        let probe = v.probe_terraform();
        assert!(probe.installed_on_path);
        assert!(!probe.executable_on_path);
        assert!(probe.installed_locally);
        assert!(probe.executable_locally);
        assert!(probe.local_exec_path.ends_with("/opt/tf/terraform.exe"));
    }

    #[test]
    fn test_provider_smoke_test_only_on_darwin() {
        let runner = MockRunner::new().add_response(MockResponse::killed());
        let v = validator(TargetPlatform::Linux, MockLocator::new(), runner.clone());
        let probe = v.probe_provider();
        assert!(probe.runnable);
        assert!(!probe.is_darwin);
        assert_eq!(runner.call_count(), 0);

        let v = validator(TargetPlatform::Darwin, MockLocator::new(), runner.clone());
        let probe = v.probe_provider();
        assert!(!probe.runnable);
        assert!(probe.is_darwin);
        assert_eq!(runner.call_count(), 1);
        assert_eq!(runner.get_calls()[0].args.len(), 0);
    }

    #[test]
    fn test_darwin_provider_lives_next_to_terraform() {
        let v = validator(TargetPlatform::Darwin, MockLocator::new(), MockRunner::new());
        let probe = v.probe_provider();
        assert!(probe
            .local_exec_path
            .ends_with("/opt/tf/terraform-provider-dynatrace"));
    }

    #[test]
    fn test_darwin_provider_nonzero_exit_is_runnable() {
        let runner = MockRunner::new().add_response(MockResponse::failure(1, "missing arguments"));
        let v = validator(TargetPlatform::Darwin, MockLocator::new(), runner.clone());

        let probe = v.probe_provider();
        assert!(probe.runnable);
        assert_eq!(runner.call_count(), 1);

        let killed = MockRunner::new().add_response(MockResponse::killed());
        let v = validator(TargetPlatform::Darwin, MockLocator::new(), killed);
        assert!(!v.probe_provider().runnable);
    }

    #[test]
    fn test_blank_run_status() {
        let runner = MockRunner::new();
        assert_eq!(blank_run_status(&runner.run_and_capture(&["p".to_string()])), BLANK_RUN_OK);

        let usage_error = MockRunner::new().add_response(MockResponse::failure(1, "usage"));
        assert_eq!(
            blank_run_status(&usage_error.run_and_capture(&["p".to_string()])),
            BLANK_RUN_OK
        );

        let killed = MockRunner::new().add_response(MockResponse::killed());
        assert_eq!(
            blank_run_status(&killed.run_and_capture(&["p".to_string()])),
            BLANK_RUN_FAILED
        );

        let failing = MockRunner::new().simulate_failure("spawn");
        assert_eq!(
            blank_run_status(&failing.run_and_capture(&["p".to_string()])),
            BLANK_RUN_FAILED
        );
    }

    #[test]
    fn test_validate_version_update_required() {
        let locator = MockLocator::new().with_on_path("terraform", "/usr/bin/terraform", true);
        let runner = MockRunner::new().add_response(MockResponse::success("Terraform v1.7.5\non linux_amd64"));
        let v = validator(TargetPlatform::Linux, locator, runner.clone());

        let check = v.validate_version().unwrap();
        assert_eq!(check.installed, TerraformVersion::new(1, 7, 5));
        assert_eq!(check.required, TerraformVersion::new(1, 8, 2));
        assert!(check.update_required);

        let calls = runner.get_calls();
        assert_eq!(calls[0].argv(), vec!["terraform".to_string(), "-version".to_string()]);
    }

    #[test]
    fn test_validate_version_current() {
        let locator = MockLocator::new().with_executable("/opt/tf/terraform");
        let runner = MockRunner::new().add_response(MockResponse::success("Terraform v1.8.2"));
        let v = validator(TargetPlatform::Linux, locator, runner);

        assert!(!v.validate_version().unwrap().update_required);
    }

    #[test]
    fn test_validate_version_soft_failures() {
        let locator = MockLocator::new().with_on_path("terraform", "/usr/bin/terraform", true);

        let unparsable = MockRunner::new().add_response(MockResponse::success("garbage"));
        assert!(validator(TargetPlatform::Linux, locator.clone(), unparsable)
            .validate_version()
            .is_none());

        let failed = MockRunner::new().add_response(MockResponse::failure(1, "Terraform v1.9.0"));
        assert!(validator(TargetPlatform::Linux, locator.clone(), failed)
            .validate_version()
            .is_none());

        let unspawnable = MockRunner::new().simulate_failure("no such file");
        assert!(validator(TargetPlatform::Linux, locator, unspawnable)
            .validate_version()
            .is_none());
    }

    #[test]
    fn test_validate_version_without_executable_skips_query() {
        let runner = MockRunner::new();
        let v = validator(TargetPlatform::Linux, MockLocator::new(), runner.clone());

        assert!(v.validate_version().is_none());
        assert_eq!(runner.call_count(), 0);
    }

    #[test]
    fn test_status_and_issues() {
        let locator = MockLocator::new().with_file("/opt/tf/terraform");
        let checks = validator(TargetPlatform::Linux, locator, MockRunner::new()).run_checks();

        match checks.terraform_status() {
            TerraformStatus::LocalNotExecutable { chmod_hint } => {
                assert!(chmod_hint.starts_with("chmod +x "));
                assert!(chmod_hint.ends_with("/opt/tf/terraform"));
            }
            other => panic!("unexpected status {:?}", other),
        }

        let issues = checks.issues();
        assert_eq!(issues.len(), 2);
        assert!(matches!(issues[0], EnvironmentIssue::TerraformNotExecutable { .. }));
        assert!(matches!(issues[1], EnvironmentIssue::ProviderNotExecutable { .. }));
        assert!(!checks.is_ready());
        assert_eq!(checks.update_required(), None);
    }

    #[test]
    fn test_ready_environment() {
        let locator = MockLocator::new()
            .with_on_path("terraform", "/usr/bin/terraform", true)
            .with_executable("/opt/provider/terraform-provider-dynatrace");
        let runner = MockRunner::new().add_response(MockResponse::success("Terraform v1.9.1"));
        let checks = validator(TargetPlatform::Linux, locator, runner).run_checks();

        assert_eq!(checks.terraform_status(), TerraformStatus::PathInstall);
        assert!(checks.is_ready());
        assert_eq!(checks.update_required(), Some(false));
    }
}
