//! Terraform and provider command-line construction.
//!
//! Everything here is pure: the executable is resolved once by the caller and
//! handed to [`CommandBuilder::new`].

use std::ops::Deref;

use tracing::warn;

use crate::config::{RunInfo, TargetSpec, TerraformSettings};

/// Forced schema id fragment that selects management zones.
pub const MANAGEMENT_ZONES_SCHEMA: &str = "builtin:management-zones";

/// Provider resource name exported for [`MANAGEMENT_ZONES_SCHEMA`].
pub const MANAGEMENT_ZONE_RESOURCE: &str = "dynatrace_management_zone_v2";

/// Ordered tokens of one command invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandTokens(Vec<String>);

impl CommandTokens {
    pub fn new(tokens: Vec<String>) -> Self {
        Self(tokens)
    }

    /// Tokens joined with single spaces, as written into scripts.
    pub fn to_line(&self) -> String {
        self.0.join(" ")
    }

    /// False when the executable could not be resolved.
    pub fn is_usable(&self) -> bool {
        self.0.first().is_some_and(|exe| !exe.is_empty())
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }

    fn push(&mut self, token: impl Into<String>) {
        self.0.push(token.into());
    }
}

impl Deref for CommandTokens {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Terraform subcommands used by the workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerraformCommand {
    Plan,
    Apply,
}

impl TerraformCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plan => "plan",
            Self::Apply => "apply",
        }
    }
}

impl std::fmt::Display for TerraformCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Builds Terraform and provider invocations.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    terraform_exec: Option<String>,
    provider_exec: String,
    default_parallelism: u32,
    discard_output: &'static str,
}

impl CommandBuilder {
    /// `terraform_exec` is the resolved executable; `None` yields commands
    /// whose first token is empty.
    pub fn new(settings: &TerraformSettings, terraform_exec: Option<String>) -> Self {
        Self {
            terraform_exec,
            provider_exec: settings.provider_exec.clone(),
            default_parallelism: settings.default_parallelism,
            discard_output: settings.platform.dialect().discard_output(),
        }
    }

    pub fn terraform_exec(&self) -> Option<&str> {
        self.terraform_exec.as_deref()
    }

    /// Provider export: `[provider, -export, -id, (-import-state-v2)?, (-migrate)?, (schema)?]`.
    pub fn export_command(
        &self,
        run_info: &RunInfo,
        import_state: bool,
        create_dependencies: bool,
    ) -> CommandTokens {
        let mut tokens = CommandTokens::new(vec![
            self.provider_exec.clone(),
            "-export".to_string(),
            "-id".to_string(),
        ]);

        if import_state {
            tokens.push("-import-state-v2");
        }

        if create_dependencies {
            tokens.push("-migrate");
        }

        if let Some(resource) = run_info.forced_schema_id().and_then(forced_schema_resource) {
            tokens.push(resource);
        }

        tokens
    }

    /// `terraform plan`, optionally scoped to targets and saving the plan.
    pub fn plan_command(
        &self,
        plan_file: &str,
        is_refresh: bool,
        save_state: bool,
        targets: &[TargetSpec],
        run_info: &RunInfo,
    ) -> CommandTokens {
        let mut extra_args: Vec<String> = targets
            .iter()
            .map(|target| format!("-target={}", target.address()))
            .collect();

        if save_state {
            extra_args.push(format!("-out={}", plan_file));
            extra_args.push(self.discard_output.to_string());
        }

        self.common_invocation(TerraformCommand::Plan, extra_args, is_refresh, run_info)
    }

    /// `terraform apply -auto-approve <plan_file>`.
    ///
    /// The plan file must be the first positional argument after the flags.
    pub fn apply_command(&self, plan_file: &str, is_refresh: bool, run_info: &RunInfo) -> CommandTokens {
        let extra_args = vec!["-auto-approve".to_string(), plan_file.to_string()];
        self.common_invocation(TerraformCommand::Apply, extra_args, is_refresh, run_info)
    }

    /// `[terraform, command, -lock=false, -parallelism=N, (-refresh-only)?, ...extra_args]`.
    ///
    /// `extra_args` are appended as given.
    pub fn common_invocation(
        &self,
        command: TerraformCommand,
        extra_args: Vec<String>,
        is_refresh: bool,
        run_info: &RunInfo,
    ) -> CommandTokens {
        let parallelism = run_info
            .parallelism()
            .unwrap_or_else(|| u64::from(self.default_parallelism));

        let mut tokens = CommandTokens::new(vec![
            self.terraform_exec.clone().unwrap_or_default(),
            command.as_str().to_string(),
            "-lock=false".to_string(),
            format!("-parallelism={}", parallelism),
        ]);

        if is_refresh {
            tokens.push("-refresh-only");
        }

        tokens.0.extend(extra_args);
        tokens
    }
}

/// Provider resource to export for a forced schema id.
///
/// Only management zones are mapped; other schema ids are not exported
/// individually yet.
fn forced_schema_resource(schema_id: &str) -> Option<&'static str> {
    if schema_id.contains(MANAGEMENT_ZONES_SCHEMA) {
        Some(MANAGEMENT_ZONE_RESOURCE)
    } else {
        warn!("Forced schema id {} has no export mapping; exporting all schemas", schema_id);
        None
    }
}
