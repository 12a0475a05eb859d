//! CLI command definitions.
//!
//! This module defines the command structure for the tfgen CLI.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use tfgen_iac::{EnvironmentValidator, SystemLocator, TargetPlatform, TerraformSettings, TerraformVersion};
use tfgen_runner::CliRunner;

pub mod check;
pub mod scripts;

/// tfgen - Terraform workflow script generator
#[derive(Parser)]
#[command(name = "tfgen")]
#[command(version, about = "tfgen - Terraform workflow script generator")]
#[command(long_about = r#"
tfgen writes the scripts an operator runs to export, import, plan, apply and
refresh Terraform configuration, and checks that a usable Terraform and
provider are installed.

COMMANDS:
  check    → Report Terraform/provider installation and version status
  scripts  → Generate export, import-state, plan, apply and refresh scripts

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Environment check failure (--strict)
  5 - IaC error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Settings file (YAML)
    #[arg(long, global = true, env = "TFGEN_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Override the target platform (windows, darwin, linux)
    #[arg(long, global = true)]
    pub platform: Option<TargetPlatform>,

    /// Override the local Terraform install directory
    #[arg(long, global = true)]
    pub terraform_dir: Option<PathBuf>,

    /// Override the minimum Terraform version
    #[arg(long, global = true)]
    pub required_version: Option<TerraformVersion>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check Terraform and provider installation
    Check(check::CheckArgs),

    /// Generate workflow scripts
    Scripts(scripts::ScriptsArgs),
}

impl Cli {
    /// Settings from the settings file (or defaults) with CLI overrides applied.
    pub fn load_settings(&self) -> Result<TerraformSettings> {
        let mut settings = match &self.settings {
            Some(path) => TerraformSettings::from_yaml_file(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?,
            None => TerraformSettings::default(),
        };

        if let Some(platform) = self.platform {
            settings = settings.with_platform(platform);
        }
        if let Some(dir) = &self.terraform_dir {
            settings = settings.with_terraform_dir(dir);
        }
        if let Some(version) = self.required_version {
            settings = settings.with_required_version(version);
        }

        debug!("Effective settings: {:?}", settings);
        Ok(settings)
    }
}

/// Validator wired to the real filesystem and process runner.
pub fn system_validator(settings: &TerraformSettings) -> EnvironmentValidator {
    EnvironmentValidator::new(
        settings.clone(),
        Arc::new(SystemLocator::new()),
        Arc::new(CliRunner::new()),
    )
}
