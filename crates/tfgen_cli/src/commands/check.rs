//! Check command - Report Terraform and provider installation status.

use anyhow::Result;
use clap::Args;
use thiserror::Error;
use tracing::info;

use tfgen_iac::{TerraformChecks, TerraformStatus};

use super::Cli;

#[derive(Args)]
pub struct CheckArgs {
    /// Print the raw diagnostics as JSON
    #[arg(long)]
    json: bool,

    /// Fail when Terraform or the provider is unusable
    #[arg(long)]
    strict: bool,
}

/// Raised by `--strict` when the environment has blocking issues.
#[derive(Debug, Error)]
#[error("Environment validation failed with {0} issue(s)")]
pub struct EnvironmentNotReady(pub usize);

pub fn execute(cli: &Cli, args: &CheckArgs) -> Result<()> {
    let settings = cli.load_settings()?;
    info!("Checking Terraform environment for {}", settings.platform);

    let checks = super::system_validator(&settings).run_checks();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&checks)?);
    } else {
        print_summary(&checks);
    }

    let issues = checks.issues();
    if args.strict && !issues.is_empty() {
        return Err(EnvironmentNotReady(issues.len()).into());
    }

    Ok(())
}

fn print_summary(checks: &TerraformChecks) {
    println!("🔍 Terraform");
    match checks.terraform_status() {
        TerraformStatus::LocalInstall { path } => {
            println!("   ✅ Using locally installed terraform executable: {}", path)
        }
        TerraformStatus::PathInstall => println!("   ✅ Using terraform from PATH"),
        TerraformStatus::LocalNotExecutable { .. } | TerraformStatus::Missing { .. } => {}
    }

    match &checks.version {
        Some(v) if v.update_required => println!(
            "   ⚠️  Terraform {} is older than {}; please update",
            v.installed, v.required
        ),
        Some(v) => println!("   ✅ Terraform {} (required {})", v.installed, v.required),
        None => println!("   ⚠️  Terraform version unknown"),
    }

    println!("🔌 Provider: {}", checks.provider.local_exec_path);

    let issues = checks.issues();
    for issue in &issues {
        println!("   ❌ {}", issue);
    }

    println!();
    if issues.is_empty() {
        println!("✅ Environment ready");
    } else {
        println!("❌ Environment has {} issue(s)", issues.len());
    }
}
