//! tfgen CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Environment check failure
//! - 5: IaC error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::check::EnvironmentNotReady;
use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
    pub const IAC_ERROR: u8 = 5;
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "tfgen=debug"
    } else if cli.quiet {
        "warn"
    } else {
        "tfgen=info"
    };

    // Logging may already be initialized by an embedding test harness
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("{},warn", default_level))),
        )
        .try_init();

    let result = match &cli.command {
        Commands::Check(args) => commands::check::execute(&cli, args),
        Commands::Scripts(args) => commands::scripts::execute(&cli, args),
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    if e.downcast_ref::<EnvironmentNotReady>().is_some() {
        return ExitCodes::VALIDATION_FAILURE;
    }
    if e.chain().any(|cause| cause.is::<tfgen_iac::IacError>()) {
        return ExitCodes::IAC_ERROR;
    }

    let msg = e.to_string().to_lowercase();
    if msg.contains("argument") || msg.contains("not found") {
        ExitCodes::INVALID_ARGS
    } else {
        ExitCodes::GENERAL_ERROR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_environment_failure() {
        let e = anyhow::Error::new(EnvironmentNotReady(2));
        assert_eq!(categorize_error(&e), ExitCodes::VALIDATION_FAILURE);
    }

    #[test]
    fn test_categorize_iac_error_with_context() {
        let e = anyhow::Error::new(tfgen_iac::IacError::InvalidSettings("x".to_string()))
            .context("Failed to load settings");
        assert_eq!(categorize_error(&e), ExitCodes::IAC_ERROR);
    }

    #[test]
    fn test_categorize_other_errors() {
        assert_eq!(
            categorize_error(&anyhow::anyhow!("missing argument")),
            ExitCodes::INVALID_ARGS
        );
        assert_eq!(categorize_error(&anyhow::anyhow!("boom")), ExitCodes::GENERAL_ERROR);
    }
}
