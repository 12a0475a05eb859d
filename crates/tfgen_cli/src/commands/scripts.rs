//! Scripts command - Generate workflow scripts.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use tracing::info;

use tfgen_iac::{CommandBuilder, RunInfo, ScriptEmitter, ScriptKind, TargetSpec, WorkflowRequest};

use super::Cli;

/// Which script(s) to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    All,
    Export,
    ImportState,
    Plan,
    Apply,
    Refresh,
}

impl KindArg {
    fn kinds(self) -> Vec<ScriptKind> {
        match self {
            Self::All => ScriptKind::all(),
            Self::Export => vec![ScriptKind::Export],
            Self::ImportState => vec![ScriptKind::ImportState],
            Self::Plan => vec![ScriptKind::Plan],
            Self::Apply => vec![ScriptKind::Apply],
            Self::Refresh => vec![ScriptKind::Refresh],
        }
    }
}

#[derive(Args)]
pub struct ScriptsArgs {
    /// Directory the scripts are written to
    #[arg(short, long, env = "TFGEN_TERRAFORM_PATH")]
    terraform_path: PathBuf,

    /// Environment-setup script name, without extension
    #[arg(short, long, env = "TFGEN_ENV_SCRIPT", default_value = "set_env")]
    env_script: String,

    /// Script to generate
    #[arg(short, long, value_enum, default_value_t = KindArg::All)]
    kind: KindArg,

    /// Run info file (YAML or JSON)
    #[arg(long)]
    run_info: Option<PathBuf>,

    /// Target list file (YAML or JSON)
    #[arg(long)]
    targets: Option<PathBuf>,

    /// Export dependencies as well (-migrate)
    #[arg(long)]
    create_dependencies: bool,

    /// Print the scripts instead of writing them
    #[arg(long)]
    print: bool,
}

impl ScriptsArgs {
    fn base_request(&self) -> Result<WorkflowRequest> {
        let run_info = match &self.run_info {
            Some(path) => RunInfo::from_file(path)
                .with_context(|| format!("Failed to read run info {}", path.display()))?,
            None => RunInfo::default(),
        };

        let targets = match &self.targets {
            Some(path) => TargetSpec::list_from_file(path)
                .with_context(|| format!("Failed to read targets {}", path.display()))?,
            None => Vec::new(),
        };

        Ok(
            WorkflowRequest::new(ScriptKind::Export, &self.terraform_path, &self.env_script)
                .with_run_info(run_info)
                .with_targets(targets)
                .with_create_dependencies(self.create_dependencies),
        )
    }
}

pub fn execute(cli: &Cli, args: &ScriptsArgs) -> Result<()> {
    let settings = cli.load_settings()?;
    let base = args.base_request()?;

    let terraform_exec = super::system_validator(&settings).resolve_executable();
    match &terraform_exec {
        Some(exec) => info!("Using terraform executable: {}", exec),
        None => println!("⚠️  No usable terraform found; run `tfgen check` for details"),
    }

    let emitter = ScriptEmitter::with_fs_writer(&settings, CommandBuilder::new(&settings, terraform_exec));

    for kind in args.kind.kinds() {
        let request = base.for_kind(kind);

        if args.print {
            let path = emitter.script_path(&request.terraform_path, kind);
            println!("# {}", path.display());
            print!("{}", emitter.render(&request).to_text());
            println!();
            continue;
        }

        let path = emitter
            .emit(&request)
            .with_context(|| format!("IaC script generation failed for {}", kind))?;
        if !cli.quiet {
            println!("📝 {}", path.display());
        }
    }

    Ok(())
}
