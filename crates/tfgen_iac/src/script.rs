//! Workflow script generation.
//!
//! Each workflow (export, import-state, plan, apply, refresh) becomes one
//! script that sources the environment-setup script and runs the Terraform or
//! provider commands in order. Rendering is pure; writing goes through a
//! [`LineWriter`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{RunInfo, TargetSpec, TerraformSettings};
use crate::error::{IacError, IacResult};
use crate::platform::ScriptDialect;
use crate::terraform::CommandBuilder;

/// The five generated scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScriptKind {
    Export,
    ImportState,
    Plan,
    Apply,
    Refresh,
}

impl ScriptKind {
    /// Script file name without extension.
    pub fn base_name(&self) -> &'static str {
        match self {
            Self::Export => "export",
            Self::ImportState => "import-state",
            Self::Plan => "plan",
            Self::Apply => "apply",
            Self::Refresh => "refresh",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![
            Self::Export,
            Self::ImportState,
            Self::Plan,
            Self::Apply,
            Self::Refresh,
        ]
    }

    pub fn import_state(&self) -> bool {
        matches!(self, Self::ImportState)
    }

    pub fn is_refresh(&self) -> bool {
        matches!(self, Self::Refresh)
    }

    /// Whether the script saves a plan file and applies it.
    pub fn save_state(&self) -> bool {
        matches!(self, Self::Apply | Self::Refresh)
    }
}

impl std::fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.base_name())
    }
}

/// Inputs for generating one script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowRequest {
    pub kind: ScriptKind,
    /// Directory the script is written to
    pub terraform_path: PathBuf,
    /// Environment-setup script name, without extension
    pub env_script_name: String,
    /// Export with `-migrate`
    pub create_dependencies: bool,
    pub run_info: RunInfo,
    /// Plan targets; empty means everything
    pub targets: Vec<TargetSpec>,
}

impl WorkflowRequest {
    pub fn new(
        kind: ScriptKind,
        terraform_path: impl Into<PathBuf>,
        env_script_name: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            terraform_path: terraform_path.into(),
            env_script_name: env_script_name.into(),
            create_dependencies: false,
            run_info: RunInfo::default(),
            targets: Vec::new(),
        }
    }

    pub fn with_create_dependencies(mut self, create_dependencies: bool) -> Self {
        self.create_dependencies = create_dependencies;
        self
    }

    pub fn with_run_info(mut self, run_info: RunInfo) -> Self {
        self.run_info = run_info;
        self
    }

    pub fn with_targets(mut self, targets: Vec<TargetSpec>) -> Self {
        self.targets = targets;
        self
    }

    /// Same request for a different script kind.
    pub fn for_kind(&self, kind: ScriptKind) -> Self {
        Self {
            kind,
            ..self.clone()
        }
    }
}

/// Rendered script lines in a given dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptDocument {
    pub dialect: ScriptDialect,
    pub lines: Vec<String>,
}

impl ScriptDocument {
    /// Full file content, every line terminated by the dialect's line ending.
    pub fn to_text(&self) -> String {
        render_lines(&self.lines, self.dialect.line_ending())
    }
}

fn render_lines(lines: &[String], line_ending: &str) -> String {
    lines
        .iter()
        .map(|line| format!("{}{}", line, line_ending))
        .collect()
}

/// Persists script lines, creating or overwriting the target file.
pub trait LineWriter: Send + Sync {
    fn write_lines(&self, path: &Path, lines: &[String]) -> IacResult<()>;
}

/// Writes scripts to disk.
#[derive(Debug, Clone, Copy)]
pub struct FsLineWriter {
    line_ending: &'static str,
    make_executable: bool,
}

impl FsLineWriter {
    pub fn for_dialect(dialect: ScriptDialect) -> Self {
        Self {
            line_ending: dialect.line_ending(),
            make_executable: dialect.needs_exec_bit(),
        }
    }

    #[cfg(unix)]
    fn set_executable(path: &Path) -> std::io::Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let mut permissions = fs::metadata(path)?.permissions();
        permissions.set_mode(permissions.mode() | 0o755);
        fs::set_permissions(path, permissions)
    }

    #[cfg(not(unix))]
    fn set_executable(_path: &Path) -> std::io::Result<()> {
        Ok(())
    }
}

impl LineWriter for FsLineWriter {
    fn write_lines(&self, path: &Path, lines: &[String]) -> IacResult<()> {
        let wrap = |source| IacError::ScriptWrite {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(wrap)?;
        }
        fs::write(path, render_lines(lines, self.line_ending)).map_err(wrap)?;

        if self.make_executable {
            Self::set_executable(path).map_err(wrap)?;
        }
        Ok(())
    }
}

/// Renders workflow scripts and hands them to a [`LineWriter`].
pub struct ScriptEmitter {
    builder: CommandBuilder,
    dialect: ScriptDialect,
    plan_file: String,
    config_dir: String,
    state_gen_dir: String,
    writer: Arc<dyn LineWriter>,
}

impl ScriptEmitter {
    pub fn new(settings: &TerraformSettings, builder: CommandBuilder, writer: Arc<dyn LineWriter>) -> Self {
        Self {
            builder,
            dialect: settings.platform.dialect(),
            plan_file: settings.plan_file.clone(),
            config_dir: settings.config_dir.clone(),
            state_gen_dir: settings.state_gen_dir.clone(),
            writer,
        }
    }

    /// Emitter writing to disk in the settings' dialect.
    pub fn with_fs_writer(settings: &TerraformSettings, builder: CommandBuilder) -> Self {
        let writer = FsLineWriter::for_dialect(settings.platform.dialect());
        Self::new(settings, builder, Arc::new(writer))
    }

    /// Where the script for `kind` lands under `terraform_path`.
    pub fn script_path(&self, terraform_path: &Path, kind: ScriptKind) -> PathBuf {
        terraform_path.join(format!("{}{}", kind.base_name(), self.dialect.extension()))
    }

    /// Render the script for `request` without writing it.
    pub fn render(&self, request: &WorkflowRequest) -> ScriptDocument {
        let lines = match request.kind {
            ScriptKind::Export | ScriptKind::ImportState => self.export_lines(request),
            ScriptKind::Plan => self.plan_lines(request),
            ScriptKind::Apply => self.apply_lines(request, &self.config_dir),
            ScriptKind::Refresh => self.apply_lines(request, &self.state_gen_dir),
        };

        ScriptDocument {
            dialect: self.dialect,
            lines,
        }
    }

    /// Render and write the script for `request`, returning its path.
    pub fn emit(&self, request: &WorkflowRequest) -> IacResult<PathBuf> {
        let runs_terraform = !matches!(request.kind, ScriptKind::Export | ScriptKind::ImportState);
        if runs_terraform && self.builder.terraform_exec().is_none() {
            warn!(
                "No usable Terraform executable; {} script will not run",
                request.kind
            );
        }

        let document = self.render(request);
        let path = self.script_path(&request.terraform_path, request.kind);

        debug!("Writing {} lines to {:?}", document.lines.len(), path);
        self.writer.write_lines(&path, &document.lines)?;

        info!("Generated {} script at {:?}", request.kind, path);
        Ok(path)
    }

    /// Write all five scripts for the directory and options in `base`.
    pub fn emit_all(&self, base: &WorkflowRequest) -> IacResult<Vec<PathBuf>> {
        ScriptKind::all()
            .into_iter()
            .map(|kind| self.emit(&base.for_kind(kind)))
            .collect()
    }

    /// Export (or import-state) script.
    pub fn emit_export_script(
        &self,
        run_info: &RunInfo,
        terraform_path: &Path,
        env_script_name: &str,
        import_state: bool,
        create_dependencies: bool,
    ) -> IacResult<PathBuf> {
        let kind = if import_state {
            ScriptKind::ImportState
        } else {
            ScriptKind::Export
        };
        let request = WorkflowRequest::new(kind, terraform_path, env_script_name)
            .with_run_info(run_info.clone())
            .with_create_dependencies(create_dependencies);
        self.emit(&request)
    }

    pub fn emit_apply_script(&self, terraform_path: &Path, env_script_name: &str) -> IacResult<PathBuf> {
        self.emit(&WorkflowRequest::new(ScriptKind::Apply, terraform_path, env_script_name))
    }

    pub fn emit_plan_script(&self, terraform_path: &Path, env_script_name: &str) -> IacResult<PathBuf> {
        self.emit(&WorkflowRequest::new(ScriptKind::Plan, terraform_path, env_script_name))
    }

    pub fn emit_refresh_script(&self, terraform_path: &Path, env_script_name: &str) -> IacResult<PathBuf> {
        self.emit(&WorkflowRequest::new(ScriptKind::Refresh, terraform_path, env_script_name))
    }

    fn preamble(&self, request: &WorkflowRequest) -> Vec<String> {
        vec![
            self.dialect.header().to_string(),
            String::new(),
            self.dialect.source_env(&request.env_script_name),
            String::new(),
        ]
    }

    fn export_lines(&self, request: &WorkflowRequest) -> Vec<String> {
        let export = self.builder.export_command(
            &request.run_info,
            request.kind.import_state(),
            request.create_dependencies,
        );

        let mut lines = self.preamble(request);
        lines.push(export.to_line());
        lines
    }

    /// Dry run: plan without saving, no apply.
    fn plan_lines(&self, request: &WorkflowRequest) -> Vec<String> {
        let plan = self.builder.plan_command(
            &self.plan_file,
            request.kind.is_refresh(),
            request.kind.save_state(),
            &request.targets,
            &request.run_info,
        );

        let mut lines = self.preamble(request);
        lines.extend([
            self.dialect.change_dir(&self.config_dir),
            plan.to_line(),
            String::new(),
            self.dialect.change_dir(".."),
            String::new(),
        ]);
        lines
    }

    /// Plan to a file, apply it, and remove the file before and after.
    fn apply_lines(&self, request: &WorkflowRequest, dir: &str) -> Vec<String> {
        let is_refresh = request.kind.is_refresh();
        let plan = self.builder.plan_command(
            &self.plan_file,
            is_refresh,
            request.kind.save_state(),
            &request.targets,
            &request.run_info,
        );
        let apply = self
            .builder
            .apply_command(&self.plan_file, is_refresh, &request.run_info);
        let cleanup = self.dialect.delete_if_exists(&self.plan_file);

        let mut lines = self.preamble(request);
        lines.extend([
            self.dialect.change_dir(dir),
            cleanup.clone(),
            plan.to_line(),
            apply.to_line(),
            cleanup,
            String::new(),
            self.dialect.change_dir(".."),
            String::new(),
        ]);
        lines
    }
}
