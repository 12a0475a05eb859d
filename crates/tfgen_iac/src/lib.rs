//! # tfgen_iac
//!
//! Terraform command generation, workflow script emission and environment
//! validation for tfgen.
//!
//! This crate decides which flags go into each Terraform or provider
//! invocation, wraps those invocations into batch or shell scripts, and
//! reports whether a usable, recent enough Terraform is installed.
//!
//! ## Features
//!
//! - Export, import-state, plan, apply and refresh command lines
//! - Windows batch and POSIX shell script scaffolding
//! - Local-install vs search-path executable resolution
//! - Minimum Terraform version checks
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use tfgen_iac::{
//!     CommandBuilder, EnvironmentValidator, ScriptEmitter, ScriptKind, SystemLocator,
//!     TerraformSettings, WorkflowRequest,
//! };
//! use tfgen_runner::CliRunner;
//!
//! let settings = TerraformSettings::default();
//! let validator = EnvironmentValidator::new(
//!     settings.clone(),
//!     Arc::new(SystemLocator::new()),
//!     Arc::new(CliRunner::new()),
//! );
//!
//! let builder = CommandBuilder::new(&settings, validator.resolve_executable());
//! let emitter = ScriptEmitter::with_fs_writer(&settings, builder);
//!
//! let request = WorkflowRequest::new(ScriptKind::Apply, "./terraform", "set_env");
//! emitter.emit(&request).unwrap();
//! ```

pub mod config;
pub mod error;
pub mod locator;
pub mod platform;
pub mod script;
pub mod terraform;
pub mod validator;
pub mod version;

pub use config::{RunInfo, TargetSpec, TerraformSettings, DEFAULT_PARALLELISM, DEFAULT_REQUIRED_VERSION};
pub use error::{IacError, IacResult};
pub use locator::{ExecutableLocator, MockLocator, SystemLocator};
pub use platform::{ScriptDialect, TargetPlatform};
pub use script::{FsLineWriter, LineWriter, ScriptDocument, ScriptEmitter, ScriptKind, WorkflowRequest};
pub use terraform::{
    CommandBuilder, CommandTokens, TerraformCommand, MANAGEMENT_ZONES_SCHEMA, MANAGEMENT_ZONE_RESOURCE,
};
pub use validator::{
    EnvironmentIssue, EnvironmentValidator, ProviderProbe, TerraformChecks, TerraformProbe,
    TerraformStatus, VersionCheck,
};
pub use version::{compare_versions, TerraformVersion};
