//! # tfgen_runner
//!
//! Process execution wrapper for tfgen.
//!
//! The Terraform tooling layer never spawns processes directly. It talks to a
//! [`ProcessRunner`], which lets tests substitute [`MockRunner`] for the real
//! [`CliRunner`].
//!
//! # Example
//!
//! ```rust,no_run
//! use tfgen_runner::{CliRunner, CommandConfig, ProcessRunner};
//!
//! let runner = CliRunner::new();
//! let result = runner
//!     .run_command(&CommandConfig::new("terraform").arg("-version"))
//!     .unwrap();
//! println!("{}", result.combined_output());
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod mock;
pub mod runner;

pub use cli::CliRunner;
pub use config::CommandConfig;
pub use error::{RunnerError, RunnerResult};
pub use mock::{CapturedCall, MockResponse, MockRunner};
pub use runner::{ExecutionResult, ProcessRunner, NO_EXIT_CODE};
