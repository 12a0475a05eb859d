//! Error types for IaC module.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for IaC operations.
pub type IacResult<T> = Result<T, IacError>;

/// Errors that can occur during IaC operations.
///
/// Missing executables and failed version queries are not errors; they are
/// reported through the optional fields of the validation records.
#[derive(Error, Debug)]
pub enum IacError {
    #[error("Invalid version string '{0}': expected MAJOR.MINOR.PATCH")]
    InvalidVersion(String),

    #[error("Invalid platform: {0}")]
    InvalidPlatform(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Failed to write script {path}: {source}")]
    ScriptWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
