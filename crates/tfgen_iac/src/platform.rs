//! Target platform and script dialect definitions.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IacError;

/// Operating system the generated scripts and probes target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TargetPlatform {
    Windows,
    Darwin,
    Linux,
}

impl TargetPlatform {
    /// Platform of the running binary.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::Darwin
        } else {
            Self::Linux
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Darwin => "darwin",
            Self::Linux => "linux",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![Self::Windows, Self::Darwin, Self::Linux]
    }

    /// Suffix appended to executable names.
    pub fn exe_suffix(&self) -> &'static str {
        match self {
            Self::Windows => ".exe",
            Self::Darwin | Self::Linux => "",
        }
    }

    /// Executable file name for a bare program name.
    pub fn executable_name(&self, name: &str) -> String {
        format!("{}{}", name, self.exe_suffix())
    }

    /// Whether the provider needs a live smoke test before it can be trusted.
    ///
    /// Gatekeeper can refuse to start unsigned binaries on macOS even when the
    /// executable bit is set.
    pub fn requires_provider_smoke_test(&self) -> bool {
        matches!(self, Self::Darwin)
    }

    /// Script dialect used for generated scripts.
    pub fn dialect(&self) -> ScriptDialect {
        match self {
            Self::Windows => ScriptDialect::Batch,
            Self::Darwin | Self::Linux => ScriptDialect::Posix,
        }
    }
}

impl Default for TargetPlatform {
    fn default() -> Self {
        Self::current()
    }
}

impl FromStr for TargetPlatform {
    type Err = IacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "windows" => Ok(Self::Windows),
            "darwin" | "macos" => Ok(Self::Darwin),
            "linux" => Ok(Self::Linux),
            other => Err(IacError::InvalidPlatform(other.to_string())),
        }
    }
}

impl TryFrom<String> for TargetPlatform {
    type Error = IacError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TargetPlatform> for String {
    fn from(platform: TargetPlatform) -> Self {
        platform.as_str().to_string()
    }
}

impl std::fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Shell syntax for generated scripts.
///
/// Command tokens are shared between dialects; only the scaffolding around
/// them and the output-discard marker differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptDialect {
    /// Windows batch (`.cmd`)
    Batch,
    /// POSIX shell (`.sh`)
    Posix,
}

impl ScriptDialect {
    /// First line of every script.
    pub fn header(&self) -> &'static str {
        match self {
            Self::Batch => "@ECHO OFF",
            Self::Posix => "#!/bin/sh",
        }
    }

    /// Line that sources the environment-setup script (name without extension).
    pub fn source_env(&self, env_script_name: &str) -> String {
        match self {
            Self::Batch => format!("CALL {}{}", env_script_name, self.extension()),
            Self::Posix => format!(". ./{}{}", env_script_name, self.extension()),
        }
    }

    pub fn change_dir(&self, dir: &str) -> String {
        format!("cd {}", dir)
    }

    /// Delete `file` only if it exists, so a missing file is not an error.
    pub fn delete_if_exists(&self, file: &str) -> String {
        match self {
            Self::Batch => format!("IF EXIST {} DEL {}", file, file),
            Self::Posix => format!("[ -f {} ] && rm {}", file, file),
        }
    }

    /// Token appended to a command line to discard its standard output.
    pub fn discard_output(&self) -> &'static str {
        match self {
            Self::Batch => ">NUL",
            Self::Posix => ">/dev/null",
        }
    }

    /// Script file extension, including the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Batch => ".cmd",
            Self::Posix => ".sh",
        }
    }

    pub fn line_ending(&self) -> &'static str {
        match self {
            Self::Batch => "\r\n",
            Self::Posix => "\n",
        }
    }

    /// Whether written scripts need the executable bit to be runnable.
    pub fn needs_exec_bit(&self) -> bool {
        matches!(self, Self::Posix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_parse() {
        assert_eq!("Windows".parse::<TargetPlatform>().unwrap(), TargetPlatform::Windows);
        assert_eq!("macos".parse::<TargetPlatform>().unwrap(), TargetPlatform::Darwin);
        assert_eq!("linux".parse::<TargetPlatform>().unwrap(), TargetPlatform::Linux);
        assert!("plan9".parse::<TargetPlatform>().is_err());

        for platform in TargetPlatform::all() {
            assert_eq!(platform.as_str().parse::<TargetPlatform>().unwrap(), platform);
        }
    }

    #[test]
    fn test_executable_name() {
        assert_eq!(TargetPlatform::Windows.executable_name("terraform"), "terraform.exe");
        assert_eq!(TargetPlatform::Linux.executable_name("terraform"), "terraform");
        assert_eq!(TargetPlatform::Darwin.executable_name("terraform"), "terraform");
    }

    #[test]
    fn test_only_darwin_smoke_tests_provider() {
        assert!(TargetPlatform::Darwin.requires_provider_smoke_test());
        assert!(!TargetPlatform::Windows.requires_provider_smoke_test());
        assert!(!TargetPlatform::Linux.requires_provider_smoke_test());
    }

    #[test]
    fn test_batch_scaffolding() {
        let d = ScriptDialect::Batch;
        assert_eq!(d.header(), "@ECHO OFF");
        assert_eq!(d.source_env("set_env"), "CALL set_env.cmd");
        assert_eq!(d.change_dir("configuration"), "cd configuration");
        assert_eq!(d.delete_if_exists("p.tfplan"), "IF EXIST p.tfplan DEL p.tfplan");
        assert_eq!(d.discard_output(), ">NUL");
    }

    #[test]
    fn test_posix_scaffolding() {
        let d = ScriptDialect::Posix;
        assert_eq!(d.header(), "#!/bin/sh");
        assert_eq!(d.source_env("set_env"), ". ./set_env.sh");
        assert_eq!(d.delete_if_exists("p.tfplan"), "[ -f p.tfplan ] && rm p.tfplan");
        assert_eq!(d.discard_output(), ">/dev/null");
        assert!(d.needs_exec_bit());
    }
}
