//! Terraform version parsing and comparison.

use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{IacError, IacResult};

/// Three-field `MAJOR.MINOR.PATCH` version.
///
/// Ordering compares major, then minor, then patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TerraformVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl TerraformVersion {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self { major, minor, patch }
    }

    /// Extract the version from `terraform -version` output.
    ///
    /// Returns `None` when the output does not contain a `Terraform vX.Y.Z`
    /// banner.
    pub fn from_version_output(output: &str) -> Option<Self> {
        static BANNER: OnceLock<Regex> = OnceLock::new();
        let banner = BANNER.get_or_init(|| {
            Regex::new(r"Terraform v(\d+\.\d+\.\d+)").expect("version banner regex is valid")
        });

        banner
            .captures(output)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }
}

impl FromStr for TerraformVersion {
    type Err = IacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || IacError::InvalidVersion(s.to_string());

        let fields = s
            .trim()
            .split('.')
            .map(|part| part.parse::<u64>().map_err(|_| invalid()))
            .collect::<IacResult<Vec<_>>>()?;

        match fields.as_slice() {
            [major, minor, patch] => Ok(Self::new(*major, *minor, *patch)),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for TerraformVersion {
    type Error = IacError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TerraformVersion> for String {
    fn from(version: TerraformVersion) -> Self {
        version.to_string()
    }
}

impl std::fmt::Display for TerraformVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Compare two dotted version strings field by field.
///
/// Both inputs must have exactly three numeric fields.
pub fn compare_versions(current: &str, required: &str) -> IacResult<Ordering> {
    let current: TerraformVersion = current.parse()?;
    let required: TerraformVersion = required.parse()?;
    Ok(current.cmp(&required))
}
