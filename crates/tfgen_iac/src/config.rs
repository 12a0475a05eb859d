//! Settings and caller-supplied run configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{IacError, IacResult};
use crate::platform::TargetPlatform;
use crate::version::TerraformVersion;

/// Minimum Terraform version with the performance fixes the workflows rely on.
pub const DEFAULT_REQUIRED_VERSION: TerraformVersion = TerraformVersion::new(1, 8, 2);

/// Terraform's own default for `-parallelism`.
pub const DEFAULT_PARALLELISM: u32 = 10;

/// Fixed names and locations used by command generation and validation.
///
/// Loaded once at startup and passed to the builders, so nothing in the
/// crate reads global state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerraformSettings {
    /// Terraform executable name, without platform suffix
    pub terraform_exec: String,
    /// Provider executable name, without platform suffix
    pub provider_exec: String,
    /// Minimum acceptable Terraform version
    pub required_version: TerraformVersion,
    /// Plan artifact shared by the plan and apply steps
    pub plan_file: String,
    /// Directory holding the exported configuration
    pub config_dir: String,
    /// Directory used for state generation (refresh)
    pub state_gen_dir: String,
    /// Fixed local install directory for Terraform
    pub terraform_dir: PathBuf,
    /// Provider install directory; defaults to `terraform_dir`
    pub provider_dir: Option<PathBuf>,
    /// Parallelism used when the run info does not override it
    pub default_parallelism: u32,
    /// Platform the scripts and probes target
    pub platform: TargetPlatform,
}

impl Default for TerraformSettings {
    fn default() -> Self {
        Self {
            terraform_exec: "terraform".to_string(),
            provider_exec: "terraform-provider-dynatrace".to_string(),
            required_version: DEFAULT_REQUIRED_VERSION,
            plan_file: "terraform.tfplan".to_string(),
            config_dir: "configuration".to_string(),
            state_gen_dir: "state_gen".to_string(),
            terraform_dir: PathBuf::from("bin"),
            provider_dir: None,
            default_parallelism: DEFAULT_PARALLELISM,
            platform: TargetPlatform::current(),
        }
    }
}

impl TerraformSettings {
    /// Load settings from a YAML file. Missing keys keep their defaults.
    pub fn from_yaml_file(path: &Path) -> IacResult<Self> {
        debug!("Loading settings from {:?}", path);
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> IacResult<Self> {
        let settings: Self = serde_yaml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings that would produce unusable commands.
    pub fn validate(&self) -> IacResult<()> {
        let required = [
            ("terraform_exec", &self.terraform_exec),
            ("provider_exec", &self.provider_exec),
            ("plan_file", &self.plan_file),
            ("config_dir", &self.config_dir),
            ("state_gen_dir", &self.state_gen_dir),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(IacError::InvalidSettings(format!("{} must not be empty", name)));
            }
        }
        // Scripts return with a single `cd ..`
        for (name, value) in [
            ("config_dir", &self.config_dir),
            ("state_gen_dir", &self.state_gen_dir),
        ] {
            if !is_single_dir_name(value) {
                return Err(IacError::InvalidSettings(format!(
                    "{} must be a single relative directory name, got {:?}",
                    name, value
                )));
            }
        }
        if self.default_parallelism == 0 {
            return Err(IacError::InvalidSettings(
                "default_parallelism must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_platform(mut self, platform: TargetPlatform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_terraform_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.terraform_dir = dir.into();
        self
    }

    pub fn with_provider_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.provider_dir = Some(dir.into());
        self
    }

    pub fn with_required_version(mut self, version: TerraformVersion) -> Self {
        self.required_version = version;
        self
    }

    /// Directory the provider is installed in.
    ///
    /// On macOS the provider always lives next to Terraform.
    pub fn provider_install_dir(&self) -> &Path {
        match (self.platform, &self.provider_dir) {
            (TargetPlatform::Darwin, _) | (_, None) => &self.terraform_dir,
            (_, Some(dir)) => dir,
        }
    }

    /// Terraform file name including the platform suffix.
    pub fn terraform_file_name(&self) -> String {
        self.platform.executable_name(&self.terraform_exec)
    }

    /// Provider file name including the platform suffix.
    pub fn provider_file_name(&self) -> String {
        self.platform.executable_name(&self.provider_exec)
    }
}

fn is_single_dir_name(value: &str) -> bool {
    let value = value.trim();
    !value.contains(&['/', '\\', ':'][..]) && value != "." && value != ".."
}

/// Caller-supplied options for one export/apply run. Read-only here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunInfo {
    /// Restrict an export to one settings schema
    pub forced_schema_id: Option<String>,
    /// `-parallelism` override; ignored unless positive
    pub terraform_parallelism: Option<i64>,
}

impl RunInfo {
    /// Load run info from a YAML or JSON file, chosen by extension.
    pub fn from_file(path: &Path) -> IacResult<Self> {
        read_structured(path)
    }

    pub fn with_forced_schema_id(mut self, schema_id: impl Into<String>) -> Self {
        self.forced_schema_id = Some(schema_id.into());
        self
    }

    pub fn with_parallelism(mut self, parallelism: i64) -> Self {
        self.terraform_parallelism = Some(parallelism);
        self
    }

    /// Forced schema id, if set and non-empty.
    pub fn forced_schema_id(&self) -> Option<&str> {
        self.forced_schema_id
            .as_deref()
            .filter(|id| !id.is_empty())
    }

    /// Parallelism override, if set and positive.
    pub fn parallelism(&self) -> Option<u64> {
        self.terraform_parallelism
            .and_then(|p| u64::try_from(p).ok())
            .filter(|p| *p > 0)
    }
}

/// Read a YAML or JSON file, chosen by extension.
fn read_structured<T: DeserializeOwned>(path: &Path) -> IacResult<T> {
    debug!("Reading {:?}", path);
    let content = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        Ok(serde_json::from_str(&content)?)
    } else {
        Ok(serde_yaml::from_str(&content)?)
    }
}

/// A module-qualified resource instance to scope a plan to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpec {
    /// Resource module (resource type)
    pub module: String,
    /// Trimmed module path component
    pub module_trimmed: String,
    /// Unique resource name
    pub unique_name: String,
}

impl TargetSpec {
    pub fn new(
        module: impl Into<String>,
        module_trimmed: impl Into<String>,
        unique_name: impl Into<String>,
    ) -> Self {
        Self {
            module: module.into(),
            module_trimmed: module_trimmed.into(),
            unique_name: unique_name.into(),
        }
    }

    /// Load a target list from a YAML or JSON file.
    pub fn list_from_file(path: &Path) -> IacResult<Vec<Self>> {
        read_structured(path)
    }

    /// Resource address as used by `-target`.
    pub fn address(&self) -> String {
        format!(
            "module.{}.{}.{}",
            self.module_trimmed, self.module, self.unique_name
        )
    }
}
