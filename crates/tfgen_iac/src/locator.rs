//! Executable discovery on disk and on the search path.

use std::collections::{HashMap, HashSet};
use std::env;
use std::path::{Path, PathBuf};

/// Filesystem and search-path queries used by the environment validator.
pub trait ExecutableLocator: Send + Sync {
    /// Whether anything exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Whether `path` is a file the current user may execute.
    fn is_executable(&self, path: &Path) -> bool;

    /// Find `name` on the search path. With `require_execute`, only
    /// executable candidates count.
    fn which(&self, name: &str, require_execute: bool) -> Option<PathBuf>;
}

/// Locator backed by the real filesystem and `PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLocator;

impl SystemLocator {
    pub fn new() -> Self {
        Self
    }

    fn candidates(name: &str) -> Vec<String> {
        if cfg!(windows) && !name.to_lowercase().ends_with(".exe") {
            vec![name.to_string(), format!("{}.exe", name)]
        } else {
            vec![name.to_string()]
        }
    }
}

impl ExecutableLocator for SystemLocator {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    #[cfg(unix)]
    fn is_executable(&self, path: &Path) -> bool {
        use std::os::unix::fs::PermissionsExt;

        path.metadata()
            .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    fn is_executable(&self, path: &Path) -> bool {
        path.is_file()
    }

    /// With `require_execute` this defers to the `which` crate, which honours
    /// `PATHEXT` on Windows. Without it, `PATH` is scanned directly for any
    /// file named `name`, plus `name.exe` when the host (not the target
    /// platform) is Windows. Other `PATHEXT` extensions are not tried.
    fn which(&self, name: &str, require_execute: bool) -> Option<PathBuf> {
        if require_execute {
            return which::which(name).ok();
        }

        let search_path = env::var_os("PATH")?;
        env::split_paths(&search_path).find_map(|dir| {
            Self::candidates(name)
                .into_iter()
                .map(|candidate| dir.join(candidate))
                .find(|path| path.is_file())
        })
    }
}

/// In-memory locator for tests.
#[derive(Debug, Clone, Default)]
pub struct MockLocator {
    files: HashSet<PathBuf>,
    executables: HashSet<PathBuf>,
    search_path: HashMap<String, (PathBuf, bool)>,
}

impl MockLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file that exists but is not executable.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.insert(path.into());
        self
    }

    /// Register an executable file.
    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.files.insert(path.clone());
        self.executables.insert(path);
        self
    }

    /// Put `name` on the search path at `path`.
    pub fn with_on_path(
        mut self,
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        executable: bool,
    ) -> Self {
        self.search_path.insert(name.into(), (path.into(), executable));
        self
    }
}

impl ExecutableLocator for MockLocator {
    fn exists(&self, path: &Path) -> bool {
        self.files.contains(path)
    }

    fn is_executable(&self, path: &Path) -> bool {
        self.executables.contains(path)
    }

    fn which(&self, name: &str, require_execute: bool) -> Option<PathBuf> {
        self.search_path
            .get(name)
            .filter(|(_, executable)| *executable || !require_execute)
            .map(|(path, _)| path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_locator_search_path() {
        let locator = MockLocator::new().with_on_path("terraform", "/usr/bin/terraform", false);

        assert_eq!(
            locator.which("terraform", false),
            Some(PathBuf::from("/usr/bin/terraform"))
        );
        assert_eq!(locator.which("terraform", true), None);
        assert_eq!(locator.which("tofu", false), None);
    }

    #[test]
    fn test_mock_locator_files() {
        let locator = MockLocator::new()
            .with_file("/opt/bin/terraform")
            .with_executable("/opt/bin/provider");

        assert!(locator.exists(Path::new("/opt/bin/terraform")));
        assert!(!locator.is_executable(Path::new("/opt/bin/terraform")));
        assert!(locator.is_executable(Path::new("/opt/bin/provider")));
        assert!(!locator.exists(Path::new("/opt/bin/missing")));
    }

    #[cfg(unix)]
    #[test]
    fn test_system_locator_exec_bit() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("plain");
        let exec = dir.path().join("exec");
        fs::write(&plain, "").unwrap();
        fs::write(&exec, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&plain, fs::Permissions::from_mode(0o644)).unwrap();
        fs::set_permissions(&exec, fs::Permissions::from_mode(0o755)).unwrap();

        let locator = SystemLocator::new();
        assert!(locator.exists(&plain));
        assert!(!locator.is_executable(&plain));
        assert!(locator.is_executable(&exec));
        assert!(!locator.is_executable(dir.path()));
    }
}
