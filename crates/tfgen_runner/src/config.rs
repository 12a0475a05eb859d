//! Process invocation configuration.

use serde::{Deserialize, Serialize};

/// A single external command invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandConfig {
    /// Program to execute (bare name or path)
    pub program: String,
    /// Arguments passed after the program
    pub args: Vec<String>,
}

impl CommandConfig {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Build a configuration from an argv-style slice.
    ///
    /// Returns `None` when `argv` is empty or its first element is blank.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, rest) = argv.split_first()?;
        if program.trim().is_empty() {
            return None;
        }
        Some(Self::new(program.clone()).args(rest.iter().cloned()))
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Full argv, program first.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }

    /// Human readable command line for logs.
    pub fn display_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            if arg.contains(' ') {
                line.push_str(&format!(" '{}'", arg));
            } else {
                line.push(' ');
                line.push_str(arg);
            }
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_argv() {
        let argv = vec!["terraform".to_string(), "-version".to_string()];
        let config = CommandConfig::from_argv(&argv).unwrap();

        assert_eq!(config.program, "terraform");
        assert_eq!(config.args, vec!["-version".to_string()]);
        assert_eq!(config.argv(), argv);
    }

    #[test]
    fn test_from_argv_rejects_empty_program() {
        assert!(CommandConfig::from_argv(&[]).is_none());
        assert!(CommandConfig::from_argv(&["".to_string()]).is_none());
    }

    #[test]
    fn test_display_line_quotes_spaces() {
        let config = CommandConfig::new("/opt/my tools/terraform")
            .arg("plan")
            .arg("-out=my plan");

        assert_eq!(
            config.display_line(),
            "/opt/my tools/terraform plan '-out=my plan'"
        );
    }
}
