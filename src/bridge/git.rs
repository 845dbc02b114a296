//! Bridge implementation using the git CLI.

use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::process::Command;

use super::ConfigBridge;

/// Talks to `git config --global` through the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCliBridge {
    program: PathBuf,
}

impl Default for GitCliBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl GitCliBridge {
    pub fn new() -> Self {
        Self::with_program("git")
    }

    /// Use a specific git executable instead of the one on `PATH`.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run git and return trimmed stdout.
    fn run_git(&self, args: &[&str]) -> Result<String> {
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .with_context(|| format!("Failed to run 'git {}'", args.join(" ")))?;

        if !output.status.success() {
            return Err(anyhow!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// `git version 2.43.0` -> `2.43.0`
fn parse_version(output: &str) -> Option<String> {
    output
        .strip_prefix("git version ")
        .map(|rest| rest.split_whitespace().next().unwrap_or(rest).to_string())
        .filter(|v| !v.is_empty())
}

impl ConfigBridge for GitCliBridge {
    fn get_global_value(&self, key: &str) -> Option<String> {
        // `git config --get` exits 1 for unset keys, which lands here as well.
        match self.run_git(&["config", "--global", "--get", key]) {
            Ok(value) => Some(value),
            Err(e) => {
                log::debug!("git config --global {key} not available: {e}");
                None
            }
        }
    }

    fn set_global_value(&self, key: &str, value: &str) -> Result<()> {
        self.run_git(&["config", "--global", key, value])?;
        Ok(())
    }

    fn tool_version(&self) -> Result<String> {
        let output = self.run_git(&["--version"])?;
        parse_version(&output).ok_or_else(|| anyhow!("Unexpected git --version output: {output}"))
    }

    fn tool_revision(&self) -> Result<String> {
        self.run_git(&["rev-parse", "--short", "HEAD"])
    }
}
