use std::path::{Path, PathBuf};

use super::error::{ConfigError, Result};

pub const TOOL_NAME: &str = "gitwise";

/// Where the configuration file may live.
///
/// Candidates are tried in order:
/// 1. `~/.gitwiseconfig.yaml`
/// 2. `~/.config/gitwise/config.yaml`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLocations {
    candidates: Vec<PathBuf>,
}

impl ConfigLocations {
    /// Standard candidates under `home`.
    pub fn for_home(home: impl AsRef<Path>) -> Self {
        let home = home.as_ref();
        Self {
            candidates: vec![
                home.join(format!(".{TOOL_NAME}config.yaml")),
                home.join(".config").join(TOOL_NAME).join("config.yaml"),
            ],
        }
    }

    /// Standard candidates under the current user's home directory.
    pub fn from_env() -> Result<Self> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeDirUnavailable)?;
        Ok(Self::for_home(home))
    }

    /// A single explicit file, e.g. from `--config`.
    pub fn single(path: impl Into<PathBuf>) -> Self {
        Self {
            candidates: vec![path.into()],
        }
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// The path written to when no candidate exists yet.
    pub fn primary(&self) -> &Path {
        &self.candidates[0]
    }
}

/// Directory holding gitwise's own state, such as its log file.
pub fn state_dir() -> Result<PathBuf> {
    // Follow XDG Base Directory Specification
    if let Some(xdg_config) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(xdg_config).join(TOOL_NAME));
    }
    let home = dirs::home_dir().ok_or(ConfigError::HomeDirUnavailable)?;
    Ok(home.join(".config").join(TOOL_NAME))
}

/// Path of the log file.
pub fn log_file_path() -> Result<PathBuf> {
    Ok(state_dir()?.join(format!("{TOOL_NAME}.log")))
}
