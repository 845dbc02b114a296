//! Access to git's own global configuration.
//!
//! The configuration manager mirrors a handful of its settings into
//! `git config --global` and reads them back. [`ConfigBridge`] is the narrow
//! seam for that: [`GitCliBridge`] shells out to `git`, while
//! [`RecordingBridge`] keeps everything in memory for tests.

mod git;
mod recording;

use anyhow::Result;

pub use git::GitCliBridge;
pub use recording::RecordingBridge;

/// Read/write access to the external tool's global configuration.
pub trait ConfigBridge {
    /// Look up a global key. `None` when the key is unset.
    fn get_global_value(&self, key: &str) -> Option<String>;

    /// Set a global key.
    fn set_global_value(&self, key: &str, value: &str) -> Result<()>;

    /// Version string of the external tool, e.g. `2.43.0`.
    fn tool_version(&self) -> Result<String>;

    /// Short revision identifier, e.g. an abbreviated commit hash.
    fn tool_revision(&self) -> Result<String>;
}
