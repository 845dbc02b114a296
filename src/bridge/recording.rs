use anyhow::{anyhow, Result};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::ConfigBridge;

#[derive(Debug, Default)]
struct Inner {
    values: BTreeMap<String, String>,
    writes: Vec<(String, String)>,
    version: Option<String>,
    revision: Option<String>,
    fail_writes: bool,
}

/// In-memory [`ConfigBridge`] that records every write.
///
/// Clones share state. Version and revision queries fail until set with
/// [`with_version`](Self::with_version), which exercises the fallback path.
#[derive(Debug, Clone, Default)]
pub struct RecordingBridge {
    inner: Rc<RefCell<Inner>>,
}

impl RecordingBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(self, version: &str, revision: &str) -> Self {
        {
            let mut inner = self.inner.borrow_mut();
            inner.version = Some(version.to_string());
            inner.revision = Some(revision.to_string());
        }
        self
    }

    /// Preload a global value without recording it as a write.
    pub fn with_value(self, key: &str, value: &str) -> Self {
        self.inner
            .borrow_mut()
            .values
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Make every `set_global_value` call fail.
    pub fn failing_writes(self) -> Self {
        self.inner.borrow_mut().fail_writes = true;
        self
    }

    /// All writes in the order they were made.
    pub fn writes(&self) -> Vec<(String, String)> {
        self.inner.borrow().writes.clone()
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.inner.borrow().values.get(key).cloned()
    }

    pub fn clear_writes(&self) {
        self.inner.borrow_mut().writes.clear();
    }
}

impl ConfigBridge for RecordingBridge {
    fn get_global_value(&self, key: &str) -> Option<String> {
        self.value(key)
    }

    fn set_global_value(&self, key: &str, value: &str) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.fail_writes {
            return Err(anyhow!("refusing to write {key}"));
        }
        inner.values.insert(key.to_string(), value.to_string());
        inner.writes.push((key.to_string(), value.to_string()));
        Ok(())
    }

    fn tool_version(&self) -> Result<String> {
        self.inner
            .borrow()
            .version
            .clone()
            .ok_or_else(|| anyhow!("version unavailable"))
    }

    fn tool_revision(&self) -> Result<String> {
        self.inner
            .borrow()
            .revision
            .clone()
            .ok_or_else(|| anyhow!("revision unavailable"))
    }
}
