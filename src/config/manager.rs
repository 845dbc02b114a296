use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::alias::{self, AliasValue, ParsedAlias};
use super::document::Document;
use super::error::{ConfigError, Result};
use super::locations::{ConfigLocations, TOOL_NAME};
use super::path;
use super::sync;
use super::validate::{SearchPath, Validator};
use super::value::Value;
use crate::bridge::{ConfigBridge, GitCliBridge};
use crate::fs::{FileSystem, OsFileSystem, PRIVATE_DIR_MODE, PRIVATE_FILE_MODE};

/// Owns the configuration document and everything needed to persist it.
///
/// A manager starts out holding defaults. [`load`](Self::load) replaces them
/// with the first configuration file found; every mutation is validated and
/// written back atomically before it becomes visible in memory.
pub struct ConfigManager {
    document: Document,
    locations: ConfigLocations,
    path: PathBuf,
    fs: Box<dyn FileSystem>,
    bridge: Box<dyn ConfigBridge>,
    search_path: SearchPath,
    tool_version: String,
    tool_commit: String,
}

impl ConfigManager {
    pub fn new(
        locations: ConfigLocations,
        fs: impl FileSystem + 'static,
        bridge: impl ConfigBridge + 'static,
        search_path: SearchPath,
    ) -> Self {
        let document = Document::with_defaults(&bridge);
        Self {
            path: locations.primary().to_path_buf(),
            tool_version: document.meta.version.clone(),
            tool_commit: document.meta.commit.clone(),
            document,
            locations,
            fs: Box::new(fs),
            bridge: Box::new(bridge),
            search_path,
        }
    }

    /// Manager for the current user: real filesystem, git CLI, `PATH` lookup.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(
            ConfigLocations::from_env()?,
            OsFileSystem::new(),
            GitCliBridge::new(),
            SearchPath::from_env(),
        ))
    }

    /// Load the first existing candidate file.
    ///
    /// When none exists the defaults are kept and the primary candidate
    /// becomes the save target. After a file is parsed, allow-listed values
    /// set in git's global configuration take precedence.
    pub fn load(&mut self) -> Result<()> {
        let found = self
            .locations
            .candidates()
            .iter()
            .find(|candidate| self.fs.exists(candidate))
            .cloned();

        let Some(candidate) = found else {
            log::debug!(
                "No configuration file found, using defaults (will save to {})",
                self.locations.primary().display()
            );
            self.path = self.locations.primary().to_path_buf();
            return Ok(());
        };

        let bytes = self
            .fs
            .read(&candidate)
            .map_err(|e| ConfigError::io("read", &candidate, e))?;
        let document: Document =
            serde_yaml::from_slice(&bytes).map_err(|source| ConfigError::Parse {
                path: candidate.clone(),
                source,
            })?;

        log::info!("Loaded configuration from {}", candidate.display());
        self.document = document;
        self.path = candidate;

        let changed = sync::sync_from_external(&mut self.document, self.bridge.as_ref());
        if !changed.is_empty() {
            log::debug!("Values taken from git: {}", changed.join(", "));
        }
        Ok(())
    }

    /// Validate and atomically write the current document, then push
    /// allow-listed values to git.
    pub fn save(&mut self) -> Result<()> {
        let mut document = self.document.clone();
        self.stamp_meta(&mut document);
        self.commit(document)
    }

    /// Read the value at a dotted path such as `behavior.auto-push`.
    pub fn get(&self, key: &str) -> Result<Value> {
        path::get(&self.document, key)
    }

    /// Assign the value at a dotted path, validate and save.
    ///
    /// Nothing changes, in memory or on disk, unless the whole document
    /// validates and is written. `meta.*` cannot be set.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        let canonical = self.canonical_key(key)?;
        if canonical.split('.').next() == Some("meta") {
            return Err(ConfigError::ReadOnly {
                path: key.to_string(),
            });
        }

        let mut document = self.document.clone();
        path::set(&mut document, key, value.into())?;
        self.stamp_meta(&mut document);
        self.commit(document)
    }

    /// `key` as written on disk, e.g. `Behavior.AutoPush` -> `behavior.auto-push`.
    pub fn canonical_key(&self, key: &str) -> Result<String> {
        path::canonical(&self.document, key)
    }

    /// Every setting keyed by dotted path. Aliases are listed as one entry.
    pub fn list(&self) -> BTreeMap<String, Value> {
        path::flatten(&self.document, "")
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// File the next save writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Validate the in-memory document without saving.
    pub fn validate(&self) -> Result<()> {
        self.validator().validate(&self.document)?;
        Ok(())
    }

    pub fn is_alias(&self, name: &str) -> bool {
        alias::is_alias(&self.document.aliases, name)
    }

    pub fn parse_alias(&self, name: &str) -> Result<ParsedAlias> {
        alias::parse_alias(&self.document.aliases, name)
    }

    pub fn alias_commands(&self, name: &str) -> Result<Vec<String>> {
        alias::alias_commands(&self.document.aliases, name)
    }

    /// All aliases that parse; malformed entries are skipped.
    pub fn all_aliases(&self) -> BTreeMap<String, ParsedAlias> {
        alias::all_aliases(&self.document.aliases)
    }

    /// Add or replace an alias, validate and save.
    pub fn set_alias(&mut self, name: &str, value: AliasValue) -> Result<()> {
        let mut document = self.document.clone();
        document.aliases.insert(name.to_string(), value);
        self.stamp_meta(&mut document);
        self.commit(document)
    }

    /// Remove an alias and save.
    pub fn remove_alias(&mut self, name: &str) -> Result<()> {
        let mut document = self.document.clone();
        if document.aliases.remove(name).is_none() {
            return Err(ConfigError::not_found(format!("aliases.{name}")));
        }
        self.stamp_meta(&mut document);
        self.commit(document)
    }

    /// Pull allow-listed values from git into memory. Returns the paths that changed.
    pub fn sync_from_external(&mut self) -> Vec<&'static str> {
        sync::sync_from_external(&mut self.document, self.bridge.as_ref())
    }

    /// Push allow-listed values to git. Returns the keys written.
    pub fn sync_to_external(&self) -> Result<Vec<String>> {
        sync::sync_to_external(&self.document, self.bridge.as_ref())
    }

    fn validator(&self) -> Validator<'_> {
        Validator::new(self.fs.as_ref(), &self.search_path)
    }

    fn stamp_meta(&self, document: &mut Document) {
        document.meta.version = self.tool_version.clone();
        document.meta.commit = self.tool_commit.clone();
    }

    /// Persist `document`, adopt it, then sync it to git.
    ///
    /// A sync failure is reported but the file has already been replaced.
    fn commit(&mut self, document: Document) -> Result<()> {
        self.write_atomically(&document)?;
        self.document = document;
        let written = self.sync_to_external()?;
        if !written.is_empty() {
            log::debug!("Synced to git: {}", written.join(", "));
        }
        Ok(())
    }

    /// Write-temp-then-rename. On any error before the rename completes the
    /// existing file is untouched and the temp file is removed.
    fn write_atomically(&self, document: &Document) -> Result<()> {
        let target = self.path.as_path();
        let dir = target
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        self.fs
            .create_dir_all(dir, PRIVATE_DIR_MODE)
            .map_err(|e| ConfigError::io("create directory", dir, e))?;

        let text = document.to_yaml().map_err(ConfigError::Serialize)?;

        self.validator().validate(document)?;

        let temp = self
            .fs
            .create_temp(dir, &format!(".{TOOL_NAME}config-"))
            .map_err(|e| ConfigError::io("create temporary file in", dir, e))?;

        let written = self
            .fs
            .set_permissions(&temp, PRIVATE_FILE_MODE)
            .map_err(|e| ConfigError::io("restrict permissions of", &temp, e))
            .and_then(|()| {
                self.fs
                    .write(&temp, text.as_bytes())
                    .map_err(|e| ConfigError::io("write", &temp, e))
            })
            .and_then(|()| {
                self.fs
                    .rename(&temp, target)
                    .map_err(|e| ConfigError::io("replace", target, e))
            });

        if let Err(e) = written {
            if let Err(cleanup) = self.fs.remove_file(&temp) {
                log::warn!(
                    "Failed to remove temporary file {}: {cleanup}",
                    temp.display()
                );
            }
            return Err(e);
        }

        // Hardening only: the new contents are already in place.
        if let Err(e) = self.fs.set_permissions(target, PRIVATE_FILE_MODE) {
            log::warn!(
                "Could not restrict permissions of {}: {e}",
                target.display()
            );
        }

        log::info!("Saved configuration to {}", target.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::RecordingBridge;
    use crate::fs::{FsOp, MemoryFileSystem};
    use rstest::rstest;

    const HOME: &str = "/home/tester";

    fn manager() -> (ConfigManager, MemoryFileSystem, RecordingBridge) {
        let fs = MemoryFileSystem::new();
        fs.add_executable("/usr/bin/vi");
        let bridge = RecordingBridge::new().with_version("2.43.0", "abc1234");
        let manager = ConfigManager::new(
            ConfigLocations::for_home(HOME),
            fs.clone(),
            bridge.clone(),
            SearchPath::new(["/usr/bin"]),
        );
        (manager, fs, bridge)
    }

    fn primary() -> PathBuf {
        PathBuf::from(HOME).join(".gitwiseconfig.yaml")
    }

    #[test]
    fn test_load_without_file_keeps_defaults() {
        let (mut manager, fs, _) = manager();
        manager.load().unwrap();
        assert_eq!(manager.document().default.branch, "main");
        assert_eq!(manager.path(), primary());
        assert!(fs.file_paths().is_empty());
    }

    #[test]
    fn test_load_prefers_primary_candidate() {
        let (mut manager, fs, _) = manager();
        let xdg = PathBuf::from(HOME).join(".config/gitwise/config.yaml");
        fs.create_dir_all(xdg.parent().unwrap(), 0o700).unwrap();
        fs.write(&xdg, b"default:\n  branch: from-xdg\n").unwrap();

        manager.load().unwrap();
        assert_eq!(manager.document().default.branch, "from-xdg");
        assert_eq!(manager.path(), xdg);

        fs.write(&primary(), b"default:\n  branch: from-home\n").unwrap();
        manager.load().unwrap();
        assert_eq!(manager.document().default.branch, "from-home");
        assert_eq!(manager.path(), primary());
    }

    #[test]
    fn test_load_parse_failure_keeps_document() {
        let (mut manager, fs, _) = manager();
        fs.create_dir_all(Path::new(HOME), 0o700).unwrap();
        fs.write(&primary(), b"ui:\n  color: definitely\n").unwrap();

        let err = manager.load().unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert_eq!(manager.document().default.branch, "main");
    }

    #[test]
    fn test_save_writes_private_file_without_leftovers() {
        let (mut manager, fs, _) = manager();
        manager.save().unwrap();

        assert_eq!(fs.file_paths(), vec![primary(), PathBuf::from("/usr/bin/vi")]);
        assert_eq!(fs.stat(&primary()).unwrap().mode, PRIVATE_FILE_MODE);
        let text = String::from_utf8(fs.read(&primary()).unwrap()).unwrap();
        assert!(text.contains("version: 2.43.0"));
    }

    #[test]
    fn test_set_rejects_meta() {
        let (mut manager, _, _) = manager();
        let err = manager.set("meta.version", "9.9.9").unwrap_err();
        assert!(matches!(err, ConfigError::ReadOnly { .. }));
    }

    #[rstest]
    #[case::hyphenated_section("me-ta.schema-version", "99")]
    #[case::underscored_section("_meta.created", "2000-01-01T00:00:00Z")]
    #[case::mixed_case("Meta.Created", "2000-01-01T00:00:00Z")]
    #[case::field_name("m_eta.schema_version", "7")]
    #[case::whole_section("META", "x")]
    fn test_set_rejects_meta_under_any_spelling(#[case] key: &str, #[case] value: &str) {
        let (mut manager, fs, _) = manager();
        let before = manager.document().meta.clone();

        let err = manager.set(key, value).unwrap_err();

        assert!(matches!(err, ConfigError::ReadOnly { .. }), "{key}: {err}");
        assert_eq!(manager.document().meta, before);
        assert!(!fs.exists(&primary()));
    }

    #[test]
    fn test_failed_rename_keeps_previous_file() {
        let (mut manager, fs, _) = manager();
        manager.set("default.branch", "develop").unwrap();
        let before = fs.read(&primary()).unwrap();

        fs.fail_on(FsOp::Rename);
        let err = manager.set("default.branch", "release").unwrap_err();
        assert!(matches!(err, ConfigError::Io { op: "replace", .. }));

        assert_eq!(fs.read(&primary()).unwrap(), before);
        assert_eq!(manager.document().default.branch, "develop");
        assert_eq!(fs.file_paths().len(), 2, "temp file left behind");
    }

    #[test]
    fn test_permission_hardening_failure_is_not_fatal() {
        let (mut manager, fs, _) = manager();
        fs.fail_on_path(FsOp::SetPermissions, primary());

        manager.set("ui.pager", "false").unwrap();

        assert!(!manager.document().ui.pager);
        assert_eq!(fs.stat(&primary()).unwrap().mode, PRIVATE_FILE_MODE);
    }

    #[test]
    fn test_temp_permission_failure_aborts_save() {
        let (mut manager, fs, _) = manager();
        fs.fail_on(FsOp::SetPermissions);

        let err = manager.save().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Io {
                op: "restrict permissions of",
                ..
            }
        ));
        assert!(!fs.exists(&primary()));
        assert_eq!(fs.file_paths(), vec![PathBuf::from("/usr/bin/vi")]);
    }
}
