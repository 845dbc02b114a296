//! Two-way sync between the document and git's global configuration.
//!
//! Only a fixed set of keys is mirrored. Sequence aliases stay local because
//! git aliases expand to a single command.

use super::alias::AliasValue;
use super::document::Document;
use super::error::{ConfigError, Result};
use crate::bridge::ConfigBridge;

const EDITOR_KEY: &str = "core.editor";
const MERGE_TOOL_KEY: &str = "merge.tool";
const BRANCH_KEY: &str = "init.defaultBranch";
const COLOR_KEY: &str = "color.ui";
const PAGER_KEY: &str = "core.pager";
const AUTO_FETCH_KEY: &str = "gitwise.autoFetch";
const CONFIRM_KEY: &str = "gitwise.confirmDestructive";

/// Pager command that turns paging off.
const NO_PAGER: &str = "cat";
const DEFAULT_PAGER: &str = "less";

fn parse_color(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "auto" | "always" | "true" | "on" | "yes" => Some(true),
        "never" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

fn pager_disabled(value: &str) -> bool {
    matches!(value, NO_PAGER | "false" | "")
}

/// Copy allow-listed values from git into `document`.
///
/// Unset or empty git values are ignored. Returns the document paths that changed.
pub fn sync_from_external(document: &mut Document, bridge: &dyn ConfigBridge) -> Vec<&'static str> {
    let mut changed = Vec::new();
    let lookup = |key: &str| bridge.get_global_value(key).filter(|v| !v.trim().is_empty());

    let mut take_text = |key: &str, path: &'static str, target: &mut String| {
        if let Some(value) = lookup(key) {
            if *target != value {
                log::debug!("Taking {path} from git {key}: {value}");
                *target = value;
                changed.push(path);
            }
        }
    };
    take_text(EDITOR_KEY, "default.editor", &mut document.default.editor);
    take_text(MERGE_TOOL_KEY, "default.merge-tool", &mut document.default.merge_tool);
    take_text(BRANCH_KEY, "default.branch", &mut document.default.branch);

    if let Some(value) = lookup(COLOR_KEY) {
        match parse_color(&value) {
            Some(color) if color != document.ui.color => {
                document.ui.color = color;
                changed.push("ui.color");
            }
            Some(_) => {}
            None => log::warn!("Ignoring unrecognized git {COLOR_KEY} value: {value}"),
        }
    }

    if let Some(value) = lookup(PAGER_KEY) {
        let pager = !pager_disabled(&value);
        if pager != document.ui.pager {
            document.ui.pager = pager;
            changed.push("ui.pager");
        }
    }

    changed
}

/// Push allow-listed values from `document` into git.
///
/// Keys git already holds with the same value are skipped. Returns the keys written.
pub fn sync_to_external(document: &Document, bridge: &dyn ConfigBridge) -> Result<Vec<String>> {
    let mut planned: Vec<(String, String)> = vec![
        (EDITOR_KEY.into(), document.default.editor.clone()),
        (MERGE_TOOL_KEY.into(), document.default.merge_tool.clone()),
        (BRANCH_KEY.into(), document.default.branch.clone()),
        (
            COLOR_KEY.into(),
            if document.ui.color { "auto" } else { "never" }.into(),
        ),
        (AUTO_FETCH_KEY.into(), document.behavior.auto_fetch.to_string()),
        (CONFIRM_KEY.into(), document.behavior.confirm_destructive.clone()),
    ];

    // Turning the pager back on only undoes our own `cat`; a custom pager is left alone.
    let current_pager = bridge.get_global_value(PAGER_KEY);
    if !document.ui.pager {
        planned.push((PAGER_KEY.into(), NO_PAGER.into()));
    } else if current_pager.as_deref().is_some_and(pager_disabled) {
        planned.push((PAGER_KEY.into(), DEFAULT_PAGER.into()));
    }

    for (name, alias) in &document.aliases {
        match alias {
            AliasValue::Simple(command) => planned.push((format!("alias.{name}"), command.clone())),
            AliasValue::Sequence(_) => log::debug!("Not syncing sequence alias '{name}' to git"),
        }
    }

    let mut written = Vec::new();
    for (key, value) in planned {
        if value.is_empty() || bridge.get_global_value(&key).as_deref() == Some(value.as_str()) {
            continue;
        }
        bridge
            .set_global_value(&key, &value)
            .map_err(|e| ConfigError::Bridge {
                key: key.clone(),
                message: format!("{e:#}"),
            })?;
        log::debug!("Set git {key} = {value}");
        written.push(key);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::RecordingBridge;

    #[test]
    fn test_sync_from_takes_non_empty_values() {
        let bridge = RecordingBridge::new()
            .with_value("core.editor", "nvim")
            .with_value("merge.tool", "")
            .with_value("init.defaultBranch", "trunk")
            .with_value("color.ui", "never")
            .with_value("core.pager", "cat");
        let mut document = Document::default();

        let changed = sync_from_external(&mut document, &bridge);

        assert_eq!(document.default.editor, "nvim");
        assert_eq!(document.default.merge_tool, "vimdiff");
        assert_eq!(document.default.branch, "trunk");
        assert!(!document.ui.color);
        assert!(!document.ui.pager);
        assert_eq!(
            changed,
            vec!["default.editor", "default.branch", "ui.color", "ui.pager"]
        );
    }

    #[test]
    fn test_sync_from_ignores_unknown_color() {
        let bridge = RecordingBridge::new().with_value("color.ui", "sometimes");
        let mut document = Document::default();
        assert!(sync_from_external(&mut document, &bridge).is_empty());
        assert!(document.ui.color);
    }

    #[test]
    fn test_sync_to_pushes_simple_aliases_only() {
        let bridge = RecordingBridge::new();
        let mut document = Document::default();
        document.aliases.insert("st".into(), AliasValue::from("status -sb"));
        document.aliases.insert(
            "up".into(),
            AliasValue::from(vec!["fetch".to_string(), "rebase".to_string()]),
        );

        let written = sync_to_external(&document, &bridge).unwrap();

        assert!(written.contains(&"alias.st".to_string()));
        assert!(!written.iter().any(|k| k == "alias.up"));
        assert_eq!(bridge.value("core.editor").as_deref(), Some("vi"));
        assert_eq!(bridge.value("color.ui").as_deref(), Some("auto"));
        assert_eq!(bridge.value("gitwise.autoFetch").as_deref(), Some("true"));
        assert_eq!(bridge.value("gitwise.confirmDestructive").as_deref(), Some("simple"));
        assert_eq!(bridge.value("core.pager"), None);
    }

    #[test]
    fn test_sync_to_skips_unchanged_keys() {
        let bridge = RecordingBridge::new();
        let document = Document::default();

        sync_to_external(&document, &bridge).unwrap();
        bridge.clear_writes();
        let written = sync_to_external(&document, &bridge).unwrap();

        assert!(written.is_empty());
        assert!(bridge.writes().is_empty());
    }

    #[test]
    fn test_sync_to_pager_toggle() {
        let bridge = RecordingBridge::new().with_value("core.pager", "delta");
        let mut document = Document::default();

        sync_to_external(&document, &bridge).unwrap();
        assert_eq!(bridge.value("core.pager").as_deref(), Some("delta"));

        document.ui.pager = false;
        sync_to_external(&document, &bridge).unwrap();
        assert_eq!(bridge.value("core.pager").as_deref(), Some("cat"));

        document.ui.pager = true;
        sync_to_external(&document, &bridge).unwrap();
        assert_eq!(bridge.value("core.pager").as_deref(), Some("less"));
    }

    #[test]
    fn test_sync_to_failure_names_key() {
        let bridge = RecordingBridge::new().failing_writes();
        let err = sync_to_external(&Document::default(), &bridge).unwrap_err();
        assert!(matches!(err, ConfigError::Bridge { ref key, .. } if key == "core.editor"));
    }
}
