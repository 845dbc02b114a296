//! User-defined command aliases.
//!
//! An alias is either a single command (`st: status -sb`) or an ordered
//! sequence of commands run one after another:
//!
//! ```yaml
//! aliases:
//!   st: status -sb
//!   sync:
//!     - fetch --all --prune
//!     - rebase origin/main
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::error::{ConfigError, FieldError, Result};
use super::path::{MapNode, Navigable, Node, NodeMut, Slot};
use super::value::Value;

/// The alias map as stored in the document.
pub type Aliases = BTreeMap<String, AliasValue>;

/// Value of a single alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AliasValue {
    Simple(String),
    Sequence(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasKind {
    Simple,
    Sequence,
}

impl fmt::Display for AliasKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AliasKind::Simple => f.write_str("simple"),
            AliasKind::Sequence => f.write_str("sequence"),
        }
    }
}

/// A checked alias: its kind and the commands it expands to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAlias {
    pub kind: AliasKind,
    pub commands: Vec<String>,
}

impl AliasValue {
    pub fn kind(&self) -> AliasKind {
        match self {
            AliasValue::Simple(_) => AliasKind::Simple,
            AliasValue::Sequence(_) => AliasKind::Sequence,
        }
    }

    /// Check the value and return its commands.
    ///
    /// Commands must contain non-whitespace text and a sequence needs at least one.
    pub fn parse(&self) -> std::result::Result<ParsedAlias, String> {
        match self {
            AliasValue::Simple(command) => {
                if command.trim().is_empty() {
                    return Err("alias command must not be empty".to_string());
                }
                Ok(ParsedAlias {
                    kind: AliasKind::Simple,
                    commands: vec![command.clone()],
                })
            }
            AliasValue::Sequence(commands) => {
                if commands.is_empty() {
                    return Err("alias sequence must contain at least one command".to_string());
                }
                if let Some(i) = commands.iter().position(|c| c.trim().is_empty()) {
                    return Err(format!("command #{} of alias sequence is empty", i + 1));
                }
                Ok(ParsedAlias {
                    kind: AliasKind::Sequence,
                    commands: commands.clone(),
                })
            }
        }
    }

    fn to_value(&self) -> Value {
        match self {
            AliasValue::Simple(command) => Value::Str(command.clone()),
            AliasValue::Sequence(commands) => Value::from(commands.clone()),
        }
    }
}

impl From<&str> for AliasValue {
    fn from(command: &str) -> Self {
        AliasValue::Simple(command.to_string())
    }
}

impl From<Vec<String>> for AliasValue {
    fn from(commands: Vec<String>) -> Self {
        AliasValue::Sequence(commands)
    }
}

/// Text becomes `Simple`, a list of strings becomes `Sequence`. Anything
/// else, including a list holding non-strings, is rejected.
impl TryFrom<Value> for AliasValue {
    type Error = Value;

    fn try_from(value: Value) -> std::result::Result<Self, Value> {
        match value {
            Value::Str(command) => Ok(AliasValue::Simple(command)),
            Value::List(items) => {
                if !items.iter().all(|item| matches!(item, Value::Str(_))) {
                    return Err(Value::List(items));
                }
                let commands = items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::Str(s) => Some(s),
                        _ => None,
                    })
                    .collect();
                Ok(AliasValue::Sequence(commands))
            }
            other => Err(other),
        }
    }
}

impl fmt::Display for AliasValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AliasValue::Simple(command) => f.write_str(command),
            AliasValue::Sequence(commands) => f.write_str(&commands.join(" && ")),
        }
    }
}

/// Check an alias name: non-empty, no whitespace, no `.`.
///
/// Dots would split both `aliases.<name>` paths and git's `alias.<name>` keys.
pub fn check_alias_name(name: &str) -> std::result::Result<(), &'static str> {
    if name.is_empty() {
        return Err("alias name must not be empty");
    }
    if name.chars().any(char::is_whitespace) {
        return Err("alias name must not contain whitespace");
    }
    if name.contains('.') {
        return Err("alias name must not contain '.'");
    }
    Ok(())
}

/// Validate one alias entry, reporting against `aliases.<name>`.
pub fn validate_alias(name: &str, value: &AliasValue) -> std::result::Result<(), FieldError> {
    let field = format!("aliases.{name}");
    check_alias_name(name).map_err(|reason| FieldError::new(&field, name, reason))?;
    value
        .parse()
        .map(|_| ())
        .map_err(|reason| FieldError::new(&field, value.to_string(), reason))
}

/// Look up and check the alias `name`.
pub fn parse_alias(aliases: &Aliases, name: &str) -> Result<ParsedAlias> {
    let value = aliases
        .get(name)
        .ok_or_else(|| ConfigError::not_found(format!("aliases.{name}")))?;
    value.parse().map_err(|reason| {
        FieldError::new(format!("aliases.{name}"), value.to_string(), reason).into()
    })
}

pub fn is_alias(aliases: &Aliases, name: &str) -> bool {
    aliases.contains_key(name)
}

pub fn alias_commands(aliases: &Aliases, name: &str) -> Result<Vec<String>> {
    parse_alias(aliases, name).map(|parsed| parsed.commands)
}

/// Every alias that parses. Malformed entries are left out.
pub fn all_aliases(aliases: &Aliases) -> BTreeMap<String, ParsedAlias> {
    aliases
        .iter()
        .filter_map(|(name, value)| {
            check_alias_name(name).ok()?;
            value.parse().ok().map(|parsed| (name.clone(), parsed))
        })
        .collect()
}

impl Navigable for AliasValue {
    fn node(&self) -> Node<'_> {
        Node::Leaf(self.to_value())
    }

    fn node_mut(&mut self) -> NodeMut<'_> {
        NodeMut::Leaf(Slot::Alias(self))
    }
}

impl MapNode for Aliases {
    fn is_opaque(&self) -> bool {
        true
    }

    fn keys(&self) -> Vec<String> {
        BTreeMap::keys(self).cloned().collect()
    }

    fn entry(&self, key: &str) -> Option<Node<'_>> {
        self.get(key).map(Navigable::node)
    }

    fn entry_mut(&mut self, key: &str) -> Option<NodeMut<'_>> {
        self.get_mut(key).map(Navigable::node_mut)
    }

    fn insert(&mut self, key: &str, value: Value, path: &str) -> Result<()> {
        let alias = AliasValue::try_from(value).map_err(|value| ConfigError::TypeMismatch {
            path: path.to_string(),
            expected: "a command or a list of commands",
            value: value.to_string(),
        })?;
        BTreeMap::insert(self, key.to_string(), alias);
        Ok(())
    }

    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(name, alias)| (name.clone(), alias.to_value()))
                .collect(),
        )
    }
}
