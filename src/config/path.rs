//! Dot-path navigation over the configuration document.
//!
//! Each section type describes its fields once with [`navigable!`], which
//! generates a `{tag -> accessor}` table. [`get`], [`set`] and [`flatten`]
//! walk those tables, so no configuration key needs a hand-written accessor.
//!
//! A path segment is matched against a field's on-disk tag first
//! (`merge-tool`), then against its Rust field name ignoring case and
//! underscores (`merge_tool`, `MergeTool`). Map entries are matched by exact key.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use super::alias::AliasValue;
use super::error::{ConfigError, Result};
use super::value::Value;

/// One entry of a section's field table.
#[derive(Debug, Clone, Copy)]
pub struct FieldName {
    /// Serialized (on-disk) key.
    pub tag: &'static str,
    /// Rust field name.
    pub name: &'static str,
}

/// A fixed section with named fields.
pub trait Composite {
    fn fields(&self) -> &'static [FieldName];
    fn field(&self, tag: &str) -> Option<Node<'_>>;
    fn field_mut(&mut self, tag: &str) -> Option<NodeMut<'_>>;
}

/// A string-keyed map inside the document.
pub trait MapNode {
    /// Opaque maps are listed as a single value instead of one entry per key.
    fn is_opaque(&self) -> bool;
    fn keys(&self) -> Vec<String>;
    fn entry(&self, key: &str) -> Option<Node<'_>>;
    fn entry_mut(&mut self, key: &str) -> Option<NodeMut<'_>>;
    /// Convert `value` to the element type and insert it, replacing any existing entry.
    fn insert(&mut self, key: &str, value: Value, path: &str) -> Result<()>;
    fn to_value(&self) -> Value;
}

/// Read-only view of a position in the document.
pub enum Node<'a> {
    Composite(&'a dyn Composite),
    Map(&'a dyn MapNode),
    Leaf(Value),
}

/// Mutable view of a position in the document.
pub enum NodeMut<'a> {
    Composite(&'a mut dyn Composite),
    Map(&'a mut dyn MapNode),
    Leaf(Slot<'a>),
}

/// A typed leaf that can be assigned from a [`Value`].
pub enum Slot<'a> {
    Bool(&'a mut bool),
    Uint(&'a mut u32),
    Text(&'a mut String),
    Timestamp(&'a mut DateTime<Utc>),
    Alias(&'a mut AliasValue),
}

/// Anything that can appear as a field of a [`Composite`].
pub trait Navigable {
    fn node(&self) -> Node<'_>;
    fn node_mut(&mut self) -> NodeMut<'_>;
}

impl Node<'_> {
    pub fn to_value(&self) -> Value {
        match self {
            Node::Composite(c) => {
                let entries = c
                    .fields()
                    .iter()
                    .filter_map(|f| c.field(f.tag).map(|n| (f.tag.to_string(), n.to_value())))
                    .collect();
                Value::Map(entries)
            }
            Node::Map(m) => m.to_value(),
            Node::Leaf(v) => v.clone(),
        }
    }
}

fn mismatch(path: &str, expected: &'static str, value: &Value) -> ConfigError {
    ConfigError::TypeMismatch {
        path: path.to_string(),
        expected,
        value: value.to_string(),
    }
}

impl Slot<'_> {
    /// Convert `value` to this leaf's type and store it.
    pub fn assign(self, value: Value, path: &str) -> Result<()> {
        match self {
            Slot::Bool(b) => {
                *b = value
                    .as_bool()
                    .ok_or_else(|| mismatch(path, "a boolean", &value))?;
            }
            Slot::Uint(n) => {
                *n = value
                    .as_int()
                    .and_then(|i| u32::try_from(i).ok())
                    .ok_or_else(|| mismatch(path, "a non-negative integer", &value))?;
            }
            Slot::Text(s) => {
                *s = value
                    .as_text()
                    .ok_or_else(|| mismatch(path, "a string", &value))?;
            }
            Slot::Timestamp(t) => {
                *t = value
                    .as_text()
                    .and_then(|text| DateTime::parse_from_rfc3339(text.trim()).ok())
                    .map(|d| d.with_timezone(&Utc))
                    .ok_or_else(|| mismatch(path, "an RFC 3339 timestamp", &value))?;
            }
            Slot::Alias(a) => {
                *a = AliasValue::try_from(value.clone())
                    .map_err(|_| mismatch(path, "a command or a list of commands", &value))?;
            }
        }
        Ok(())
    }
}

impl Navigable for bool {
    fn node(&self) -> Node<'_> {
        Node::Leaf(Value::Bool(*self))
    }

    fn node_mut(&mut self) -> NodeMut<'_> {
        NodeMut::Leaf(Slot::Bool(self))
    }
}

impl Navigable for u32 {
    fn node(&self) -> Node<'_> {
        Node::Leaf(Value::Int(i64::from(*self)))
    }

    fn node_mut(&mut self) -> NodeMut<'_> {
        NodeMut::Leaf(Slot::Uint(self))
    }
}

impl Navigable for String {
    fn node(&self) -> Node<'_> {
        Node::Leaf(Value::Str(self.clone()))
    }

    fn node_mut(&mut self) -> NodeMut<'_> {
        NodeMut::Leaf(Slot::Text(self))
    }
}

impl Navigable for DateTime<Utc> {
    fn node(&self) -> Node<'_> {
        Node::Leaf(Value::Str(self.to_rfc3339()))
    }

    fn node_mut(&mut self) -> NodeMut<'_> {
        NodeMut::Leaf(Slot::Timestamp(self))
    }
}

impl<V> Navigable for BTreeMap<String, V>
where
    BTreeMap<String, V>: MapNode,
{
    fn node(&self) -> Node<'_> {
        Node::Map(self)
    }

    fn node_mut(&mut self) -> NodeMut<'_> {
        NodeMut::Map(self)
    }
}

/// Scalar-valued maps are walked key by key.
impl MapNode for BTreeMap<String, String> {
    fn is_opaque(&self) -> bool {
        false
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
        let text = value
            .as_text()
            .ok_or_else(|| mismatch(path, "a string", &value))?;
        BTreeMap::insert(self, key.to_string(), text);
        Ok(())
    }

    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.clone(), Value::Str(v.clone())))
                .collect(),
        )
    }
}

/// Implement [`Composite`] and [`Navigable`] for a section struct from a
/// `"tag" => field` table.
macro_rules! navigable {
    ($ty:ty { $($tag:literal => $field:ident),+ $(,)? }) => {
        impl $crate::config::path::Composite for $ty {
            fn fields(&self) -> &'static [$crate::config::path::FieldName] {
                const FIELDS: &[$crate::config::path::FieldName] = &[
                    $($crate::config::path::FieldName { tag: $tag, name: stringify!($field) }),+
                ];
                FIELDS
            }

            fn field(&self, tag: &str) -> Option<$crate::config::path::Node<'_>> {
                use $crate::config::path::Navigable;
                match tag {
                    $($tag => Some(self.$field.node()),)+
                    _ => None,
                }
            }

            fn field_mut(&mut self, tag: &str) -> Option<$crate::config::path::NodeMut<'_>> {
                use $crate::config::path::Navigable;
                match tag {
                    $($tag => Some(self.$field.node_mut()),)+
                    _ => None,
                }
            }
        }

        impl $crate::config::path::Navigable for $ty {
            fn node(&self) -> $crate::config::path::Node<'_> {
                $crate::config::path::Node::Composite(self)
            }

            fn node_mut(&mut self) -> $crate::config::path::NodeMut<'_> {
                $crate::config::path::NodeMut::Composite(self)
            }
        }
    };
}

pub(crate) use navigable;

fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Resolve a path segment to a field tag: exact tag first, then field name.
fn resolve_field(composite: &dyn Composite, segment: &str) -> Option<&'static str> {
    let fields = composite.fields();
    if let Some(field) = fields.iter().find(|f| f.tag == segment) {
        return Some(field.tag);
    }
    let wanted = normalize_name(segment);
    fields
        .iter()
        .find(|f| normalize_name(f.name) == wanted)
        .map(|f| f.tag)
}

fn split(path: &str) -> Vec<&str> {
    if path.is_empty() {
        Vec::new()
    } else {
        path.split('.').collect()
    }
}

fn join(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}.{segment}")
    }
}

/// Find the node at `path`. The empty path is the root itself.
pub fn lookup<'a>(root: &'a dyn Composite, path: &str) -> Result<Node<'a>> {
    let segments = split(path);
    let mut node = Node::Composite(root);

    for (i, segment) in segments.iter().enumerate() {
        let walked = segments[..=i].join(".");
        node = match node {
            Node::Composite(c) => resolve_field(c, segment)
                .and_then(|tag| c.field(tag))
                .ok_or_else(|| ConfigError::not_found(walked))?,
            Node::Map(m) => m
                .entry(segment)
                .ok_or_else(|| ConfigError::not_found(walked))?,
            Node::Leaf(_) => {
                return Err(ConfigError::NavigateIntoScalar {
                    path: segments[..i].join("."),
                })
            }
        };
    }

    Ok(node)
}

/// Read the value at `path`.
pub fn get(root: &dyn Composite, path: &str) -> Result<Value> {
    lookup(root, path).map(|node| node.to_value())
}

/// Spell every section segment of `path` as its tag, so
/// `Behavior.auto_push` becomes `behavior.auto-push`.
///
/// Map keys and anything past a leaf are kept as given; an unknown section
/// field is `NotFound`.
pub fn canonical(root: &dyn Composite, path: &str) -> Result<String> {
    let segments = split(path);
    let mut resolved = Vec::with_capacity(segments.len());
    let mut node = Some(Node::Composite(root));

    for (i, segment) in segments.iter().enumerate() {
        match node.take() {
            Some(Node::Composite(c)) => {
                let tag = resolve_field(c, segment)
                    .ok_or_else(|| ConfigError::not_found(segments[..=i].join(".")))?;
                resolved.push(tag.to_string());
                node = c.field(tag);
            }
            Some(Node::Map(m)) => {
                resolved.push(segment.to_string());
                node = m.entry(segment);
            }
            Some(Node::Leaf(_)) | None => resolved.push(segment.to_string()),
        }
    }

    Ok(resolved.join("."))
}

/// Assign `value` at `path`, converting it to the target's type.
///
/// Every segment but the last must lead to a section or a map. On a section
/// the last segment must name an existing leaf field; on a map it is the key
/// to insert or replace.
pub fn set(root: &mut dyn Composite, path: &str, value: Value) -> Result<()> {
    let segments = split(path);
    let Some((last, parents)) = segments.split_last() else {
        return Err(ConfigError::not_found(path));
    };

    let mut node = NodeMut::Composite(root);
    for (i, segment) in parents.iter().enumerate() {
        let walked = segments[..=i].join(".");
        node = match node {
            NodeMut::Composite(c) => {
                let tag = resolve_field(&*c, segment)
                    .ok_or_else(|| ConfigError::not_found(&walked))?;
                c.field_mut(tag).ok_or_else(|| ConfigError::not_found(&walked))?
            }
            NodeMut::Map(m) => m
                .entry_mut(segment)
                .ok_or_else(|| ConfigError::not_found(&walked))?,
            NodeMut::Leaf(_) => {
                return Err(ConfigError::NavigateIntoScalar {
                    path: segments[..i].join("."),
                })
            }
        };
    }

    match node {
        NodeMut::Composite(c) => {
            let tag = resolve_field(&*c, last)
                .ok_or_else(|| ConfigError::not_found(path))?;
            match c.field_mut(tag) {
                Some(NodeMut::Leaf(slot)) => slot.assign(value, path),
                Some(_) => Err(mismatch(path, "a single setting, not a section", &value)),
                None => Err(ConfigError::not_found(path)),
            }
        }
        NodeMut::Map(m) => m.insert(last, value, path),
        NodeMut::Leaf(_) => Err(ConfigError::NavigateIntoScalar {
            path: parents.join("."),
        }),
    }
}

/// Every leaf of the document keyed by its dotted path.
///
/// Sections and scalar maps are walked recursively; opaque maps (aliases)
/// are emitted whole under their own path.
pub fn flatten(root: &dyn Composite, prefix: &str) -> BTreeMap<String, Value> {
    let mut out = BTreeMap::new();
    walk(Node::Composite(root), prefix, &mut out);
    out
}

fn walk(node: Node<'_>, prefix: &str, out: &mut BTreeMap<String, Value>) {
    match node {
        Node::Composite(c) => {
            for field in c.fields() {
                if let Some(child) = c.field(field.tag) {
                    walk(child, &join(prefix, field.tag), out);
                }
            }
        }
        Node::Map(m) if m.is_opaque() => {
            out.insert(prefix.to_string(), m.to_value());
        }
        Node::Map(m) => {
            for key in m.keys() {
                if let Some(child) = m.entry(&key) {
                    walk(child, &join(prefix, &key), out);
                }
            }
        }
        Node::Leaf(value) => {
            out.insert(prefix.to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Inner {
        enabled: bool,
        retry_count: u32,
    }

    #[derive(Debug, Default)]
    struct Root {
        display_name: String,
        inner: Inner,
        labels: BTreeMap<String, String>,
    }

    navigable!(Inner {
        "enabled" => enabled,
        "retry-count" => retry_count,
    });

    navigable!(Root {
        "display-name" => display_name,
        "inner" => inner,
        "labels" => labels,
    });

    #[test]
    fn test_get_by_tag_and_field_name() {
        let mut root = Root::default();
        root.inner.retry_count = 3;

        assert_eq!(get(&root, "inner.retry-count").unwrap(), Value::Int(3));
        assert_eq!(get(&root, "inner.retry_count").unwrap(), Value::Int(3));
        assert_eq!(get(&root, "Inner.RetryCount").unwrap(), Value::Int(3));
    }

    #[test]
    fn test_get_section_returns_map() {
        let root = Root::default();
        let value = get(&root, "inner").unwrap();
        let Value::Map(entries) = value else {
            panic!("expected a map");
        };
        assert_eq!(entries.get("enabled"), Some(&Value::Bool(false)));
        assert_eq!(entries.get("retry-count"), Some(&Value::Int(0)));
    }

    #[test]
    fn test_get_unknown_field_is_not_found() {
        let root = Root::default();
        let err = get(&root, "inner.missing").unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { ref path } if path == "inner.missing"));
    }

    #[test]
    fn test_get_into_scalar_fails() {
        let root = Root::default();
        let err = get(&root, "display-name.length").unwrap_err();
        assert!(
            matches!(err, ConfigError::NavigateIntoScalar { ref path } if path == "display-name")
        );
    }

    #[test]
    fn test_canonical_uses_tags() {
        let mut root = Root::default();
        root.labels.insert("Team_A".into(), "infra".into());

        assert_eq!(
            canonical(&root, "Inner.Retry_Count").unwrap(),
            "inner.retry-count"
        );
        assert_eq!(canonical(&root, "in-ner").unwrap(), "inner");
        assert_eq!(
            canonical(&root, "labels.Team_A").unwrap(),
            "labels.Team_A"
        );
        assert_eq!(
            canonical(&root, "labels.new-key").unwrap(),
            "labels.new-key"
        );
        assert_eq!(
            canonical(&root, "displayName.length").unwrap(),
            "display-name.length"
        );

        let err = canonical(&root, "inner.missing").unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { ref path } if path == "inner.missing"));
    }

    #[test]
    fn test_set_converts_to_field_type() {
        let mut root = Root::default();

        set(&mut root, "inner.enabled", Value::from("yes")).unwrap();
        set(&mut root, "inner.retry-count", Value::from("7")).unwrap();
        set(&mut root, "display-name", Value::from("work")).unwrap();

        assert!(root.inner.enabled);
        assert_eq!(root.inner.retry_count, 7);
        assert_eq!(root.display_name, "work");
    }

    #[test]
    fn test_set_type_mismatch_leaves_value() {
        let mut root = Root::default();
        let err = set(&mut root, "inner.retry-count", Value::from("-1")).unwrap_err();
        assert!(matches!(err, ConfigError::TypeMismatch { .. }));
        assert_eq!(root.inner.retry_count, 0);
    }

    #[test]
    fn test_set_whole_section_is_rejected() {
        let mut root = Root::default();
        let err = set(&mut root, "inner", Value::from("x")).unwrap_err();
        assert!(matches!(err, ConfigError::TypeMismatch { .. }));
    }

    #[test]
    fn test_set_map_entry_creates_key() {
        let mut root = Root::default();
        set(&mut root, "labels.team", Value::from("infra")).unwrap();
        assert_eq!(root.labels.get("team").map(String::as_str), Some("infra"));

        let err = set(&mut root, "labels.team.sub", Value::from("x")).unwrap_err();
        assert!(matches!(err, ConfigError::NavigateIntoScalar { .. }));
    }

    #[test]
    fn test_flatten_walks_scalar_maps() {
        let mut root = Root::default();
        root.labels.insert("team".into(), "infra".into());

        let flat = flatten(&root, "");
        let keys: Vec<_> = flat.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["display-name", "inner.enabled", "inner.retry-count", "labels.team"]
        );

        for (path, value) in &flat {
            assert_eq!(&get(&root, path).unwrap(), value, "round trip for {path}");
        }
    }

    #[test]
    fn test_flatten_with_prefix() {
        let root = Root::default();
        let flat = flatten(&root, "root");
        assert!(flat.contains_key("root.inner.enabled"));
    }

    #[test]
    fn test_empty_path() {
        let mut root = Root::default();
        assert!(matches!(get(&root, "").unwrap(), Value::Map(_)));
        assert!(matches!(
            set(&mut root, "", Value::from("x")).unwrap_err(),
            ConfigError::NotFound { .. }
        ));
    }
}
