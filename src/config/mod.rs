//! Persistent gitwise settings.
//!
//! [`ConfigManager`] is the entry point: it loads the YAML document from the
//! first candidate location, exposes dotted-path `get`/`set`/`list`, validates
//! every change, saves atomically with owner-only permissions, and mirrors a
//! subset of settings into git's global configuration.

pub mod alias;
pub mod document;
mod error;
pub mod locations;
mod manager;
pub mod path;
pub mod sync;
pub mod validate;
mod value;

pub use alias::{AliasKind, AliasValue, Aliases, ParsedAlias};
pub use document::{Behavior, Defaults, Document, Integration, Meta, Provider, Ui};
pub use error::{ConfigError, FieldError, Result};
pub use locations::ConfigLocations;
pub use manager::ConfigManager;
pub use validate::{SearchPath, Validator};
pub use value::Value;
