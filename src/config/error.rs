use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A single failed validation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Dotted path of the offending field, e.g. `behavior.confirm-destructive`.
    pub field: String,
    pub value: String,
    pub reason: String,
}

impl FieldError {
    pub fn new(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid value {:?} for {}: {}",
            self.value, self.field, self.reason
        )
    }
}

impl std::error::Error for FieldError {}

/// Errors produced by the configuration manager.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown configuration key: {path}")]
    NotFound { path: String },

    #[error("cannot navigate into scalar value at '{path}'")]
    NavigateIntoScalar { path: String },

    #[error("cannot use {value} for '{path}': expected {expected}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        value: String,
    },

    #[error("'{path}' is managed by gitwise and cannot be changed")]
    ReadOnly { path: String },

    #[error("validation failed: {0}")]
    Validation(#[from] FieldError),

    #[error("failed to {op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[source] serde_yaml::Error),

    #[error("failed to sync '{key}' with git: {message}")]
    Bridge { key: String, message: String },

    #[error("could not determine the home directory")]
    HomeDirUnavailable,
}

impl ConfigError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        ConfigError::Io {
            op,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn not_found(path: impl Into<String>) -> Self {
        ConfigError::NotFound { path: path.into() }
    }

    /// The validation failure, if this is one.
    pub fn field_error(&self) -> Option<&FieldError> {
        match self {
            ConfigError::Validation(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T, E = ConfigError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_error_display_mentions_all_parts() {
        let err = FieldError::new(
            "behavior.confirm-destructive",
            "maybe",
            "must be one of simple, always, never",
        );
        let text = err.to_string();
        assert!(text.contains("behavior.confirm-destructive"));
        assert!(text.contains("\"maybe\""));
        assert!(text.contains("must be one of"));
    }

    #[test]
    fn test_validation_error_wraps_field_error() {
        let err: ConfigError = FieldError::new("default.branch", "", "must not be empty").into();
        assert_eq!(err.field_error().unwrap().field, "default.branch");
        assert!(err.to_string().starts_with("validation failed"));
    }
}
