//! # gitwise
//!
//! A command-line Git helper. This crate holds its configuration layer.
//!
//! ## Overview
//!
//! gitwise keeps its settings in a YAML document at `~/.gitwiseconfig.yaml`
//! (or `~/.config/gitwise/config.yaml`). Every setting is addressable by a
//! dotted path such as `behavior.auto-push`, every change is validated before
//! it is written, files are replaced atomically with owner-only permissions,
//! and a subset of settings is mirrored into `git config --global`.
//!
//! ## Architecture
//!
//! - Storage and process seams ([`fs`], [`bridge`])
//! - The document, path engine, aliases, validation and manager ([`config`])
//! - Command-line handlers and logging ([`handlers`], [`logger`])

/// Configuration document, path navigation, validation and persistence.
///
/// [`config::ConfigManager`] ties the pieces together: load from the first
/// candidate file, `get`/`set`/`list` by dotted path, atomic save, and
/// two-way sync with git's global configuration.
pub mod config;

/// Access to git's global configuration.
///
/// A narrow trait over `git config --global` with a process-backed
/// implementation and an in-memory recording double for tests.
pub mod bridge;

/// Filesystem abstraction with real and in-memory implementations.
pub mod fs;

/// Command handlers for the `gitwise` binary.
pub mod handlers;

/// Logging configuration and utilities.
///
/// Console logging through `env_logger` (controlled by `RUST_LOG`) plus an
/// append-only audit log of configuration changes with size-based rotation.
pub mod logger;
