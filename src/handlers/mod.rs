//! Command handler modules
//!
//! This module contains the command handler functions called from main.rs,
//! organized by functionality area.

pub mod alias;
pub mod config;

// Re-export all public handler functions for convenient use
pub use alias::{handle_alias_list, handle_alias_remove, handle_alias_set, handle_alias_show};
pub use config::{
    handle_config_get, handle_config_list, handle_config_path, handle_config_set,
    handle_config_sync, handle_config_validate, SyncDirection,
};
