use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

use gitwise::bridge::GitCliBridge;
use gitwise::config::{ConfigLocations, ConfigManager, SearchPath};
use gitwise::fs::OsFileSystem;
use gitwise::handlers::{self, SyncDirection};
use gitwise::logger;

#[derive(Parser)]
#[command(name = "gitwise")]
#[command(about = "A Git helper with a validated configuration store", long_about = None)]
#[command(version)]
struct Cli {
    /// Use this configuration file instead of the standard locations
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read and change settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Manage command aliases
    Alias {
        #[command(subcommand)]
        action: AliasAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the value at a dotted path, e.g. `behavior.auto-push`
    Get {
        key: String,

        /// Print access tokens in full
        #[arg(long)]
        show_secrets: bool,
    },

    /// Set the value at a dotted path and save
    Set {
        key: String,

        /// New value; `[a, b]` sets a list
        value: String,
    },

    /// List every setting
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Print access tokens in full
        #[arg(long)]
        show_secrets: bool,
    },

    /// Show the configuration file path
    Path,

    /// Check the configuration without changing it
    Validate,

    /// Sync settings with git's global configuration
    #[command(group(ArgGroup::new("direction").required(true).args(["from_git", "to_git"])))]
    Sync {
        /// Take editor, merge tool, branch, color and pager from git
        #[arg(long)]
        from_git: bool,

        /// Write settings and simple aliases to git
        #[arg(long)]
        to_git: bool,
    },
}

#[derive(Subcommand)]
enum AliasAction {
    /// List all aliases
    List,

    /// Show one alias
    Show { name: String },

    /// Create or replace an alias; several commands form a sequence
    Set {
        name: String,

        #[arg(required = true)]
        commands: Vec<String>,
    },

    /// Remove an alias
    Remove { name: String },
}

fn open_manager(config: Option<PathBuf>) -> Result<ConfigManager> {
    let mut manager = match config {
        Some(path) => ConfigManager::new(
            ConfigLocations::single(path),
            OsFileSystem::new(),
            GitCliBridge::new(),
            SearchPath::from_env(),
        ),
        None => ConfigManager::from_env()?,
    };
    manager.load().context("Failed to load configuration")?;
    Ok(manager)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logger::init_logger(cli.verbose);
    if let Err(e) = logger::rotate_log_if_needed() {
        log::warn!("Failed to rotate log file: {e:#}");
    }

    let mut manager = open_manager(cli.config)?;

    if !manager.document().ui.color || !atty::is(atty::Stream::Stdout) {
        colored::control::set_override(false);
    }

    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Get { key, show_secrets } => {
                handlers::handle_config_get(&manager, &key, show_secrets)?;
            }
            ConfigAction::Set { key, value } => {
                handlers::handle_config_set(&mut manager, &key, &value)?;
            }
            ConfigAction::List { json, show_secrets } => {
                handlers::handle_config_list(&manager, json, show_secrets)?;
            }
            ConfigAction::Path => {
                handlers::handle_config_path(&manager)?;
            }
            ConfigAction::Validate => {
                handlers::handle_config_validate(&manager)?;
            }
            ConfigAction::Sync { from_git, .. } => {
                let direction = if from_git {
                    SyncDirection::FromGit
                } else {
                    SyncDirection::ToGit
                };
                handlers::handle_config_sync(&mut manager, direction)?;
            }
        },
        Commands::Alias { action } => match action {
            AliasAction::List => handlers::handle_alias_list(&manager)?,
            AliasAction::Show { name } => handlers::handle_alias_show(&manager, &name)?,
            AliasAction::Set { name, commands } => {
                handlers::handle_alias_set(&mut manager, &name, commands)?;
            }
            AliasAction::Remove { name } => handlers::handle_alias_remove(&mut manager, &name)?,
        },
    }

    Ok(())
}
