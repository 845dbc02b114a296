//! Alias command handlers

use anyhow::{bail, Context, Result};
use colored::Colorize;

use crate::config::{AliasKind, AliasValue, ConfigManager, ParsedAlias};
use crate::logger;

/// Build an alias from command-line arguments: one command is a simple
/// alias, several form a sequence.
pub fn alias_from_args(commands: Vec<String>) -> Result<AliasValue> {
    match commands.len() {
        0 => bail!("An alias needs at least one command"),
        1 => Ok(AliasValue::Simple(commands.into_iter().next().unwrap_or_default())),
        _ => Ok(AliasValue::Sequence(commands)),
    }
}

fn print_alias(name: &str, alias: &ParsedAlias) {
    match alias.kind {
        AliasKind::Simple => {
            println!("  {} = {}", name.bold(), alias.commands.join(""));
        }
        AliasKind::Sequence => {
            println!("  {} {}", name.bold(), format!("({})", alias.kind).dimmed());
            for (i, command) in alias.commands.iter().enumerate() {
                println!("    {}. {}", i + 1, command);
            }
        }
    }
}

/// Handle `alias list`
pub fn handle_alias_list(manager: &ConfigManager) -> Result<()> {
    let aliases = manager.all_aliases();
    if aliases.is_empty() {
        println!("{}", "No aliases defined.".yellow());
        println!(
            "\n{} gitwise alias set st \"status -sb\"",
            "Hint:".cyan()
        );
        return Ok(());
    }

    println!("{}", "Aliases".cyan().bold());
    for (name, alias) in &aliases {
        print_alias(name, alias);
    }
    Ok(())
}

/// Handle `alias show`
pub fn handle_alias_show(manager: &ConfigManager, name: &str) -> Result<()> {
    let alias = manager.parse_alias(name)?;
    print_alias(name, &alias);
    Ok(())
}

/// Handle `alias set`
pub fn handle_alias_set(
    manager: &mut ConfigManager,
    name: &str,
    commands: Vec<String>,
) -> Result<()> {
    let alias = alias_from_args(commands)?;
    let kind = alias.kind();
    manager
        .set_alias(name, alias.clone())
        .with_context(|| format!("Failed to save alias '{name}'"))?;

    println!("{} Saved {} alias {}", "✓".green(), kind, name.cyan());
    if kind == AliasKind::Sequence {
        println!(
            "  {}",
            "Sequence aliases are kept in gitwise only; git cannot run them.".dimmed()
        );
    }

    if let Err(e) = logger::log_to_file(&format!("alias set {name} = {alias}")) {
        log::warn!("Could not write audit log: {e:#}");
    }
    Ok(())
}

/// Handle `alias remove`
pub fn handle_alias_remove(manager: &mut ConfigManager, name: &str) -> Result<()> {
    manager
        .remove_alias(name)
        .with_context(|| format!("Failed to remove alias '{name}'"))?;
    println!("{} Removed alias {}", "✓".green(), name.cyan());
    println!(
        "  {}",
        format!("git's alias.{name} is left untouched.").dimmed()
    );

    if let Err(e) = logger::log_to_file(&format!("alias remove {name}")) {
        log::warn!("Could not write audit log: {e:#}");
    }
    Ok(())
}
