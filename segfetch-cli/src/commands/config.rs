//! Settings management CLI commands.
//!
//! Provides `config get`, `config set`, `config list`, and `config path`
//! for viewing and modifying persisted settings from the command line.

use std::path::Path;

use clap::Subcommand;
use console::style;
use segfetch::settings::{settings_file_path, SettingKey, Settings};
use tracing::warn;

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Get a setting value
    Get {
        /// Setting key in format section.key (e.g., download.segments)
        key: String,
    },

    /// Set a setting value
    Set {
        /// Setting key in format section.key (e.g., download.segments)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all settings
    List,

    /// Show the settings file path
    Path,
}

/// Run a config subcommand against the default settings file.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    let path = settings_file_path();
    match command {
        ConfigCommands::Get { key } => println!("{}", get_value(&path, &key)?),
        ConfigCommands::Set { key, value } => {
            let key = set_value(&path, &key, &value)?;
            println!("Set {} = {}", style(key.name()).cyan(), value);
        }
        ConfigCommands::List => print!("{}", list_settings(&path)?),
        ConfigCommands::Path => println!("{}", path.display()),
    }
    Ok(())
}

fn parse_key(key: &str) -> Result<SettingKey, CliError> {
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown setting '{}'. Use 'segfetch config list' to see available keys.",
            key
        ))
    })
}

/// Value of `key` in the settings stored at `path`.
fn get_value(path: &Path, key: &str) -> Result<String, CliError> {
    let key = parse_key(key)?;
    let settings = Settings::load_from(path)?;
    let value = key.get(&settings);

    Ok(if value.is_empty() {
        "(not set)".to_string()
    } else {
        value
    })
}

/// Store `value` for `key` in the settings at `path`.
fn set_value(path: &Path, key: &str, value: &str) -> Result<SettingKey, CliError> {
    let key = parse_key(key)?;

    // An unreadable file must not stop the user from repairing it.
    let mut settings = Settings::load_from(path).unwrap_or_else(|e| {
        warn!(error = %e, "Existing settings unreadable, starting from defaults");
        Settings::default()
    });
    key.set(&mut settings, value)?;
    settings.save_to(path)?;

    Ok(key)
}

/// All settings grouped by section.
fn list_settings(path: &Path) -> Result<String, CliError> {
    let settings = Settings::load_from(path)?;

    let mut out = String::new();
    out.push_str("Settings\n========\n\n");

    let mut current_section = "";
    for key in SettingKey::all() {
        let section = key.section();
        if section != current_section {
            if !current_section.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("[{}]\n", section));
            current_section = section;
        }

        let value = key.get(&settings);
        if value.is_empty() {
            out.push_str(&format!("  {} = (not set)\n", key.key_name()));
        } else {
            out.push_str(&format!("  {} = {}\n", key.key_name(), value));
        }
    }

    Ok(out)
}
