//! Configuration inspection commands.

use clap::Subcommand;
use meshmap::config::{config_file_path, format_size, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// List all configuration settings
    List,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::List => run_list(),
        ConfigCommands::Path => {
            println!("{}", config_file_path().display());
            Ok(())
        }
    }
}

fn run_list() -> Result<(), CliError> {
    let config = ConfigFile::load()?;
    for (key, value) in settings(&config) {
        println!("{:<20} = {}", key, value);
    }
    Ok(())
}

/// Every setting as `section.key` and display value.
fn settings(config: &ConfigFile) -> Vec<(&'static str, String)> {
    vec![
        (
            "cache.directory",
            config.cache.directory.display().to_string(),
        ),
        ("cache.max_size", format_size(config.cache.max_size)),
        ("fetch.timeout_secs", config.fetch.timeout_secs.to_string()),
        ("fetch.async_miss", config.fetch.async_miss.to_string()),
        ("fetch.user_agent", config.fetch.user_agent.clone()),
        ("source.url_template", config.source.url_template.clone()),
    ]
}
