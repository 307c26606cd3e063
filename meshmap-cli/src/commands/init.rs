//! Init command - initialize configuration file.

use meshmap::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Run the init command.
///
/// Existing settings are kept; missing ones are filled with defaults.
pub fn run() -> Result<(), CliError> {
    let path = config_file_path();
    let existed = path.exists();

    let config = ConfigFile::load()?;
    config.save()?;

    if existed {
        println!("Updated configuration file: {}", path.display());
    } else {
        println!("Created configuration file: {}", path.display());
    }
    println!();
    println!("Tile cache: {}", config.cache.directory.display());
    println!("Tile source: {}", config.source.url_template);
    println!();
    println!("Edit this file to customize meshmap settings.");
    Ok(())
}
