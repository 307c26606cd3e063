//! Cache management CLI commands.

use clap::Subcommand;
use meshmap::cache::{clear_disk_cache, disk_cache_stats, EvictionResult, TileCacheStore};
use meshmap::config::{format_size, ConfigFile};

use crate::error::CliError;

/// Cache action subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Clear the disk cache, removing all cached tiles
    Clear,
    /// Show disk cache statistics
    Stats,
    /// Delete least recently used tiles until the cache fits its size limit
    Evict,
}

/// Run a cache subcommand.
pub fn run(action: CacheAction) -> Result<(), CliError> {
    let config = ConfigFile::load().unwrap_or_default();
    let cache_dir = &config.cache.directory;

    match action {
        CacheAction::Clear => {
            println!("Clearing disk cache at: {}", cache_dir.display());

            match clear_disk_cache(cache_dir) {
                Ok(result) => {
                    println!(
                        "Deleted {} files, freed {}",
                        result.files_deleted,
                        format_size(result.bytes_freed)
                    );
                    Ok(())
                }
                Err(e) => Err(CliError::CacheClear(e.to_string())),
            }
        }
        CacheAction::Stats => {
            println!("Disk cache: {}", cache_dir.display());

            match disk_cache_stats(cache_dir) {
                Ok(stats) => {
                    println!("  Tiles: {}", stats.files);
                    println!(
                        "  Size:  {} of {}",
                        format_size(stats.bytes),
                        format_size(config.cache.max_size)
                    );
                    if let (Some(oldest), Some(newest)) = (stats.oldest, stats.newest) {
                        println!("  Least recently used: {}", oldest.format("%Y-%m-%d %H:%M"));
                        println!("  Most recently used:  {}", newest.format("%Y-%m-%d %H:%M"));
                    }
                    Ok(())
                }
                Err(e) => Err(CliError::CacheStats(e.to_string())),
            }
        }
        CacheAction::Evict => {
            let store = TileCacheStore::from_config(&config.to_cache_config());
            let result = evict(&store)?;
            println!(
                "Evicted {} tiles, freed {}",
                result.files_deleted,
                format_size(result.bytes_freed)
            );
            Ok(())
        }
    }
}

fn evict(store: &TileCacheStore) -> Result<EvictionResult, CliError> {
    store.evict().map_err(|e| CliError::CacheEvict(e.to_string()))
}
