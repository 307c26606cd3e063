//! meshmap CLI - inspect and pre-seed the map tile cache.

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use meshmap::logging::{init_logging, LogConfig};

use commands::cache::CacheAction;
use commands::center::CenterArgs;
use commands::config::ConfigCommands;
use commands::fetch::FetchArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "meshmap", version, about = "Offline map tile cache for mesh node maps")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write logs to meshmap.log in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create or update the configuration file
    Init,

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Manage the tile cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Download the tiles visible around a position into the cache
    Fetch(FetchArgs),

    /// Choose the map center for a set of nodes
    Center(CenterArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut log_config = LogConfig::default().verbose(cli.verbose);
    if let Some(dir) = &cli.log_dir {
        log_config = log_config.with_file_directory(dir);
    }
    let _log_guard = match init_logging(log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Warning: {}", e);
            None
        }
    };

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Init => commands::init::run(),
        Commands::Config { command } => commands::config::run(command),
        Commands::Cache { action } => commands::cache::run(action),
        Commands::Fetch(args) => commands::fetch::run(args),
        Commands::Center(args) => commands::center::run(args),
    }
}
