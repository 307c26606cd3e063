//! CLI subcommands.

pub mod cache;
pub mod center;
pub mod config;
pub mod fetch;
pub mod init;
