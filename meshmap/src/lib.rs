//! meshmap - offline-tolerant tiles and viewport geometry for node maps
//!
//! This library backs a slippy-map widget that shows mesh network nodes:
//!
//! - [`cache`]: content-addressed tile store with an mtime-ordered byte budget,
//!   and in-flight deduplication of tile fetches
//! - [`transport`]: HTTP transport decorator that serves tiles from the cache
//!   and fetches misses in the background
//! - [`geo`]: Web Mercator math, viewport state, screen projection and
//!   robust map centering
//! - [`config`], [`logging`], [`provider`]: configuration file, tracing setup
//!   and tile server URL templates

pub mod cache;
pub mod config;
pub mod geo;
pub mod logging;
pub mod provider;
pub mod transport;
