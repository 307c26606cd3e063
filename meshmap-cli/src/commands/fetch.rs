//! Fetch command - pre-seed the cache with the tiles around a position.

use std::sync::{mpsc, Mutex};
use std::time::Duration;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use meshmap::config::ConfigFile;
use meshmap::geo::{center_viewport, CanvasSize, GeoCoordinate, MAX_LAT, MAX_ZOOM, MIN_LAT};
use meshmap::transport::{CachingTileTransport, ReqwestTransport, TileRequest, TileTransport};
use tracing::{info, warn};

use crate::error::CliError;

/// How often progress is re-checked while no fetch completes.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Largest accepted canvas width or height in pixels.
const MAX_CANVAS_PIXELS: f64 = 16384.0;

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Latitude of the view center in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude of the view center in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,

    /// Zoom level (0-19)
    #[arg(long, default_value_t = 14)]
    pub zoom: u8,

    /// Canvas width in pixels
    #[arg(long, default_value_t = 1024.0)]
    pub width: f64,

    /// Canvas height in pixels
    #[arg(long, default_value_t = 768.0)]
    pub height: f64,

    /// Fetch each tile on the calling thread instead of in the background
    #[arg(long)]
    pub sync: bool,
}

impl FetchArgs {
    fn validate(&self) -> Result<(GeoCoordinate, CanvasSize), CliError> {
        if self.zoom > MAX_ZOOM {
            return Err(CliError::InvalidArgument(format!(
                "Zoom must be between 0 and {}, got {}",
                MAX_ZOOM, self.zoom
            )));
        }
        let coord = GeoCoordinate::new(self.lat, self.lon);
        if !coord.is_finite()
            || !(MIN_LAT..=MAX_LAT).contains(&self.lat)
            || !(-180.0..=180.0).contains(&self.lon)
        {
            return Err(CliError::InvalidArgument(format!(
                "Position ({}, {}) is outside the map",
                self.lat, self.lon
            )));
        }
        let canvas = CanvasSize::new(self.width, self.height);
        if canvas.is_empty() {
            return Err(CliError::InvalidArgument(
                "Canvas width and height must be positive".to_string(),
            ));
        }
        if canvas.width > MAX_CANVAS_PIXELS || canvas.height > MAX_CANVAS_PIXELS {
            return Err(CliError::InvalidArgument(format!(
                "Canvas width and height must be at most {} pixels",
                MAX_CANVAS_PIXELS
            )));
        }
        Ok((coord, canvas))
    }
}

/// Run the fetch command.
pub fn run(args: FetchArgs) -> Result<(), CliError> {
    let (coord, canvas) = args.validate()?;

    let config = ConfigFile::load()?;
    let source = config.tile_source()?;
    let cache_config = config.to_cache_config().with_async_miss(!args.sync);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(e.to_string()))?;
    let upstream = ReqwestTransport::new(&config.fetch.user_agent)?;
    let transport =
        CachingTileTransport::from_config(upstream, &cache_config, runtime.handle().clone());

    let (tx, rx) = mpsc::channel();
    let tx = Mutex::new(tx);
    transport.set_listener(move || {
        if let Ok(tx) = tx.lock() {
            let _ = tx.send(());
        }
    });

    let viewport = center_viewport(&coord, args.zoom);
    let urls: Vec<String> = viewport
        .visible_tiles(canvas)
        .into_iter()
        .map(|tile| source.tile_url(tile))
        .collect();
    info!(
        tiles = urls.len(),
        zoom = viewport.zoom,
        x = viewport.x,
        y = viewport.y,
        "Fetching visible tiles"
    );

    let bar = ProgressBar::new(urls.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>4}/{len:4} tiles {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    for url in &urls {
        if let Err(e) = transport.round_trip(&TileRequest::get(url.as_str())) {
            warn!(url = %url, error = %e, "Tile fetch failed");
        }
        bar.set_position(transport.progress(&urls).cached as u64);
    }

    // Background fetches are bounded by the fetch timeout, so this ends.
    let progress = loop {
        let progress = transport.progress(&urls);
        bar.set_position(progress.cached as u64);
        bar.set_message(format!("({} in flight)", progress.in_flight));
        if progress.in_flight == 0 {
            break progress;
        }
        let _ = rx.recv_timeout(POLL_INTERVAL);
    };
    bar.finish_with_message("done");

    println!(
        "Cached {}/{} tiles around ({:.5}, {:.5}) at zoom {} in {}",
        progress.cached,
        progress.total,
        coord.latitude,
        coord.longitude,
        args.zoom,
        cache_config.directory.display()
    );

    if progress.is_complete() {
        Ok(())
    } else {
        Err(CliError::IncompleteFetch {
            missing: progress.missing(),
            total: progress.total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(lat: f64, lon: f64, zoom: u8) -> FetchArgs {
        FetchArgs {
            lat,
            lon,
            zoom,
            width: 800.0,
            height: 600.0,
            sync: false,
        }
    }

    #[test]
    fn test_validate_accepts_normal_position() {
        let (coord, canvas) = args(47.6, -122.3, 12).validate().unwrap();
        assert_eq!(coord, GeoCoordinate::new(47.6, -122.3));
        assert_eq!(canvas, CanvasSize::new(800.0, 600.0));
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        assert!(args(47.6, -122.3, 20).validate().is_err());
        assert!(args(89.0, 0.0, 5).validate().is_err());
        assert!(args(0.0, 181.0, 5).validate().is_err());
        assert!(args(f64::NAN, 0.0, 5).validate().is_err());

        let mut empty = args(0.0, 0.0, 5);
        empty.width = 0.0;
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_canvas() {
        let mut tall = args(0.0, 0.0, 3);
        tall.height = 1e300;
        let err = tall.validate().unwrap_err();
        assert!(err.to_string().contains("at most 16384 pixels"));

        let mut edge = args(0.0, 0.0, 3);
        edge.width = MAX_CANVAS_PIXELS;
        assert!(edge.validate().is_ok());
    }
}
