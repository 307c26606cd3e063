//! Center command - choose the initial map center for a set of nodes.
//!
//! Input is a JSON array of node positions:
//!
//! ```json
//! [
//!   { "id": 1, "coordinate": { "latitude": 37.774, "longitude": -122.419 } },
//!   { "id": 2 }
//! ]
//! ```

use std::path::{Path, PathBuf};

use clap::Args;
use meshmap::geo::{center_viewport, choose_map_center, NodePosition, MAX_ZOOM};

use crate::error::CliError;

#[derive(Debug, Args)]
pub struct CenterArgs {
    /// JSON file with node positions
    pub nodes: PathBuf,

    /// Node id to center on when it has a known position
    #[arg(long)]
    pub prefer: Option<u32>,

    /// Zoom level of the centering viewport
    #[arg(long, default_value_t = 12)]
    pub zoom: u8,
}

/// Run the center command.
pub fn run(args: CenterArgs) -> Result<(), CliError> {
    let nodes = read_nodes(&args.nodes)?;
    let center = choose_map_center(&nodes, args.prefer).ok_or(CliError::NoCoordinates)?;
    let viewport = center_viewport(&center, args.zoom.min(MAX_ZOOM));

    let located = nodes.iter().filter(|n| n.coordinate.is_some()).count();
    println!("Nodes:    {} ({} with position)", nodes.len(), located);
    println!("Center:   {:.6}, {:.6}", center.latitude, center.longitude);
    println!(
        "Viewport: zoom {} tile ({}, {})",
        viewport.zoom, viewport.x, viewport.y
    );
    Ok(())
}

fn read_nodes(path: &Path) -> Result<Vec<NodePosition>, CliError> {
    let read_error = |reason: String| CliError::ReadNodes {
        path: path.to_path_buf(),
        reason,
    };
    let contents = std::fs::read_to_string(path).map_err(|e| read_error(e.to_string()))?;
    serde_json::from_str(&contents).map_err(|e| read_error(e.to_string()))
}
