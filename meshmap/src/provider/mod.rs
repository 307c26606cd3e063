//! Tile server URL templates.
//!
//! A [`TileSource`] turns a [`TileAddress`] into the fetch URL for that tile.
//! The URL is also the cache identity of the tile, so the same source must
//! always produce the same URL for the same address.

use thiserror::Error;

use crate::geo::TileAddress;

/// Errors that can occur when defining a tile source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TileSourceError {
    #[error("URL template is missing the {0} placeholder")]
    MissingPlaceholder(&'static str),

    #[error("URL template is not an http(s) URL: {0}")]
    InvalidUrl(String),
}

/// A slippy-map tile server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSource {
    name: String,
    url_template: String,
}

impl TileSource {
    /// Creates a source from a template with `{z}`, `{x}` and `{y}` placeholders.
    pub fn new(name: impl Into<String>, url_template: &str) -> Result<Self, TileSourceError> {
        for placeholder in ["{z}", "{x}", "{y}"] {
            if !url_template.contains(placeholder) {
                return Err(TileSourceError::MissingPlaceholder(placeholder));
            }
        }
        if !(url_template.starts_with("http://") || url_template.starts_with("https://")) {
            return Err(TileSourceError::InvalidUrl(url_template.to_string()));
        }

        Ok(Self {
            name: name.into(),
            url_template: url_template.to_string(),
        })
    }

    /// The OpenStreetMap standard tile layer.
    pub fn openstreetmap() -> Self {
        Self {
            name: "openstreetmap".to_string(),
            url_template: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    /// Fetch URL of one tile.
    pub fn tile_url(&self, tile: TileAddress) -> String {
        self.url_template
            .replace("{z}", &tile.zoom.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openstreetmap_url() {
        let url = TileSource::openstreetmap().tile_url(TileAddress {
            zoom: 12,
            x: 655,
            y: 1583,
        });
        assert_eq!(url, "https://tile.openstreetmap.org/12/655/1583.png");
    }

    #[test]
    fn test_custom_template_order() {
        let source = TileSource::new("tms", "http://tiles.local/{z}/{y}/{x}.jpg").unwrap();
        assert_eq!(source.name(), "tms");
        assert_eq!(
            source.tile_url(TileAddress { zoom: 3, x: 1, y: 2 }),
            "http://tiles.local/3/2/1.jpg"
        );
    }

    #[test]
    fn test_rejects_missing_placeholder() {
        assert_eq!(
            TileSource::new("bad", "https://tiles.local/{z}/{x}.png"),
            Err(TileSourceError::MissingPlaceholder("{y}"))
        );
    }

    #[test]
    fn test_rejects_non_http() {
        assert!(matches!(
            TileSource::new("bad", "file:///{z}/{x}/{y}.png"),
            Err(TileSourceError::InvalidUrl(_))
        ));
    }
}
