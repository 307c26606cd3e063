//! Request and response values exchanged with a [`TileTransport`](super::TileTransport).

use std::time::Duration;

use bytes::Bytes;
use reqwest::{Method, StatusCode};

/// Content type of tiles served from the disk cache.
pub const CACHED_CONTENT_TYPE: &str = "image/png";

/// An outbound tile request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRequest {
    pub method: Method,
    pub url: String,
    /// Overall deadline for the round trip, if any.
    pub timeout: Option<Duration>,
}

impl TileRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            timeout: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A fully buffered response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl TileResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type: None,
            body: body.into(),
        }
    }

    /// A tile read from the disk cache.
    pub fn cached(body: Vec<u8>) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: Some(CACHED_CONTENT_TYPE.to_string()),
            body: Bytes::from(body),
        }
    }

    /// Stand-in returned while the tile is fetched in the background.
    ///
    /// The caller should draw nothing for this tile and repaint once the
    /// transport reports the tile as available.
    pub fn placeholder() -> Self {
        Self::new(StatusCode::ACCEPTED, Bytes::new())
    }

    pub fn is_placeholder(&self) -> bool {
        self.status == StatusCode::ACCEPTED && self.body.is_empty()
    }

    /// Whether the body is worth persisting.
    pub fn is_cacheable(&self) -> bool {
        self.status == StatusCode::OK && !self.body.is_empty()
    }
}
