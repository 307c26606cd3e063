//! Transport abstraction and its reqwest implementation.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;

use super::types::{TileRequest, TileResponse};
use super::TransportError;

/// Executes one request and returns the buffered response.
///
/// This is the extension point the caching layer decorates. Implementations
/// are called from the UI thread and from background fetch tasks alike.
pub trait TileTransport: Send + Sync {
    fn round_trip(&self, request: &TileRequest) -> Result<TileResponse, TransportError>;
}

impl<T: TileTransport + ?Sized> TileTransport for Arc<T> {
    fn round_trip(&self, request: &TileRequest) -> Result<TileResponse, TransportError> {
        (**self).round_trip(request)
    }
}

/// Fallback deadline for requests that carry no timeout of their own.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP transport backed by a blocking reqwest client.
///
/// Must not be created or dropped on a Tokio worker thread; background
/// fetches reach it from the blocking pool, which is allowed.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: &str) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| TransportError::Client(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl TileTransport for ReqwestTransport {
    fn round_trip(&self, request: &TileRequest) -> Result<TileResponse, TransportError> {
        let mut builder = self.client.request(request.method.clone(), &request.url);
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().map_err(|e| request_error(request, e))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().map_err(|e| request_error(request, e))?;

        Ok(TileResponse {
            status,
            content_type,
            body,
        })
    }
}

fn request_error(request: &TileRequest, e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout {
            url: request.url.clone(),
            timeout_secs: request.timeout.unwrap_or(DEFAULT_TIMEOUT).as_secs(),
        }
    } else {
        TransportError::Http(format!("Request to {} failed: {}", request.url, e))
    }
}
