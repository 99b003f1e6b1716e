//! Provider types and traits

use std::future::Future;

use thiserror::Error;

use crate::coord::TileCoord;

/// Errors that can occur while fetching tile imagery.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// HTTP request failed before a response arrived
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// Request did not finish within the allowed time
    #[error("Request timed out after {elapsed_ms}ms: {url}")]
    Timeout { url: String, elapsed_ms: u64 },

    /// Invalid response data from the tile server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// True when the server could not be reached or did not answer in time.
    ///
    /// A status response means the server is up, so it is not a transport
    /// failure.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ProviderError::HttpError(_) | ProviderError::Timeout { .. }
        )
    }
}

/// A remote source of raster tile images.
///
/// Implementors map a tile to a URL and fetch the encoded image bytes
/// (typically JPEG or PNG) from it.
pub trait TileSource: Send + Sync {
    /// Builds the URL of a tile image.
    fn tile_url(&self, tile: &TileCoord) -> String;

    /// Downloads the encoded image for a tile.
    fn fetch_tile(
        &self,
        tile: &TileCoord,
    ) -> impl Future<Output = Result<Vec<u8>, ProviderError>> + Send;

    /// Returns the source's name for logging and identification.
    fn name(&self) -> &str;
}
