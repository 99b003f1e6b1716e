//! Tile imagery source abstraction
//!
//! This module provides the traits and implementations used to download
//! raster tile images from a remote tile server.
//!
//! ```ignore
//! use tilemosaic::provider::{AsyncReqwestClient, HistoricalTileSource};
//!
//! let http_client = AsyncReqwestClient::new()?;
//! let source = HistoricalTileSource::with_default_base(http_client);
//! let bytes = source.fetch_tile(&tile).await?;
//! ```

mod historical;
mod http;
mod types;

pub use historical::{tile_url, HistoricalTileSource, DEFAULT_TILE_SERVER_BASE};
pub use http::{AsyncHttpClient, AsyncReqwestClient, DEFAULT_HTTP_TIMEOUT};
pub use types::{ProviderError, TileSource};

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;
