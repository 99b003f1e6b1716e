//! Historical map tile server.
//!
//! # URL Pattern
//!
//! `{base}-{zoom}-{x}-{y}`
//!
//! Indices are rendered in base 10 without padding and there is no query
//! string suffix. The default base points at Academia Sinica's 1921
//! 1:20000 topographic series of Taiwan, which serves 256×256 JPEG tiles.

use tracing::trace;

use crate::coord::TileCoord;
use crate::provider::{AsyncHttpClient, ProviderError, TileSource};

/// Base URL of the default historical tile layer.
pub const DEFAULT_TILE_SERVER_BASE: &str =
    "https://gis.sinica.edu.tw/tileserver/file-exists.php?img=JM20K_1921-jpg";

/// Renders a tile URL from a server base.
pub fn tile_url(base: &str, tile: &TileCoord) -> String {
    format!("{}-{}-{}-{}", base, tile.zoom, tile.x, tile.y)
}

/// Tile source for servers using the dash-separated URL template.
pub struct HistoricalTileSource<C: AsyncHttpClient> {
    base_url: String,
    http_client: C,
}

impl<C: AsyncHttpClient> HistoricalTileSource<C> {
    /// Creates a source for the given server base.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Everything before `-{zoom}-{x}-{y}`
    /// * `http_client` - HTTP client for making requests
    pub fn new(base_url: impl Into<String>, http_client: C) -> Self {
        Self {
            base_url: base_url.into(),
            http_client,
        }
    }

    /// Creates a source for the default 1921 layer.
    pub fn with_default_base(http_client: C) -> Self {
        Self::new(DEFAULT_TILE_SERVER_BASE, http_client)
    }
}

impl<C: AsyncHttpClient> TileSource for HistoricalTileSource<C> {
    fn tile_url(&self, tile: &TileCoord) -> String {
        tile_url(&self.base_url, tile)
    }

    async fn fetch_tile(&self, tile: &TileCoord) -> Result<Vec<u8>, ProviderError> {
        let url = self.tile_url(tile);
        trace!(tile = %tile, url = %url, "Fetching tile");

        let data = self.http_client.get(&url).await?;
        if data.is_empty() {
            return Err(ProviderError::InvalidResponse(format!(
                "Empty body from {}",
                url
            )));
        }
        Ok(data)
    }

    fn name(&self) -> &str {
        "historical"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockAsyncHttpClient;

    #[test]
    fn test_url_template() {
        let tile = TileCoord::new(109772, 56118, 17).unwrap();
        assert_eq!(
            tile_url("https://tiles.example/img=layer", &tile),
            "https://tiles.example/img=layer-17-109772-56118"
        );
    }

    #[test]
    fn test_default_base() {
        let source = HistoricalTileSource::with_default_base(MockAsyncHttpClient::serving(vec![]));
        let tile = TileCoord::new(0, 0, 0).unwrap();
        assert_eq!(
            source.tile_url(&tile),
            format!("{}-0-0-0", DEFAULT_TILE_SERVER_BASE)
        );
    }

    #[tokio::test]
    async fn test_fetch_uses_tile_url() {
        let mock = MockAsyncHttpClient::serving(vec![9, 9]);
        let source = HistoricalTileSource::new("http://t/x", mock.clone());
        let tile = TileCoord::new(3, 4, 5).unwrap();

        assert_eq!(source.fetch_tile(&tile).await.unwrap(), vec![9, 9]);
        assert_eq!(mock.requested(), vec!["http://t/x-5-3-4".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_body_is_invalid() {
        let source = HistoricalTileSource::new("http://t/x", MockAsyncHttpClient::serving(vec![]));
        let tile = TileCoord::new(0, 0, 1).unwrap();
        assert!(matches!(
            source.fetch_tile(&tile).await,
            Err(ProviderError::InvalidResponse(_))
        ));
    }
}
