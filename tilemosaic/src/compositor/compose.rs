//! Composite assembly implementation

use std::io::Cursor;
use std::sync::Arc;
use std::time::Instant;

use image::imageops::{self, FilterType};
use image::{ImageReader, RgbaImage};
use rayon::prelude::*;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::types::{
    CompositeImage, CompositeStats, CompositorConfig, CompositorError, SubTileResults,
    MAX_CANVAS_SIZE,
};
use crate::coord::{to_tile_coords, GeoPoint, TileCoord};
use crate::provider::{ProviderError, TileSource};

/// Stitches the descendants of a base tile into a single raster.
///
/// All sub-tiles are fetched concurrently and the compositor waits for every
/// fetch to settle before drawing. A failed, timed out or undecodable
/// sub-tile leaves its region transparent instead of failing the request.
///
/// # Example
///
/// ```ignore
/// use tilemosaic::compositor::{CompositorConfig, TileCompositor};
/// use tilemosaic::provider::{AsyncReqwestClient, HistoricalTileSource};
///
/// let source = HistoricalTileSource::with_default_base(AsyncReqwestClient::new()?);
/// let compositor = TileCompositor::new(Arc::new(source), CompositorConfig::default());
/// let composite = compositor.compose(GeoPoint::new(25.03, 121.5), 14, 17).await?;
/// assert_eq!(composite.size(), 2048);
/// ```
pub struct TileCompositor<S: TileSource> {
    source: Arc<S>,
    config: CompositorConfig,
    limiter: Option<Arc<Semaphore>>,
}

impl<S: TileSource + 'static> TileCompositor<S> {
    /// Creates a compositor drawing from `source`.
    pub fn new(source: Arc<S>, config: CompositorConfig) -> Self {
        let limiter = match config.max_concurrent_fetches {
            0 => None,
            n => Some(Arc::new(Semaphore::new(n))),
        };
        Self {
            source,
            config,
            limiter,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Builds the composite for the base tile under `point`.
    pub async fn compose(
        &self,
        point: GeoPoint,
        base_zoom: u8,
        target_zoom: u8,
    ) -> Result<CompositeImage, CompositorError> {
        self.compose_cancellable(point, base_zoom, target_zoom, CancellationToken::new())
            .await
    }

    /// Builds the composite, aborting outstanding fetches when `token` fires.
    ///
    /// A cancelled composite is still returned with whatever was fetched
    /// before cancellation.
    pub async fn compose_cancellable(
        &self,
        point: GeoPoint,
        base_zoom: u8,
        target_zoom: u8,
        token: CancellationToken,
    ) -> Result<CompositeImage, CompositorError> {
        let base_tile = to_tile_coords(point, base_zoom)?;
        self.compose_tile(base_tile, target_zoom, token).await
    }

    /// Builds the composite covering `base_tile` from tiles at `target_zoom`.
    #[instrument(skip(self, token), fields(base = %base_tile, source = self.source.name()))]
    pub async fn compose_tile(
        &self,
        base_tile: TileCoord,
        target_zoom: u8,
        token: CancellationToken,
    ) -> Result<CompositeImage, CompositorError> {
        let start = Instant::now();

        let sub_tiles = base_tile.descendants(target_zoom)?;
        let scale_factor = sub_tiles.factor();
        let tile_size = self.config.tile_size;

        let canvas_size = tile_size as u64 * scale_factor as u64;
        if canvas_size > MAX_CANVAS_SIZE as u64 {
            return Err(CompositorError::CanvasTooLarge {
                size: canvas_size,
                max: MAX_CANVAS_SIZE,
            });
        }

        info!(
            target_zoom,
            scale_factor,
            canvas_size,
            "Compositing {}×{} sub-tiles",
            scale_factor,
            scale_factor
        );

        let sub_tiles: Vec<TileCoord> = sub_tiles.collect();
        let total = sub_tiles.len();
        let (results, cancelled) = self.fetch_all(base_tile, sub_tiles, &token).await;

        // A reachable server that answers with error statuses still yields a
        // (blank) composite; only a server that never answered fails the request.
        if !cancelled && results.all_unreachable() {
            let last_error = results
                .failures
                .last()
                .map(|f| f.error.clone())
                .unwrap_or_default();
            warn!(attempted = total, error = %last_error, "Tile server unreachable for every sub-tile");
            return Err(CompositorError::UpstreamUnavailable {
                attempted: total,
                last_error,
            });
        }

        let (image, results) = tokio::task::spawn_blocking(move || {
            assemble_canvas(results, tile_size, canvas_size as u32)
        })
        .await
        .map_err(|e| CompositorError::ImageError(format!("Assembly task failed: {}", e)))?;

        let stats = CompositeStats {
            total,
            successful: results.success_count(),
            failed: total - results.success_count(),
            cancelled,
            elapsed: start.elapsed(),
        };

        if stats.failed > 0 {
            warn!(
                failed = stats.failed,
                total = stats.total,
                "Composite has blank regions"
            );
        }
        info!(
            successful = stats.successful,
            failed = stats.failed,
            cancelled = stats.cancelled,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "Composite complete"
        );

        Ok(CompositeImage {
            base_tile,
            target_zoom,
            scale_factor,
            tile_size,
            image,
            stats,
        })
    }

    /// Fetches every sub-tile concurrently and waits for all of them to settle.
    ///
    /// Returns the collected outcomes and whether cancellation cut the wait short.
    async fn fetch_all(
        &self,
        base_tile: TileCoord,
        sub_tiles: Vec<TileCoord>,
        token: &CancellationToken,
    ) -> (SubTileResults, bool) {
        let mut results = SubTileResults::with_capacity(sub_tiles.len());
        let mut settled = vec![false; sub_tiles.len()];

        if token.is_cancelled() {
            debug!("Composite cancelled before starting");
            record_unsettled(&mut results, &base_tile, &sub_tiles, &settled);
            return (results, true);
        }

        let mut fetches = JoinSet::new();
        for (index, tile) in sub_tiles.iter().copied().enumerate() {
            let source = Arc::clone(&self.source);
            let limiter = self.limiter.clone();
            let timeout = self.config.fetch_timeout;

            fetches.spawn(async move {
                let _permit = match limiter {
                    Some(limiter) => match limiter.acquire_owned().await {
                        Ok(permit) => Some(permit),
                        Err(e) => {
                            return (index, Err(ProviderError::HttpError(e.to_string())));
                        }
                    },
                    None => None,
                };

                let started = Instant::now();
                let outcome = match tokio::time::timeout(timeout, source.fetch_tile(&tile)).await
                {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::Timeout {
                        url: source.tile_url(&tile),
                        elapsed_ms: started.elapsed().as_millis() as u64,
                    }),
                };
                (index, outcome)
            });
        }

        let mut cancelled = false;
        loop {
            tokio::select! {
                biased;

                _ = token.cancelled() => {
                    debug!(
                        settled = results.total_count(),
                        "Composite cancelled - aborting remaining fetches"
                    );
                    fetches.abort_all();
                    cancelled = true;
                    break;
                }

                joined = fetches.join_next() => {
                    match joined {
                        Some(Ok((index, outcome))) => {
                            settled[index] = true;
                            let tile = sub_tiles[index];
                            let (dx, dy) = tile.offset_within(&base_tile).unwrap_or_default();
                            match outcome {
                                Ok(data) => results.add_success(tile, dx, dy, data),
                                Err(e) => {
                                    warn!(tile = %tile, error = %e, "Sub-tile fetch failed");
                                    results.add_fetch_error(tile, dx, dy, &e);
                                }
                            }
                        }
                        Some(Err(join_err)) => {
                            if !join_err.is_cancelled() {
                                warn!(error = %join_err, "Sub-tile fetch task panicked");
                            }
                        }
                        None => break,
                    }
                }
            }
        }

        record_unsettled(&mut results, &base_tile, &sub_tiles, &settled);

        debug!(
            success = results.success_count(),
            failed = results.failure_count(),
            "Sub-tile fetches settled"
        );

        (results, cancelled)
    }
}

/// Records every sub-tile without an outcome (aborted or panicked) as failed.
fn record_unsettled(
    results: &mut SubTileResults,
    base_tile: &TileCoord,
    sub_tiles: &[TileCoord],
    settled: &[bool],
) {
    for (tile, _) in sub_tiles.iter().zip(settled).filter(|(_, done)| !**done) {
        let (dx, dy) = tile.offset_within(base_tile).unwrap_or_default();
        results.add_failure(*tile, dx, dy, "fetch did not complete".to_string());
    }
}

/// Decodes fetched sub-tiles and draws them onto a transparent canvas.
///
/// Sub-tiles that fail to decode are moved to the failure list.
fn assemble_canvas(
    mut results: SubTileResults,
    tile_size: u32,
    canvas_size: u32,
) -> (RgbaImage, SubTileResults) {
    let mut canvas = RgbaImage::new(canvas_size, canvas_size);

    let decoded: Vec<_> = std::mem::take(&mut results.successes)
        .into_par_iter()
        .map(|sub| {
            let image = decode_tile(&sub.data, tile_size);
            (sub, image)
        })
        .collect();

    for (sub, image) in decoded {
        match image {
            Ok(image) => {
                let x = (sub.dx * tile_size) as i64;
                let y = (sub.dy * tile_size) as i64;
                imageops::replace(&mut canvas, &image, x, y);
                results.successes.push(sub);
            }
            Err(e) => {
                warn!(tile = %sub.tile, error = %e, "Sub-tile image could not be decoded");
                results.add_failure(sub.tile, sub.dx, sub.dy, e);
            }
        }
    }

    (canvas, results)
}

/// Decodes one encoded tile to RGBA, resizing it to `tile_size` if needed.
fn decode_tile(data: &[u8], tile_size: u32) -> Result<RgbaImage, String> {
    let image = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| format!("Format error: {}", e))?
        .decode()
        .map_err(|e| format!("Decode error: {}", e))?
        .to_rgba8();

    if image.width() == tile_size && image.height() == tile_size {
        Ok(image)
    } else {
        Ok(imageops::resize(
            &image,
            tile_size,
            tile_size,
            FilterType::Triangle,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{HistoricalTileSource, MockAsyncHttpClient};
    use image::{ImageFormat, Rgba};
    use std::time::Duration;

    const BASE: &str = "http://tiles.test/layer";

    fn png_tile(size: u32, color: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(size, size, Rgba(color));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png)
            .expect("Failed to encode PNG");
        buffer.into_inner()
    }

    fn compositor(
        mock: MockAsyncHttpClient,
        config: CompositorConfig,
    ) -> TileCompositor<HistoricalTileSource<MockAsyncHttpClient>> {
        TileCompositor::new(Arc::new(HistoricalTileSource::new(BASE, mock)), config)
    }

    fn small_config() -> CompositorConfig {
        CompositorConfig {
            tile_size: 8,
            ..CompositorConfig::default()
        }
    }

    #[tokio::test]
    async fn test_merge_sizing_at_default_tile_size() {
        let mock = MockAsyncHttpClient::serving(png_tile(256, [200, 10, 10, 255]));
        let compositor = compositor(mock.clone(), CompositorConfig::default());

        let composite = compositor
            .compose(GeoPoint::new(25.03, 121.5), 14, 17)
            .await
            .unwrap();

        assert_eq!(composite.size(), 2048);
        assert_eq!(composite.image.height(), 2048);
        assert_eq!(composite.scale_factor, 8);
        assert_eq!(composite.base_tile, TileCoord::new(13721, 7014, 14).unwrap());
        assert_eq!(composite.stats.total, 64);
        assert_eq!(composite.stats.successful, 64);
        assert_eq!(mock.requested().len(), 64);
    }

    #[tokio::test]
    async fn test_partial_failures_leave_blank_regions() {
        let base = TileCoord::new(13721, 7014, 14).unwrap();
        let failing: Vec<TileCoord> = base.descendants(17).unwrap().take(10).collect();
        let failing_urls: Vec<String> = failing
            .iter()
            .map(|t| crate::provider::tile_url(BASE, t))
            .collect();

        let mock = MockAsyncHttpClient::serving(png_tile(8, [0, 0, 255, 255]))
            .failing_urls(failing_urls);
        let compositor = compositor(mock, small_config());

        let composite = compositor
            .compose_tile(base, 17, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(composite.size(), 64);
        assert_eq!(composite.stats.successful, 54);
        assert_eq!(composite.stats.failed, 10);

        for tile in &failing {
            let (dx, dy) = tile.offset_within(&base).unwrap();
            let pixel = composite.image.get_pixel(dx * 8 + 3, dy * 8 + 3);
            assert_eq!(pixel.0, [0, 0, 0, 0], "Failed tile {} should be blank", tile);
        }
        // last sub-tile was served
        assert_eq!(composite.image.get_pixel(63, 63).0, [0, 0, 255, 255]);
    }

    #[tokio::test]
    async fn test_sub_tiles_drawn_at_grid_offsets() {
        // dx varies slowest, so tile (dx=1, dy=0) is the 3rd fetched at factor 2
        let base = TileCoord::new(1, 1, 1).unwrap();
        let failing: Vec<String> = base
            .descendants(2)
            .unwrap()
            .filter(|t| t.offset_within(&base) != Some((1, 0)))
            .map(|t| crate::provider::tile_url(BASE, &t))
            .collect();
        let mock = MockAsyncHttpClient::serving(png_tile(8, [9, 9, 9, 255])).failing_urls(failing);

        let composite = compositor(mock, small_config())
            .compose_tile(base, 2, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(composite.image.get_pixel(12, 2).0, [9, 9, 9, 255]);
        assert_eq!(composite.image.get_pixel(2, 12).0, [0, 0, 0, 0]);
        assert_eq!(composite.stats.successful, 1);
    }

    #[tokio::test]
    async fn test_all_failures_is_upstream_error() {
        let compositor = compositor(MockAsyncHttpClient::unreachable(), small_config());

        let result = compositor.compose(GeoPoint::new(25.03, 121.5), 14, 17).await;
        assert!(matches!(
            result,
            Err(CompositorError::UpstreamUnavailable { attempted: 64, .. })
        ));
    }

    #[tokio::test]
    async fn test_all_not_found_returns_blank_canvas() {
        let base = TileCoord::new(13721, 7014, 14).unwrap();
        let every_url = base
            .descendants(17)
            .unwrap()
            .map(|t| crate::provider::tile_url(BASE, &t));
        let mock =
            MockAsyncHttpClient::serving(png_tile(256, [1, 1, 1, 255])).failing_urls(every_url);

        let composite = compositor(mock.clone(), CompositorConfig::default())
            .compose_tile(base, 17, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(composite.size(), 2048);
        assert_eq!(composite.stats.successful, 0);
        assert_eq!(composite.stats.failed, 64);
        assert_eq!(composite.image.get_pixel(1024, 1024).0, [0, 0, 0, 0]);
        assert_eq!(mock.requested().len(), 64);
    }

    #[tokio::test]
    async fn test_invalid_zoom_order() {
        let mock = MockAsyncHttpClient::serving(png_tile(8, [1, 1, 1, 255]));
        let compositor = compositor(mock.clone(), small_config());

        let result = compositor.compose(GeoPoint::new(25.03, 121.5), 17, 14).await;
        assert!(matches!(
            result,
            Err(CompositorError::Coord(crate::coord::CoordError::InvalidZoomOrder { .. }))
        ));
        assert!(mock.requested().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_point() {
        let mock = MockAsyncHttpClient::serving(png_tile(8, [1, 1, 1, 255]));
        let result = compositor(mock, small_config())
            .compose(GeoPoint::new(89.0, 0.0), 14, 17)
            .await;
        assert!(matches!(result, Err(CompositorError::Coord(_))));
    }

    #[tokio::test]
    async fn test_undecodable_tiles_are_failures() {
        let mock = MockAsyncHttpClient::serving(b"not an image".to_vec());
        let composite = compositor(mock, small_config())
            .compose_tile(
                TileCoord::new(0, 0, 0).unwrap(),
                1,
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(composite.stats.successful, 0);
        assert_eq!(composite.stats.failed, 4);
        assert_eq!(composite.size(), 16);
    }

    #[tokio::test]
    async fn test_mismatched_tile_size_is_resized() {
        let mock = MockAsyncHttpClient::serving(png_tile(16, [5, 6, 7, 255]));
        let composite = compositor(mock, small_config())
            .compose_tile(
                TileCoord::new(0, 0, 0).unwrap(),
                1,
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(composite.size(), 16);
        assert_eq!(composite.image.get_pixel(15, 15).0, [5, 6, 7, 255]);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_returns_blank_canvas() {
        let mock = MockAsyncHttpClient::serving(png_tile(8, [1, 1, 1, 255]));
        let token = CancellationToken::new();
        token.cancel();

        let composite = compositor(mock.clone(), small_config())
            .compose_tile(TileCoord::new(0, 0, 0).unwrap(), 2, token)
            .await
            .unwrap();

        assert!(composite.stats.cancelled);
        assert_eq!(composite.stats.failed, 16);
        assert_eq!(composite.size(), 32);
        assert!(mock.requested().is_empty());
    }

    #[tokio::test]
    async fn test_canvas_limit() {
        let mock = MockAsyncHttpClient::serving(Vec::new());
        let result = compositor(mock, CompositorConfig::default())
            .compose_tile(
                TileCoord::new(0, 0, 0).unwrap(),
                7,
                CancellationToken::new(),
            )
            .await;
        assert!(matches!(result, Err(CompositorError::CanvasTooLarge { .. })));
    }

    #[tokio::test]
    async fn test_unbounded_concurrency() {
        let mock = MockAsyncHttpClient::serving(png_tile(8, [1, 2, 3, 255]));
        let config = CompositorConfig {
            tile_size: 8,
            max_concurrent_fetches: 0,
            fetch_timeout: Duration::from_secs(1),
        };
        let composite = compositor(mock, config)
            .compose_tile(
                TileCoord::new(2, 2, 2).unwrap(),
                4,
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(composite.stats.successful, 16);
    }

    #[test]
    fn test_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TileCompositor<HistoricalTileSource<MockAsyncHttpClient>>>();
    }
}
