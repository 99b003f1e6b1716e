//! Compositor types and errors

use std::io::Cursor;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{ImageFormat, RgbaImage};
use thiserror::Error;

use crate::coord::{CoordError, TileCoord};
use crate::provider::ProviderError;

/// Default edge length of one source tile in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Default per-tile fetch timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Default bound on in-flight sub-tile fetches.
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 32;

/// Largest composite edge the compositor will allocate, in pixels.
pub const MAX_CANVAS_SIZE: u32 = 16384;

/// Errors that fail a whole composite request.
///
/// Individual sub-tile failures never appear here; they leave a blank region
/// and are reported through [`CompositeStats`].
#[derive(Debug, Error)]
pub enum CompositorError {
    /// Input point or zoom ordering rejected
    #[error(transparent)]
    Coord(#[from] CoordError),

    /// Requested canvas exceeds the allocation limit
    #[error("Composite of {size}×{size} px exceeds the {max} px limit")]
    CanvasTooLarge { size: u64, max: u32 },

    /// Every sub-tile fetch failed without reaching the tile server
    #[error("Tile source unavailable: all {attempted} sub-tile fetches failed (last error: {last_error})")]
    UpstreamUnavailable { attempted: usize, last_error: String },

    /// Canvas assembly or encoding failed
    #[error("Image processing error: {0}")]
    ImageError(String),
}

impl From<image::ImageError> for CompositorError {
    fn from(e: image::ImageError) -> Self {
        CompositorError::ImageError(e.to_string())
    }
}

/// Settings for a [`super::TileCompositor`].
#[derive(Debug, Clone)]
pub struct CompositorConfig {
    /// Edge length of one source tile in pixels
    pub tile_size: u32,
    /// Per-tile fetch timeout; a timeout counts as an ordinary tile failure
    pub fetch_timeout: Duration,
    /// Maximum in-flight fetches (0 = unbounded)
    pub max_concurrent_fetches: usize,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }
}

/// A fetched sub-tile waiting to be drawn.
#[derive(Debug, Clone)]
pub struct SubTileSuccess {
    pub tile: TileCoord,
    /// Column offset within the base tile's grid
    pub dx: u32,
    /// Row offset within the base tile's grid
    pub dy: u32,
    /// Encoded image bytes
    pub data: Vec<u8>,
}

/// A sub-tile whose region stays blank.
#[derive(Debug, Clone)]
pub struct SubTileFailure {
    pub tile: TileCoord,
    pub dx: u32,
    pub dy: u32,
    pub error: String,
    /// The tile server was unreachable or timed out
    pub unreachable: bool,
}

/// Outcomes of every sub-tile fetch of one composite.
#[derive(Debug, Clone, Default)]
pub struct SubTileResults {
    pub successes: Vec<SubTileSuccess>,
    pub failures: Vec<SubTileFailure>,
}

impl SubTileResults {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            successes: Vec::with_capacity(capacity),
            failures: Vec::new(),
        }
    }

    pub fn add_success(&mut self, tile: TileCoord, dx: u32, dy: u32, data: Vec<u8>) {
        self.successes.push(SubTileSuccess { tile, dx, dy, data });
    }

    pub fn add_failure(&mut self, tile: TileCoord, dx: u32, dy: u32, error: String) {
        self.failures.push(SubTileFailure {
            tile,
            dx,
            dy,
            error,
            unreachable: false,
        });
    }

    /// Records a failed fetch, keeping whether the server was reachable.
    pub fn add_fetch_error(&mut self, tile: TileCoord, dx: u32, dy: u32, error: &ProviderError) {
        self.failures.push(SubTileFailure {
            tile,
            dx,
            dy,
            error: error.to_string(),
            unreachable: error.is_transport(),
        });
    }

    /// True if nothing was fetched and every attempt failed to reach the server.
    pub fn all_unreachable(&self) -> bool {
        self.successes.is_empty()
            && !self.failures.is_empty()
            && self.failures.iter().all(|f| f.unreachable)
    }

    #[inline]
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    #[inline]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    #[inline]
    pub fn total_count(&self) -> usize {
        self.successes.len() + self.failures.len()
    }
}

/// Statistics about one composite operation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeStats {
    /// Number of sub-tiles in the grid (`scale_factor²`)
    pub total: usize,
    /// Sub-tiles drawn onto the canvas
    pub successful: usize,
    /// Sub-tiles left blank
    pub failed: usize,
    /// True if the operation was cancelled before every fetch settled
    pub cancelled: bool,
    pub elapsed: Duration,
}

/// A raster covering one base tile's footprint, stitched from finer tiles.
#[derive(Debug, Clone)]
pub struct CompositeImage {
    pub base_tile: TileCoord,
    pub target_zoom: u8,
    /// `2^(target_zoom - base_zoom)`
    pub scale_factor: u32,
    pub tile_size: u32,
    pub image: RgbaImage,
    pub stats: CompositeStats,
}

impl CompositeImage {
    /// Edge length of the square canvas in pixels.
    pub fn size(&self) -> u32 {
        self.image.width()
    }

    /// Encodes the canvas as PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, CompositorError> {
        let mut buffer = Cursor::new(Vec::new());
        self.image.write_to(&mut buffer, ImageFormat::Png)?;
        Ok(buffer.into_inner())
    }

    /// Encodes the canvas as a `data:image/png;base64,` URL.
    pub fn to_data_url(&self) -> Result<String, CompositorError> {
        let png = self.encode_png()?;
        Ok(format!("data:image/png;base64,{}", BASE64.encode(png)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile() -> TileCoord {
        TileCoord::new(1, 2, 3).unwrap()
    }

    #[test]
    fn test_results_counts() {
        let mut results = SubTileResults::with_capacity(4);
        results.add_success(tile(), 0, 0, vec![1]);
        results.add_failure(tile(), 0, 1, "404".to_string());
        results.add_failure(tile(), 1, 0, "timeout".to_string());

        assert_eq!(results.success_count(), 1);
        assert_eq!(results.failure_count(), 2);
        assert_eq!(results.total_count(), 3);
        assert!(!results.all_unreachable());
    }

    #[test]
    fn test_all_unreachable_ignores_status_errors() {
        let refused = ProviderError::HttpError("connection refused".to_string());
        let missing = ProviderError::Status {
            status: 404,
            url: "http://t/x-3-1-2".to_string(),
        };

        let mut results = SubTileResults::default();
        results.add_fetch_error(tile(), 0, 0, &refused);
        results.add_fetch_error(tile(), 0, 1, &refused);
        assert!(results.all_unreachable());

        results.add_fetch_error(tile(), 1, 0, &missing);
        assert!(!results.all_unreachable());

        let mut not_found = SubTileResults::default();
        not_found.add_fetch_error(tile(), 0, 0, &missing);
        assert!(!not_found.all_unreachable());
        assert!(!SubTileResults::default().all_unreachable());
    }

    #[test]
    fn test_data_url_prefix() {
        let composite = CompositeImage {
            base_tile: tile(),
            target_zoom: 4,
            scale_factor: 2,
            tile_size: 2,
            image: RgbaImage::new(4, 4),
            stats: CompositeStats {
                total: 4,
                successful: 0,
                failed: 4,
                cancelled: false,
                elapsed: Duration::ZERO,
            },
        };

        let png = composite.encode_png().unwrap();
        assert_eq!(&png[1..4], b"PNG");

        let url = composite.to_data_url().unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
        assert_eq!(composite.size(), 4);
    }

    #[test]
    fn test_error_display() {
        let err = CompositorError::UpstreamUnavailable {
            attempted: 64,
            last_error: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("all 64 sub-tile fetches failed"));

        let err: CompositorError = CoordError::InvalidZoomOrder { base: 14, target: 13 }.into();
        assert!(err.to_string().contains("Invalid zoom ordering"));
    }
}
