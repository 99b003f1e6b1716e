//! Coordinate type definitions

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Accepted latitude range (exclusive).
///
/// Slightly wider than the Mercator edge of ±85.0511287798; points in the gap
/// fall in the first or last tile row.
pub const MIN_LAT: f64 = -85.05113;
pub const MAX_LAT: f64 = 85.05113;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Supported zoom levels.
///
/// Capped so that `2^zoom` and descendant indices stay within `u32`.
pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 22;

/// A geographic point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

/// Tile coordinates in the Web Mercator / Slippy Map pyramid.
///
/// Serialized with the `tileX`/`tileY`/`zoom` field names used by map
/// clients. Only [`TileCoord::new`] and the conversions in this module build
/// one, so `zoom <= MAX_ZOOM` and `x, y < 2^zoom` always hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TileCoord {
    /// X coordinate (east-west), 0 at west
    #[serde(rename = "tileX")]
    pub(crate) x: u32,
    /// Y coordinate (north-south), 0 at north
    #[serde(rename = "tileY")]
    pub(crate) y: u32,
    pub(crate) zoom: u8,
}

impl TileCoord {
    /// Creates a tile, checking `x, y < 2^zoom`.
    pub fn new(x: u32, y: u32, zoom: u8) -> Result<Self, CoordError> {
        if zoom > MAX_ZOOM {
            return Err(CoordError::InvalidZoom(zoom));
        }
        let n = tiles_per_axis(zoom);
        if x >= n || y >= n {
            return Err(CoordError::TileOutOfRange { x, y, zoom });
        }
        Ok(Self { x, y, zoom })
    }

    #[inline]
    pub fn x(&self) -> u32 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> u32 {
        self.y
    }

    #[inline]
    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    /// Returns an iterator over every tile at `fine_zoom` covered by this tile.
    ///
    /// Tiles are yielded column-major: all `dy` for `dx = 0`, then `dx = 1`,
    /// and so on. This order determines sub-tile URL sequencing and must stay
    /// stable.
    pub fn descendants(&self, fine_zoom: u8) -> Result<DescendantTiles, CoordError> {
        if fine_zoom < self.zoom {
            return Err(CoordError::InvalidZoomOrder {
                base: self.zoom,
                target: fine_zoom,
            });
        }
        if fine_zoom > MAX_ZOOM {
            return Err(CoordError::InvalidZoom(fine_zoom));
        }

        Ok(DescendantTiles {
            origin: *self,
            fine_zoom,
            factor: 1u32 << (fine_zoom - self.zoom),
            current: 0,
        })
    }

    /// Offset `(dx, dy)` of this tile inside the footprint of `ancestor`.
    ///
    /// Returns `None` if `ancestor` is not at a coarser-or-equal zoom or does
    /// not contain this tile.
    pub fn offset_within(&self, ancestor: &TileCoord) -> Option<(u32, u32)> {
        if ancestor.zoom > self.zoom {
            return None;
        }
        let shift = self.zoom - ancestor.zoom;
        if self.x >> shift != ancestor.x || self.y >> shift != ancestor.y {
            return None;
        }
        let mask = (1u32 << shift) - 1;
        Some((self.x & mask, self.y & mask))
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Number of tiles along one axis at `zoom`.
///
/// Saturates at `u32::MAX` for zooms of 32 and above.
#[inline]
pub fn tiles_per_axis(zoom: u8) -> u32 {
    1u32.checked_shl(u32::from(zoom)).unwrap_or(u32::MAX)
}

/// Iterator over the descendants of a tile at a finer zoom.
///
/// Yields `factor²` tiles where `factor = 2^(fine_zoom - zoom)`.
#[derive(Debug, Clone)]
pub struct DescendantTiles {
    origin: TileCoord,
    fine_zoom: u8,
    factor: u32,
    current: u64,
}

impl DescendantTiles {
    /// Subdivision factor along one axis.
    pub fn factor(&self) -> u32 {
        self.factor
    }

    fn total(&self) -> u64 {
        self.factor as u64 * self.factor as u64
    }
}

impl Iterator for DescendantTiles {
    type Item = TileCoord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.total() {
            return None;
        }

        let dx = (self.current / self.factor as u64) as u32;
        let dy = (self.current % self.factor as u64) as u32;
        self.current += 1;

        Some(TileCoord {
            x: self.origin.x * self.factor + dx,
            y: self.origin.y * self.factor + dy,
            zoom: self.fine_zoom,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.total() - self.current) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for DescendantTiles {}

/// Errors that can occur during coordinate conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Latitude or longitude text is not a finite number
    #[error("Invalid latitude or longitude")]
    Unparsable,

    /// Latitude is outside the Web Mercator range
    #[error("Invalid latitude: {0} (must be strictly between {} and {})", MIN_LAT, MAX_LAT)]
    InvalidLatitude(f64),

    /// Longitude is outside valid range (-180.0 to 180.0)
    #[error("Invalid longitude: {0} (must be between {} and {})", MIN_LON, MAX_LON)]
    InvalidLongitude(f64),

    /// Zoom level is outside the supported range
    #[error("Invalid zoom level: {0} (must be between {} and {})", MIN_ZOOM, MAX_ZOOM)]
    InvalidZoom(u8),

    /// Target zoom is coarser than the base zoom
    #[error("Invalid zoom ordering: target zoom {target} is coarser than base zoom {base}")]
    InvalidZoomOrder { base: u8, target: u8 },

    /// Tile indices exceed the grid at this zoom
    #[error("Tile ({x}, {y}) is outside the grid at zoom {zoom}")]
    TileOutOfRange { x: u32, y: u32, zoom: u8 },
}

impl CoordError {
    /// True for the zoom ordering/range failures as opposed to bad geographic input.
    pub fn is_zoom_error(&self) -> bool {
        matches!(
            self,
            CoordError::InvalidZoom(_) | CoordError::InvalidZoomOrder { .. }
        )
    }
}
