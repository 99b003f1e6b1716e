//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude)
//! and Web Mercator tile coordinates, tile boundary polygons, and expansion
//! of a coarse tile into its descendants at a finer zoom.

pub mod polygon;
mod types;

pub use polygon::{feature_collection, polygon_for, TilePolygon};
pub use types::{
    tiles_per_axis, CoordError, DescendantTiles, GeoPoint, TileCoord, MAX_LAT, MAX_LON,
    MAX_ZOOM, MIN_LAT, MIN_LON, MIN_ZOOM,
};

use std::f64::consts::PI;

/// Checks that a point is finite and inside the Web Mercator domain.
///
/// Latitude must lie strictly inside `(MIN_LAT, MAX_LAT)`, i.e. ±85.05113;
/// the projection diverges at the poles. That bound sits just past the exact
/// Mercator edge (±85.0511287798), and [`to_tile_coords`] clamps the tile row
/// so points between the two still map into the grid.
pub fn validate_point(point: GeoPoint) -> Result<GeoPoint, CoordError> {
    if !point.lat.is_finite() || !point.lng.is_finite() {
        return Err(CoordError::Unparsable);
    }
    if point.lat <= MIN_LAT || point.lat >= MAX_LAT {
        return Err(CoordError::InvalidLatitude(point.lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&point.lng) {
        return Err(CoordError::InvalidLongitude(point.lng));
    }
    Ok(point)
}

/// Parses latitude and longitude text into a validated point.
///
/// Either value failing to parse as a finite number gives
/// [`CoordError::Unparsable`]; range failures give the specific
/// latitude/longitude error.
pub fn parse_geo_point(lat: &str, lng: &str) -> Result<GeoPoint, CoordError> {
    let lat: f64 = lat.trim().parse().map_err(|_| CoordError::Unparsable)?;
    let lng: f64 = lng.trim().parse().map_err(|_| CoordError::Unparsable)?;
    validate_point(GeoPoint::new(lat, lng))
}

/// Converts geographic coordinates to tile coordinates.
///
/// # Arguments
///
/// * `point` - Latitude/longitude in degrees
/// * `zoom` - Zoom level (0 to 22)
///
/// # Returns
///
/// The tile containing the point, or an error if inputs are invalid.
#[inline]
pub fn to_tile_coords(point: GeoPoint, zoom: u8) -> Result<TileCoord, CoordError> {
    let point = validate_point(point)?;
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let n = tiles_per_axis(zoom) as f64;
    let max_index = n - 1.0;

    let x = ((point.lng + 180.0) / 360.0 * n).floor();

    let lat_rad = point.lat * PI / 180.0;
    let y = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n).floor();

    // lng = 180 and latitudes past the Mercator edge land outside the grid;
    // fold them into the last column or the first/last row
    Ok(TileCoord {
        x: x.clamp(0.0, max_index) as u32,
        y: y.clamp(0.0, max_index) as u32,
        zoom,
    })
}

/// Converts a tile grid corner back to geographic coordinates.
///
/// `(x, y)` may equal `2^zoom` so that the south/east edges of the last
/// tiles can be addressed.
#[inline]
pub fn tile_corner(x: u32, y: u32, zoom: u8) -> GeoPoint {
    let n = 2f64.powi(i32::from(zoom));

    let lng = x as f64 / n * 360.0 - 180.0;

    let lat_rad = (PI * (1.0 - 2.0 * y as f64 / n)).sinh().atan();
    let lat = lat_rad * 180.0 / PI;

    GeoPoint { lat, lng }
}

/// Converts tile coordinates back to geographic coordinates.
///
/// Returns the latitude/longitude of the tile's northwest corner.
#[inline]
pub fn tile_to_lat_lon(tile: &TileCoord) -> GeoPoint {
    tile_corner(tile.x, tile.y, tile.zoom)
}
