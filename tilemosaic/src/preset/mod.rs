//! Preset tile lists
//!
//! Presets are named lists of raw coordinates kept in an external store.
//! The store records coordinates at a zoom two levels finer than the
//! selection zoom, so every raw `(x, y)` maps to the zoom 15 tile
//! `(floor(x / 4), floor(y / 4))`.

mod store;

pub use store::{parse_coordinates, FilePresetStore, PresetStore};

use thiserror::Error;
use tracing::debug;

use crate::coord::{TileCoord, TilePolygon};

/// Zoom of the tiles a preset resolves to.
pub const PRESET_ZOOM: u8 = 15;

/// Divisor from the store's native grid down to [`PRESET_ZOOM`].
pub const PRESET_DOWNSCALE: f64 = 4.0;

/// Errors raised while loading a preset.
#[derive(Debug, Error)]
pub enum PresetError {
    /// Preset name is empty or contains characters other than `[A-Za-z0-9_-]`
    #[error("Invalid preset type: '{0}'")]
    InvalidType(String),

    /// The store could not be read
    #[error("Failed to read preset '{preset}': {source}")]
    Io {
        preset: String,
        #[source]
        source: std::io::Error,
    },
}

/// A coordinate as recorded in the preset store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawCoordinate {
    pub x: f64,
    pub y: f64,
}

impl RawCoordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Maps the coordinate onto the zoom 15 grid.
    ///
    /// Returns `None` when the result falls outside the grid.
    pub fn to_preset_tile(&self) -> Option<TileCoord> {
        let x = (self.x / PRESET_DOWNSCALE).floor();
        let y = (self.y / PRESET_DOWNSCALE).floor();
        if !x.is_finite() || !y.is_finite() || x < 0.0 || y < 0.0 {
            return None;
        }
        TileCoord::new(x as u32, y as u32, PRESET_ZOOM).ok()
    }
}

/// Checks that a preset type is a plain name safe to resolve in a store.
pub fn validate_preset_type(preset_type: &str) -> Result<&str, PresetError> {
    let valid = !preset_type.is_empty()
        && preset_type
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(preset_type)
    } else {
        Err(PresetError::InvalidType(preset_type.to_string()))
    }
}

/// Loads a preset and resolves it to zoom 15 tiles, in store order.
pub async fn load_preset_tiles<P: PresetStore>(
    store: &P,
    preset_type: &str,
) -> Result<Vec<TileCoord>, PresetError> {
    let preset_type = validate_preset_type(preset_type)?;
    let raw = store.load(preset_type).await?;

    let tiles: Vec<TileCoord> = raw
        .iter()
        .filter_map(|coord| {
            let tile = coord.to_preset_tile();
            if tile.is_none() {
                debug!(x = coord.x, y = coord.y, "Skipping preset coordinate outside grid");
            }
            tile
        })
        .collect();

    debug!(preset = preset_type, tiles = tiles.len(), "Preset loaded");
    Ok(tiles)
}

/// Boundary polygons for preset tiles.
pub fn preset_polygons(tiles: &[TileCoord]) -> Vec<TilePolygon> {
    tiles.iter().map(crate::coord::polygon_for).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_mapping() {
        let tile = RawCoordinate::new(40.0, 20.0).to_preset_tile().unwrap();
        assert_eq!(tile, TileCoord::new(10, 5, 15).unwrap());
    }

    #[test]
    fn test_preset_mapping_floors() {
        let tile = RawCoordinate::new(43.0, 23.9).to_preset_tile().unwrap();
        assert_eq!((tile.x, tile.y), (10, 5));
    }

    #[test]
    fn test_preset_mapping_rejects_outside_grid() {
        assert_eq!(RawCoordinate::new(-4.0, 0.0).to_preset_tile(), None);
        assert_eq!(RawCoordinate::new(4.0 * 32768.0, 0.0).to_preset_tile(), None);
        assert_eq!(RawCoordinate::new(f64::NAN, 0.0).to_preset_tile(), None);
    }

    #[test]
    fn test_validate_preset_type() {
        assert!(validate_preset_type("segment").is_ok());
        assert!(validate_preset_type("road_2-b").is_ok());
        assert!(validate_preset_type("").is_err());
        assert!(validate_preset_type("../etc/passwd").is_err());
        assert!(validate_preset_type("a b").is_err());
    }

    #[test]
    fn test_preset_polygons() {
        let tiles = vec![TileCoord::new(10, 5, 15).unwrap()];
        let polygons = preset_polygons(&tiles);
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].tile, tiles[0]);
    }
}
