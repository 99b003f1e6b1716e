//! Multi-tile compositing
//!
//! Fetches every descendant of a base tile at a finer zoom concurrently and
//! stitches them into one raster aligned to the base tile's footprint.

mod compose;
mod types;

pub use compose::TileCompositor;
pub use types::{
    CompositeImage, CompositeStats, CompositorConfig, CompositorError, SubTileFailure,
    SubTileResults, SubTileSuccess, DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_CONCURRENT_FETCHES,
    DEFAULT_TILE_SIZE, MAX_CANVAS_SIZE,
};
