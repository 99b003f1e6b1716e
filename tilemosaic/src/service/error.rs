//! Service error types.

use thiserror::Error;

use crate::compositor::CompositorError;
use crate::coord::CoordError;
use crate::preset::PresetError;
use crate::provider::ProviderError;

/// Errors surfaced by service operations.
///
/// Operations flatten these into `{ "error": "<message>" }` responses; the
/// enum is kept so Rust callers can still match on the cause.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Coord(#[from] CoordError),

    #[error(transparent)]
    Compositor(#[from] CompositorError),

    #[error(transparent)]
    Preset(#[from] PresetError),

    /// Tile source could not be constructed
    #[error("Tile source unavailable: {0}")]
    Provider(#[from] ProviderError),
}
