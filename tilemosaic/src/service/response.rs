//! Serializable response payloads.

use serde::Serialize;

use super::error::ServiceError;
use crate::coord::TileCoord;

/// Result of a service operation as seen by a client.
///
/// Serializes to the payload on success and to `{ "error": "<message>" }`
/// on failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ServiceResponse<T> {
    Ok(T),
    Error { error: String },
}

impl<T> ServiceResponse<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, ServiceResponse::Ok(_))
    }

    /// The payload, if the operation succeeded.
    pub fn ok(self) -> Option<T> {
        match self {
            ServiceResponse::Ok(value) => Some(value),
            ServiceResponse::Error { .. } => None,
        }
    }

    /// The error message, if the operation failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            ServiceResponse::Ok(_) => None,
            ServiceResponse::Error { error } => Some(error.as_str()),
        }
    }
}

impl<T, E: Into<ServiceError>> From<Result<T, E>> for ServiceResponse<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => ServiceResponse::Ok(value),
            Err(e) => ServiceResponse::Error {
                error: e.into().to_string(),
            },
        }
    }
}

/// A tile together with the URL its image is served from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocatedTile {
    #[serde(flatten)]
    pub tile: TileCoord,
    #[serde(rename = "tileURL")]
    pub tile_url: String,
}

/// Payload of `expand`: the zoom 13 tile and its 256 zoom 17 descendants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpandResult {
    pub zoom13: TileCoord,
    #[serde(rename = "zoom17Tiles")]
    pub zoom17_tiles: Vec<LocatedTile>,
}

/// Payload of `merge`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeResult {
    #[serde(rename = "baseTile")]
    pub base_tile: TileCoord,
    /// `data:image/png;base64,...`
    #[serde(rename = "mergedImage")]
    pub merged_image: String,
}

/// Payload of a selection click.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectResult {
    /// The tile that was toggled
    pub tile: TileCoord,
    /// Whether the tile is selected after the toggle
    pub selected: bool,
    /// The session's selection after the toggle, in order
    pub tiles: Vec<TileCoord>,
}

/// Result of `load_preset`, which reports success explicitly.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PresetResponse {
    Loaded { success: bool, tiles: Vec<TileCoord> },
    Failed { success: bool, error: String },
}

impl PresetResponse {
    pub fn loaded(tiles: Vec<TileCoord>) -> Self {
        PresetResponse::Loaded {
            success: true,
            tiles,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        PresetResponse::Failed {
            success: false,
            error: error.into(),
        }
    }

    pub fn tiles(&self) -> Option<&[TileCoord]> {
        match self {
            PresetResponse::Loaded { tiles, .. } => Some(tiles.as_slice()),
            PresetResponse::Failed { .. } => None,
        }
    }
}
