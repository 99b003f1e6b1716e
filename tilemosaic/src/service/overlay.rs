//! Overlay service implementation

use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::ServiceError;
use super::response::{
    ExpandResult, LocatedTile, MergeResult, PresetResponse, SelectResult, ServiceResponse,
};
use crate::compositor::{CompositeImage, CompositorConfig, TileCompositor};
use crate::config::ConfigFile;
use crate::coord::{
    feature_collection, parse_geo_point, polygon_for, to_tile_coords, TileCoord, TilePolygon,
};
use crate::preset::{load_preset_tiles, preset_polygons, FilePresetStore, PresetStore};
use crate::provider::{AsyncReqwestClient, HistoricalTileSource, TileSource};
use crate::selection::{SelectionEvent, SelectionSessions, SELECTION_ZOOM};

/// Zoom used by `locate` when the caller does not pass one.
pub const LOCATE_DEFAULT_ZOOM: u8 = 17;

/// `expand` returns the zoom 13 tile and its zoom 17 descendants (16×16).
pub const EXPAND_BASE_ZOOM: u8 = 13;
pub const EXPAND_TARGET_ZOOM: u8 = 17;

/// `merge` stitches the 8×8 zoom 17 tiles under a zoom 14 tile.
pub const MERGE_BASE_ZOOM: u8 = 14;
pub const MERGE_TARGET_ZOOM: u8 = 17;

/// Service wired to the HTTP tile server and file-backed presets.
pub type DefaultOverlayService =
    OverlayService<HistoricalTileSource<AsyncReqwestClient>, FilePresetStore>;

/// The map overlay operations.
///
/// Generic over the tile source and preset store so tests can substitute
/// in-memory implementations.
pub struct OverlayService<S: TileSource, P: PresetStore> {
    compositor: TileCompositor<S>,
    presets: P,
    selections: SelectionSessions,
}

impl DefaultOverlayService {
    /// Builds the service from user configuration.
    pub fn from_config(config: &ConfigFile) -> Result<Self, ServiceError> {
        let client = AsyncReqwestClient::new()?;
        let source = HistoricalTileSource::new(config.tiles.server_base.clone(), client);
        let presets = FilePresetStore::new(config.presets.directory.clone());

        info!(
            server = %config.tiles.server_base,
            presets = %config.presets.directory.display(),
            "Overlay service configured"
        );

        Ok(Self::new(source, presets, config.compositor_config()))
    }
}

impl<S: TileSource + 'static, P: PresetStore> OverlayService<S, P> {
    pub fn new(source: S, presets: P, compositor: CompositorConfig) -> Self {
        Self {
            compositor: TileCompositor::new(Arc::new(source), compositor),
            presets,
            selections: SelectionSessions::new(),
        }
    }

    pub fn source(&self) -> &S {
        self.compositor.source()
    }

    pub fn selections(&self) -> &SelectionSessions {
        &self.selections
    }

    /// Tile under a point at `zoom` (default 17), with its image URL.
    pub fn locate(&self, lat: &str, lng: &str, zoom: Option<u8>) -> ServiceResponse<LocatedTile> {
        let zoom = zoom.unwrap_or(LOCATE_DEFAULT_ZOOM);
        self.locate_tile(lat, lng, zoom)
            .map(|tile| self.located(tile))
            .into()
    }

    /// Zoom 13 tile under a point and its 256 zoom 17 descendants.
    ///
    /// Pure arithmetic; no tile is fetched.
    pub fn expand(&self, lat: &str, lng: &str) -> ServiceResponse<ExpandResult> {
        let result = self.locate_tile(lat, lng, EXPAND_BASE_ZOOM).and_then(|base| {
            let zoom17_tiles = base
                .descendants(EXPAND_TARGET_ZOOM)?
                .map(|tile| self.located(tile))
                .collect();
            Ok(ExpandResult {
                zoom13: base,
                zoom17_tiles,
            })
        });
        result.into()
    }

    /// Composite of the zoom 17 tiles covering the zoom 14 tile under a point.
    pub async fn merge(&self, lat: &str, lng: &str) -> ServiceResponse<MergeResult> {
        self.merge_cancellable(lat, lng, CancellationToken::new())
            .await
    }

    /// `merge` with cooperative cancellation.
    pub async fn merge_cancellable(
        &self,
        lat: &str,
        lng: &str,
        token: CancellationToken,
    ) -> ServiceResponse<MergeResult> {
        let result = match self.merge_image(lat, lng, token).await {
            Ok(composite) => composite
                .to_data_url()
                .map(|merged_image| MergeResult {
                    base_tile: composite.base_tile,
                    merged_image,
                })
                .map_err(ServiceError::from),
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            warn!(lat, lng, error = %e, "Merge failed");
        }
        result.into()
    }

    /// Builds the merge composite without encoding it.
    pub async fn merge_image(
        &self,
        lat: &str,
        lng: &str,
        token: CancellationToken,
    ) -> Result<CompositeImage, ServiceError> {
        let point = parse_geo_point(lat, lng)?;
        let composite = self
            .compositor
            .compose_cancellable(point, MERGE_BASE_ZOOM, MERGE_TARGET_ZOOM, token)
            .await?;
        Ok(composite)
    }

    /// Loads a named preset as zoom 15 tiles.
    pub async fn load_preset(&self, preset_type: &str) -> PresetResponse {
        match load_preset_tiles(&self.presets, preset_type).await {
            Ok(tiles) => PresetResponse::loaded(tiles),
            Err(e) => {
                warn!(preset = preset_type, error = %e, "Preset load failed");
                PresetResponse::failed(e.to_string())
            }
        }
    }

    /// Preset tiles as a GeoJSON `FeatureCollection`.
    pub async fn preset_layer(&self, preset_type: &str) -> ServiceResponse<Value> {
        let result = load_preset_tiles(&self.presets, preset_type)
            .await
            .map(|tiles| feature_collection(&preset_polygons(&tiles)));
        result.into()
    }

    /// Toggles the zoom 15 tile under a point in `session`'s selection.
    ///
    /// Invalid input leaves the selection untouched.
    pub fn select(&self, session: &str, lat: &str, lng: &str) -> ServiceResponse<SelectResult> {
        let result = self.locate_tile(lat, lng, SELECTION_ZOOM).map(|tile| {
            let (event, tiles) = self.selections.toggle(session, tile);
            debug!(session, tile = %tile, ?event, "Selection toggled");
            SelectResult {
                tile,
                selected: matches!(event, SelectionEvent::Added(_)),
                tiles,
            }
        });
        result.into()
    }

    /// Boundary polygons of a session's selection, in selection order.
    pub fn selection_layer(&self, session: &str) -> Value {
        let polygons: Vec<TilePolygon> = self
            .selections
            .snapshot(session)
            .iter()
            .map(polygon_for)
            .collect();
        feature_collection(&polygons)
    }

    /// Boundary polygon of the tile under a point as a GeoJSON `Feature`.
    pub fn polygon(&self, lat: &str, lng: &str, zoom: u8) -> ServiceResponse<Value> {
        self.locate_tile(lat, lng, zoom)
            .map(|tile| polygon_for(&tile).to_feature())
            .into()
    }

    fn locate_tile(&self, lat: &str, lng: &str, zoom: u8) -> Result<TileCoord, ServiceError> {
        let point = parse_geo_point(lat, lng)?;
        Ok(to_tile_coords(point, zoom)?)
    }

    fn located(&self, tile: TileCoord) -> LocatedTile {
        LocatedTile {
            tile_url: self.source().tile_url(&tile),
            tile,
        }
    }
}
