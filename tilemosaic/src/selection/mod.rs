//! Tile selection state
//!
//! A [`TileSelection`] is the ordered set of tiles a client session has
//! picked. Tiles are unique by `(x, y)`; toggling a selected tile removes it
//! in place and toggling an unselected one appends it. Consumers that redraw
//! on change subscribe to [`SelectionEvent`]s instead of polling.
//!
//! A selection is single-writer: mutation takes `&mut self`, so concurrent
//! access must go through an owner such as [`SelectionSessions`].

mod sessions;

pub use sessions::SelectionSessions;

use tokio::sync::broadcast;
use tracing::debug;

use crate::coord::{polygon_for, TileCoord, TilePolygon};

/// Zoom level at which clients select tiles.
pub const SELECTION_ZOOM: u8 = 15;

/// Channel capacity for selection change broadcasts.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// A change applied to a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEvent {
    Added(TileCoord),
    Removed(TileCoord),
    Cleared,
}

/// Ordered, deduplicated set of selected tiles.
#[derive(Debug)]
pub struct TileSelection {
    tiles: Vec<TileCoord>,
    events: broadcast::Sender<SelectionEvent>,
}

impl TileSelection {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            tiles: Vec::new(),
            events,
        }
    }

    /// Removes the tile with the same `(x, y)` if present, otherwise appends it.
    ///
    /// Applying the same toggle twice restores the previous membership and order.
    pub fn toggle(&mut self, tile: TileCoord) -> SelectionEvent {
        let event = match self
            .tiles
            .iter()
            .position(|t| t.x == tile.x && t.y == tile.y)
        {
            Some(index) => SelectionEvent::Removed(self.tiles.remove(index)),
            None => {
                self.tiles.push(tile);
                SelectionEvent::Added(tile)
            }
        };

        debug!(?event, selected = self.tiles.len(), "Selection toggled");
        self.notify(event);
        event
    }

    /// Empties the selection.
    pub fn clear(&mut self) {
        self.tiles.clear();
        self.notify(SelectionEvent::Cleared);
    }

    /// Selected tiles in selection order.
    pub fn tiles(&self) -> &[TileCoord] {
        &self.tiles
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        self.tiles.iter().any(|t| t.x == x && t.y == y)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Boundary polygons of the selected tiles, in selection order.
    pub fn polygons(&self) -> Vec<TilePolygon> {
        self.tiles.iter().map(polygon_for).collect()
    }

    /// Subscribes to future changes of this selection.
    pub fn subscribe(&self) -> broadcast::Receiver<SelectionEvent> {
        self.events.subscribe()
    }

    fn notify(&self, event: SelectionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

impl Default for TileSelection {
    fn default() -> Self {
        Self::new()
    }
}
