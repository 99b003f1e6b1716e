//! Per-session selection registry.

use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::debug;

use super::{SelectionEvent, TileSelection};
use crate::coord::TileCoord;

/// Owns one [`TileSelection`] per client session.
///
/// Each session's set is only mutated while holding its map entry, so
/// toggles on the same session are serialized while different sessions
/// proceed independently.
#[derive(Debug, Default)]
pub struct SelectionSessions {
    sessions: DashMap<String, TileSelection>,
}

impl SelectionSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggles a tile in the session's selection, creating the session if needed.
    ///
    /// Returns the applied change and the selection afterwards.
    pub fn toggle(&self, session: &str, tile: TileCoord) -> (SelectionEvent, Vec<TileCoord>) {
        let mut selection = self.sessions.entry(session.to_string()).or_default();
        let event = selection.toggle(tile);
        (event, selection.tiles().to_vec())
    }

    /// Empties a session's selection, keeping the session and its subscribers.
    pub fn clear(&self, session: &str) {
        if let Some(mut selection) = self.sessions.get_mut(session) {
            selection.clear();
        }
    }

    /// Current selection of a session (empty if unknown).
    pub fn snapshot(&self, session: &str) -> Vec<TileCoord> {
        self.sessions
            .get(session)
            .map(|s| s.tiles().to_vec())
            .unwrap_or_default()
    }

    /// Drops a session entirely. Returns true if it existed.
    pub fn reset(&self, session: &str) -> bool {
        let removed = self.sessions.remove(session).is_some();
        if removed {
            debug!(session, "Selection session reset");
        }
        removed
    }

    /// Subscribes to a session's changes, creating the session if needed.
    pub fn subscribe(&self, session: &str) -> broadcast::Receiver<SelectionEvent> {
        self.sessions
            .entry(session.to_string())
            .or_default()
            .subscribe()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
