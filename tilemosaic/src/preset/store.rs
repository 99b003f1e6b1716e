//! Preset storage backends.

use std::future::Future;
use std::path::PathBuf;

use tracing::{debug, warn};

use super::{PresetError, RawCoordinate};

/// A source of named raw-coordinate lists.
pub trait PresetStore: Send + Sync {
    /// Loads the raw coordinates of a preset.
    fn load(
        &self,
        preset_type: &str,
    ) -> impl Future<Output = Result<Vec<RawCoordinate>, PresetError>> + Send;
}

/// Preset store backed by `<directory>/<type>.txt` files.
///
/// Each line holds one `x,y` pair; blank and malformed lines are skipped.
#[derive(Debug, Clone)]
pub struct FilePresetStore {
    directory: PathBuf,
}

impl FilePresetStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Path of the file backing a preset.
    pub fn preset_path(&self, preset_type: &str) -> PathBuf {
        self.directory.join(format!("{}.txt", preset_type))
    }
}

impl PresetStore for FilePresetStore {
    async fn load(&self, preset_type: &str) -> Result<Vec<RawCoordinate>, PresetError> {
        let path = self.preset_path(preset_type);
        debug!(path = %path.display(), "Reading preset file");

        let text = tokio::fs::read_to_string(&path).await.map_err(|source| {
            warn!(path = %path.display(), error = %source, "Failed to read preset file");
            PresetError::Io {
                preset: preset_type.to_string(),
                source,
            }
        })?;

        Ok(parse_coordinates(&text))
    }
}

/// Parses `x,y` lines into raw coordinates.
pub fn parse_coordinates(text: &str) -> Vec<RawCoordinate> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let parsed = parse_line(line);
            if parsed.is_none() {
                debug!(line, "Skipping malformed preset line");
            }
            parsed
        })
        .collect()
}

fn parse_line(line: &str) -> Option<RawCoordinate> {
    let mut parts = line.split(',');
    let x: f64 = parts.next()?.trim().parse().ok()?;
    let y: f64 = parts.next()?.trim().parse().ok()?;
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    Some(RawCoordinate { x, y })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::TileCoord;
    use crate::preset::load_preset_tiles;

    #[test]
    fn test_parse_coordinates_skips_bad_lines() {
        let text = "40,20\n\n  8 , 12 \nabc,1\n3\n1.5,2.5\r\n";
        let coords = parse_coordinates(text);
        assert_eq!(
            coords,
            vec![
                RawCoordinate::new(40.0, 20.0),
                RawCoordinate::new(8.0, 12.0),
                RawCoordinate::new(1.5, 2.5),
            ]
        );
    }

    #[tokio::test]
    async fn test_file_store_loads_tiles() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("segment.txt"), "40,20\n4,4\n").unwrap();

        let store = FilePresetStore::new(dir.path());
        let tiles = load_preset_tiles(&store, "segment").await.unwrap();

        assert_eq!(
            tiles,
            vec![
                TileCoord::new(10, 5, 15).unwrap(),
                TileCoord::new(1, 1, 15).unwrap()
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_preset_is_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = FilePresetStore::new(dir.path());

        let result = load_preset_tiles(&store, "absent").await;
        assert!(matches!(result, Err(PresetError::Io { .. })));
    }

    #[tokio::test]
    async fn test_invalid_type_never_touches_disk() {
        let store = FilePresetStore::new("/nonexistent");
        let result = load_preset_tiles(&store, "../secret").await;
        assert!(matches!(result, Err(PresetError::InvalidType(_))));
    }
}
