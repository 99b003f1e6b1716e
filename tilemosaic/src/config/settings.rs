//! Configuration settings structs and their defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::compositor::{
    CompositorConfig, DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_CONCURRENT_FETCHES, DEFAULT_TILE_SIZE,
};
use crate::provider::DEFAULT_TILE_SERVER_BASE;

/// Default log file name, placed in the config directory.
pub const DEFAULT_LOG_FILE: &str = "tilemosaic.log";

/// Complete user configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub tiles: TileSettings,
    pub compositor: CompositorSettings,
    pub presets: PresetSettings,
    pub logging: LoggingSettings,
}

/// `[tiles]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct TileSettings {
    /// URL prefix; tiles are fetched from `{server_base}-{zoom}-{x}-{y}`
    pub server_base: String,
    /// Edge length of one tile image in pixels
    pub tile_size: u32,
}

/// `[compositor]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositorSettings {
    pub request_timeout_secs: u64,
    /// 0 means unbounded
    pub max_concurrent_fetches: usize,
}

/// `[presets]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct PresetSettings {
    /// Directory holding `<type>.txt` coordinate lists
    pub directory: PathBuf,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub file: PathBuf,
}

impl Default for ConfigFile {
    fn default() -> Self {
        let config_dir = super::config_directory();
        Self {
            tiles: TileSettings {
                server_base: DEFAULT_TILE_SERVER_BASE.to_string(),
                tile_size: DEFAULT_TILE_SIZE,
            },
            compositor: CompositorSettings {
                request_timeout_secs: DEFAULT_FETCH_TIMEOUT.as_secs(),
                max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
            },
            presets: PresetSettings {
                directory: config_dir.join("presets"),
            },
            logging: LoggingSettings {
                file: config_dir.join(DEFAULT_LOG_FILE),
            },
        }
    }
}

impl ConfigFile {
    /// Compositor settings derived from this configuration.
    pub fn compositor_config(&self) -> CompositorConfig {
        CompositorConfig {
            tile_size: self.tiles.tile_size,
            fetch_timeout: Duration::from_secs(self.compositor.request_timeout_secs),
            max_concurrent_fetches: self.compositor.max_concurrent_fetches,
        }
    }
}
