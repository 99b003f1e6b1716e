//! User configuration (`~/.tilemosaic/config.ini`).
//!
//! Settings structs live in [`settings`], parsing in [`parser`] and
//! serialization in [`writer`]. Missing files and keys fall back to defaults.

mod file;
mod parser;
mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    CompositorSettings, ConfigFile, LoggingSettings, PresetSettings, TileSettings,
    DEFAULT_LOG_FILE,
};
