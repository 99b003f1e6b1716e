//! INI serialization logic for converting `ConfigFile` → INI string.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        r#"[tiles]
; Tile server prefix; tiles are fetched from <server_base>-<zoom>-<x>-<y>
server_base = {}
; Tile image edge length in pixels
tile_size = {}

[compositor]
; Per-tile fetch timeout in seconds (a timeout leaves that tile blank)
request_timeout_secs = {}
; Maximum concurrent tile fetches per composite (0 = unbounded)
max_concurrent_fetches = {}

[presets]
; Directory holding <type>.txt files of "x,y" lines
directory = {}

[logging]
file = {}
"#,
        config.tiles.server_base,
        config.tiles.tile_size,
        config.compositor.request_timeout_secs,
        config.compositor.max_concurrent_fetches,
        path_to_string(&config.presets.directory),
        path_to_string(&config.logging.file),
    )
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
