//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [tiles] section
    if let Some(section) = ini.section(Some("tiles")) {
        if let Some(v) = section.get("server_base") {
            let v = v.trim();
            if !v.is_empty() {
                config.tiles.server_base = v.to_string();
            }
        }
        if let Some(size) = parse_number::<u32>(section, "tiles", "tile_size")? {
            if size == 0 {
                return Err(invalid("tiles", "tile_size", "0", "must be greater than 0"));
            }
            config.tiles.tile_size = size;
        }
    }

    // [compositor] section
    if let Some(section) = ini.section(Some("compositor")) {
        if let Some(secs) = parse_number::<u64>(section, "compositor", "request_timeout_secs")? {
            if secs == 0 {
                return Err(invalid(
                    "compositor",
                    "request_timeout_secs",
                    "0",
                    "must be greater than 0",
                ));
            }
            config.compositor.request_timeout_secs = secs;
        }
        if let Some(n) = parse_number::<usize>(section, "compositor", "max_concurrent_fetches")? {
            config.compositor.max_concurrent_fetches = n;
        }
    }

    // [presets] section
    if let Some(section) = ini.section(Some("presets")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.presets.directory = expand_tilde(v);
            }
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn parse_number<T: FromStr>(
    section: &Properties,
    section_name: &str,
    key: &str,
) -> Result<Option<T>, ConfigFileError> {
    match section.get(key) {
        None => Ok(None),
        Some(v) => v
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| invalid(section_name, key, v, "expected a non-negative integer")),
    }
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Expands a leading `~` to the home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_ini_gives_defaults() {
        let ini = Ini::load_from_str("").unwrap();
        assert_eq!(parse_ini(&ini).unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_overlays_values() {
        let ini = Ini::load_from_str(
            "[tiles]\nserver_base = http://tiles.local/img\ntile_size = 512\n\
             [compositor]\nrequest_timeout_secs = 3\nmax_concurrent_fetches = 0\n\
             [presets]\ndirectory = /data/presets\n",
        )
        .unwrap();

        let config = parse_ini(&ini).unwrap();
        assert_eq!(config.tiles.server_base, "http://tiles.local/img");
        assert_eq!(config.tiles.tile_size, 512);
        assert_eq!(config.compositor.request_timeout_secs, 3);
        assert_eq!(config.compositor.max_concurrent_fetches, 0);
        assert_eq!(config.presets.directory, PathBuf::from("/data/presets"));
    }

    #[test]
    fn test_rejects_bad_numbers() {
        let ini = Ini::load_from_str("[tiles]\ntile_size = big\n").unwrap();
        let err = parse_ini(&ini).unwrap_err();
        assert!(matches!(
            err,
            ConfigFileError::InvalidValue { ref key, .. } if key == "tile_size"
        ));

        let ini = Ini::load_from_str("[compositor]\nrequest_timeout_secs = 0\n").unwrap();
        assert!(parse_ini(&ini).is_err());
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/presets"), home.join("presets"));
        }
    }
}
