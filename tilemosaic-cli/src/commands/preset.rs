//! `preset` command.

use crate::error::CliError;
use crate::runner::{print_json, CliRunner};

/// Prints a preset's tiles, or its polygons with `geojson`.
pub fn run(runner: &CliRunner, preset_type: &str, geojson: bool) -> Result<(), CliError> {
    let service = runner.service();

    if geojson {
        return runner.respond(&runner.block_on(service.preset_layer(preset_type)));
    }

    let response = runner.block_on(service.load_preset(preset_type));
    print_json(&response)?;
    match response.tiles() {
        Some(_) => Ok(()),
        None => Err(CliError::Request(format!(
            "Preset '{}' could not be loaded",
            preset_type
        ))),
    }
}
