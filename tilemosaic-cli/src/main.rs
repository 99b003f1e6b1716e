//! TileMosaic CLI - Command-line interface
//!
//! Exposes the overlay service operations. Responses are printed to stdout
//! as JSON; logs go to the configured log file.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use commands::config::ConfigCommands;

#[derive(Parser)]
#[command(name = "tilemosaic")]
#[command(version, about = "Locate, expand and stitch historical map tiles", long_about = None)]
struct Cli {
    /// Use this config file instead of ~/.tilemosaic/config.ini
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (also mirrored to stderr)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// A geographic point as typed by the user.
///
/// Kept as text so malformed input yields a structured error response.
#[derive(Debug, Args)]
pub struct PointArgs {
    /// Latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    lat: String,

    /// Longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    lng: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the tile under a point
    Locate {
        #[command(flatten)]
        point: PointArgs,

        /// Zoom level (default: 17)
        #[arg(long)]
        zoom: Option<u8>,
    },

    /// List the zoom 17 tiles under the zoom 13 tile at a point
    Expand {
        #[command(flatten)]
        point: PointArgs,
    },

    /// Stitch the 64 zoom 17 tiles covering the zoom 14 tile at a point
    Merge {
        #[command(flatten)]
        point: PointArgs,

        /// Write the composite PNG here instead of printing a data URL
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Load a preset tile list
    Preset {
        /// Preset name, resolved to <presets.directory>/<TYPE>.txt
        #[arg(value_name = "TYPE")]
        preset_type: String,

        /// Print the tiles as a GeoJSON FeatureCollection
        #[arg(long)]
        geojson: bool,
    },

    /// Print the boundary polygon of the tile under a point as GeoJSON
    Polygon {
        #[command(flatten)]
        point: PointArgs,

        /// Zoom level
        #[arg(long, default_value_t = tilemosaic::selection::SELECTION_ZOOM)]
        zoom: u8,
    },

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let Cli {
        config,
        debug,
        command,
    } = Cli::parse();

    let result = match command {
        Commands::Config(command) => commands::config::run(command, config.as_deref()),
        command => runner::CliRunner::new(config.as_deref(), debug)
            .and_then(|runner| dispatch(&runner, command)),
    };

    if let Err(e) = result {
        e.exit();
    }
}

fn dispatch(runner: &runner::CliRunner, command: Commands) -> Result<(), error::CliError> {
    match command {
        Commands::Locate { point, zoom } => commands::tiles::run_locate(runner, &point, zoom),
        Commands::Expand { point } => commands::tiles::run_expand(runner, &point),
        Commands::Polygon { point, zoom } => commands::tiles::run_polygon(runner, &point, zoom),
        Commands::Merge { point, output } => {
            commands::merge::run(runner, &point, output.as_deref())
        }
        Commands::Preset {
            preset_type,
            geojson,
        } => commands::preset::run(runner, &preset_type, geojson),
        // handled before the runner starts
        Commands::Config(_) => Ok(()),
    }
}
