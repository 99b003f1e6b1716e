//! `locate`, `expand` and `polygon` commands.
//!
//! These are pure coordinate operations; no tile is downloaded.

use crate::error::CliError;
use crate::runner::CliRunner;
use crate::PointArgs;

pub fn run_locate(runner: &CliRunner, point: &PointArgs, zoom: Option<u8>) -> Result<(), CliError> {
    runner.respond(&runner.service().locate(&point.lat, &point.lng, zoom))
}

pub fn run_expand(runner: &CliRunner, point: &PointArgs) -> Result<(), CliError> {
    runner.respond(&runner.service().expand(&point.lat, &point.lng))
}

pub fn run_polygon(runner: &CliRunner, point: &PointArgs, zoom: u8) -> Result<(), CliError> {
    runner.respond(&runner.service().polygon(&point.lat, &point.lng, zoom))
}
