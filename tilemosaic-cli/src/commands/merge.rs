//! `merge` command.
//!
//! Ctrl-C cancels outstanding sub-tile fetches; whatever arrived before the
//! interrupt is still written out.

use std::path::Path;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::CliError;
use crate::runner::{print_json, CliRunner};
use crate::PointArgs;

pub fn run(runner: &CliRunner, point: &PointArgs, output: Option<&Path>) -> Result<(), CliError> {
    let token = CancellationToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || {
        eprintln!("Interrupted, cancelling remaining tile fetches...");
        handler_token.cancel();
    })
    .map_err(|e| CliError::Signal(e.to_string()))?;

    let service = runner.service();

    let Some(output) = output else {
        let response = runner.block_on(service.merge_cancellable(&point.lat, &point.lng, token));
        return runner.respond(&response);
    };

    let composite = runner
        .block_on(service.merge_image(&point.lat, &point.lng, token))
        .map_err(CliError::Merge)?;
    let png = composite
        .encode_png()
        .map_err(|e| CliError::Merge(e.into()))?;

    std::fs::write(output, png).map_err(|error| CliError::FileWrite {
        path: output.display().to_string(),
        error,
    })?;
    info!(path = %output.display(), "Composite written");

    let stats = &composite.stats;
    print_json(&json!({
        "baseTile": composite.base_tile,
        "output": output.display().to_string(),
        "size": composite.size(),
        "tiles": {
            "total": stats.total,
            "successful": stats.successful,
            "failed": stats.failed,
        },
        "cancelled": stats.cancelled,
        "elapsedMs": stats.elapsed.as_millis() as u64,
    }))
}
