//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization, the async runtime
//! and service creation so command handlers stay small.

use std::future::Future;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use tilemosaic::config::ConfigFile;
use tilemosaic::logging::{init_logging, LoggingGuard};
use tilemosaic::service::{DefaultOverlayService, ServiceResponse};

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    runtime: tokio::runtime::Runtime,
    service: DefaultOverlayService,
}

impl CliRunner {
    /// Loads config (from `config_path` or the default location), starts
    /// logging and builds the overlay service.
    ///
    /// # Arguments
    ///
    /// * `debug` - Enables debug-level logging mirrored to stderr
    pub fn new(config_path: Option<&Path>, debug: bool) -> Result<Self, CliError> {
        let config = match config_path {
            Some(path) => ConfigFile::load_from(path)?,
            None => ConfigFile::load()?,
        };

        let logging_guard = init_logging(&config.logging.file, debug, debug)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        info!("TileMosaic v{}", tilemosaic::VERSION);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(CliError::Runtime)?;

        let service =
            DefaultOverlayService::from_config(&config).map_err(CliError::ServiceCreation)?;

        Ok(Self {
            logging_guard,
            runtime,
            service,
        })
    }

    pub fn service(&self) -> &DefaultOverlayService {
        &self.service
    }

    /// Runs a future to completion on the runner's runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Prints a service response as JSON and turns an error response into a
    /// failing exit.
    pub fn respond<T: Serialize>(&self, response: &ServiceResponse<T>) -> Result<(), CliError> {
        print_json(response)?;
        match response.error() {
            Some(msg) => Err(CliError::Request(msg.to_string())),
            None => Ok(()),
        }
    }
}

/// Prints a value as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
