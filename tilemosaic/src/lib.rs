//! TileMosaic - historical map tile overlay engine
//!
//! Locates tiles of a Web Mercator raster pyramid under geographic points,
//! tracks per-session tile selections, and stitches high-zoom tiles into a
//! single composite covering a lower-zoom tile's footprint.
//!
//! # Modules
//!
//! - [`coord`] - coordinate ↔ tile conversion, boundary polygons, zoom expansion
//! - [`selection`] - toggle-based tile selection sets
//! - [`provider`] - remote tile sources
//! - [`compositor`] - concurrent multi-tile compositing
//! - [`preset`] - named tile lists from an external store
//! - [`service`] - the client-facing operations
//! - [`config`] - `~/.tilemosaic/config.ini`
//! - [`logging`] - tracing setup

pub mod compositor;
pub mod config;
pub mod coord;
pub mod logging;
pub mod preset;
pub mod provider;
pub mod selection;
pub mod service;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
