//! Subcommand handlers.

pub mod config;
pub mod merge;
pub mod preset;
pub mod tiles;
