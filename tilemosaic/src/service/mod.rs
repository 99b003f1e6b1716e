//! Overlay service boundary.
//!
//! [`OverlayService`] exposes the operations map clients call: `locate`,
//! `expand`, `merge`, `load_preset` and the selection click flow. Every
//! operation returns a serializable response whose failure case is a
//! structured `{ "error": "..." }` object rather than a Rust error, so
//! callers branch on the payload instead of on faults.
//!
//! # Example
//!
//! ```ignore
//! use tilemosaic::config::ConfigFile;
//! use tilemosaic::service::OverlayService;
//!
//! let service = OverlayService::from_config(&ConfigFile::load()?)?;
//! let located = service.locate("25.03", "121.5", None);
//! println!("{}", serde_json::to_string(&located)?);
//! ```

mod error;
mod overlay;
mod response;

pub use error::ServiceError;
pub use overlay::{
    DefaultOverlayService, OverlayService, EXPAND_BASE_ZOOM, EXPAND_TARGET_ZOOM,
    LOCATE_DEFAULT_ZOOM, MERGE_BASE_ZOOM, MERGE_TARGET_ZOOM,
};
pub use response::{
    ExpandResult, LocatedTile, MergeResult, PresetResponse, SelectResult, ServiceResponse,
};
