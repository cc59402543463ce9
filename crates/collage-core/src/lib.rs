//! Core library for packing pictures onto fixed-size canvases.
//!
//! - Packer: guillotine-style splitting into overlapping leftover regions,
//!   cost-driven region choice, and a merge pass that tidies free space
//! - Pipeline: [`Collage`] takes sized items and returns per-canvas sheets
//! - Data model is serde-serializable; the RGBA backend and JSON exporters
//!   turn sheets into files.
//!
//! Quick example:
//! ```ignore
//! use collage_core::prelude::*;
//! # fn main() -> collage_core::Result<()> {
//! let cfg = CollageConfig::builder().canvas_size(1920.0, 1080.0).seed(Some(7)).build();
//! let items = vec![("a.jpg", Size::new(1200.0, 800.0)), ("b.jpg", Size::new(600.0, 900.0))];
//! let mut collage = Collage::new(cfg, items)?;
//! let report = collage.plan()?;
//! println!("canvases: {}", report.canvases);
//! # Ok(()) }
//! ```

pub mod catalog;
#[cfg(feature = "image")]
pub mod compositing;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod packer;
pub mod pipeline;

pub use catalog::*;
pub use config::*;
pub use error::*;
pub use export::*;
pub use model::*;
pub use packer::*;
pub use pipeline::*;

/// Convenience prelude for common types and functions.
/// Importing `collage_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::catalog::{ImageCatalog, ImageItem};
    #[cfg(feature = "image")]
    pub use crate::compositing::RgbaBackend;
    pub use crate::config::{
        CollageConfig, CollageConfigBuilder, CornerStrategy, CostFunction, SortOrder,
    };
    pub use crate::model::{Layout, Meta, PackStats, Placement, Rect, Sheet, Size};
    pub use crate::packer::Item;
    pub use crate::packer::canvas::{Canvas, CanvasId};
    pub use crate::packer::region::{Corner, RegionId};
    pub use crate::pipeline::{Collage, ImageBackend, PlanReport, Unplaced, UnplacedReason};
    pub use crate::{CollageError, Result, to_json_hash, to_json_layout};
}
