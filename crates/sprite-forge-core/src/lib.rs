//! Core library for turning animation strips into a packed sprite sheet.
//!
//! - Image accessor: `SpriteImage` decodes buffers and exposes raw pixels
//! - Validation: border transparency + structural checks, collected into a report
//! - Repair: alpha promotion and near-color background removal
//! - Slicing: strips and grids into frames, tolerant of size mismatches
//! - Packing: height-sorted row packer, composited sheet + animation index
//! - Forge: per-animation fetch/validate/fix/slice with bounded retries, then one pack
//!
//! Quick example:
//! ```ignore
//! use sprite_forge_core::prelude::*;
//! # fn main() -> anyhow::Result<()> {
//! let strip = SpriteImage::open("walk.png")?;
//! let report = validate(&strip, ExpectedSize::new(256, 64), &ValidatorConfig::default());
//! assert!(report.is_valid, "{:?}", report.errors);
//! let frames: Vec<Frame> = slice_strip(&strip, 64, 64, 4)
//!     .frames
//!     .into_iter()
//!     .map(|f| f.attach("walk", 8, true))
//!     .collect();
//! let out = pack(&frames, &PackerConfig::default())?;
//! println!("sheet {}x{}", out.atlas.sheet.width, out.atlas.sheet.height);
//! # Ok(()) }
//! ```

pub mod background;
pub mod compositing;
pub mod config;
pub mod error;
pub mod export;
pub mod export_plist;
pub mod forge;
pub mod model;
pub mod packer;
pub mod slice;
pub mod sprite_image;
pub mod sprite_spec;
pub mod validate;

pub use background::*;
pub use config::*;
pub use error::*;
pub use export::*;
pub use export_plist::*;
pub use forge::*;
pub use model::*;
pub use packer::*;
pub use slice::*;
pub use sprite_image::*;
pub use sprite_spec::*;
pub use validate::*;

/// Convenience prelude for common types and functions.
/// Importing `sprite_forge_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::background::{
        dominant_corner_color, ensure_alpha_channel, remove_near_color_background,
    };
    pub use crate::config::{
        FixConfig, ForgeConfig, PackerConfig, PackerConfigBuilder, RetryConfig, SliceOptions,
        ValidatorConfig,
    };
    pub use crate::error::SpriteForgeError;
    pub use crate::forge::{ForgeOutput, StripRequest, StripSource, fetch_strip, forge};
    pub use crate::model::{Animation, AnimationIndex, Atlas, Frame, FrameRect, LayoutResult, Rect};
    pub use crate::packer::{PackOutput, build_animation_index, layout, pack};
    pub use crate::slice::{SliceOutput, slice_grid, slice_strip};
    pub use crate::sprite_image::{ImageMetadata, SpriteImage};
    pub use crate::sprite_spec::SpriteSpec;
    pub use crate::validate::{ExpectedSize, ValidationReport, validate};
    pub use crate::{ValidationDocument, to_animation_json, to_atlas_json, to_plist};
}
