//! # Asset Normalizer
//!
//! Normalizes game and UI art into consistently sized, sharp, transparent
//! canvases. Every source image is classified as pixel art or illustration,
//! and the rest of the pipeline follows the profile picked for it:
//!
//! ```text
//! pixel art:     trim → unpremultiply → defringe → ×N nearest → pad → sharpen (RGBA)
//! illustration:  trim → unpremultiply → [Real-ESRGAN] → fit → pad → smooth alpha → sharpen (RGB)
//! ```
//!
//! Content is never cropped unless asked for: images are downscaled until they
//! fit and then centred on a transparent canvas.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | Shared domain types: kinds, sizes, bounding boxes, the [`types::Asset`] buffer |
//! | [`imaging`] | Every image operation, the codec and the super-resolution port |
//! | [`process`] | Orchestrates the pipeline for one image or a whole directory |
//! | [`metadata`] | Per-image processing records and the JSONL log |
//! | [`config`] | `asset-normalizer.toml` loading, merging, and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## One Kind, Resolved Once
//!
//! `auto` is resolved by [`imaging::classify_kind`] before any pixel is
//! touched, and every later branch matches on the resolved [`types::Kind`].
//! Pixel art is only scaled by whole factors with nearest-neighbour sampling,
//! so each source pixel stays a crisp block.
//!
//! ## Stages as Transforms
//!
//! Each stage takes an owned `RgbaImage` and returns a new one. The colour
//! profile travels next to the pixels in [`types::Asset`] and is written back
//! byte for byte on save.
//!
//! ## Padding Precondition
//!
//! Padding never shrinks content. [`imaging::pad_to_size`] reports an
//! [`imaging::ImagingError::InvariantViolation`] when handed an image larger
//! than its canvas instead of clamping it, so a sequencing bug upstream
//! surfaces immediately.
//!
//! ## Super-Resolution as a Port
//!
//! The pipeline talks to the external upscaler through the
//! [`imaging::SuperResolver`] trait. Production code uses
//! [`imaging::RealEsrgan`]; tests inject a recording mock.

pub mod config;
pub mod imaging;
pub mod metadata;
pub mod output;
pub mod process;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
