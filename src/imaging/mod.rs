//! Image operations for both processing profiles.
//!
//! | Stage | Module | Crate / function |
//! |---|---|---|
//! | **Load / save** | [`codec`] | `image` decoders, `PngEncoder::set_icc_profile` |
//! | **Classify** | [`classify`] | `imageops::thumbnail` + `imageproc::edges::canny` |
//! | **Trim** | [`trim`] | alpha bbox + `imageops::crop_imm` |
//! | **Alpha repair** | [`alpha`] | `imageproc::morphology::grayscale_dilate`, `gaussian_blur_f32` |
//! | **Scale** | [`scale`] | `FilterType::Nearest` (pixel art), `FilterType::Lanczos3` |
//! | **Super-resolution** | [`realesrgan`] | `realesrgan-ncnn-vulkan` subprocess |
//! | **Fit** | [`fit`] | `imageops::replace` onto a transparent canvas |
//! | **Saliency** | [`saliency`] | spectral residual + `otsu_level` + `find_contours` |
//! | **Sharpen** | `enhance` | unsharp mask over `gaussian_blur_f32` planes |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing how strongly each stage acts
//! - **Backend**: [`ImagingError`] and the [`SuperResolver`] port
//! - **Stages**: one module per pipeline step, each a `RgbaImage → RgbaImage` transform

pub mod alpha;
pub mod backend;
pub mod calculations;
pub mod classify;
pub mod codec;
mod enhance;
pub mod fit;
mod inpaint;
mod params;
pub mod realesrgan;
pub mod saliency;
pub mod scale;
pub mod trim;

pub use alpha::{defringe, smooth_edges, unpremultiply};
pub use backend::{ImagingError, SuperResolver};
pub use calculations::{
    calculate_target_size, choose_integer_scale, choose_integer_scale_for_box, resolve_target,
    round_to_multiple, round_to_power_of_two,
};
pub use classify::{KindStats, classify_kind, measure};
pub use codec::{is_supported_input, load_asset, save_asset, supported_input_extensions};
pub use enhance::unsharp_mask;
pub use fit::{FitOptions, fit_to_size, pad_to_size, pad_to_square, smart_square};
pub use inpaint::inpaint;
pub use params::{ClassifierParams, InpaintMethod, Sharpening, TrimParams};
pub use realesrgan::{RealEsrgan, RealEsrganSettings};
pub use saliency::{SaliencyBox, SaliencySource, bbox_from_saliency};
pub use scale::{fit_long_to, resize_nearest, resize_to_box, scale_pixel_art};
pub use trim::{TrimDecision, bbox_from_alpha, crop_to_bbox, is_meaningful, trim_if_meaningful};
