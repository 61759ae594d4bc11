//! Imaging error type and the super-resolution port.
//!
//! The [`SuperResolver`] trait is the single seam between the pipeline and an
//! external upscaler. The production implementation is
//! [`RealEsrgan`](super::realesrgan::RealEsrgan), which shells out to the
//! `realesrgan-ncnn-vulkan` binary; tests inject the recording mock in
//! [`tests`] so the orchestrator runs without spawning anything.

use image::RgbaImage;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("Failed to encode image: {0}")]
    Encode(#[source] image::ImageError),
    /// A pipeline-internal precondition was false. Indicates a sequencing
    /// defect in the scale/fit steps, never bad input.
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
    #[error("External tool failed: {0}")]
    ExternalTool(String),
    #[error("{tool} timed out after {}s", .limit.as_secs())]
    Timeout { tool: String, limit: Duration },
}

/// Port for an optional super-resolution step.
///
/// Implementations must be re-entrant: batch processing calls `enhance` from
/// several rayon workers at once.
pub trait SuperResolver: Sync {
    /// Upscale `image`; the result is expected to be roughly `factor` times
    /// larger on each axis.
    fn enhance(&self, image: &RgbaImage, factor: u32) -> Result<RgbaImage, ImagingError>;
}
