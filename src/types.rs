//! Shared domain types used across every pipeline stage.
//!
//! The string forms accepted by the `FromStr` impls (`"pixel_art"`,
//! `"power_of_two"`, ...) are the same spellings used in `config.toml`, on the
//! command line, and in the JSONL metadata log.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Largest accepted output dimension on either axis.
pub const MAX_DIMENSION: u32 = 4096;

/// Malformed or out-of-range caller input.
///
/// Raised before any pixel work starts; never produced mid-pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

// ============================================================================
// Kind
// ============================================================================

/// Resolved processing profile. Every branch point in the pipeline matches on
/// this exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    PixelArt,
    Illustration,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::PixelArt => "pixel_art",
            Kind::Illustration => "illustration",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind as requested by the caller. `Auto` is resolved exactly once, by the
/// classifier, before any other processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestedKind {
    #[default]
    Auto,
    PixelArt,
    Illustration,
}

impl RequestedKind {
    /// Resolve to a concrete [`Kind`], running `classify` only for `Auto`.
    pub fn resolve(self, classify: impl FnOnce() -> Kind) -> Kind {
        match self {
            RequestedKind::Auto => classify(),
            RequestedKind::PixelArt => Kind::PixelArt,
            RequestedKind::Illustration => Kind::Illustration,
        }
    }
}

impl FromStr for RequestedKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(RequestedKind::Auto),
            "pixel_art" => Ok(RequestedKind::PixelArt),
            "illustration" => Ok(RequestedKind::Illustration),
            other => Err(ValidationError::new(format!(
                "kind must be 'auto', 'pixel_art', or 'illustration' (got '{other}')"
            ))),
        }
    }
}

/// Optional super-resolution step for illustrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuperRes {
    #[default]
    None,
    #[serde(rename = "realesrgan", alias = "real_esrgan")]
    RealEsrgan,
}

impl FromStr for SuperRes {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(SuperRes::None),
            "realesrgan" | "real_esrgan" => Ok(SuperRes::RealEsrgan),
            other => Err(ValidationError::new(format!(
                "superres must be 'none' or 'realesrgan' (got '{other}')"
            ))),
        }
    }
}

// ============================================================================
// Geometry
// ============================================================================

/// Inclusive pixel rectangle: `x0 <= x1 < width`, `y0 <= y1 < height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl BoundingBox {
    pub fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        debug_assert!(x0 <= x1 && y0 <= y1);
        Self { x0, y0, x1, y1 }
    }

    /// The box covering every pixel of a `width`×`height` image.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width.saturating_sub(1), height.saturating_sub(1))
    }

    pub fn width(&self) -> u32 {
        self.x1 - self.x0 + 1
    }

    pub fn height(&self) -> u32 {
        self.y1 - self.y0 + 1
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }
}

/// Output dimensions, both within `[1, MAX_DIMENSION]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
}

impl TargetSize {
    /// Validated constructor for caller-supplied dimensions.
    pub fn new(width: u32, height: u32) -> Result<Self, ValidationError> {
        if !(1..=MAX_DIMENSION).contains(&width) || !(1..=MAX_DIMENSION).contains(&height) {
            return Err(ValidationError::new(format!(
                "target size must be between 1 and {MAX_DIMENSION} (got {width}x{height})"
            )));
        }
        Ok(Self { width, height })
    }

    /// Constructor for computed dimensions: clamps into range instead of failing.
    pub fn clamped(width: u32, height: u32) -> Self {
        Self {
            width: width.clamp(1, MAX_DIMENSION),
            height: height.clamp(1, MAX_DIMENSION),
        }
    }
}

impl fmt::Display for TargetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Resolved output box. Square targets go through `smart_square`, boxes
/// through `fit_to_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Square(u32),
    Box(TargetSize),
}

impl Target {
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Target::Square(side) => (side, side),
            Target::Box(size) => (size.width, size.height),
        }
    }
}

/// Rounding step for [`SizeMode::Multiple`]: one of 2, 4, 8, 16.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Multiple(u32);

impl Multiple {
    pub const ALLOWED: [u32; 4] = [2, 4, 8, 16];

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for Multiple {
    fn default() -> Self {
        Self(8)
    }
}

impl TryFrom<u32> for Multiple {
    type Error = ValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if Self::ALLOWED.contains(&value) {
            Ok(Self(value))
        } else {
            Err(ValidationError::new(format!(
                "multiple must be one of 2, 4, 8, 16 (got {value})"
            )))
        }
    }
}

impl From<Multiple> for u32 {
    fn from(m: Multiple) -> u32 {
        m.0
    }
}

/// How the output box is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeMode {
    /// Fixed square side supplied by the caller.
    Square(u32),
    /// Fixed width/height supplied by the caller.
    Custom(TargetSize),
    /// Long side to the nearest power of two, short side likewise (floored at 8).
    PowerOfTwo,
    /// Both sides to the nearest multiple (floored at the multiple).
    Multiple(Multiple),
    /// Power-of-two long side, then both sides snapped to multiples of 8.
    Auto,
}

impl SizeMode {
    /// Build a mode from its name plus the parameters the name may need.
    pub fn from_parts(
        name: &str,
        side: u32,
        custom: Option<(u32, u32)>,
        multiple: u32,
    ) -> Result<Self, ValidationError> {
        match name {
            "square" => {
                TargetSize::new(side, side)?;
                Ok(SizeMode::Square(side))
            }
            "custom" => {
                let (w, h) = custom.ok_or_else(|| {
                    ValidationError::new("width and height are required for custom mode")
                })?;
                Ok(SizeMode::Custom(TargetSize::new(w, h)?))
            }
            "power_of_two" => Ok(SizeMode::PowerOfTwo),
            "multiple" => Ok(SizeMode::Multiple(Multiple::try_from(multiple)?)),
            "auto" => Ok(SizeMode::Auto),
            other => Err(ValidationError::new(format!(
                "size mode must be 'square', 'auto', 'power_of_two', 'multiple', \
                 or 'custom' (got '{other}')"
            ))),
        }
    }
}

// ============================================================================
// Asset
// ============================================================================

/// An RGBA pixel buffer plus the colour profile it was loaded with.
///
/// Stages after trimming transform the pixels through [`Asset::map`] /
/// [`Asset::try_map`], which carry the profile bytes over untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub pixels: RgbaImage,
    pub icc_profile: Option<Vec<u8>>,
}

impl Asset {
    pub fn new(pixels: RgbaImage) -> Self {
        Self {
            pixels,
            icc_profile: None,
        }
    }

    pub fn with_icc_profile(mut self, icc_profile: Option<Vec<u8>>) -> Self {
        self.icc_profile = icc_profile;
        self
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn map(self, stage: impl FnOnce(RgbaImage) -> RgbaImage) -> Self {
        Self {
            pixels: stage(self.pixels),
            icc_profile: self.icc_profile,
        }
    }

    pub fn try_map<E>(
        self,
        stage: impl FnOnce(RgbaImage) -> Result<RgbaImage, E>,
    ) -> Result<Self, E> {
        Ok(Self {
            pixels: stage(self.pixels)?,
            icc_profile: self.icc_profile,
        })
    }
}
