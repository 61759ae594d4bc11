//! Pipeline configuration.
//!
//! Handles loading, validating, and merging the TOML configuration. Values are
//! layered: stock defaults, then the config file, then command-line flags.
//! Each layer only needs the keys it wants to change.
//!
//! ## Config File Location
//!
//! Pass `--config <path>` to use a specific file. Without the flag,
//! `asset-normalizer.toml` in the working directory is used when present.
//!
//! ## Configuration Options
//!
//! ```toml
//! # Defaults shown; every key may be omitted
//!
//! [output]
//! size_mode = "square"      # square | custom | power_of_two | multiple | auto
//! target = 512              # Side of the square canvas (square mode)
//! # width = 640             # Canvas width (custom mode)
//! # height = 360            # Canvas height (custom mode)
//! multiple = 8              # Rounding step for multiple mode: 2, 4, 8 or 16
//! kind = "auto"             # auto | pixel_art | illustration
//! superres = "none"         # none | realesrgan
//! inpaint = "none"          # none | telea | ns
//! allow_crop = false        # Fill and crop instead of padding
//! use_saliency = false      # Centre crops on the salient region
//!
//! [classifier]
//! sample_size = 128
//! max_colors = 80
//! min_edge_ratio = 0.12
//! canny_low = 80.0
//! canny_high = 140.0
//!
//! [trim]
//! alpha_threshold = 5
//! min_trim_ratio = 0.05
//! min_side_ratio = 0.95
//! margin = 2
//!
//! [pixel_art]
//! defringe_radius = 1
//! sharpen_radius = 1.0
//! sharpen_amount = 0.2
//!
//! [illustration]
//! alpha_smooth_radius = 0.5
//! sharpen_radius = 1.0
//! sharpen_amount = 0.1
//!
//! [superres]
//! binary = "realesrgan-ncnn-vulkan"
//! model = "realesrgan-x4plus"
//! scale = 4
//! timeout_secs = 300
//!
//! [processing]
//! max_processes = 4         # worker cap, unset means all cores
//! log_jsonl = "out/log.jsonl"
//! ```
//!
//! Every section denies unknown keys, so a typo is an error rather than a silent default.

use crate::imaging::{
    ClassifierParams, FitOptions, InpaintMethod, RealEsrganSettings, Sharpening, TrimParams,
};
use crate::types::{Kind, RequestedKind, SizeMode, SuperRes, ValidationError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "asset-normalizer.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Full pipeline configuration.
///
/// All fields have defaults matching the stock profiles. Unknown keys are
/// rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Output canvas, kind override and optional stages.
    pub output: OutputConfig,
    /// Kind detection thresholds.
    pub classifier: ClassifierConfig,
    /// Alpha trimming heuristic.
    pub trim: TrimConfig,
    /// Pixel-art profile.
    pub pixel_art: PixelArtConfig,
    /// Illustration profile.
    pub illustration: IllustrationConfig,
    /// External super-resolution tool.
    pub superres: SuperResConfig,
    /// Parallelism and metadata log.
    pub processing: ProcessingConfig,
}

impl PipelineConfig {
    /// Check ranges that serde alone cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.output
            .size_mode()
            .map_err(|e| ConfigError::Validation(format!("output: {e}")))?;

        let c = &self.classifier;
        if c.sample_size == 0 {
            return Err(ConfigError::Validation(
                "classifier.sample_size must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&c.min_edge_ratio) {
            return Err(ConfigError::Validation(
                "classifier.min_edge_ratio must be within 0.0-1.0".into(),
            ));
        }
        if c.canny_low < 0.0 || c.canny_low > c.canny_high {
            return Err(ConfigError::Validation(
                "classifier.canny_low must be non-negative and not above canny_high".into(),
            ));
        }

        let t = &self.trim;
        if !(0.0..=1.0).contains(&t.min_trim_ratio) || !(0.0..=1.0).contains(&t.min_side_ratio) {
            return Err(ConfigError::Validation(
                "trim ratios must be within 0.0-1.0".into(),
            ));
        }

        for (name, radius, amount) in [
            (
                "pixel_art",
                self.pixel_art.sharpen_radius,
                self.pixel_art.sharpen_amount,
            ),
            (
                "illustration",
                self.illustration.sharpen_radius,
                self.illustration.sharpen_amount,
            ),
        ] {
            if radius < 0.0 || amount < 0.0 {
                return Err(ConfigError::Validation(format!(
                    "{name} sharpen_radius and sharpen_amount must be non-negative"
                )));
            }
        }
        if self.illustration.alpha_smooth_radius < 0.0 {
            return Err(ConfigError::Validation(
                "illustration.alpha_smooth_radius must be non-negative".into(),
            ));
        }

        if !(2..=4).contains(&self.superres.scale) {
            return Err(ConfigError::Validation(
                "superres.scale must be 2, 3, or 4".into(),
            ));
        }
        if self.superres.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "superres.timeout_secs must be at least 1".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Sharpening parameters for a resolved kind.
    pub fn sharpening(&self, kind: Kind) -> Sharpening {
        match kind {
            Kind::PixelArt => Sharpening {
                radius: self.pixel_art.sharpen_radius,
                amount: self.pixel_art.sharpen_amount,
                ..Sharpening::pixel_art()
            },
            Kind::Illustration => Sharpening {
                radius: self.illustration.sharpen_radius,
                amount: self.illustration.sharpen_amount,
                ..Sharpening::illustration()
            },
        }
    }
}

/// Output canvas settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// `square`, `custom`, `power_of_two`, `multiple` or `auto`.
    pub size_mode: String,
    /// Square side for `square` mode.
    pub target: u32,
    /// Canvas width for `custom` mode.
    pub width: Option<u32>,
    /// Canvas height for `custom` mode.
    pub height: Option<u32>,
    /// Rounding step for `multiple` mode.
    pub multiple: u32,
    pub kind: RequestedKind,
    pub superres: SuperRes,
    pub inpaint: InpaintMethod,
    pub allow_crop: bool,
    pub use_saliency: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            size_mode: "square".to_string(),
            target: 512,
            width: None,
            height: None,
            multiple: 8,
            kind: RequestedKind::Auto,
            superres: SuperRes::None,
            inpaint: InpaintMethod::None,
            allow_crop: false,
            use_saliency: false,
        }
    }
}

impl OutputConfig {
    /// Parse the configured mode and its parameters.
    pub fn size_mode(&self) -> Result<SizeMode, ValidationError> {
        let custom = match (self.width, self.height) {
            (Some(w), Some(h)) => Some((w, h)),
            _ => None,
        };
        SizeMode::from_parts(&self.size_mode, self.target, custom, self.multiple)
    }

    pub fn fit_options(&self) -> FitOptions {
        FitOptions {
            allow_crop: self.allow_crop,
            use_saliency: self.use_saliency,
            inpaint: self.inpaint,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassifierConfig {
    pub sample_size: u32,
    pub max_colors: usize,
    pub min_edge_ratio: f32,
    pub canny_low: f32,
    pub canny_high: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        let p = ClassifierParams::default();
        Self {
            sample_size: p.sample_size,
            max_colors: p.max_colors,
            min_edge_ratio: p.min_edge_ratio,
            canny_low: p.canny_low,
            canny_high: p.canny_high,
        }
    }
}

impl ClassifierConfig {
    pub fn params(&self) -> ClassifierParams {
        ClassifierParams {
            sample_size: self.sample_size,
            max_colors: self.max_colors,
            min_edge_ratio: self.min_edge_ratio,
            canny_low: self.canny_low,
            canny_high: self.canny_high,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrimConfig {
    pub alpha_threshold: u8,
    pub min_trim_ratio: f64,
    pub min_side_ratio: f64,
    pub margin: u32,
}

impl Default for TrimConfig {
    fn default() -> Self {
        let p = TrimParams::default();
        Self {
            alpha_threshold: p.alpha_threshold,
            min_trim_ratio: p.min_trim_ratio,
            min_side_ratio: p.min_side_ratio,
            margin: p.margin,
        }
    }
}

impl TrimConfig {
    pub fn params(&self) -> TrimParams {
        TrimParams {
            alpha_threshold: self.alpha_threshold,
            min_trim_ratio: self.min_trim_ratio,
            min_side_ratio: self.min_side_ratio,
            margin: self.margin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PixelArtConfig {
    /// Alpha dilation radius; 0 disables defringing.
    pub defringe_radius: u32,
    pub sharpen_radius: f32,
    pub sharpen_amount: f32,
}

impl Default for PixelArtConfig {
    fn default() -> Self {
        let s = Sharpening::pixel_art();
        Self {
            defringe_radius: 1,
            sharpen_radius: s.radius,
            sharpen_amount: s.amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IllustrationConfig {
    /// Gaussian sigma applied to alpha after fitting; 0 disables smoothing.
    pub alpha_smooth_radius: f32,
    pub sharpen_radius: f32,
    pub sharpen_amount: f32,
}

impl Default for IllustrationConfig {
    fn default() -> Self {
        let s = Sharpening::illustration();
        Self {
            alpha_smooth_radius: 0.5,
            sharpen_radius: s.radius,
            sharpen_amount: s.amount,
        }
    }
}

/// Real-ESRGAN invocation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SuperResConfig {
    /// Executable name on `PATH`, or a path to it.
    pub binary: String,
    pub model: String,
    pub scale: u32,
    pub timeout_secs: u64,
}

impl Default for SuperResConfig {
    fn default() -> Self {
        let s = RealEsrganSettings::default();
        Self {
            binary: s.binary,
            model: s.model,
            scale: s.scale,
            timeout_secs: s.timeout.as_secs(),
        }
    }
}

impl SuperResConfig {
    pub fn settings(&self) -> RealEsrganSettings {
        RealEsrganSettings {
            binary: self.binary.clone(),
            model: self.model.clone(),
            scale: self.scale,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// Batch execution settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Cap on parallel workers.
    /// When absent, defaults to the number of CPU cores.
    /// Requests above the core count get the core count.
    pub max_processes: Option<usize>,
    /// Append one JSON line per processed image to this file.
    pub log_jsonl: Option<PathBuf>,
}

/// Worker count for the rayon pool.
///
/// - `None` → every available core
/// - `Some(n)` → `min(n, cores)`
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Built-in defaults as a TOML table, the bottom layer for merging.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(PipelineConfig::default())?)
}

/// Layer `overlay` over `base`, descending into tables.
///
/// - Two tables merge key by key, overlay winning.
/// - Any non-table overlay value replaces the base value.
/// - Keys only present in `base` survive.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist, `Err` if it exists but
/// is not valid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge overlays onto a base value in order, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlays: impl IntoIterator<Item = toml::Value>,
) -> Result<PipelineConfig, ConfigError> {
    let merged = overlays.into_iter().fold(base, merge_toml);
    let config: PipelineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the pipeline config.
///
/// An explicit `path` must exist. Without one, [`DEFAULT_CONFIG_FILE`] in
/// the working directory is used if present. `overrides` (typically built
/// from command-line flags) is merged last.
pub fn load_config(
    path: Option<&Path>,
    overrides: Option<toml::Value>,
) -> Result<PipelineConfig, ConfigError> {
    let file_layer = match path {
        Some(path) => Some(load_raw_config(path)?.ok_or_else(|| {
            ConfigError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("config file not found: {}", path.display()),
            ))
        })?),
        None => load_raw_config(Path::new(DEFAULT_CONFIG_FILE))?,
    };
    if let Some(path) = path {
        log::debug!("loaded config from {}", path.display());
    }
    let base = stock_defaults_value()?;
    resolve_config(base, file_layer.into_iter().chain(overrides))
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Printed by `gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# asset-normalizer configuration
# ==============================
# Every key is optional; delete what you do not want to change.
# Each value shown is the built-in default.
#
# Pass the file with --config, or name it asset-normalizer.toml and run
# from the same directory. Command-line flags override these values.
# Misspelled or unknown keys are rejected.

# ---------------------------------------------------------------------------
# Output canvas
# ---------------------------------------------------------------------------
[output]
# How the canvas size is chosen:
#   square        fixed target x target canvas
#   custom        fixed width x height canvas
#   power_of_two  long side to the nearest power of two, short side from the
#                 aspect ratio, rounded the same way (at least 8)
#   multiple      both sides to the nearest multiple of `multiple`
#   auto          power-of-two long side, both sides snapped to multiples of 8
size_mode = "square"

# Side of the canvas in square mode (1-4096).
target = 512

# Canvas size in custom mode (1-4096 each).
# width = 640
# height = 360

# Rounding step in multiple mode: 2, 4, 8 or 16.
multiple = 8

# Processing profile: auto (detect), pixel_art or illustration.
kind = "auto"

# Super-resolution for illustrations: none or realesrgan.
superres = "none"

# Fill the padded border from nearby content: none, telea or ns.
# Any fill makes the output fully opaque.
inpaint = "none"

# Fill the canvas and crop instead of padding, when the image covers it.
allow_crop = false

# Centre crops on the most salient region instead of the image centre.
use_saliency = false

# ---------------------------------------------------------------------------
# Kind detection
# ---------------------------------------------------------------------------
[classifier]
# Longest side of the downscaled sample the statistics are taken on.
sample_size = 128

# Pixel art has fewer unique colours than this...
max_colors = 80

# ...and a higher share of Canny edge pixels than this.
min_edge_ratio = 0.12

# Canny hysteresis thresholds.
canny_low = 80.0
canny_high = 140.0

# ---------------------------------------------------------------------------
# Transparent padding trim
# ---------------------------------------------------------------------------
[trim]
# Pixels with alpha above this count as content.
alpha_threshold = 5

# Trim only when it removes at least this share of the area...
min_trim_ratio = 0.05

# ...or shrinks either side below this ratio.
min_side_ratio = 0.95

# Pixels kept around the content box.
margin = 2

# ---------------------------------------------------------------------------
# Pixel-art profile
# ---------------------------------------------------------------------------
[pixel_art]
# Alpha dilation radius before scaling (0 = off).
defringe_radius = 1

# Unsharp mask on all channels.
sharpen_radius = 1.0
sharpen_amount = 0.2

# ---------------------------------------------------------------------------
# Illustration profile
# ---------------------------------------------------------------------------
[illustration]
# Gaussian blur of the alpha channel after fitting (0 = off).
alpha_smooth_radius = 0.5

# Unsharp mask on colour channels only.
sharpen_radius = 1.0
sharpen_amount = 0.1

# ---------------------------------------------------------------------------
# Super-resolution (Real-ESRGAN)
# ---------------------------------------------------------------------------
[superres]
# Executable name looked up on PATH, or a path to it.
binary = "realesrgan-ncnn-vulkan"

# Model name passed with -n.
model = "realesrgan-x4plus"

# Upscale factor passed with -s (2-4).
scale = 4

# Kill the tool and fail the image after this many seconds.
timeout_secs = 300

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Upper bound on images normalized at once.
# Leave unset to use every CPU core.
# max_processes = 4

# Append one JSON line per processed image (success or failure).
# log_jsonl = "normalized/log.jsonl"
"##
}
