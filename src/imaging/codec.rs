//! Image codec: decode to RGBA with the embedded ICC profile, encode with the
//! profile re-attached.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (PNG, JPEG, GIF, BMP, TIFF, WebP) | `image::ImageReader::into_decoder` |
//! | Read ICC profile | `ImageDecoder::icc_profile` |
//! | Encode → PNG with ICC | `image::codecs::png::PngEncoder` + `ImageEncoder::set_icc_profile` |
//! | Encode → other formats | `DynamicImage::write_to` (profile dropped with a warning) |
//! | Atomic write | `tempfile::NamedTempFile::persist` in the destination directory |
//!
//! Indexed, greyscale and 16-bit sources are all normalised to 8-bit RGBA.

use super::backend::ImagingError;
use crate::types::Asset;
use image::codecs::png::PngEncoder;
use image::{
    DynamicImage, ExtendedColorType, ImageDecoder, ImageEncoder, ImageError, ImageFormat,
    ImageReader,
};
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use std::sync::LazyLock;
use tempfile::NamedTempFile;

const INPUT_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("png", ImageFormat::Png),
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("gif", ImageFormat::Gif),
    ("bmp", ImageFormat::Bmp),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    INPUT_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Whether `path` has an extension we can decode (case-insensitive).
pub fn is_supported_input(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(e))
        })
}

/// Load and decode an image, keeping its ICC profile bytes if present.
pub fn load_asset(path: &Path) -> Result<Asset, ImagingError> {
    let mut decoder = ImageReader::open(path)?
        .with_guessed_format()?
        .into_decoder()
        .map_err(ImagingError::Decode)?;
    let icc_profile = decoder.icc_profile().map_err(ImagingError::Decode)?;
    let pixels = DynamicImage::from_decoder(decoder)
        .map_err(ImagingError::Decode)?
        .to_rgba8();
    Ok(Asset {
        pixels,
        icc_profile,
    })
}

/// Encode `asset` as `format` into `writer`.
pub fn encode_asset<W: Write + Seek>(
    asset: &Asset,
    mut writer: W,
    format: ImageFormat,
) -> Result<(), ImagingError> {
    let (width, height) = asset.dimensions();
    if format == ImageFormat::Png {
        let mut encoder = PngEncoder::new(writer);
        if let Some(icc) = &asset.icc_profile {
            encoder
                .set_icc_profile(icc.clone())
                .map_err(|e| ImagingError::Encode(ImageError::Unsupported(e)))?;
        }
        return encoder
            .write_image(asset.pixels.as_raw(), width, height, ExtendedColorType::Rgba8)
            .map_err(ImagingError::Encode);
    }

    if asset.icc_profile.is_some() {
        log::warn!("{format:?} output cannot carry the ICC profile; it will be dropped");
    }
    DynamicImage::ImageRgba8(asset.pixels.clone())
        .write_to(&mut writer, format)
        .map_err(ImagingError::Encode)
}

/// Save `asset` to `path`, format inferred from the extension.
///
/// The image is encoded into a temporary file next to `path` and renamed into
/// place only once encoding succeeded, so a failure never leaves a partial
/// output behind.
pub fn save_asset(asset: &Asset, path: &Path) -> Result<(), ImagingError> {
    let format = ImageFormat::from_path(path).map_err(ImagingError::Encode)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        encode_asset(asset, &mut writer, format)?;
        writer.flush()?;
    }
    tmp.persist(path).map_err(|e| ImagingError::Io(e.error))?;
    Ok(())
}
