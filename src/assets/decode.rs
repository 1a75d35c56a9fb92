use std::io::Cursor;
use std::path::Path;

use anyhow::Context;
use image::ImageDecoder as _;

use crate::foundation::error::{RespimgError, RespimgResult};

/// Largest accepted width or height, in pixels.
pub const MAX_DIMENSION: u32 = 32_768;
/// Largest accepted pixel count (100 MP).
pub const MAX_PIXELS: u64 = 100_000_000;

/// Container formats accepted as pipeline input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// JPEG / JFIF.
    Jpeg,
    /// PNG.
    Png,
    /// WebP (lossy or lossless).
    WebP,
    /// GIF; only the first frame is used.
    Gif,
}

impl SourceFormat {
    fn from_image_format(f: image::ImageFormat) -> Option<Self> {
        match f {
            image::ImageFormat::Jpeg => Some(Self::Jpeg),
            image::ImageFormat::Png => Some(Self::Png),
            image::ImageFormat::WebP => Some(Self::WebP),
            image::ImageFormat::Gif => Some(Self::Gif),
            _ => None,
        }
    }

    fn as_image_format(self) -> image::ImageFormat {
        match self {
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Png => image::ImageFormat::Png,
            Self::WebP => image::ImageFormat::WebP,
            Self::Gif => image::ImageFormat::Gif,
        }
    }
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Gif => "gif",
        })
    }
}

/// A fully decoded source image.
///
/// Holds both the original encoded bytes (used for content hashing) and the decoded RGBA8 raster
/// in display orientation. There is no way to obtain a partially decoded value.
#[derive(Clone, Debug)]
pub struct SourceImage {
    bytes: Vec<u8>,
    format: SourceFormat,
    raster: image::RgbaImage,
}

impl SourceImage {
    /// Original encoded bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Detected input container.
    pub fn format(&self) -> SourceFormat {
        self.format
    }

    /// Display width in pixels.
    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    /// Display height in pixels.
    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    pub(crate) fn raster(&self) -> &image::RgbaImage {
        &self.raster
    }
}

/// Sniff, decode and orient encoded image bytes.
///
/// Errors:
/// - [`RespimgError::UnsupportedFormat`] when the signature is unknown or not JPEG/PNG/WebP/GIF.
/// - [`RespimgError::CorruptInput`] when the signature matches but decoding fails, or the image
///   exceeds [`MAX_DIMENSION`] / [`MAX_PIXELS`].
#[tracing::instrument(skip(bytes), fields(len = bytes.len()))]
pub fn decode_image(bytes: &[u8]) -> RespimgResult<SourceImage> {
    let format = sniff_format(bytes)?;

    let mut reader = image::ImageReader::with_format(Cursor::new(bytes), format.as_image_format());
    let mut limits = image::Limits::default();
    limits.max_image_width = Some(MAX_DIMENSION);
    limits.max_image_height = Some(MAX_DIMENSION);
    reader.limits(limits);

    let mut decoder = reader
        .into_decoder()
        .map_err(|e| classify_decode_error(format, e))?;
    let (w, h) = decoder.dimensions();
    if u64::from(w) * u64::from(h) > MAX_PIXELS {
        return Err(RespimgError::corrupt_input(format!(
            "{format}: {w}x{h} exceeds the {MAX_PIXELS} pixel limit"
        )));
    }
    let orientation = decoder
        .orientation()
        .map_err(|e| classify_decode_error(format, e))?;

    let mut img =
        image::DynamicImage::from_decoder(decoder).map_err(|e| classify_decode_error(format, e))?;
    img.apply_orientation(orientation);
    let raster = img.into_rgba8();
    if raster.width() == 0 || raster.height() == 0 {
        return Err(RespimgError::corrupt_input(format!(
            "{format}: image has zero width or height"
        )));
    }

    tracing::debug!(
        %format,
        width = raster.width(),
        height = raster.height(),
        "decoded source image"
    );
    Ok(SourceImage {
        bytes: bytes.to_vec(),
        format,
        raster,
    })
}

/// Read and decode an image file.
pub fn decode_image_file(path: impl AsRef<Path>) -> RespimgResult<SourceImage> {
    let path = path.as_ref();
    let bytes =
        std::fs::read(path).with_context(|| format!("read source image '{}'", path.display()))?;
    decode_image(&bytes)
}

fn sniff_format(bytes: &[u8]) -> RespimgResult<SourceFormat> {
    let guessed = image::guess_format(bytes).map_err(|_| {
        RespimgError::unsupported_format("byte signature does not match a known image container")
    })?;
    SourceFormat::from_image_format(guessed).ok_or_else(|| {
        RespimgError::unsupported_format(format!(
            "{guessed:?} input is not supported (expected jpeg, png, webp or gif)"
        ))
    })
}

fn classify_decode_error(format: SourceFormat, err: image::ImageError) -> RespimgError {
    match err {
        image::ImageError::Unsupported(e) => {
            RespimgError::unsupported_format(format!("{format}: {e}"))
        }
        image::ImageError::Limits(e) => {
            RespimgError::corrupt_input(format!("{format}: exceeds decode limits: {e}"))
        }
        other => RespimgError::corrupt_input(format!("{format}: {other}")),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
