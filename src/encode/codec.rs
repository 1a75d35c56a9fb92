use image::ImageEncoder as _;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};

use crate::foundation::config::validate_quality;
use crate::foundation::core::OutputFormat;
use crate::foundation::error::{RespimgError, RespimgResult};
use crate::transform::resize::RasterBuffer;

/// Serializes a [`RasterBuffer`] into one output format.
///
/// Contract: for a given buffer and quality, `encode` returns byte-identical output on every
/// call. Implementations never lower the requested quality to recover from a codec error; they
/// return [`RespimgError::EncodeFailure`] instead.
pub trait Encoder: Send + Sync {
    /// Format produced by this encoder.
    fn format(&self) -> OutputFormat;

    /// Encode `raster` at `quality` (0-100).
    fn encode(&self, raster: &RasterBuffer, quality: u8) -> RespimgResult<Vec<u8>>;
}

/// Lossy WebP via libwebp.
#[derive(Clone, Copy, Debug, Default)]
pub struct LossyWebpEncoder;

/// Baseline JPEG. Alpha is dropped.
#[derive(Clone, Copy, Debug, Default)]
pub struct LegacyJpegEncoder;

/// Lossless PNG. `quality` selects compression effort, not fidelity.
#[derive(Clone, Copy, Debug, Default)]
pub struct LosslessPngEncoder;

impl Encoder for LossyWebpEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::WebP
    }

    fn encode(&self, raster: &RasterBuffer, quality: u8) -> RespimgResult<Vec<u8>> {
        validate_quality("webp quality", quality)?;
        let enc = webp::Encoder::from_rgba(raster.rgba8(), raster.width(), raster.height());
        let mem = enc
            .encode_simple(false, f32::from(quality))
            .map_err(|e| RespimgError::encode_failure(format!("webp: {e:?}")))?;
        Ok(mem.to_vec())
    }
}

impl Encoder for LegacyJpegEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Jpeg
    }

    fn encode(&self, raster: &RasterBuffer, quality: u8) -> RespimgResult<Vec<u8>> {
        validate_quality("jpeg quality", quality)?;
        if quality == 0 {
            return Err(RespimgError::validation("jpeg quality must be in 1..=100"));
        }
        let rgb = image::DynamicImage::ImageRgba8(raster.as_image().clone()).into_rgb8();

        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, quality)
            .write_image(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| RespimgError::encode_failure(format!("jpeg: {e}")))?;
        Ok(buf)
    }
}

impl Encoder for LosslessPngEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Png
    }

    fn encode(&self, raster: &RasterBuffer, quality: u8) -> RespimgResult<Vec<u8>> {
        validate_quality("png level", quality)?;
        let compression = match quality {
            0..=33 => CompressionType::Fast,
            34..=66 => CompressionType::Default,
            _ => CompressionType::Best,
        };

        let mut buf = Vec::new();
        PngEncoder::new_with_quality(&mut buf, compression, PngFilter::Adaptive)
            .write_image(
                raster.rgba8(),
                raster.width(),
                raster.height(),
                image::ExtendedColorType::Rgba8,
            )
            .map_err(|e| RespimgError::encode_failure(format!("png: {e}")))?;
        Ok(buf)
    }
}

/// The encoder registered for `format`.
pub fn encoder_for(format: OutputFormat) -> &'static dyn Encoder {
    match format {
        OutputFormat::WebP => &LossyWebpEncoder,
        OutputFormat::Jpeg => &LegacyJpegEncoder,
        OutputFormat::Png => &LosslessPngEncoder,
    }
}

/// Encode `raster` as `format` at `quality`.
#[tracing::instrument(skip(raster), fields(w = raster.width(), h = raster.height()))]
pub fn encode(raster: &RasterBuffer, format: OutputFormat, quality: u8) -> RespimgResult<Vec<u8>> {
    let bytes = encoder_for(format).encode(raster, quality)?;
    tracing::trace!(len = bytes.len(), "encoded");
    Ok(bytes)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/codec.rs"]
mod tests;
