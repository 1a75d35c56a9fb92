use image::imageops::FilterType;

use crate::assets::decode::SourceImage;
use crate::foundation::error::{RespimgError, RespimgResult};

/// Resampling kernel used for every resize. Fixed so output is reproducible bit-for-bit.
pub const RESAMPLE_FILTER: FilterType = FilterType::Lanczos3;

/// Straight-alpha RGBA8 pixels, row-major, tightly packed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterBuffer {
    image: image::RgbaImage,
}

impl RasterBuffer {
    /// Wrap raw RGBA8 pixels; `rgba8.len()` must equal `width * height * 4`.
    pub fn from_rgba8(width: u32, height: u32, rgba8: Vec<u8>) -> RespimgResult<Self> {
        if width == 0 || height == 0 {
            return Err(RespimgError::validation(
                "raster dimensions must be non-zero",
            ));
        }
        let image = image::RgbaImage::from_raw(width, height, rgba8).ok_or_else(|| {
            RespimgError::validation(format!(
                "raster buffer length does not match {width}x{height} RGBA8"
            ))
        })?;
        Ok(Self { image })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Raw RGBA8 bytes.
    pub fn rgba8(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub(crate) fn as_image(&self) -> &image::RgbaImage {
        &self.image
    }
}

/// Aspect-preserving height for `width`: `round(width * src_h / src_w)`, at least 1.
///
/// Rounds half up in integer arithmetic, so results never depend on float rounding.
pub fn target_height(src_w: u32, src_h: u32, width: u32) -> u32 {
    if src_w == 0 {
        return 0;
    }
    let num = u64::from(width) * u64::from(src_h);
    let den = u64::from(src_w);
    let h = (2 * num + den) / (2 * den);
    h.clamp(1, u64::from(u32::MAX)) as u32
}

/// Resample `src` to `width` pixels wide, preserving its aspect ratio.
///
/// Fails with [`RespimgError::InvalidTargetWidth`] when `width` is zero or wider than the source;
/// upscaling is never performed here.
#[tracing::instrument(skip(src), fields(src_w = src.width(), src_h = src.height()))]
pub fn resize(src: &SourceImage, width: u32) -> RespimgResult<RasterBuffer> {
    let (src_w, src_h) = (src.width(), src.height());
    if width == 0 || width > src_w {
        return Err(RespimgError::InvalidTargetWidth {
            width,
            source_width: src_w,
        });
    }

    if width == src_w {
        return Ok(RasterBuffer {
            image: src.raster().clone(),
        });
    }

    let height = target_height(src_w, src_h, width);
    let image = image::imageops::resize(src.raster(), width, height, RESAMPLE_FILTER);
    tracing::trace!(width, height, "resized");
    Ok(RasterBuffer { image })
}

#[cfg(test)]
#[path = "../../tests/unit/transform/resize.rs"]
mod tests;
