use base64::Engine as _;

use crate::assets::decode::SourceImage;
use crate::compile::fingerprint::OutputNamer;
use crate::compile::manifest::Variant;
use crate::encode::codec::{Encoder, encoder_for};
use crate::foundation::config::{PipelineConfig, PlaceholderConfig};
use crate::foundation::error::{RespimgError, RespimgResult};
use crate::transform::resize::resize;

/// Width actually used for a placeholder: `configured`, or the source width if narrower.
pub fn placeholder_width(source_width: u32, configured: u32) -> u32 {
    configured.min(source_width)
}

/// Generate the blur-up placeholder for `src`, named after `name`.
///
/// Uses the first configured format and `cfg.placeholder` for width and quality. Lossless formats
/// always get maximum compression effort. Never upscales: sources narrower than the configured
/// width use their own width.
pub fn placeholder(src: &SourceImage, name: &str, cfg: &PipelineConfig) -> RespimgResult<Variant> {
    let format = cfg
        .formats
        .first()
        .copied()
        .ok_or_else(|| RespimgError::validation("formats must be non-empty"))?;
    let namer = OutputNamer::new(name, src.bytes(), cfg.naming)?;
    generate(src, &namer, &cfg.placeholder, encoder_for(format))
}

#[tracing::instrument(skip_all, fields(width = cfg.width, format = %encoder.format()))]
pub(crate) fn generate(
    src: &SourceImage,
    namer: &OutputNamer<'_>,
    cfg: &PlaceholderConfig,
    encoder: &dyn Encoder,
) -> RespimgResult<Variant> {
    let width = placeholder_width(src.width(), cfg.width);
    let raster = resize(src, width)?;
    // Lossless quality is compression effort; never spend less than the variants do.
    let quality = if encoder.format().is_lossless() {
        100
    } else {
        cfg.quality
    };
    let encoded = encoder.encode(&raster, quality)?;
    Ok(namer.finish(
        raster.width(),
        raster.height(),
        encoder.format(),
        true,
        encoded,
    ))
}

/// `data:<mime>;base64,...` URI for inlining a (placeholder) variant.
pub fn data_uri(variant: &Variant) -> String {
    format!(
        "data:{};base64,{}",
        variant.format.mime(),
        base64::engine::general_purpose::STANDARD.encode(&variant.encoded)
    )
}

#[cfg(test)]
#[path = "../../tests/unit/compile/placeholder.rs"]
mod tests;
