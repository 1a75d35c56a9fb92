use std::fmt;

use crate::foundation::error::{RespimgError, RespimgResult};

/// Output codec family for a generated variant.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossy WebP, the modern default.
    #[serde(alias = "lossy")]
    WebP,
    /// Baseline JPEG for legacy browsers.
    #[serde(alias = "jpg", alias = "legacy-lossy")]
    Jpeg,
    /// Lossless PNG.
    #[serde(alias = "lossless")]
    Png,
}

impl OutputFormat {
    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::WebP => "webp",
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }

    /// MIME type, as used in `<source type=...>` and data URIs.
    pub fn mime(self) -> &'static str {
        match self {
            Self::WebP => "image/webp",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    /// `true` when quality only selects compression effort, not fidelity.
    pub fn is_lossless(self) -> bool {
        matches!(self, Self::Png)
    }

    pub(crate) fn tag(self) -> u8 {
        match self {
            Self::WebP => 0,
            Self::Jpeg => 1,
            Self::Png => 2,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::WebP => "webp",
            Self::Jpeg => "jpeg",
            Self::Png => "png",
        })
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = RespimgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "webp" | "lossy" => Ok(Self::WebP),
            "jpeg" | "jpg" | "legacy-lossy" => Ok(Self::Jpeg),
            "png" | "lossless" => Ok(Self::Png),
            other => Err(RespimgError::validation(format!(
                "unknown output format '{other}' (expected webp, jpeg or png)"
            ))),
        }
    }
}

/// What to do with requested widths wider than the source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpscalePolicy {
    /// Fail with [`RespimgError::InvalidTargetWidth`].
    #[default]
    Reject,
    /// Replace the width with the source width and drop duplicates.
    Clamp,
}

/// Ordered, deduplicated set of positive target widths.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SizeSpec {
    widths: Vec<u32>,
}

impl SizeSpec {
    /// Validate and normalize a width list (sorted ascending, duplicates removed).
    pub fn new(widths: impl IntoIterator<Item = u32>) -> RespimgResult<Self> {
        let mut widths = widths.into_iter().collect::<Vec<_>>();
        if widths.is_empty() {
            return Err(RespimgError::validation("size list must be non-empty"));
        }
        if widths.contains(&0) {
            return Err(RespimgError::validation("size list widths must be > 0"));
        }
        widths.sort_unstable();
        widths.dedup();
        Ok(Self { widths })
    }

    /// Widths in strictly ascending order.
    pub fn widths(&self) -> &[u32] {
        &self.widths
    }

    /// Apply `policy` against a source of `source_width` pixels.
    pub fn resolve(&self, source_width: u32, policy: UpscalePolicy) -> RespimgResult<Self> {
        match policy {
            UpscalePolicy::Reject => {
                if let Some(&width) = self.widths.iter().find(|&&w| w > source_width) {
                    return Err(RespimgError::InvalidTargetWidth {
                        width,
                        source_width,
                    });
                }
                Ok(self.clone())
            }
            UpscalePolicy::Clamp => {
                Self::new(self.widths.iter().map(|&w| w.min(source_width)))
            }
        }
    }
}

/// Width:height ratio reduced to lowest terms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AspectRatio {
    /// Numerator (width part).
    pub num: u32,
    /// Denominator (height part).
    pub den: u32,
}

impl AspectRatio {
    /// Reduce `width:height`; both must be non-zero.
    pub fn from_dimensions(width: u32, height: u32) -> RespimgResult<Self> {
        if width == 0 || height == 0 {
            return Err(RespimgError::validation(
                "aspect ratio requires non-zero dimensions",
            ));
        }
        let g = gcd(width, height);
        Ok(Self {
            num: width / g,
            den: height / g,
        })
    }

    /// Ratio as a float, for display only.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
