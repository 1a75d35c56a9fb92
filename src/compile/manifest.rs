use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::assets::decode::SourceFormat;
use crate::compile::fingerprint::OutputId;
use crate::foundation::core::{AspectRatio, OutputFormat};
use crate::foundation::error::{RespimgError, RespimgResult};

/// One generated rendition, including its encoded bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variant {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels (aspect-preserving).
    pub height: u32,
    /// Output format.
    pub format: OutputFormat,
    /// Content-derived identifier.
    pub id: OutputId,
    /// File name (no directory) the bytes are written to.
    pub file_name: String,
    /// `true` for the blur-up placeholder.
    pub placeholder: bool,
    /// Encoded file contents.
    pub encoded: Vec<u8>,
}

impl Variant {
    /// Manifest metadata for this variant, served from `url`.
    pub fn entry(&self, url: String) -> VariantEntry {
        VariantEntry {
            width: self.width,
            height: self.height,
            format: self.format,
            url,
            id: self.id.to_hex(),
            bytes: self.encoded.len() as u64,
            placeholder: self.placeholder,
            data_uri: None,
        }
    }
}

/// Serialized metadata for one variant.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VariantEntry {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Output format.
    pub format: OutputFormat,
    /// Public URL.
    pub url: String,
    /// Hex [`OutputId`].
    pub id: String,
    /// Encoded size in bytes.
    pub bytes: u64,
    /// `true` only for the placeholder entry.
    #[serde(default)]
    pub placeholder: bool,
    /// Inline `data:` URI; set for the placeholder only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_uri: Option<String>,
}

/// Dimensions and container of the image a manifest was built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SourceInfo {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Input container.
    pub format: SourceFormat,
}

/// All renditions of one source image, as consumed by the runtime.
///
/// Invariants (checked by [`Manifest::validate`]):
/// - `variants` are sorted by width, then by position of their format in `formats`;
/// - per format, widths are strictly ascending;
/// - no entry in `variants` is a placeholder; `placeholder`, when present, is one.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Manifest {
    /// Base name used for output files.
    pub name: String,
    /// Source dimensions.
    pub source: SourceInfo,
    /// Source width:height.
    pub aspect_ratio: AspectRatio,
    /// Formats in preference order.
    pub formats: Vec<OutputFormat>,
    /// Full-size variants.
    pub variants: Vec<VariantEntry>,
    /// Blur-up placeholder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<VariantEntry>,
}

impl Manifest {
    /// Parse a manifest from a JSON reader and check its invariants.
    pub fn from_reader<R: std::io::Read>(r: R) -> RespimgResult<Self> {
        let m: Self = serde_json::from_reader(r)
            .map_err(|e| RespimgError::serde(format!("parse manifest JSON: {e}")))?;
        m.validate()?;
        Ok(m)
    }

    /// Parse a manifest from a JSON string.
    pub fn from_json_str(s: &str) -> RespimgResult<Self> {
        Self::from_reader(s.as_bytes())
    }

    /// Parse a manifest from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> RespimgResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            RespimgError::validation(format!("open manifest '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Pretty-printed JSON with a trailing newline.
    pub fn to_json_pretty(&self) -> RespimgResult<String> {
        let mut s = serde_json::to_string_pretty(self)
            .map_err(|e| RespimgError::serde(format!("serialize manifest: {e}")))?;
        s.push('\n');
        Ok(s)
    }

    /// Variants of `format`, ascending by width.
    pub fn variants_for(&self, format: OutputFormat) -> impl Iterator<Item = &VariantEntry> {
        self.variants.iter().filter(move |v| v.format == format)
    }

    /// Widest variant of `format`.
    pub fn largest(&self, format: OutputFormat) -> Option<&VariantEntry> {
        self.variants_for(format).last()
    }

    /// `srcset` value for `format`: `"<url> <w>w"` entries joined by `", "`.
    pub fn srcset(&self, format: OutputFormat) -> String {
        self.variants_for(format)
            .map(|v| format!("{} {}w", v.url, v.width))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Check the ordering and placeholder invariants.
    pub fn validate(&self) -> RespimgResult<()> {
        if self.formats.is_empty() {
            return Err(RespimgError::validation("manifest lists no formats"));
        }
        if self.variants.is_empty() {
            return Err(RespimgError::validation("manifest has no variants"));
        }

        let rank = |f: OutputFormat| self.formats.iter().position(|&x| x == f);
        let mut prev: Option<(u32, usize)> = None;
        for v in &self.variants {
            if v.placeholder {
                return Err(RespimgError::validation(format!(
                    "placeholder entry '{}' listed among variants",
                    v.url
                )));
            }
            let r = rank(v.format).ok_or_else(|| {
                RespimgError::validation(format!(
                    "variant '{}' has format {} not listed in formats",
                    v.url, v.format
                ))
            })?;
            if let Some(p) = prev
                && (v.width, r) <= p
            {
                return Err(RespimgError::validation(format!(
                    "variants must be strictly ascending by (width, format); '{}' is out of order",
                    v.url
                )));
            }
            prev = Some((v.width, r));
        }

        if let Some(p) = &self.placeholder
            && !p.placeholder
        {
            return Err(RespimgError::validation(
                "placeholder entry is not flagged as placeholder",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compile/manifest.rs"]
mod tests;
