use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::foundation::core::{OutputFormat, SizeSpec, UpscalePolicy};
use crate::foundation::error::{RespimgError, RespimgResult};

/// Default responsive widths.
pub const DEFAULT_SIZES: [u32; 6] = [320, 640, 960, 1200, 1800, 2400];
/// Default quality for full-size variants.
pub const DEFAULT_QUALITY: u8 = 80;
/// Default placeholder width in pixels.
pub const DEFAULT_PLACEHOLDER_WIDTH: u32 = 20;
/// Default placeholder quality.
pub const DEFAULT_PLACEHOLDER_QUALITY: u8 = 20;

/// How output files are named.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingMode {
    /// `{name}-{width}-{hash8}.{ext}`; stable across rebuilds, busts caches on change.
    #[default]
    Hashed,
    /// `{name}-{width}.{ext}`; for development builds.
    Plain,
}

/// What the builder does when a single (width, format) job fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Fail the whole build with [`RespimgError::ManifestIncomplete`].
    #[default]
    Abort,
    /// Drop the failed variant and keep going.
    SkipVariant,
}

/// Placeholder generation settings.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaceholderConfig {
    /// Generate a placeholder at all.
    pub enabled: bool,
    /// Target width; narrower sources use their own width.
    pub width: u32,
    /// Encoder quality, 0-100.
    pub quality: u8,
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            width: DEFAULT_PLACEHOLDER_WIDTH,
            quality: DEFAULT_PLACEHOLDER_QUALITY,
        }
    }
}

/// Everything the build-time pipeline needs besides the source bytes.
///
/// Deserializes from JSON; every field is optional and falls back to [`PipelineConfig::default`].
///
/// ```json
/// { "sizes": [320, 640, 1200], "formats": ["webp", "jpeg"], "quality": 80,
///   "placeholder": { "width": 20 }, "naming": "hashed", "public_path": "/img/" }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Target widths (validated through [`SizeSpec`]).
    pub sizes: Vec<u32>,
    /// Output formats, in `<picture>` preference order.
    pub formats: Vec<OutputFormat>,
    /// Encoder quality for full-size variants, 0-100.
    pub quality: u8,
    /// Placeholder settings.
    pub placeholder: PlaceholderConfig,
    /// Output file naming scheme.
    pub naming: NamingMode,
    /// URL prefix prepended to every output file name.
    pub public_path: String,
    /// Handling of widths wider than the source.
    pub upscale: UpscalePolicy,
    /// Handling of failed variant jobs.
    pub on_failure: FailurePolicy,
    /// Worker thread count; `None` uses one per core.
    pub threads: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sizes: DEFAULT_SIZES.to_vec(),
            formats: vec![OutputFormat::WebP],
            quality: DEFAULT_QUALITY,
            placeholder: PlaceholderConfig::default(),
            naming: NamingMode::default(),
            public_path: "/".to_string(),
            upscale: UpscalePolicy::default(),
            on_failure: FailurePolicy::default(),
            threads: None,
        }
    }
}

impl PipelineConfig {
    /// Parse a config from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> RespimgResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| RespimgError::serde(format!("parse pipeline config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a config from a JSON string.
    pub fn from_json_str(s: &str) -> RespimgResult<Self> {
        Self::from_reader(s.as_bytes())
    }

    /// Parse a config from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> RespimgResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            RespimgError::validation(format!("open pipeline config '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Check every field; called by the builder before any work starts.
    pub fn validate(&self) -> RespimgResult<()> {
        self.size_spec()?;

        if self.formats.is_empty() {
            return Err(RespimgError::validation("formats must be non-empty"));
        }
        for (i, f) in self.formats.iter().enumerate() {
            if self.formats[..i].contains(f) {
                return Err(RespimgError::validation(format!(
                    "format '{f}' is listed more than once"
                )));
            }
        }

        validate_quality("quality", self.quality)?;
        validate_quality("placeholder.quality", self.placeholder.quality)?;
        if self.quality == 0 && self.formats.contains(&OutputFormat::Jpeg) {
            return Err(RespimgError::validation("quality must be >= 1 for jpeg output"));
        }
        if self.placeholder.enabled
            && self.placeholder.quality == 0
            && self.formats[0] == OutputFormat::Jpeg
        {
            return Err(RespimgError::validation(
                "placeholder.quality must be >= 1 for jpeg output",
            ));
        }
        if self.placeholder.width == 0 {
            return Err(RespimgError::validation("placeholder.width must be > 0"));
        }

        if let Some(n) = self.threads
            && n == 0
        {
            return Err(RespimgError::validation("threads must be >= 1 when set"));
        }
        Ok(())
    }

    /// The configured widths as a validated [`SizeSpec`].
    pub fn size_spec(&self) -> RespimgResult<SizeSpec> {
        SizeSpec::new(self.sizes.iter().copied())
    }

    /// Public URL for an output file name.
    pub fn public_url(&self, file_name: &str) -> String {
        if self.public_path.is_empty() || self.public_path.ends_with('/') {
            format!("{}{file_name}", self.public_path)
        } else {
            format!("{}/{file_name}", self.public_path)
        }
    }
}

pub(crate) fn validate_quality(field: &str, quality: u8) -> RespimgResult<()> {
    if quality > 100 {
        return Err(RespimgError::validation(format!(
            "{field} must be in 0..=100 (got {quality})"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
