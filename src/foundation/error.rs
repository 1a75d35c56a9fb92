use std::fmt;

use crate::foundation::core::OutputFormat;

/// Convenience result type used across respimg.
pub type RespimgResult<T> = Result<T, RespimgError>;

/// Top-level error taxonomy used by pipeline and runtime APIs.
#[derive(thiserror::Error, Debug)]
pub enum RespimgError {
    /// Input bytes do not carry the signature of a supported container.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Input signature matched but headers or pixel data are invalid.
    #[error("corrupt input: {0}")]
    CorruptInput(String),

    /// Requested width is zero or wider than the source.
    #[error("invalid target width {width} for source width {source_width}")]
    InvalidTargetWidth {
        /// Requested output width.
        width: u32,
        /// Width of the decoded source.
        source_width: u32,
    },

    /// The codec reported an internal error.
    #[error("encode failure: {0}")]
    EncodeFailure(String),

    /// One or more (width, format) variants could not be produced.
    #[error(
        "manifest incomplete: {} of {total} variant(s) failed: {}",
        failures.len(),
        join_failures(failures)
    )]
    ManifestIncomplete {
        /// Number of variants that were scheduled.
        total: usize,
        /// Every failed variant, sorted by width then format.
        failures: Vec<VariantFailure>,
    },

    /// The host could not report whether native lazy-loading is available.
    #[error("capability probe failed: {0}")]
    CapabilityProbeFailure(String),

    /// The lazy-loading polyfill could not be fetched.
    #[error("polyfill load failed: {0}")]
    PolyfillLoadFailure(String),

    /// Invalid user-provided configuration or arguments.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A single failed (width, format) job, as reported by [`RespimgError::ManifestIncomplete`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariantFailure {
    /// Requested output width.
    pub width: u32,
    /// Requested output format.
    pub format: OutputFormat,
    /// Rendered cause.
    pub reason: String,
}

impl fmt::Display for VariantFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}w {}: {}", self.width, self.format, self.reason)
    }
}

fn join_failures(failures: &[VariantFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl RespimgError {
    /// Build a [`RespimgError::UnsupportedFormat`] value.
    pub fn unsupported_format(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    /// Build a [`RespimgError::CorruptInput`] value.
    pub fn corrupt_input(msg: impl Into<String>) -> Self {
        Self::CorruptInput(msg.into())
    }

    /// Build a [`RespimgError::EncodeFailure`] value.
    pub fn encode_failure(msg: impl Into<String>) -> Self {
        Self::EncodeFailure(msg.into())
    }

    /// Build a [`RespimgError::CapabilityProbeFailure`] value.
    pub fn capability_probe(msg: impl Into<String>) -> Self {
        Self::CapabilityProbeFailure(msg.into())
    }

    /// Build a [`RespimgError::PolyfillLoadFailure`] value.
    pub fn polyfill_load(msg: impl Into<String>) -> Self {
        Self::PolyfillLoadFailure(msg.into())
    }

    /// Build a [`RespimgError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`RespimgError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
