//! respimg turns one source raster into a set of responsive image variants and renders the
//! markup that serves them.
//!
//! Build time:
//!
//! - Decode a source with [`decode_image`] or [`decode_image_file`]
//! - Produce every (width, format) variant plus a blur-up placeholder with
//!   [`VariantManifestBuilder`]
//! - Persist the files and `<name>.manifest.json` with [`write_image_set`]
//!
//! Run time:
//!
//! - Resolve lazy-loading support once through a [`CapabilityLoader`] (or [`bootstrap`])
//! - Emit `srcset`/`sizes` markup from a [`Manifest`] via [`Renderer`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod foundation;

pub(crate) mod compile;
/// Output encoders.
pub mod encode;
pub(crate) mod output;
pub(crate) mod runtime;
pub(crate) mod transform;

pub use crate::foundation::config::{
    DEFAULT_PLACEHOLDER_QUALITY, DEFAULT_PLACEHOLDER_WIDTH, DEFAULT_QUALITY, DEFAULT_SIZES,
    FailurePolicy, NamingMode, PipelineConfig, PlaceholderConfig,
};
pub use crate::foundation::core::{AspectRatio, OutputFormat, SizeSpec, UpscalePolicy};
pub use crate::foundation::error::{RespimgError, RespimgResult, VariantFailure};

pub use crate::assets::decode::{
    MAX_DIMENSION, MAX_PIXELS, SourceFormat, SourceImage, decode_image, decode_image_file,
};
pub use crate::transform::resize::{RESAMPLE_FILTER, RasterBuffer, resize, target_height};

pub use crate::encode::codec::{
    Encoder, LegacyJpegEncoder, LosslessPngEncoder, LossyWebpEncoder, encoder_for,
};

pub use crate::compile::builder::{ImageSet, VariantManifestBuilder, build_image_set};
pub use crate::compile::fingerprint::OutputId;
pub use crate::compile::manifest::{Manifest, SourceInfo, Variant, VariantEntry};
pub use crate::compile::placeholder::{data_uri, placeholder, placeholder_width};

pub use crate::output::writer::{WriteStats, manifest_path, write_image_set};

pub use crate::runtime::capability::{
    Capability, CapabilityLoader, CapabilityState, LazyLoadHost, PolyfillFetch, PolyfillTask,
    Renderer, Resolution, bootstrap,
};
pub use crate::runtime::markup::{DEFAULT_SIZES_HINT, ImageSource, render};
