//! Output codecs.
//!
//! Format selection is explicit: callers name an [`OutputFormat`](crate::OutputFormat) and get
//! the matching [`Encoder`](codec::Encoder); nothing is probed at runtime.

/// Encoder trait and the WebP/JPEG/PNG implementations.
pub mod codec;
