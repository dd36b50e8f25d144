//! Image processing — pure Rust, zero system dependencies.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, BMP, WebP) | `image` crate (native path) |
//! | Decode (TIFF) | `image::codecs::tiff::TiffDecoder`, raw RGBA, no re-encode |
//! | Decode (ICO) | `ico` crate, largest frame wins |
//! | Decode (AVIF) | `avif-parse` (container) + `rav1d` (AV1) + custom YUV→RGB |
//! | Resize | Lanczos3 via `image::imageops` |
//! | Encode (JPEG, PNG, WebP, AVIF) | `image` codecs (rav1e for AVIF) |
//!
//! The module is split into:
//! - **calculations**: pure functions for dimension math (unit testable)
//! - **decode**: [`DecoderRegistry`] dispatch over format-specific decode paths
//! - **avif**: the AVIF input decoder
//! - **compose**: resizing and alpha flattening
//! - **encode**: per-format encoders plus the capability probe

mod avif;
mod calculations;
pub mod compose;
pub mod decode;
pub mod encode;

pub use calculations::fit_within;
pub use decode::{DecodeError, DecoderRegistry, FormatDecoder, FormatTag};
pub use encode::{EncodeError, FormatSupport, declared_format, first_supported, probe_formats};
