//! # Pixport
//!
//! A batch image converter. Feed it photos in whatever formats they arrive in
//! — camera JPEGs, scanner TIFFs, favicons, AVIF exports — and it converts
//! them all to one target encoding, optionally resized, with EXIF carried
//! over where the format pairing allows it.
//!
//! # Architecture: One Queue, One Pass
//!
//! Conversion is organized around a [`pipeline::Session`]: inputs are queued,
//! then a run drains the queue strictly in order, converting one item at a
//! time through a fixed stage sequence:
//!
//! ```text
//! decode → resize → flatten (opaque targets) → encode → metadata
//! ```
//!
//! Each queued item yields exactly one [`pipeline::ConversionResult`]. A
//! failed item does not abort the run; it becomes a text result describing
//! the failure, named `<input>.ERROR.txt`, so the output set always mirrors
//! the input set one-to-one.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | The batch orchestrator: queue, stages, results, progress events |
//! | [`imaging`] | Decoder registry, dimension math, resizing/flattening, encoders, capability probe |
//! | [`metadata`] | EXIF extraction and reinsertion for JPEG→JPEG conversions |
//! | [`options`] | Per-batch settings: format, quality, max side, background, metadata mode |
//! | [`naming`] | Output/error file naming and media type inference |
//! | [`archive`] | ZIP packaging of a full result set |
//! | [`output`] | CLI output formatting — probe listing, progress lines, run summary |
//!
//! # Design Decisions
//!
//! ## Probed, Not Assumed, Output Support
//!
//! Which encodings this build can produce is determined empirically at
//! startup: [`imaging::probe_formats`] trial-encodes a one-pixel surface per
//! candidate and checks the payload's magic bytes. An encoder that exists but
//! emits the wrong container counts as unsupported. The first supported
//! format in probe order is the default target.
//!
//! ## Decoders Behind a Registry
//!
//! Formats the native decode path cannot or should not handle (TIFF, ICO,
//! AVIF, HEIC) dispatch through [`imaging::DecoderRegistry`]. HEIC ships with
//! a format tag but no decoder — there is no pure-Rust HEIC decoder to bundle
//! — so HEIC inputs fail fast with an error naming the missing capability,
//! and callers with a decoder of their own can register one.
//!
//! ## Pure-Rust Imaging (No ImageMagick, No libheif)
//!
//! Everything is pure Rust: the `image` crate for the common codecs and
//! Lanczos3 resampling, `avif-parse` + `rav1d` for AVIF input, `rav1e` for
//! AVIF output, `ico` for icons. No system libraries to install, no version
//! conflicts; the binary is fully self-contained.
//!
//! ## Flatten After Resize
//!
//! Transparency is flattened onto the background color only for targets that
//! cannot represent alpha (JPEG), and only *after* resizing. Resampling a
//! pre-flattened image would blend edge pixels against a background baked in
//! at the wrong scale and leave halos.
//!
//! ## Metadata Is Never Fatal
//!
//! EXIF preservation is attempted only for JPEG→JPEG and downgraded to an
//! explanatory note in every other case — wrong pairing, no EXIF present, or
//! a corrupt block. A conversion never fails because of metadata.

pub mod archive;
pub mod imaging;
pub mod metadata;
pub mod naming;
pub mod options;
pub mod output;
pub mod pipeline;
