//! Smart decoding: format-tag dispatch over a decoder registry.
//!
//! Most inputs decode through the `image` crate directly. A few formats need
//! a dedicated path — TIFF (decoded to raw RGBA planes without an
//! intermediate re-encode), ICO (multi-frame, largest frame wins), AVIF
//! (container parse + AV1 decode) — and those live behind the
//! [`DecoderRegistry`]. HEIC/HEIF has a format tag but no built-in decoder;
//! unless a caller registers one, a HEIC input fails immediately with an
//! error naming the missing capability rather than falling through to a
//! native decode that cannot handle it.

use image::DynamicImage;
use std::collections::HashMap;
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("no {format} decoder is available in this build")]
    MissingCapability { format: &'static str },
    #[error("{format} decode failed: {reason}")]
    Failed {
        format: &'static str,
        reason: String,
    },
    #[error("could not decode image: {0}")]
    Unreadable(#[from] image::ImageError),
}

/// Formats that never go through the native decode path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatTag {
    Heic,
    Tiff,
    Ico,
    Avif,
}

impl FormatTag {
    pub fn name(self) -> &'static str {
        match self {
            FormatTag::Heic => "HEIC/HEIF",
            FormatTag::Tiff => "TIFF",
            FormatTag::Ico => "ICO",
            FormatTag::Avif => "AVIF",
        }
    }

    /// Identify a special format from the file name or declared media type,
    /// case-insensitive. Checked in declaration order; `None` means the input
    /// goes to the native decoder.
    pub fn sniff(file_name: &str, media_type: &str) -> Option<FormatTag> {
        let name = file_name.to_ascii_lowercase();
        let ext = match name.rfind('.') {
            Some(pos) => &name[pos + 1..],
            None => "",
        };
        let declared = media_type.to_ascii_lowercase();

        if ext == "heic" || ext == "heif" || declared.contains("heic") || declared.contains("heif")
        {
            Some(FormatTag::Heic)
        } else if ext == "tif" || ext == "tiff" || declared.contains("tiff") {
            Some(FormatTag::Tiff)
        } else if ext == "ico" || declared.contains("icon") {
            Some(FormatTag::Ico)
        } else if ext == "avif" || declared.contains("avif") {
            Some(FormatTag::Avif)
        } else {
            None
        }
    }
}

/// A decode path for one special format.
///
/// Implement this to plug an external decoder into the registry, e.g. a
/// HEIC decoder backed by a system library.
pub trait FormatDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, DecodeError>;
}

/// Maps format tags to decoders. Built once at startup; the per-file dispatch
/// only does a lookup.
pub struct DecoderRegistry {
    decoders: HashMap<FormatTag, Box<dyn FormatDecoder>>,
}

impl DecoderRegistry {
    /// Registry with no special-format decoders at all. Every tagged format
    /// fails with a missing-capability error.
    pub fn empty() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Registry with the decoders compiled into this build: TIFF, ICO, AVIF.
    /// There is no pure-Rust HEIC decoder to ship; see [`Self::register`].
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(FormatTag::Tiff, Box::new(TiffRaw));
        registry.register(FormatTag::Ico, Box::new(IcoLargestFrame));
        registry.register(FormatTag::Avif, Box::new(super::avif::AvifInput));
        registry
    }

    pub fn register(&mut self, tag: FormatTag, decoder: Box<dyn FormatDecoder>) {
        self.decoders.insert(tag, decoder);
    }

    pub fn has(&self, tag: FormatTag) -> bool {
        self.decoders.contains_key(&tag)
    }

    /// Decode arbitrary input bytes into a raster image.
    ///
    /// Special formats dispatch to their registered decoder; a tagged format
    /// without one is an immediate missing-capability error. Everything else
    /// goes to the native decoder.
    pub fn decode(
        &self,
        file_name: &str,
        media_type: &str,
        bytes: &[u8],
    ) -> Result<DynamicImage, DecodeError> {
        match FormatTag::sniff(file_name, media_type) {
            Some(tag) => {
                log::debug!("decoding {file_name} via {} path", tag.name());
                match self.decoders.get(&tag) {
                    Some(decoder) => decoder.decode(bytes),
                    None => Err(DecodeError::MissingCapability { format: tag.name() }),
                }
            }
            None => Ok(image::load_from_memory(bytes)?),
        }
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// TIFF decoded straight to a raster, no intermediate re-encode.
struct TiffRaw;

impl FormatDecoder for TiffRaw {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
        let decoder = image::codecs::tiff::TiffDecoder::new(Cursor::new(bytes)).map_err(|e| {
            DecodeError::Failed {
                format: "TIFF",
                reason: e.to_string(),
            }
        })?;
        DynamicImage::from_decoder(decoder).map_err(|e| DecodeError::Failed {
            format: "TIFF",
            reason: e.to_string(),
        })
    }
}

/// ICO files embed several frames; keep the one with the largest pixel area
/// and discard the rest.
struct IcoLargestFrame;

impl FormatDecoder for IcoLargestFrame {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
        let failed = |reason: String| DecodeError::Failed {
            format: "ICO",
            reason,
        };

        let dir = ico::IconDir::read(Cursor::new(bytes)).map_err(|e| failed(e.to_string()))?;
        let entry = dir
            .entries()
            .iter()
            .max_by_key(|e| u64::from(e.width()) * u64::from(e.height()))
            .ok_or_else(|| failed("icon contains no frames".into()))?;
        let frame = entry.decode().map_err(|e| failed(e.to_string()))?;

        let buffer =
            image::RgbaImage::from_raw(frame.width(), frame.height(), frame.rgba_data().to_vec())
                .ok_or_else(|| failed("frame pixel data is truncated".into()))?;
        Ok(DynamicImage::ImageRgba8(buffer))
    }
}
