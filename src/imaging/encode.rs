//! Encoders and the format capability probe.
//!
//! One entry point, [`encode`], serializes a raster surface to the target
//! encoding. The probe ([`probe_formats`]) trial-encodes a 1×1 surface per
//! candidate format and sniffs the payload's magic bytes, because an encoder
//! can exist yet silently emit a different format than asked for — support is
//! only real if the payload declares the requested encoding.

use crate::options::{OutputFormat, Quality};
use image::codecs::{
    avif::AvifEncoder, jpeg::JpegEncoder, png::PngEncoder, webp::WebPEncoder,
};
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;
use thiserror::Error;

/// AVIF encode speed (rav1e). 6 trades a little size for a lot of throughput.
const AVIF_SPEED: u8 = 6;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("{format} encode failed: {reason}")]
    Encoder {
        format: &'static str,
        reason: String,
    },
    #[error("{format} encoder produced an empty payload")]
    EmptyPayload { format: &'static str },
}

/// Serialize a raster surface to `format` at `quality`.
///
/// Quality applies to lossy encodings (JPEG, AVIF) and is ignored for
/// lossless ones (PNG, and WebP in this build). Callers must flatten alpha
/// away before encoding to JPEG; see [`crate::imaging::compose`].
pub fn encode(
    surface: &DynamicImage,
    format: OutputFormat,
    quality: Quality,
) -> Result<Vec<u8>, EncodeError> {
    let mut payload = Vec::new();
    let cursor = Cursor::new(&mut payload);

    let written = match format {
        OutputFormat::Jpg => {
            surface.write_with_encoder(JpegEncoder::new_with_quality(cursor, quality.value()))
        }
        OutputFormat::Png => surface.write_with_encoder(PngEncoder::new(cursor)),
        OutputFormat::Webp => surface.write_with_encoder(WebPEncoder::new_lossless(cursor)),
        OutputFormat::Avif => surface.write_with_encoder(AvifEncoder::new_with_speed_quality(
            cursor,
            AVIF_SPEED,
            quality.value(),
        )),
    };

    written.map_err(|e| EncodeError::Encoder {
        format: format.label(),
        reason: e.to_string(),
    })?;

    if payload.is_empty() {
        return Err(EncodeError::EmptyPayload {
            format: format.label(),
        });
    }
    Ok(payload)
}

/// One probe row: a candidate encoding and whether this build can produce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatSupport {
    pub format: OutputFormat,
    pub supported: bool,
}

/// Empirically determine which output encodings this build can produce.
///
/// Absence of support is a valid result, not an error; the caller disables
/// the corresponding menu entries.
pub fn probe_formats() -> Vec<FormatSupport> {
    OutputFormat::ALL
        .iter()
        .map(|&format| {
            let supported = encode(&probe_surface(format), format, Quality::default())
                .map(|payload| declared_format(&payload) == Some(format))
                .unwrap_or(false);
            FormatSupport { format, supported }
        })
        .collect()
}

/// First supported encoding in probe order, the default menu selection.
pub fn first_supported(supports: &[FormatSupport]) -> Option<OutputFormat> {
    supports.iter().find(|s| s.supported).map(|s| s.format)
}

fn probe_surface(format: OutputFormat) -> DynamicImage {
    if format.supports_alpha() {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 255])))
    } else {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(1, 1, Rgb([255, 255, 255])))
    }
}

/// Identify which encoding a payload declares, from its magic bytes.
pub fn declared_format(payload: &[u8]) -> Option<OutputFormat> {
    if payload.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some(OutputFormat::Jpg)
    } else if payload.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some(OutputFormat::Png)
    } else if payload.len() >= 12 && &payload[..4] == b"RIFF" && &payload[8..12] == b"WEBP" {
        Some(OutputFormat::Webp)
    } else if payload.len() >= 12 && &payload[4..8] == b"ftyp" && &payload[8..12] == b"avif" {
        Some(OutputFormat::Avif)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
        }))
    }

    #[test]
    fn every_format_encodes_and_declares_itself() {
        let img = gradient(16, 16);
        let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
        for format in OutputFormat::ALL {
            let surface = if format.supports_alpha() { &img } else { &rgb };
            let payload = encode(surface, format, Quality::new(80)).unwrap();
            assert_eq!(declared_format(&payload), Some(format), "{format}");
        }
    }

    #[test]
    fn probe_reports_all_builtin_encoders() {
        let supports = probe_formats();
        assert_eq!(supports.len(), 4);
        for s in &supports {
            assert!(s.supported, "{} should be supported", s.format);
        }
    }

    #[test]
    fn probe_order_matches_candidate_list() {
        let formats: Vec<OutputFormat> = probe_formats().iter().map(|s| s.format).collect();
        assert_eq!(formats, OutputFormat::ALL.to_vec());
    }

    #[test]
    fn first_supported_follows_probe_order() {
        let supports = vec![
            FormatSupport {
                format: OutputFormat::Jpg,
                supported: false,
            },
            FormatSupport {
                format: OutputFormat::Png,
                supported: true,
            },
        ];
        assert_eq!(first_supported(&supports), Some(OutputFormat::Png));
        assert_eq!(first_supported(&[]), None);
    }

    #[test]
    fn jpeg_quality_changes_payload_size() {
        let img = DynamicImage::ImageRgb8(gradient(64, 64).to_rgb8());
        let low = encode(&img, OutputFormat::Jpg, Quality::new(10)).unwrap();
        let high = encode(&img, OutputFormat::Jpg, Quality::new(95)).unwrap();
        assert!(high.len() > low.len());
    }

    #[test]
    fn same_input_same_quality_same_size() {
        let img = gradient(32, 32);
        for format in OutputFormat::ALL {
            let surface = if format.supports_alpha() {
                img.clone()
            } else {
                DynamicImage::ImageRgb8(img.to_rgb8())
            };
            let a = encode(&surface, format, Quality::new(80)).unwrap();
            let b = encode(&surface, format, Quality::new(80)).unwrap();
            assert_eq!(a.len(), b.len(), "{format}");
        }
    }

    #[test]
    fn declared_format_rejects_noise() {
        assert_eq!(declared_format(b"plain text"), None);
        assert_eq!(declared_format(&[]), None);
    }
}
