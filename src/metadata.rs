//! EXIF preservation for JPEG→JPEG conversions.
//!
//! Re-encoding through a raster surface drops every metadata segment the
//! source carried. When the user asks to keep metadata and both sides of the
//! conversion are JPEG, the original APP1 EXIF segment is extracted, validated
//! and spliced back into the fresh payload right after SOI. Every other
//! pairing passes the payload through untouched with an explanatory note.
//!
//! Metadata failure is never fatal: at worst the converted image is returned
//! without metadata and the note says why.

use crate::options::{MetadataMode, OutputFormat};
use thiserror::Error;

/// Note attached whenever "keep" is requested for a pairing other than JPEG→JPEG.
pub const NOTE_JPEG_ONLY: &str = "metadata preservation only supported JPEG→JPEG";
/// Note attached on successful reinsertion.
pub const NOTE_PRESERVED: &str = "EXIF preserved (JPEG→JPEG)";
/// Note attached when the source JPEG has nothing to preserve.
pub const NOTE_NO_EXIF: &str = "source JPEG carries no EXIF block";
/// Note attached when extraction or splicing failed.
pub const NOTE_FAILED: &str = "EXIF could not be preserved";

const EXIF_HEADER: &[u8] = b"Exif\0\0";

#[derive(Error, Debug)]
enum MetadataError {
    #[error("output is not a JPEG payload")]
    NotJpeg,
    #[error("EXIF block does not fit in one APP1 segment")]
    Oversized,
    #[error("EXIF block failed to parse: {0}")]
    Invalid(#[from] exif::Error),
}

/// Encoded payload after the metadata stage, plus the note shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataOutcome {
    pub payload: Vec<u8>,
    pub note: Option<String>,
}

impl MetadataOutcome {
    fn pass_through(payload: Vec<u8>, note: Option<&str>) -> Self {
        Self {
            payload,
            note: note.map(str::to_string),
        }
    }
}

/// Apply the metadata policy to a freshly encoded payload.
///
/// | mode | input | output | behavior |
/// |---|---|---|---|
/// | discard | any | any | pass through, no note |
/// | keep | not JPEG | any | pass through, JPEG-only note |
/// | keep | JPEG | not JPEG | pass through, JPEG-only note |
/// | keep | JPEG | JPEG | splice EXIF, success note |
/// | keep | JPEG | JPEG, no EXIF in source | pass through, no-EXIF note |
/// | keep | JPEG | JPEG, splice fails | pass through, failure note |
pub fn preserve_metadata(
    original_name: &str,
    original_type: &str,
    original: &[u8],
    output: Vec<u8>,
    mode: MetadataMode,
    format: OutputFormat,
) -> MetadataOutcome {
    if mode == MetadataMode::Discard {
        return MetadataOutcome::pass_through(output, None);
    }

    let jpeg_in = is_jpeg_source(original_name, original_type);
    let jpeg_out = format == OutputFormat::Jpg;
    if !jpeg_in || !jpeg_out {
        return MetadataOutcome::pass_through(output, Some(NOTE_JPEG_ONLY));
    }

    match splice_exif(original, &output) {
        Ok(Some(spliced)) => MetadataOutcome {
            payload: spliced,
            note: Some(NOTE_PRESERVED.to_string()),
        },
        Ok(None) => MetadataOutcome::pass_through(output, Some(NOTE_NO_EXIF)),
        Err(e) => {
            log::warn!("metadata reinsertion for {original_name} failed: {e}");
            MetadataOutcome::pass_through(output, Some(NOTE_FAILED))
        }
    }
}

fn is_jpeg_source(name: &str, media_type: &str) -> bool {
    if media_type.to_ascii_lowercase().contains("jpeg") {
        return true;
    }
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".jpg") || lower.ends_with(".jpeg")
}

/// Find the body of the first APP1 EXIF segment in a JPEG stream, including
/// the `Exif\0\0` prefix. Returns `None` for non-JPEG data or a JPEG without
/// EXIF.
pub(crate) fn exif_segment(data: &[u8]) -> Option<&[u8]> {
    if !data.starts_with(&[0xFF, 0xD8]) {
        return None;
    }

    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            // Desynced — not a well-formed marker stream
            return None;
        }
        let marker = data[pos + 1];

        // SOS means entropy-coded data follows; EOI ends the stream.
        // No metadata segments past either.
        if marker == 0xDA || marker == 0xD9 {
            break;
        }
        // Standalone markers without a length field
        if marker == 0xD8 || marker == 0x01 || (0xD0..=0xD7).contains(&marker) {
            pos += 2;
            continue;
        }
        // Fill byte
        if marker == 0xFF {
            pos += 1;
            continue;
        }

        let length = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        if length < 2 || pos + 2 + length > data.len() {
            break;
        }
        let body = &data[pos + 4..pos + 2 + length];
        if marker == 0xE1 && body.starts_with(EXIF_HEADER) {
            return Some(body);
        }
        pos += 2 + length;
    }
    None
}

/// Extract the EXIF block from `original` and splice it into `encoded`.
///
/// `Ok(None)` means the source has no EXIF block. On success the inserted
/// segment body is byte-identical to the extracted one.
fn splice_exif(original: &[u8], encoded: &[u8]) -> Result<Option<Vec<u8>>, MetadataError> {
    let Some(block) = exif_segment(original) else {
        return Ok(None);
    };

    // Validate before splicing: a corrupt block would make the output worse
    // than one with no metadata at all.
    let tiff = block.get(EXIF_HEADER.len()..).unwrap_or_default();
    exif::Reader::new().read_raw(tiff.to_vec())?;

    if !encoded.starts_with(&[0xFF, 0xD8]) {
        return Err(MetadataError::NotJpeg);
    }
    if block.len() + 2 > u16::MAX as usize {
        return Err(MetadataError::Oversized);
    }

    let mut out = Vec::with_capacity(encoded.len() + block.len() + 4);
    out.extend_from_slice(&encoded[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((block.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(block);
    out.extend_from_slice(&encoded[2..]);
    Ok(Some(out))
}
