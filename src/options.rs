//! Per-batch conversion settings.
//!
//! A [`ConversionOptions`] value is snapshotted once when a batch run starts
//! and never changes mid-run. Everything here is plain data: the CLI builds it
//! from flags, library users build it directly.

use clap::ValueEnum;
use std::fmt;

/// A target output encoding.
///
/// [`OutputFormat::ALL`] fixes the probe and menu order: JPEG first, AVIF last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Jpg,
    Png,
    Webp,
    Avif,
}

impl OutputFormat {
    /// Candidate output encodings, in probe order.
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Jpg,
        OutputFormat::Png,
        OutputFormat::Webp,
        OutputFormat::Avif,
    ];

    /// File extension appended to output names.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::Webp => "webp",
            OutputFormat::Avif => "avif",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            OutputFormat::Jpg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::Webp => "image/webp",
            OutputFormat::Avif => "image/avif",
        }
    }

    /// Human-facing name, used in error messages and the `formats` listing.
    pub fn label(self) -> &'static str {
        match self {
            OutputFormat::Jpg => "JPEG",
            OutputFormat::Png => "PNG",
            OutputFormat::Webp => "WebP",
            OutputFormat::Avif => "AVIF",
        }
    }

    /// Whether the encoding can represent transparency. JPEG cannot; outputs
    /// headed there get flattened onto the configured background first.
    pub fn supports_alpha(self) -> bool {
        !matches!(self, OutputFormat::Jpg)
    }

    /// Whether the quality setting applies. PNG is always lossless, and WebP
    /// is encoded lossless in this build.
    pub fn lossy(self) -> bool {
        matches!(self, OutputFormat::Jpg | OutputFormat::Avif)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Quality setting for lossy image encoding (1-100). Clamped on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Background color flattened under transparency for opaque outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Background {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Background {
    /// Parse a comma-separated "R,G,B" triplet. Anything malformed, including
    /// out-of-range components, yields the default white.
    pub fn parse(value: &str) -> Self {
        let parts: Vec<Result<u8, _>> = value.split(',').map(|p| p.trim().parse()).collect();
        match parts.as_slice() {
            [Ok(r), Ok(g), Ok(b)] => Self {
                r: *r,
                g: *g,
                b: *b,
            },
            _ => Self::default(),
        }
    }
}

impl Default for Background {
    fn default() -> Self {
        Self {
            r: 255,
            g: 255,
            b: 255,
        }
    }
}

/// What to do with capture metadata from the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MetadataMode {
    /// Drop all source metadata.
    Discard,
    /// Re-attach the source EXIF block when the pairing supports it (JPEG→JPEG).
    Keep,
}

/// Immutable settings for one batch run.
#[derive(Debug, Clone)]
pub struct ConversionOptions {
    pub format: OutputFormat,
    pub quality: Quality,
    /// Maximum output dimension in pixels on the longer side. 0 = unconstrained.
    pub max_side: u32,
    pub background: Background,
    pub metadata: MetadataMode,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Jpg,
            quality: Quality::default(),
            max_side: 0,
            background: Background::default(),
            metadata: MetadataMode::Discard,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_90() {
        assert_eq!(Quality::default().value(), 90);
    }

    #[test]
    fn background_parses_triplet() {
        assert_eq!(
            Background::parse("12, 34,56"),
            Background {
                r: 12,
                g: 34,
                b: 56
            }
        );
    }

    #[test]
    fn background_malformed_falls_back_to_white() {
        for input in ["", "1,2", "1,2,3,4", "a,b,c", "300,0,0", "-1,0,0"] {
            assert_eq!(Background::parse(input), Background::default(), "{input}");
        }
    }

    #[test]
    fn only_jpeg_is_opaque() {
        assert!(!OutputFormat::Jpg.supports_alpha());
        assert!(OutputFormat::Png.supports_alpha());
        assert!(OutputFormat::Webp.supports_alpha());
        assert!(OutputFormat::Avif.supports_alpha());
    }

    #[test]
    fn lossy_formats_take_quality() {
        assert!(OutputFormat::Jpg.lossy());
        assert!(OutputFormat::Avif.lossy());
        assert!(!OutputFormat::Png.lossy());
        assert!(!OutputFormat::Webp.lossy());
    }

    #[test]
    fn probe_order_is_fixed() {
        let exts: Vec<&str> = OutputFormat::ALL.iter().map(|f| f.extension()).collect();
        assert_eq!(exts, vec!["jpg", "png", "webp", "avif"]);
    }
}
