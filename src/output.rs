//! Terminal output formatting.
//!
//! Every `format_*` function is pure and returns strings; the `print_*`
//! wrappers add the I/O. Keeping the two apart makes the formatting testable
//! without capturing stdout.

use crate::imaging::FormatSupport;
use crate::pipeline::{ConvertEvent, ConversionResult, ItemStage};

/// Render a byte count in the nearest binary unit.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.2} {}", UNITS[unit])
    }
}

/// Render the capability probe as one line per candidate encoding.
pub fn format_probe(supports: &[FormatSupport]) -> Vec<String> {
    supports
        .iter()
        .map(|s| {
            let status = if s.supported { "supported" } else { "unavailable" };
            format!(
                "{:<5} {:<12} {status}",
                s.format.extension(),
                s.format.media_type()
            )
        })
        .collect()
}

/// Render a progress event. The first stage of an item prints its name; later
/// stages indent under it.
pub fn format_event(event: &ConvertEvent) -> Vec<String> {
    let stage_line = format!("    {}", event.stage.label());
    if event.stage == ItemStage::Decoding {
        vec![event.name.clone(), stage_line]
    } else {
        vec![stage_line]
    }
}

/// Render the end-of-run summary: one numbered line per result plus totals.
pub fn format_summary(results: &[ConversionResult]) -> Vec<String> {
    let mut lines = Vec::with_capacity(results.len() + 1);
    for (i, result) in results.iter().enumerate() {
        let line = match result {
            ConversionResult::Converted {
                name,
                payload,
                note,
                ..
            } => {
                let size = format_size(payload.len() as u64);
                match note {
                    Some(note) => format!("{:0>3} {name} ({size}) {note}", i + 1),
                    None => format!("{:0>3} {name} ({size})", i + 1),
                }
            }
            ConversionResult::Failed { name, message } => {
                format!("{:0>3} {name} FAILED: {message}", i + 1)
            }
        };
        lines.push(line);
    }

    let converted = results.iter().filter(|r| r.is_converted()).count();
    lines.push(format!(
        "Converted {converted}, failed {}",
        results.len() - converted
    ));
    lines
}

pub fn print_probe(supports: &[FormatSupport]) {
    for line in format_probe(supports) {
        println!("{line}");
    }
}

pub fn print_event(event: &ConvertEvent) {
    for line in format_event(event) {
        println!("{line}");
    }
}

pub fn print_summary(results: &[ConversionResult]) {
    for line in format_summary(results) {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OutputFormat;

    fn converted(name: &str, size: usize, note: Option<&str>) -> ConversionResult {
        ConversionResult::Converted {
            name: name.into(),
            media_type: "image/jpeg".into(),
            payload: vec![0; size],
            note: note.map(str::to_string),
        }
    }

    #[test]
    fn sizes_pick_the_right_unit() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1024 * 1024), "1.00 MB");
    }

    #[test]
    fn probe_lines_show_status() {
        let lines = format_probe(&[
            FormatSupport {
                format: OutputFormat::Jpg,
                supported: true,
            },
            FormatSupport {
                format: OutputFormat::Avif,
                supported: false,
            },
        ]);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("jpg"));
        assert!(lines[0].ends_with("supported"));
        assert!(lines[1].ends_with("unavailable"));
    }

    #[test]
    fn first_stage_prints_item_name() {
        let lines = format_event(&ConvertEvent {
            name: "photo.png".into(),
            stage: ItemStage::Decoding,
        });
        assert_eq!(lines, vec!["photo.png".to_string(), "    decoding".into()]);
    }

    #[test]
    fn later_stages_indent_only() {
        let lines = format_event(&ConvertEvent {
            name: "photo.png".into(),
            stage: ItemStage::Encoding,
        });
        assert_eq!(lines, vec!["    encoding".to_string()]);
    }

    #[test]
    fn summary_numbers_results_and_totals() {
        let results = vec![
            converted("a.jpg", 2048, None),
            ConversionResult::Failed {
                name: "b.heic.ERROR.txt".into(),
                message: "no HEIC decoder".into(),
            },
        ];
        let lines = format_summary(&results);
        assert_eq!(lines[0], "001 a.jpg (2.00 KB)");
        assert_eq!(lines[1], "002 b.heic.ERROR.txt FAILED: no HEIC decoder");
        assert_eq!(lines[2], "Converted 1, failed 1");
    }

    #[test]
    fn summary_appends_notes() {
        let results = vec![converted("a.jpg", 100, Some("EXIF preserved (JPEG→JPEG)"))];
        let lines = format_summary(&results);
        assert!(lines[0].ends_with("EXIF preserved (JPEG→JPEG)"), "{}", lines[0]);
    }

    #[test]
    fn empty_summary_still_prints_totals() {
        assert_eq!(format_summary(&[]), vec!["Converted 0, failed 0".to_string()]);
    }
}
