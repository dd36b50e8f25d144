//! ZIP packaging for batch results.
//!
//! The whole archive is assembled in memory; results are small enough that
//! streaming to disk buys nothing. Failure text files go in alongside the
//! converted images, so the archive mirrors the result list exactly.

use crate::pipeline::ConversionResult;
use std::io::{Cursor, Write};
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("archive assembly failed: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("archive write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Bundle every result into a single ZIP archive, one entry per result, in
/// result order.
pub fn bundle(results: &[ConversionResult]) -> Result<Vec<u8>, ArchiveError> {
    let mut buffer = Vec::new();
    let mut writer = ZipWriter::new(Cursor::new(&mut buffer));
    let entry_options =
        SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for result in results {
        writer.start_file(result.name(), entry_options)?;
        writer.write_all(&result.payload())?;
    }
    writer.finish()?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn converted(name: &str, payload: &[u8]) -> ConversionResult {
        ConversionResult::Converted {
            name: name.into(),
            media_type: "image/png".into(),
            payload: payload.to_vec(),
            note: None,
        }
    }

    fn read_entry(archive: &[u8], name: &str) -> Vec<u8> {
        let mut zip = zip::ZipArchive::new(Cursor::new(archive)).unwrap();
        let mut entry = zip.by_name(name).unwrap();
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn bundle_contains_every_result() {
        let results = vec![
            converted("a.png", b"aaa"),
            converted("b.png", b"bbbb"),
        ];
        let archive = bundle(&results).unwrap();

        let zip = zip::ZipArchive::new(Cursor::new(&archive)).unwrap();
        assert_eq!(zip.len(), 2);
        assert_eq!(read_entry(&archive, "a.png"), b"aaa");
        assert_eq!(read_entry(&archive, "b.png"), b"bbbb");
    }

    #[test]
    fn failures_are_bundled_as_text() {
        let results = vec![ConversionResult::Failed {
            name: "img.heic.ERROR.txt".into(),
            message: "no HEIC decoder".into(),
        }];
        let archive = bundle(&results).unwrap();
        let text = String::from_utf8(read_entry(&archive, "img.heic.ERROR.txt")).unwrap();
        assert_eq!(text, "Conversion failed: no HEIC decoder");
    }

    #[test]
    fn empty_result_list_makes_empty_archive() {
        let archive = bundle(&[]).unwrap();
        let zip = zip::ZipArchive::new(Cursor::new(&archive)).unwrap();
        assert_eq!(zip.len(), 0);
    }

    #[test]
    fn entry_order_matches_result_order() {
        let results = vec![
            converted("z.png", b"z"),
            converted("a.png", b"a"),
        ];
        let archive = bundle(&results).unwrap();
        let mut zip = zip::ZipArchive::new(Cursor::new(&archive)).unwrap();
        let names: Vec<String> = (0..zip.len())
            .map(|i| zip.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec!["z.png", "a.png"]);
    }
}
