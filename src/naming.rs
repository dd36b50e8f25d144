//! Output file naming.
//!
//! One rule for every converted file: strip the last dot-delimited suffix from
//! the input name and append the target extension. Failure results keep the
//! full original name so the user can still tell which input produced them.

/// Derive the output name for a converted file.
///
/// - `"photo.jpeg"` + `"webp"` → `"photo.webp"`
/// - `"archive.tar.gz"` + `"png"` → `"archive.tar.png"` (only the last suffix goes)
/// - `"noext"` + `"jpg"` → `"noext.jpg"`
pub fn output_name(input: &str, extension: &str) -> String {
    let base = match input.rfind('.') {
        // A trailing dot is not an extension; leave it alone.
        Some(pos) if pos + 1 < input.len() => &input[..pos],
        _ => input,
    };
    format!("{base}.{extension}")
}

/// Name for the text file describing a failed conversion.
pub fn error_name(input: &str) -> String {
    format!("{input}.ERROR.txt")
}

/// Declared media type inferred from the file extension.
pub fn media_type_for(name: &str) -> &'static str {
    let lower = name.to_ascii_lowercase();
    let ext = match lower.rfind('.') {
        Some(pos) => &lower[pos + 1..],
        None => "",
    };
    match ext {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "ico" => "image/x-icon",
        "heic" => "image/heic",
        "heif" => "image/heif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_last_extension() {
        assert_eq!(output_name("photo.jpeg", "webp"), "photo.webp");
        assert_eq!(output_name("photo.JPG", "png"), "photo.png");
    }

    #[test]
    fn only_last_suffix_is_stripped() {
        assert_eq!(output_name("archive.tar.gz", "png"), "archive.tar.png");
    }

    #[test]
    fn no_extension_appends() {
        assert_eq!(output_name("noext", "jpg"), "noext.jpg");
    }

    #[test]
    fn trailing_dot_is_kept() {
        assert_eq!(output_name("odd.", "jpg"), "odd..jpg");
    }

    #[test]
    fn dotfile_name_is_treated_as_extension() {
        // ".bashrc" has one suffix and nothing before it
        assert_eq!(output_name(".bashrc", "jpg"), ".jpg");
    }

    #[test]
    fn error_name_keeps_original() {
        assert_eq!(error_name("img.heic"), "img.heic.ERROR.txt");
    }

    #[test]
    fn media_types_by_extension() {
        assert_eq!(media_type_for("a.JPG"), "image/jpeg");
        assert_eq!(media_type_for("a.tif"), "image/tiff");
        assert_eq!(media_type_for("a.heic"), "image/heic");
        assert_eq!(media_type_for("a.ico"), "image/x-icon");
        assert_eq!(media_type_for("a.unknown"), "application/octet-stream");
        assert_eq!(media_type_for("noext"), "application/octet-stream");
    }
}
