//! Algorithm detection (spec §4.9): header-based, falling back to
//! extension-based when the header cannot be parsed.

use std::fs::File;
use std::path::Path;

use tracing::debug;

use crate::algorithm;
use crate::header::{self, HEADER_SIZE, Header};

/// Detect the algorithm tag of a (possibly encrypted) file.
///
/// Per spec §4.9, three outcomes are distinguished:
/// - the file is too small to hold a header: returns `("", None)`
///   immediately, with **no** extension fallback;
/// - the header is present and parses: returns `(tag, Some(header))`;
/// - the file is large enough but the header is invalid (bad magic or
///   version): falls back to looking up the file's extension in the
///   algorithm/extension map.
///
/// Returns `("", None)` if nothing matches, or if any other I/O error
/// occurs (logged at debug level, per spec §4.9).
#[must_use]
pub fn detect(path: &Path) -> (String, Option<Header>) {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "detect: could not open file");
            return (String::new(), None);
        }
    };

    let len = match file.metadata() {
        Ok(metadata) => metadata.len(),
        Err(err) => {
            debug!(path = %path.display(), error = %err, "detect: could not read file metadata");
            return (String::new(), None);
        }
    };

    if len < HEADER_SIZE as u64 {
        return (String::new(), None);
    }

    match Header::read(&mut file) {
        Ok(header) => (tag_str(&header), Some(header)),
        Err(_) => detect_by_extension(path),
    }
}

fn detect_by_extension(path: &Path) -> (String, Option<Header>) {
    let Some(extension) = path.extension().and_then(|ext| ext.to_str()) else {
        return (String::new(), None);
    };
    match algorithm::tag_for_extension(extension) {
        Some(tag) => (tag_str_from(&tag), None),
        None => {
            debug!(extension, "detect: extension not recognized");
            (String::new(), None)
        }
    }
}

fn tag_str(header: &Header) -> String {
    tag_str_from(&header.tag)
}

fn tag_str_from(tag: &header::Tag) -> String {
    String::from_utf8_lossy(tag).into_owned()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::algorithm::CipherKind;

    #[test]
    fn detects_from_valid_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.veil");
        let header = Header::new(CipherKind::ChaCha20.tag(), 0);
        std::fs::write(&path, header.to_byte_array()).unwrap();

        let (tag, parsed) = detect(&path);
        assert_eq!(tag, "CC20");
        assert!(parsed.is_some());
    }

    #[test]
    fn falls_back_to_extension_on_bad_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.cc20");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"not a valid header at all, but long enough").unwrap();

        let (tag, header) = detect(&path);
        assert_eq!(tag, "CC20");
        assert!(header.is_none());
    }

    #[test]
    fn returns_empty_when_nothing_matches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mystery.bin");
        std::fs::write(&path, b"short").unwrap();

        let (tag, header) = detect(&path);
        assert_eq!(tag, "");
        assert!(header.is_none());
    }

    #[test]
    fn missing_file_returns_empty() {
        let (tag, header) = detect(Path::new("/nonexistent/path/to/nowhere"));
        assert_eq!(tag, "");
        assert!(header.is_none());
    }

    #[test]
    fn too_small_file_skips_extension_fallback_even_with_recognized_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.cc20");
        std::fs::write(&path, [0u8; 5]).unwrap();

        let (tag, header) = detect(&path);
        assert_eq!(tag, "");
        assert!(header.is_none());
    }
}
