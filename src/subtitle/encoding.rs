//! Byte encoding sniffing for caption files.
//!
//! Downloaded captions are UTF-8, but hand-made ones found in local folders
//! are often Windows-1252, Latin-1 or UTF-16 with a BOM.

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use std::path::Path;
use tracing::debug;

use crate::error::{Result, SubfetchError};

/// Guess the encoding of `bytes`.
///
/// A byte order mark wins, then valid UTF-8, then a statistical guess.
/// Returns the encoding and the length of the BOM to skip.
pub fn sniff_encoding(bytes: &[u8]) -> (&'static Encoding, usize) {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return (encoding, bom_len);
    }
    if std::str::from_utf8(bytes).is_ok() {
        return (UTF_8, 0);
    }
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    (detector.guess(None, true), 0)
}

/// Decode caption bytes with the sniffed encoding.
///
/// Malformed input for the detected encoding is an error rather than being
/// replaced with U+FFFD.
pub fn decode_caption(bytes: &[u8]) -> std::result::Result<(String, &'static Encoding), String> {
    let (encoding, bom_len) = sniff_encoding(bytes);
    encoding
        .decode_without_bom_handling_and_without_replacement(&bytes[bom_len..])
        .map(|text| (text.into_owned(), encoding))
        .ok_or_else(|| format!("malformed {} data", encoding.name()))
}

/// Read and decode a caption file.
pub fn read_caption(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    let (text, encoding) = decode_caption(&bytes).map_err(|reason| SubfetchError::Decode {
        path: path.display().to_string(),
        reason,
    })?;
    debug!("Decoded {} as {}", path.display(), encoding.name());
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{UTF_16LE, WINDOWS_1252};

    #[test]
    fn test_plain_utf8() {
        let (text, enc) = decode_caption("¿Qué tal?".as_bytes()).unwrap();
        assert_eq!(text, "¿Qué tal?");
        assert_eq!(enc, UTF_8);
    }

    #[test]
    fn test_utf8_bom_is_stripped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"1\n");
        let (text, enc) = decode_caption(&bytes).unwrap();
        assert_eq!(text, "1\n");
        assert_eq!(enc, UTF_8);
    }

    #[test]
    fn test_utf16_with_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "Hola".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let (text, enc) = decode_caption(&bytes).unwrap();
        assert_eq!(text, "Hola");
        assert_eq!(enc, UTF_16LE);
    }

    #[test]
    fn test_legacy_single_byte() {
        let (bytes, _, _) = WINDOWS_1252.encode("Ceci est un café très célèbre, déjà vu à la télé.");
        let (text, _) = decode_caption(&bytes).unwrap();
        assert!(text.contains("café"));
    }

    #[test]
    fn test_malformed_after_bom_fails() {
        let bytes = [0xEF, 0xBB, 0xBF, b'a', 0xFF, 0xFE, b'b'];
        assert!(decode_caption(&bytes).is_err());
    }

    #[test]
    fn test_read_caption_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.srt");
        std::fs::write(&path, [0xEF, 0xBB, 0xBF, 0xC3, 0x28]).unwrap();

        match read_caption(&path) {
            Err(SubfetchError::Decode { path: p, .. }) => assert!(p.ends_with("bad.srt")),
            other => panic!("expected decode error, got {other:?}"),
        }
    }
}
