//! Response charset lookup and decoding.
//!
//! Labels are resolved against the WHATWG encoding registry (`encoding_rs`),
//! so "UTF-8", "utf8", "latin1" and "windows-1252" are all accepted.

use encoding_rs::Encoding;
use std::fmt;

pub use encoding_rs::UTF_8 as DEFAULT_ENCODING;

/// Resolve a charset label. Returns `None` for unknown labels and for
/// labels the registry maps to `replacement`, which cannot decode anything.
pub fn lookup(label: &str) -> Option<&'static Encoding> {
    Encoding::for_label(label.as_bytes()).filter(|enc| *enc != encoding_rs::REPLACEMENT)
}

/// True if `label` names a known charset.
pub fn is_supported(label: &str) -> bool {
    lookup(label).is_some()
}

/// Response bytes were not valid in the request's charset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    pub encoding: &'static str,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Internal error: response is not valid {}", self.encoding)
    }
}

impl std::error::Error for DecodeError {}

/// Decode `bytes` strictly: malformed input is an error, not replaced.
pub fn decode(encoding: &'static Encoding, bytes: &[u8]) -> Result<String, DecodeError> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
        .ok_or(DecodeError {
            encoding: encoding.name(),
        })
}

/// Decode `bytes`, replacing malformed sequences. Used for error bodies,
/// which are reported as-is.
pub fn decode_lossy(encoding: &'static Encoding, bytes: &[u8]) -> String {
    let (text, _had_errors) = encoding.decode_without_bom_handling(bytes);
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_labels_resolve() {
        assert_eq!(lookup("UTF-8"), Some(encoding_rs::UTF_8));
        assert_eq!(lookup("utf8"), Some(encoding_rs::UTF_8));
        assert_eq!(lookup("ISO-8859-1"), Some(encoding_rs::WINDOWS_1252));
    }

    #[test]
    fn unknown_label_rejected() {
        assert!(!is_supported("not-a-real-charset"));
        assert!(!is_supported(""));
    }

    #[test]
    fn replacement_labels_rejected() {
        assert!(Encoding::for_label(b"iso-2022-kr").is_some());
        assert_eq!(lookup("iso-2022-kr"), None);
        assert!(!is_supported("hz-gb-2312"));
    }

    #[test]
    fn decode_strict_rejects_malformed_utf8() {
        let err = decode(encoding_rs::UTF_8, &[0x66, 0xff, 0x6f]).unwrap_err();
        assert_eq!(err.encoding, "UTF-8");
        assert!(err.to_string().starts_with("Internal error"));
    }

    #[test]
    fn decode_latin1_bytes() {
        let enc = lookup("latin1").unwrap();
        assert_eq!(decode(enc, &[0x63, 0x61, 0x66, 0xe9]).unwrap(), "café");
    }

    #[test]
    fn decode_lossy_replaces() {
        assert_eq!(decode_lossy(encoding_rs::UTF_8, &[0x61, 0xff]), "a\u{fffd}");
    }
}
