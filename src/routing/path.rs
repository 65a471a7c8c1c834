//! Path decoding for prefix comparison.
//!
//! # Design Decisions
//! - Comparison happens on decoded bytes, so `/api%2Fv2` matches `/api/v2`
//! - Invalid escapes are kept verbatim rather than rejected
//! - Decoded bytes need not be UTF-8; nothing here can fail

use std::borrow::Cow;

use percent_encoding::percent_decode_str;

/// Percent-decode a raw path.
pub fn decode_path(raw: &str) -> Cow<'_, [u8]> {
    percent_decode_str(raw).into()
}

/// Returns the leading part of `raw` whose decoded form equals `prefix`.
///
/// `None` when `raw` does not start with `prefix` once decoded.
pub fn encoded_prefix<'a>(raw: &'a str, prefix: &[u8]) -> Option<&'a str> {
    let bytes = raw.as_bytes();
    let mut offset = 0;
    for expected in prefix {
        let (byte, width) = decode_at(bytes, offset)?;
        if byte != *expected {
            return None;
        }
        offset += width;
    }
    raw.get(..offset)
}

fn decode_at(bytes: &[u8], offset: usize) -> Option<(u8, usize)> {
    let byte = *bytes.get(offset)?;
    if byte == b'%' {
        let hi = bytes.get(offset + 1).copied().and_then(hex_value);
        let lo = bytes.get(offset + 2).copied().and_then(hex_value);
        if let (Some(hi), Some(lo)) = (hi, lo) {
            return Some((hi << 4 | lo, 3));
        }
    }
    Some((byte, 1))
}

fn hex_value(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).map(|d| d as u8)
}
