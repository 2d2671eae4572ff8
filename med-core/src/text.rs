//! UTF-8 helpers for MED's fixed-width, zero-padded text fields.
//!
//! Every on-disk string field in MED is a fixed byte-width buffer holding
//! UTF-8 text followed by zero padding. These helpers convert between that
//! representation and owned `String`s without assuming a particular locale.

/// Decode a fixed-width, zero-padded UTF-8 field, stopping at the first NUL.
///
/// ```
/// use med_core::text::fixed_bytes_to_string;
/// let mut buf = [0u8; 8];
/// buf[..5].copy_from_slice(b"hello");
/// assert_eq!(fixed_bytes_to_string(&buf), "hello");
/// ```
pub fn fixed_bytes_to_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Encode `s` into a zero-padded buffer of exactly `width` bytes, truncating
/// on a UTF-8 character boundary if it does not fit.
///
/// ```
/// use med_core::text::string_to_fixed_bytes;
/// let buf = string_to_fixed_bytes("hi", 8);
/// assert_eq!(buf.len(), 8);
/// assert_eq!(&buf[..2], b"hi");
/// assert!(buf[2..].iter().all(|&b| b == 0));
/// ```
pub fn string_to_fixed_bytes(s: &str, width: usize) -> Vec<u8> {
    let mut out = vec![0u8; width];
    let src = s.as_bytes();
    if src.len() <= width {
        out[..src.len()].copy_from_slice(src);
        return out;
    }
    let mut cut = width;
    while cut > 0 && !s.is_char_boundary(cut) {
        cut -= 1;
    }
    out[..cut].copy_from_slice(&src[..cut]);
    out
}

/// Byte-offset to character-number translation for a well-formed UTF-8 slice.
pub fn byte_offset_to_char_number(s: &str, byte_offset: usize) -> usize {
    s.char_indices().take_while(|(i, _)| *i < byte_offset).count()
}

/// Character-number to byte-offset translation for a well-formed UTF-8 slice.
pub fn char_number_to_byte_offset(s: &str, char_number: usize) -> usize {
    s.char_indices()
        .nth(char_number)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_short_ascii() {
        let buf = string_to_fixed_bytes("abc", 16);
        assert_eq!(fixed_bytes_to_string(&buf), "abc");
    }

    #[test]
    fn truncates_on_char_boundary() {
        let s = "a\u{00e9}b"; // a, e-acute (2 bytes), b -- 4 bytes total
        let buf = string_to_fixed_bytes(s, 2);
        // cutting at byte 2 would split the 2-byte char starting at byte 1; must back off to 1
        assert_eq!(&buf, b"a\0");
    }

    #[test]
    fn char_offsets_round_trip() {
        let s = "héllo";
        for n in 0..s.chars().count() {
            let b = char_number_to_byte_offset(s, n);
            assert_eq!(byte_offset_to_char_number(s, b), n);
        }
    }
}
