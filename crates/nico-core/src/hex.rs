//! Hex codec for the debug monitor wire protocol
//!
//! The monitor speaks upper-case ASCII hex: numbers are sent as fixed-width
//! digit strings, most significant digit first, and every byte it returns is
//! exactly two hex characters.

use crate::error::{Error, Result};

/// Encode the low `digits` nibbles of `value` as upper-case hex
pub fn encode(value: u32, digits: usize) -> String {
    let mask = if digits >= 8 {
        u32::MAX
    } else {
        (1u32 << (4 * digits)) - 1
    };
    format!("{:0width$X}", value & mask, width = digits)
}

/// Decode one two-character hex token into a byte
pub fn decode_byte(token: &[u8]) -> Result<u8> {
    let text = core::str::from_utf8(token)
        .map_err(|_| Error::BadReply(String::from_utf8_lossy(token).into_owned()))?;
    if text.len() != 2 || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::BadReply(text.to_string()));
    }
    u8::from_str_radix(text, 16).map_err(|_| Error::BadReply(text.to_string()))
}

/// Parse a user-supplied number that must fit in `bits` bits
///
/// Accepts `0x`/`0X` hex, `0o`/`0O` or leading-zero octal, `0b`/`0B`
/// binary, and plain decimal.
pub fn parse_number(s: &str, bits: u32) -> Option<u32> {
    let (digits, radix) = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (hex, 16)
    } else if let Some(oct) = s.strip_prefix("0o").or_else(|| s.strip_prefix("0O")) {
        (oct, 8)
    } else if let Some(bin) = s.strip_prefix("0b").or_else(|| s.strip_prefix("0B")) {
        (bin, 2)
    } else if s.len() > 1 && s.starts_with('0') {
        (&s[1..], 8)
    } else {
        (s, 10)
    };

    // from_str_radix accepts a leading sign
    if digits.is_empty() || digits.starts_with(|c: char| c == '+' || c == '-') {
        return None;
    }

    let value = u64::from_str_radix(digits, radix).ok()?;
    if bits < 32 && value >= 1u64 << bits {
        return None;
    }
    u32::try_from(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_fixed_width() {
        assert_eq!(encode(0x5555, 4), "5555");
        assert_eq!(encode(0x0A, 2), "0A");
        assert_eq!(encode(0, 4), "0000");
        assert_eq!(encode(0xABCDEF, 6), "ABCDEF");
    }

    #[test]
    fn test_encode_truncates_to_width() {
        // Only the low nibbles are sent, like a bank byte taken from a 24-bit address
        assert_eq!(encode(0x12_3456, 4), "3456");
        assert_eq!(encode(0x1FF, 2), "FF");
    }

    #[test]
    fn test_decode_byte() {
        assert_eq!(decode_byte(b"00").unwrap(), 0x00);
        assert_eq!(decode_byte(b"7f").unwrap(), 0x7F);
        assert_eq!(decode_byte(b"FF").unwrap(), 0xFF);
        assert!(decode_byte(b"G0").is_err());
        assert!(decode_byte(b"1").is_err());
        assert!(decode_byte(b"+1").is_err());
    }

    #[test]
    fn test_parse_number_bases() {
        assert_eq!(parse_number("4096", 24), Some(4096));
        assert_eq!(parse_number("0x1000", 24), Some(0x1000));
        assert_eq!(parse_number("0X1f", 24), Some(0x1F));
        assert_eq!(parse_number("010", 24), Some(8));
        assert_eq!(parse_number("0o17", 24), Some(15));
        assert_eq!(parse_number("0b101", 24), Some(5));
        assert_eq!(parse_number("0", 8), Some(0));
    }

    #[test]
    fn test_parse_number_range() {
        assert_eq!(parse_number("0xFFFFFF", 24), Some(0xFF_FFFF));
        assert_eq!(parse_number("0x1000000", 24), None);
        assert_eq!(parse_number("255", 8), Some(255));
        assert_eq!(parse_number("256", 8), None);
    }

    #[test]
    fn test_parse_number_rejects_garbage() {
        assert_eq!(parse_number("", 24), None);
        assert_eq!(parse_number("0x", 24), None);
        assert_eq!(parse_number("12z", 24), None);
        assert_eq!(parse_number("-1", 24), None);
        assert_eq!(parse_number("08", 24), None);
    }
}
