/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! FIX checksum calculation.
//!
//! The CheckSum (10) value is the byte sum of everything preceding the
//! `10=` field, modulo 256, written as three zero-padded digits.

/// Calculates the checksum of the given bytes.
///
/// # Example
/// ```
/// use fixstatus_tagvalue::calculate_checksum;
///
/// assert_eq!(calculate_checksum(b"\x01\x02"), 3);
/// ```
#[inline]
#[must_use]
pub fn calculate_checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Formats a checksum as three ASCII digits.
#[inline]
#[must_use]
pub fn format_checksum(checksum: u8) -> [u8; 3] {
    [
        b'0' + checksum / 100,
        b'0' + (checksum / 10) % 10,
        b'0' + checksum % 10,
    ]
}

/// Parses a three-digit checksum value.
///
/// # Returns
/// `None` unless the input is exactly three ASCII digits with a value below 256.
#[inline]
#[must_use]
pub fn parse_checksum(bytes: &[u8]) -> Option<u8> {
    if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let value = bytes
        .iter()
        .fold(0u16, |acc, &b| acc * 10 + u16::from(b - b'0'));
    u8::try_from(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_checksum_wraps() {
        assert_eq!(calculate_checksum(b""), 0);
        assert_eq!(calculate_checksum(&[200, 100]), 44);
    }

    #[test]
    fn test_format_checksum() {
        assert_eq!(&format_checksum(0), b"000");
        assert_eq!(&format_checksum(7), b"007");
        assert_eq!(&format_checksum(255), b"255");
    }

    #[test]
    fn test_parse_checksum() {
        assert_eq!(parse_checksum(b"042"), Some(42));
        assert_eq!(parse_checksum(b"255"), Some(255));
        assert_eq!(parse_checksum(b"256"), None);
        assert_eq!(parse_checksum(b"42"), None);
        assert_eq!(parse_checksum(b"4a2"), None);
    }
}
