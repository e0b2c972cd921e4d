//! Hex rendering helpers for packet payloads.
//!
//! Provides the two render styles used by the log engine:
//! - `to_hex`: truncated one-line preview for brief summaries
//! - `hex_dump`: classic offset/hex/ascii dump for verbose reports
//!
//! plus `from_hex` for parsing payload strings from transcript files.

/// Bytes shown per hex dump row.
const DUMP_ROW_BYTES: usize = 16;

/// Render at most `max_bytes` bytes as contiguous lowercase hex.
///
/// Used for the brief preview of undecoded payload bytes; the caller
/// decides the truncation limit (the pipeline default is 4).
pub fn to_hex(data: &[u8], max_bytes: usize) -> String {
    let shown = data.len().min(max_bytes);
    let mut out = String::with_capacity(shown * 2);
    for b in &data[..shown] {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

/// Render a full hex dump: 16 bytes per row with a 4-digit offset, the hex
/// bytes split into two groups of eight, and an ASCII column.
///
/// Non-printable bytes render as `.` in the ASCII column. Every row,
/// including the last, is terminated with a newline. Empty input yields an
/// empty string.
pub fn hex_dump(data: &[u8]) -> String {
    let mut out = String::new();
    for (row, chunk) in data.chunks(DUMP_ROW_BYTES).enumerate() {
        out.push_str(&format!("{:04x}  ", row * DUMP_ROW_BYTES));
        for i in 0..DUMP_ROW_BYTES {
            if let Some(b) = chunk.get(i) {
                out.push_str(&format!("{:02x} ", b));
            } else {
                out.push_str("   ");
            }
            if i == 7 {
                out.push(' ');
            }
        }
        out.push(' ');
        for b in chunk {
            if b.is_ascii_graphic() || *b == b' ' {
                out.push(*b as char);
            } else {
                out.push('.');
            }
        }
        out.push('\n');
    }
    out
}

/// Parse a hex string into bytes.
///
/// Spaces and colons are accepted as separators and ignored. Returns `None`
/// for odd-length input or non-hex characters.
pub fn from_hex(s: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(s.len() / 2);
    let mut high: Option<u8> = None;
    for c in s.chars() {
        if c == ' ' || c == ':' {
            continue;
        }
        let nibble = c.to_digit(16)? as u8;
        match high.take() {
            None => high = Some(nibble),
            Some(h) => out.push((h << 4) | nibble),
        }
    }
    if high.is_some() {
        return None;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_hex_truncates() {
        assert_eq!(to_hex(&[0xde, 0xad, 0xbe, 0xef, 0x01], 4), "deadbeef");
        assert_eq!(to_hex(&[0x0a, 0x0b], 4), "0a0b");
        assert_eq!(to_hex(&[], 4), "");
    }

    #[test]
    fn test_hex_dump_single_row() {
        let dump = hex_dump(&[0x41, 0x42, 0x00]);
        assert!(dump.starts_with("0000  41 42 00 "));
        assert!(dump.ends_with(" AB.\n"));
        // offset (6) + 16 slots of 3 + mid gap + trailing gap + 3 ascii chars
        assert_eq!(dump.len(), 6 + 48 + 1 + 1 + 3 + 1);
    }

    #[test]
    fn test_hex_dump_two_rows() {
        let data: Vec<u8> = (0u8..18).collect();
        let dump = hex_dump(&data);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("0000  00 01 02 03 04 05 06 07  08 09 0a 0b 0c 0d 0e 0f"));
        assert!(lines[1].starts_with("0010  10 11"));
    }

    #[test]
    fn test_hex_dump_empty() {
        assert_eq!(hex_dump(&[]), "");
    }

    #[test]
    fn test_from_hex() {
        assert_eq!(from_hex("deadbeef"), Some(vec![0xde, 0xad, 0xbe, 0xef]));
        assert_eq!(from_hex("de:ad be ef"), Some(vec![0xde, 0xad, 0xbe, 0xef]));
        assert_eq!(from_hex(""), Some(vec![]));
        assert_eq!(from_hex("abc"), None);
        assert_eq!(from_hex("zz"), None);
    }
}
