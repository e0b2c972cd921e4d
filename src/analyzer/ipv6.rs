//! Uncompressed IPv6 header analyzer.
//!
//! Claims the 6LoWPAN uncompressed-IPv6 dispatch (RFC 4944) and summarizes
//! the fixed 40-byte header. Also hosts the textual IPv6 address renderer
//! shared with the header-compression analyzer.

use super::{Level, Packet, PacketAnalyzer, Verdict};

/// 6LoWPAN dispatch value for an uncompressed IPv6 header.
const IPV6_DISPATCH: u8 = 0x41;

/// Fixed IPv6 header length.
const HEADER_LEN: usize = 40;

/// Render an IPv6 address with the longest zero run compressed to `::`.
pub(crate) fn format_address(addr: &[u8; 16]) -> String {
    let groups: Vec<u16> = addr.chunks(2).map(|c| u16::from_be_bytes([c[0], c[1]])).collect();

    let mut best_start = 0;
    let mut best_len = 0;
    let mut run_start = 0;
    let mut run_len = 0;
    for (i, g) in groups.iter().enumerate() {
        if *g == 0 {
            if run_len == 0 {
                run_start = i;
            }
            run_len += 1;
            if run_len > best_len {
                best_len = run_len;
                best_start = run_start;
            }
        } else {
            run_len = 0;
        }
    }

    let hex = |gs: &[u16]| gs.iter().map(|g| format!("{:x}", g)).collect::<Vec<_>>().join(":");
    if best_len < 2 {
        hex(&groups)
    } else {
        format!("{}::{}", hex(&groups[..best_start]), hex(&groups[best_start + best_len..]))
    }
}

pub struct Ipv6Analyzer;

impl Ipv6Analyzer {
    pub fn new() -> Self {
        Self
    }
}

impl PacketAnalyzer for Ipv6Analyzer {
    fn matches(&self, packet: &Packet<'_>) -> bool {
        packet.level == Level::Network && packet.peek(0) == Some(IPV6_DISPATCH)
    }

    fn analyze(&mut self, packet: &mut Packet<'_>, brief: &mut String, verbose: &mut String) -> Verdict {
        let buf = packet.remaining();
        let Some(header) = buf.get(1..1 + HEADER_LEN) else {
            return Verdict::Failed;
        };
        if header[0] >> 4 != 6 {
            return Verdict::Failed;
        }
        let payload_len = u16::from_be_bytes([header[4], header[5]]);
        let next_header = header[6];
        let hop_limit = header[7];
        let mut src = [0u8; 16];
        src.copy_from_slice(&header[8..24]);
        let mut dst = [0u8; 16];
        dst.copy_from_slice(&header[24..40]);

        if packet.consume(1 + HEADER_LEN).is_none() {
            return Verdict::Failed;
        }
        packet.level = Level::Application;
        packet.last_dispatch = next_header;

        brief.push_str("IPv6");
        verbose.push_str(&format!(
            "IPv6 {} -> {}\nNext header: {}, hop limit: {}, payload length: {}",
            format_address(&src),
            format_address(&dst),
            next_header,
            hop_limit,
            payload_len
        ));
        Verdict::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_address_compresses_longest_run() {
        let mut addr = [0u8; 16];
        addr[0] = 0xfe;
        addr[1] = 0x80;
        addr[15] = 0x01;
        assert_eq!(format_address(&addr), "fe80::1");
    }

    #[test]
    fn test_format_address_all_zero() {
        assert_eq!(format_address(&[0u8; 16]), "::");
    }

    #[test]
    fn test_format_address_no_compressible_run() {
        let addr = [0, 1, 0, 2, 0, 3, 0, 4, 0, 5, 0, 6, 0, 7, 0, 8];
        assert_eq!(format_address(&addr), "1:2:3:4:5:6:7:8");
    }

    #[test]
    fn test_header_summary() {
        let mut data = vec![IPV6_DISPATCH, 0x60, 0, 0, 0];
        data.extend_from_slice(&[0, 8]); // payload length
        data.push(58); // next header
        data.push(64); // hop limit
        let mut src = [0u8; 16];
        src[0] = 0xfe;
        src[1] = 0x80;
        src[15] = 0x01;
        let mut dst = [0u8; 16];
        dst[0] = 0xff;
        dst[1] = 0x02;
        dst[15] = 0x1a;
        data.extend_from_slice(&src);
        data.extend_from_slice(&dst);
        data.extend_from_slice(&[0xaa; 8]);

        let mut packet = Packet::new(&data);
        packet.level = Level::Network;
        assert!(Ipv6Analyzer::new().matches(&packet));

        let mut brief = String::new();
        let mut verbose = String::new();
        let verdict = Ipv6Analyzer::new().analyze(&mut packet, &mut brief, &mut verbose);
        assert_eq!(verdict, Verdict::Continue);
        assert_eq!(brief, "IPv6");
        assert!(verbose.contains("fe80::1 -> ff02::1a"));
        assert!(verbose.contains("Next header: 58, hop limit: 64"));
        assert_eq!(packet.last_dispatch, 58);
        assert_eq!(packet.remaining_len(), 8);
    }

    #[test]
    fn test_truncated_header_fails() {
        let data = [IPV6_DISPATCH, 0x60, 0x00];
        let mut packet = Packet::new(&data);
        packet.level = Level::Network;
        let mut brief = String::new();
        let mut verbose = String::new();
        assert_eq!(
            Ipv6Analyzer::new().analyze(&mut packet, &mut brief, &mut verbose),
            Verdict::Failed
        );
        assert!(brief.is_empty());
        assert_eq!(packet.remaining_len(), 3);
    }
}
