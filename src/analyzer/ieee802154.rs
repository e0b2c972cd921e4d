//! IEEE 802.15.4 link-layer analyzer.
//!
//! Decodes the MAC frame control field, sequence number and addressing
//! fields of a PSDU (delivered without trailing FCS), records the link
//! addresses on the cursor for header decompression further up, and
//! optionally mirrors each decoded frame into a pcap capture file.

use super::{Level, LinkAddress, Packet, PacketAnalyzer, Verdict};
use crate::analyzer::pcap_sink::PcapSink;

/// MAC frame types (3-bit field in the frame control field).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameType {
    Beacon,
    Data,
    Ack,
    MacCommand,
}

impl FrameType {
    fn from_bits(v: u8) -> Option<Self> {
        match v & 0x07 {
            0 => Some(Self::Beacon),
            1 => Some(Self::Data),
            2 => Some(Self::Ack),
            3 => Some(Self::MacCommand),
            _ => None,
        }
    }

    fn letter(self) -> char {
        match self {
            Self::Beacon => 'B',
            Self::Data => 'D',
            Self::Ack => 'A',
            Self::MacCommand => 'C',
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Beacon => "BEACON",
            Self::Data => "DATA",
            Self::Ack => "ACK",
            Self::MacCommand => "CMD",
        }
    }
}

/// Parsed MAC header fields.
struct MacHeader {
    frame_type: FrameType,
    security: bool,
    pending: bool,
    ack_request: bool,
    seq: u8,
    dest_pan: Option<u16>,
    dest: Option<LinkAddress>,
    src_pan: Option<u16>,
    src: Option<LinkAddress>,
    header_len: usize,
}

/// Read a little-endian address field, returning it in display byte order.
fn read_address(buf: &[u8], idx: &mut usize, mode: u8) -> Option<Option<LinkAddress>> {
    match mode {
        0 => Some(None),
        2 => {
            let bytes = buf.get(*idx..*idx + 2)?;
            *idx += 2;
            Some(Some(LinkAddress::Short([bytes[1], bytes[0]])))
        }
        3 => {
            let bytes = buf.get(*idx..*idx + 8)?;
            *idx += 8;
            let mut addr = [0u8; 8];
            for (i, b) in bytes.iter().rev().enumerate() {
                addr[i] = *b;
            }
            Some(Some(LinkAddress::Extended(addr)))
        }
        _ => None,
    }
}

fn read_pan(buf: &[u8], idx: &mut usize) -> Option<u16> {
    let bytes = buf.get(*idx..*idx + 2)?;
    *idx += 2;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn parse_header(buf: &[u8]) -> Option<MacHeader> {
    let fcf0 = *buf.first()?;
    let fcf1 = *buf.get(1)?;
    let frame_type = FrameType::from_bits(fcf0)?;
    let security = fcf0 & 0x08 != 0;
    let pending = fcf0 & 0x10 != 0;
    let ack_request = fcf0 & 0x20 != 0;
    let pan_compression = fcf0 & 0x40 != 0;
    let dest_mode = (fcf1 >> 2) & 0x03;
    let src_mode = (fcf1 >> 6) & 0x03;
    let seq = *buf.get(2)?;

    let mut idx = 3;
    let mut dest_pan = None;
    let dest = if dest_mode != 0 {
        dest_pan = Some(read_pan(buf, &mut idx)?);
        read_address(buf, &mut idx, dest_mode)?
    } else {
        None
    };
    let mut src_pan = None;
    let src = if src_mode != 0 {
        if !pan_compression {
            src_pan = Some(read_pan(buf, &mut idx)?);
        }
        read_address(buf, &mut idx, src_mode)?
    } else {
        None
    };

    Some(MacHeader {
        frame_type,
        security,
        pending,
        ack_request,
        seq,
        dest_pan,
        dest,
        src_pan,
        src,
        header_len: idx,
    })
}

fn format_address(addr: Option<LinkAddress>) -> String {
    match addr {
        None => "-".to_string(),
        Some(LinkAddress::Short([hi, lo])) => format!("{:02x}{:02x}", hi, lo),
        Some(LinkAddress::Extended(bytes)) => bytes
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(":"),
    }
}

fn format_pan(pan: Option<u16>) -> String {
    match pan {
        Some(p) => format!("0x{:04x}", p),
        None => "-".to_string(),
    }
}

/// Link-layer analyzer; `with_pcap` yields the capture-emitting variant.
pub struct Ieee802154Analyzer {
    pcap: Option<PcapSink>,
}

impl Ieee802154Analyzer {
    pub fn new() -> Self {
        Self { pcap: None }
    }

    pub fn with_pcap(sink: PcapSink) -> Self {
        Self { pcap: Some(sink) }
    }
}

impl PacketAnalyzer for Ieee802154Analyzer {
    fn matches(&self, packet: &Packet<'_>) -> bool {
        packet.level == Level::Link
    }

    fn analyze(&mut self, packet: &mut Packet<'_>, brief: &mut String, verbose: &mut String) -> Verdict {
        let frame = packet.remaining();
        let Some(header) = parse_header(frame) else {
            return Verdict::Failed;
        };
        if packet.consume(header.header_len).is_none() {
            return Verdict::Failed;
        }
        packet.level = Level::Network;
        packet.ll_sender = header.src;
        packet.ll_receiver = header.dest;

        if header.src.is_none() && header.dest.is_none() {
            brief.push_str(&format!("15.4 {}", header.frame_type.letter()));
        } else {
            brief.push_str(&format!(
                "15.4 {} {}->{}",
                header.frame_type.letter(),
                format_address(header.src),
                format_address(header.dest)
            ));
        }

        verbose.push_str(&format!("IEEE 802.15.4 {} #{}", header.frame_type.name(), header.seq));
        if header.src.is_some() || header.dest.is_some() {
            // With PAN compression the source shares the destination PAN.
            let src_pan = header.src_pan.or(header.dest_pan);
            verbose.push_str(&format!(
                "\nFrom {}/{} to {}/{}",
                format_pan(src_pan),
                format_address(header.src),
                format_pan(header.dest_pan),
                format_address(header.dest)
            ));
        }
        let mut flags = Vec::new();
        if header.security {
            flags.push("security");
        }
        if header.pending {
            flags.push("pending");
        }
        if header.ack_request {
            flags.push("ack requested");
        }
        if !flags.is_empty() {
            verbose.push_str(&format!("\nFlags: {}", flags.join(", ")));
        }

        if let Some(sink) = &mut self.pcap {
            if let Err(e) = sink.append(frame) {
                log::warn!("pcap capture write failed: {}", e);
            }
        }

        match header.frame_type {
            FrameType::Ack => Verdict::Final,
            _ => Verdict::Continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(data: &[u8]) -> (Verdict, Packet<'_>, String, String) {
        let mut packet = Packet::new(data);
        let mut brief = String::new();
        let mut verbose = String::new();
        let verdict = Ieee802154Analyzer::new().analyze(&mut packet, &mut brief, &mut verbose);
        (verdict, packet, brief, verbose)
    }

    // FCF 0x8861: data frame, ack requested, PAN compression,
    // short destination and source addresses.
    const DATA_FRAME: &[u8] = &[
        0x61, 0x88, 0x2a, // FCF + seq 42
        0xcd, 0xab, // dest PAN 0xabcd
        0xff, 0xff, // dest 0xffff
        0x01, 0x00, // src 0x0001
        0x41, // payload
    ];

    #[test]
    fn test_data_frame_short_addresses() {
        let (verdict, packet, brief, verbose) = analyze(DATA_FRAME);
        assert_eq!(verdict, Verdict::Continue);
        assert_eq!(brief, "15.4 D 0001->ffff");
        assert!(verbose.starts_with("IEEE 802.15.4 DATA #42"));
        assert!(verbose.contains("From 0xabcd/0001 to 0xabcd/ffff"));
        assert!(verbose.contains("ack requested"));
        assert_eq!(packet.remaining(), &[0x41]);
        assert_eq!(packet.level, Level::Network);
        assert_eq!(packet.ll_sender, Some(LinkAddress::Short([0x00, 0x01])));
        assert_eq!(packet.ll_receiver, Some(LinkAddress::Short([0xff, 0xff])));
    }

    #[test]
    fn test_ack_frame_is_final() {
        let (verdict, packet, brief, _) = analyze(&[0x02, 0x00, 0x05]);
        assert_eq!(verdict, Verdict::Final);
        assert_eq!(brief, "15.4 A");
        assert!(!packet.has_more_data());
    }

    #[test]
    fn test_extended_addresses() {
        // No PAN compression: dest PAN + extended dest, src PAN + extended src.
        let mut data = vec![0x01, 0xcc, 0x07];
        data.extend_from_slice(&[0x34, 0x12]); // dest PAN
        data.extend_from_slice(&[8, 7, 6, 5, 4, 3, 2, 1]); // dest, wire order
        data.extend_from_slice(&[0x34, 0x12]); // src PAN
        data.extend_from_slice(&[0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x11]);
        let (verdict, packet, brief, _) = analyze(&data);
        assert_eq!(verdict, Verdict::Continue);
        assert_eq!(brief, "15.4 D 11:02:03:04:05:06:07:08->01:02:03:04:05:06:07:08");
        assert_eq!(
            packet.ll_sender,
            Some(LinkAddress::Extended([0x11, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]))
        );
    }

    #[test]
    fn test_reserved_frame_type_fails_without_output() {
        let data = [0x04u8; 130];
        let (verdict, packet, brief, verbose) = analyze(&data);
        assert_eq!(verdict, Verdict::Failed);
        assert!(brief.is_empty());
        assert!(verbose.is_empty());
        assert_eq!(packet.remaining_len(), 130);
    }

    #[test]
    fn test_truncated_header_fails() {
        let (verdict, _, brief, _) = analyze(&[0x61, 0x88, 0x2a, 0xcd]);
        assert_eq!(verdict, Verdict::Failed);
        assert!(brief.is_empty());
    }
}
