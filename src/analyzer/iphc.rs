//! 6LoWPAN IPHC header-compression analyzer (RFC 6282).
//!
//! Reconstructs enough of the compressed IPv6 header for a summary: traffic
//! class/flow label lengths, next header, hop limit, and source/destination
//! addresses (stateless and multicast modes; elided addresses are rebuilt
//! from the link-layer addresses recorded by the link analyzer). The NHC
//! UDP encoding is decoded for its ports; other NHC encodings are left to
//! the trailing payload dump.

use super::{Level, LinkAddress, Packet, PacketAnalyzer, Verdict};
use crate::analyzer::ipv6::format_address;

/// IPHC dispatch: `011xxxxx`.
const DISPATCH_MASK: u8 = 0xe0;
const DISPATCH: u8 = 0x60;

/// NHC UDP encoding: `11110CPP`.
const NHC_UDP_MASK: u8 = 0xf8;
const NHC_UDP: u8 = 0xf0;

const PROTO_UDP: u8 = 17;

struct ParsedIphc {
    consumed: usize,
    tf: u8,
    next_header: Option<u8>,
    hop_limit: u8,
    src: [u8; 16],
    dst: [u8; 16],
    udp_ports: Option<(u16, u16)>,
}

fn take<'a>(buf: &'a [u8], idx: &mut usize, count: usize) -> Option<&'a [u8]> {
    let slice = buf.get(*idx..*idx + count)?;
    *idx += count;
    Some(slice)
}

/// Rebuild a unicast address from its compressed form.
fn unicast(buf: &[u8], idx: &mut usize, stateful: bool, mode: u8, ll: Option<LinkAddress>) -> Option<[u8; 16]> {
    let mut addr = [0u8; 16];
    if !stateful {
        match mode {
            0 => addr.copy_from_slice(take(buf, idx, 16)?),
            1 => {
                addr[0] = 0xfe;
                addr[1] = 0x80;
                addr[8..16].copy_from_slice(take(buf, idx, 8)?);
            }
            2 => {
                addr[0] = 0xfe;
                addr[1] = 0x80;
                addr[11] = 0xff;
                addr[12] = 0xfe;
                let b = take(buf, idx, 2)?;
                addr[14] = b[0];
                addr[15] = b[1];
            }
            _ => {
                addr[0] = 0xfe;
                addr[1] = 0x80;
                if let Some(ll) = ll {
                    addr[8..16].copy_from_slice(&ll.interface_id());
                }
            }
        }
    } else {
        // Context-based compression without a context table: the prefix
        // stays zero, only the interface identifier is reconstructed.
        match mode {
            0 => {} // the unspecified address
            1 => addr[8..16].copy_from_slice(take(buf, idx, 8)?),
            2 => {
                addr[11] = 0xff;
                addr[12] = 0xfe;
                let b = take(buf, idx, 2)?;
                addr[14] = b[0];
                addr[15] = b[1];
            }
            _ => {
                if let Some(ll) = ll {
                    addr[8..16].copy_from_slice(&ll.interface_id());
                }
            }
        }
    }
    Some(addr)
}

/// Rebuild a multicast destination from its compressed form.
fn multicast(buf: &[u8], idx: &mut usize, stateful: bool, mode: u8) -> Option<[u8; 16]> {
    if stateful {
        return None;
    }
    let mut addr = [0u8; 16];
    addr[0] = 0xff;
    match mode {
        0 => addr.copy_from_slice(take(buf, idx, 16)?),
        1 => {
            let b = take(buf, idx, 6)?;
            addr[1] = b[0];
            addr[11..16].copy_from_slice(&b[1..6]);
        }
        2 => {
            let b = take(buf, idx, 4)?;
            addr[1] = b[0];
            addr[13..16].copy_from_slice(&b[1..4]);
        }
        _ => {
            addr[1] = 0x02;
            addr[15] = take(buf, idx, 1)?[0];
        }
    }
    Some(addr)
}

fn parse(buf: &[u8], ll_sender: Option<LinkAddress>, ll_receiver: Option<LinkAddress>) -> Option<ParsedIphc> {
    let b0 = *buf.first()?;
    let b1 = *buf.get(1)?;
    let tf = (b0 >> 3) & 0x03;
    let nh_compressed = b0 & 0x04 != 0;
    let hlim_bits = b0 & 0x03;
    let cid = b1 & 0x80 != 0;
    let sac = b1 & 0x40 != 0;
    let sam = (b1 >> 4) & 0x03;
    let mcast = b1 & 0x08 != 0;
    let dac = b1 & 0x04 != 0;
    let dam = b1 & 0x03;

    let mut idx = 2;
    if cid {
        take(buf, &mut idx, 1)?;
    }
    let tf_len = match tf {
        0 => 4,
        1 => 3,
        2 => 1,
        _ => 0,
    };
    take(buf, &mut idx, tf_len)?;

    let mut next_header = if nh_compressed {
        None
    } else {
        Some(take(buf, &mut idx, 1)?[0])
    };
    let hop_limit = match hlim_bits {
        0 => take(buf, &mut idx, 1)?[0],
        1 => 1,
        2 => 64,
        _ => 255,
    };

    let src = unicast(buf, &mut idx, sac, sam, ll_sender)?;
    let dst = if mcast {
        multicast(buf, &mut idx, dac, dam)?
    } else {
        unicast(buf, &mut idx, dac, dam, ll_receiver)?
    };

    let mut udp_ports = None;
    if nh_compressed {
        if let Some(&nhc) = buf.get(idx) {
            if nhc & NHC_UDP_MASK == NHC_UDP {
                idx += 1;
                let ports = match nhc & 0x03 {
                    0 => {
                        let b = take(buf, &mut idx, 4)?;
                        (u16::from_be_bytes([b[0], b[1]]), u16::from_be_bytes([b[2], b[3]]))
                    }
                    1 => {
                        let b = take(buf, &mut idx, 3)?;
                        (u16::from_be_bytes([b[0], b[1]]), 0xf000 + b[2] as u16)
                    }
                    2 => {
                        let b = take(buf, &mut idx, 3)?;
                        (0xf000 + b[0] as u16, u16::from_be_bytes([b[1], b[2]]))
                    }
                    _ => {
                        let b = take(buf, &mut idx, 1)?;
                        (0xf0b0 + (b[0] >> 4) as u16, 0xf0b0 + (b[0] & 0x0f) as u16)
                    }
                };
                if nhc & 0x04 == 0 {
                    take(buf, &mut idx, 2)?; // inline checksum
                }
                next_header = Some(PROTO_UDP);
                udp_ports = Some(ports);
            }
        }
    }

    Some(ParsedIphc {
        consumed: idx,
        tf,
        next_header,
        hop_limit,
        src,
        dst,
        udp_ports,
    })
}

pub struct IphcAnalyzer;

impl IphcAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl PacketAnalyzer for IphcAnalyzer {
    fn matches(&self, packet: &Packet<'_>) -> bool {
        packet.level == Level::Network && packet.peek(0).is_some_and(|b| b & DISPATCH_MASK == DISPATCH)
    }

    fn analyze(&mut self, packet: &mut Packet<'_>, brief: &mut String, verbose: &mut String) -> Verdict {
        let Some(parsed) = parse(packet.remaining(), packet.ll_sender, packet.ll_receiver) else {
            return Verdict::Failed;
        };
        if packet.consume(parsed.consumed).is_none() {
            return Verdict::Failed;
        }
        packet.level = Level::Application;
        packet.last_dispatch = parsed.next_header.unwrap_or(0);

        brief.push_str("IPHC");
        if parsed.udp_ports.is_some() {
            brief.push_str(" UDP");
        }

        let nh_string = match parsed.next_header {
            Some(nh) => nh.to_string(),
            None => "compressed".to_string(),
        };
        verbose.push_str(&format!(
            "IPHC TF:{} NH:{} HLIM:{}",
            parsed.tf, nh_string, parsed.hop_limit
        ));
        verbose.push_str(&format!(
            "\nFrom {} to {}",
            format_address(&parsed.src),
            format_address(&parsed.dst)
        ));
        if let Some((sport, dport)) = parsed.udp_ports {
            verbose.push_str(&format!("\nUDP {} -> {}", sport, dport));
        }
        Verdict::Continue
    }
}
