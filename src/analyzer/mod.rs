//! Layered packet analysis.
//!
//! Provides the decode infrastructure shared by all layer analyzers:
//! - `Packet`: bounds-checked cursor over a raw payload buffer
//! - `PacketAnalyzer`: the capability implemented by each protocol layer
//! - `AnalyzerPipeline`: the layer-by-layer decode loop producing a brief
//!   one-line summary and a verbose multi-section report
//!
//! ## Module Organization
//!
//! - `ieee802154`: IEEE 802.15.4 link layer (plain and pcap-capturing)
//! - `iphc`: 6LoWPAN IPHC header compression
//! - `ipv6`: uncompressed IPv6 headers
//! - `icmpv6`: ICMPv6 messages including RPL control traffic
//! - `pcap_sink`: append-only capture file side-channel
//! - `profile`: named analyzer suite registry

pub mod icmpv6;
pub mod ieee802154;
pub mod iphc;
pub mod ipv6;
pub mod pcap_sink;
pub mod profile;

use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::formatter;

/// Bytes of undecoded trailing payload shown in the brief summary.
const BRIEF_PAYLOAD_PREVIEW: usize = 4;

/// Logical protocol level the cursor is currently positioned at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Start of the buffer; link-layer headers expected.
    Link,
    /// Link layer consumed; network-layer dispatch expected.
    Network,
    /// Network layer consumed; transport/application data expected.
    Application,
}

/// Link-layer address recorded by the link analyzer for use by header
/// decompression further up the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAddress {
    /// 16-bit short address.
    Short([u8; 2]),
    /// 64-bit extended address.
    Extended([u8; 8]),
}

impl LinkAddress {
    /// Interface identifier derived from this address (RFC 4944 §6 /
    /// RFC 6282), used when a compressed IPv6 address is fully elided.
    pub fn interface_id(&self) -> [u8; 8] {
        match self {
            LinkAddress::Short([a, b]) => [0, 0, 0, 0xff, 0xfe, 0, *a, *b],
            LinkAddress::Extended(eui) => {
                let mut iid = *eui;
                iid[0] ^= 0x02;
                iid
            }
        }
    }
}

/// Outcome of one analyzer round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// More layers may apply to the remaining bytes.
    Continue,
    /// Authoritative terminal layer; stop even if bytes remain.
    Final,
    /// Matched but could not decode; stop.
    Failed,
}

/// Cursor over a raw payload buffer.
///
/// All reads are bounds-checked; analyzers advance the cursor only through
/// `consume`, which refuses to move past the end of the buffer.
pub struct Packet<'a> {
    data: &'a [u8],
    pos: usize,
    pub level: Level,
    /// Protocol discriminator left behind by the most recent layer
    /// (e.g. the IPv6 next-header value) for the next round's `matches`.
    pub last_dispatch: u8,
    pub ll_sender: Option<LinkAddress>,
    pub ll_receiver: Option<LinkAddress>,
}

impl<'a> Packet<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            level: Level::Link,
            last_dispatch: 0,
            ll_sender: None,
            ll_receiver: None,
        }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    pub fn remaining_len(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn has_more_data(&self) -> bool {
        self.pos < self.data.len()
    }

    /// Read a byte at `offset` from the current position without consuming.
    pub fn peek(&self, offset: usize) -> Option<u8> {
        self.data.get(self.pos + offset).copied()
    }

    /// Consume `count` bytes, returning them, or `None` if fewer remain.
    pub fn consume(&mut self, count: usize) -> Option<&'a [u8]> {
        if self.remaining_len() < count {
            return None;
        }
        let slice = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Some(slice)
    }

    fn position(&self) -> usize {
        self.pos
    }
}

/// Capability implemented by each protocol layer analyzer.
pub trait PacketAnalyzer {
    /// Cheap predicate on the next bytes; must not mutate the cursor.
    fn matches(&self, packet: &Packet<'_>) -> bool;

    /// Consume a prefix of the remaining bytes, appending a token to
    /// `brief` and a block to `verbose`. Must advance the cursor by at
    /// least the bytes it claims to have decoded and never past the
    /// buffer end.
    fn analyze(&mut self, packet: &mut Packet<'_>, brief: &mut String, verbose: &mut String) -> Verdict;
}

/// Ordered list of analyzers making up one analyzer profile.
pub type AnalyzerList = Vec<Box<dyn PacketAnalyzer + Send>>;

/// Result of one decode pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub brief: String,
    pub verbose: String,
}

/// Drives the layer-by-layer decode loop over an ordered analyzer list.
pub struct AnalyzerPipeline {
    analyzers: AnalyzerList,
}

impl AnalyzerPipeline {
    pub fn new(analyzers: AnalyzerList) -> Self {
        Self { analyzers }
    }

    /// The "no analysis" pipeline: every buffer falls back to raw hex.
    pub fn empty() -> Self {
        Self { analyzers: Vec::new() }
    }

    /// Decode `data` into a brief one-line summary and a verbose report.
    ///
    /// Never fails: a buffer no analyzer claims (or an empty profile, or
    /// an empty buffer) yields the raw fallback `"{len}: 0x{preview}"`
    /// with empty verbose. A panicking analyzer is logged and treated as
    /// a failed round; output committed by earlier rounds is retained.
    pub fn run(&mut self, data: &[u8]) -> Decoded {
        let mut brief = String::new();
        let mut verbose = String::new();
        let mut packet = Packet::new(data);

        'decode: while packet.has_more_data() {
            let mut matched = false;
            for analyzer in self.analyzers.iter_mut() {
                let claims = match catch_unwind(AssertUnwindSafe(|| analyzer.matches(&packet))) {
                    Ok(c) => c,
                    Err(_) => {
                        log::warn!("analyzer match fault at level {:?}, stopping decode", packet.level);
                        break 'decode;
                    }
                };
                if !claims {
                    continue;
                }
                matched = true;

                // Each round decodes into scratch buffers that are only
                // committed on a clean return, so a fault cannot leave a
                // half-written token behind.
                let mut round_brief = String::new();
                let mut round_verbose = String::new();
                let pos_before = packet.position();
                let verdict = catch_unwind(AssertUnwindSafe(|| {
                    analyzer.analyze(&mut packet, &mut round_brief, &mut round_verbose)
                }));
                let verdict = match verdict {
                    Ok(v) => v,
                    Err(_) => {
                        log::warn!("analyzer fault at level {:?}, stopping decode", packet.level);
                        break 'decode;
                    }
                };

                let appended = !round_brief.is_empty() || !round_verbose.is_empty();
                brief.push_str(&round_brief);
                verbose.push_str(&round_verbose);
                if appended && packet.has_more_data() {
                    if !brief.is_empty() {
                        brief.push('|');
                    }
                    if !verbose.is_empty() {
                        verbose.push('\n');
                    }
                }

                if verdict != Verdict::Continue {
                    break 'decode;
                }
                if packet.position() == pos_before {
                    // Contract violation; bail out rather than loop forever.
                    log::warn!("analyzer consumed no bytes at level {:?}, stopping decode", packet.level);
                    break 'decode;
                }
                break;
            }
            if !matched {
                break;
            }
        }

        if brief.is_empty() {
            return Decoded {
                brief: format!("{}: 0x{}", data.len(), formatter::to_hex(data, BRIEF_PAYLOAD_PREVIEW)),
                verbose: String::new(),
            };
        }

        if packet.has_more_data() {
            let payload = packet.remaining();
            brief.push_str(&formatter::to_hex(payload, BRIEF_PAYLOAD_PREVIEW));
            if !verbose.is_empty() {
                verbose.push('\n');
            }
            verbose.push_str(&format!("Payload ({} bytes)\n{}", payload.len(), formatter::hex_dump(payload)));
        }

        Decoded { brief, verbose }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Claims every buffer at link level, consumes one byte per round.
    struct OneByteAnalyzer {
        verdict: Verdict,
    }

    impl PacketAnalyzer for OneByteAnalyzer {
        fn matches(&self, packet: &Packet<'_>) -> bool {
            packet.level == Level::Link
        }

        fn analyze(&mut self, packet: &mut Packet<'_>, brief: &mut String, verbose: &mut String) -> Verdict {
            match packet.consume(1) {
                Some(b) => {
                    brief.push_str(&format!("B{:02x}", b[0]));
                    verbose.push_str(&format!("byte {:02x}", b[0]));
                    self.verdict
                }
                None => Verdict::Failed,
            }
        }
    }

    struct PanickingAnalyzer;

    impl PacketAnalyzer for PanickingAnalyzer {
        fn matches(&self, packet: &Packet<'_>) -> bool {
            packet.level == Level::Link
        }

        fn analyze(&mut self, _packet: &mut Packet<'_>, brief: &mut String, _verbose: &mut String) -> Verdict {
            brief.push_str("partial");
            panic!("boom");
        }
    }

    #[test]
    fn test_empty_profile_raw_fallback() {
        let mut pipeline = AnalyzerPipeline::empty();
        let decoded = pipeline.run(&[0xde, 0xad, 0xbe, 0xef, 0x01]);
        assert_eq!(decoded.brief, "5: 0xdeadbeef");
        assert_eq!(decoded.verbose, "");
    }

    #[test]
    fn test_empty_buffer_raw_fallback() {
        let mut pipeline = AnalyzerPipeline::new(vec![Box::new(OneByteAnalyzer {
            verdict: Verdict::Continue,
        })]);
        let decoded = pipeline.run(&[]);
        assert_eq!(decoded.brief, "0: 0x");
        assert_eq!(decoded.verbose, "");
    }

    #[test]
    fn test_continue_consumes_whole_buffer() {
        let mut pipeline = AnalyzerPipeline::new(vec![Box::new(OneByteAnalyzer {
            verdict: Verdict::Continue,
        })]);
        let decoded = pipeline.run(&[0x01, 0x02]);
        assert_eq!(decoded.brief, "B01|B02");
    }

    #[test]
    fn test_final_leaves_remainder_preview() {
        let mut pipeline = AnalyzerPipeline::new(vec![Box::new(OneByteAnalyzer {
            verdict: Verdict::Final,
        })]);
        let decoded = pipeline.run(&[0x01, 0xaa, 0xbb, 0xcc, 0xdd, 0xee]);
        // Final stops the loop but the trailing remainder is still shown,
        // truncated to four bytes, after the round separator.
        assert_eq!(decoded.brief, "B01|aabbccdd");
        assert!(decoded.verbose.contains("Payload (5 bytes)"));
    }

    #[test]
    fn test_panic_discards_partial_round_output() {
        let mut pipeline = AnalyzerPipeline::new(vec![Box::new(PanickingAnalyzer)]);
        let decoded = pipeline.run(&[0x11, 0x22]);
        // The faulting round's scratch output is discarded, leaving zero
        // tokens, which yields the raw fallback.
        assert_eq!(decoded.brief, "2: 0x1122");
    }

    #[test]
    fn test_no_matching_analyzer_raw_fallback() {
        struct NeverMatches;
        impl PacketAnalyzer for NeverMatches {
            fn matches(&self, _packet: &Packet<'_>) -> bool {
                false
            }
            fn analyze(&mut self, _p: &mut Packet<'_>, _b: &mut String, _v: &mut String) -> Verdict {
                Verdict::Failed
            }
        }
        let mut pipeline = AnalyzerPipeline::new(vec![Box::new(NeverMatches)]);
        let decoded = pipeline.run(&[0xab; 130]);
        assert_eq!(decoded.brief, "130: 0xabababab");
        assert_eq!(decoded.verbose, "");
    }

    #[test]
    fn test_decode_is_idempotent() {
        let mut pipeline = AnalyzerPipeline::new(vec![Box::new(OneByteAnalyzer {
            verdict: Verdict::Continue,
        })]);
        let data = [0x01, 0x02, 0x03];
        let first = pipeline.run(&data);
        let second = pipeline.run(&data);
        assert_eq!(first, second);
    }

    #[test]
    fn test_interface_id_from_short_address() {
        let iid = LinkAddress::Short([0x12, 0x34]).interface_id();
        assert_eq!(iid, [0, 0, 0, 0xff, 0xfe, 0, 0x12, 0x34]);
    }

    #[test]
    fn test_interface_id_flips_universal_bit() {
        let iid = LinkAddress::Extended([0x02, 1, 2, 3, 4, 5, 6, 7]).interface_id();
        assert_eq!(iid[0], 0x00);
    }
}
