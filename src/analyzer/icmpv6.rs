//! ICMPv6 analyzer.
//!
//! Summarizes the ICMPv6 type/code pair, naming echo, neighbor discovery
//! and RPL control messages; DIO bodies additionally surface instance,
//! version and rank. Terminal layer: nothing is decoded past it.

use super::{Level, Packet, PacketAnalyzer, Verdict};

/// IPv6 next-header value for ICMPv6.
const PROTO_ICMPV6: u8 = 58;

const TYPE_ECHO_REQUEST: u8 = 128;
const TYPE_ECHO_REPLY: u8 = 129;
const TYPE_ROUTER_SOLICITATION: u8 = 133;
const TYPE_ROUTER_ADVERTISEMENT: u8 = 134;
const TYPE_NEIGHBOR_SOLICITATION: u8 = 135;
const TYPE_NEIGHBOR_ADVERTISEMENT: u8 = 136;
const TYPE_RPL: u8 = 155;

fn rpl_code_name(code: u8) -> Option<&'static str> {
    match code {
        0x00 => Some("DIS"),
        0x01 => Some("DIO"),
        0x02 => Some("DAO"),
        0x03 => Some("DAO-ACK"),
        _ => None,
    }
}

pub struct Icmpv6Analyzer;

impl Icmpv6Analyzer {
    pub fn new() -> Self {
        Self
    }
}

impl PacketAnalyzer for Icmpv6Analyzer {
    fn matches(&self, packet: &Packet<'_>) -> bool {
        packet.level == Level::Application && packet.last_dispatch == PROTO_ICMPV6
    }

    fn analyze(&mut self, packet: &mut Packet<'_>, brief: &mut String, verbose: &mut String) -> Verdict {
        let buf = packet.remaining();
        if buf.len() < 4 {
            return Verdict::Failed;
        }
        let msg_type = buf[0];
        let code = buf[1];
        let checksum = u16::from_be_bytes([buf[2], buf[3]]);
        let mut consumed = 4;

        let name = match msg_type {
            TYPE_ECHO_REQUEST => "Echo Request",
            TYPE_ECHO_REPLY => "Echo Reply",
            TYPE_ROUTER_SOLICITATION => "Router Solicitation",
            TYPE_ROUTER_ADVERTISEMENT => "Router Advertisement",
            TYPE_NEIGHBOR_SOLICITATION => "Neighbor Solicitation",
            TYPE_NEIGHBOR_ADVERTISEMENT => "Neighbor Advertisement",
            TYPE_RPL => "RPL",
            _ => "Unknown",
        };

        match msg_type {
            TYPE_RPL => match rpl_code_name(code) {
                Some(rpl_name) => brief.push_str(&format!("RPL {}", rpl_name)),
                None => brief.push_str(&format!("RPL 0x{:02x}", code)),
            },
            TYPE_ECHO_REQUEST => brief.push_str("ICMPv6 ECHO REQ"),
            TYPE_ECHO_REPLY => brief.push_str("ICMPv6 ECHO RPLY"),
            TYPE_ROUTER_SOLICITATION => brief.push_str("ICMPv6 RS"),
            TYPE_ROUTER_ADVERTISEMENT => brief.push_str("ICMPv6 RA"),
            TYPE_NEIGHBOR_SOLICITATION => brief.push_str("ICMPv6 NS"),
            TYPE_NEIGHBOR_ADVERTISEMENT => brief.push_str("ICMPv6 NA"),
            _ => brief.push_str(&format!("ICMPv6 {}/{}", msg_type, code)),
        }

        verbose.push_str(&format!(
            "ICMPv6 {} type: {}, code: {}, checksum: 0x{:04x}",
            name, msg_type, code, checksum
        ));

        // DIO bodies carry routing state worth surfacing.
        if msg_type == TYPE_RPL && code == 0x01 && buf.len() >= 8 {
            let instance = buf[4];
            let version = buf[5];
            let rank = u16::from_be_bytes([buf[6], buf[7]]);
            consumed = 8;
            verbose.push_str(&format!(
                "\nRPL instance: {}, version: {}, rank: {}",
                instance, version, rank
            ));
        }

        if packet.consume(consumed).is_none() {
            return Verdict::Failed;
        }
        Verdict::Final
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn application_packet(data: &[u8]) -> Packet<'_> {
        let mut packet = Packet::new(data);
        packet.level = Level::Application;
        packet.last_dispatch = PROTO_ICMPV6;
        packet
    }

    #[test]
    fn test_echo_request() {
        let data = [128, 0, 0x12, 0x34];
        let mut packet = application_packet(&data);
        assert!(Icmpv6Analyzer::new().matches(&packet));

        let mut brief = String::new();
        let mut verbose = String::new();
        let verdict = Icmpv6Analyzer::new().analyze(&mut packet, &mut brief, &mut verbose);
        assert_eq!(verdict, Verdict::Final);
        assert_eq!(brief, "ICMPv6 ECHO REQ");
        assert!(verbose.contains("type: 128, code: 0, checksum: 0x1234"));
    }

    #[test]
    fn test_rpl_dio_body() {
        let data = [155, 1, 0x00, 0x00, 30, 2, 0x01, 0x00, 0xff];
        let mut packet = application_packet(&data);
        let mut brief = String::new();
        let mut verbose = String::new();
        let verdict = Icmpv6Analyzer::new().analyze(&mut packet, &mut brief, &mut verbose);
        assert_eq!(verdict, Verdict::Final);
        assert_eq!(brief, "RPL DIO");
        assert!(verbose.contains("RPL instance: 30, version: 2, rank: 256"));
        assert_eq!(packet.remaining(), &[0xff]);
    }

    #[test]
    fn test_does_not_match_other_protocols() {
        let data = [128, 0, 0, 0];
        let mut packet = Packet::new(&data);
        packet.level = Level::Application;
        packet.last_dispatch = 17;
        assert!(!Icmpv6Analyzer::new().matches(&packet));
    }

    #[test]
    fn test_short_message_fails() {
        let data = [155, 1];
        let mut packet = application_packet(&data);
        let mut brief = String::new();
        let mut verbose = String::new();
        assert_eq!(
            Icmpv6Analyzer::new().analyze(&mut packet, &mut brief, &mut verbose),
            Verdict::Failed
        );
    }
}
