//! Named analyzer suite registry.
//!
//! Maps profile names to ordered analyzer lists. The registry is populated
//! at startup (built-in suites plus any host-registered ones); the log
//! engine only ever consumes the resolved list, never performs loading
//! itself.

use std::collections::HashMap;
use std::path::PathBuf;

use super::icmpv6::Icmpv6Analyzer;
use super::ieee802154::Ieee802154Analyzer;
use super::iphc::IphcAnalyzer;
use super::ipv6::Ipv6Analyzer;
use super::pcap_sink::PcapSink;
use super::{AnalyzerList, AnalyzerPipeline};

/// No analysis: every record falls back to raw hex.
pub const PROFILE_NONE: &str = "none";
/// 802.15.4 -> IPHC -> IPv6 -> ICMPv6.
pub const PROFILE_6LOWPAN: &str = "6lowpan";
/// Same suite with the pcap-capturing link layer.
pub const PROFILE_6LOWPAN_PCAP: &str = "6lowpan-pcap";

type ProfileBuilder = Box<dyn Fn() -> AnalyzerList + Send>;

pub struct ProfileRegistry {
    builders: HashMap<String, ProfileBuilder>,
}

impl ProfileRegistry {
    /// Registry preloaded with the built-in suites. `pcap_path` configures
    /// the capture file used by the pcap-emitting suite; without it that
    /// suite degrades to the plain link-layer analyzer.
    pub fn with_builtin_profiles(pcap_path: Option<PathBuf>) -> Self {
        let mut registry = Self {
            builders: HashMap::new(),
        };
        registry.register(PROFILE_NONE, Box::new(Vec::new));
        registry.register(PROFILE_6LOWPAN, Box::new(|| lowpan_suite(Ieee802154Analyzer::new())));
        registry.register(
            PROFILE_6LOWPAN_PCAP,
            Box::new(move || lowpan_suite(pcap_link_analyzer(pcap_path.clone()))),
        );
        registry
    }

    /// Register or replace a named suite.
    pub fn register(&mut self, name: &str, builder: ProfileBuilder) {
        self.builders.insert(name.to_string(), builder);
    }

    /// Build a fresh pipeline for the named profile.
    pub fn resolve(&self, name: &str) -> Option<AnalyzerPipeline> {
        self.builders.get(name).map(|builder| AnalyzerPipeline::new(builder()))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.builders.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn lowpan_suite(link: Ieee802154Analyzer) -> AnalyzerList {
    vec![
        Box::new(link),
        Box::new(IphcAnalyzer::new()),
        Box::new(Ipv6Analyzer::new()),
        Box::new(Icmpv6Analyzer::new()),
    ]
}

fn pcap_link_analyzer(path: Option<PathBuf>) -> Ieee802154Analyzer {
    let Some(path) = path else {
        log::warn!("no capture file configured, pcap suite runs without capture");
        return Ieee802154Analyzer::new();
    };
    match PcapSink::create(&path) {
        Ok(sink) => Ieee802154Analyzer::with_pcap(sink),
        Err(e) => {
            log::warn!("{:#}, pcap suite runs without capture", e);
            Ieee802154Analyzer::new()
        }
    }
}
