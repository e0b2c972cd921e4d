//! Append-only pcap capture file for the link-layer side channel.
//!
//! Frames are written with wall-clock timestamps and link type
//! IEEE 802.15.4 (DLT 195). Individual write failures are reported to the
//! caller, which logs them and keeps decoding; they never abort analysis.

use anyhow::Context;
use chrono::Utc;
use pcap_file::DataLink;
use pcap_file::pcap::{PcapHeader, PcapPacket, PcapWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub struct PcapSink {
    writer: PcapWriter<BufWriter<File>>,
    path: PathBuf,
}

impl PcapSink {
    /// Create (or truncate) the capture file and write the pcap header.
    pub fn create(path: &Path) -> anyhow::Result<Self> {
        let file = File::create(path).with_context(|| format!("Failed to create capture file: {}", path.display()))?;
        let header = PcapHeader {
            datalink: DataLink::IEEE802_15_4,
            ..Default::default()
        };
        let writer = PcapWriter::with_header(BufWriter::new(file), header)
            .with_context(|| format!("Failed to write capture header: {}", path.display()))?;
        log::info!("Capturing frames to {}", path.display());
        Ok(Self {
            writer,
            path: path.to_path_buf(),
        })
    }

    /// Append one captured frame, stamped with the current wall-clock time.
    pub fn append(&mut self, frame: &[u8]) -> Result<(), pcap_file::PcapError> {
        let now = Utc::now();
        let timestamp = Duration::new(now.timestamp().max(0) as u64, now.timestamp_subsec_nanos());
        let packet = PcapPacket::new(timestamp, frame.len() as u32, frame);
        self.writer.write_packet(&packet)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
