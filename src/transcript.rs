//! Transmission transcript loading.
//!
//! A transcript is a JSON array of captured transmissions, one object per
//! medium event, with the payload as a hex string:
//!
//! ```json
//! [
//!   {"start_time": 1000, "end_time": 4520, "source": 3,
//!    "destinations": [7, 9], "payload": "61882acdabffff0100"}
//! ]
//! ```

use anyhow::{Context, anyhow, ensure};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::formatter;
use crate::logbook::TransmissionEvent;

#[derive(Deserialize)]
struct TranscriptEntry {
    start_time: u64,
    end_time: u64,
    source: u32,
    #[serde(default)]
    destinations: Vec<u32>,
    payload: String,
}

/// Parse transcript JSON into medium events, in file order.
pub fn parse_transcript(data: &str) -> anyhow::Result<Vec<TransmissionEvent>> {
    let entries: Vec<TranscriptEntry> = serde_json::from_str(data).context("Invalid JSON format")?;
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            ensure!(
                entry.end_time >= entry.start_time,
                "Transcript entry {}: end_time precedes start_time",
                index
            );
            let raw_bytes = formatter::from_hex(&entry.payload)
                .ok_or_else(|| anyhow!("Transcript entry {}: invalid payload hex", index))?;
            Ok(TransmissionEvent {
                start_time: entry.start_time,
                end_time: entry.end_time,
                source_id: entry.source,
                destination_ids: entry.destinations,
                raw_bytes,
            })
        })
        .collect()
}

/// Load a transcript file.
pub fn load_transcript(path: &Path) -> anyhow::Result<Vec<TransmissionEvent>> {
    let data = fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    parse_transcript(&data)
}
