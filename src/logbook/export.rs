//! Plain-text export of the transmission log.
//!
//! One tab-separated line per record in log order:
//! `{start_time_ms}\t{source_id}\t{destinations}\t{decoded_brief}` with
//! `-` standing in for an empty destination list. Export always covers
//! the whole log, not just the visible records.

use anyhow::Context;
use std::path::Path;

use super::store::PacketLog;
use super::types::{SimTime, TransmissionRecord};

/// Simulation time unit is the microsecond.
const MICROS_PER_MILLI: u64 = 1000;
const MILLIS_PER_SECOND: u64 = 1000;
const SECONDS_PER_MINUTE: u64 = 60;
const MINUTES_PER_HOUR: u64 = 60;

/// Destination column: `-`, a single id, or comma-joined ids.
pub fn destination_string(record: &TransmissionRecord) -> String {
    if record.destination_ids.is_empty() {
        return "-".to_string();
    }
    record
        .destination_ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// One export line, without the trailing newline.
pub fn export_line(record: &TransmissionRecord, brief: &str) -> String {
    format!(
        "{}\t{}\t{}\t{}",
        record.start_time / MICROS_PER_MILLI,
        record.source_id,
        destination_string(record),
        brief
    )
}

/// The full export text, decoding records lazily as needed.
pub fn export_string(log: &mut PacketLog) -> String {
    let mut out = String::new();
    for index in 0..log.len() {
        let Ok(decoded) = log.decode(index) else {
            continue;
        };
        let brief = decoded.brief.clone();
        let Ok(record) = log.get(index) else {
            continue;
        };
        out.push_str(&export_line(record, &brief));
        out.push('\n');
    }
    out
}

/// Write export text to a file; failures carry the path as context and do
/// not touch in-memory state.
pub fn save_to_file(path: &Path, content: &str) -> anyhow::Result<()> {
    std::fs::write(path, content).with_context(|| format!("Failed to write export file: {}", path.display()))
}

/// Render a simulation timestamp either as raw milliseconds or in the
/// formatted `H:MM:SS.mmm` style.
pub fn format_sim_time(time: SimTime, formatted: bool) -> String {
    let total_millis = time / MICROS_PER_MILLI;
    if !formatted {
        return total_millis.to_string();
    }
    let millis = total_millis % MILLIS_PER_SECOND;
    let total_seconds = total_millis / MILLIS_PER_SECOND;
    let seconds = total_seconds % SECONDS_PER_MINUTE;
    let total_minutes = total_seconds / SECONDS_PER_MINUTE;
    let minutes = total_minutes % MINUTES_PER_HOUR;
    let hours = total_minutes / MINUTES_PER_HOUR;
    format!("{}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}
