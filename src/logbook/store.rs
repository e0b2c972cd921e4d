//! Append-only transmission log with memoized decoding.
//!
//! Owns the record sequence, the active analyzer pipeline and the current
//! filter settings. Decoding is lazy: a record's brief/verbose pair is
//! computed on first access and kept until the active profile changes or
//! the log is cleared.

use crate::analyzer::{AnalyzerPipeline, Decoded};

use super::filter;
use super::types::{LogAccessError, TransmissionEvent, TransmissionRecord};

pub struct PacketLog {
    records: Vec<TransmissionRecord>,
    pipeline: AnalyzerPipeline,
    show_duplicates: bool,
    hide_no_destination: bool,
    visible: Vec<usize>,
}

impl PacketLog {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            pipeline: AnalyzerPipeline::empty(),
            show_duplicates: false,
            hide_no_destination: false,
            visible: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a new record at the end of the log; returns the new length.
    /// The caller decides when to refilter (typically once per append).
    pub fn append(&mut self, event: TransmissionEvent) -> usize {
        self.records.push(TransmissionRecord::new(event));
        self.records.len()
    }

    pub fn get(&self, index: usize) -> Result<&TransmissionRecord, LogAccessError> {
        self.records.get(index).ok_or(LogAccessError::OutOfRange {
            index,
            len: self.records.len(),
        })
    }

    pub fn records(&self) -> &[TransmissionRecord] {
        &self.records
    }

    /// Empty the log. Individual records are never removed; this is the
    /// only way entries leave the sequence.
    pub fn clear(&mut self) {
        self.records.clear();
        self.visible.clear();
    }

    /// Activate a different analyzer pipeline. All memoized decodes are
    /// invalidated and recomputed on next access.
    pub fn select_profile(&mut self, pipeline: AnalyzerPipeline) {
        self.pipeline = pipeline;
        for record in &mut self.records {
            record.decoded = None;
        }
        self.refilter();
    }

    /// Memoized decode of the record at `index` under the active profile.
    pub fn decode(&mut self, index: usize) -> Result<&Decoded, LogAccessError> {
        if index >= self.records.len() {
            return Err(LogAccessError::OutOfRange {
                index,
                len: self.records.len(),
            });
        }
        if self.records[index].decoded.is_none() {
            let decoded = self.pipeline.run(self.records[index].raw_bytes());
            self.records[index].decoded = Some(decoded);
        }
        Ok(self.records[index].decoded.as_ref().unwrap())
    }

    pub fn show_duplicates(&self) -> bool {
        self.show_duplicates
    }

    pub fn set_show_duplicates(&mut self, show: bool) {
        self.show_duplicates = show;
        self.refilter();
    }

    pub fn hide_no_destination(&self) -> bool {
        self.hide_no_destination
    }

    pub fn set_hide_no_destination(&mut self, hide: bool) {
        self.hide_no_destination = hide;
        self.refilter();
    }

    /// Recompute visibility and hide chains for the current settings.
    pub fn refilter(&mut self) {
        self.visible = filter::recompute(&mut self.records, self.show_duplicates, self.hide_no_destination);
    }

    /// Log indices of the currently visible records, in log order.
    pub fn visible(&self) -> &[usize] {
        &self.visible
    }
}

impl Default for PacketLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::profile::{PROFILE_6LOWPAN, ProfileRegistry};

    fn event(source_id: u32, destination_ids: &[u32], raw_bytes: &[u8]) -> TransmissionEvent {
        TransmissionEvent {
            start_time: 1000,
            end_time: 2000,
            source_id,
            destination_ids: destination_ids.to_vec(),
            raw_bytes: raw_bytes.to_vec(),
        }
    }

    #[test]
    fn test_append_returns_new_length() {
        let mut log = PacketLog::new();
        assert_eq!(log.append(event(1, &[2], &[0x01])), 1);
        assert_eq!(log.append(event(1, &[2], &[0x02])), 2);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_get_out_of_range() {
        let mut log = PacketLog::new();
        log.append(event(1, &[2], &[0x01]));
        assert!(log.get(0).is_ok());
        assert_eq!(log.get(5), Err(LogAccessError::OutOfRange { index: 5, len: 1 }));
    }

    #[test]
    fn test_decode_is_memoized_and_idempotent() {
        let mut log = PacketLog::new();
        log.append(event(1, &[2], &[0xde, 0xad, 0xbe, 0xef, 0x99]));
        let first = log.decode(0).unwrap().clone();
        assert_eq!(first.brief, "5: 0xdeadbeef");
        let second = log.decode(0).unwrap().clone();
        assert_eq!(first, second);
        assert!(log.get(0).unwrap().decoded().is_some());
    }

    #[test]
    fn test_decode_out_of_range() {
        let mut log = PacketLog::new();
        assert!(matches!(log.decode(0), Err(LogAccessError::OutOfRange { .. })));
    }

    #[test]
    fn test_profile_change_invalidates_decodes() {
        let registry = ProfileRegistry::with_builtin_profiles(None);
        let mut log = PacketLog::new();
        // 802.15.4 ack frame: decodes under the 6lowpan suite, falls back raw otherwise.
        log.append(event(1, &[2], &[0x02, 0x00, 0x05]));
        assert_eq!(log.decode(0).unwrap().brief, "3: 0x020005");

        log.select_profile(registry.resolve(PROFILE_6LOWPAN).unwrap());
        assert!(log.get(0).unwrap().decoded().is_none());
        assert_eq!(log.decode(0).unwrap().brief, "15.4 A");
    }

    #[test]
    fn test_clear_empties_log() {
        let mut log = PacketLog::new();
        log.append(event(1, &[2], &[0x01]));
        log.refilter();
        log.clear();
        assert!(log.is_empty());
        assert!(log.visible().is_empty());
        assert!(matches!(log.get(0), Err(LogAccessError::OutOfRange { .. })));
    }

    #[test]
    fn test_refilter_tracks_settings() {
        let mut log = PacketLog::new();
        log.append(event(1, &[2], &[0xaa]));
        log.append(event(1, &[2], &[0xaa]));
        log.append(event(1, &[], &[0xbb]));
        log.refilter();
        assert_eq!(log.visible(), &[0, 2]);

        log.set_show_duplicates(true);
        assert_eq!(log.visible(), &[0, 1, 2]);

        log.set_hide_no_destination(true);
        assert_eq!(log.visible(), &[0, 1]);
    }
}
