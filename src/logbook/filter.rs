//! Duplicate suppression and visibility filtering.
//!
//! Recomputes, for the whole record sequence and the current settings,
//! which records are visible and which fold into a predecessor's hide
//! count. Prior filter state is fully reset first, so the computation is
//! idempotent and never patched incrementally.

use super::types::TransmissionRecord;

/// Two adjacent records are duplicates when payload, source and the
/// ordered destination list all match.
fn is_duplicate(previous: &TransmissionRecord, current: &TransmissionRecord) -> bool {
    previous.raw_bytes() == current.raw_bytes()
        && previous.source_id == current.source_id
        && previous.destination_ids == current.destination_ids
}

/// Recompute visibility, returning the visible log indices in order and
/// rewriting each record's `hidden_by`/`hide_count`.
///
/// Hide chains are flattened at fold time: a suppressed record points
/// directly at the run's anchor, never at an intermediate hidden record,
/// so the anchor's `hide_count` equals the number of records folded
/// beneath it. Records excluded for having no destination never join a
/// chain and never count toward one.
pub fn recompute(records: &mut [TransmissionRecord], show_duplicates: bool, hide_no_destination: bool) -> Vec<usize> {
    for record in records.iter_mut() {
        record.hidden_by = None;
        record.hide_count = 0;
    }

    let mut visible = Vec::with_capacity(records.len());
    for i in 0..records.len() {
        if hide_no_destination && records[i].is_airshot() {
            continue;
        }
        if !show_duplicates && i > 0 && is_duplicate(&records[i - 1], &records[i]) {
            let anchor = records[i - 1].hidden_by.unwrap_or(i - 1);
            records[i].hidden_by = Some(anchor);
            records[anchor].hide_count += 1;
            continue;
        }
        visible.push(i);
    }
    visible
}
