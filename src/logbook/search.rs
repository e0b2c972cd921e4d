//! Search and time-based navigation over the visible log.

use super::types::{SimTime, TransmissionRecord};

/// Find the next visible entry containing `query`, scanning circularly
/// from just after (or before, when `reverse`) the current selection.
///
/// `entries` are the visible records' display strings in log order;
/// `start` is a position within that sequence, `None` behaving like
/// position 0. Each entry is examined at most once; the match is a
/// case-sensitive literal substring. Returns the matching position within
/// `entries`, or `None` after a full wrap without a hit.
pub fn find_next(entries: &[&str], start: Option<usize>, query: &str, reverse: bool) -> Option<usize> {
    if query.is_empty() || entries.is_empty() {
        return None;
    }
    let len = entries.len() as isize;
    let origin = start.unwrap_or(0) as isize + if reverse { -1 } else { 1 };
    for i in 0..len {
        let index = if reverse {
            (origin - i).rem_euclid(len)
        } else {
            (origin + i).rem_euclid(len)
        };
        if entries[index as usize].contains(query) {
            return Some(index as usize);
        }
    }
    None
}

/// Select the visible record closest to `time`: the first one whose
/// transmission had not yet ended, falling back to the last visible
/// record. Returns a position within the visible sequence.
pub fn find_by_time(records: &[TransmissionRecord], visible: &[usize], time: SimTime) -> Option<usize> {
    for (position, &index) in visible.iter().enumerate() {
        if records[index].end_time >= time {
            return Some(position);
        }
    }
    if visible.is_empty() { None } else { Some(visible.len() - 1) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logbook::types::record;

    #[test]
    fn test_empty_query_is_noop() {
        assert_eq!(find_next(&["abc"], Some(0), "", false), None);
    }

    #[test]
    fn test_forward_search_starts_after_selection() {
        let entries = ["RPL DIO", "RPL DIS", "RPL DIO"];
        assert_eq!(find_next(&entries, Some(0), "DIO", false), Some(2));
    }

    #[test]
    fn test_search_wraps_exactly_once() {
        let entries = ["RPL DIO", "15.4 A", "15.4 A"];
        // Match lies behind the start position; found after wrapping.
        assert_eq!(find_next(&entries, Some(1), "DIO", false), Some(0));
        // No entry matches: full wrap, then None.
        assert_eq!(find_next(&entries, Some(1), "IPv6", false), None);
    }

    #[test]
    fn test_reverse_search() {
        let entries = ["a", "match", "b", "match"];
        assert_eq!(find_next(&entries, Some(3), "match", true), Some(1));
        assert_eq!(find_next(&entries, Some(1), "match", true), Some(3));
    }

    #[test]
    fn test_search_is_case_sensitive() {
        let entries = ["RPL dio"];
        assert_eq!(find_next(&entries, None, "DIO", false), None);
        assert_eq!(find_next(&entries, None, "dio", false), Some(0));
    }

    #[test]
    fn test_selection_itself_is_reachable_last() {
        let entries = ["match"];
        assert_eq!(find_next(&entries, Some(0), "match", false), Some(0));
    }

    fn timed_record(end_time: u64) -> TransmissionRecord {
        let mut r = record(1, &[2], &[0x00]);
        r.end_time = end_time;
        r
    }

    #[test]
    fn test_find_by_time_picks_first_still_running() {
        let records = vec![timed_record(100), timed_record(200), timed_record(300)];
        let visible = vec![0, 1, 2];
        assert_eq!(find_by_time(&records, &visible, 150), Some(1));
        assert_eq!(find_by_time(&records, &visible, 0), Some(0));
    }

    #[test]
    fn test_find_by_time_falls_back_to_last() {
        let records = vec![timed_record(100), timed_record(200)];
        let visible = vec![0, 1];
        assert_eq!(find_by_time(&records, &visible, 999), Some(1));
        assert_eq!(find_by_time(&records, &[], 999), None);
    }

    #[test]
    fn test_find_by_time_respects_visibility() {
        let records = vec![timed_record(100), timed_record(200), timed_record(300)];
        let visible = vec![0, 2];
        assert_eq!(find_by_time(&records, &visible, 150), Some(1));
    }
}
