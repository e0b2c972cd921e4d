//! Type definitions for the packet log engine.
//!
//! Contains the transmission record and event structures, the bounded
//! channels connecting the host to the log owner task, and the access
//! error type.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::analyzer::Decoded;

/// Simulation timestamp in microseconds.
pub type SimTime = u64;

/// One completed transmission as delivered by the medium event source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmissionEvent {
    pub start_time: SimTime,
    pub end_time: SimTime,
    pub source_id: u32,
    /// Receiving endpoints in medium order; empty for an airshot.
    pub destination_ids: Vec<u32>,
    pub raw_bytes: Vec<u8>,
}

/// One logged radio transmission with its derived decode and filter state.
#[derive(Debug, Clone, PartialEq)]
pub struct TransmissionRecord {
    pub start_time: SimTime,
    pub end_time: SimTime,
    pub source_id: u32,
    pub destination_ids: Vec<u32>,
    raw_bytes: Vec<u8>,
    pub(crate) decoded: Option<Decoded>,
    /// Log index of the anchor this record is folded into, if suppressed
    /// as a duplicate. Always points at a record that is itself visible.
    pub hidden_by: Option<usize>,
    /// Number of later records folded into this one; meaningful only on
    /// anchor records, reset on every refilter.
    pub hide_count: u32,
}

impl TransmissionRecord {
    pub fn new(event: TransmissionEvent) -> Self {
        Self {
            start_time: event.start_time,
            end_time: event.end_time,
            source_id: event.source_id,
            destination_ids: event.destination_ids,
            raw_bytes: event.raw_bytes,
            decoded: None,
            hidden_by: None,
            hide_count: 0,
        }
    }

    /// The transmitted payload; set at creation, never mutated.
    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw_bytes
    }

    /// Memoized decode result, if one has been computed.
    pub fn decoded(&self) -> Option<&Decoded> {
        self.decoded.as_ref()
    }

    /// A transmission nobody received.
    pub fn is_airshot(&self) -> bool {
        self.destination_ids.is_empty()
    }
}

/// Error type for record accesses past the end of the log.
#[derive(Debug, PartialEq, Eq)]
pub enum LogAccessError {
    OutOfRange { index: usize, len: usize },
}

impl std::fmt::Display for LogAccessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogAccessError::OutOfRange { index, len } => {
                write!(f, "Record index {} out of range (log holds {} records)", index, len)
            }
        }
    }
}

impl std::error::Error for LogAccessError {}

/// Commands accepted by the log owner task.
#[derive(Debug)]
pub enum LogCommand {
    /// Activate the named analyzer profile, invalidating memoized decodes.
    SelectAnalyzer(String),
    SetShowDuplicates(bool),
    SetHideNoDestination(bool),
    /// Empty alias removes the mapping.
    SetAlias { payload: String, alias: String },
    /// Circular substring search over the visible records.
    Search { query: String, reverse: bool },
    /// Select the visible record closest to the given time.
    SelectTime(SimTime),
    /// Produce the full plain-text export.
    Export,
    Clear,
}

/// Updates published by the log owner task.
#[derive(Debug)]
pub enum LogUpdate {
    /// (visible, total) after an append, refilter or clear.
    CountsChanged(usize, usize),
    /// Log index of the search hit, if any.
    SearchResult(Option<usize>),
    /// Log index of the time-based selection, if any.
    TimeSelection(Option<usize>),
    ExportReady(String),
    Alert(String),
}

/// Depth of the medium event channel (medium -> owner task handoff).
pub const MEDIUM_EVENT_CHANNEL_SIZE: usize = 100;
/// Ordered handoff queue carrying completed transmissions; append order
/// equals arrival order because the single consumer drains it FIFO.
pub type MediumEventChannel = embassy_sync::channel::Channel<CriticalSectionRawMutex, TransmissionEvent, MEDIUM_EVENT_CHANNEL_SIZE>;
pub type MediumEventReceiver = embassy_sync::channel::Receiver<'static, CriticalSectionRawMutex, TransmissionEvent, MEDIUM_EVENT_CHANNEL_SIZE>;
pub type MediumEventSender = embassy_sync::channel::Sender<'static, CriticalSectionRawMutex, TransmissionEvent, MEDIUM_EVENT_CHANNEL_SIZE>;

/// Depth of the host command channel.
pub const LOG_COMMAND_CHANNEL_SIZE: usize = 100;
pub type LogCommandChannel = embassy_sync::channel::Channel<CriticalSectionRawMutex, LogCommand, LOG_COMMAND_CHANNEL_SIZE>;
pub type LogCommandReceiver = embassy_sync::channel::Receiver<'static, CriticalSectionRawMutex, LogCommand, LOG_COMMAND_CHANNEL_SIZE>;
pub type LogCommandSender = embassy_sync::channel::Sender<'static, CriticalSectionRawMutex, LogCommand, LOG_COMMAND_CHANNEL_SIZE>;

/// Depth of the update channel back to the host.
pub const LOG_UPDATE_CHANNEL_SIZE: usize = 100;
pub type LogUpdateChannel = embassy_sync::channel::Channel<CriticalSectionRawMutex, LogUpdate, LOG_UPDATE_CHANNEL_SIZE>;
pub type LogUpdateReceiver = embassy_sync::channel::Receiver<'static, CriticalSectionRawMutex, LogUpdate, LOG_UPDATE_CHANNEL_SIZE>;
pub type LogUpdateSender = embassy_sync::channel::Sender<'static, CriticalSectionRawMutex, LogUpdate, LOG_UPDATE_CHANNEL_SIZE>;

#[cfg(test)]
pub(crate) fn record(source_id: u32, destination_ids: &[u32], raw_bytes: &[u8]) -> TransmissionRecord {
    TransmissionRecord::new(TransmissionEvent {
        start_time: 0,
        end_time: 0,
        source_id,
        destination_ids: destination_ids.to_vec(),
        raw_bytes: raw_bytes.to_vec(),
    })
}
