//! Packet log engine core.
//!
//! Maintains the append-only sequence of transmission records and
//! everything derived from it:
//! - `store`: the record sequence with lazy, memoized decoding
//! - `filter`: duplicate suppression and visibility recomputation
//! - `search`: circular text search and time-based navigation
//! - `alias`: display alias overlay for decoded summaries
//! - `export`: tab-separated plain-text export
//! - `task`: the owner task serializing all mutation onto one consumer
//! - `types`: records, commands, updates and channel definitions
//!
//! The engine is UI-free: a table widget, CLI, or report generator drives
//! it through the command/update channels defined in `types`.

pub mod alias;
pub mod export;
pub mod filter;
pub mod search;
pub mod store;
pub mod task;
pub mod types;

pub use store::PacketLog;
pub use task::logbook_task;
pub use types::{
    LogAccessError, LogCommand, LogCommandChannel, LogUpdate, LogUpdateChannel, MediumEventChannel, SimTime,
    TransmissionEvent, TransmissionRecord,
};
