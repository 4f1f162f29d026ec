//! Taskflow Journal: the daily journal collaborator boundary
//!
//! A [`JournalEntry`] (morning, midday, evening) is serialized and passed to
//! an external script by [`JournalBridge`]. The script's one-line JSON
//! answer comes back as a [`JournalReply`].

pub mod bridge;
pub mod entry;

pub use bridge::{parse_reply, JournalBridge, JournalReply, PARSE_FAILURE_MESSAGE};
pub use entry::{JournalEntry, JournalError, Period};
