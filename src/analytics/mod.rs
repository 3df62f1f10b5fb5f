//! Interaction analytics: the JSONL log and its summary for `history`.

pub mod logger;
pub mod reporter;
