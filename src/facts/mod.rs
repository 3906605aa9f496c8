//! Fact archive
//!
//! Keeps the on-disk collection of previously seen facts:
//! - insertion-ordered, deduplicated by exact fact text
//! - loaded in full and rewritten in full on every change
//! - missing or corrupt files handled by a configurable policy

pub mod models;
pub mod store;

pub use models::{Archive, CycleOutcome, Fact};
pub use store::{ArchiveConfig, ArchiveStore, CorruptPolicy};
