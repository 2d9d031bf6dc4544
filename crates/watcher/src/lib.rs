//! File system watching for gowatch
//!
//! This crate turns raw filesystem notifications into build triggers:
//! - Event filtering (editor files, watched extensions, generated output)
//! - Change deduplication by modification time
//! - Debouncing of bursts into a single trigger
//! - The notify-backed watch feed

pub mod debounce;
pub mod dedup;
pub mod feed;
pub mod filter;

pub use debounce::Debouncer;
pub use dedup::{Freshness, TimestampCache};
pub use feed::{FeedItem, FsWatcher, WatchError};
pub use filter::{EventFilter, IgnoreReason, Relevance};
