//! Change deduplication by modification time
//!
//! File watchers commonly emit several events for one logical write. Each
//! relevant path is stamped with its mtime (whole seconds); an event whose
//! stamp equals the last one recorded for the path is a duplicate. The cache
//! is always updated, so it acts as a "last seen" table.

use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

/// Verdict for one relevant event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Same mtime as the previous event for this path
    Duplicate,
    /// New or changed mtime; forward to the debounce scheduler
    Changed,
}

/// Path -> last observed mtime (unix seconds)
///
/// The insert that records the new stamp also returns the previous one, so the
/// read-compare-write for a single path is atomic even with concurrent callers.
#[derive(Debug, Default)]
pub struct TimestampCache {
    seen: DashMap<PathBuf, i64>,
}

impl TimestampCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stat `path` and record its mtime
    ///
    /// Fails open: when the mtime cannot be read the current time is used, so
    /// the change is still treated as fresh.
    pub fn observe(&self, path: &Path) -> Freshness {
        let stamp = match modified_secs(path) {
            Ok(stamp) => stamp,
            Err(e) => {
                warn!("Fail to get file information [ {} ]: {}", path.display(), e);
                unix_now()
            }
        };
        self.record(path, stamp)
    }

    /// Record an explicit stamp for `path`
    pub fn record(&self, path: &Path, stamp: i64) -> Freshness {
        match self.seen.insert(path.to_path_buf(), stamp) {
            Some(previous) if previous == stamp => Freshness::Duplicate,
            _ => Freshness::Changed,
        }
    }

    /// Last stamp recorded for `path`
    pub fn last_seen(&self, path: &Path) -> Option<i64> {
        self.seen.get(path).map(|entry| *entry.value())
    }

    /// Number of tracked paths
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Modification time of `path` in whole unix seconds
pub fn modified_secs(path: &Path) -> std::io::Result<i64> {
    let mtime = std::fs::metadata(path)?.modified()?;
    Ok(to_unix_secs(mtime))
}

fn unix_now() -> i64 {
    to_unix_secs(SystemTime::now())
}

fn to_unix_secs(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    }
}
