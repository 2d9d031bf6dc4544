//! Watch engine
//!
//! Owns every piece of state shared between event ingestion and builds: the
//! event filter, the timestamp cache, the build lock and the pipeline. Raw
//! events flow `admit` -> debouncer -> `build`; builds never overlap.

use gowatch_core::Config;
use parking_lot::Mutex as SyncMutex;
use runner::{Outcome, Pipeline, Supervisor};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};
use watcher::{Debouncer, EventFilter, FeedItem, Freshness, IgnoreReason, Relevance, TimestampCache};

/// What happened to one raw event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Ignored(IgnoreReason),
    /// Same modification time as the last forwarded event for the path
    Duplicate,
    /// Passed on to the debouncer
    Forwarded,
}

struct EngineState {
    filter: EventFilter,
    stamps: TimestampCache,
    build_lock: Mutex<()>,
    pipeline: Pipeline,
    quiet: Duration,
    builds: AtomicU64,
    last_outcome: SyncMutex<Option<Outcome>>,
}

/// Cheaply clonable handle over the engine state
#[derive(Clone)]
pub struct Engine {
    state: Arc<EngineState>,
}

impl Engine {
    /// Create an engine for a finalized configuration
    pub fn new(root: &Path, config: &Config, supervisor: Arc<Supervisor>) -> Self {
        Self {
            state: Arc::new(EngineState {
                filter: EventFilter::from_config(root, config),
                stamps: TimestampCache::new(),
                build_lock: Mutex::new(()),
                pipeline: Pipeline::new(root, config, supervisor),
                quiet: config.quiet_period(),
                builds: AtomicU64::new(0),
                last_outcome: SyncMutex::new(None),
            }),
        }
    }

    /// Filter and deduplicate one raw event
    pub fn admit(&self, path: &Path) -> Admission {
        if let Relevance::Ignored(reason) = self.state.filter.classify(path) {
            debug!("Ignoring {} ({:?})", path.display(), reason);
            return Admission::Ignored(reason);
        }

        match self.state.stamps.observe(path) {
            Freshness::Duplicate => Admission::Duplicate,
            Freshness::Changed => {
                info!("{} changed", path.display());
                Admission::Forwarded
            }
        }
    }

    /// Startup work, run under the build lock before the first build
    pub async fn prepare(&self) -> Outcome {
        let _guard = self.state.build_lock.lock().await;
        self.state.pipeline.prepare().await
    }

    /// Run the pipeline once; waits for any build already in progress
    pub async fn build(&self) -> Outcome {
        let _guard = self.state.build_lock.lock().await;

        let outcome = self.state.pipeline.run().await;
        self.state.builds.fetch_add(1, Ordering::SeqCst);
        *self.state.last_outcome.lock() = Some(outcome);

        if let Outcome::Aborted(stage) = outcome {
            debug!("Build aborted at {:?}", stage);
        }
        outcome
    }

    /// Ingest the watch feed until it closes
    ///
    /// Each debounce window that fires spawns one build. A window still open
    /// when the feed closes is dropped.
    pub async fn watch(&self, mut feed: mpsc::UnboundedReceiver<FeedItem>) {
        let engine = self.clone();
        let debouncer = Debouncer::spawn(self.state.quiet, move || {
            let engine = engine.clone();
            tokio::spawn(async move {
                engine.build().await;
            });
        });

        while let Some(item) = feed.recv().await {
            match item {
                FeedItem::Changed(path) => {
                    if self.admit(&path) == Admission::Forwarded {
                        debouncer.touch();
                    }
                }
                FeedItem::Error(msg) => warn!("Watcher error: {}", msg),
            }
        }

        debug!("Watch feed closed");
        debouncer.shutdown().await;
    }

    /// Completed pipeline runs
    pub fn builds(&self) -> u64 {
        self.state.builds.load(Ordering::SeqCst)
    }

    pub fn last_outcome(&self) -> Option<Outcome> {
        *self.state.last_outcome.lock()
    }

    pub fn supervisor(&self) -> &Arc<Supervisor> {
        self.state.pipeline.supervisor()
    }
}
