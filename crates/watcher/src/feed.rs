//! Filesystem watch feed
//!
//! Bridges notify's callback thread into a tokio channel. Each scanned
//! directory is registered non-recursively; directories created after startup
//! are not picked up.

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::PathBuf;
use tokio::sync::mpsc;

/// One item of the watch feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedItem {
    /// A path was created, written, renamed or removed
    Changed(PathBuf),
    /// The backend reported an error; logged, never fatal
    Error(String),
}

/// Watcher setup errors; fatal to the process
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("Fail to create new watcher: {0}")]
    Create(#[source] notify::Error),

    #[error("Fail to watch directory {}: {source}", path.display())]
    Register {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// Live filesystem watcher
///
/// The notify handle must stay alive for events to be delivered; dropping this
/// value stops the feed and closes the channel.
pub struct FsWatcher {
    _watcher: RecommendedWatcher,
    dirs: Vec<PathBuf>,
}

impl FsWatcher {
    /// Register every directory and return the receiving end of the feed
    pub fn start(dirs: &[PathBuf]) -> Result<(Self, mpsc::UnboundedReceiver<FeedItem>), WatchError> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher = notify::recommended_watcher(
            move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    if !triggers_build(&event.kind) {
                        return;
                    }
                    for path in event.paths {
                        // Receiver gone means the engine is shutting down
                        let _ = tx.send(FeedItem::Changed(path));
                    }
                }
                Err(e) => {
                    let _ = tx.send(FeedItem::Error(e.to_string()));
                }
            },
        )
        .map_err(WatchError::Create)?;

        tracing::info!("Initializing watcher...");
        for dir in dirs {
            tracing::info!("Directory( {} )", dir.display());
            watcher
                .watch(dir, RecursiveMode::NonRecursive)
                .map_err(|source| WatchError::Register {
                    path: dir.clone(),
                    source,
                })?;
        }

        Ok((
            Self {
                _watcher: watcher,
                dirs: dirs.to_vec(),
            },
            rx,
        ))
    }

    /// Directories registered with the backend
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }
}

/// Reads never change sources; everything else might
fn triggers_build(kind: &EventKind) -> bool {
    !matches!(kind, EventKind::Access(_))
}
