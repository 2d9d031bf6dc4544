//! Watch, build and supervise the application in the current directory

use anyhow::{bail, Context, Result};
use cli_lib::Engine;
use gowatch_core::{watch_dirs, Config, Overrides, CONFIG_FILE};
use runner::{Outcome, Supervisor};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use watcher::FsWatcher;

pub struct RunOptions {
    /// Explicit config file; defaults to `gowatch.toml` in the project root
    pub config: Option<PathBuf>,
    pub overrides: Overrides,
}

/// Watch and rebuild until interrupted
///
/// Returns an error, and so exits non-zero, when the configuration is invalid,
/// the watcher cannot be set up, or startup preparation (`pre_all` commands and
/// the first generate pass) fails. A failed `pre_all` is treated as fatal rather
/// than as a silent early stop.
pub async fn run(options: RunOptions) -> Result<()> {
    // 1. Resolve project root and configuration
    let root = env::current_dir().context("Failed to get current directory")?;
    let config_path = match options.config {
        Some(path) if !path.exists() => bail!("Config file {} not found", path.display()),
        Some(path) => path,
        None => root.join(CONFIG_FILE),
    };

    let config = Config::load(&config_path)?.finalize(&root, &options.overrides);
    config.validate().context("Invalid configuration")?;

    info!("Initializing {} ...", config.app_name);

    // 2. Scan the directories to watch
    let dirs = watch_dirs(&root, &config);

    // 3. Startup preparation
    let supervisor = Arc::new(Supervisor::new(&root));
    let engine = Engine::new(&root, &config, Arc::clone(&supervisor));

    if let Outcome::Aborted(stage) = engine.prepare().await {
        bail!("Startup preparation failed at {:?} stage", stage);
    }

    // 4. Start watching before the first build so no change is missed
    let (_watcher, feed) = FsWatcher::start(&dirs).context("Failed to start file watcher")?;

    let first = engine.clone();
    tokio::spawn(async move {
        first.build().await;
    });

    // 5. Run until the feed closes or the user interrupts
    tokio::select! {
        _ = engine.watch(feed) => {
            warn!("Watch feed closed, shutting down");
        }
        res = tokio::signal::ctrl_c() => {
            res.context("Failed to listen for interrupt")?;
            info!("Interrupted, shutting down");
        }
    }

    // 6. Leave no supervised process behind
    if let Err(e) = supervisor.kill().await {
        warn!("Kill -> {}", e);
    }

    Ok(())
}
