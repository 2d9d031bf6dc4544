//! End-to-end rebuild cycle with a live filesystem watcher

#![cfg(unix)]

use cli_lib::Engine;
use gowatch_core::{watch_dirs, Config, Overrides};
use runner::Supervisor;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use watcher::FsWatcher;

/// Toolchain stand-in: logs each compile and writes a long-running artifact
fn fake_toolchain(root: &Path) -> String {
    let script = root.join("fake-go");
    fs::write(
        &script,
        r#"#!/bin/sh
if [ "$1" = build ]; then
  echo "$@" >> compiles.log
  printf '#!/bin/sh\necho "$$" >> starts.log\nexec sleep 30\n' > "$3"
  chmod +x "$3"
fi
"#,
    )
    .unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    script.to_string_lossy().into_owned()
}

fn lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

async fn wait_until(mut done: impl FnMut() -> bool) {
    for _ in 0..100 {
        if done() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_burst_of_writes_rebuilds_and_restarts_once() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().to_path_buf();
    let main_go = root.join("app").join("main.go");
    fs::create_dir_all(main_go.parent().unwrap()).unwrap();
    fs::write(&main_go, "package main\n").unwrap();

    let mut config = Config::default();
    config.build.toolchain = fake_toolchain(&root);
    config.build.output = PathBuf::from("./server");
    config.watch.debounce_ms = 400;
    let config = config.finalize(&root, &Overrides::default());

    let dirs = watch_dirs(&root, &config);
    assert!(dirs.contains(&root.join("app")));

    let supervisor = Arc::new(Supervisor::new(&root));
    let engine = Engine::new(&root, &config, Arc::clone(&supervisor));
    let (fs_watcher, feed) = FsWatcher::start(&dirs).unwrap();
    let watching = tokio::spawn({
        let engine = engine.clone();
        async move { engine.watch(feed).await }
    });

    // Three saves within 200ms
    for i in 0..3 {
        fs::write(&main_go, format!("package main\n// edit {}\n", i)).unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
    }

    wait_until(|| engine.builds() == 1).await;
    let starts = root.join("starts.log");
    wait_until(|| lines(&starts).len() == 1).await;

    // Nothing else queued behind the window
    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(engine.builds(), 1);
    assert_eq!(lines(&root.join("compiles.log")), vec!["build -o ./server"]);
    assert_eq!(lines(&starts).len(), 1);
    assert!(supervisor.is_running().await);

    supervisor.kill().await.unwrap();
    drop(fs_watcher);
    watching.await.unwrap();
}
