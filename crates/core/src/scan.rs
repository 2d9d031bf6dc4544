//! Directory scanner producing the initial watch set
//!
//! A directory is watched when it directly contains at least one file. The
//! walk skips hidden directories, documentation output (`docs`, `swagger`),
//! `vendor` unless enabled, and anything under an excluded path.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::paths;
use crate::Config;

/// Collect the directories to watch under `root` and every configured extra path
pub fn watch_dirs(root: &Path, config: &Config) -> Vec<PathBuf> {
    let excluded = paths::resolve_all(root, &config.watch.excluded);

    let mut roots = vec![root.to_path_buf()];
    roots.extend(paths::resolve_all(root, &config.watch.paths));

    let mut dirs = BTreeSet::new();
    for scan_root in &roots {
        scan(scan_root, config.watch.vendor, &excluded, &mut dirs);
    }
    dirs.into_iter().collect()
}

fn scan(root: &Path, vendor: bool, excluded: &[PathBuf], dirs: &mut BTreeSet<PathBuf>) {
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !should_skip(e, vendor, excluded));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if entry.file_type().is_dir() {
            continue;
        }

        if let Some(parent) = entry.path().parent() {
            dirs.insert(paths::normalize(parent));
        }
    }
}

fn should_skip(entry: &DirEntry, vendor: bool, excluded: &[PathBuf]) -> bool {
    let name = entry.file_name().to_string_lossy();

    if name.ends_with("docs") || name.ends_with("swagger") {
        return true;
    }

    if !vendor && name.ends_with("vendor") {
        return true;
    }

    if entry.file_type().is_dir() && name.starts_with('.') {
        return true;
    }

    is_excluded(entry.path(), excluded)
}

fn is_excluded(path: &Path, excluded: &[PathBuf]) -> bool {
    let abs = match std::path::absolute(path) {
        Ok(abs) => paths::normalize(&abs),
        Err(_) => return false,
    };

    let hit = excluded.iter().any(|prefix| paths::is_under(&abs, prefix));
    if hit {
        info!("Excluding from watching [ {} ]", path.display());
    }
    hit
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"package main\n").unwrap();
    }

    #[test]
    fn test_scan_collects_directories_with_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        touch(&root.join("main.go"));
        touch(&root.join("app/handler.go"));
        touch(&root.join("app/model/user.go"));
        fs::create_dir_all(root.join("empty/nested")).unwrap();

        let dirs = watch_dirs(root, &Config::default());
        let root = paths::normalize(root);

        assert_eq!(
            dirs,
            vec![root.clone(), root.join("app"), root.join("app/model")]
        );
    }

    #[test]
    fn test_scan_skips_hidden_docs_and_vendor() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        touch(&root.join(".git/config"));
        touch(&root.join("docs/index.go"));
        touch(&root.join("api/swagger/spec.go"));
        touch(&root.join("vendor/lib/lib.go"));
        touch(&root.join("svc/svc.go"));

        let dirs = watch_dirs(root, &Config::default());
        let root = paths::normalize(root);
        assert_eq!(dirs, vec![root.join("svc")]);

        let mut config = Config::default();
        config.watch.vendor = true;
        let dirs = watch_dirs(&root, &config);
        assert!(dirs.contains(&root.join("vendor/lib")));
    }

    #[test]
    fn test_scan_honors_excluded_paths() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        touch(&root.join("keep/a.go"));
        touch(&root.join("skip/b.go"));
        touch(&root.join("skip/deeper/c.go"));

        let mut config = Config::default();
        config.watch.excluded = vec![PathBuf::from("skip")];

        let dirs = watch_dirs(root, &config);
        let root = paths::normalize(root);
        assert_eq!(dirs, vec![root.join("keep")]);
    }

    #[test]
    fn test_scan_includes_extra_paths() {
        let project = TempDir::new().unwrap();
        let shared = TempDir::new().unwrap();

        touch(&project.path().join("main.go"));
        touch(&shared.path().join("lib/util.go"));

        let mut config = Config::default();
        config.watch.paths = vec![shared.path().to_path_buf()];

        let dirs = watch_dirs(project.path(), &config);
        assert!(dirs.contains(&paths::normalize(&shared.path().join("lib"))));
        assert!(dirs.contains(&paths::normalize(project.path())));
    }
}
