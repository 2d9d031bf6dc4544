//! Path resolution helpers
//!
//! Exclusion checks compare absolute, lexically normalized paths component by
//! component, so `app/gen` never matches `app/generated.go`.

use std::io;
use std::path::{Component, Path, PathBuf};

/// Resolve `path` against `base` and normalize `.` and `..` lexically.
///
/// Fails for an empty path, which has no meaningful absolute form.
pub fn absolutize(base: &Path, path: &Path) -> io::Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "cannot resolve an empty path",
        ));
    }

    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    Ok(normalize(&std::path::absolute(joined)?))
}

/// Lexically remove `.` components and fold `..` into their parent
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // Never climb past the root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                // Leading `..` of a relative path is kept
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out
}

/// True when `path` equals `prefix` or lies beneath it
pub fn is_under(path: &Path, prefix: &Path) -> bool {
    path.starts_with(prefix)
}

/// Resolve every entry, skipping (and logging) the ones that cannot be resolved
pub fn resolve_all(base: &Path, entries: &[PathBuf]) -> Vec<PathBuf> {
    entries
        .iter()
        .filter_map(|entry| match absolutize(base, entry) {
            Ok(abs) => Some(abs),
            Err(e) => {
                tracing::error!(
                    "Can not get absolute path of [ {} ]: {}",
                    entry.display(),
                    e
                );
                None
            }
        })
        .collect()
}
