//! Event filter
//!
//! Decides whether a changed path can affect the build. A path is ignored when:
//! 1. Its file name looks like an editor swap, lock or backup file
//! 2. It does not end with a watched extension
//! 3. It lies under a code generation output (the pipeline's own products)

use gowatch_core::{paths, Config};
use regex::RegexSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Editor temporary files, matched against the file name only
const EDITOR_PATTERNS: &[&str] = &[
    // Emacs lock files (.#main.go)
    r"^\.#",
    // Emacs auto-save files (#main.go#)
    r"^#.*#$",
    // Vim swap files (.main.go.swp, main.go.swo, ...)
    r"\.sw[a-px]$",
    // Vim/Emacs backups (main.go~)
    r"~$",
    // Vim write probe
    r"^4913$",
    // Generic temporaries (main.go.tmp, ___jb_tmp___)
    r"\.tmp$",
    r"___jb_(old|tmp)___$",
];

fn editor_patterns() -> &'static RegexSet {
    static SET: OnceLock<RegexSet> = OnceLock::new();
    SET.get_or_init(|| RegexSet::new(EDITOR_PATTERNS).expect("editor patterns are valid"))
}

/// Classification of a changed path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relevance {
    /// The change should be considered for a rebuild
    Relevant,
    /// The change is dropped
    Ignored(IgnoreReason),
}

/// Why a path was ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    EditorFile,
    Extension,
    Generated,
}

/// Pure predicate over configuration and path arithmetic
#[derive(Debug, Clone)]
pub struct EventFilter {
    /// Base for resolving relative event paths
    root: PathBuf,

    /// Watched extensions, with leading dot
    exts: Vec<String>,

    /// Absolute generate outputs; unresolvable entries were dropped at construction
    generated: Vec<PathBuf>,
}

impl EventFilter {
    /// Build a filter from explicit parts
    pub fn new(root: &Path, exts: Vec<String>, generate_outputs: &[PathBuf]) -> Self {
        Self {
            root: root.to_path_buf(),
            exts,
            generated: paths::resolve_all(root, generate_outputs),
        }
    }

    /// Build a filter from a finalized configuration
    pub fn from_config(root: &Path, config: &Config) -> Self {
        let outputs: Vec<PathBuf> = config
            .build
            .generate
            .iter()
            .map(|target| target.output.clone())
            .collect();
        Self::new(root, config.watch.exts.clone(), &outputs)
    }

    /// Classify a changed path
    pub fn classify(&self, path: &Path) -> Relevance {
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => return Relevance::Ignored(IgnoreReason::Extension),
        };

        if is_editor_file(name) {
            return Relevance::Ignored(IgnoreReason::EditorFile);
        }

        if !self.exts.iter().any(|ext| name.ends_with(ext.as_str())) {
            return Relevance::Ignored(IgnoreReason::Extension);
        }

        if self.is_generated(path) {
            tracing::info!("Excluding file from watching [ {} ]", path.display());
            return Relevance::Ignored(IgnoreReason::Generated);
        }

        Relevance::Relevant
    }

    /// Convenience wrapper over [`classify`](Self::classify)
    pub fn is_relevant(&self, path: &Path) -> bool {
        self.classify(path) == Relevance::Relevant
    }

    fn is_generated(&self, path: &Path) -> bool {
        if self.generated.is_empty() {
            return false;
        }

        match paths::absolutize(&self.root, path) {
            Ok(abs) => self.generated.iter().any(|out| paths::is_under(&abs, out)),
            Err(e) => {
                tracing::error!("Can not get absolute path of [ {} ]: {}", path.display(), e);
                false
            }
        }
    }
}

/// Check a file name against the editor temporary patterns
pub fn is_editor_file(name: &str) -> bool {
    editor_patterns().is_match(name)
}
