//! Project configuration (`gowatch.toml`)
//!
//! Every section is optional; a missing file yields the defaults. Values from
//! the command line are applied on top through [`Overrides`] by
//! [`Config::finalize`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::SOURCE_EXT;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application name (default: basename of the output, else the root dir name)
    pub app_name: String,

    /// What to watch
    pub watch: WatchConfig,

    /// How to build
    pub build: BuildConfig,

    /// How to run the built artifact
    pub run: RunConfig,
}

/// `[watch]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Watched file extensions, with leading dot
    pub exts: Vec<String>,

    /// Extra roots scanned in addition to the project root
    pub paths: Vec<PathBuf>,

    /// Paths never watched (prefix match on absolute paths)
    pub excluded: Vec<PathBuf>,

    /// Also watch `vendor` directories
    pub vendor: bool,

    /// Quiet period before a burst of changes triggers a build
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            exts: vec![SOURCE_EXT.to_string()],
            paths: vec![],
            excluded: vec![],
            vendor: false,
            debounce_ms: 1000,
        }
    }
}

/// `[build]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Program providing the `generate` and `build` subcommands
    pub toolchain: String,

    /// Output artifact (default: `./<app_name>`)
    pub output: PathBuf,

    /// Packages passed to the compiler (default: none, i.e. the root package)
    pub packages: Vec<String>,

    /// Value for `-tags`, omitted when empty
    pub tags: String,

    /// Extra compiler arguments
    pub args: Vec<String>,

    /// Commands run once at startup, before the first build
    pub pre_all: Vec<CommandSpec>,

    /// Commands run before every build
    pub pre: Vec<CommandSpec>,

    /// Code generation directives
    pub generate: Vec<GenerateTarget>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            toolchain: "go".to_string(),
            output: PathBuf::new(),
            packages: vec![],
            tags: String::new(),
            args: vec![],
            pre_all: vec![],
            pre: vec![],
            generate: vec![],
        }
    }
}

/// `[run]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Build only; never start the artifact
    pub disable: bool,

    /// Arguments passed to the artifact
    pub args: Vec<String>,

    /// Environment overrides for the artifact
    pub env: BTreeMap<String, String>,
}

/// An external command: executable plus arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub cmd: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// A code generation directive: `source` regenerates `output`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateTarget {
    pub source: PathBuf,
    pub output: PathBuf,
}

/// Values given on the command line, applied over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// `-o`: output artifact
    pub output: Option<PathBuf>,
    /// `-p`: comma separated packages
    pub packages: Option<String>,
    /// `--args`: comma separated run arguments
    pub run_args: Option<String>,
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("build.toolchain must not be empty")]
    EmptyToolchain,

    #[error("watch.debounce_ms must be greater than zero")]
    ZeroDebounce,

    #[error("{section} command #{index} has an empty cmd")]
    EmptyCommand { section: &'static str, index: usize },
}

impl Config {
    /// Load configuration from `path`, falling back to defaults if it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Parse configuration from TOML text
    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Apply command line overrides and fill in derived defaults
    pub fn finalize(mut self, root: &Path, overrides: &Overrides) -> Self {
        if let Some(output) = &overrides.output {
            self.build.output = output.clone();
        }

        if self.app_name.is_empty() {
            let source = if self.build.output.as_os_str().is_empty() {
                root
            } else {
                self.build.output.as_path()
            };
            self.app_name = source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "app".to_string());
        }

        if self.build.output.as_os_str().is_empty() {
            let ext = if cfg!(windows) { ".exe" } else { "" };
            self.build.output = PathBuf::from(format!("./{}{}", self.app_name, ext));
        }

        if let Some(packages) = &overrides.packages {
            self.build.packages = split_list(packages);
        }
        if let Some(args) = &overrides.run_args {
            self.run.args = split_list(args);
        }

        self.watch.exts = normalize_exts(std::mem::take(&mut self.watch.exts));
        self
    }

    /// Check values that would otherwise fail at build time
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.build.toolchain.trim().is_empty() {
            return Err(ConfigError::EmptyToolchain);
        }
        if self.watch.debounce_ms == 0 {
            return Err(ConfigError::ZeroDebounce);
        }

        let sections = [("build.pre_all", &self.build.pre_all), ("build.pre", &self.build.pre)];
        for (section, commands) in sections {
            if let Some(index) = commands.iter().position(|c| c.cmd.trim().is_empty()) {
                return Err(ConfigError::EmptyCommand { section, index });
            }
        }

        Ok(())
    }

    /// Quiet period of the debounce scheduler
    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.watch.debounce_ms)
    }
}

/// Split a comma separated command line value, dropping empty items
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Ensure every extension has a leading dot, the source extension is present
/// and there are no duplicates
fn normalize_exts(exts: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(exts.len() + 1);
    for ext in exts.into_iter().chain(std::iter::once(SOURCE_EXT.to_string())) {
        let ext = ext.trim();
        if ext.is_empty() {
            continue;
        }
        let ext = if ext.starts_with('.') {
            ext.to_string()
        } else {
            format!(".{}", ext)
        };
        if !out.contains(&ext) {
            out.push(ext);
        }
    }
    out
}

/// Example configuration written by `gowatch init`
pub fn example_config(app_name: &str) -> String {
    format!(
        r#"# gowatch configuration
# All keys are optional.

app_name = "{app_name}"

[watch]
# Extensions that trigger a rebuild (".go" is always included)
exts = [".go"]
# Extra directories to watch besides the project root
paths = []
# Paths that are never watched
excluded = []
# Watch vendor directories too
vendor = false
# Quiet period before a burst of changes triggers a build
debounce_ms = 1000

[build]
toolchain = "go"
output = "./{app_name}"
packages = []
tags = ""
args = []
# Run once at startup
pre_all = []
# Run before every build, e.g. {{ cmd = "go", args = ["vet", "./..."] }}
pre = []

# Regenerate output from source when source is newer
# [[build.generate]]
# source = "model/user.go"
# output = "model/user_gen.go"

[run]
disable = false
args = []

[run.env]
# PORT = "8080"
"#
    )
}
