//! Shared building blocks for gowatch
//!
//! This crate provides:
//! - The project configuration model (`gowatch.toml`)
//! - Absolute path resolution used by exclusion checks
//! - The directory scanner that produces the initial watch set

pub mod config;
pub mod paths;
pub mod scan;

// Re-exports
pub use config::{CommandSpec, Config, GenerateTarget, Overrides};
pub use scan::watch_dirs;

/// Primary source extension, always part of the watched set
pub const SOURCE_EXT: &str = ".go";

/// Default config file name, looked up in the project root
pub const CONFIG_FILE: &str = "gowatch.toml";
