//! Write an example configuration file

use anyhow::{bail, Context, Result};
use gowatch_core::config::example_config;
use gowatch_core::CONFIG_FILE;
use owo_colors::OwoColorize;
use std::env;

pub fn run(force: bool) -> Result<()> {
    let current_dir = env::current_dir().context("Failed to get current directory")?;
    let path = current_dir.join(CONFIG_FILE);

    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    let app_name = current_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "app".to_string());

    std::fs::write(&path, example_config(&app_name))
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("{} Created {}", "✓".green(), path.display().to_string().cyan());
    println!();
    println!("Next steps:");
    println!("  - Edit {} to match your project", CONFIG_FILE.yellow());
    println!("  - Run 'gowatch' to build, run and watch");
    Ok(())
}
