//! Command-level behavior of the `gowatch` binary

use anyhow::Result;
use gowatch_core::{Config, CONFIG_FILE};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_version() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let result = crate::gowatch!(temp_dir.path(), "--version").assert_success()?;
    assert!(result.contains_stdout("gowatch"));
    Ok(())
}

#[test]
fn test_help_separates_verbose_from_version() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let result = crate::gowatch!(temp_dir.path(), "--help").assert_success()?;
    assert!(result.contains_stdout("-v, --verbose"));
    assert!(result.contains_stdout("the version is shown by -V"));
    assert!(result.contains_stdout("-V, --version"));
    Ok(())
}

#[test]
fn test_init_writes_loadable_config() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let project = temp_dir.path().join("shop");
    fs::create_dir(&project)?;

    let result = crate::gowatch!(&project, "init").assert_success()?;
    assert!(result.contains_stdout(CONFIG_FILE));

    let config = Config::load(&project.join(CONFIG_FILE))?;
    assert_eq!(config.app_name, "shop");
    assert!(config.validate().is_ok());
    Ok(())
}

#[test]
fn test_init_refuses_to_overwrite() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join(CONFIG_FILE);
    fs::write(&path, "app_name = \"mine\"\n")?;

    let result = crate::gowatch!(temp_dir.path(), "init").assert_failure()?;
    assert!(result.contains_stderr("already exists"));
    assert_eq!(fs::read_to_string(&path)?, "app_name = \"mine\"\n");

    crate::gowatch!(temp_dir.path(), "init", "--force").assert_success()?;
    assert_ne!(fs::read_to_string(&path)?, "app_name = \"mine\"\n");
    Ok(())
}

#[test]
fn test_invalid_config_exits_non_zero() -> Result<()> {
    let temp_dir = TempDir::new()?;
    fs::write(
        temp_dir.path().join(CONFIG_FILE),
        "[watch]\ndebounce_ms = 0\n",
    )?;

    let result = crate::gowatch!(temp_dir.path()).assert_failure()?;
    assert!(result.contains_stderr("Invalid configuration"));
    Ok(())
}

#[test]
fn test_unparsable_config_exits_non_zero() -> Result<()> {
    let temp_dir = TempDir::new()?;
    fs::write(temp_dir.path().join(CONFIG_FILE), "[watch\n")?;

    let result = crate::gowatch!(temp_dir.path()).assert_failure()?;
    assert!(result.contains_stderr("Failed to parse config file"));
    Ok(())
}

#[test]
fn test_missing_explicit_config_exits_non_zero() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let result = crate::gowatch!(temp_dir.path(), "-c", "nope.toml").assert_failure()?;
    assert!(result.contains_stderr("not found"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_failed_pre_all_exits_non_zero() -> Result<()> {
    let temp_dir = TempDir::new()?;
    fs::write(
        temp_dir.path().join(CONFIG_FILE),
        "[build]\npre_all = [{ cmd = \"false\" }]\n",
    )?;

    let result = crate::gowatch!(temp_dir.path()).assert_failure()?;
    assert!(result.contains_stderr("Startup preparation failed"));
    Ok(())
}
