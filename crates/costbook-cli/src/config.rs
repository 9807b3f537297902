//! Configuration file management for costbook.
//!
//! Provides a TOML-based config file at `~/.config/costbook/config.toml`
//! and a resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use costbook_db::config::DbConfig;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub path: String,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the costbook config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/costbook` or
/// `~/.config/costbook`, regardless of platform conventions.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("costbook");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("costbook")
}

/// Return the path to the costbook config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;
    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct CostbookConfig {
    pub db_config: DbConfig,
}

impl CostbookConfig {
    /// Resolve the database path using the chain:
    /// CLI flag > `COSTBOOK_DB_PATH` env > config file > default.
    pub fn resolve(cli_db_path: Option<&str>) -> Result<Self> {
        let db_config = if let Some(path) = cli_db_path {
            DbConfig::new(path)
        } else if let Ok(path) = std::env::var("COSTBOOK_DB_PATH") {
            DbConfig::new(path)
        } else if let Ok(cfg) = load_config() {
            DbConfig::new(cfg.database.path)
        } else {
            DbConfig::new(DbConfig::DEFAULT_PATH)
        };
        Ok(Self { db_config })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
