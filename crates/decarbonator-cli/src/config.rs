//! Configuration file management for decarbonator.
//!
//! Provides a TOML-based config file at `~/.config/decarbonator/config.toml`
//! and a resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use decarbonator_db::config::DbConfig;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    #[serde(default)]
    pub server: ServerSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    /// MongoDB connection string.
    pub url: String,
    /// Database holding the `plants` collection.
    #[serde(default = "default_database_name")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

fn default_database_name() -> String {
    DbConfig::DEFAULT_DATABASE.to_owned()
}

fn default_bind() -> String {
    "127.0.0.1".to_owned()
}

fn default_port() -> u16 {
    8000
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the decarbonator config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/decarbonator` or
/// `~/.config/decarbonator`, on every platform.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("decarbonator");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("decarbonator")
}

/// Return the path to the decarbonator config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file at `path`.
///
/// A missing file is `Ok(None)`; a file that exists but cannot be read or
/// parsed is an error.
pub fn load_config_from(path: &Path) -> Result<Option<ConfigFile>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(Some(config))
}

/// Serialize and write the config file to `path`, creating parent dirs as
/// needed. Sets file permissions to 0600 on Unix since the URI may carry
/// credentials.
pub fn save_config_to(config: &ConfigFile, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct DecarbonatorConfig {
    pub db_config: DbConfig,
    pub server: ServerSection,
}

impl DecarbonatorConfig {
    /// Resolve configuration from the default config path.
    pub fn resolve(cli_mongo_uri: Option<&str>) -> Result<Self> {
        Self::resolve_with(cli_mongo_uri, &config_path())
    }

    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - URI: `cli_mongo_uri` > `DECARBONATOR_MONGO_URI` > `database.url` > `DbConfig::DEFAULT_URI`
    /// - Database: `DECARBONATOR_DATABASE` > `database.name` > `DbConfig::DEFAULT_DATABASE`
    /// - Server: `[server]` section > `127.0.0.1:8000`
    pub fn resolve_with(cli_mongo_uri: Option<&str>, path: &Path) -> Result<Self> {
        let file_config = load_config_from(path)?;

        let mongo_uri = if let Some(uri) = cli_mongo_uri {
            uri.to_string()
        } else if let Ok(uri) = std::env::var("DECARBONATOR_MONGO_URI") {
            uri
        } else if let Some(ref cfg) = file_config {
            cfg.database.url.clone()
        } else {
            DbConfig::DEFAULT_URI.to_string()
        };

        let database = if let Ok(name) = std::env::var("DECARBONATOR_DATABASE") {
            name
        } else if let Some(ref cfg) = file_config {
            cfg.database.name.clone()
        } else {
            DbConfig::DEFAULT_DATABASE.to_string()
        };

        let server = file_config.map(|cfg| cfg.server).unwrap_or_default();

        Ok(Self {
            db_config: DbConfig::new(mongo_uri, database),
            server,
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
