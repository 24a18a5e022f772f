//! Configuration management for Cookrun.
//!
//! Handles loading configuration from TOML files and turning it into the
//! variable bindings recipes see.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cassandra cookbook settings
    pub cassandra: CassandraConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory cookbooks are discovered under
    pub cookbooks_dir: PathBuf,
}

/// Settings for the cassandra cookbook.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CassandraConfig {
    /// Directory cassandra is unpacked into
    pub install_dir: PathBuf,

    /// User that owns the installation
    pub owner: String,

    /// Group that owns the installation
    pub group: String,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Looks for config in:
    /// 1. `.cookrun.toml` in current directory
    /// 2. `~/.config/cookrun/config.toml`
    /// 3. Falls back to defaults
    pub fn load() -> anyhow::Result<Self> {
        // Try local config first
        let local_config = PathBuf::from(".cookrun.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        // Try global config
        if let Some(config_dir) = dirs::config_dir() {
            let global_config = config_dir.join("cookrun").join("config.toml");
            if global_config.exists() {
                return Self::load_from_file(&global_config);
            }
        }

        // Return defaults
        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// The cookbooks directory, with `~` expanded.
    #[must_use]
    pub fn cookbooks_dir(&self) -> PathBuf {
        expand(&self.general.cookbooks_dir)
    }

    /// Variable bindings recipes receive from configuration.
    ///
    /// These sit above recipe defaults and below `--var` overrides.
    #[must_use]
    pub fn bindings(&self) -> HashMap<String, String> {
        let mut vars = HashMap::new();
        vars.insert(
            "install_dir".to_string(),
            expand(&self.cassandra.install_dir).display().to_string(),
        );
        vars.insert("owner".to_string(), self.cassandra.owner.clone());
        vars.insert("group".to_string(), self.cassandra.group.clone());
        vars
    }
}

impl Default for Config {
    fn default() -> Self {
        Self { general: GeneralConfig::default(), cassandra: CassandraConfig::default() }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self { cookbooks_dir: PathBuf::from("cookbooks") }
    }
}

impl Default for CassandraConfig {
    fn default() -> Self {
        Self {
            install_dir: PathBuf::from("/opt"),
            owner: "cassandra".to_string(),
            group: "cassandra".to_string(),
        }
    }
}

fn expand(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(raw.as_ref()).into_owned())
}
