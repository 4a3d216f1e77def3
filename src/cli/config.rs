use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::registry::DEFAULT_URL;

/// Environment variable naming the registry base URL
pub const REGISTRY_URL_ENV: &str = "OVSX_REGISTRY_URL";
/// Environment variable holding the personal access token
pub const PAT_ENV: &str = "OVSX_PAT";

/// Read an environment variable, treating empty strings as if the variable is not set.
pub(crate) fn env_var_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Pick the first available value: explicit flag, then environment, then config file.
pub(crate) fn resolve_setting(flag: Option<&str>, env_key: &str, configured: Option<&str>) -> Option<String> {
    flag.filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| env_var_non_empty(env_key))
        .or_else(|| configured.filter(|v| !v.is_empty()).map(str::to_string))
}

/// Settings persisted in `~/.config/ovsx/config.json`
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pat: Option<String>,
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to get home directory")?;
        Ok(home.join(".config").join("ovsx").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("Failed to create config directory")?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, json).context("Failed to write config file")?;

        Ok(())
    }

    /// Registry base URL: flag, then `OVSX_REGISTRY_URL`, then config, then the default
    pub fn resolve_registry_url(&self, flag: Option<&str>) -> String {
        resolve_setting(flag, REGISTRY_URL_ENV, self.registry_url.as_deref())
            .unwrap_or_else(|| DEFAULT_URL.to_string())
    }

    /// Personal access token: flag, then `OVSX_PAT`, then config
    pub fn resolve_pat(&self, flag: Option<&str>) -> Option<String> {
        resolve_setting(flag, PAT_ENV, self.pat.as_deref())
    }
}
