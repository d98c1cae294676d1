use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf, time::Duration};

pub const NWS_API_BASE: &str = "https://api.weather.gov";
pub const USER_AGENT: &str = "weather-mcp/1.0.0";
pub const ACCEPT_GEO_JSON: &str = "application/geo+json";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Read-only settings handed to the upstream gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: NWS_API_BASE.to_string(),
            user_agent: USER_AGENT.to_string(),
            timeout: REQUEST_TIMEOUT,
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// base_url = "https://api.weather.gov"
/// user_agent = "weather-mcp/1.0.0 (ops@example.com)"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Upstream API root; the NWS production endpoint when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Identifying `User-Agent`. NWS asks for a contact address in it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-mcp", "weather-mcp")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Layer the stored values over the built-in defaults.
    pub fn gateway_config(&self) -> GatewayConfig {
        let defaults = GatewayConfig::default();
        GatewayConfig {
            base_url: non_blank(&self.base_url).unwrap_or(defaults.base_url),
            user_agent: non_blank(&self.user_agent).unwrap_or(defaults.user_agent),
            timeout: defaults.timeout,
        }
    }

    /// Values given on the command line win over the stored ones.
    pub fn with_overrides(mut self, base_url: Option<String>, user_agent: Option<String>) -> Self {
        if base_url.is_some() {
            self.base_url = base_url;
        }
        if user_agent.is_some() {
            self.user_agent = user_agent;
        }
        self
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}
