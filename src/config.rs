use crate::paths::AppPaths;
use crate::state::DisplayMode;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_API_HOST: &str = "http://localhost:8080/svc/newshound-api/v1";

/// Below this many terminal columns the calendar shows a single day.
pub const DEFAULT_NARROW_WIDTH: u16 = 100;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api_host: String,
    pub default_display: DisplayMode,
    pub allow_insecure_certs: bool,
    pub narrow_width: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_host: DEFAULT_API_HOST.to_string(),
            default_display: DisplayMode::Alerts,
            allow_insecure_certs: false,
            narrow_width: DEFAULT_NARROW_WIDTH,
        }
    }
}

impl Config {
    /// Loads from the default location. A missing file gives the defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::config_file()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::config_file()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(self)?;
        fs::write(path, raw).with_context(|| format!("Failed to write config {}", path.display()))
    }
}
