//! # Application Configuration
//!
//! Loads the TOML configuration for the gearbox simulator. The file lives at
//! `<config dir>/opengearbox/config.toml` unless `OPENGEARBOX_CONFIG` points
//! somewhere else. A missing file is created with defaults; missing keys fall
//! back to their defaults so older files keep loading.
//!
//! ```toml
//! [gearbox]
//! tick_interval_ms = 100
//! clutch_warning_ms = 1500
//! command_buffer = 100
//!
//! [ui]
//! fullscreen = false
//! window_width = 720.0
//! window_height = 480.0
//! repaint_interval_ms = 33
//! ```

use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CONFIG_DIR: &str = "opengearbox";
const CONFIG_FILE: &str = "config.toml";
const CONFIG_ENV: &str = "OPENGEARBOX_CONFIG";

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub gearbox: GearboxConfig,
    pub ui: UIConfig,
}

/// Timing of the simulation
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct GearboxConfig {
    /// Speed tick period in milliseconds
    pub tick_interval_ms: u64,
    /// Clutch warning duration after a rejected shift
    pub clutch_warning_ms: u64,
    /// Input events buffered between window and worker
    pub command_buffer: usize,
}

impl Default for GearboxConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            clutch_warning_ms: 1500,
            command_buffer: 100,
        }
    }
}

/// Window and rendering preferences
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct UIConfig {
    pub fullscreen: bool,
    pub window_width: f32,
    pub window_height: f32,
    /// Upper bound between repaints while nothing else triggers one
    pub repaint_interval_ms: u64,
}

impl Default for UIConfig {
    fn default() -> Self {
        Self {
            fullscreen: false,
            window_width: 720.0,
            window_height: 480.0,
            repaint_interval_ms: 33,
        }
    }
}

impl Config {
    /// Resolves the configuration path: `OPENGEARBOX_CONFIG` first, then the
    /// platform config directory, then the working directory
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        let mut path = dirs::config_dir().unwrap_or_else(|| {
            warn!("No config directory found, using the working directory");
            PathBuf::from(".")
        });
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        path
    }

    /// Loads the configuration from the default path, writing defaults first if
    /// the file does not exist yet
    pub async fn load_or_create() -> Result<Self> {
        let path = Self::default_path();
        Self::ensure_default_config(&path).await?;
        Self::load_from(&path).await
    }

    pub async fn ensure_default_config(path: &Path) -> Result<()> {
        if tokio::fs::try_exists(path)
            .await
            .map_err(|e| eyre!("Failed to check if config {} exists: {}", path.display(), e))?
        {
            debug!("Config found at {}", path.display());
            return Ok(());
        }

        info!("No config at {}, writing defaults", path.display());
        Self::default().save_to(path).await
    }

    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| eyre!("Failed to read config {}: {}", path.display(), e))?;
        let config = Self::parse(&content)
            .map_err(|e| eyre!("Invalid config {}: {}", path.display(), e))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| eyre!("Failed to create config directory: {}", e))?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| eyre!("Failed to serialize config: {}", e))?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| eyre!("Failed to write config {}: {}", path.display(), e))?;
        debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// Parses and validates a TOML document
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| eyre!("Failed to parse TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.gearbox.tick_interval_ms == 0 {
            return Err(eyre!("gearbox.tick_interval_ms must be greater than zero"));
        }
        if self.gearbox.clutch_warning_ms == 0 {
            return Err(eyre!("gearbox.clutch_warning_ms must be greater than zero"));
        }
        if self.gearbox.command_buffer == 0 {
            return Err(eyre!("gearbox.command_buffer must be greater than zero"));
        }
        if self.ui.window_width <= 0.0 || self.ui.window_height <= 0.0 {
            return Err(eyre!("ui window size must be positive"));
        }
        Ok(())
    }
}
