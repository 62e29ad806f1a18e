//! Configuration system for gdk-events
//!
//! Loads configuration from TOML file at `~/.config/gdk-events/config.toml`
//! Auto-generates default config file on first run if missing.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub events: EventsConfig,
    pub debug: DebugConfig,
}

impl Config {
    /// Load configuration from file, or use defaults if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load from an explicit path, writing defaults there if it is missing
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            info!("Config file not found at {:?}, using defaults", config_path);
            if let Err(e) = Self::save_default(config_path) {
                warn!("Failed to create default config file: {}", e);
            }
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path)
            .context("Failed to read config file")?;

        let config = Self::from_toml_str(&content)?;

        info!("Configuration loaded from {:?}", config_path);
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Parse configuration text; missing keys take their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("gdk-events");

        Ok(config_dir.join("config.toml"))
    }

    /// Save default configuration to file
    fn save_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(&Self::default())
            .context("Failed to serialize default config")?;

        fs::write(path, toml_string)
            .context("Failed to write default config file")?;

        info!("Created default config file at {:?}", path);
        Ok(())
    }
}

/// Event translation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Max milliseconds between two presses of a double click
    pub double_click_time: u32,
    /// Max milliseconds between the first and third press of a triple click
    pub triple_click_time: u32,
    /// Pixel slop for a double click. Kept for compatibility, not consulted.
    pub double_click_distance: u32,
    /// Pixel slop for a triple click. Kept for compatibility, not consulted.
    pub triple_click_distance: u32,
    /// Merge runs of expose events for the same window
    pub compress_exposures: bool,
    /// Drop core pointer events on windows that select extension events
    pub input_ignore_core: bool,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            double_click_time: 250,
            triple_click_time: 500,
            double_click_distance: 5,
            triple_click_distance: 5,
            compress_exposures: true,
            input_ignore_core: false,
        }
    }
}

/// Diagnostics configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Log every dispatched event
    pub show_events: bool,
    /// Default tracing filter when RUST_LOG is unset
    pub log_filter: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            show_events: false,
            log_filter: "gdk_events=debug,info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [events]
            double_click_time = 400

            [debug]
            show_events = true
            "#,
        )
        .unwrap();

        assert_eq!(config.events.double_click_time, 400);
        assert_eq!(config.events.triple_click_time, 500);
        assert!(config.events.compress_exposures);
        assert!(config.debug.show_events);
        assert_eq!(config.debug.log_filter, DebugConfig::default().log_filter);
    }

    #[test]
    fn test_load_writes_default_then_reads_it_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gdk-events").join("config.toml");

        let first = Config::load_from(&path).unwrap();
        assert_eq!(first, Config::default());
        assert!(path.exists());

        fs::write(&path, "[events]\ncompress_exposures = false\n").unwrap();
        let second = Config::load_from(&path).unwrap();
        assert!(!second.events.compress_exposures);
        assert_eq!(second.events.double_click_time, 250);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        assert!(Config::from_toml_str("[events\n").is_err());
    }
}
