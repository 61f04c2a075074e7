// SPDX-License-Identifier: MPL-2.0
//! This module handles the player configuration, including loading and saving
//! it to a `settings.toml` file.
//!
//! The configuration provides the defaults every playback starts from. Per-source
//! decoder options (`amino_timeout_open`, `amino_timeout_read`, ...) override
//! these values for a single playback.
//!
//! # Examples
//!
//! ```no_run
//! use amino_video::config::{self, PlayerConfig};
//!
//! let mut config = config::load().unwrap_or_default();
//! config.read_timeout_ms = Some(2_000);
//! config::save(&config).expect("Failed to save config");
//! ```

pub mod defaults;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use defaults::*;

const CONFIG_FILE: &str = "settings.toml";
const APP_NAME: &str = "AminoVideo";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    #[serde(default)]
    pub open_timeout_ms: Option<u64>,
    #[serde(default)]
    pub read_timeout_ms: Option<u64>,
    #[serde(default)]
    pub prefer_hardware_decoder: Option<bool>,
    /// Raises the FFmpeg log level and logs every lifecycle step.
    #[serde(default)]
    pub verbose: Option<bool>,
    #[serde(default)]
    pub log_filter: Option<String>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            open_timeout_ms: Some(DEFAULT_OPEN_TIMEOUT_MS),
            read_timeout_ms: Some(DEFAULT_READ_TIMEOUT_MS),
            prefer_hardware_decoder: Some(DEFAULT_PREFER_HARDWARE_DECODER),
            verbose: Some(false),
            log_filter: None,
        }
    }
}

impl PlayerConfig {
    /// Effective open timeout, clamped to the accepted range.
    #[must_use]
    pub fn open_timeout(&self) -> Duration {
        clamp_timeout(self.open_timeout_ms.unwrap_or(DEFAULT_OPEN_TIMEOUT_MS))
    }

    /// Effective read timeout, clamped to the accepted range.
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        clamp_timeout(self.read_timeout_ms.unwrap_or(DEFAULT_READ_TIMEOUT_MS))
    }

    #[must_use]
    pub fn prefer_hardware(&self) -> bool {
        self.prefer_hardware_decoder
            .unwrap_or(DEFAULT_PREFER_HARDWARE_DECODER)
    }

    #[must_use]
    pub fn is_verbose(&self) -> bool {
        self.verbose.unwrap_or(false)
    }

    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}

pub(crate) fn clamp_timeout(ms: u64) -> Duration {
    Duration::from_millis(ms.clamp(MIN_TIMEOUT_MS, MAX_TIMEOUT_MS))
}

fn get_default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut path| {
        path.push(APP_NAME);
        path.push(CONFIG_FILE);
        path
    })
}

pub fn load() -> Result<PlayerConfig> {
    if let Some(path) = get_default_config_path() {
        if path.exists() {
            return load_from_path(&path);
        }
    }
    Ok(PlayerConfig::default())
}

pub fn save(config: &PlayerConfig) -> Result<()> {
    if let Some(path) = get_default_config_path() {
        return save_to_path(config, &path);
    }
    Ok(())
}

pub fn load_from_path(path: &Path) -> Result<PlayerConfig> {
    let content = fs::read_to_string(path)?;
    match toml::from_str(&content) {
        Ok(config) => Ok(config),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "invalid settings, using defaults");
            Ok(PlayerConfig::default())
        }
    }
}

pub fn save_to_path(config: &PlayerConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}
