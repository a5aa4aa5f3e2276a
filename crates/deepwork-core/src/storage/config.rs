//! TOML-based application configuration.
//!
//! Stores:
//! - The backend API base URL
//! - Countdown defaults (work interval, break interval)
//! - Notification preferences
//!
//! Configuration is stored at `~/.config/deepwork/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

use super::data_dir;
use crate::error::ConfigError;

/// Backend API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

/// Countdown timer defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Default work interval in minutes when `timer start` gets no duration.
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u64,
    /// Break interval in minutes, interleaved between work intervals.
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u64,
    /// When false, a countdown runs a single work interval and stops.
    #[serde(default = "default_true")]
    pub breaks_enabled: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/deepwork/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub timer: TimerConfig,
}

fn default_base_url() -> String {
    "http://localhost:8000".into()
}
fn default_work_minutes() -> u64 {
    25
}
fn default_break_minutes() -> u64 {
    5
}
fn default_true() -> bool {
    true
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            break_minutes: default_break_minutes(),
            breaks_enabled: default_true(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/deepwork"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load the config, falling back to defaults when the file is absent.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path).map_err(|e| ConfigError::LoadFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        toml::from_str(&raw).map_err(|e| ConfigError::LoadFailed {
            path,
            message: e.to_string(),
        })
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let raw = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, raw).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// The validated backend base URL.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.api.base_url).map_err(|e| ConfigError::InvalidValue {
            key: "api.base_url".into(),
            message: e.to_string(),
        })
    }

    /// Break interval in seconds, or `None` when breaks are disabled.
    pub fn break_secs(&self) -> Option<u64> {
        self.timer
            .breaks_enabled
            .then_some(self.timer.break_minutes.saturating_mul(60))
    }

    /// Set a configuration value by dotted key (`deepwork config set`).
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.into(),
            message,
        };
        match key {
            "api.base_url" => {
                Url::parse(value).map_err(|e| invalid(e.to_string()))?;
                self.api.base_url = value.to_string();
            }
            "timer.work_minutes" => {
                let minutes: u64 = value.parse().map_err(|_| invalid("expected a positive integer".into()))?;
                if minutes == 0 {
                    return Err(invalid("must be at least 1".into()));
                }
                self.timer.work_minutes = minutes;
            }
            "timer.break_minutes" => {
                let minutes: u64 = value.parse().map_err(|_| invalid("expected a positive integer".into()))?;
                if minutes == 0 {
                    return Err(invalid("must be at least 1".into()));
                }
                self.timer.break_minutes = minutes;
            }
            "timer.breaks_enabled" => {
                self.timer.breaks_enabled = value
                    .parse()
                    .map_err(|_| invalid("expected true or false".into()))?;
            }
            _ => return Err(ConfigError::UnknownKey(key.into())),
        }
        Ok(())
    }
}
