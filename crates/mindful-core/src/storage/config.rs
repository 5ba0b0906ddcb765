//! TOML-based application configuration.
//!
//! Stores:
//! - Timer defaults and duration presets
//! - Audio output parameters and the default ambient theme
//! - Offline cache worker scope, cache version and asset manifest
//!
//! Configuration is stored at `~/.config/mindful/config.toml`.
//! User toggles (sound, vibration, completion tone) are not configuration;
//! they live in the settings record, see [`crate::settings`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::audio::SoundTheme;
use crate::error::ConfigError;

/// Timer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_duration_secs")]
    pub default_duration_secs: u32,
    #[serde(default = "default_auto_reset_delay_secs")]
    pub auto_reset_delay_secs: u32,
    /// Durations offered as presets, in seconds.
    #[serde(default = "default_presets")]
    pub presets: Vec<u32>,
}

/// Audio configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_master_gain")]
    pub master_gain: f32,
    #[serde(default)]
    pub default_theme: SoundTheme,
}

/// Offline cache worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Origin the worker is scoped to; relative URLs resolve against it.
    #[serde(default = "default_origin")]
    pub origin: String,
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_sync_endpoint")]
    pub sync_endpoint: String,
    #[serde(default = "default_manifest")]
    pub manifest: Vec<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/mindful/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
}

// Default functions
fn default_duration_secs() -> u32 {
    300
}
fn default_auto_reset_delay_secs() -> u32 {
    3
}
fn default_presets() -> Vec<u32> {
    vec![300, 600, 900, 1200, 1800]
}
fn default_sample_rate() -> u32 {
    44_100
}
fn default_master_gain() -> f32 {
    0.1
}
fn default_origin() -> String {
    "http://localhost:8080".into()
}
fn default_app_name() -> String {
    "mindful-moments".into()
}
fn default_version() -> String {
    "v1.0.0".into()
}
fn default_sync_endpoint() -> String {
    "/api/sync-sessions".into()
}
fn default_manifest() -> Vec<String> {
    let mut manifest = vec!["/".to_string(), "/index.html".to_string()];
    for size in [72, 96, 128, 144, 152, 192, 384, 512] {
        manifest.push(format!("/assets/icons/icon-{size}x{size}.png"));
    }
    for size in [192, 512] {
        manifest.push(format!("/assets/icons/maskable-icon-{size}x{size}.png"));
    }
    manifest.push("/assets/icons/apple-touch-icon.png".to_string());
    manifest.push("/assets/icons/favicon-32x32.png".to_string());
    manifest.push("/assets/icons/favicon-16x16.png".to_string());
    manifest
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            default_duration_secs: default_duration_secs(),
            auto_reset_delay_secs: default_auto_reset_delay_secs(),
            presets: default_presets(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            master_gain: default_master_gain(),
            default_theme: SoundTheme::None,
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            app_name: default_app_name(),
            version: default_version(),
            sync_endpoint: default_sync_endpoint(),
            manifest: default_manifest(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    /// Path of the configuration file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk, writing the defaults if no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not parse
    /// as the type the key holds.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}
