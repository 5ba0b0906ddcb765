//! User settings persisted to local key-value storage.
//!
//! Stored as a flat JSON object under [`SETTINGS_KEY`]. Every key defaults
//! to `true`: only an explicit `false` turns a setting off, so records
//! written by older builds (or hand-edited ones) still load.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, StorageError};
use crate::storage::KeyValueStore;

pub const SETTINGS_KEY: &str = "meditationAppSettings";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub notification_sound: bool,
    pub vibration: bool,
    pub sound_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            notification_sound: true,
            vibration: true,
            sound_enabled: true,
        }
    }
}

impl Settings {
    /// Parse a stored record. Anything that is not literally `false` is on.
    fn from_json(json: &serde_json::Value) -> Self {
        let flag = |key: &str| json.get(key) != Some(&serde_json::Value::Bool(false));
        Self {
            notification_sound: flag("notificationSound"),
            vibration: flag("vibration"),
            sound_enabled: flag("soundEnabled"),
        }
    }

    /// Set a setting by its record key or snake_case name.
    pub fn set(&mut self, key: &str, value: bool) -> Result<(), ConfigError> {
        match key {
            "notificationSound" | "notification_sound" => self.notification_sound = value,
            "vibration" => self.vibration = value,
            "soundEnabled" | "sound_enabled" => self.sound_enabled = value,
            other => return Err(ConfigError::UnknownSetting(other.to_string())),
        }
        Ok(())
    }
}

/// Reads and writes [`Settings`] through a [`KeyValueStore`].
pub struct SettingsStore {
    store: Box<dyn KeyValueStore>,
}

impl SettingsStore {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load settings, falling back to defaults on any failure.
    pub fn load(&self) -> Settings {
        let raw = match self.store.get(SETTINGS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Settings::default(),
            Err(e) => {
                warn!(error = %e, "settings load error");
                return Settings::default();
            }
        };
        match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(json) => Settings::from_json(&json),
            Err(e) => {
                warn!(error = %e, "settings record is malformed, using defaults");
                Settings::default()
            }
        }
    }

    /// Overwrite the stored record with `settings`.
    pub fn save(&mut self, settings: &Settings) -> Result<(), StorageError> {
        let json = serde_json::to_string(settings).map_err(|source| StorageError::Malformed {
            key: SETTINGS_KEY.to_string(),
            source,
        })?;
        self.store.set(SETTINGS_KEY, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn store_with(raw: Option<&str>) -> SettingsStore {
        let mut kv = MemoryStore::new();
        if let Some(raw) = raw {
            kv.set(SETTINGS_KEY, raw).unwrap();
        }
        SettingsStore::new(Box::new(kv))
    }

    #[test]
    fn missing_record_loads_defaults() {
        assert_eq!(store_with(None).load(), Settings::default());
    }

    #[test]
    fn malformed_record_loads_defaults() {
        assert_eq!(store_with(Some("{oops")).load(), Settings::default());
        assert_eq!(store_with(Some("null")).load(), Settings::default());
    }

    #[test]
    fn only_explicit_false_disables() {
        let settings = store_with(Some(
            r#"{"notificationSound":false,"vibration":"no","soundEnabled":0}"#,
        ))
        .load();
        assert!(!settings.notification_sound);
        assert!(settings.vibration);
        assert!(settings.sound_enabled);
    }

    #[test]
    fn save_overwrites_wholesale() {
        let mut store = store_with(Some(r#"{"vibration":false,"extra":1}"#));
        let settings = Settings {
            notification_sound: false,
            vibration: true,
            sound_enabled: false,
        };
        store.save(&settings).unwrap();
        assert_eq!(store.load(), settings);

        let raw = store.store.get(SETTINGS_KEY).unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(json.get("extra").is_none());
        assert_eq!(json["soundEnabled"], serde_json::Value::Bool(false));
    }

    #[test]
    fn set_accepts_both_key_styles() {
        let mut settings = Settings::default();
        settings.set("soundEnabled", false).unwrap();
        settings.set("notification_sound", false).unwrap();
        assert!(!settings.sound_enabled);
        assert!(!settings.notification_sound);
        let err = settings.set("volume", true).unwrap_err();
        assert!(matches!(&err, ConfigError::UnknownSetting(key) if key == "volume"));
        assert_eq!(err.to_string(), "Unknown setting: volume");
    }
}
