//! Core error types for mindful-core.
//!
//! This module defines the error hierarchy using thiserror. Most audio and
//! haptics failures never reach a caller: they are logged where they happen
//! and the enclosing operation carries on.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Unknown user setting
    #[error("Unknown setting: {0}")]
    UnknownSetting(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Audio device and stream errors.
#[derive(Error, Debug)]
pub enum AudioError {
    /// No output device could be opened
    #[error("No audio output device available")]
    DeviceUnavailable,

    /// The device refused to build a stream
    #[error("Failed to open audio stream: {0}")]
    StreamFailed(String),

    /// The stream was already stopped or torn down
    #[error("Audio stream already stopped")]
    AlreadyStopped,

    /// Writing rendered audio failed
    #[error("Failed to write audio to {path}: {message}")]
    WriteFailed { path: PathBuf, message: String },
}

/// Haptic feedback errors.
#[derive(Error, Debug)]
pub enum HapticsError {
    #[error("Vibration not supported")]
    Unsupported,

    #[error("Vibration failed: {0}")]
    Failed(String),
}

/// Offline cache worker errors.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// A manifest entry could not be cached during install
    #[error("Install failed: could not cache '{url}': {reason}")]
    InstallFailed { url: String, reason: String },

    /// The network request itself failed (offline, DNS, refused)
    #[error("Network error: {0}")]
    Network(String),

    /// Cache storage failed
    #[error("Cache storage error: {0}")]
    Cache(String),

    /// The remote sync endpoint answered with a non-success status
    #[error("Sync rejected with status {status}")]
    SyncRejected { status: u16 },

    /// The request URL could not be resolved against the worker scope
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Session log errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Local key-value storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to read the backing file
    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the backing file
    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stored value is not valid JSON for the expected type
    #[error("Malformed value under '{key}': {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The data directory could not be determined or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

impl From<reqwest::Error> for WorkerError {
    fn from(err: reqwest::Error) -> Self {
        WorkerError::Network(err.to_string())
    }
}
