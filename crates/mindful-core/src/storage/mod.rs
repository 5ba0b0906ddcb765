mod config;
pub mod kv;

pub use config::{AudioConfig, Config, TimerConfig, WorkerConfig};
pub use kv::{JsonFileStore, KeyValueStore, MemoryStore};

use std::path::PathBuf;

use crate::error::StorageError;

/// Returns the data directory, creating it if needed.
///
/// Resolution order:
/// - `MINDFUL_DATA_DIR` if set
/// - `~/.config/mindful-dev/` when `MINDFUL_ENV=dev`
/// - `~/.config/mindful/`
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("MINDFUL_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("MINDFUL_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("mindful-dev")
            } else {
                base_dir.join("mindful")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
