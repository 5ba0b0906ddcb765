//! # Mindful Core Library
//!
//! Core logic for the Mindful meditation timer. Every operation is available
//! through the `mindful` CLI; a graphical shell would be a thin layer over
//! the same library.
//!
//! ## Architecture
//!
//! - **Timer Engine**: countdown state machine; the caller invokes `tick()`
//!   once per second
//! - **Audio**: procedural ambient themes (rain, ocean, forest, birds, wind)
//!   played on an [`AudioDevice`] or rendered to WAV
//! - **Notify**: completion chime and vibration
//! - **Session**: the controller that ties timer, sound, feedback and
//!   settings together
//! - **Worker**: offline cache worker (precache, cache-first fetch, sync,
//!   push and reminders)
//! - **Storage**: local key-value storage and TOML configuration
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: core timer state machine
//! - [`SessionController`]: application state driven by the UI
//! - [`AmbientEngine`]: at most one ambient theme at a time
//! - [`CacheWorker`]: worker event → outcome mapping
//! - [`Config`]: application configuration management

pub mod audio;
pub mod error;
pub mod events;
pub mod notify;
pub mod quotes;
pub mod session;
pub mod settings;
pub mod storage;
pub mod timer;
pub mod worker;

pub use audio::{AmbientEngine, AudioDevice, AudioStream, NullDevice, SoundTheme};
pub use error::{AudioError, ConfigError, HapticsError, StorageError, WorkerError};
pub use events::Event;
pub use notify::{Haptics, Notifier};
pub use quotes::{Quote, QuoteProvider};
pub use session::{SessionController, SessionOptions, Shortcut};
pub use settings::{Settings, SettingsStore};
pub use storage::{Config, JsonFileStore, KeyValueStore, MemoryStore};
pub use timer::{TimerEngine, TimerState};
pub use worker::{CacheVersion, CacheWorker, WorkerEvent, WorkerOutcome};
