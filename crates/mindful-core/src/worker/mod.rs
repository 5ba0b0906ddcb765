//! Offline cache worker.
//!
//! A network-layer intermediary modelled on a browser service worker: it
//! precaches the app shell on install, prunes stale caches on activate,
//! answers fetches cache-first and handles push, notification-click,
//! message and (periodic) background-sync events.
//!
//! Handlers are pure event → outcome mappings. The host runtime feeds a
//! [`WorkerEvent`] to [`CacheWorker::handle`] and carries out the returned
//! [`Effect`]s (show a notification, open a window, ...).

mod cache;
mod fs_cache;
mod handler;
mod http;
mod lifecycle;
mod network;
mod notification;
mod sessions;

pub use cache::{CacheStorage, MemoryCacheStorage};
pub use fs_cache::FsCacheStorage;
pub use handler::{CacheWorker, Client, Effect, WorkerEvent, WorkerMessage, WorkerOutcome};
pub use http::{Destination, Request, Response, ResponseKind};
pub use lifecycle::WorkerState;
pub use network::{Fetcher, HttpFetcher};
pub use notification::{Notification, NotificationAction};
pub use sessions::{SessionLog, SessionRecord, SESSIONS_KEY};

use serde::{Deserialize, Serialize};

use crate::storage::WorkerConfig;

/// Background sync tag for queued meditation sessions.
pub const SYNC_TAG: &str = "meditation-session-sync";

/// Periodic sync tag for the daily reminder.
pub const REMINDER_TAG: &str = "meditation-reminder";

/// App name plus version tag; every cache name derives from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheVersion {
    pub app: String,
    pub version: String,
}

impl CacheVersion {
    pub fn new(app: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            version: version.into(),
        }
    }

    /// Reported version, e.g. `mindful-moments-v1.0.0`.
    pub fn name(&self) -> String {
        format!("{}-{}", self.app, self.version)
    }

    pub fn static_cache(&self) -> String {
        format!("{}-static-{}", self.app, self.version)
    }

    pub fn dynamic_cache(&self) -> String {
        format!("{}-dynamic-{}", self.app, self.version)
    }

    pub fn is_current(&self, cache_name: &str) -> bool {
        cache_name == self.static_cache() || cache_name == self.dynamic_cache()
    }
}

impl Default for CacheVersion {
    fn default() -> Self {
        Self::new("mindful-moments", "v1.0.0")
    }
}

impl From<&WorkerConfig> for CacheVersion {
    fn from(config: &WorkerConfig) -> Self {
        Self::new(config.app_name.clone(), config.version.clone())
    }
}
