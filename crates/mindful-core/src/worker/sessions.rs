//! Locally queued meditation sessions awaiting background sync.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::storage::KeyValueStore;

pub const SESSIONS_KEY: &str = "meditationSessions";

/// One queued session: the app's payload plus queueing metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(flatten)]
    pub payload: serde_json::Map<String, serde_json::Value>,
    /// Epoch milliseconds when the record was queued.
    pub timestamp: u64,
    #[serde(default)]
    pub synced: bool,
}

impl SessionRecord {
    /// Non-object payloads carry no fields and are queued empty.
    pub fn new(payload: serde_json::Value, timestamp: u64) -> Self {
        let payload = match payload {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => serde_json::Map::new(),
            other => {
                debug!(payload = %other, "non-object session payload dropped");
                serde_json::Map::new()
            }
        };
        Self {
            payload,
            timestamp,
            synced: false,
        }
    }
}

/// JSON array of [`SessionRecord`]s under [`SESSIONS_KEY`].
pub struct SessionLog {
    store: Box<dyn KeyValueStore>,
}

impl SessionLog {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// All queued records. A missing or unreadable log is empty.
    pub fn load(&self) -> Vec<SessionRecord> {
        match self.store.get(SESSIONS_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "error getting meditation sessions");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "error getting meditation sessions");
                Vec::new()
            }
        }
    }

    pub fn save(&mut self, records: &[SessionRecord]) -> Result<(), StorageError> {
        let json = serde_json::to_string(records).map_err(|source| StorageError::Malformed {
            key: SESSIONS_KEY.to_string(),
            source,
        })?;
        self.store.set(SESSIONS_KEY, &json)
    }

    pub fn append(&mut self, record: SessionRecord) -> Result<usize, StorageError> {
        let mut records = self.load();
        records.push(record);
        self.save(&records)?;
        Ok(records.len())
    }

    pub fn last(&self) -> Option<SessionRecord> {
        self.load().pop()
    }

    /// Mark the first `count` records synced, then drop every synced record.
    /// Returns how many records remain queued.
    pub fn acknowledge(&mut self, count: usize) -> Result<usize, StorageError> {
        let mut records = self.load();
        for record in records.iter_mut().take(count) {
            record.synced = true;
        }
        records.retain(|r| !r.synced);
        self.save(&records)?;
        Ok(records.len())
    }
}
