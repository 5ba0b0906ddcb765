//! Worker event handlers.

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use url::Url;

use super::cache::CacheStorage;
use super::http::{Request, Response, ResponseKind};
use super::lifecycle::WorkerState;
use super::network::Fetcher;
use super::notification::{Notification, ACTION_DISMISS, ACTION_START};
use super::sessions::{SessionLog, SessionRecord};
use super::{CacheVersion, REMINDER_TAG, SYNC_TAG};
use crate::error::WorkerError;
use crate::storage::WorkerConfig;
use crate::timer::now_ms;

const ONE_DAY_MS: u64 = 24 * 60 * 60 * 1000;
const AUTOSTART_PATH: &str = "/index.html?autostart=true";
const SHELL_PATH: &str = "/index.html";

/// A window client of the app, as seen on notification click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub url: Url,
}

/// Messages posted by the app. Parsed from `{"type": "...", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerMessage {
    SkipWaiting,
    GetVersion,
    CacheMeditationData {
        #[serde(default)]
        payload: serde_json::Value,
    },
}

#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(Request),
    Sync { tag: String },
    PeriodicSync { tag: String },
    Push { data: Option<String> },
    NotificationClick { action: Option<String>, clients: Vec<Client> },
    Message(WorkerMessage),
}

/// Side effects for the hosting runtime to carry out.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    SkipWaiting,
    ClaimClients,
    ShowNotification { notification: Notification },
    CloseNotification,
    OpenWindow { url: Url },
    FocusClient { id: String },
    Navigate { id: String, url: Url },
    Reply { version: String },
    RegisterSync { tag: String },
}

/// Result of handling one event. `response` is `None` when the event is
/// not a fetch or the fetch passes through to the network untouched.
#[derive(Debug, Default)]
pub struct WorkerOutcome {
    pub response: Option<Response>,
    pub effects: Vec<Effect>,
}

impl WorkerOutcome {
    fn effects(effects: Vec<Effect>) -> Self {
        Self {
            response: None,
            effects,
        }
    }

    fn respond(response: Response) -> Self {
        Self {
            response: Some(response),
            effects: Vec::new(),
        }
    }
}

pub struct CacheWorker<C: CacheStorage, F: Fetcher> {
    version: CacheVersion,
    scope: Url,
    manifest: Vec<String>,
    sync_endpoint: String,
    caches: C,
    fetcher: F,
    sessions: Mutex<SessionLog>,
    state: RwLock<WorkerState>,
    clock: fn() -> u64,
}

impl<C: CacheStorage, F: Fetcher> CacheWorker<C, F> {
    pub fn new(config: &WorkerConfig, caches: C, fetcher: F, sessions: SessionLog) -> Result<Self, WorkerError> {
        let scope = Url::parse(&config.origin).map_err(|source| WorkerError::InvalidUrl {
            url: config.origin.clone(),
            source,
        })?;
        Ok(Self {
            version: CacheVersion::from(config),
            scope,
            manifest: config.manifest.clone(),
            sync_endpoint: config.sync_endpoint.clone(),
            caches,
            fetcher,
            sessions: Mutex::new(sessions),
            state: RwLock::new(WorkerState::Parsed),
            clock: now_ms,
        })
    }

    /// Replace the epoch-millisecond clock.
    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    pub fn version(&self) -> &CacheVersion {
        &self.version
    }

    pub fn scope(&self) -> &Url {
        &self.scope
    }

    pub fn caches(&self) -> &C {
        &self.caches
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// Pick up a worker installed by an earlier run: if the current static
    /// cache exists the worker counts as activated.
    pub async fn restore(&self) -> Result<WorkerState, WorkerError> {
        let mut state = self.state.write().await;
        if *state == WorkerState::Parsed && self.caches.has(&self.version.static_cache()).await? {
            *state = WorkerState::Activated;
            debug!(version = %self.version.name(), "restored active worker");
        }
        Ok(*state)
    }

    pub async fn handle(&self, event: WorkerEvent) -> Result<WorkerOutcome, WorkerError> {
        match event {
            WorkerEvent::Install => self.install().await,
            WorkerEvent::Activate => self.activate().await,
            WorkerEvent::Fetch(request) => Ok(self.fetch(request).await),
            WorkerEvent::Sync { tag } => Ok(self.sync(&tag).await),
            WorkerEvent::PeriodicSync { tag } => Ok(self.periodic_sync(&tag).await),
            WorkerEvent::Push { data } => {
                info!("push notification received");
                let notification = Notification::push(data.as_deref(), (self.clock)());
                Ok(WorkerOutcome::effects(vec![Effect::ShowNotification { notification }]))
            }
            WorkerEvent::NotificationClick { action, clients } => {
                Ok(self.notification_click(action.as_deref(), &clients))
            }
            WorkerEvent::Message(message) => Ok(self.message(message).await),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Precache the manifest. All-or-nothing: any failed fetch aborts the
    /// install before anything is written, a failed write removes the
    /// static cache again, and the worker becomes redundant.
    async fn install(&self) -> Result<WorkerOutcome, WorkerError> {
        {
            let mut state = self.state.write().await;
            if !state.can_install() {
                let current = *state;
                debug!(state = %current, "install ignored");
                return Ok(WorkerOutcome::default());
            }
            *state = WorkerState::Installing;
        }
        info!(version = %self.version.name(), "installing");

        match self.precache().await {
            Ok(count) => {
                *self.state.write().await = WorkerState::Installed;
                info!(count, "static files cached");
                Ok(WorkerOutcome::effects(vec![Effect::SkipWaiting]))
            }
            Err(e) => {
                *self.state.write().await = WorkerState::Redundant;
                warn!(error = %e, "error caching static files");
                Err(e)
            }
        }
    }

    async fn precache(&self) -> Result<usize, WorkerError> {
        let mut entries = Vec::with_capacity(self.manifest.len());
        for path in &self.manifest {
            let request = Request::resolve(path, &self.scope)?;
            let response = self
                .fetcher
                .fetch(&request)
                .await
                .map_err(|e| WorkerError::InstallFailed {
                    url: request.url.to_string(),
                    reason: e.to_string(),
                })?;
            if !response.ok() {
                return Err(WorkerError::InstallFailed {
                    url: request.url.to_string(),
                    reason: format!("status {}", response.status),
                });
            }
            entries.push((request.url, response));
        }

        let cache = self.version.static_cache();
        if let Err(e) = self.caches.put_all(&cache, &entries).await {
            // A half-written static cache would pass for a finished install.
            if let Err(cleanup) = self.caches.delete(&cache).await {
                warn!(cache = %cache, error = %cleanup, "could not remove partial static cache");
            }
            return Err(e);
        }
        Ok(entries.len())
    }

    async fn activate(&self) -> Result<WorkerOutcome, WorkerError> {
        {
            let mut state = self.state.write().await;
            if !state.can_activate() {
                let current = *state;
                debug!(state = %current, "activate ignored");
                return Ok(WorkerOutcome::default());
            }
            *state = WorkerState::Activating;
        }

        let result = self.prune_caches().await;
        *self.state.write().await = WorkerState::Activated;
        result?;
        info!(version = %self.version.name(), "activated");
        Ok(WorkerOutcome::effects(vec![Effect::ClaimClients]))
    }

    async fn prune_caches(&self) -> Result<(), WorkerError> {
        for name in self.caches.keys().await? {
            if !self.version.is_current(&name) {
                info!(cache = %name, "deleting old cache");
                self.caches.delete(&name).await?;
            }
        }
        Ok(())
    }

    // ── Fetch ────────────────────────────────────────────────────────

    async fn fetch(&self, request: Request) -> WorkerOutcome {
        if !self.state().await.intercepts_fetches() || !request.is_get() || !request.is_http() {
            return WorkerOutcome::default();
        }

        match self.caches.lookup(None, &request.url).await {
            Ok(Some(cached)) => {
                debug!(url = %request.url, "serving from cache");
                return WorkerOutcome::respond(cached);
            }
            Ok(None) => {}
            Err(e) => warn!(url = %request.url, error = %e, "cache lookup failed"),
        }

        debug!(url = %request.url, "fetching from network");
        match self.fetcher.fetch(&request).await {
            Ok(response) => {
                if response.status == 200 && response.kind == ResponseKind::Basic {
                    let cache = self.version.dynamic_cache();
                    if let Err(e) = self.caches.put(&cache, &request.url, &response).await {
                        warn!(url = %request.url, error = %e, "dynamic cache write failed");
                    }
                }
                WorkerOutcome::respond(response)
            }
            Err(e) => {
                warn!(url = %request.url, error = %e, "network fetch failed");
                WorkerOutcome::respond(self.offline_fallback(&request).await)
            }
        }
    }

    async fn offline_fallback(&self, request: &Request) -> Response {
        if request.is_navigation() {
            if let Ok(shell) = self.scope.join(SHELL_PATH) {
                if let Ok(Some(cached)) = self.caches.lookup(None, &shell).await {
                    return cached;
                }
            }
        }
        Response::offline()
    }

    // ── Background sync ──────────────────────────────────────────────

    async fn sync(&self, tag: &str) -> WorkerOutcome {
        debug!(tag, "background sync triggered");
        if tag == SYNC_TAG {
            if let Err(e) = self.sync_sessions().await {
                warn!(error = %e, "error syncing meditation data");
            }
        }
        WorkerOutcome::default()
    }

    async fn sync_sessions(&self) -> Result<(), WorkerError> {
        // Not held across the request, so messages can queue meanwhile.
        let sessions = self.sessions.lock().await.load();
        if sessions.is_empty() {
            return Ok(());
        }

        let endpoint = self
            .scope
            .join(&self.sync_endpoint)
            .map_err(|source| WorkerError::InvalidUrl {
                url: self.sync_endpoint.clone(),
                source,
            })?;
        let body = serde_json::json!({ "sessions": sessions });
        let status = self.fetcher.post_json(&endpoint, &body).await?;
        if !(200..300).contains(&status) {
            return Err(WorkerError::SyncRejected { status });
        }

        let remaining = self.sessions.lock().await.acknowledge(sessions.len())?;
        info!(synced = sessions.len(), remaining, "meditation data synced");
        Ok(())
    }

    async fn periodic_sync(&self, tag: &str) -> WorkerOutcome {
        if tag != REMINDER_TAG {
            return WorkerOutcome::default();
        }
        let last = self.sessions.lock().await.last();
        let now = (self.clock)();
        let overdue = match last {
            Some(record) => now.saturating_sub(record.timestamp) > ONE_DAY_MS,
            None => true,
        };
        if !overdue {
            return WorkerOutcome::default();
        }
        WorkerOutcome::effects(vec![Effect::ShowNotification {
            notification: Notification::reminder(),
        }])
    }

    // ── Clients ──────────────────────────────────────────────────────

    fn notification_click(&self, action: Option<&str>, clients: &[Client]) -> WorkerOutcome {
        debug!(action = action.unwrap_or(""), "notification clicked");
        let mut effects = vec![Effect::CloseNotification];
        let target = match action {
            Some(ACTION_DISMISS) => None,
            Some(ACTION_START) => Some(AUTOSTART_PATH),
            _ => Some("/"),
        };
        if let Some(path) = target {
            match self.scope.join(path) {
                Ok(url) => effects.extend(self.open_or_focus(url, clients)),
                Err(e) => warn!(path, error = %e, "cannot resolve window url"),
            }
        }
        WorkerOutcome::effects(effects)
    }

    /// Reuse a window already showing the app, otherwise open a new one.
    fn open_or_focus(&self, url: Url, clients: &[Client]) -> Vec<Effect> {
        match clients.iter().find(|c| c.url.origin() == self.scope.origin()) {
            Some(client) => vec![
                Effect::FocusClient { id: client.id.clone() },
                Effect::Navigate {
                    id: client.id.clone(),
                    url,
                },
            ],
            None => vec![Effect::OpenWindow { url }],
        }
    }

    async fn message(&self, message: WorkerMessage) -> WorkerOutcome {
        debug!(?message, "message received");
        match message {
            WorkerMessage::SkipWaiting => WorkerOutcome::effects(vec![Effect::SkipWaiting]),
            WorkerMessage::GetVersion => WorkerOutcome::effects(vec![Effect::Reply {
                version: self.version.name(),
            }]),
            WorkerMessage::CacheMeditationData { payload } => {
                let record = SessionRecord::new(payload, (self.clock)());
                match self.sessions.lock().await.append(record) {
                    Ok(queued) => {
                        debug!(queued, "meditation data cached");
                        WorkerOutcome::effects(vec![Effect::RegisterSync { tag: SYNC_TAG.into() }])
                    }
                    Err(e) => {
                        warn!(error = %e, "error caching meditation data");
                        WorkerOutcome::default()
                    }
                }
            }
        }
    }
}
