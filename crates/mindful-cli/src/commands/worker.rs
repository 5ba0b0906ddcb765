use clap::Subcommand;
use mindful_core::storage::data_dir;
use mindful_core::worker::{
    CacheStorage, Client, Destination, Effect, FsCacheStorage, HttpFetcher, Request, SessionLog, WorkerMessage,
    REMINDER_TAG, SYNC_TAG,
};
use mindful_core::{CacheWorker, Config, JsonFileStore, WorkerEvent, WorkerOutcome};
use serde_json::json;
use url::Url;

use crate::output::{print_json, print_json_line, CliResult};

type Worker = CacheWorker<FsCacheStorage, HttpFetcher>;

#[derive(Subcommand)]
pub enum WorkerAction {
    /// Precache the app shell
    Install,
    /// Remove caches from older versions and take control
    Activate,
    /// Fetch a URL through the worker (cache-first)
    Fetch {
        /// Absolute URL or path relative to the origin
        url: String,
        /// Treat as a page navigation
        #[arg(long)]
        navigate: bool,
        /// Print the response body
        #[arg(long)]
        body: bool,
    },
    /// Run a background sync
    Sync {
        #[arg(long, default_value = SYNC_TAG)]
        tag: String,
    },
    /// Run a periodic sync (daily reminder check)
    Remind {
        #[arg(long, default_value = REMINDER_TAG)]
        tag: String,
    },
    /// Deliver a push message
    Push {
        /// Notification body text
        data: Option<String>,
    },
    /// Click the app notification
    Click {
        /// Action button: start-meditation or dismiss
        #[arg(long)]
        action: Option<String>,
        /// Open window client as ID=URL (repeatable)
        #[arg(long = "client", value_parser = parse_client)]
        clients: Vec<Client>,
    },
    /// Post a message, e.g. '{"type":"GET_VERSION"}'
    Message {
        json: String,
    },
    /// List caches and their entries
    Caches,
}

pub fn run(action: WorkerAction) -> CliResult {
    let config = Config::load()?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_action(action, &config))
}

async fn run_action(action: WorkerAction, config: &Config) -> CliResult {
    let worker = build_worker(config)?;
    let state = worker.restore().await?;
    tracing::debug!(%state, "worker ready");

    let event = match action {
        WorkerAction::Install => WorkerEvent::Install,
        WorkerAction::Activate => WorkerEvent::Activate,
        WorkerAction::Fetch { url, navigate, body } => {
            let mut request = Request::resolve(&url, worker.scope())?;
            if navigate {
                request = request.with_destination(Destination::Document);
            }
            return fetch(&worker, request, body).await;
        }
        WorkerAction::Sync { tag } => WorkerEvent::Sync { tag },
        WorkerAction::Remind { tag } => WorkerEvent::PeriodicSync { tag },
        WorkerAction::Push { data } => WorkerEvent::Push { data },
        WorkerAction::Click { action, clients } => WorkerEvent::NotificationClick { action, clients },
        WorkerAction::Message { json } => WorkerEvent::Message(serde_json::from_str::<WorkerMessage>(&json)?),
        WorkerAction::Caches => return list_caches(&worker).await,
    };

    let outcome = worker.handle(event).await?;
    print_effects(&outcome.effects)?;
    println!("{}", json!({ "state": worker.state().await }));
    Ok(())
}

fn build_worker(config: &Config) -> Result<Worker, Box<dyn std::error::Error>> {
    let caches = FsCacheStorage::new(data_dir()?.join("cache"));
    let origin = Url::parse(&config.worker.origin)?;
    let sessions = SessionLog::new(Box::new(JsonFileStore::open()?));
    Ok(CacheWorker::new(&config.worker, caches, HttpFetcher::new(origin), sessions)?)
}

async fn fetch(worker: &Worker, request: Request, body: bool) -> CliResult {
    let url = request.url.clone();
    let WorkerOutcome { response, effects } = worker.handle(WorkerEvent::Fetch(request)).await?;
    print_effects(&effects)?;
    let Some(response) = response else {
        println!("{url}: not handled by the worker");
        return Ok(());
    };
    println!(
        "{} {} {}",
        response.status,
        response.status_text,
        response.content_type().unwrap_or("-")
    );
    if body {
        println!("{}", response.text());
    }
    Ok(())
}

async fn list_caches(worker: &Worker) -> CliResult {
    let caches = worker.caches();
    let mut listing = serde_json::Map::new();
    for name in caches.keys().await? {
        let entries: Vec<String> = caches.entries(&name).await?.iter().map(Url::to_string).collect();
        listing.insert(name, json!(entries));
    }
    print_json(&listing)
}

fn print_effects(effects: &[Effect]) -> CliResult {
    for effect in effects {
        print_json_line(effect)?;
    }
    Ok(())
}

fn parse_client(value: &str) -> Result<Client, String> {
    let (id, url) = value
        .split_once('=')
        .ok_or_else(|| format!("expected ID=URL, got '{value}'"))?;
    let url = Url::parse(url).map_err(|e| format!("invalid client url '{url}': {e}"))?;
    Ok(Client {
        id: id.to_string(),
        url,
    })
}
