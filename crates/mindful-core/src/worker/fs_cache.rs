//! Cache storage on disk.
//!
//! Layout: `<root>/<cache name>/<sha256(url)>.json`, one file per entry,
//! bodies base64-encoded.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;
use url::Url;

use super::cache::CacheStorage;
use super::http::{Response, ResponseKind};
use crate::error::WorkerError;

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    url: String,
    status: u16,
    #[serde(default)]
    status_text: String,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    kind: ResponseKind,
    body: String,
}

impl StoredEntry {
    fn new(url: &Url, response: &Response) -> Self {
        Self {
            url: url.to_string(),
            status: response.status,
            status_text: response.status_text.clone(),
            headers: response.headers.clone(),
            kind: response.kind,
            body: base64::engine::general_purpose::STANDARD.encode(&response.body),
        }
    }

    fn into_response(self) -> Result<Response, WorkerError> {
        let body = base64::engine::general_purpose::STANDARD
            .decode(self.body.as_bytes())
            .map_err(|e| WorkerError::Cache(format!("corrupt body for {}: {e}", self.url)))?;
        Ok(Response {
            status: self.status,
            status_text: self.status_text,
            headers: self.headers,
            body,
            kind: self.kind,
        })
    }
}

#[derive(Debug, Clone)]
pub struct FsCacheStorage {
    root: PathBuf,
}

impl FsCacheStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn cache_dir(&self, cache: &str) -> Result<PathBuf, WorkerError> {
        if cache.is_empty() || cache.starts_with('.') || cache.contains(&['/', '\\'][..]) {
            return Err(WorkerError::Cache(format!("invalid cache name '{cache}'")));
        }
        Ok(self.root.join(cache))
    }

    fn entry_file(dir: &Path, url: &Url) -> PathBuf {
        let digest = Sha256::digest(url.as_str().as_bytes());
        dir.join(format!("{}.json", hex::encode(digest)))
    }

    async fn read_entry(path: &Path) -> Result<Option<Response>, WorkerError> {
        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(path, e)),
        };
        let entry: StoredEntry = serde_json::from_slice(&raw)
            .map_err(|e| WorkerError::Cache(format!("corrupt entry {}: {e}", path.display())))?;
        entry.into_response().map(Some)
    }
}

fn io_error(path: &Path, e: std::io::Error) -> WorkerError {
    WorkerError::Cache(format!("{}: {e}", path.display()))
}

#[async_trait]
impl CacheStorage for FsCacheStorage {
    async fn keys(&self) -> Result<Vec<String>, WorkerError> {
        let mut dir = match tokio::fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&self.root, e)),
        };
        let mut names = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(|e| io_error(&self.root, e))? {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if let (true, Some(name)) = (is_dir, entry.file_name().to_str()) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    async fn lookup(&self, cache: Option<&str>, url: &Url) -> Result<Option<Response>, WorkerError> {
        let names = match cache {
            Some(name) => vec![name.to_string()],
            None => self.keys().await?,
        };
        for name in names {
            let dir = self.cache_dir(&name)?;
            if let Some(response) = Self::read_entry(&Self::entry_file(&dir, url)).await? {
                return Ok(Some(response));
            }
        }
        Ok(None)
    }

    async fn put(&self, cache: &str, url: &Url, response: &Response) -> Result<(), WorkerError> {
        let dir = self.cache_dir(cache)?;
        tokio::fs::create_dir_all(&dir).await.map_err(|e| io_error(&dir, e))?;
        let path = Self::entry_file(&dir, url);
        let json = serde_json::to_vec(&StoredEntry::new(url, response))
            .map_err(|e| WorkerError::Cache(e.to_string()))?;
        tokio::fs::write(&path, json).await.map_err(|e| io_error(&path, e))
    }

    async fn entries(&self, cache: &str) -> Result<Vec<Url>, WorkerError> {
        let dir_path = self.cache_dir(cache)?;
        let mut dir = match tokio::fs::read_dir(&dir_path).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&dir_path, e)),
        };
        let mut urls = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(|e| io_error(&dir_path, e))? {
            let path = entry.path();
            let raw = tokio::fs::read(&path).await.map_err(|e| io_error(&path, e))?;
            match serde_json::from_slice::<StoredEntry>(&raw).map(|s| Url::parse(&s.url)) {
                Ok(Ok(url)) => urls.push(url),
                _ => warn!(path = %path.display(), "skipping unreadable cache entry"),
            }
        }
        urls.sort();
        Ok(urls)
    }

    async fn delete(&self, cache: &str) -> Result<bool, WorkerError> {
        let dir = self.cache_dir(cache)?;
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(&dir, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn entries_survive_a_new_handle() {
        let tmp = TempDir::new().unwrap();
        let url = Url::parse("http://localhost:8080/assets/icons/icon-72x72.png").unwrap();
        let response = Response::new(200, vec![0u8, 159, 146, 150], ResponseKind::Basic)
            .with_header("Content-Type", "image/png");

        FsCacheStorage::new(tmp.path())
            .put("app-static-v1", &url, &response)
            .await
            .unwrap();

        let storage = FsCacheStorage::new(tmp.path());
        assert_eq!(storage.keys().await.unwrap(), vec!["app-static-v1".to_string()]);
        assert_eq!(storage.lookup(None, &url).await.unwrap(), Some(response));
        assert_eq!(storage.entries("app-static-v1").await.unwrap(), vec![url]);
    }

    #[tokio::test]
    async fn delete_and_missing_root() {
        let tmp = TempDir::new().unwrap();
        let storage = FsCacheStorage::new(tmp.path().join("caches"));
        assert!(storage.keys().await.unwrap().is_empty());
        assert!(!storage.delete("old-v0").await.unwrap());

        let url = Url::parse("http://localhost/").unwrap();
        storage
            .put("old-v0", &url, &Response::new(200, "", ResponseKind::Basic))
            .await
            .unwrap();
        assert!(storage.delete("old-v0").await.unwrap());
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_path_like_cache_names() {
        let storage = FsCacheStorage::new("/tmp/unused");
        let url = Url::parse("http://localhost/").unwrap();
        let response = Response::new(200, "", ResponseKind::Basic);
        assert!(storage.put("../escape", &url, &response).await.is_err());
        assert!(storage.put("..", &url, &response).await.is_err());
    }
}
