//! Named response caches.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use url::Url;

use super::http::Response;
use crate::error::WorkerError;

/// A set of named caches mapping URLs to stored responses.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Names of all existing caches.
    async fn keys(&self) -> Result<Vec<String>, WorkerError>;

    /// Whether a cache with this name exists.
    async fn has(&self, cache: &str) -> Result<bool, WorkerError> {
        Ok(self.keys().await?.iter().any(|k| k == cache))
    }

    /// Look up `url` in one cache, or in every cache when `cache` is `None`.
    async fn lookup(&self, cache: Option<&str>, url: &Url) -> Result<Option<Response>, WorkerError>;

    /// Store one response, creating the cache if needed.
    async fn put(&self, cache: &str, url: &Url, response: &Response) -> Result<(), WorkerError>;

    /// Store a batch of responses.
    async fn put_all(&self, cache: &str, entries: &[(Url, Response)]) -> Result<(), WorkerError> {
        for (url, response) in entries {
            self.put(cache, url, response).await?;
        }
        Ok(())
    }

    /// URLs stored in a cache.
    async fn entries(&self, cache: &str) -> Result<Vec<Url>, WorkerError>;

    /// Delete a whole cache. Returns whether it existed.
    async fn delete(&self, cache: &str) -> Result<bool, WorkerError>;
}

/// In-process cache storage.
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    caches: RwLock<BTreeMap<String, BTreeMap<String, (Url, Response)>>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn keys(&self) -> Result<Vec<String>, WorkerError> {
        Ok(self.caches.read().await.keys().cloned().collect())
    }

    async fn lookup(&self, cache: Option<&str>, url: &Url) -> Result<Option<Response>, WorkerError> {
        let caches = self.caches.read().await;
        let found = match cache {
            Some(name) => caches.get(name).and_then(|c| c.get(url.as_str())),
            None => caches.values().find_map(|c| c.get(url.as_str())),
        };
        Ok(found.map(|(_, response)| response.clone()))
    }

    async fn put(&self, cache: &str, url: &Url, response: &Response) -> Result<(), WorkerError> {
        self.caches
            .write()
            .await
            .entry(cache.to_string())
            .or_default()
            .insert(url.to_string(), (url.clone(), response.clone()));
        Ok(())
    }

    async fn put_all(&self, cache: &str, entries: &[(Url, Response)]) -> Result<(), WorkerError> {
        let mut caches = self.caches.write().await;
        let target = caches.entry(cache.to_string()).or_default();
        for (url, response) in entries {
            target.insert(url.to_string(), (url.clone(), response.clone()));
        }
        Ok(())
    }

    async fn entries(&self, cache: &str) -> Result<Vec<Url>, WorkerError> {
        Ok(self
            .caches
            .read()
            .await
            .get(cache)
            .map(|c| c.values().map(|(url, _)| url.clone()).collect())
            .unwrap_or_default())
    }

    async fn delete(&self, cache: &str) -> Result<bool, WorkerError> {
        Ok(self.caches.write().await.remove(cache).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::ResponseKind;

    #[tokio::test]
    async fn lookup_across_caches() {
        let storage = MemoryCacheStorage::new();
        let url = Url::parse("http://localhost/a.png").unwrap();
        let response = Response::new(200, "png", ResponseKind::Basic);

        assert!(storage.lookup(None, &url).await.unwrap().is_none());
        storage.put("dynamic", &url, &response).await.unwrap();

        assert_eq!(storage.lookup(None, &url).await.unwrap(), Some(response.clone()));
        assert!(storage.lookup(Some("static"), &url).await.unwrap().is_none());
        assert_eq!(storage.entries("dynamic").await.unwrap(), vec![url]);
        assert!(storage.has("dynamic").await.unwrap());

        assert!(storage.delete("dynamic").await.unwrap());
        assert!(!storage.delete("dynamic").await.unwrap());
        assert!(storage.keys().await.unwrap().is_empty());
    }
}
