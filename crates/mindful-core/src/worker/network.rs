//! Network access for the worker.

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use super::http::{Request, Response, ResponseKind};
use crate::error::WorkerError;

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform `request`. Non-2xx statuses are responses, not errors; only
    /// transport failures are `Err`.
    async fn fetch(&self, request: &Request) -> Result<Response, WorkerError>;

    /// POST a JSON body, returning the response status.
    async fn post_json(&self, url: &Url, body: &serde_json::Value) -> Result<u16, WorkerError>;
}

/// `reqwest`-backed fetcher scoped to the worker's origin.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    scope: Url,
}

impl HttpFetcher {
    pub fn new(scope: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            scope,
        }
    }

    pub fn with_client(client: reqwest::Client, scope: Url) -> Self {
        Self { client, scope }
    }

    fn kind_for(&self, url: &Url) -> ResponseKind {
        if url.origin() == self.scope.origin() {
            ResponseKind::Basic
        } else {
            ResponseKind::Cors
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, WorkerError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| WorkerError::Network(format!("invalid method {}: {e}", request.method)))?;

        let reply = self.client.request(method, request.url.clone()).send().await?;
        let status = reply.status();
        let headers = reply
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = reply.bytes().await?.to_vec();

        debug!(url = %request.url, status = status.as_u16(), "network response");
        Ok(Response {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
            kind: self.kind_for(&request.url),
        })
    }

    async fn post_json(&self, url: &Url, body: &serde_json::Value) -> Result<u16, WorkerError> {
        let reply = self.client.post(url.clone()).json(body).send().await?;
        Ok(reply.status().as_u16())
    }
}
