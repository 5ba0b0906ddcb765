//! Request and response values seen by the worker.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::WorkerError;

/// What the requester will do with the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    /// Top-level navigation.
    Document,
    Image,
    Script,
    Style,
    #[default]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub url: Url,
    pub destination: Destination,
}

impl Request {
    pub fn get(url: Url) -> Self {
        Self {
            method: "GET".into(),
            url,
            destination: Destination::Other,
        }
    }

    /// Resolve `url` (absolute, or relative to `scope`) into a GET request.
    pub fn resolve(url: &str, scope: &Url) -> Result<Self, WorkerError> {
        let resolved = scope.join(url).map_err(|source| WorkerError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        Ok(Self::get(resolved))
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }

    pub fn is_http(&self) -> bool {
        self.url.scheme().starts_with("http")
    }

    pub fn is_navigation(&self) -> bool {
        self.destination == Destination::Document
    }
}

/// Response tainting, as far as caching cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    /// Same origin as the worker scope.
    Basic,
    /// Cross-origin.
    Cors,
    /// Built by the worker itself.
    Synthetic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    /// Lowercased header names.
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
    pub kind: ResponseKind,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>, kind: ResponseKind) -> Self {
        Self {
            status,
            status_text: String::new(),
            headers: BTreeMap::new(),
            body: body.into(),
            kind,
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Fallback for requests that neither the cache nor the network can
    /// answer.
    pub fn offline() -> Self {
        let mut response = Self::new(503, "Offline - Content not available", ResponseKind::Synthetic)
            .with_header("content-type", "text/plain");
        response.status_text = "Service Unavailable".into();
        response
    }

    /// 2xx.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}
