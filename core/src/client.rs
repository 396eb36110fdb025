//! Stateless HTTP request builder and response parser for the crawler API.
//!
//! # Design
//! `StatsClient` holds only the base URL and carries no mutable state between
//! calls. Each endpoint is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! The host executes the actual HTTP round-trip, keeping the core
//! deterministic and free of I/O dependencies.

use serde::de::DeserializeOwned;
use url::Url;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::range::TimeRange;
use crate::types::{HistoricalSnapshot, NetworkStats, NodeRecord, ProtocolStat, SoftwareStat};

/// Default page size used by the node list.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Synchronous, stateless client for the crawler stats API.
#[derive(Debug, Clone)]
pub struct StatsClient {
    base: Url,
}

impl StatsClient {
    /// Bind a client to `base_url` (`http` or `https`, optionally with a path
    /// prefix).
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base = Url::parse(base_url.trim())
            .map_err(|e| ApiError::InvalidInput(format!("base url {base_url:?}: {e}")))?;
        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(ApiError::InvalidInput(format!(
                "base url {base_url:?} is not an http(s) url"
            )));
        }
        Ok(Self { base })
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        url.set_query(None);
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn get(&self, url: Url) -> HttpRequest {
        tracing::trace!(%url, "built request");
        HttpRequest {
            method: HttpMethod::Get,
            url: url.into(),
            headers: vec![("accept".to_string(), "application/json".to_string())],
        }
    }

    pub fn build_stats(&self) -> HttpRequest {
        self.get(self.endpoint(&["api", "stats"]))
    }

    pub fn build_recent_nodes(&self, limit: u32, page: u32) -> HttpRequest {
        let mut url = self.endpoint(&["api", "nodes"]);
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("page", &page.to_string());
        self.get(url)
    }

    /// `address` is trimmed and sent as a single path segment.
    pub fn build_node_details(&self, address: &str) -> Result<HttpRequest, ApiError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(ApiError::InvalidInput("node address is empty".to_string()));
        }
        // URL parsing would collapse these into the parent path.
        if address == "." || address == ".." {
            return Err(ApiError::InvalidInput(format!("invalid node address: {address}")));
        }
        Ok(self.get(self.endpoint(&["api", "node", address])))
    }

    pub fn build_software_stats(&self) -> HttpRequest {
        self.get(self.endpoint(&["api", "software_stats"]))
    }

    pub fn build_incoming_stats(&self) -> HttpRequest {
        self.get(self.endpoint(&["api", "incoming_stats"]))
    }

    pub fn build_history(&self, range: TimeRange) -> HttpRequest {
        let mut url = self.endpoint(&["api", "stats", "history"]);
        url.query_pairs_mut().append_pair("range", range.as_str());
        self.get(url)
    }

    /// `query` is trimmed; whitespace-only queries are rejected.
    pub fn build_search_nodes(&self, query: &str) -> Result<HttpRequest, ApiError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ApiError::InvalidInput("search query is empty".to_string()));
        }
        let mut url = self.endpoint(&["api", "nodes", "search"]);
        url.query_pairs_mut().append_pair("q", query);
        Ok(self.get(url))
    }

    pub fn parse_stats(&self, response: HttpResponse) -> Result<NetworkStats, ApiError> {
        parse_json(response)
    }

    pub fn parse_recent_nodes(&self, response: HttpResponse) -> Result<Vec<NodeRecord>, ApiError> {
        parse_json(response)
    }

    /// `Ok(None)` when the crawler does not know the address: a 404, an
    /// empty body, `null` or `{}`.
    pub fn parse_node_details(&self, response: HttpResponse) -> Result<Option<NodeRecord>, ApiError> {
        if response.status == 404 {
            return Ok(None);
        }
        check_status(&response)?;
        let body = response.body.trim();
        if body.is_empty() {
            return Ok(None);
        }
        let value: serde_json::Value =
            serde_json::from_str(body).map_err(|e| ApiError::DeserializationError(e.to_string()))?;
        match value {
            serde_json::Value::Null => Ok(None),
            serde_json::Value::Object(ref map) if map.is_empty() => Ok(None),
            value => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| ApiError::DeserializationError(e.to_string())),
        }
    }

    pub fn parse_software_stats(&self, response: HttpResponse) -> Result<Vec<SoftwareStat>, ApiError> {
        parse_json(response)
    }

    pub fn parse_incoming_stats(&self, response: HttpResponse) -> Result<Vec<ProtocolStat>, ApiError> {
        parse_json(response)
    }

    pub fn parse_history(&self, response: HttpResponse) -> Result<Vec<HistoricalSnapshot>, ApiError> {
        parse_json(response)
    }

    pub fn parse_search_nodes(&self, response: HttpResponse) -> Result<Vec<NodeRecord>, ApiError> {
        parse_json(response)
    }
}

fn parse_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Map non-2xx status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    tracing::debug!(status = response.status, "unexpected response status");
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}
