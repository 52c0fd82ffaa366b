//! Elasticsearch-compatible HTTP word store.

use super::{WordDocument, WordStore};
use crate::error::{Result, SyncError};
use log::debug;
use reqwest::{Client, StatusCode};
use serde_json::{json, Map, Value};
use std::time::Duration;

/// Polls a search cluster over its REST API.
pub struct HttpWordStore {
    client: Client,
    base_url: String,
}

impl HttpWordStore {
    /// Creates a store talking to `base_url` (e.g. `http://localhost:9200`).
    /// Every request is bounded by `request_timeout`.
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("protected-words/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn search_url(&self, index: &str, qualifier: Option<&str>) -> String {
        match qualifier {
            Some(qualifier) => format!("{}/{}/{}/_search", self.base_url, index, qualifier),
            None => format!("{}/{}/_search", self.base_url, index),
        }
    }
}

#[async_trait::async_trait]
impl WordStore for HttpWordStore {
    async fn index_exists(&self, index: &str) -> Result<bool> {
        let url = format!("{}/{}", self.base_url, index);
        let response = self.client.head(&url).send().await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(SyncError::Backend(format!(
                "unexpected status {} checking index `{}`",
                status, index
            ))),
        }
    }

    async fn fetch_all(
        &self,
        index: &str,
        qualifier: Option<&str>,
        limit: usize,
    ) -> Result<Vec<WordDocument>> {
        let url = self.search_url(index, qualifier);
        let body = json!({
            "size": limit,
            "query": { "match_all": {} }
        });
        debug!("Searching {} (size {})", url, limit);

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Backend(format!(
                "search on `{}` returned status {}",
                index, status
            )));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| SyncError::MalformedResponse(e.to_string()))?;
        parse_search_hits(&value)
    }
}

/// Extracts `hits.hits[]._source` from a search response body.
///
/// A hit without an object `_source` becomes an empty document so the caller
/// can skip it without failing the whole poll.
pub fn parse_search_hits(response: &Value) -> Result<Vec<WordDocument>> {
    let hits = response
        .get("hits")
        .and_then(|hits| hits.get("hits"))
        .and_then(Value::as_array)
        .ok_or_else(|| SyncError::MalformedResponse("missing `hits.hits` array".to_string()))?;

    Ok(hits
        .iter()
        .map(|hit| {
            let fields = hit
                .get("_source")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_else(Map::new);
            WordDocument::new(fields)
        })
        .collect())
}
