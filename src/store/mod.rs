//! Search backends the refresh loop polls for protected words.
//!
//! - **InMemoryWordStore**: process-local indices, for embedding and tests
//! - **HttpWordStore**: Elasticsearch-compatible HTTP API

pub mod http;
pub mod memory;

pub use http::HttpWordStore;
pub use memory::InMemoryWordStore;

use crate::error::Result;
use crate::types::WORD_FIELD;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One document returned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WordDocument {
    pub fields: Map<String, Value>,
}

impl WordDocument {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Document carrying a single `word` field.
    pub fn with_word(word: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert(WORD_FIELD.to_string(), Value::String(word.into()));
        Self { fields }
    }

    /// The protected word, if the field is present and a string.
    pub fn word(&self) -> Option<&str> {
        self.fields.get(WORD_FIELD)?.as_str()
    }
}

/// Read-only source of protected-word documents.
#[async_trait::async_trait]
pub trait WordStore: Send + Sync {
    /// Whether `index` currently exists. A missing index is not an error.
    async fn index_exists(&self, index: &str) -> Result<bool>;

    /// Fetches up to `limit` documents from `index`, optionally narrowed by
    /// a type qualifier.
    async fn fetch_all(
        &self,
        index: &str,
        qualifier: Option<&str>,
        limit: usize,
    ) -> Result<Vec<WordDocument>>;
}
