//! In-memory word store.

use super::{WordDocument, WordStore};
use crate::error::{Result, SyncError};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Process-local backend keyed by index name.
///
/// Type qualifiers are accepted and ignored. Supports injecting failures
/// into upcoming fetches and counts every fetch it serves or fails.
#[derive(Debug, Default)]
pub struct InMemoryWordStore {
    indices: RwLock<HashMap<String, Vec<WordDocument>>>,
    pending_failures: AtomicUsize,
    fetches: AtomicUsize,
}

impl InMemoryWordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty index; an existing index is left as is.
    pub fn create_index(&self, index: &str) {
        self.indices.write().entry(index.to_string()).or_default();
    }

    pub fn delete_index(&self, index: &str) -> bool {
        self.indices.write().remove(index).is_some()
    }

    /// Adds a document, creating the index on first write.
    pub fn index_document(&self, index: &str, document: WordDocument) {
        self.indices
            .write()
            .entry(index.to_string())
            .or_default()
            .push(document);
    }

    pub fn index_word(&self, index: &str, word: &str) {
        self.index_document(index, WordDocument::with_word(word));
    }

    /// Removes every document whose word equals `word`. Returns how many
    /// were removed.
    pub fn delete_word(&self, index: &str, word: &str) -> usize {
        let mut indices = self.indices.write();
        match indices.get_mut(index) {
            Some(documents) => {
                let before = documents.len();
                documents.retain(|doc| doc.word() != Some(word));
                before - documents.len()
            }
            None => 0,
        }
    }

    /// Makes the next `count` fetches fail with a backend error.
    pub fn fail_next_fetches(&self, count: usize) {
        self.pending_failures.store(count, Ordering::SeqCst);
    }

    /// Number of `fetch_all` calls seen so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn take_failure(&self) -> bool {
        self.pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait::async_trait]
impl WordStore for InMemoryWordStore {
    async fn index_exists(&self, index: &str) -> Result<bool> {
        Ok(self.indices.read().contains_key(index))
    }

    async fn fetch_all(
        &self,
        index: &str,
        _qualifier: Option<&str>,
        limit: usize,
    ) -> Result<Vec<WordDocument>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if self.take_failure() {
            return Err(SyncError::Backend(format!(
                "injected failure fetching `{}`",
                index
            )));
        }

        let indices = self.indices.read();
        let documents = indices
            .get(index)
            .ok_or_else(|| SyncError::Backend(format!("no such index `{}`", index)))?;
        Ok(documents.iter().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_index_lifecycle() {
        let store = InMemoryWordStore::new();
        assert!(!store.index_exists("words").await.unwrap());

        store.index_word("words", "1tb");
        store.index_word("words", "j2se");
        assert!(store.index_exists("words").await.unwrap());
        assert_eq!(store.fetch_all("words", None, 10).await.unwrap().len(), 2);

        assert_eq!(store.delete_word("words", "1tb"), 1);
        assert_eq!(store.fetch_all("words", None, 10).await.unwrap().len(), 1);

        assert!(store.delete_index("words"));
        assert!(!store.index_exists("words").await.unwrap());
    }

    #[tokio::test]
    async fn test_fetch_respects_limit() {
        let store = InMemoryWordStore::new();
        for i in 0..5 {
            store.index_word("words", &format!("w{}", i));
        }
        assert_eq!(store.fetch_all("words", None, 3).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_injected_failures_are_consumed() {
        let store = InMemoryWordStore::new();
        store.create_index("words");
        store.fail_next_fetches(2);

        assert!(store.fetch_all("words", None, 10).await.is_err());
        assert!(store.fetch_all("words", None, 10).await.is_err());
        assert!(store.fetch_all("words", None, 10).await.is_ok());
        assert_eq!(store.fetch_count(), 3);
    }
}
