//! Single protected-word refresh.
//!
//! One poll cycle: check that the index exists, fetch its documents, build a
//! fresh set and publish it to the cache. Used by the scheduler on every
//! tick and available on its own for an immediate reload.

use crate::cache::ProtectedWordCache;
use crate::config::RefreshConfig;
use crate::error::Result;
use crate::store::WordStore;
use crate::types::now_ms;
use log::{debug, warn};
use std::collections::HashSet;
use std::sync::Arc;

/// Statistics from a refresh operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshStats {
    /// Number of distinct words published
    pub words_published: usize,
    /// Documents skipped for a missing or non-string word field
    pub documents_skipped: usize,
    /// Duration of refresh operation in milliseconds
    pub duration_ms: u64,
    /// Timestamp of refresh
    pub timestamp: u64,
    /// Cache generation installed by this refresh
    pub generation: u64,
}

/// What a single poll cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new set was published
    Refreshed(RefreshStats),
    /// The index does not exist yet; the cache was left untouched
    IndexMissing,
}

/// Protected-word refresh service.
pub struct RefreshService {
    store: Arc<dyn WordStore>,
    cache: Arc<ProtectedWordCache>,
    config: RefreshConfig,
}

impl RefreshService {
    /// Create a new refresh service.
    pub fn new(
        store: Arc<dyn WordStore>,
        cache: Arc<ProtectedWordCache>,
        config: RefreshConfig,
    ) -> Self {
        Self {
            store,
            cache,
            config,
        }
    }

    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<ProtectedWordCache> {
        &self.cache
    }

    /// Runs one poll cycle against the backend.
    ///
    /// **Algorithm**:
    /// - Skip the cycle if the index does not exist
    /// - Fetch up to `max_results` documents
    /// - Collect every string `word` field into a new set
    /// - Swap the set into the cache in one step
    ///
    /// # Error Handling
    /// Backend errors are returned to the caller and the cache is not
    /// modified.
    pub async fn refresh_once(&self) -> Result<RefreshOutcome> {
        let start = now_ms();
        let index = self.config.index.as_str();

        if !self.store.index_exists(index).await? {
            debug!("Protected words index `{}` does not exist, skipping", index);
            return Ok(RefreshOutcome::IndexMissing);
        }

        let documents = self
            .store
            .fetch_all(index, self.config.qualifier.as_deref(), self.config.max_results)
            .await?;

        if documents.len() >= self.config.max_results {
            warn!(
                "Fetched {} documents from `{}`, the configured ceiling; words beyond it are not protected",
                documents.len(),
                index
            );
        }

        let mut words = HashSet::with_capacity(documents.len());
        let mut skipped = 0;
        for document in &documents {
            match document.word() {
                Some(word) => {
                    words.insert(word.to_string());
                }
                None => {
                    debug!("Skipping document without a string word field: {:?}", document.fields);
                    skipped += 1;
                }
            }
        }
        if skipped > 0 {
            warn!(
                "Skipped {} of {} documents in `{}` without a usable word field",
                skipped,
                documents.len(),
                index
            );
        }

        let words_published = words.len();
        let generation = self.cache.replace(words);

        Ok(RefreshOutcome::Refreshed(RefreshStats {
            words_published,
            documents_skipped: skipped,
            duration_ms: now_ms().saturating_sub(start),
            timestamp: now_ms(),
            generation,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryWordStore, WordDocument};
    use serde_json::json;

    fn service_with(store: Arc<InMemoryWordStore>) -> RefreshService {
        RefreshService::new(
            store,
            Arc::new(ProtectedWordCache::new()),
            RefreshConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_missing_index_leaves_cache_empty() {
        let store = Arc::new(InMemoryWordStore::new());
        let service = service_with(store.clone());

        let outcome = service.refresh_once().await.unwrap();

        assert_eq!(outcome, RefreshOutcome::IndexMissing);
        assert!(service.cache().is_empty());
        assert_eq!(store.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_refresh_publishes_words() {
        let store = Arc::new(InMemoryWordStore::new());
        store.index_word("protected_words", "1tb");
        store.index_word("protected_words", "j2se");
        store.index_word("protected_words", "1tb");
        let service = service_with(store);

        match service.refresh_once().await.unwrap() {
            RefreshOutcome::Refreshed(stats) => {
                assert_eq!(stats.words_published, 2);
                assert_eq!(stats.documents_skipped, 0);
                assert_eq!(stats.generation, 1);
            }
            other => panic!("expected refresh, got {:?}", other),
        }
        assert!(service.cache().snapshot().contains("j2se"));
    }

    #[tokio::test]
    async fn test_malformed_documents_are_skipped() {
        let store = Arc::new(InMemoryWordStore::new());
        store.index_word("protected_words", "1tb");
        store.index_word("protected_words", "wi-fi");
        store.index_document(
            "protected_words",
            WordDocument::new(json!({"word": ["not", "a", "string"]}).as_object().cloned().unwrap()),
        );
        store.index_document("protected_words", WordDocument::default());
        let service = service_with(store);

        match service.refresh_once().await.unwrap() {
            RefreshOutcome::Refreshed(stats) => {
                assert_eq!(stats.words_published, 2);
                assert_eq!(stats.documents_skipped, 2);
            }
            other => panic!("expected refresh, got {:?}", other),
        }
        assert_eq!(service.cache().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_set() {
        let store = Arc::new(InMemoryWordStore::new());
        store.index_word("protected_words", "1tb");
        let service = service_with(store.clone());
        service.refresh_once().await.unwrap();

        store.fail_next_fetches(1);
        assert!(service.refresh_once().await.is_err());

        assert!(service.cache().snapshot().contains("1tb"));
        assert_eq!(service.cache().generation(), 1);
    }
}
