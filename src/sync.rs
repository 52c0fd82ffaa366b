//! Host-side wiring of the protected-word cache and its refresh loop.

use crate::cache::{ProtectedWordCache, ProtectedWordLookup};
use crate::config::{RefreshConfig, Settings};
use crate::error::Result;
use crate::refresh::{RefreshLoop, RunState};
use crate::store::WordStore;
use std::sync::Arc;

/// Owns one cache and the loop that feeds it.
///
/// The host builds a `WordSync` at service construction, hands
/// [`WordSync::lookup`] to whatever builds tokenizers, and calls
/// `start()`/`stop()` from its own lifecycle.
pub struct WordSync {
    cache: Arc<ProtectedWordCache>,
    refresh: RefreshLoop,
}

impl WordSync {
    /// Resolves the configuration from `settings` and builds the cache and
    /// loop. Configuration errors surface here.
    pub fn from_settings(settings: &Settings, store: Arc<dyn WordStore>) -> Result<Self> {
        Self::new(RefreshConfig::from_settings(settings)?, store)
    }

    pub fn new(config: RefreshConfig, store: Arc<dyn WordStore>) -> Result<Self> {
        let cache = Arc::new(ProtectedWordCache::new());
        let refresh = RefreshLoop::new(config, store, cache.clone())?;
        Ok(Self { cache, refresh })
    }

    pub fn cache(&self) -> &Arc<ProtectedWordCache> {
        &self.cache
    }

    /// Read-only capability for the tokenizer.
    pub fn lookup(&self) -> Arc<dyn ProtectedWordLookup> {
        self.cache.clone()
    }

    pub fn refresh_loop(&self) -> &RefreshLoop {
        &self.refresh
    }

    pub fn state(&self) -> RunState {
        self.refresh.state()
    }

    pub fn start(&self) -> Result<()> {
        self.refresh.start()
    }

    pub async fn stop(&self) -> bool {
        self.refresh.stop().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::REFRESH_INTERVAL_SETTING;
    use crate::error::SyncError;
    use crate::store::InMemoryWordStore;

    #[test]
    fn test_bad_settings_prevent_construction() {
        let settings = Settings::new().with(REFRESH_INTERVAL_SETTING, "whenever");
        let result = WordSync::from_settings(&settings, Arc::new(InMemoryWordStore::new()));
        assert!(matches!(result, Err(SyncError::InvalidSetting { .. })));
    }

    #[test]
    fn test_lookup_shares_the_cache() {
        let sync = WordSync::new(
            RefreshConfig::default(),
            Arc::new(InMemoryWordStore::new()),
        )
        .unwrap();
        let lookup = sync.lookup();

        assert!(!lookup.is_protected("1tb"));
        sync.cache().replace(["1tb".to_string()].into_iter().collect());
        assert!(lookup.is_protected("1tb"));
    }
}
