//! Protected-word cache: lock-free snapshot reads, single-writer replace.
//!
//! # Thread Safety
//! - The current set sits behind an `ArcSwap`; readers load it without taking
//!   a lock and never wait on the refresher.
//! - A published [`ProtectedWordSet`] is never mutated. A refresh builds a
//!   new set and swaps the pointer, so a reader sees either the old set or
//!   the new one in full.
//! - Writers are serialized among themselves so generations are published in
//!   order.

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// Membership query consulted by the word-delimiter tokenizer.
pub trait ProtectedWordLookup: Send + Sync {
    /// Returns true if `word` must pass through the tokenizer unsplit.
    fn is_protected(&self, word: &str) -> bool;
}

/// Immutable set of protected words published by one poll cycle.
#[derive(Debug, Clone, Default)]
pub struct ProtectedWordSet {
    words: HashSet<String>,
    generation: u64,
}

impl ProtectedWordSet {
    pub fn new(words: HashSet<String>) -> Self {
        Self {
            words,
            generation: 0,
        }
    }

    /// Publication counter; the initial empty set is generation 0.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    pub fn as_set(&self) -> &HashSet<String> {
        &self.words
    }
}

impl<S: Into<String>> FromIterator<S> for ProtectedWordSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

impl ProtectedWordLookup for ProtectedWordSet {
    fn is_protected(&self, word: &str) -> bool {
        self.contains(word)
    }
}

/// Holder of the current [`ProtectedWordSet`].
///
/// Starts out empty: until the first successful poll nothing is protected.
#[derive(Debug)]
pub struct ProtectedWordCache {
    current: ArcSwap<ProtectedWordSet>,
    /// Serializes writers; never touched on the read path
    write_lock: Mutex<()>,
}

impl ProtectedWordCache {
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(ProtectedWordSet::default()),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the current set. Never blocks, never fails.
    pub fn snapshot(&self) -> Arc<ProtectedWordSet> {
        self.current.load_full()
    }

    /// Installs `words` as the new current set and returns its generation.
    pub fn replace(&self, words: HashSet<String>) -> u64 {
        let _writer = self.write_lock.lock();
        let generation = self.current.load().generation + 1;
        self.current
            .store(Arc::new(ProtectedWordSet { words, generation }));
        generation
    }

    pub fn generation(&self) -> u64 {
        self.current.load().generation
    }

    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }
}

impl Default for ProtectedWordCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtectedWordLookup for ProtectedWordCache {
    fn is_protected(&self, word: &str) -> bool {
        self.current.load().contains(word)
    }
}
