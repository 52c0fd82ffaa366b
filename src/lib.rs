//! # protected-words
//!
//! Keeps an in-memory set of "protected words" (tokens a word-delimiter
//! tokenizer must not split) eventually consistent with an index in a search
//! backend.
//!
//! # Architecture
//! - [`store::WordStore`]: backend collaborator (in-memory or HTTP)
//! - [`cache::ProtectedWordCache`]: lock-free snapshot reads, atomic replace
//! - [`refresh::RefreshLoop`]: background poll-sleep-poll task
//! - [`sync::WordSync`]: host wiring of the above

pub mod cache;
pub mod config;
pub mod error;
pub mod refresh;
pub mod store;
pub mod sync;
pub mod types;

pub use cache::{ProtectedWordCache, ProtectedWordLookup, ProtectedWordSet};
pub use config::{RefreshConfig, Settings};
pub use error::{Result, SyncError};
pub use refresh::{RefreshLoop, RefreshOutcome, RefreshService, RefreshStats, RunState};
pub use store::{HttpWordStore, InMemoryWordStore, WordDocument, WordStore};
pub use sync::WordSync;
