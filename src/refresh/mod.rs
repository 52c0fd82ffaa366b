//! Protected-word refresh - keep the cache in step with the backend index.
//!
//! Provides two refresh mechanisms:
//! 1. **Single refresh** (RefreshService): one poll cycle, on demand
//! 2. **Scheduled refresh** (RefreshLoop): periodic background task (5-minute default)

pub mod scheduler;
pub mod service;

pub use scheduler::{RefreshLoop, RunState};
pub use service::{RefreshOutcome, RefreshService, RefreshStats};
