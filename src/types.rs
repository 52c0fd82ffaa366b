//! Small shared helpers.

use std::time::{SystemTime, UNIX_EPOCH};

/// Name of the document field holding the protected word.
pub const WORD_FIELD: &str = "word";

/// Milliseconds since the UNIX epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
