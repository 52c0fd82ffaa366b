//! Error type shared by configuration, backends and the refresh path.
//!
//! Readers of the cache never see any of these: the read path is infallible.

/// Errors raised while configuring or refreshing the protected-word cache.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// A setting could not be parsed or holds a value the loop cannot run with.
    /// Fatal: surfaced at construction time.
    #[error("invalid setting `{key}`: {reason}")]
    InvalidSetting { key: String, reason: String },

    /// The backend could not be reached or rejected the request.
    #[error("backend request failed: {0}")]
    Backend(String),

    /// The backend answered with something that is not a search response.
    #[error("malformed backend response: {0}")]
    MalformedResponse(String),

    /// `start()` was called outside of a tokio runtime.
    #[error("refresh loop requires a running tokio runtime")]
    NoRuntime,
}

impl SyncError {
    pub(crate) fn invalid_setting(key: &str, reason: impl Into<String>) -> Self {
        SyncError::InvalidSetting {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        SyncError::Backend(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
