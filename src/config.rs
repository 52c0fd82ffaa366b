//! Settings view and refresh configuration.
//!
//! The host hands over a flat, read-only [`Settings`] map. Everything the
//! refresh loop needs is resolved from it exactly once by
//! [`RefreshConfig::from_settings`]; a bad value is a construction-time error
//! and the loop never starts.

use crate::error::{Result, SyncError};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use std::time::Duration;

pub const INDEX_SETTING: &str = "plugin.dynamic_word_delimiter.protected_words_index";
pub const TYPE_SETTING: &str = "plugin.dynamic_word_delimiter.protected_words_type";
pub const REFRESH_INTERVAL_SETTING: &str = "plugin.dynamic_word_delimiter.refresh_interval";
pub const RESULTS_SIZE_SETTING: &str = "plugin.dynamic_word_delimiter.results_size";
pub const SHUTDOWN_GRACE_SETTING: &str = "plugin.dynamic_word_delimiter.shutdown_grace_period";

pub const DEFAULT_INDEX: &str = "protected_words";
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_RESULTS_SIZE: usize = 10_000;
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Read-only key/value settings handed over by the host.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    values: BTreeMap<String, String>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds settings from `key=value` arguments. Arguments without `=` are
    /// ignored.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        args.into_iter()
            .filter_map(|arg| {
                let (key, value) = arg.as_ref().split_once('=')?;
                Some((key.trim().to_string(), value.trim().to_string()))
            })
            .collect()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Settings {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Configuration for the protected-word refresh loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshConfig {
    /// Index holding one document per protected word
    pub index: String,
    /// Optional type/category qualifier within the index
    pub qualifier: Option<String>,
    /// Sleep between polls
    pub refresh_interval: Duration,
    /// Maximum documents fetched per poll
    pub max_results: usize,
    /// How long `stop()` waits for the background task to exit
    pub shutdown_grace: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            index: DEFAULT_INDEX.to_string(),
            qualifier: None,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            max_results: DEFAULT_RESULTS_SIZE,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }
}

impl RefreshConfig {
    /// Resolves the configuration from host settings, falling back to
    /// defaults for absent keys.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut config = Self::default();

        if let Some(index) = settings.get(INDEX_SETTING) {
            config.index = index.trim().to_string();
        }
        config.qualifier = settings
            .get(TYPE_SETTING)
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string);
        if let Some(raw) = settings.get(REFRESH_INTERVAL_SETTING) {
            config.refresh_interval = parse_time_value(REFRESH_INTERVAL_SETTING, raw)?;
        }
        if let Some(raw) = settings.get(RESULTS_SIZE_SETTING) {
            config.max_results = raw.trim().parse().map_err(|_| {
                SyncError::invalid_setting(
                    RESULTS_SIZE_SETTING,
                    format!("`{}` is not a non-negative integer", raw),
                )
            })?;
        }
        if let Some(raw) = settings.get(SHUTDOWN_GRACE_SETTING) {
            config.shutdown_grace = parse_time_value(SHUTDOWN_GRACE_SETTING, raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Rejects values the refresh loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.index.trim().is_empty() {
            return Err(SyncError::invalid_setting(
                INDEX_SETTING,
                "index name must not be empty",
            ));
        }
        if self.refresh_interval.is_zero() {
            return Err(SyncError::invalid_setting(
                REFRESH_INTERVAL_SETTING,
                "refresh interval must be greater than zero",
            ));
        }
        if self.max_results == 0 {
            return Err(SyncError::invalid_setting(
                RESULTS_SIZE_SETTING,
                "result ceiling must be greater than zero",
            ));
        }
        Ok(())
    }
}

fn time_value_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d+)\s*(nanos|micros|ms|s|m|h|d)$").expect("time value pattern compiles")
    })
}

/// Parses a time value such as `500ms`, `30s`, `5m`, `1h` or `2d`.
pub fn parse_time_value(key: &str, raw: &str) -> Result<Duration> {
    let trimmed = raw.trim().to_ascii_lowercase();
    let caps = time_value_pattern().captures(&trimmed).ok_or_else(|| {
        SyncError::invalid_setting(
            key,
            format!("`{}` is not a time value (expected e.g. `500ms`, `5m`)", raw),
        )
    })?;

    let amount: u64 = caps[1]
        .parse()
        .map_err(|_| SyncError::invalid_setting(key, format!("`{}` is out of range", raw)))?;

    let duration = match &caps[2] {
        "nanos" => Duration::from_nanos(amount),
        "micros" => Duration::from_micros(amount),
        "ms" => Duration::from_millis(amount),
        "s" => Duration::from_secs(amount),
        "m" => Duration::from_secs(amount.saturating_mul(60)),
        "h" => Duration::from_secs(amount.saturating_mul(60 * 60)),
        _ => Duration::from_secs(amount.saturating_mul(24 * 60 * 60)),
    };
    Ok(duration)
}
