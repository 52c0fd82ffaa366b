//! Scheduled protected-word refresh - background task for periodic polling.
//!
//! The loop sleeps first and polls second: a restarting node does not hit
//! the backend immediately, and the cache stays empty (nothing protected)
//! until the first interval has elapsed. A missing index or a failed poll
//! still costs a full interval before the next attempt.
//!
//! # Staleness
//!
//! The cache reflects the backend as of the most recent *successful* poll and
//! may lag it by up to one refresh interval plus fetch latency.
//!
//! # Lifecycle
//!
//! `NotStarted --start()--> Running --stop()--> Stopped`
//!
//! `stop()` wakes the loop out of its sleep through a watch channel. A fetch
//! already in flight runs to completion before the loop notices the signal.

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::cache::ProtectedWordCache;
use crate::config::RefreshConfig;
use crate::error::{Result, SyncError};
use crate::refresh::service::{RefreshOutcome, RefreshService, RefreshStats};
use crate::store::WordStore;
use log::{debug, error, info, warn};

/// Lifecycle of a [`RefreshLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    Running,
    Stopped,
}

/// Bookkeeping shared between the loop handle and its background task.
#[derive(Debug, Default)]
struct RefreshRecord {
    last_refresh_at: Option<u64>,
    last_stats: Option<RefreshStats>,
}

/// Periodic protected-word refresher.
///
/// Runs as a single background tokio task; it is the only writer to the
/// cache it was built with.
pub struct RefreshLoop {
    service: Arc<RefreshService>,
    state: Mutex<RunState>,
    record: Arc<RwLock<RefreshRecord>>,
    shutdown_tx: watch::Sender<bool>,
    trigger_tx: mpsc::Sender<()>,
    trigger_rx: Mutex<Option<mpsc::Receiver<()>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshLoop {
    /// Creates a refresh loop in the `NotStarted` state.
    ///
    /// # Arguments
    /// - `config`: index, interval, result ceiling and shutdown grace
    /// - `store`: backend polled for protected words
    /// - `cache`: cache this loop publishes into; nothing else should write it
    ///
    /// # Returns
    /// A loop that does nothing until [`start`](Self::start) is called.
    ///
    /// # Errors
    /// Returns `SyncError::InvalidSetting` if `config` does not validate; a
    /// loop that cannot be constructed can never be started.
    ///
    /// # Example
    /// ```rust,no_run
    /// use std::sync::Arc;
    /// use protected_words::{InMemoryWordStore, ProtectedWordCache, RefreshConfig, RefreshLoop};
    ///
    /// let cache = Arc::new(ProtectedWordCache::new());
    /// let refresh = RefreshLoop::new(
    ///     RefreshConfig::default(),
    ///     Arc::new(InMemoryWordStore::new()),
    ///     cache.clone(),
    /// )?;
    /// # Ok::<(), protected_words::SyncError>(())
    /// ```
    pub fn new(
        config: RefreshConfig,
        store: Arc<dyn WordStore>,
        cache: Arc<ProtectedWordCache>,
    ) -> Result<Self> {
        config.validate()?;

        let (shutdown_tx, _) = watch::channel(false);
        let (trigger_tx, trigger_rx) = mpsc::channel(1);

        Ok(Self {
            service: Arc::new(RefreshService::new(store, cache, config)),
            state: Mutex::new(RunState::NotStarted),
            record: Arc::new(RwLock::new(RefreshRecord::default())),
            shutdown_tx,
            trigger_tx,
            trigger_rx: Mutex::new(Some(trigger_rx)),
            handle: Mutex::new(None),
        })
    }

    pub fn state(&self) -> RunState {
        *self.state.lock()
    }

    pub fn config(&self) -> &RefreshConfig {
        self.service.config()
    }

    pub fn cache(&self) -> &Arc<ProtectedWordCache> {
        self.service.cache()
    }

    /// Milliseconds since UNIX epoch of the last successful refresh, or
    /// `None` before the first one.
    pub fn last_refresh(&self) -> Option<u64> {
        self.record.read().last_refresh_at
    }

    /// Statistics of the last successful refresh.
    pub fn last_stats(&self) -> Option<RefreshStats> {
        self.record.read().last_stats.clone()
    }

    /// Spawns the background task on the current tokio runtime.
    ///
    /// Once running, the task will:
    /// 1. Sleep for the refresh interval (or until a manual refresh request)
    /// 2. Skip the cycle if the index does not exist
    /// 3. Fetch all documents and publish them as the new word set
    /// 4. Repeat until stopped
    ///
    /// Calling `start()` on a loop that is already running or stopped logs a
    /// warning and does nothing.
    ///
    /// # Errors
    /// Returns `SyncError::NoRuntime` when called outside a tokio runtime.
    ///
    /// # Example
    /// ```rust,no_run
    /// # async fn run(refresh: protected_words::RefreshLoop) -> protected_words::Result<()> {
    /// refresh.start()?;
    /// assert_eq!(refresh.state(), protected_words::RunState::Running);
    /// # Ok(())
    /// # }
    /// ```
    pub fn start(&self) -> Result<()> {
        let mut state = self.state.lock();
        if *state != RunState::NotStarted {
            warn!("Protected words refresh already {:?}, ignoring start", *state);
            return Ok(());
        }

        let runtime = Handle::try_current().map_err(|_| SyncError::NoRuntime)?;
        let Some(trigger_rx) = self.trigger_rx.lock().take() else {
            warn!("Protected words refresh was already started once, ignoring start");
            return Ok(());
        };

        let config = self.service.config();
        info!(
            "Starting protected words refresh on `{}` every {}ms (max {} results)",
            config.index,
            config.refresh_interval.as_millis(),
            config.max_results
        );

        let handle = runtime.spawn(run_loop(
            self.service.clone(),
            self.record.clone(),
            config.refresh_interval,
            self.shutdown_tx.subscribe(),
            trigger_rx,
        ));
        *self.handle.lock() = Some(handle);
        *state = RunState::Running;
        Ok(())
    }

    /// Flips the loop to `Stopped` and wakes it if it is sleeping, without
    /// waiting for the task to exit. Returns false if the loop was not
    /// running.
    pub fn signal_stop(&self) -> bool {
        let mut state = self.state.lock();
        if *state != RunState::Running {
            return false;
        }
        *state = RunState::Stopped;
        self.shutdown_tx.send_replace(true);
        true
    }

    /// Stops the loop and waits up to the configured grace period for the
    /// background task to exit.
    ///
    /// A sleeping loop wakes immediately. A fetch already in flight is not
    /// cancelled; its result is still published when it completes.
    ///
    /// # Returns
    /// True once the task has exited (or there was nothing to stop), false if
    /// it was still running when the grace period ran out.
    ///
    /// # Example
    /// ```rust,no_run
    /// # async fn run(refresh: protected_words::RefreshLoop) -> protected_words::Result<()> {
    /// refresh.start()?;
    /// // ... serve lookups ...
    /// if !refresh.stop().await {
    ///     eprintln!("refresh task still finishing a poll");
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn stop(&self) -> bool {
        if !self.signal_stop() {
            debug!("Protected words refresh not running, nothing to stop");
        }

        let handle = self.handle.lock().take();
        let Some(handle) = handle else {
            return true;
        };

        let grace = self.service.config().shutdown_grace;
        match tokio::time::timeout(grace, handle).await {
            Ok(Ok(())) => {
                info!("Protected words refresh stopped");
                true
            }
            Ok(Err(e)) => {
                error!("Protected words refresh task failed: {}", e);
                true
            }
            Err(_) => {
                warn!(
                    "Protected words refresh did not exit within {}ms",
                    grace.as_millis()
                );
                false
            }
        }
    }

    /// Asks a running loop to poll now instead of waiting out its sleep.
    ///
    /// Requests coalesce while one is pending. Returns false if the loop is
    /// not running or its task has gone away.
    pub fn request_refresh(&self) -> bool {
        if self.state() != RunState::Running {
            return false;
        }
        match self.trigger_tx.try_send(()) {
            Ok(()) => true,
            // A refresh is already pending.
            Err(mpsc::error::TrySendError::Full(())) => true,
            Err(mpsc::error::TrySendError::Closed(())) => {
                warn!("Protected words refresh task is gone, dropping refresh request");
                false
            }
        }
    }
}

/// Body of the background task: sleep, poll, repeat until told to stop.
async fn run_loop(
    service: Arc<RefreshService>,
    record: Arc<RwLock<RefreshRecord>>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut trigger: mpsc::Receiver<()>,
) {
    loop {
        if *shutdown.borrow() {
            break;
        }

        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            Some(()) = trigger.recv() => debug!("Manual protected words refresh requested"),
            _ = tokio::time::sleep(interval) => {}
        }

        if *shutdown.borrow() {
            break;
        }

        do_refresh(&service, &record).await;
    }
    debug!("Protected words refresh loop exited");
}

/// Executes one refresh cycle, logging the result. Errors never leave this
/// function; the next tick is the retry.
async fn do_refresh(service: &RefreshService, record: &RwLock<RefreshRecord>) {
    match service.refresh_once().await {
        Ok(RefreshOutcome::Refreshed(stats)) => {
            info!(
                "Protected words refresh completed: {} words (generation {}) in {}ms",
                stats.words_published, stats.generation, stats.duration_ms
            );
            let mut record = record.write();
            record.last_refresh_at = Some(stats.timestamp);
            record.last_stats = Some(stats);
        }
        Ok(RefreshOutcome::IndexMissing) => {
            debug!(
                "Protected words index `{}` missing, keeping {} cached words",
                service.config().index,
                service.cache().len()
            );
        }
        Err(e) => {
            error!("Protected words refresh failed: {}", e);
        }
    }
}
