//! Throttled queue manager.
//!
//! [`QueueDownloader`] caches candidates from a [`QueueSource`] in memory and
//! hands out one download per call, subject to two independent gates:
//! - the **download gate** (`min_download_interval` since the last download),
//!   checked first and never bypassed, even with a full queue
//! - the **fill gate** (`min_fill_interval` since the last fill), checked only
//!   when the queue is empty
//!
//! Both timestamps are stamped *before* the operation they gate, so a slow or
//! failing fill or fetch still consumes its interval and a broken upstream is
//! not hammered in a tight loop.

use crate::config::FetchConfig;
use crate::error::Result;
use crate::fetch::ImageFetcher;
use crate::source::{Clock, QueueSource, SharedThrottleState, SystemClock};
use crate::types::{DownloadOutcome, QueueItem, SkipReason, ThrottleGate};
use std::sync::Arc;
use tracing::{info, warn};


/// Queue-backed downloader for one source
///
/// Not re-entrant: `download_one` takes `&mut self`, so a single manager is
/// always driven by one caller at a time. Several managers over the same
/// source share its throttle state through the source's handle; the download
/// gate is checked and stamped under one lock, so at most one of them starts a
/// download per interval even when they run concurrently.
pub struct QueueDownloader<S: QueueSource> {
    source: Arc<S>,
    fetcher: ImageFetcher,
    /// Pending candidates; filled at the back, popped from the back
    queue: Vec<QueueItem>,
    clock: Arc<dyn Clock>,
}

impl<S: QueueSource> QueueDownloader<S> {
    /// Create a manager whose fetcher is built from `config` and the source's identity
    ///
    /// # Errors
    /// Returns an error if the fetcher cannot be built (invalid config, HTTP client failure)
    pub fn new(source: Arc<S>, config: &FetchConfig) -> Result<Self> {
        let fetcher = ImageFetcher::new(config, source.info())?;
        Ok(Self::with_fetcher(source, fetcher))
    }

    /// Create a manager around an existing fetcher
    pub fn with_fetcher(source: Arc<S>, fetcher: ImageFetcher) -> Self {
        Self {
            source,
            fetcher,
            queue: Vec::new(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Use a different clock for throttle decisions
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The source this manager drives
    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// The fetcher items are handed to
    pub fn fetcher(&self) -> &ImageFetcher {
        &self.fetcher
    }

    /// The source's shared throttle state
    pub fn throttle_state(&self) -> SharedThrottleState {
        self.source.throttle_state()
    }

    /// Number of cached candidates
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Whether no candidates are cached
    pub fn is_queue_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Attempt one download
    ///
    /// Returns `Skipped(Throttled(..))` when a gate is closed and
    /// `Skipped(EmptyAfterFill)` when the source had nothing to offer;
    /// otherwise the result of downloading the most recently queued item.
    ///
    /// # Errors
    /// A failing fill or a hard fetch failure is returned as-is. The matching
    /// timestamp has already been updated by then.
    pub async fn download_one(&mut self) -> Result<DownloadOutcome> {
        let name = self.source.info().source_name;
        let throttling = self.source.throttling();
        let state = self.source.throttle_state();

        {
            let mut throttle = state.lock().await;
            let now = self.clock.now();
            if !throttle.download_gate_open(now, throttling.min_download_interval) {
                info!(
                    source = %name,
                    min_download_interval_secs = throttling.min_download_interval.as_secs(),
                    "Minimal interval between downloads not elapsed, skip this attempt"
                );
                return Ok(DownloadOutcome::Skipped(SkipReason::Throttled(
                    ThrottleGate::Download,
                )));
            }

            info!(source = %name, queue_len = self.queue.len(), "Downloading an image");

            if let Some(item) = self.queue.pop() {
                throttle.last_download_time = Some(now);
                drop(throttle);
                info!(source = %name, remaining = self.queue.len(), "Downloading most recent queued item");
                return self.source.download_queue_item(&self.fetcher, item).await;
            }

            if !throttle.fill_gate_open(now, throttling.min_fill_interval) {
                info!(
                    source = %name,
                    min_fill_interval_secs = throttling.min_fill_interval.as_secs(),
                    "Queue empty, but minimal interval between fill attempts not elapsed, will try again later"
                );
                return Ok(DownloadOutcome::Skipped(SkipReason::Throttled(
                    ThrottleGate::Fill,
                )));
            }
            throttle.last_fill_time = Some(now);
        }

        info!(source = %name, "Filling queue");
        let items = self.source.fill_queue().await.inspect_err(|e| {
            warn!(source = %name, error = %e, "Queue fill failed");
        })?;
        self.queue.extend(items);

        let Some(item) = self.queue.pop() else {
            info!(source = %name, "Queue still empty after fill request");
            return Ok(DownloadOutcome::Skipped(SkipReason::EmptyAfterFill));
        };

        {
            // Another manager on this source may have downloaded while the fill ran
            let mut throttle = state.lock().await;
            let now = self.clock.now();
            if !throttle.download_gate_open(now, throttling.min_download_interval) {
                self.queue.push(item);
                info!(
                    source = %name,
                    queue_len = self.queue.len(),
                    "Queue filled, but another download started meanwhile, skip this attempt"
                );
                return Ok(DownloadOutcome::Skipped(SkipReason::Throttled(
                    ThrottleGate::Download,
                )));
            }
            throttle.last_download_time = Some(now);
        }
        info!(source = %name, remaining = self.queue.len(), "Queue populated, downloading most recent item");

        self.source.download_queue_item(&self.fetcher, item).await
    }
}
