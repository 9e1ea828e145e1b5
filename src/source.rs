//! Source capability: what a concrete image source must provide
//!
//! A source knows how to discover candidates ([`QueueSource::fill_queue`]), how
//! often it may be asked to, and who it is. The queue manager drives it; the
//! source owns its throttle timestamps and hands the manager a shared handle.

use crate::config::ThrottleConfig;
use crate::error::Result;
use crate::fetch::{ImageFetcher, SaveOptions};
use crate::types::{DownloadOutcome, QueueItem, SourceInfo};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Timestamps of the last fill attempt and the last download attempt of one source
///
/// `None` means the operation never happened, so its gate is open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ThrottleState {
    /// When the last download was started
    pub last_download_time: Option<DateTime<Utc>>,
    /// When the last fill was started
    pub last_fill_time: Option<DateTime<Utc>>,
}

/// Handle to a source's throttle state, shared with every manager driving it
pub type SharedThrottleState = Arc<tokio::sync::Mutex<ThrottleState>>;

impl ThrottleState {
    /// Fresh state wrapped in a shareable handle
    pub fn shared() -> SharedThrottleState {
        Arc::new(tokio::sync::Mutex::new(Self::default()))
    }

    /// Whether at least `min_interval` has passed since the last download
    pub fn download_gate_open(&self, now: DateTime<Utc>, min_interval: Duration) -> bool {
        elapsed_at_least(self.last_download_time, now, min_interval)
    }

    /// Whether at least `min_interval` has passed since the last fill
    pub fn fill_gate_open(&self, now: DateTime<Utc>, min_interval: Duration) -> bool {
        elapsed_at_least(self.last_fill_time, now, min_interval)
    }
}

fn elapsed_at_least(last: Option<DateTime<Utc>>, now: DateTime<Utc>, min_interval: Duration) -> bool {
    let Some(last) = last else {
        return true;
    };
    // Intervals too large for chrono never elapse
    let min = TimeDelta::from_std(min_interval).unwrap_or(TimeDelta::MAX);
    now.signed_duration_since(last) >= min
}

/// Source of the current time for throttle decisions
pub trait Clock: Send + Sync {
    /// Current wall-clock time
    fn now(&self) -> DateTime<Utc>;
}

/// [`Clock`] reading the system time
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// [`Clock`] that only moves when told to
///
/// Useful for schedulers that replay a timeline, and for tests.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Start the clock at `start`
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        let delta = TimeDelta::from_std(by).unwrap_or(TimeDelta::MAX);
        let mut now = self.now.lock().unwrap_or_else(|p| p.into_inner());
        *now = now.checked_add_signed(delta).unwrap_or(*now);
    }

    /// Set the clock to an absolute time
    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|p| p.into_inner()) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// A pluggable image source
///
/// Implementors supply [`fill_queue`](Self::fill_queue); the other methods
/// describe the source. [`download_queue_item`](Self::download_queue_item) has a
/// default that unpacks the item and saves it; override it when every item needs
/// extra work first (e.g. fetching a details page to find the real image URL).
///
/// # Examples
///
/// ```no_run
/// use async_trait::async_trait;
/// use wallfetch::source::{QueueSource, SharedThrottleState, ThrottleState};
/// use wallfetch::{QueueItem, Result, SourceInfo, ThrottleConfig};
/// use std::time::Duration;
///
/// struct StaticList {
///     urls: Vec<String>,
///     throttle: SharedThrottleState,
/// }
///
/// #[async_trait]
/// impl QueueSource for StaticList {
///     fn info(&self) -> SourceInfo {
///         SourceInfo {
///             source_type: "list".into(),
///             source_name: "Static list".into(),
///             source_location: None,
///             description: "Hand-picked URLs".into(),
///         }
///     }
///
///     fn throttling(&self) -> ThrottleConfig {
///         ThrottleConfig {
///             min_download_interval: Duration::from_secs(60),
///             min_fill_interval: Duration::from_secs(3600),
///         }
///     }
///
///     fn throttle_state(&self) -> SharedThrottleState {
///         self.throttle.clone()
///     }
///
///     async fn fill_queue(&self) -> Result<Vec<QueueItem>> {
///         Ok(self.urls.iter().map(|u| QueueItem::new(u.as_str(), u.as_str())).collect())
///     }
/// }
/// ```
#[async_trait]
pub trait QueueSource: Send + Sync {
    /// Identity recorded in metadata sidecars
    fn info(&self) -> SourceInfo;

    /// Minimum intervals between downloads and between fills
    fn throttling(&self) -> ThrottleConfig;

    /// Handle to this source's throttle timestamps
    fn throttle_state(&self) -> SharedThrottleState;

    /// Produce a batch of new candidates
    ///
    /// The batch size is a trade-off between fewer upstream calls and variety in
    /// consecutive downloads. An empty batch is fine; an error is a hard failure
    /// and propagates out of `download_one`.
    async fn fill_queue(&self) -> Result<Vec<QueueItem>>;

    /// Download one popped queue item
    async fn download_queue_item(
        &self,
        fetcher: &ImageFetcher,
        item: QueueItem,
    ) -> Result<DownloadOutcome> {
        let QueueItem {
            origin_url,
            image_url,
            extra_metadata,
        } = item;
        fetcher
            .save_locally(&origin_url, &image_url, SaveOptions::with_metadata(extra_metadata))
            .await
    }
}
