//! Retry with exponential backoff for hard fetch failures
//!
//! The queue manager never retries on its own: a failed fill or fetch surfaces
//! as an error and its throttle interval is already spent. Callers that want to
//! retry a single transient failure (for instance when saving one image directly
//! through [`ImageFetcher::save_locally`](crate::ImageFetcher::save_locally))
//! wrap the call in [`fetch_with_retry`].
//!
//! # Example
//!
//! ```no_run
//! use wallfetch::retry::fetch_with_retry;
//! use wallfetch::{FetchConfig, ImageFetcher, RetryConfig, SaveOptions, SourceInfo};
//!
//! # async fn example() -> wallfetch::Result<()> {
//! let fetcher = ImageFetcher::new(&FetchConfig::default(), SourceInfo::default())?;
//! let outcome = fetch_with_retry(&RetryConfig::default(), || {
//!     fetcher.save_locally(
//!         "https://example.com/page",
//!         "https://cdn.example.com/a.jpg",
//!         SaveOptions::default(),
//!     )
//! })
//! .await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::Error;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Errors that can tell whether trying again might help
pub trait IsRetryable {
    /// True for transient failures (timeouts, refused connections, server busy)
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::Network(e) => e.is_timeout() || e.is_connect(),
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::NotConnected
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::Interrupted
            ),
            // Server-side trouble and rate limiting; 4xx otherwise means the URL is bad
            Error::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            // Upstream listing failures are usually outages
            Error::Fill { .. } => true,
            Error::Config { .. } | Error::Serialization(_) | Error::Other(_) => false,
        }
    }
}

/// Run `operation`, retrying retryable failures with exponential backoff
///
/// Makes at most `config.max_attempts` retries after the first call. The delay
/// starts at `initial_delay`, grows by `backoff_multiplier` and is capped at
/// `max_delay`; with `jitter` each wait is stretched by up to 100%.
///
/// # Errors
/// Returns the first non-retryable error, or the last error once retries run out.
pub async fn fetch_with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(attempts = attempt + 1, "Fetch succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < config.max_attempts => {
                attempt += 1;
                tracing::warn!(
                    error = %e,
                    attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis(),
                    "Fetch failed, retrying"
                );

                let wait = if config.jitter { add_jitter(delay) } else { delay };
                tokio::time::sleep(wait).await;

                delay = next_delay(delay, config);
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::warn!(error = %e, attempts = attempt + 1, "Fetch failed, retries exhausted");
                } else {
                    tracing::warn!(error = %e, "Fetch failed with non-retryable error");
                }
                return Err(e);
            }
        }
    }
}

/// Grow `delay` by the backoff multiplier, capped at `max_delay`
///
/// A product that is not a valid duration (negative, NaN, overflowing)
/// jumps straight to the cap.
fn next_delay(delay: Duration, config: &RetryConfig) -> Duration {
    Duration::try_from_secs_f64(delay.as_secs_f64() * config.backoff_multiplier)
        .unwrap_or(config.max_delay)
        .min(config.max_delay)
}

/// Stretch `delay` by a uniform random factor in `[1, 2]`
fn add_jitter(delay: Duration) -> Duration {
    let factor: f64 = rand::thread_rng().gen_range(1.0..=2.0);
    Duration::try_from_secs_f64(delay.as_secs_f64() * factor).unwrap_or(delay)
}
