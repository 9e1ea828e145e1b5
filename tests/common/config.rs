//! Config builders for integration tests

use std::path::Path;
use std::time::Duration;
use wallfetch::{FetchConfig, RetryConfig, ThrottleConfig};

/// Throttling used by most pipeline tests
pub const MIN_DOWNLOAD: Duration = Duration::from_secs(60);
pub const MIN_FILL: Duration = Duration::from_secs(3600);

pub fn throttling() -> ThrottleConfig {
    ThrottleConfig {
        min_download_interval: MIN_DOWNLOAD,
        min_fill_interval: MIN_FILL,
    }
}

/// Fetch config writing into `dir`, safe mode off
pub fn fetch_config(dir: &Path) -> FetchConfig {
    FetchConfig {
        target_dir: dir.join("wallpapers"),
        request_timeout: Some(Duration::from_secs(10)),
        ..Default::default()
    }
}

/// Same as [`fetch_config`] with safe mode on
pub fn safe_fetch_config(dir: &Path) -> FetchConfig {
    FetchConfig {
        safe_mode: true,
        ..fetch_config(dir)
    }
}

/// Retry config with millisecond delays
pub fn quick_retry(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        initial_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
        backoff_multiplier: 2.0,
        jitter: false,
    }
}
