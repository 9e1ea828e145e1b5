//! Configuration types for wallfetch

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, path::PathBuf, time::Duration};

/// Settings for the fetch executor (where files go, how the HTTP client behaves,
/// and the host-side policy used by [`StaticHost`](crate::host::StaticHost))
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Directory downloaded images are written to (default: "./downloads")
    #[serde(default = "default_target_dir")]
    pub target_dir: PathBuf,

    /// Transport-level timeout for a whole image request (None = no timeout)
    ///
    /// The pipeline itself never times out a fetch. Set this when the caller
    /// wants the HTTP client to give up on stalled servers.
    #[serde(default, with = "optional_duration_serde")]
    pub request_timeout: Option<Duration>,

    /// User-Agent sent with image requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Reject items whose keywords hit the safe-mode denylist
    #[serde(default)]
    pub safe_mode: bool,

    /// Folder holding the user's favorites, used by `is_in_favorites`
    #[serde(default)]
    pub favorites_dir: Option<PathBuf>,

    /// Minimum acceptable image width in pixels (0 = any)
    #[serde(default)]
    pub min_width: u32,

    /// Minimum acceptable image height in pixels (0 = any)
    #[serde(default)]
    pub min_height: u32,

    /// Origin URLs that must never be downloaded
    #[serde(default)]
    pub banned_urls: HashSet<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            target_dir: default_target_dir(),
            request_timeout: None,
            user_agent: default_user_agent(),
            safe_mode: false,
            favorites_dir: None,
            min_width: 0,
            min_height: 0,
            banned_urls: HashSet::new(),
        }
    }
}

impl FetchConfig {
    /// Check the settings that would otherwise fail late, on the first download
    pub fn validate(&self) -> Result<()> {
        if self.target_dir.as_os_str().is_empty() {
            return Err(Error::config("target_dir", "target directory must not be empty"));
        }
        if self.user_agent.trim().is_empty() {
            return Err(Error::config("user_agent", "user agent must not be empty"));
        }
        Ok(())
    }
}

/// Minimum spacing between fills and between downloads for one source
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Minimum interval between two downloads (default: 0 seconds)
    #[serde(default, with = "duration_serde")]
    pub min_download_interval: Duration,

    /// Minimum interval between two queue fill attempts (default: 0 seconds)
    #[serde(default, with = "duration_serde")]
    pub min_fill_interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            min_download_interval: Duration::ZERO,
            min_fill_interval: Duration::ZERO,
        }
    }
}

/// Retry configuration for callers wrapping hard fetch failures
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 5 seconds)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 300 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Reject backoff settings that would shrink or scramble the delay
    ///
    /// [`fetch_with_retry`](crate::retry::fetch_with_retry) tolerates any
    /// value, but a multiplier below 1 or a non-finite one is almost always a
    /// typo in a config file.
    pub fn validate(&self) -> Result<()> {
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(Error::config(
                "backoff_multiplier",
                format!(
                    "backoff multiplier must be a finite number >= 1.0, got {}",
                    self.backoff_multiplier
                ),
            ));
        }
        if self.initial_delay > self.max_delay {
            return Err(Error::config(
                "initial_delay",
                "initial delay must not exceed max delay",
            ));
        }
        Ok(())
    }
}

fn default_target_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

fn default_user_agent() -> String {
    format!("wallfetch/{}", env!("CARGO_PKG_VERSION"))
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(5)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(300)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
