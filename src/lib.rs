//! # wallfetch
//!
//! Throttled, queue-backed image fetch pipeline for wallpaper sources.
//!
//! A [`QueueSource`] knows how to list candidate images from some upstream. A
//! [`QueueDownloader`] caches those candidates in memory and, each time it is
//! asked, downloads at most one of them through an [`ImageFetcher`], which
//! takes care of:
//! - **Throttling** - a minimum interval between downloads and between fills
//! - **Deduplication** - images already in the target directory are skipped
//! - **Safe mode** - items tagged with denylisted keywords are skipped
//! - **Validation** - payloads that do not decode as images are discarded
//! - **Metadata** - every saved image gets a `<name>.metadata.json` sidecar
//!
//! The library spawns no background work. Drive `download_one` from your own
//! timer, one caller per manager.
//!
//! ## Quick Start
//!
//! ```no_run
//! use async_trait::async_trait;
//! use std::sync::Arc;
//! use std::time::Duration;
//! use wallfetch::{
//!     FetchConfig, QueueDownloader, QueueItem, QueueSource, SharedThrottleState, SourceInfo,
//!     ThrottleConfig, ThrottleState,
//! };
//!
//! struct Picks {
//!     throttle: SharedThrottleState,
//! }
//!
//! #[async_trait]
//! impl QueueSource for Picks {
//!     fn info(&self) -> SourceInfo {
//!         SourceInfo {
//!             source_type: "picks".into(),
//!             source_name: "Picks".into(),
//!             source_location: Some("https://example.com/picks".into()),
//!             description: "Daily picks".into(),
//!         }
//!     }
//!
//!     fn throttling(&self) -> ThrottleConfig {
//!         ThrottleConfig::default()
//!     }
//!
//!     fn throttle_state(&self) -> SharedThrottleState {
//!         self.throttle.clone()
//!     }
//!
//!     async fn fill_queue(&self) -> wallfetch::Result<Vec<QueueItem>> {
//!         Ok(vec![QueueItem::new(
//!             "https://example.com/picks/1",
//!             "https://cdn.example.com/1.jpg",
//!         )])
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = Arc::new(Picks { throttle: ThrottleState::shared() });
//!     let config = FetchConfig {
//!         target_dir: "/tmp/wallpapers".into(),
//!         ..Default::default()
//!     };
//!     let mut manager = QueueDownloader::new(source, &config)?;
//!
//!     let mut ticker = tokio::time::interval(Duration::from_secs(60));
//!     loop {
//!         ticker.tick().await;
//!         match manager.download_one().await {
//!             Ok(outcome) => println!("{outcome:?}"),
//!             Err(e) => eprintln!("download failed: {e}"),
//!         }
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Throttled queue manager
pub mod downloader;
/// Error types
pub mod error;
/// Per-item fetch pipeline
pub mod fetch;
/// Host application policy (bans, safe mode, size limits, favorites)
pub mod host;
/// Retry logic with exponential backoff
pub mod retry;
/// Safe-mode keyword filter
pub mod safety;
/// Image source capability and throttle state
pub mod source;
/// Local file naming and metadata sidecars
pub mod store;
/// Core types
pub mod types;
/// Image content validation
pub mod validate;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use config::{FetchConfig, RetryConfig, ThrottleConfig};
pub use downloader::QueueDownloader;
pub use error::{Error, Result};
pub use fetch::{ImageFetcher, SaveOptions};
pub use host::{HostOracle, StaticHost};
pub use safety::{Safety, SafetyFilter};
pub use source::{Clock, ManualClock, QueueSource, SharedThrottleState, SystemClock, ThrottleState};
pub use store::LocalStore;
pub use types::{
    DownloadOutcome, Metadata, QueueItem, SkipReason, SourceInfo, ThrottleGate,
};
pub use validate::{DecodingImageValidator, ImageValidator};
