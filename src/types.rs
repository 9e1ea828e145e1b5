//! Core types for wallfetch

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Free-form metadata attached to a queue item (keywords, author, title, ...)
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// One pending download candidate produced by a source's fill
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    /// Page the image was found on
    pub origin_url: String,
    /// Direct URL of the image bytes
    pub image_url: String,
    /// Extra metadata written to the sidecar alongside the image
    #[serde(default)]
    pub extra_metadata: Metadata,
}

impl QueueItem {
    /// Create a queue item without extra metadata
    pub fn new(origin_url: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            origin_url: origin_url.into(),
            image_url: image_url.into(),
            extra_metadata: Metadata::new(),
        }
    }

    /// Attach extra metadata to the item
    #[must_use]
    pub fn with_metadata(mut self, extra_metadata: Metadata) -> Self {
        self.extra_metadata = extra_metadata;
        self
    }
}

/// Which timing gate refused a download attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThrottleGate {
    /// Too soon after the previous download
    Download,
    /// Queue empty and too soon after the previous fill
    Fill,
}

/// Why a download attempt produced no file
///
/// All of these are expected conditions; hard failures are returned as
/// [`Error`](crate::error::Error) instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// A timing gate is closed
    Throttled(ThrottleGate),
    /// The source had nothing new to offer
    EmptyAfterFill,
    /// The origin URL is on the ban list
    Banned,
    /// The target file is already on disk
    AlreadyExists,
    /// Safe mode rejected the item's keywords
    Unsafe {
        /// Lower-cased keywords that hit the denylist
        matched: BTreeSet<String>,
    },
    /// The downloaded bytes were not a valid image
    InvalidImage,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Throttled(ThrottleGate::Download) => write!(f, "download interval not elapsed"),
            SkipReason::Throttled(ThrottleGate::Fill) => write!(f, "fill interval not elapsed"),
            SkipReason::EmptyAfterFill => write!(f, "queue still empty after fill"),
            SkipReason::Banned => write!(f, "origin URL is banned"),
            SkipReason::AlreadyExists => write!(f, "file already exists"),
            SkipReason::Unsafe { matched } => {
                let terms: Vec<&str> = matched.iter().map(String::as_str).collect();
                write!(f, "blacklisted keywords: {}", terms.join(", "))
            }
            SkipReason::InvalidImage => write!(f, "downloaded data was not an image"),
        }
    }
}

/// Result of a single download attempt
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The image was saved at this path
    Saved(PathBuf),
    /// Nothing was saved, for an expected reason
    Skipped(SkipReason),
}

impl DownloadOutcome {
    /// Path of the saved file, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            DownloadOutcome::Saved(path) => Some(path),
            DownloadOutcome::Skipped(_) => None,
        }
    }

    /// Whether a file was saved
    pub fn is_saved(&self) -> bool {
        matches!(self, DownloadOutcome::Saved(_))
    }

    /// Whether a timing gate refused the attempt
    ///
    /// Callers polling on a timer use this to tell "come back later" apart from
    /// "this item was rejected, try the next one now".
    pub fn is_throttled(&self) -> bool {
        matches!(self, DownloadOutcome::Skipped(SkipReason::Throttled(_)))
    }
}

/// Identity of a source, recorded in every metadata sidecar
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Kind of source (e.g. "unsplash", "flickr")
    pub source_type: String,
    /// Human-readable source name
    pub source_name: String,
    /// Query, feed or location the source draws from
    pub source_location: Option<String>,
    /// Fallback description used when no location is known
    pub description: String,
}

/// The keys written into every metadata sidecar, in addition to the item's extra metadata
pub mod metadata_keys {
    /// Source kind
    pub const SOURCE_TYPE: &str = "sourceType";
    /// Source display name
    pub const SOURCE_NAME: &str = "sourceName";
    /// Source location or description
    pub const SOURCE_LOCATION: &str = "sourceLocation";
    /// Page the image was found on
    pub const ORIGIN_URL: &str = "originURL";
    /// Direct image URL
    pub const IMAGE_URL: &str = "imageURL";
    /// Keyword list consulted by safe mode
    pub const KEYWORDS: &str = "keywords";
}
