//! Host-side policy consulted by the fetch executor
//!
//! The embedding application decides what is banned, whether safe mode is on,
//! which sizes are acceptable and where favorites live. All of it is optional:
//! a fetcher without a host treats nothing as banned, safe mode as off, every
//! size as fine and nothing as a favorite.

use crate::config::FetchConfig;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Policy questions the fetch executor asks the embedding application
pub trait HostOracle: Send + Sync {
    /// Whether downloads from this origin URL are banned
    fn is_banned(&self, url: &str) -> bool;

    /// Whether safe-mode keyword filtering is on
    fn is_safe_mode_enabled(&self) -> bool;

    /// Whether an image of this size is acceptable
    fn size_ok(&self, width: u32, height: u32) -> bool;

    /// Folder holding favorited images, if the host has one
    fn favorites_folder(&self) -> Option<&Path>;
}

/// [`HostOracle`] backed by fixed settings, usually taken from [`FetchConfig`]
#[derive(Clone, Debug, Default)]
pub struct StaticHost {
    banned: HashSet<String>,
    safe_mode: bool,
    min_width: u32,
    min_height: u32,
    favorites_dir: Option<PathBuf>,
}

impl StaticHost {
    /// Build a host from the policy fields of a fetch config
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            banned: config.banned_urls.clone(),
            safe_mode: config.safe_mode,
            min_width: config.min_width,
            min_height: config.min_height,
            favorites_dir: config.favorites_dir.clone(),
        }
    }

    /// Add an origin URL to the ban list
    #[must_use]
    pub fn with_banned(mut self, url: impl Into<String>) -> Self {
        self.banned.insert(url.into());
        self
    }

    /// Turn safe mode on or off
    #[must_use]
    pub fn with_safe_mode(mut self, enabled: bool) -> Self {
        self.safe_mode = enabled;
        self
    }

    /// Require at least this many pixels in each dimension
    #[must_use]
    pub fn with_min_size(mut self, width: u32, height: u32) -> Self {
        self.min_width = width;
        self.min_height = height;
        self
    }

    /// Set the favorites folder
    #[must_use]
    pub fn with_favorites_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.favorites_dir = Some(dir.into());
        self
    }
}

impl HostOracle for StaticHost {
    fn is_banned(&self, url: &str) -> bool {
        self.banned.contains(url)
    }

    fn is_safe_mode_enabled(&self) -> bool {
        self.safe_mode
    }

    fn size_ok(&self, width: u32, height: u32) -> bool {
        width >= self.min_width && height >= self.min_height
    }

    fn favorites_folder(&self) -> Option<&Path> {
        self.favorites_dir.as_deref()
    }
}
