//! Fetch executor: downloads one image to local storage
//!
//! [`ImageFetcher::save_locally`] runs the per-item pipeline:
//! ban check, URL normalization, existence check, safe-mode check, streaming
//! download, content validation, and finally the metadata sidecar.

use crate::config::FetchConfig;
use crate::error::{Error, Result};
use crate::host::{HostOracle, StaticHost};
use crate::safety::{Safety, SafetyFilter};
use crate::store::{LocalStore, local_name};
use crate::types::{DownloadOutcome, Metadata, SkipReason, SourceInfo, metadata_keys};
use crate::validate::{DecodingImageValidator, ImageValidator};
use futures::StreamExt;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use url::Url;

/// Per-call options for [`ImageFetcher::save_locally`]
#[derive(Clone, Debug, Default)]
pub struct SaveOptions {
    /// Extra metadata written into the sidecar; keys here override the defaults
    pub extra_metadata: Metadata,
    /// Override the fetcher's source type
    pub source_type: Option<String>,
    /// Override the fetcher's source name
    pub source_name: Option<String>,
    /// Override the fetcher's source location
    pub source_location: Option<String>,
    /// Skip the ban check and the already-exists check, overwriting any existing file
    pub force_download: bool,
    /// Save to this path instead of the one derived from the image URL
    pub local_filename: Option<PathBuf>,
}

impl SaveOptions {
    /// Options carrying only extra metadata
    pub fn with_metadata(extra_metadata: Metadata) -> Self {
        Self {
            extra_metadata,
            ..Default::default()
        }
    }
}

/// Make protocol-relative URLs absolute
///
/// A protocol-relative origin gets `https:`; a protocol-relative image URL
/// borrows the (normalized) origin's scheme, or `https` if the origin has none.
///
/// # Examples
///
/// ```
/// use wallfetch::fetch::normalize_urls;
///
/// let (origin, image) = normalize_urls("http://example.com/page", "//cdn.example.com/b.jpg");
/// assert_eq!(origin, "http://example.com/page");
/// assert_eq!(image, "http://cdn.example.com/b.jpg");
/// ```
pub fn normalize_urls(origin_url: &str, image_url: &str) -> (String, String) {
    let origin = match origin_url.strip_prefix("//") {
        Some(_) => format!("https:{origin_url}"),
        None => origin_url.to_string(),
    };

    let image = match image_url.strip_prefix("//") {
        Some(_) => {
            let scheme = Url::parse(&origin)
                .map(|u| u.scheme().to_string())
                .unwrap_or_else(|_| "https".to_string());
            format!("{scheme}:{image_url}")
        }
        None => image_url.to_string(),
    };

    (origin, image)
}

/// Downloads single images for one source
#[derive(Clone)]
pub struct ImageFetcher {
    client: reqwest::Client,
    store: LocalStore,
    source: SourceInfo,
    host: Option<Arc<dyn HostOracle>>,
    validator: Arc<dyn ImageValidator>,
    safety: SafetyFilter,
}

impl std::fmt::Debug for ImageFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFetcher")
            .field("store", &self.store)
            .field("source", &self.source)
            .field("has_host", &self.host.is_some())
            .finish_non_exhaustive()
    }
}

impl ImageFetcher {
    /// Create a fetcher for `source` writing into `config.target_dir`
    ///
    /// The host policy (ban list, safe mode, size limits, favorites) is taken
    /// from the config; use [`with_host`](Self::with_host) to plug in the
    /// application's own.
    ///
    /// # Errors
    /// Returns an error if the config is invalid or the HTTP client cannot be built
    pub fn new(config: &FetchConfig, source: SourceInfo) -> Result<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            store: LocalStore::new(config.target_dir.clone()),
            source,
            host: Some(Arc::new(StaticHost::from_config(config))),
            validator: Arc::new(DecodingImageValidator),
            safety: SafetyFilter::default(),
        })
    }

    /// Replace the host policy; `None` means nothing is banned and safe mode is off
    #[must_use]
    pub fn with_host(mut self, host: Option<Arc<dyn HostOracle>>) -> Self {
        self.host = host;
        self
    }

    /// Replace the image validator
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn ImageValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Replace the safe-mode denylist
    #[must_use]
    pub fn with_safety_filter(mut self, safety: SafetyFilter) -> Self {
        self.safety = safety;
        self
    }

    /// Replace the HTTP client
    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Identity of the source this fetcher downloads for
    pub fn source_info(&self) -> &SourceInfo {
        &self.source
    }

    /// Local store the fetcher writes into
    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// Local path the image at `url` downloads to
    pub fn local_filename(&self, url: &str) -> PathBuf {
        self.store.local_filename_for(url)
    }

    /// Whether the image at `url` is already in the target directory
    pub fn is_in_downloaded(&self, url: &str) -> bool {
        self.store.is_in_downloaded(url)
    }

    /// Whether the origin URL is banned by the host
    pub fn is_in_banned(&self, url: &str) -> bool {
        self.host.as_ref().is_some_and(|h| h.is_banned(url))
    }

    /// Whether the host has safe mode on
    pub fn is_safe_mode_enabled(&self) -> bool {
        self.host.as_ref().is_some_and(|h| h.is_safe_mode_enabled())
    }

    /// Whether the host rejects an image of this size
    pub fn is_size_inadequate(&self, width: u32, height: u32) -> bool {
        self.host.as_ref().is_some_and(|h| !h.size_ok(width, height))
    }

    /// Whether the image at `url` is already among the host's favorites
    pub fn is_in_favorites(&self, url: &str) -> bool {
        self.host
            .as_ref()
            .and_then(|h| h.favorites_folder())
            .is_some_and(|dir| dir.join(local_name(url)).exists())
    }

    /// Classify extra metadata against the safe-mode denylist
    pub fn is_unsafe(&self, extra_metadata: &Metadata) -> Safety {
        self.safety
            .classify(self.is_safe_mode_enabled(), extra_metadata)
    }

    /// Download one image and tag it with metadata
    ///
    /// Returns [`DownloadOutcome::Saved`] with the local path, or
    /// [`DownloadOutcome::Skipped`] for banned, already downloaded, unsafe and
    /// non-image items.
    ///
    /// # Errors
    /// Network failures, non-success HTTP statuses and write failures are
    /// returned as errors so the caller can back off. The partial download is
    /// removed first.
    pub async fn save_locally(
        &self,
        origin_url: &str,
        image_url: &str,
        options: SaveOptions,
    ) -> Result<DownloadOutcome> {
        let SaveOptions {
            extra_metadata,
            source_type,
            source_name,
            source_location,
            force_download,
            local_filename,
        } = options;

        let source_type = source_type.unwrap_or_else(|| self.source.source_type.clone());
        let source_name = source_name.unwrap_or_else(|| self.source.source_name.clone());
        let source_location = source_location
            .or_else(|| self.source.source_location.clone())
            .unwrap_or_else(|| self.source.description.clone());

        if !force_download && self.is_in_banned(origin_url) {
            info!(origin_url, "URL is banned, skip downloading");
            return Ok(DownloadOutcome::Skipped(SkipReason::Banned));
        }

        self.store.ensure_target_dir().await;

        let (origin_url, image_url) = normalize_urls(origin_url, image_url);
        let local_filename =
            local_filename.unwrap_or_else(|| self.store.local_filename_for(&image_url));

        info!(
            origin_url = %origin_url,
            image_url = %image_url,
            local_name = %local_filename.display(),
            "Saving image"
        );

        if !force_download && self.store.exists(&local_filename) {
            info!(local_name = %local_filename.display(), "File already exists, skip downloading");
            return Ok(DownloadOutcome::Skipped(SkipReason::AlreadyExists));
        }

        if let Safety::Unsafe { matched } = self.is_unsafe(&extra_metadata) {
            info!(
                origin_url = %origin_url,
                blacklisted = ?matched,
                source_type = %source_type,
                source_location = %source_location,
                "Skipping non-safe download due to blacklisted keywords"
            );
            return Ok(DownloadOutcome::Skipped(SkipReason::Unsafe { matched }));
        }

        let temp = self.store.temp_path_for(&local_filename);
        match self.stream_to_file(&image_url, &temp).await {
            Ok(bytes) => debug!(image_url = %image_url, bytes, "image body received"),
            Err(e) => {
                warn!(
                    image_url = %image_url,
                    source_location = %source_location,
                    error = %e,
                    "Download failed from image URL"
                );
                remove_partial(&temp).await;
                return Err(e);
            }
        }

        if !self.validator.is_image(&temp, true).await {
            info!(image_url = %image_url, "Downloaded data was not an image, image URL might be outdated");
            tokio::fs::remove_file(&temp).await?;
            return Ok(DownloadOutcome::Skipped(SkipReason::InvalidImage));
        }

        tokio::fs::rename(&temp, &local_filename).await?;

        let mut record = Metadata::new();
        record.insert(metadata_keys::SOURCE_TYPE.into(), Value::String(source_type));
        record.insert(metadata_keys::SOURCE_NAME.into(), Value::String(source_name));
        record.insert(
            metadata_keys::SOURCE_LOCATION.into(),
            Value::String(source_location),
        );
        record.insert(metadata_keys::ORIGIN_URL.into(), Value::String(origin_url));
        record.insert(metadata_keys::IMAGE_URL.into(), Value::String(image_url));
        record.extend(extra_metadata);

        // Not transactional: a crash here leaves the image without its sidecar,
        // and the existence check will skip it from now on.
        self.store.write_metadata(&local_filename, &record).await?;

        info!(local_name = %local_filename.display(), "Download complete");
        Ok(DownloadOutcome::Saved(local_filename))
    }

    /// Stream the body at `url` into `dest` chunk by chunk
    async fn stream_to_file(&self, url: &str, dest: &Path) -> Result<u64> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut body = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }
}

async fn remove_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "could not remove partial download"),
    }
}
