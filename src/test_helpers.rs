//! Shared test helpers for building fetchers, sources and image payloads.

use crate::config::{FetchConfig, ThrottleConfig};
use crate::error::{Error, Result};
use crate::fetch::ImageFetcher;
use crate::source::{QueueSource, SharedThrottleState, ThrottleState};
use crate::types::{DownloadOutcome, QueueItem, SourceInfo};
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::collections::VecDeque;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Encode a small patterned PNG
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encoded(ImageFormat::Png, width, height)
}

/// Encode a small patterned image in `format`
///
/// GIF, ICO and WebP get an RGBA buffer; their encoders prefer it.
pub(crate) fn encoded(format: ImageFormat, width: u32, height: u32) -> Vec<u8> {
    let rgb = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 7) as u8, (y * 13) as u8, (x ^ y) as u8])
    });
    let image = match format {
        ImageFormat::Gif | ImageFormat::Ico | ImageFormat::WebP => {
            DynamicImage::ImageRgba8(DynamicImage::ImageRgb8(rgb).to_rgba8())
        }
        _ => DynamicImage::ImageRgb8(rgb),
    };

    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, format).unwrap();
    out.into_inner()
}

pub(crate) fn test_source_info() -> SourceInfo {
    SourceInfo {
        source_type: "test".to_string(),
        source_name: "Test Source".to_string(),
        source_location: Some("https://source.example.com/feed".to_string()),
        description: "Images for tests".to_string(),
    }
}

/// Fetcher writing into `dir` with the permissive default host policy
pub(crate) fn test_fetcher(dir: &Path) -> ImageFetcher {
    let config = FetchConfig {
        target_dir: dir.to_path_buf(),
        ..Default::default()
    };
    ImageFetcher::new(&config, test_source_info()).unwrap()
}

/// Source whose fills are scripted and whose downloads are recorded, never fetched
pub(crate) struct ScriptedSource {
    pub(crate) throttling: ThrottleConfig,
    pub(crate) throttle: SharedThrottleState,
    pub(crate) fills: Mutex<VecDeque<Result<Vec<QueueItem>>>>,
    pub(crate) fill_calls: AtomicUsize,
    pub(crate) downloaded: Mutex<Vec<QueueItem>>,
    /// Make every download attempt fail after being recorded
    pub(crate) fail_downloads: AtomicBool,
    /// Yield to the runtime once inside every fill, letting other tasks interleave
    pub(crate) yield_in_fill: AtomicBool,
}

impl ScriptedSource {
    pub(crate) fn new(min_download: Duration, min_fill: Duration) -> Self {
        Self {
            throttling: ThrottleConfig {
                min_download_interval: min_download,
                min_fill_interval: min_fill,
            },
            throttle: ThrottleState::shared(),
            fills: Mutex::new(VecDeque::new()),
            fill_calls: AtomicUsize::new(0),
            downloaded: Mutex::new(Vec::new()),
            fail_downloads: AtomicBool::new(false),
            yield_in_fill: AtomicBool::new(false),
        }
    }

    /// Queue up the result of the next fill
    pub(crate) fn push_fill(&self, result: Result<Vec<QueueItem>>) {
        self.fills.lock().unwrap().push_back(result);
    }

    pub(crate) fn fill_calls(&self) -> usize {
        self.fill_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn downloaded_urls(&self) -> Vec<String> {
        self.downloaded
            .lock()
            .unwrap()
            .iter()
            .map(|i| i.image_url.clone())
            .collect()
    }
}

#[async_trait]
impl QueueSource for ScriptedSource {
    fn info(&self) -> SourceInfo {
        test_source_info()
    }

    fn throttling(&self) -> ThrottleConfig {
        self.throttling
    }

    fn throttle_state(&self) -> SharedThrottleState {
        self.throttle.clone()
    }

    async fn fill_queue(&self) -> Result<Vec<QueueItem>> {
        self.fill_calls.fetch_add(1, Ordering::SeqCst);
        if self.yield_in_fill.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        self.fills
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::fill("Test Source", "no scripted fill left")))
    }

    async fn download_queue_item(
        &self,
        _fetcher: &ImageFetcher,
        item: QueueItem,
    ) -> Result<DownloadOutcome> {
        let path = PathBuf::from(&item.image_url);
        self.downloaded.lock().unwrap().push(item);
        if self.fail_downloads.load(Ordering::SeqCst) {
            return Err(Error::Other("simulated fetch failure".to_string()));
        }
        Ok(DownloadOutcome::Saved(path))
    }
}

/// Shorthand for a queue item whose origin and image URL share a name
pub(crate) fn item(name: &str) -> QueueItem {
    QueueItem::new(
        format!("https://example.com/page/{name}"),
        format!("https://cdn.example.com/{name}.jpg"),
    )
}
