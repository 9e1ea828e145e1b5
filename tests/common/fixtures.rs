//! Image payloads and a feed-backed source served by wiremock

use async_trait::async_trait;
use image::{ImageFormat, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use wallfetch::types::metadata_keys;
use wallfetch::{
    Error, Metadata, QueueItem, QueueSource, Result, SharedThrottleState, SourceInfo,
    ThrottleConfig, ThrottleState,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::config::throttling;

/// Path the feed listing is served from
pub const FEED_PATH: &str = "/feed.json";

/// Encode a small patterned PNG
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 5) as u8, (y * 11) as u8, (x + y) as u8])
    })
    .write_to(&mut out, ImageFormat::Png)
    .unwrap();
    out.into_inner()
}

/// One entry of the feed listing
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeedEntry {
    pub page: String,
    pub image: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl FeedEntry {
    /// Entry for an image at `/images/{name}.png` on `server`, found on `/pages/{name}`
    pub fn on(server: &MockServer, name: &str) -> Self {
        Self {
            page: format!("{}/pages/{name}", server.uri()),
            image: format!("{}/images/{name}.png", server.uri()),
            keywords: Vec::new(),
        }
    }

    pub fn with_keywords(mut self, keywords: &[&str]) -> Self {
        self.keywords = keywords.iter().map(|k| k.to_string()).collect();
        self
    }
}

/// Source that lists candidates from a JSON feed
pub struct FeedSource {
    client: reqwest::Client,
    feed_url: String,
    throttle: SharedThrottleState,
}

impl FeedSource {
    pub fn new(server: &MockServer) -> Self {
        Self {
            client: reqwest::Client::new(),
            feed_url: format!("{}{FEED_PATH}", server.uri()),
            throttle: ThrottleState::shared(),
        }
    }
}

#[async_trait]
impl QueueSource for FeedSource {
    fn info(&self) -> SourceInfo {
        SourceInfo {
            source_type: "feed".to_string(),
            source_name: "Test Feed".to_string(),
            source_location: Some(self.feed_url.clone()),
            description: "JSON feed".to_string(),
        }
    }

    fn throttling(&self) -> ThrottleConfig {
        throttling()
    }

    fn throttle_state(&self) -> SharedThrottleState {
        self.throttle.clone()
    }

    async fn fill_queue(&self) -> Result<Vec<QueueItem>> {
        let response = self
            .client
            .get(&self.feed_url)
            .send()
            .await
            .map_err(|e| Error::fill("Test Feed", e))?;
        if !response.status().is_success() {
            return Err(Error::fill(
                "Test Feed",
                format!("feed returned {}", response.status()),
            ));
        }
        let entries: Vec<FeedEntry> = response
            .json()
            .await
            .map_err(|e| Error::fill("Test Feed", e))?;

        Ok(entries
            .into_iter()
            .map(|entry| {
                let mut extra = Metadata::new();
                extra.insert(
                    metadata_keys::KEYWORDS.to_string(),
                    serde_json::json!(entry.keywords),
                );
                QueueItem::new(entry.page, entry.image).with_metadata(extra)
            })
            .collect())
    }
}

/// Serve `entries` as the feed listing
pub async fn mount_feed(server: &MockServer, entries: &[FeedEntry]) {
    Mock::given(method("GET"))
        .and(path(FEED_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(entries))
        .mount(server)
        .await;
}

/// Serve a PNG at `/images/{name}.png`, expecting exactly `times` requests
pub async fn mount_image(server: &MockServer, name: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/images/{name}.png")))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(png_bytes(16, 9)),
        )
        .expect(times)
        .named(format!("image {name}"))
        .mount(server)
        .await;
}
