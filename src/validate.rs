//! Image content validation
//!
//! Sources regularly hand out stale URLs that answer with an HTML error page
//! and a 200 status. The file extension proves nothing, so validation sniffs
//! the actual bytes.

use async_trait::async_trait;
use image::{ImageReader, ImageResult};
use std::path::{Path, PathBuf};

/// Decides whether a downloaded file is a genuine image
#[async_trait]
pub trait ImageValidator: Send + Sync {
    /// Whether the file at `path` is an image
    ///
    /// With `check_contents` the whole image is decoded, which also rejects
    /// truncated or corrupt files. Without it only the header is inspected.
    async fn is_image(&self, path: &Path, check_contents: bool) -> bool;
}

/// [`ImageValidator`] that sniffs the format from content and decodes with the `image` crate
#[derive(Clone, Copy, Debug, Default)]
pub struct DecodingImageValidator;

#[async_trait]
impl ImageValidator for DecodingImageValidator {
    async fn is_image(&self, path: &Path, check_contents: bool) -> bool {
        let owned: PathBuf = path.to_path_buf();

        // Decoding is CPU-bound; keep it off the async worker threads
        let result =
            tokio::task::spawn_blocking(move || inspect(&owned, check_contents)).await;

        match result {
            Ok(Ok(is_image)) => is_image,
            Ok(Err(e)) => {
                tracing::debug!(path = %path.display(), error = %e, "not a valid image");
                false
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "image validation task failed");
                false
            }
        }
    }
}

fn inspect(path: &Path, check_contents: bool) -> ImageResult<bool> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    if reader.format().is_none() {
        return Ok(false);
    }

    if check_contents {
        reader.decode()?;
    } else {
        reader.into_dimensions()?;
    }
    Ok(true)
}
