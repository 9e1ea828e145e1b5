//! Local storage for downloaded images and their metadata sidecars
//!
//! Every remote URL maps to one deterministic file name inside the target
//! directory, so "is this already downloaded?" is a plain existence check.
//! Images are streamed into a `.part` file first and renamed into place only
//! after validation, so a half-written download never looks like a finished one.

use crate::error::Result;
use crate::types::Metadata;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use url::Url;

/// Names longer than this many bytes are truncated and suffixed with a URL hash
///
/// Filesystems cap a name at 255 bytes; the rest is left for the sidecar and
/// temp suffixes (`.metadata.json.part`).
const MAX_NAME_BYTES: usize = 200;

/// Extensions longer than this are not preserved when truncating
const MAX_EXTENSION_LEN: usize = 10;

/// Suffix of in-progress downloads
const PARTIAL_SUFFIX: &str = ".part";

/// Suffix of metadata sidecar files
const METADATA_SUFFIX: &str = ".metadata.json";

/// Compute the deterministic local file name for a URL
///
/// The last path segment is used with query string and fragment dropped,
/// percent-decoded, and with characters that are unsafe in file names replaced
/// by `_`. URLs without a usable segment fall back to the md5 of the URL, and
/// overlong names are truncated with the md5 appended so that distinct URLs
/// sharing a long prefix still map to distinct names.
///
/// # Examples
///
/// ```
/// use wallfetch::store::local_name;
///
/// assert_eq!(local_name("https://example.com/img/Sunset%20Beach.jpg?w=1920"), "Sunset Beach.jpg");
/// assert_eq!(local_name("https://example.com/a.png#top"), "a.png");
/// ```
#[must_use]
pub fn local_name(url: &str) -> String {
    let raw = last_segment(url);
    let decoded = urlencoding::decode(&raw)
        .map(|s| s.into_owned())
        .unwrap_or(raw);
    let sanitized = sanitize(&decoded);

    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        return url_hash(url);
    }

    if sanitized.len() <= MAX_NAME_BYTES {
        return sanitized;
    }

    shorten(&sanitized, url)
}

fn last_segment(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|segments| segments.last())
            .unwrap_or_default()
            .to_string(),
        // Relative or protocol-relative input: cut query/fragment by hand
        Err(_) => {
            let without_fragment = url.split('#').next().unwrap_or(url);
            let without_query = without_fragment.split('?').next().unwrap_or(without_fragment);
            without_query.rsplit('/').next().unwrap_or_default().to_string()
        }
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

fn url_hash(url: &str) -> String {
    format!("{:x}", md5::compute(url.as_bytes()))
}

fn shorten(name: &str, url: &str) -> String {
    let hash = url_hash(url);
    let extension = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= MAX_EXTENSION_LEN);

    let reserved = hash.len() + 1 + extension.map_or(0, |e| e.len() + 1);
    let budget = MAX_NAME_BYTES - reserved;
    let cut = name
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|end| *end <= budget)
        .last()
        .unwrap_or(0);
    let stem = &name[..cut];

    match extension {
        Some(ext) => format!("{stem}_{hash}.{ext}"),
        None => format!("{stem}_{hash}"),
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// Accessor for one target directory
#[derive(Clone, Debug)]
pub struct LocalStore {
    target_dir: PathBuf,
}

impl LocalStore {
    /// Create a store rooted at `target_dir` (the directory is created lazily)
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
        }
    }

    /// Directory images are written to
    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    /// Full local path a URL downloads to
    pub fn local_filename_for(&self, url: &str) -> PathBuf {
        self.target_dir.join(local_name(url))
    }

    /// Whether a file exists at `path`
    pub fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    /// Whether the image at `url` has already been downloaded into this store
    pub fn is_in_downloaded(&self, url: &str) -> bool {
        self.exists(&self.local_filename_for(url))
    }

    /// Create the target directory
    ///
    /// Failures are only logged; the following write reports the real problem.
    pub async fn ensure_target_dir(&self) {
        if let Err(e) = tokio::fs::create_dir_all(&self.target_dir).await {
            tracing::debug!(
                dir = %self.target_dir.display(),
                error = %e,
                "could not create target directory"
            );
        }
    }

    /// Path an in-progress download of `path` is streamed into
    pub fn temp_path_for(&self, path: &Path) -> PathBuf {
        with_suffix(path, PARTIAL_SUFFIX)
    }

    /// Path of the metadata sidecar for the image at `path`
    pub fn metadata_path_for(&self, path: &Path) -> PathBuf {
        with_suffix(path, METADATA_SUFFIX)
    }

    /// Write the metadata sidecar for the image at `image_path`
    pub async fn write_metadata(&self, image_path: &Path, record: &Metadata) -> Result<PathBuf> {
        let sidecar = self.metadata_path_for(image_path);
        let temp = self.temp_path_for(&sidecar);
        let json = serde_json::to_vec_pretty(record)?;

        tokio::fs::write(&temp, json).await?;
        tokio::fs::rename(&temp, &sidecar).await?;
        Ok(sidecar)
    }

    /// Read the metadata sidecar for the image at `image_path`, if present
    pub async fn read_metadata(&self, image_path: &Path) -> Result<Option<Metadata>> {
        let sidecar = self.metadata_path_for(image_path);
        match tokio::fs::read(&sidecar).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
