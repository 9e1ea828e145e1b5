//! Assertions over the target directory

use serde_json::Value;
use std::path::{Path, PathBuf};
use wallfetch::{LocalStore, Metadata};

/// Read the sidecar next to `image`, failing the test if it is missing
pub async fn read_sidecar(image: &Path) -> Metadata {
    let dir = image.parent().unwrap();
    LocalStore::new(dir)
        .read_metadata(image)
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("no sidecar for {}", image.display()))
}

/// Assert a string-valued sidecar entry
pub fn assert_entry(metadata: &Metadata, key: &str, expected: &str) {
    assert_eq!(
        metadata.get(key),
        Some(&Value::String(expected.to_string())),
        "sidecar key {key}"
    );
}

/// Files in `dir`, sorted by name; empty if the directory does not exist
pub fn files_in(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries.map(|e| e.unwrap().path()).collect();
    files.sort();
    files
}

/// Assert that no `.part` file was left behind in `dir`
pub fn assert_no_partials(dir: &Path) {
    let partials: Vec<_> = files_in(dir)
        .into_iter()
        .filter(|p| p.extension().is_some_and(|e| e == "part"))
        .collect();
    assert!(partials.is_empty(), "leftover partial downloads: {partials:?}");
}
