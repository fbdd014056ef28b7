//! store::memory
//!
//! In-memory file store for deterministic testing.
//!
//! # Design
//!
//! `MemoryStore` keeps files in a map behind `Arc<Mutex<...>>` so clones
//! share state, mirroring how the other capability doubles in this crate
//! are built. Directories exist implicitly: a directory exists when some
//! file lives under it.
//!
//! A configurable `root` makes [`FileStore::get_full_path`] report
//! physical-looking paths, which is what the mirroring decorator feeds
//! into path canonicalization.
//!
//! # Example
//!
//! ```
//! use gitmirror::store::{Content, FileStore, MemoryStore};
//!
//! # tokio_test::block_on(async {
//! let store = MemoryStore::new().with_root("/srv/app");
//! store
//!     .add_file("/App_Data/a.json", Content::buffered("{}"), true)
//!     .await
//!     .unwrap();
//!
//! assert!(store.file_exists("/App_Data/a.json").await.unwrap());
//! assert_eq!(store.get_full_path("/App_Data/a.json"), "/srv/app/App_Data/a.json");
//! # });
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::AsyncReadExt;

use super::traits::{matches_filter, Content, FileStore, StoreError};

/// In-memory file store for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
    root: Option<String>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    /// File contents keyed by normalized path.
    files: BTreeMap<String, FileRecord>,
}

#[derive(Debug, Clone)]
struct FileRecord {
    bytes: Vec<u8>,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
}

/// Normalized store key: forward slashes, single leading `/`, no `~`.
fn key(path: &str) -> String {
    format!(
        "/{}",
        path.replace('\\', "/")
            .trim_start_matches('~')
            .trim_start_matches('/')
    )
}

/// Directory prefix form of a path (`/a/b` -> `/a/b/`, `/` stays `/`).
fn dir_prefix(path: &str) -> String {
    let k = key(path);
    if k == "/" {
        k
    } else {
        format!("{k}/")
    }
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the physical root reported by [`FileStore::get_full_path`].
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Number of files currently stored (for test verification).
    pub fn file_count(&self) -> usize {
        self.inner.lock().unwrap().files.len()
    }

    /// Contents of the file at `path`, if present (for test verification).
    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        let inner = self.inner.lock().unwrap();
        inner.files.get(&key(path)).map(|f| f.bytes.clone())
    }
}

#[async_trait]
impl FileStore for MemoryStore {
    async fn get_directories(&self, path: &str) -> Result<Vec<String>, StoreError> {
        let prefix = dir_prefix(path);
        let inner = self.inner.lock().unwrap();

        let mut names: Vec<String> = inner
            .files
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix))
            .filter_map(|rest| {
                let (first, remainder) = rest.split_once('/')?;
                (!remainder.is_empty()).then(|| first.to_string())
            })
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    async fn delete_directory(&self, path: &str, recursive: bool) -> Result<(), StoreError> {
        let prefix = dir_prefix(path);
        let mut inner = self.inner.lock().unwrap();

        let contained: Vec<String> = inner
            .files
            .keys()
            .filter(|k| k.starts_with(&prefix))
            .cloned()
            .collect();

        if contained.is_empty() {
            return Err(StoreError::NotFound { path: path.into() });
        }
        if !recursive {
            return Err(StoreError::Io {
                path: path.into(),
                source: std::io::Error::new(
                    std::io::ErrorKind::DirectoryNotEmpty,
                    "directory not empty",
                ),
            });
        }

        for k in contained {
            inner.files.remove(&k);
        }
        Ok(())
    }

    async fn directory_exists(&self, path: &str) -> Result<bool, StoreError> {
        let prefix = dir_prefix(path);
        let inner = self.inner.lock().unwrap();
        Ok(inner.files.keys().any(|k| k.starts_with(&prefix)))
    }

    async fn add_file(
        &self,
        path: &str,
        content: Content,
        overwrite: bool,
    ) -> Result<(), StoreError> {
        let bytes = match content {
            Content::Buffered(bytes) => bytes,
            Content::Streaming(mut reader) => {
                let mut bytes = Vec::new();
                reader
                    .read_to_end(&mut bytes)
                    .await
                    .map_err(|source| StoreError::Io {
                        path: path.into(),
                        source,
                    })?;
                bytes
            }
        };

        let now = Utc::now();
        let mut inner = self.inner.lock().unwrap();
        let k = key(path);

        match inner.files.get_mut(&k) {
            Some(_) if !overwrite => Err(StoreError::AlreadyExists { path: path.into() }),
            Some(record) => {
                record.bytes = bytes;
                record.modified = now;
                Ok(())
            }
            None => {
                inner.files.insert(
                    k,
                    FileRecord {
                        bytes,
                        created: now,
                        modified: now,
                    },
                );
                Ok(())
            }
        }
    }

    async fn get_files(&self, path: &str, filter: Option<&str>) -> Result<Vec<String>, StoreError> {
        let prefix = dir_prefix(path);
        let inner = self.inner.lock().unwrap();

        let mut files: Vec<String> = inner
            .files
            .keys()
            .filter(|k| {
                let Some(rest) = k.strip_prefix(&prefix) else {
                    return false;
                };
                if rest.contains('/') {
                    return false;
                }
                match filter {
                    Some(pattern) => matches_filter(rest, pattern),
                    None => true,
                }
            })
            .cloned()
            .collect();
        files.sort();
        Ok(files)
    }

    async fn open_file(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner
            .files
            .get(&key(path))
            .map(|f| f.bytes.clone())
            .ok_or_else(|| StoreError::NotFound { path: path.into() })
    }

    async fn delete_file(&self, path: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .files
            .remove(&key(path))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound { path: path.into() })
    }

    async fn file_exists(&self, path: &str) -> Result<bool, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.files.contains_key(&key(path)))
    }

    fn get_relative_path(&self, full_path_or_url: &str) -> String {
        let normalized = full_path_or_url.replace('\\', "/");
        match &self.root {
            Some(root) => {
                let root = root.replace('\\', "/");
                match normalized.strip_prefix(&root) {
                    Some(rest) => key(rest),
                    None => key(&normalized),
                }
            }
            None => key(&normalized),
        }
    }

    fn get_full_path(&self, path: &str) -> String {
        match &self.root {
            Some(root) => format!("{}{}", root.trim_end_matches('/'), key(path)),
            None => key(path),
        }
    }

    fn get_url(&self, path: &str) -> String {
        key(path)
    }

    async fn last_modified(&self, path: &str) -> Result<DateTime<Utc>, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner
            .files
            .get(&key(path))
            .map(|f| f.modified)
            .ok_or_else(|| StoreError::NotFound { path: path.into() })
    }

    async fn created(&self, path: &str) -> Result<DateTime<Utc>, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner
            .files
            .get(&key(path))
            .map(|f| f.created)
            .ok_or_else(|| StoreError::NotFound { path: path.into() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_open_delete_round_trip() {
        let store = MemoryStore::new();

        store
            .add_file("/forms/a.json", Content::buffered("{}"), true)
            .await
            .unwrap();
        assert_eq!(store.open_file("/forms/a.json").await.unwrap(), b"{}");

        store.delete_file("/forms/a.json").await.unwrap();
        assert!(!store.file_exists("/forms/a.json").await.unwrap());
    }

    #[tokio::test]
    async fn overwrite_flag_is_honored() {
        let store = MemoryStore::new();

        store
            .add_file("/a", Content::buffered("one"), true)
            .await
            .unwrap();
        let err = store
            .add_file("/a", Content::buffered("two"), false)
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::AlreadyExists { .. }));
        assert_eq!(store.contents("/a").unwrap(), b"one");
    }

    #[tokio::test]
    async fn implicit_directories() {
        let store = MemoryStore::new();

        store
            .add_file("/data/forms/a.json", Content::buffered("{}"), true)
            .await
            .unwrap();

        assert!(store.directory_exists("/data").await.unwrap());
        assert!(store.directory_exists("/data/forms").await.unwrap());
        assert!(!store.directory_exists("/other").await.unwrap());
        assert_eq!(
            store.get_directories("/data").await.unwrap(),
            vec!["forms"]
        );
    }

    #[tokio::test]
    async fn listing_with_filter() {
        let store = MemoryStore::new();

        store
            .add_file("/d/a.json", Content::buffered("{}"), true)
            .await
            .unwrap();
        store
            .add_file("/d/b.xml", Content::buffered("<x/>"), true)
            .await
            .unwrap();

        assert_eq!(
            store.get_files("/d", Some("*.json")).await.unwrap(),
            vec!["/d/a.json"]
        );
    }

    #[test]
    fn full_path_uses_configured_root() {
        let store = MemoryStore::new().with_root("/srv/app");
        assert_eq!(
            store.get_full_path("~/App_Data/a.json"),
            "/srv/app/App_Data/a.json"
        );
        assert_eq!(
            store.get_relative_path("/srv/app/App_Data/a.json"),
            "/App_Data/a.json"
        );
    }

    #[tokio::test]
    async fn paths_normalize_across_flavors() {
        let store = MemoryStore::new();

        store
            .add_file(r"\App_Data\a.json", Content::buffered("{}"), true)
            .await
            .unwrap();

        assert!(store.file_exists("/App_Data/a.json").await.unwrap());
        assert!(store.file_exists("~/App_Data/a.json").await.unwrap());
    }
}
