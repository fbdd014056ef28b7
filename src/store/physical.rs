//! store::physical
//!
//! Disk-backed file store.
//!
//! A `PhysicalStore` roots all virtual paths under a single directory.
//! Virtual paths may carry a leading `/` or `~` marker and either slash
//! flavor; they are resolved against the root before touching the disk.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::AsyncReadExt;

use super::traits::{matches_filter, Content, FileStore, StoreError};

/// A file store over a directory on disk.
///
/// # Example
///
/// ```no_run
/// use gitmirror::store::{Content, FileStore, PhysicalStore};
///
/// # tokio_test::block_on(async {
/// let store = PhysicalStore::new("/srv/app");
/// store
///     .add_file("/App_Data/forms/a.json", Content::buffered("{}"), true)
///     .await
///     .unwrap();
/// assert!(store.file_exists("/App_Data/forms/a.json").await.unwrap());
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct PhysicalStore {
    root: PathBuf,
    base_url: Option<String>,
}

impl PhysicalStore {
    /// Create a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            base_url: None,
        }
    }

    /// Set the base URL reported by [`FileStore::get_url`].
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// The root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Virtual path with markers and leading separators removed.
    fn relative(path: &str) -> String {
        path.replace('\\', "/")
            .trim_start_matches('~')
            .trim_start_matches('/')
            .to_string()
    }

    /// Resolve a virtual path to its on-disk location.
    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(Self::relative(path))
    }

    fn io_error(path: &str, source: std::io::Error) -> StoreError {
        if source.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound { path: path.into() }
        } else {
            StoreError::Io {
                path: path.into(),
                source,
            }
        }
    }

    async fn timestamp(
        &self,
        path: &str,
        pick: fn(&std::fs::Metadata) -> std::io::Result<std::time::SystemTime>,
    ) -> Result<DateTime<Utc>, StoreError> {
        let meta = tokio::fs::metadata(self.resolve(path))
            .await
            .map_err(|e| Self::io_error(path, e))?;
        let time = pick(&meta).map_err(|e| Self::io_error(path, e))?;
        Ok(time.into())
    }
}

#[async_trait]
impl FileStore for PhysicalStore {
    async fn get_directories(&self, path: &str) -> Result<Vec<String>, StoreError> {
        let dir = self.resolve(path);
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| Self::io_error(path, e))?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Self::io_error(path, e))?
        {
            let file_type = entry.file_type().await.map_err(|e| Self::io_error(path, e))?;
            if file_type.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    async fn delete_directory(&self, path: &str, recursive: bool) -> Result<(), StoreError> {
        let dir = self.resolve(path);
        let result = if recursive {
            tokio::fs::remove_dir_all(&dir).await
        } else {
            tokio::fs::remove_dir(&dir).await
        };
        result.map_err(|e| Self::io_error(path, e))
    }

    async fn directory_exists(&self, path: &str) -> Result<bool, StoreError> {
        match tokio::fs::metadata(self.resolve(path)).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Self::io_error(path, e)),
        }
    }

    async fn add_file(
        &self,
        path: &str,
        content: Content,
        overwrite: bool,
    ) -> Result<(), StoreError> {
        let target = self.resolve(path);

        if !overwrite && self.file_exists(path).await? {
            return Err(StoreError::AlreadyExists { path: path.into() });
        }

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Self::io_error(path, e))?;
        }

        let bytes = match content {
            Content::Buffered(bytes) => bytes,
            Content::Streaming(mut reader) => {
                let mut bytes = Vec::new();
                reader
                    .read_to_end(&mut bytes)
                    .await
                    .map_err(|e| Self::io_error(path, e))?;
                bytes
            }
        };

        tokio::fs::write(&target, bytes)
            .await
            .map_err(|e| Self::io_error(path, e))
    }

    async fn get_files(&self, path: &str, filter: Option<&str>) -> Result<Vec<String>, StoreError> {
        let dir = self.resolve(path);
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| Self::io_error(path, e))?;

        let prefix = Self::relative(path);
        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Self::io_error(path, e))?
        {
            let file_type = entry.file_type().await.map_err(|e| Self::io_error(path, e))?;
            if !file_type.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(filter) = filter {
                if !matches_filter(&name, filter) {
                    continue;
                }
            }
            if prefix.is_empty() {
                files.push(format!("/{name}"));
            } else {
                files.push(format!("/{prefix}/{name}"));
            }
        }
        files.sort();
        Ok(files)
    }

    async fn open_file(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        tokio::fs::read(self.resolve(path))
            .await
            .map_err(|e| Self::io_error(path, e))
    }

    async fn delete_file(&self, path: &str) -> Result<(), StoreError> {
        tokio::fs::remove_file(self.resolve(path))
            .await
            .map_err(|e| Self::io_error(path, e))
    }

    async fn file_exists(&self, path: &str) -> Result<bool, StoreError> {
        match tokio::fs::metadata(self.resolve(path)).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Self::io_error(path, e)),
        }
    }

    fn get_relative_path(&self, full_path_or_url: &str) -> String {
        let normalized = full_path_or_url.replace('\\', "/");
        let root = self.root.to_string_lossy().replace('\\', "/");

        let rest = match normalized.strip_prefix(&root) {
            Some(rest) if !root.is_empty() => rest,
            _ => match &self.base_url {
                Some(base) => normalized.strip_prefix(base.as_str()).unwrap_or(&normalized),
                None => &normalized,
            },
        };

        format!("/{}", rest.trim_start_matches('~').trim_start_matches('/'))
    }

    fn get_full_path(&self, path: &str) -> String {
        self.resolve(path).to_string_lossy().into_owned()
    }

    fn get_url(&self, path: &str) -> String {
        let relative = Self::relative(path);
        match &self.base_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), relative),
            None => format!("/{relative}"),
        }
    }

    async fn last_modified(&self, path: &str) -> Result<DateTime<Utc>, StoreError> {
        self.timestamp(path, std::fs::Metadata::modified).await
    }

    async fn created(&self, path: &str) -> Result<DateTime<Utc>, StoreError> {
        self.timestamp(path, std::fs::Metadata::created).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, PhysicalStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = PhysicalStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn add_then_open_round_trips() {
        let (_dir, store) = store();

        store
            .add_file("/forms/a.json", Content::buffered(r#"{"id":"a"}"#), true)
            .await
            .unwrap();

        let bytes = store.open_file("/forms/a.json").await.unwrap();
        assert_eq!(bytes, br#"{"id":"a"}"#);
        assert!(store.file_exists("/forms/a.json").await.unwrap());
        assert!(store.directory_exists("/forms").await.unwrap());
    }

    #[tokio::test]
    async fn add_without_overwrite_fails_on_existing() {
        let (_dir, store) = store();

        store
            .add_file("/a.txt", Content::buffered("one"), true)
            .await
            .unwrap();
        let err = store
            .add_file("/a.txt", Content::buffered("two"), false)
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::AlreadyExists { .. }));
        assert_eq!(store.open_file("/a.txt").await.unwrap(), b"one");
    }

    #[tokio::test]
    async fn streaming_content_is_drained_to_disk() {
        let (_dir, store) = store();

        let reader = std::io::Cursor::new(b"streamed bytes".to_vec());
        store
            .add_file("/s.bin", Content::streaming(reader), true)
            .await
            .unwrap();

        assert_eq!(store.open_file("/s.bin").await.unwrap(), b"streamed bytes");
    }

    #[tokio::test]
    async fn listing_and_filtering() {
        let (_dir, store) = store();

        store
            .add_file("/data/a.json", Content::buffered("{}"), true)
            .await
            .unwrap();
        store
            .add_file("/data/b.xml", Content::buffered("<x/>"), true)
            .await
            .unwrap();
        store
            .add_file("/data/sub/c.json", Content::buffered("{}"), true)
            .await
            .unwrap();

        let all = store.get_files("/data", None).await.unwrap();
        assert_eq!(all, vec!["/data/a.json", "/data/b.xml"]);

        let json = store.get_files("/data", Some("*.json")).await.unwrap();
        assert_eq!(json, vec!["/data/a.json"]);

        let dirs = store.get_directories("/data").await.unwrap();
        assert_eq!(dirs, vec!["sub"]);
    }

    #[tokio::test]
    async fn delete_file_and_directory() {
        let (_dir, store) = store();

        store
            .add_file("/d/a.txt", Content::buffered("x"), true)
            .await
            .unwrap();

        store.delete_file("/d/a.txt").await.unwrap();
        assert!(!store.file_exists("/d/a.txt").await.unwrap());

        store.delete_directory("/d", false).await.unwrap();
        assert!(!store.directory_exists("/d").await.unwrap());
    }

    #[tokio::test]
    async fn missing_file_maps_to_not_found() {
        let (_dir, store) = store();

        let err = store.open_file("/nope.txt").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn full_and_relative_paths_round_trip() {
        let store = PhysicalStore::new("/srv/app");

        let full = store.get_full_path("~/App_Data/forms/a.json");
        assert_eq!(full, "/srv/app/App_Data/forms/a.json");
        assert_eq!(store.get_relative_path(&full), "/App_Data/forms/a.json");
    }

    #[test]
    fn url_uses_base_when_configured() {
        let store = PhysicalStore::new("/srv/app").with_base_url("https://cdn.example/media");
        assert_eq!(
            store.get_url("/forms/a.json"),
            "https://cdn.example/media/forms/a.json"
        );

        let bare = PhysicalStore::new("/srv/app");
        assert_eq!(bare.get_url("/forms/a.json"), "/forms/a.json");
    }

    #[tokio::test]
    async fn timestamps_are_reported() {
        let (_dir, store) = store();

        store
            .add_file("/t.txt", Content::buffered("x"), true)
            .await
            .unwrap();

        let modified = store.last_modified("/t.txt").await.unwrap();
        assert!(modified <= Utc::now());
    }
}
