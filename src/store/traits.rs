//! store::traits
//!
//! The file-store capability: the interface the application saves
//! through, and the content source type saves carry.
//!
//! # Design
//!
//! `FileStore` is async because implementations may sit on blocking or
//! remote media, and because the mirroring decorator needs a suspension
//! point for its network calls. All fallible methods return `Result` with
//! a typed [`StoreError`].
//!
//! Paths given to a store are virtual: relative to the store's root,
//! `/`-separated, optionally carrying a leading `/` or `~` marker.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::io::AsyncRead;

/// Errors from file-store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The file or directory does not exist.
    #[error("not found: {path}")]
    NotFound {
        /// The path that was not found
        path: String,
    },

    /// The file already exists and overwriting was not requested.
    #[error("already exists: {path}")]
    AlreadyExists {
        /// The path that already exists
        path: String,
    },

    /// Underlying I/O failure.
    #[error("io error on '{path}': {source}")]
    Io {
        /// The path the operation touched
        path: String,
        /// The underlying error
        source: std::io::Error,
    },
}

/// The content carried by a save.
///
/// A `Buffered` source holds the full bytes and can be re-read after the
/// store consumes it; this is what lets the mirroring decorator inspect
/// what was just written. A `Streaming` source is one-shot: once the
/// inner store has drained it there is nothing left to mirror, so the
/// decorator forwards it and skips mirroring (a documented limitation,
/// not an error).
pub enum Content {
    /// Fully-buffered bytes; re-readable.
    Buffered(Vec<u8>),
    /// One-shot byte stream; consumed by the write.
    Streaming(Box<dyn AsyncRead + Send + Unpin>),
}

impl Content {
    /// Buffered content from anything byte-like.
    pub fn buffered(bytes: impl Into<Vec<u8>>) -> Self {
        Content::Buffered(bytes.into())
    }

    /// One-shot streaming content.
    pub fn streaming(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Content::Streaming(Box::new(reader))
    }

    /// Whether the content can be read again after the write consumed it.
    pub fn is_rewindable(&self) -> bool {
        matches!(self, Content::Buffered(_))
    }

    /// The bytes of a buffered source, if this is one.
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Content::Buffered(bytes) => Some(bytes),
            Content::Streaming(_) => None,
        }
    }
}

impl std::fmt::Debug for Content {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Content::Buffered(bytes) => f
                .debug_struct("Buffered")
                .field("len", &bytes.len())
                .finish(),
            Content::Streaming(_) => f.debug_struct("Streaming").finish_non_exhaustive(),
        }
    }
}

impl From<Vec<u8>> for Content {
    fn from(bytes: Vec<u8>) -> Self {
        Content::Buffered(bytes)
    }
}

impl From<&[u8]> for Content {
    fn from(bytes: &[u8]) -> Self {
        Content::Buffered(bytes.to_vec())
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Buffered(text.as_bytes().to_vec())
    }
}

/// The file-store capability.
///
/// Implementations must be `Send + Sync` so a store can be shared across
/// concurrent save operations.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Names of the directories directly under `path`.
    async fn get_directories(&self, path: &str) -> Result<Vec<String>, StoreError>;

    /// Delete the directory at `path`. With `recursive`, also delete its
    /// contents; otherwise the directory must be empty.
    async fn delete_directory(&self, path: &str, recursive: bool) -> Result<(), StoreError>;

    /// Whether a directory exists at `path`.
    async fn directory_exists(&self, path: &str) -> Result<bool, StoreError>;

    /// Write a file at `path`.
    ///
    /// With `overwrite` false, fails with `StoreError::AlreadyExists` if
    /// the file is already present.
    async fn add_file(
        &self,
        path: &str,
        content: Content,
        overwrite: bool,
    ) -> Result<(), StoreError>;

    /// Paths of the files directly under `path`, optionally filtered by a
    /// `*`-wildcard pattern on the file name (e.g. `*.json`).
    async fn get_files(&self, path: &str, filter: Option<&str>) -> Result<Vec<String>, StoreError>;

    /// Read the file at `path`.
    async fn open_file(&self, path: &str) -> Result<Vec<u8>, StoreError>;

    /// Delete the file at `path`.
    async fn delete_file(&self, path: &str) -> Result<(), StoreError>;

    /// Whether a file exists at `path`.
    async fn file_exists(&self, path: &str) -> Result<bool, StoreError>;

    /// Convert a full path or URL back into the store-relative form.
    fn get_relative_path(&self, full_path_or_url: &str) -> String;

    /// The full (physical) path behind a store-relative path.
    fn get_full_path(&self, path: &str) -> String;

    /// Public URL for the file at `path`.
    fn get_url(&self, path: &str) -> String;

    /// When the file at `path` was last modified.
    async fn last_modified(&self, path: &str) -> Result<DateTime<Utc>, StoreError>;

    /// When the file at `path` was created.
    async fn created(&self, path: &str) -> Result<DateTime<Utc>, StoreError>;
}

/// Match a file name against a `*`-wildcard pattern.
///
/// Supports `*` as "any run of characters"; everything else matches
/// literally. An empty pattern matches everything.
pub(crate) fn matches_filter(name: &str, pattern: &str) -> bool {
    if pattern.is_empty() {
        return true;
    }
    if !pattern.contains('*') {
        return name == pattern;
    }

    let segments: Vec<&str> = pattern.split('*').collect();
    let mut remainder = name;

    for (i, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            continue;
        }
        if i == 0 {
            // Pattern does not start with '*': must match at the front.
            match remainder.strip_prefix(segment) {
                Some(rest) => remainder = rest,
                None => return false,
            }
        } else if i == segments.len() - 1 {
            // Pattern does not end with '*': must match at the back.
            return remainder.ends_with(segment);
        } else {
            match remainder.find(segment) {
                Some(pos) => remainder = &remainder[pos + segment.len()..],
                None => return false,
            }
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_rewindability() {
        let buffered = Content::buffered("hello");
        assert!(buffered.is_rewindable());
        assert_eq!(buffered.bytes(), Some("hello".as_bytes()));

        let streaming = Content::streaming(std::io::Cursor::new(b"hello".to_vec()));
        assert!(!streaming.is_rewindable());
        assert!(streaming.bytes().is_none());
    }

    #[test]
    fn wildcard_filters() {
        assert!(matches_filter("form.json", "*.json"));
        assert!(matches_filter("form.json", "form.*"));
        assert!(matches_filter("form.json", "*"));
        assert!(matches_filter("form.json", ""));
        assert!(matches_filter("form.json", "form.json"));
        assert!(matches_filter("a-b-c.json", "a*c.json"));

        assert!(!matches_filter("form.json.bak", "form.json"));
        assert!(!matches_filter("form.json", "*.xml"));
        assert!(!matches_filter("form.json", "other.*"));
        assert!(!matches_filter("form.json", "orm.*"));
    }
}
