//! mirror::store
//!
//! The write-interception façade: a [`FileStore`] decorator that mirrors
//! every buffered save into the remote repository.
//!
//! # Behavior
//!
//! 1. Every operation is forwarded to the wrapped store. The forward is
//!    never skipped and never rolled back.
//! 2. After a successful save of re-readable ([`Content::Buffered`])
//!    content, the just-written bytes are pushed to the remote service:
//!    canonicalize the path, probe existence, resolve the branch head,
//!    classify add-vs-edit, derive the message, submit one push.
//! 3. Saves of one-shot streaming content are forwarded but not mirrored
//!    (a documented limitation, logged at debug level).
//! 4. Any failure in step 2 is routed to the configured [`ErrorSink`]
//!    exactly once and swallowed: callers see the save succeed whenever
//!    the wrapped store accepted it. The mirror is best-effort and may
//!    silently fall behind the authoritative store.
//!
//! # Concurrency
//!
//! Saves are processed independently with no in-process locking.
//! Concurrent saves of the same path can race between the existence
//! probe and the push; the service's optimistic-concurrency check on the
//! expected parent commit is the sole backstop, and a rejected push is
//! logged and swallowed like any other remote failure rather than
//! retried with a refreshed parent.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core::config::{ConfigError, MirrorConfig};
use crate::core::paths;
use crate::core::types::{BranchTarget, RepositoryId};
use crate::identity::{IdentityProvider, NoIdentity};
use crate::logging::{ErrorSink, TracingSink};
use crate::store::{Content, FileStore, StoreError};
use crate::vcs::VcsClient;

use super::message::{self, MessagePolicy};
use super::sync::Pipeline;
use super::MirrorError;

/// A [`FileStore`] decorator that mirrors saves into a remote Git
/// repository.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use gitmirror::core::config::MirrorConfig;
/// use gitmirror::mirror::MirrorStore;
/// use gitmirror::store::{Content, FileStore, MemoryStore};
/// use gitmirror::vcs::mock::MockVcs;
///
/// # tokio_test::block_on(async {
/// let config = MirrorConfig {
///     physical_root: "/srv/app".into(),
///     service_url: "https://dev.azure.com/acme/website".into(),
///     username: "builds@acme.example".into(),
///     pat: "token".into(),
///     repository: "repo".into(),
///     repo_root: "/My.WebSite".into(),
///     ..MirrorConfig::default()
/// };
///
/// let inner = Arc::new(MemoryStore::new().with_root("/srv/app"));
/// let vcs = MockVcs::new();
/// let store = MirrorStore::new(inner, Arc::new(vcs.clone()), &config).unwrap();
///
/// store
///     .add_file("/forms/a.json", Content::buffered("{}"), true)
///     .await
///     .unwrap();
/// assert_eq!(vcs.push_count(), 1);
/// # });
/// ```
pub struct MirrorStore {
    inner: Arc<dyn FileStore>,
    vcs: Arc<dyn VcsClient>,
    repo: RepositoryId,
    repo_root: String,
    physical_root: String,
    target: BranchTarget,
    policy: Arc<dyn MessagePolicy>,
    identity: Arc<dyn IdentityProvider>,
    sink: Arc<dyn ErrorSink>,
}

impl std::fmt::Debug for MirrorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MirrorStore")
            .field("vcs", &self.vcs.name())
            .field("repo", &self.repo)
            .field("repo_root", &self.repo_root)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl MirrorStore {
    /// Create a mirroring decorator over `inner`, pushing through `vcs`.
    ///
    /// The configuration fixes the repository, repository root, branch
    /// target, and message policy for the lifetime of the store. Identity
    /// defaults to [`NoIdentity`] and failure reporting to
    /// [`TracingSink`]; see [`with_identity`] and [`with_error_sink`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is invalid.
    ///
    /// [`with_identity`]: MirrorStore::with_identity
    /// [`with_error_sink`]: MirrorStore::with_error_sink
    pub fn new(
        inner: Arc<dyn FileStore>,
        vcs: Arc<dyn VcsClient>,
        config: &MirrorConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            inner,
            vcs,
            repo: config.repository_id()?,
            repo_root: config.repo_root.clone(),
            physical_root: config.physical_root.clone(),
            target: config.branch_target()?,
            policy: message::for_kind(config.message_policy),
            identity: Arc::new(NoIdentity),
            sink: Arc::new(TracingSink),
        })
    }

    /// Replace the identity provider consulted at save time.
    pub fn with_identity(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = identity;
        self
    }

    /// Replace the message policy.
    pub fn with_policy(mut self, policy: Arc<dyn MessagePolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the sink that receives swallowed mirroring failures.
    pub fn with_error_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.sink = sink;
        self
    }

    /// The branch target saves are mirrored to.
    pub fn target(&self) -> &BranchTarget {
        &self.target
    }

    /// Mirror one save. Failures carry the canonical path for the sink.
    async fn mirror(&self, path: &str, content: &[u8]) -> Result<(), MirrorError> {
        let full_path = self.inner.get_full_path(path);
        let canonical = paths::canonicalize(&full_path, &self.physical_root);
        let actor = self.identity.current_user();

        let pipeline = Pipeline {
            vcs: self.vcs.as_ref(),
            repo: &self.repo,
            repo_root: &self.repo_root,
            target: &self.target,
        };

        match pipeline
            .mirror(&canonical, content, actor.as_deref(), self.policy.as_ref())
            .await
        {
            Ok(_) => Ok(()),
            Err(source) => Err(MirrorError {
                path: canonical,
                source,
            }),
        }
    }
}

#[async_trait]
impl FileStore for MirrorStore {
    async fn get_directories(&self, path: &str) -> Result<Vec<String>, StoreError> {
        self.inner.get_directories(path).await
    }

    async fn delete_directory(&self, path: &str, recursive: bool) -> Result<(), StoreError> {
        self.inner.delete_directory(path, recursive).await
    }

    async fn directory_exists(&self, path: &str) -> Result<bool, StoreError> {
        self.inner.directory_exists(path).await
    }

    async fn add_file(
        &self,
        path: &str,
        content: Content,
        overwrite: bool,
    ) -> Result<(), StoreError> {
        // The inner store consumes the content; keep the bytes of a
        // re-readable source for the mirroring pass.
        let snapshot = content.bytes().map(<[u8]>::to_vec);

        self.inner.add_file(path, content, overwrite).await?;

        match snapshot {
            None => {
                tracing::debug!(path, "save content is not re-readable, skipping mirror");
            }
            Some(bytes) => {
                if let Err(error) = self.mirror(path, &bytes).await {
                    self.sink.record(&error);
                }
            }
        }

        Ok(())
    }

    async fn get_files(&self, path: &str, filter: Option<&str>) -> Result<Vec<String>, StoreError> {
        self.inner.get_files(path, filter).await
    }

    async fn open_file(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        self.inner.open_file(path).await
    }

    async fn delete_file(&self, path: &str) -> Result<(), StoreError> {
        self.inner.delete_file(path).await
    }

    async fn file_exists(&self, path: &str) -> Result<bool, StoreError> {
        self.inner.file_exists(path).await
    }

    fn get_relative_path(&self, full_path_or_url: &str) -> String {
        self.inner.get_relative_path(full_path_or_url)
    }

    fn get_full_path(&self, path: &str) -> String {
        self.inner.get_full_path(path)
    }

    fn get_url(&self, path: &str) -> String {
        self.inner.get_url(path)
    }

    async fn last_modified(&self, path: &str) -> Result<DateTime<Utc>, StoreError> {
        self.inner.last_modified(path).await
    }

    async fn created(&self, path: &str) -> Result<DateTime<Utc>, StoreError> {
        self.inner.created(path).await
    }
}
