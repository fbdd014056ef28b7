//! vcs::traits
//!
//! Capability trait for the hosted Git service.
//!
//! # Design
//!
//! The `VcsClient` trait is async because every operation is a network
//! round trip. All methods return `Result` with a typed [`VcsError`].
//!
//! The surface is deliberately minimal: the mirroring core only ever
//! reads two facts (does an item exist, what is the branch head) and
//! issues one intent (a single-change push). History, diffing, and the
//! Git object model stay on the service's side.
//!
//! # Example
//!
//! ```ignore
//! use gitmirror::vcs::{PushRequest, VcsClient, VcsError};
//!
//! async fn head_exists(vcs: &dyn VcsClient) -> Result<bool, VcsError> {
//!     match vcs.get_item(&repo, "/site/forms/a.json", &branch).await {
//!         Ok(_) => Ok(true),
//!         Err(VcsError::NotFound(_)) => Ok(false),
//!         Err(other) => Err(other),
//!     }
//! }
//! ```

use async_trait::async_trait;
use thiserror::Error;

use crate::core::types::{BranchName, ChangeKind, CommitId, RefName, RepositoryId};

/// Errors from remote VCS operations.
///
/// `NotFound` is an expected negative (missing item, branch with no
/// history); everything else is an unexpected remote failure from the
/// mirroring pipeline's perspective.
#[derive(Debug, Clone, Error)]
pub enum VcsError {
    /// Authentication failed (bad credentials, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The service rejected the request. Covers optimistic-concurrency
    /// rejections on pushes (the supplied parent commit id was stale).
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the service
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),
}

/// An item (file) as reported by the remote service.
#[derive(Debug, Clone)]
pub struct RepoItem {
    /// Repository path of the item.
    pub path: String,
    /// Object id of the item's blob, when the service reports one.
    pub object_id: Option<String>,
}

/// A commit as reported by the remote service's history listing.
#[derive(Debug, Clone)]
pub struct CommitRef {
    /// The commit's id.
    pub commit_id: CommitId,
    /// The commit's message, when the service reports one.
    pub comment: Option<String>,
}

/// An atomic push: one ref update and one commit carrying exactly one
/// file change.
///
/// The shape makes the single-change invariant structural — there is no
/// way to express a multi-file push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushRequest {
    /// The ref update naming the target ref and the expected old head.
    pub ref_update: RefUpdate,
    /// The commit the push introduces.
    pub commit: CommitSpec,
}

/// A ref update with its optimistic-concurrency precondition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefUpdate {
    /// Fully-qualified ref being moved.
    pub name: RefName,
    /// Head the caller believes is current. `None` means the ref does not
    /// exist yet and the push creates it.
    pub expected_old_commit: Option<CommitId>,
}

/// The commit inside a push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSpec {
    /// Commit message.
    pub comment: String,
    /// The single file change.
    pub change: ItemChange,
}

/// One file change: classification, repository path, and raw-text
/// content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemChange {
    /// Add or edit.
    pub kind: ChangeKind,
    /// Full repository path of the item.
    pub path: String,
    /// Literal textual content of the file.
    pub content: String,
}

/// Acknowledgement of an accepted push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushReceipt {
    /// Service-assigned id of the push.
    pub push_id: u64,
}

/// The remote VCS capability.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow use across concurrent
/// save operations.
///
/// # Error Handling
///
/// - `NotFound` from [`get_item`] means "no such item on that branch" and
///   from [`get_commits`] means "branch has no history"; callers treat
///   both as normal negatives.
/// - Any other error is a hard failure of the current mirroring attempt.
///
/// [`get_item`]: VcsClient::get_item
/// [`get_commits`]: VcsClient::get_commits
#[async_trait]
pub trait VcsClient: Send + Sync {
    /// Get the client name (e.g. "azure", "mock").
    fn name(&self) -> &'static str;

    /// Look up the item at `path` on `branch`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no item exists at that path on that branch
    /// - `AuthFailed` / `ApiError` / `NetworkError` for remote failures
    async fn get_item(
        &self,
        repo: &RepositoryId,
        path: &str,
        branch: &BranchName,
    ) -> Result<RepoItem, VcsError>;

    /// List commits on `branch`, newest first, windowed by `skip`/`top`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the branch does not exist / has no history
    /// - `AuthFailed` / `ApiError` / `NetworkError` for remote failures
    async fn get_commits(
        &self,
        repo: &RepositoryId,
        branch: &BranchName,
        skip: u32,
        top: u32,
    ) -> Result<Vec<CommitRef>, VcsError>;

    /// Submit a push in one round trip.
    ///
    /// # Errors
    ///
    /// - `ApiError` if the service rejects the push (including a stale
    ///   `expected_old_commit`)
    /// - `AuthFailed` / `NetworkError` for remote failures
    async fn create_push(
        &self,
        repo: &RepositoryId,
        push: PushRequest,
    ) -> Result<PushReceipt, VcsError>;
}
