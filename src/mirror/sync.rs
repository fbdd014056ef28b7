//! mirror::sync
//!
//! The commit pipeline: probe existence, resolve the parent commit,
//! classify, and submit the push.
//!
//! # Design
//!
//! Control flows one way: each stage is a pure function of its inputs
//! plus at most one remote read. The pipeline borrows its collaborators;
//! the façade owns them and constructs a pipeline per save.
//!
//! There is no retry anywhere. In particular, a push rejected because the
//! resolved parent went stale (a concurrent save won the race) surfaces
//! as a plain [`VcsError`] for the façade to log — the remote service's
//! optimistic-concurrency check is the sole backstop against lost
//! updates.

use crate::core::types::{BranchName, BranchTarget, ChangeKind, CommitId, RepositoryId};
use crate::vcs::{
    CommitSpec, ItemChange, PushReceipt, PushRequest, RefUpdate, VcsClient, VcsError,
};

use super::message::{MessageContext, MessagePolicy};

/// One save's view of the remote repository.
pub(crate) struct Pipeline<'a> {
    pub vcs: &'a dyn VcsClient,
    pub repo: &'a RepositoryId,
    pub repo_root: &'a str,
    pub target: &'a BranchTarget,
}

impl Pipeline<'_> {
    /// Run the full pipeline for one save.
    ///
    /// `canonical_path` is the repository-relative path of the saved
    /// file; `content` is exactly what was written.
    pub(crate) async fn mirror(
        &self,
        canonical_path: &str,
        content: &[u8],
        actor: Option<&str>,
        policy: &dyn MessagePolicy,
    ) -> Result<PushReceipt, VcsError> {
        let repo_path = format!("{}{}", self.repo_root, canonical_path);

        let parent = self.latest_commit().await?;
        let exists = self.item_exists(&repo_path).await?;
        let kind = if exists {
            ChangeKind::Edit
        } else {
            ChangeKind::Add
        };

        let message = policy.compose(&MessageContext {
            kind,
            canonical_path,
            content,
            actor,
        });

        let push = PushRequest {
            ref_update: RefUpdate {
                name: self.target.ref_name.clone(),
                expected_old_commit: parent,
            },
            commit: CommitSpec {
                comment: message,
                change: ItemChange {
                    kind,
                    path: repo_path,
                    content: String::from_utf8_lossy(content).into_owned(),
                },
            },
        };

        self.vcs.create_push(self.repo, push).await
    }

    /// Whether an item exists at `repo_path` on the target branch.
    ///
    /// A remote `NotFound` is the expected negative; everything else
    /// propagates.
    pub(crate) async fn item_exists(&self, repo_path: &str) -> Result<bool, VcsError> {
        match self
            .vcs
            .get_item(self.repo, repo_path, &self.target.branch)
            .await
        {
            Ok(_) => Ok(true),
            Err(VcsError::NotFound(_)) => Ok(false),
            Err(other) => Err(other),
        }
    }

    /// The parent commit id for the push: the target branch's head, or
    /// the fallback branch's head if the target has no history yet.
    ///
    /// `None` means this push creates the first commit on the ref. The
    /// fallback is consulted at most once; there is no recursion beyond
    /// one level.
    pub(crate) async fn latest_commit(&self) -> Result<Option<CommitId>, VcsError> {
        match self.head_of(&self.target.branch).await {
            Ok(Some(id)) => Ok(Some(id)),
            Ok(None) => self.fallback_commit().await,
            Err(VcsError::NotFound(_)) => self.fallback_commit().await,
            Err(other) => Err(other),
        }
    }

    async fn fallback_commit(&self) -> Result<Option<CommitId>, VcsError> {
        let Some(fallback) = &self.target.fallback else {
            return Ok(None);
        };
        match self.head_of(fallback).await {
            Ok(head) => Ok(head),
            Err(VcsError::NotFound(_)) => Ok(None),
            Err(other) => Err(other),
        }
    }

    /// Most recent commit on `branch`, if any.
    async fn head_of(&self, branch: &BranchName) -> Result<Option<CommitId>, VcsError> {
        let commits = self.vcs.get_commits(self.repo, branch, 0, 1).await?;
        Ok(commits.first().map(|c| c.commit_id.clone()))
    }
}
