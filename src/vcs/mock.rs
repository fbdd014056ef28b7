//! vcs::mock
//!
//! Mock VCS client for deterministic testing.
//!
//! # Design
//!
//! The mock keeps branch state in memory and allows configuring failure
//! scenarios. Accepted pushes are applied to that state: the pushed item
//! starts existing on the branch and the branch head advances, so a
//! second save of the same path classifies as an edit without any test
//! choreography.
//!
//! # Example
//!
//! ```
//! use gitmirror::core::types::BranchName;
//! use gitmirror::core::types::RepositoryId;
//! use gitmirror::vcs::mock::MockVcs;
//! use gitmirror::vcs::{VcsClient, VcsError};
//!
//! # tokio_test::block_on(async {
//! let branch = BranchName::new("master").unwrap();
//! let vcs = MockVcs::new().with_commit(&branch, "8ae7fc512175442388c091cf454367353aabbcc1");
//!
//! let repo = RepositoryId::new("repo").unwrap();
//! let head = vcs.get_commits(&repo, &branch, 0, 1).await.unwrap();
//! assert_eq!(head.len(), 1);
//!
//! let miss = vcs.get_item(&repo, "/nope.json", &branch).await;
//! assert!(matches!(miss, Err(VcsError::NotFound(_))));
//! # });
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::traits::{
    CommitRef, PushReceipt, PushRequest, RepoItem, VcsClient, VcsError,
};
use crate::core::types::{BranchName, CommitId, RepositoryId};

/// Mock VCS client for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone, Default)]
pub struct MockVcs {
    inner: Arc<Mutex<MockVcsInner>>,
}

/// Internal mutable state.
#[derive(Debug, Default)]
struct MockVcsInner {
    /// Items present per branch, keyed by branch name.
    items: HashMap<String, HashSet<String>>,
    /// Commit history per branch, newest first.
    commits: HashMap<String, Vec<CommitRef>>,
    /// Accepted pushes, in order.
    pushes: Vec<RecordedPush>,
    /// Operation to fail (for testing error paths).
    fail_on: Option<FailOn>,
    /// Counter for fabricated commit ids and push ids.
    sequence: u64,
}

/// A push as the mock received it.
#[derive(Debug, Clone)]
pub struct RecordedPush {
    /// Repository the push addressed.
    pub repo: RepositoryId,
    /// The push itself.
    pub push: PushRequest,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail get_item with the given error.
    GetItem(VcsError),
    /// Fail get_commits with the given error.
    GetCommits(VcsError),
    /// Fail create_push with the given error.
    CreatePush(VcsError),
}

impl MockVcs {
    /// Create a new empty mock with no branches.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a commit at the head of `branch`.
    ///
    /// # Panics
    ///
    /// Panics if `commit_id` is not a valid commit id; the mock is a test
    /// tool and bad fixtures should fail loudly.
    pub fn with_commit(self, branch: &BranchName, commit_id: &str) -> Self {
        let commit_id = CommitId::new(commit_id).expect("fixture commit id must be valid");
        {
            let mut inner = self.inner.lock().unwrap();
            inner
                .commits
                .entry(branch.as_str().to_string())
                .or_default()
                .insert(
                    0,
                    CommitRef {
                        commit_id,
                        comment: None,
                    },
                );
        }
        self
    }

    /// Seed an existing item at `path` on `branch`.
    pub fn with_item(self, branch: &BranchName, path: &str) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner
                .items
                .entry(branch.as_str().to_string())
                .or_default()
                .insert(path.to_string());
        }
        self
    }

    /// Configure the mock to fail on a specific operation.
    ///
    /// # Example
    ///
    /// ```
    /// use gitmirror::vcs::mock::{FailOn, MockVcs};
    /// use gitmirror::vcs::VcsError;
    ///
    /// let vcs = MockVcs::new().fail_on(FailOn::CreatePush(VcsError::ApiError {
    ///     status: 409,
    ///     message: "stale parent".into(),
    /// }));
    /// ```
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.fail_on = Some(fail_on);
        }
        self
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_on = None;
    }

    /// All accepted pushes, in order (for test verification).
    pub fn pushes(&self) -> Vec<RecordedPush> {
        let inner = self.inner.lock().unwrap();
        inner.pushes.clone()
    }

    /// The most recent accepted push (for test verification).
    pub fn last_push(&self) -> Option<RecordedPush> {
        let inner = self.inner.lock().unwrap();
        inner.pushes.last().cloned()
    }

    /// Number of accepted pushes.
    pub fn push_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.pushes.len()
    }

    /// Current head commit of `branch`, if any (for test verification).
    pub fn head(&self, branch: &BranchName) -> Option<CommitId> {
        let inner = self.inner.lock().unwrap();
        inner
            .commits
            .get(branch.as_str())
            .and_then(|history| history.first())
            .map(|c| c.commit_id.clone())
    }

    /// Check if we should fail and return the error if so.
    fn check_fail<T>(&self, expected: &str) -> Option<Result<T, VcsError>> {
        let inner = self.inner.lock().unwrap();
        match &inner.fail_on {
            Some(FailOn::GetItem(e)) if expected == "get_item" => Some(Err(e.clone())),
            Some(FailOn::GetCommits(e)) if expected == "get_commits" => Some(Err(e.clone())),
            Some(FailOn::CreatePush(e)) if expected == "create_push" => Some(Err(e.clone())),
            _ => None,
        }
    }
}

#[async_trait]
impl VcsClient for MockVcs {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn get_item(
        &self,
        _repo: &RepositoryId,
        path: &str,
        branch: &BranchName,
    ) -> Result<RepoItem, VcsError> {
        if let Some(result) = self.check_fail("get_item") {
            return result;
        }

        let inner = self.inner.lock().unwrap();
        let exists = inner
            .items
            .get(branch.as_str())
            .is_some_and(|items| items.contains(path));

        if exists {
            Ok(RepoItem {
                path: path.to_string(),
                object_id: None,
            })
        } else {
            Err(VcsError::NotFound(format!(
                "no item at '{path}' on branch '{branch}'"
            )))
        }
    }

    async fn get_commits(
        &self,
        _repo: &RepositoryId,
        branch: &BranchName,
        skip: u32,
        top: u32,
    ) -> Result<Vec<CommitRef>, VcsError> {
        if let Some(result) = self.check_fail("get_commits") {
            return result;
        }

        let inner = self.inner.lock().unwrap();
        let history = inner
            .commits
            .get(branch.as_str())
            .ok_or_else(|| VcsError::NotFound(format!("branch '{branch}' has no history")))?;

        Ok(history
            .iter()
            .skip(skip as usize)
            .take(top as usize)
            .cloned()
            .collect())
    }

    async fn create_push(
        &self,
        repo: &RepositoryId,
        push: PushRequest,
    ) -> Result<PushReceipt, VcsError> {
        if let Some(result) = self.check_fail("create_push") {
            return result;
        }

        let mut inner = self.inner.lock().unwrap();
        inner.sequence += 1;
        let sequence = inner.sequence;

        let branch_key = push
            .ref_update
            .name
            .as_str()
            .trim_start_matches("refs/heads/")
            .to_string();

        // Apply the push: the item now exists and the head advances.
        inner
            .items
            .entry(branch_key.clone())
            .or_default()
            .insert(push.commit.change.path.clone());

        let commit_id = CommitId::new(format!("{sequence:040x}"))
            .expect("fabricated commit id is valid hex");
        inner.commits.entry(branch_key).or_default().insert(
            0,
            CommitRef {
                commit_id,
                comment: Some(push.commit.comment.clone()),
            },
        );

        inner.pushes.push(RecordedPush {
            repo: repo.clone(),
            push,
        });

        Ok(PushReceipt { push_id: sequence })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{ChangeKind, RefName};
    use crate::vcs::traits::{CommitSpec, ItemChange, RefUpdate};

    fn branch() -> BranchName {
        BranchName::new("master").unwrap()
    }

    fn repo() -> RepositoryId {
        RepositoryId::new("repo").unwrap()
    }

    fn push_for(path: &str) -> PushRequest {
        PushRequest {
            ref_update: RefUpdate {
                name: RefName::for_branch(&branch()),
                expected_old_commit: None,
            },
            commit: CommitSpec {
                comment: "Added from backoffice".into(),
                change: ItemChange {
                    kind: ChangeKind::Add,
                    path: path.into(),
                    content: "{}".into(),
                },
            },
        }
    }

    #[tokio::test]
    async fn missing_item_is_not_found() {
        let vcs = MockVcs::new();
        let result = vcs.get_item(&repo(), "/a.json", &branch()).await;
        assert!(matches!(result, Err(VcsError::NotFound(_))));
    }

    #[tokio::test]
    async fn seeded_item_is_found() {
        let vcs = MockVcs::new().with_item(&branch(), "/a.json");
        let item = vcs.get_item(&repo(), "/a.json", &branch()).await.unwrap();
        assert_eq!(item.path, "/a.json");
    }

    #[tokio::test]
    async fn unknown_branch_history_is_not_found() {
        let vcs = MockVcs::new();
        let result = vcs.get_commits(&repo(), &branch(), 0, 1).await;
        assert!(matches!(result, Err(VcsError::NotFound(_))));
    }

    #[tokio::test]
    async fn accepted_push_applies_to_state() {
        let vcs = MockVcs::new();

        let receipt = vcs.create_push(&repo(), push_for("/a.json")).await.unwrap();
        assert_eq!(receipt.push_id, 1);

        // The item now exists and the branch has a head.
        assert!(vcs.get_item(&repo(), "/a.json", &branch()).await.is_ok());
        assert!(vcs.head(&branch()).is_some());
        assert_eq!(vcs.push_count(), 1);
    }

    #[tokio::test]
    async fn configured_failure_fires_on_matching_operation() {
        let vcs = MockVcs::new().fail_on(FailOn::CreatePush(VcsError::ApiError {
            status: 409,
            message: "stale parent".into(),
        }));

        // Reads still work.
        assert!(matches!(
            vcs.get_item(&repo(), "/a.json", &branch()).await,
            Err(VcsError::NotFound(_))
        ));

        let err = vcs.create_push(&repo(), push_for("/a.json")).await.unwrap_err();
        assert!(matches!(err, VcsError::ApiError { status: 409, .. }));

        vcs.clear_fail_on();
        assert!(vcs.create_push(&repo(), push_for("/a.json")).await.is_ok());
    }
}
