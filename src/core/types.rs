//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`BranchName`] - Validated Git branch name
//! - [`RefName`] - Fully-qualified Git reference name
//! - [`CommitId`] - Commit identifier (SHA) on the remote service
//! - [`RepositoryId`] - Identifier of a repository on the remote service
//! - [`BranchTarget`] - Resolved branch + ref + optional fallback branch
//! - [`ChangeKind`] - Add-vs-edit classification of a mirrored save
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use gitmirror::core::types::{BranchName, CommitId, RefName};
//!
//! let branch = BranchName::new("forms/staging").unwrap();
//! let refname = RefName::for_branch(&branch);
//! assert_eq!(refname.as_str(), "refs/heads/forms/staging");
//!
//! // Invalid constructions fail at creation time
//! assert!(BranchName::new("invalid..name").is_err());
//! assert!(CommitId::new("not-a-sha").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid commit id: {0}")]
    InvalidCommitId(String),

    #[error("invalid ref name: {0}")]
    InvalidRefName(String),

    #[error("invalid repository id: {0}")]
    InvalidRepositoryId(String),
}

/// A validated Git branch name.
///
/// Branch names must conform to Git's refname rules (see
/// `git check-ref-format`):
/// - Cannot be empty or exactly `@`
/// - Cannot start with `.` or `-`
/// - Cannot end with `.lock` or `/`
/// - Cannot contain `..`, `@{`, `//`, or ASCII control characters
/// - Cannot contain spaces, `~`, `^`, `:`, `\`, `?`, `*`, `[`
///
/// # Example
///
/// ```
/// use gitmirror::core::types::BranchName;
///
/// let name = BranchName::new("forms/production").unwrap();
/// assert_eq!(name.as_str(), "forms/production");
///
/// assert!(BranchName::new("").is_err());
/// assert!(BranchName::new("has space").is_err());
/// assert!(BranchName::new("branch.lock").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name violates Git's
    /// refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    /// Validate a branch name against Git's refname rules.
    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot be empty".into(),
            ));
        }

        if name == "@" {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot be '@' (reserved)".into(),
            ));
        }

        if name.starts_with('.') || name.starts_with('-') {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot start with '.' or '-'".into(),
            ));
        }

        if name.ends_with('/') {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot end with '/'".into(),
            ));
        }

        if name.ends_with(".lock") {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot end with '.lock'".into(),
            ));
        }

        for forbidden in ["..", "@{", "//"] {
            if name.contains(forbidden) {
                return Err(TypeError::InvalidBranchName(format!(
                    "branch name cannot contain '{forbidden}'"
                )));
            }
        }

        const INVALID_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];
        for c in INVALID_CHARS {
            if name.contains(c) {
                return Err(TypeError::InvalidBranchName(format!(
                    "branch name cannot contain '{c}'"
                )));
            }
        }

        if name.chars().any(|c| c.is_ascii_control()) {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot contain control characters".into(),
            ));
        }

        for component in name.split('/') {
            if component.starts_with('.') {
                return Err(TypeError::InvalidBranchName(
                    "path component cannot start with '.'".into(),
                ));
            }
        }

        Ok(())
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A fully-qualified Git reference name (e.g. `refs/heads/master`).
///
/// # Example
///
/// ```
/// use gitmirror::core::types::{BranchName, RefName};
///
/// let branch = BranchName::new("master").unwrap();
/// let refname = RefName::for_branch(&branch);
/// assert_eq!(refname.as_str(), "refs/heads/master");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RefName(String);

impl RefName {
    /// Create a validated ref name. Must start with `refs/`.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRefName` if the name is not fully
    /// qualified.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if !name.starts_with("refs/") {
            return Err(TypeError::InvalidRefName(format!(
                "ref name must start with 'refs/': {name}"
            )));
        }
        Ok(Self(name))
    }

    /// The head ref for a branch: `refs/heads/{branch}`.
    pub fn for_branch(branch: &BranchName) -> Self {
        Self(format!("refs/heads/{}", branch.as_str()))
    }

    /// Get the ref name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RefName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RefName> for String {
    fn from(name: RefName) -> Self {
        name.0
    }
}

impl std::fmt::Display for RefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A commit identifier on the remote service.
///
/// Normalized to lowercase. SHA-1 (40 hex chars) is what hosted Git
/// services report today; SHA-256 (64) is accepted for forward
/// compatibility.
///
/// # Example
///
/// ```
/// use gitmirror::core::types::CommitId;
///
/// let id = CommitId::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(id.as_str(), "abc123def4567890abc123def4567890abc12345");
/// assert_eq!(id.short(7), "abc123d");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommitId(String);

impl CommitId {
    /// Create a new validated commit id, normalized to lowercase.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidCommitId` if the string is not a valid
    /// hex SHA.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into().to_ascii_lowercase();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    /// Get an abbreviated form of the commit id.
    pub fn short(&self, len: usize) -> &str {
        let end = len.min(self.0.len());
        &self.0[..end]
    }

    fn validate(id: &str) -> Result<(), TypeError> {
        if id.len() != 40 && id.len() != 64 {
            return Err(TypeError::InvalidCommitId(format!(
                "expected 40 or 64 hex characters, got {}",
                id.len()
            )));
        }
        if !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidCommitId(
                "commit id must be hexadecimal".into(),
            ));
        }
        Ok(())
    }

    /// Get the commit id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CommitId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<CommitId> for String {
    fn from(id: CommitId) -> Self {
        id.0
    }
}

impl std::fmt::Display for CommitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a repository on the remote service.
///
/// Hosted Git services accept either a GUID or the repository name here,
/// so no shape beyond "non-empty, no whitespace" is enforced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepositoryId(String);

impl RepositoryId {
    /// Create a new validated repository id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRepositoryId` if the id is empty or
    /// contains whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        if id.is_empty() {
            return Err(TypeError::InvalidRepositoryId(
                "repository id cannot be empty".into(),
            ));
        }
        if id.chars().any(char::is_whitespace) {
            return Err(TypeError::InvalidRepositoryId(
                "repository id cannot contain whitespace".into(),
            ));
        }
        Ok(Self(id))
    }

    /// Get the repository id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RepositoryId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RepositoryId> for String {
    fn from(id: RepositoryId) -> Self {
        id.0
    }
}

impl std::fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The branch a mirrored save is pushed to.
///
/// Built once from configuration and shared read-only across concurrent
/// saves. The `fallback` branch is consulted only when resolving the
/// parent commit id and the primary branch has no history yet (e.g. an
/// environment branch that has never been pushed to).
///
/// # Example
///
/// ```
/// use gitmirror::core::types::BranchTarget;
///
/// let target = BranchTarget::for_environment("staging").unwrap();
/// assert_eq!(target.branch.as_str(), "forms/staging");
/// assert_eq!(target.ref_name.as_str(), "refs/heads/forms/staging");
/// assert_eq!(target.fallback.as_ref().unwrap().as_str(), "master");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchTarget {
    /// Branch the push lands on.
    pub branch: BranchName,
    /// Fully-qualified form of `branch`, used in the push's ref update.
    pub ref_name: RefName,
    /// Branch to consult for a parent commit when `branch` has no history.
    pub fallback: Option<BranchName>,
}

/// Mainline branch used as the default fallback for environment branches.
const MAINLINE: &str = "master";

/// Branch prefix for environment-qualified targets.
const ENVIRONMENT_PREFIX: &str = "forms";

impl BranchTarget {
    /// A fixed branch with no fallback.
    pub fn fixed(branch: BranchName) -> Self {
        let ref_name = RefName::for_branch(&branch);
        Self {
            branch,
            ref_name,
            fallback: None,
        }
    }

    /// A fixed branch with an explicit fallback.
    pub fn with_fallback(branch: BranchName, fallback: BranchName) -> Self {
        let ref_name = RefName::for_branch(&branch);
        Self {
            branch,
            ref_name,
            fallback: Some(fallback),
        }
    }

    /// The environment-qualified target: branch `forms/{environment}`,
    /// falling back to the mainline for the first commit's parent.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the environment label
    /// does not form a valid branch name.
    pub fn for_environment(environment: &str) -> Result<Self, TypeError> {
        let branch = BranchName::new(format!("{ENVIRONMENT_PREFIX}/{environment}"))?;
        let fallback = BranchName::new(MAINLINE)?;
        Ok(Self::with_fallback(branch, fallback))
    }
}

/// Add-vs-edit classification of a mirrored save.
///
/// `Add` if and only if the remote item did not exist on the target
/// branch at probe time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// The file is new on the target branch.
    Add,
    /// The file already exists on the target branch.
    Edit,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKind::Add => write!(f, "add"),
            ChangeKind::Edit => write!(f, "edit"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_branch_names() {
        for name in ["master", "forms/staging", "user@feature", "a-b_c.d"] {
            assert!(BranchName::new(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn invalid_branch_names() {
        for name in [
            "",
            "@",
            ".hidden",
            "-leading",
            "trailing/",
            "branch.lock",
            "a..b",
            "a@{b",
            "a//b",
            "has space",
            "has~tilde",
            "nested/.hidden",
        ] {
            assert!(BranchName::new(name).is_err(), "{name} should be invalid");
        }
    }

    #[test]
    fn ref_name_for_branch() {
        let branch = BranchName::new("forms/production").unwrap();
        assert_eq!(
            RefName::for_branch(&branch).as_str(),
            "refs/heads/forms/production"
        );
    }

    #[test]
    fn ref_name_requires_refs_prefix() {
        assert!(RefName::new("refs/heads/master").is_ok());
        assert!(RefName::new("master").is_err());
    }

    #[test]
    fn commit_id_normalizes_to_lowercase() {
        let id = CommitId::new("8AE7FC512175442388C091CF454367353AABBCC1").unwrap();
        assert_eq!(id.as_str(), "8ae7fc512175442388c091cf454367353aabbcc1");
    }

    #[test]
    fn commit_id_rejects_bad_shapes() {
        assert!(CommitId::new("abc").is_err());
        assert!(CommitId::new("z".repeat(40)).is_err());
    }

    #[test]
    fn repository_id_accepts_guid_and_name() {
        assert!(RepositoryId::new("c7fd20a1-9821-40f1-9f0b-10bb1360f43a").is_ok());
        assert!(RepositoryId::new("My.WebSite").is_ok());
        assert!(RepositoryId::new("").is_err());
        assert!(RepositoryId::new("has space").is_err());
    }

    #[test]
    fn environment_target_uses_forms_prefix_and_mainline_fallback() {
        let target = BranchTarget::for_environment("production").unwrap();
        assert_eq!(target.branch.as_str(), "forms/production");
        assert_eq!(target.ref_name.as_str(), "refs/heads/forms/production");
        assert_eq!(target.fallback.as_ref().unwrap().as_str(), "master");
    }

    #[test]
    fn fixed_target_has_no_fallback() {
        let target = BranchTarget::fixed(BranchName::new("master").unwrap());
        assert_eq!(target.ref_name.as_str(), "refs/heads/master");
        assert!(target.fallback.is_none());
    }

    #[test]
    fn change_kind_display() {
        assert_eq!(format!("{}", ChangeKind::Add), "add");
        assert_eq!(format!("{}", ChangeKind::Edit), "edit");
    }
}
