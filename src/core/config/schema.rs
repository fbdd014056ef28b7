//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Validation
//!
//! Config values are validated after parsing to ensure they conform to
//! expected formats (branch names must satisfy Git's refname rules, the
//! service URL must be absolute, branch and environment are mutually
//! exclusive).

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::{BranchName, BranchTarget, RepositoryId, TypeError};

/// Construction-time configuration for a mirroring store.
///
/// Everything here is fixed for the lifetime of the provider; there is no
/// runtime reconfiguration.
///
/// # Example
///
/// ```toml
/// physical_root = "/srv/app"
/// service_url = "https://dev.azure.com/acme/website"
/// username = "builds@acme.example"
/// pat = "s3cret"
/// repository = "c7fd20a1-9821-40f1-9f0b-10bb1360f43a"
/// repo_root = "/My.WebSite"
/// environment = "staging"
/// message_policy = "rich"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MirrorConfig {
    /// Physical root of the underlying store; stripped from full paths to
    /// produce repository paths.
    pub physical_root: String,

    /// Base URL of the hosted Git service (organization/project scope).
    pub service_url: String,

    /// Username for basic authentication.
    pub username: String,

    /// Personal access token used as the basic-auth password.
    pub pat: String,

    /// Repository id (GUID) or name on the remote service.
    pub repository: String,

    /// Path prefix inside the repository that mirrored files land under.
    pub repo_root: String,

    /// Environment/tenant label; selects the `forms/{environment}` branch.
    /// Mutually exclusive with `branch`.
    pub environment: Option<String>,

    /// Fixed target branch. Mutually exclusive with `environment`.
    pub branch: Option<String>,

    /// Overrides the fallback branch consulted when the target branch has
    /// no history yet.
    pub fallback_branch: Option<String>,

    /// Commit-message policy selection.
    pub message_policy: MessagePolicyKind,
}

/// Which commit-message derivation policy to use.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessagePolicyKind {
    /// Fixed "Added/Changed from backoffice" messages.
    #[default]
    Generic,
    /// Content-aware messages naming the actor and the saved entity.
    Rich,
}

impl MirrorConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_url.is_empty() {
            return Err(ConfigError::InvalidValue(
                "service_url must be set".into(),
            ));
        }
        if !self.service_url.starts_with("http://") && !self.service_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(format!(
                "service_url must be an absolute http(s) URL, got '{}'",
                self.service_url
            )));
        }

        RepositoryId::new(&self.repository).map_err(invalid)?;

        if self.branch.is_some() && self.environment.is_some() {
            return Err(ConfigError::InvalidValue(
                "branch and environment are mutually exclusive".into(),
            ));
        }

        // Building the target exercises every branch-name rule.
        self.branch_target().map(|_| ())
    }

    /// Resolve the branch target this configuration selects.
    ///
    /// - `environment` set: the `forms/{environment}` branch, falling back
    ///   to the mainline (or `fallback_branch` if given).
    /// - `branch` set: that fixed branch, with `fallback_branch` if given.
    /// - Neither: the `master` branch, no fallback.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any configured name is not a
    /// valid branch name.
    pub fn branch_target(&self) -> Result<BranchTarget, ConfigError> {
        let fallback = self
            .fallback_branch
            .as_deref()
            .map(BranchName::new)
            .transpose()
            .map_err(invalid)?;

        if let Some(environment) = &self.environment {
            let mut target = BranchTarget::for_environment(environment).map_err(invalid)?;
            if let Some(fallback) = fallback {
                target.fallback = Some(fallback);
            }
            return Ok(target);
        }

        let branch = match &self.branch {
            Some(branch) => BranchName::new(branch).map_err(invalid)?,
            None => BranchName::new("master").map_err(invalid)?,
        };

        Ok(match fallback {
            Some(fallback) => BranchTarget::with_fallback(branch, fallback),
            None => BranchTarget::fixed(branch),
        })
    }

    /// The repository id this configuration addresses.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the id is empty or malformed.
    pub fn repository_id(&self) -> Result<RepositoryId, ConfigError> {
        RepositoryId::new(&self.repository).map_err(invalid)
    }
}

fn invalid(err: TypeError) -> ConfigError {
    ConfigError::InvalidValue(err.to_string())
}
