//! vcs::azure
//!
//! Azure DevOps Git implementation of the [`VcsClient`] capability.
//!
//! # Design
//!
//! Uses the Azure DevOps Git REST API:
//! - `GET  .../items` with a branch version descriptor for item lookups
//! - `GET  .../commits` with `searchCriteria.itemVersion` for history
//! - `POST .../pushes` for the single-change push
//!
//! # Authentication
//!
//! Basic authentication with a personal access token as the password,
//! supplied at construction. Credentials are never logged; the `Debug`
//! impl redacts them.
//!
//! # Errors
//!
//! HTTP statuses are normalized into the [`VcsError`] taxonomy: 401/403
//! become `AuthFailed`, 404 becomes `NotFound`, everything else becomes
//! `ApiError`. The service answers some unauthenticated requests with
//! `203 Non-Authoritative Information` and an HTML sign-in page; that is
//! mapped to `AuthFailed` rather than surfacing as a parse failure.

use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::traits::{
    CommitRef, PushReceipt, PushRequest, RepoItem, VcsClient, VcsError,
};
use crate::core::config::MirrorConfig;
use crate::core::types::{BranchName, ChangeKind, CommitId, RepositoryId};
use async_trait::async_trait;

/// REST API version pinned on every route.
const API_VERSION: &str = "7.1";

/// Object id the service uses for "this ref does not exist yet".
const ZERO_OBJECT_ID: &str = "0000000000000000000000000000000000000000";

/// Azure DevOps Git client.
///
/// # Example
///
/// ```
/// use gitmirror::vcs::AzureGitClient;
///
/// let client = AzureGitClient::new(
///     "https://dev.azure.com/acme/website",
///     "builds@acme.example",
///     "pat-token",
/// );
/// assert_eq!(client.base_url(), "https://dev.azure.com/acme/website");
/// ```
pub struct AzureGitClient {
    /// HTTP client for making requests
    client: Client,
    /// Organization/project-scoped base URL
    base_url: String,
    /// Basic-auth username
    username: String,
    /// Personal access token used as the basic-auth password
    pat: String,
}

// Custom Debug to avoid exposing credentials.
impl std::fmt::Debug for AzureGitClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureGitClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("pat", &"<redacted>")
            .finish()
    }
}

impl AzureGitClient {
    /// Create a client for the service at `base_url`
    /// (e.g. `https://dev.azure.com/{organization}/{project}`).
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        pat: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            pat: pat.into(),
        }
    }

    /// Create a client from a mirror configuration.
    pub fn from_config(config: &MirrorConfig) -> Self {
        Self::new(&config.service_url, &config.username, &config.pat)
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the URL for a repository-scoped route.
    fn repo_url(&self, repo: &RepositoryId, route: &str) -> String {
        format!(
            "{}/_apis/git/repositories/{}/{}",
            self.base_url, repo, route
        )
    }

    /// Handle an API response, mapping errors appropriately.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: Response,
    ) -> Result<T, VcsError> {
        let status = response.status();

        if status == StatusCode::NON_AUTHORITATIVE_INFORMATION {
            return Err(VcsError::AuthFailed(
                "service returned a sign-in page; check credentials".into(),
            ));
        }

        if status.is_success() {
            response.json().await.map_err(|e| VcsError::ApiError {
                status: status.as_u16(),
                message: format!("failed to parse response: {e}"),
            })
        } else {
            self.handle_error_response(response, status).await
        }
    }

    /// Handle an error response from the API.
    async fn handle_error_response<T>(
        &self,
        response: Response,
        status: StatusCode,
    ) -> Result<T, VcsError> {
        let message = match response.json::<ServiceErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => "unknown error".to_string(),
        };

        Err(match status {
            StatusCode::UNAUTHORIZED => VcsError::AuthFailed("invalid or expired token".into()),
            StatusCode::FORBIDDEN => VcsError::AuthFailed(format!("permission denied: {message}")),
            StatusCode::NOT_FOUND => VcsError::NotFound(message),
            _ if status.is_server_error() => VcsError::ApiError {
                status: status.as_u16(),
                message: format!("service error: {message}"),
            },
            _ => VcsError::ApiError {
                status: status.as_u16(),
                message,
            },
        })
    }
}

#[async_trait]
impl VcsClient for AzureGitClient {
    fn name(&self) -> &'static str {
        "azure"
    }

    async fn get_item(
        &self,
        repo: &RepositoryId,
        path: &str,
        branch: &BranchName,
    ) -> Result<RepoItem, VcsError> {
        let url = self.repo_url(repo, "items");
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.pat))
            .query(&[
                ("path", path),
                ("versionDescriptor.versionType", "branch"),
                ("versionDescriptor.version", branch.as_str()),
                ("api-version", API_VERSION),
            ])
            .send()
            .await
            .map_err(|e| VcsError::NetworkError(e.to_string()))?;

        let item: WireItem = self.handle_response(response).await?;
        Ok(RepoItem {
            path: item.path.unwrap_or_else(|| path.to_string()),
            object_id: item.object_id,
        })
    }

    async fn get_commits(
        &self,
        repo: &RepositoryId,
        branch: &BranchName,
        skip: u32,
        top: u32,
    ) -> Result<Vec<CommitRef>, VcsError> {
        let url = self.repo_url(repo, "commits");
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.pat))
            .query(&[
                ("searchCriteria.itemVersion.versionType", "branch"),
                ("searchCriteria.itemVersion.version", branch.as_str()),
                ("searchCriteria.$skip", skip.to_string().as_str()),
                ("searchCriteria.$top", top.to_string().as_str()),
                ("api-version", API_VERSION),
            ])
            .send()
            .await
            .map_err(|e| VcsError::NetworkError(e.to_string()))?;

        let list: WireCommitList = self.handle_response(response).await?;
        list.value
            .into_iter()
            .map(|c| {
                let commit_id = CommitId::new(&c.commit_id).map_err(|e| VcsError::ApiError {
                    status: 200,
                    message: format!("service returned malformed commit id: {e}"),
                })?;
                Ok(CommitRef {
                    commit_id,
                    comment: c.comment,
                })
            })
            .collect()
    }

    async fn create_push(
        &self,
        repo: &RepositoryId,
        push: PushRequest,
    ) -> Result<PushReceipt, VcsError> {
        let url = self.repo_url(repo, "pushes");
        let body = WirePush::from(&push);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.username, Some(&self.pat))
            .query(&[("api-version", API_VERSION)])
            .json(&body)
            .send()
            .await
            .map_err(|e| VcsError::NetworkError(e.to_string()))?;

        let receipt: WirePushResponse = self.handle_response(response).await?;
        Ok(PushReceipt {
            push_id: receipt.push_id,
        })
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Error body the service attaches to non-success responses.
#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireItem {
    #[serde(default)]
    object_id: Option<String>,
    #[serde(default)]
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireCommitList {
    #[serde(default)]
    value: Vec<WireCommitRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCommitRef {
    commit_id: String,
    #[serde(default)]
    comment: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WirePush {
    ref_updates: Vec<WireRefUpdate>,
    commits: Vec<WireCommit>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRefUpdate {
    name: String,
    old_object_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireCommit {
    comment: String,
    changes: Vec<WireChange>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireChange {
    change_type: ChangeKind,
    item: WireChangeItem,
    new_content: WireNewContent,
}

#[derive(Debug, Serialize)]
struct WireChangeItem {
    path: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireNewContent {
    content: String,
    content_type: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePushResponse {
    push_id: u64,
}

impl From<&PushRequest> for WirePush {
    fn from(push: &PushRequest) -> Self {
        // A missing parent is the service's create-ref convention: the
        // all-zeros object id.
        let old_object_id = push
            .ref_update
            .expected_old_commit
            .as_ref()
            .map(|id| id.as_str().to_string())
            .unwrap_or_else(|| ZERO_OBJECT_ID.to_string());

        WirePush {
            ref_updates: vec![WireRefUpdate {
                name: push.ref_update.name.as_str().to_string(),
                old_object_id,
            }],
            commits: vec![WireCommit {
                comment: push.commit.comment.clone(),
                changes: vec![WireChange {
                    change_type: push.commit.change.kind,
                    item: WireChangeItem {
                        path: push.commit.change.path.clone(),
                    },
                    new_content: WireNewContent {
                        content: push.commit.change.content.clone(),
                        content_type: "rawtext",
                    },
                }],
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::RefName;
    use crate::vcs::traits::{CommitSpec, ItemChange, RefUpdate};

    fn sample_push(parent: Option<CommitId>) -> PushRequest {
        let branch = BranchName::new("forms/staging").unwrap();
        PushRequest {
            ref_update: RefUpdate {
                name: RefName::for_branch(&branch),
                expected_old_commit: parent,
            },
            commit: CommitSpec {
                comment: "User X added form \"Fancy form\"".into(),
                change: ItemChange {
                    kind: ChangeKind::Add,
                    path: "/My.WebSite/App_Data/Forms/a.json".into(),
                    content: "{}".into(),
                },
            },
        }
    }

    #[test]
    fn wire_push_serializes_single_change() {
        let parent = CommitId::new("8ae7fc512175442388c091cf454367353aabbcc1").unwrap();
        let wire = WirePush::from(&sample_push(Some(parent)));
        let json = serde_json::to_value(&wire).unwrap();

        assert_eq!(
            json["refUpdates"][0]["name"],
            "refs/heads/forms/staging"
        );
        assert_eq!(
            json["refUpdates"][0]["oldObjectId"],
            "8ae7fc512175442388c091cf454367353aabbcc1"
        );
        assert_eq!(json["commits"].as_array().unwrap().len(), 1);
        assert_eq!(
            json["commits"][0]["changes"][0]["changeType"],
            "add"
        );
        assert_eq!(
            json["commits"][0]["changes"][0]["newContent"]["contentType"],
            "rawtext"
        );
    }

    #[test]
    fn missing_parent_becomes_zero_object_id() {
        let wire = WirePush::from(&sample_push(None));
        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json["refUpdates"][0]["oldObjectId"], ZERO_OBJECT_ID);
    }

    #[test]
    fn debug_redacts_credentials() {
        let client = AzureGitClient::new("https://dev.azure.com/acme/web", "user", "secret-pat");
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret-pat"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn repo_url_joins_routes() {
        let client = AzureGitClient::new("https://dev.azure.com/acme/web/", "user", "pat");
        let repo = RepositoryId::new("c7fd20a1").unwrap();
        assert_eq!(
            client.repo_url(&repo, "pushes"),
            "https://dev.azure.com/acme/web/_apis/git/repositories/c7fd20a1/pushes"
        );
    }
}
