//! GitHub API data types.
//!
//! Response types declare only the fields the reconcilers read, which keeps
//! deserialization resilient to API additions. Request types mirror the
//! documented payloads exactly; `None` serializes as `null`, which GitHub
//! requires for the "disabled" form of several protection fields.

use serde::{Deserialize, Serialize};

/// An organization team.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Team {
    /// Display name.
    pub name: String,
    /// Stable, URL-safe identifier.
    pub slug: String,
    /// Parent team for nested teams.
    #[serde(default)]
    pub parent: Option<Box<Team>>,
}

/// Repository fields used during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Repository {
    pub name: String,
    pub default_branch: Option<String>,
}

/// A branch and its head commit.
#[derive(Debug, Clone, Deserialize)]
pub struct Branch {
    pub name: String,
    pub commit: CommitRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitRef {
    pub sha: String,
}

/// Body of `POST /repos/{owner}/{repo}/git/refs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateRefRequest {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub sha: String,
}

impl CreateRefRequest {
    /// Reference for a branch head pointing at `sha`.
    pub fn branch(branch: &str, sha: &str) -> Self {
        Self {
            git_ref: format!("refs/heads/{}", branch),
            sha: sha.to_string(),
        }
    }
}

/// Body of the collaborator and team-repository grant endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionRequest<'a> {
    pub permission: &'a str,
}

/// Body of `PUT /repos/{owner}/{repo}/branches/{branch}/protection`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProtectionRequest {
    pub required_status_checks: Option<RequiredStatusChecks>,
    pub enforce_admins: bool,
    pub required_pull_request_reviews: Option<RequiredPullRequestReviews>,
    pub restrictions: Option<Restrictions>,
    pub required_conversation_resolution: bool,
    pub allow_force_pushes: bool,
    pub allow_deletions: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequiredStatusChecks {
    pub strict: bool,
    pub contexts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequiredPullRequestReviews {
    pub dismiss_stale_reviews: bool,
    pub require_code_owner_reviews: bool,
    pub required_approving_review_count: u32,
}

/// Who may push to the protected branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Restrictions {
    pub users: Vec<String>,
    pub teams: Vec<String>,
    pub apps: Vec<String>,
}

/// Body of `PATCH /repos/{owner}/{repo}` carrying merge-strategy toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RepositoryToggles {
    pub delete_branch_on_merge: bool,
    pub allow_auto_merge: bool,
    pub allow_squash_merge: bool,
    pub allow_merge_commit: bool,
    pub allow_rebase_merge: bool,
}

/// Error body returned by the API on failures.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub message: String,
}
