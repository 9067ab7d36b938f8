//! Branch protection rules.

use super::{Classify, ReconcileContext, ReconcileError, StepStatus};
use crate::github::{
    GitHubError, ProtectionRequest, RequiredPullRequestReviews, RequiredStatusChecks,
    Restrictions, short_error_message,
};
use crate::http::HttpMethod;
use crate::progress::ProgressCallback;
use crate::retry::{RetryConfig, with_retry};

/// Desired protection for one branch.
///
/// Only approvals, the required check and the push allow-lists vary; the
/// remaining rules are fixed and always written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectionPolicy {
    pub required_approvals: u32,
    pub required_check: Option<String>,
    pub teams: Vec<String>,
    pub users: Vec<String>,
}

impl ProtectionPolicy {
    pub fn new(
        required_approvals: u32,
        required_check: Option<&str>,
        teams: Vec<String>,
        users: Vec<String>,
    ) -> Self {
        Self {
            required_approvals,
            required_check: required_check
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            teams,
            users,
        }
    }

    /// The full PUT payload. Without a required check the status-check
    /// section is null, never an empty context list.
    pub fn to_request(&self) -> ProtectionRequest {
        ProtectionRequest {
            required_status_checks: self.required_check.as_ref().map(|check| {
                RequiredStatusChecks {
                    strict: true,
                    contexts: vec![check.clone()],
                }
            }),
            enforce_admins: true,
            required_pull_request_reviews: Some(RequiredPullRequestReviews {
                dismiss_stale_reviews: true,
                require_code_owner_reviews: false,
                required_approving_review_count: self.required_approvals,
            }),
            restrictions: Some(Restrictions {
                users: self.users.clone(),
                teams: self.teams.clone(),
                apps: Vec::new(),
            }),
            required_conversation_resolution: true,
            allow_force_pushes: false,
            allow_deletions: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtectionOutcome {
    Applied { branch: String, approvals: u32 },
    Planned { branch: String, approvals: u32 },
}

impl Classify for ProtectionOutcome {
    fn classify(&self) -> (StepStatus, String) {
        match self {
            ProtectionOutcome::Applied { branch, approvals } => (
                StepStatus::Applied,
                format!("{} ({} approvals)", branch, approvals),
            ),
            ProtectionOutcome::Planned { branch, approvals } => (
                StepStatus::Planned,
                format!("would protect {} ({} approvals)", branch, approvals),
            ),
        }
    }
}

/// Overwrite the protection rules of `branch` in `repo` with `policy`.
///
/// The payload is rebuilt from `policy` on every call, so applying twice
/// sends identical bodies. Transient failures are retried per `retry`.
/// A missing branch is an ordinary API error.
pub async fn protect_branch(
    ctx: &ReconcileContext<'_>,
    repo: &str,
    branch: &str,
    policy: &ProtectionPolicy,
    retry: &RetryConfig,
    on_progress: Option<&ProgressCallback>,
) -> Result<ProtectionOutcome, ReconcileError> {
    let approvals = policy.required_approvals;
    if ctx.dry_run {
        return Ok(ProtectionOutcome::Planned {
            branch: branch.to_string(),
            approvals,
        });
    }

    let path = ctx.repo_path(repo, &["branches", branch, "protection"]);
    let request = policy.to_request();
    let label = format!("{} protect {}", repo, branch);

    with_retry(
        || ctx.client.send_json(HttpMethod::Put, &path, &request),
        GitHubError::is_transient,
        short_error_message,
        &label,
        retry,
        on_progress,
    )
    .await?;

    Ok(ProtectionOutcome::Applied {
        branch: branch.to_string(),
        approvals,
    })
}
