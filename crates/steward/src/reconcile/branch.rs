//! Branch existence.

use super::{Classify, ReconcileContext, ReconcileError, StepStatus};
use crate::github::{Branch, CreateRefRequest, GitHubError, Repository, short_error_message};
use crate::http::HttpMethod;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchOutcome {
    /// The branch was already there; nothing was written.
    Existed,
    /// The branch was created at the head of `from`.
    Created { from: String, sha: String },
    /// Dry run: the branch would be created at the head of `from`.
    Planned { from: String, sha: String },
}

impl Classify for BranchOutcome {
    fn classify(&self) -> (StepStatus, String) {
        match self {
            BranchOutcome::Existed => (StepStatus::Unchanged, "exists".to_string()),
            BranchOutcome::Created { from, sha } => (
                StepStatus::Created,
                format!("created from {} at {}", from, short_sha(sha)),
            ),
            BranchOutcome::Planned { from, sha } => (
                StepStatus::Planned,
                format!("would create from {} at {}", from, short_sha(sha)),
            ),
        }
    }
}

fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}

/// Ensure `branch` exists in `repo`.
///
/// A 200 from the branch lookup means it exists. Anything else creates it
/// from the current head commit of the repository's default branch. The
/// default branch is only looked up when creation is needed.
pub async fn ensure_branch(
    ctx: &ReconcileContext<'_>,
    repo: &str,
    branch: &str,
) -> Result<BranchOutcome, ReconcileError> {
    let status = ctx
        .client
        .probe(&ctx.repo_path(repo, &["branches", branch]))
        .await?;
    if status == 200 {
        return Ok(BranchOutcome::Existed);
    }
    tracing::debug!(repo, branch, status, "Branch missing");

    let (from, sha) = default_branch_head(ctx, repo).await?;

    if ctx.dry_run {
        return Ok(BranchOutcome::Planned { from, sha });
    }

    ctx.client
        .send_json(
            HttpMethod::Post,
            &ctx.repo_path(repo, &["git", "refs"]),
            &CreateRefRequest::branch(branch, &sha),
        )
        .await?;

    Ok(BranchOutcome::Created { from, sha })
}

/// Resolve the default branch name and its head commit.
async fn default_branch_head(
    ctx: &ReconcileContext<'_>,
    repo: &str,
) -> Result<(String, String), ReconcileError> {
    let unresolved = |e: GitHubError| {
        if e.is_transport() {
            ReconcileError::GitHub(e)
        } else {
            ReconcileError::DefaultBranch {
                repo: repo.to_string(),
                reason: short_error_message(&e),
            }
        }
    };

    let descriptor: Repository = ctx
        .client
        .get_json(&ctx.repo_path(repo, &[]))
        .await
        .map_err(unresolved)?;

    let default_branch = descriptor
        .default_branch
        .filter(|b| !b.is_empty())
        .ok_or_else(|| ReconcileError::DefaultBranch {
            repo: repo.to_string(),
            reason: "repository has no default branch".to_string(),
        })?;

    let head: Branch = ctx
        .client
        .get_json(&ctx.repo_path(repo, &["branches", default_branch.as_str()]))
        .await
        .map_err(unresolved)?;

    Ok((head.name, head.commit.sha))
}
