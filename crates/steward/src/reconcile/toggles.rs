//! Merge-strategy and cleanup toggles.

use super::{Classify, ReconcileContext, ReconcileError, StepStatus};
use crate::github::RepositoryToggles;
use crate::http::HttpMethod;

/// Toggle set written to every repository: squash merges only, auto-merge
/// on, head branches deleted after merge.
pub const DESIRED_TOGGLES: RepositoryToggles = RepositoryToggles {
    delete_branch_on_merge: true,
    allow_auto_merge: true,
    allow_squash_merge: true,
    allow_merge_commit: false,
    allow_rebase_merge: false,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Applied,
    Planned,
}

impl Classify for ToggleOutcome {
    fn classify(&self) -> (StepStatus, String) {
        match self {
            ToggleOutcome::Applied => (StepStatus::Applied, "applied".to_string()),
            ToggleOutcome::Planned => (StepStatus::Planned, "would apply".to_string()),
        }
    }
}

/// PATCH the fixed toggle set onto `repo`.
pub async fn apply_toggles(
    ctx: &ReconcileContext<'_>,
    repo: &str,
) -> Result<ToggleOutcome, ReconcileError> {
    if ctx.dry_run {
        return Ok(ToggleOutcome::Planned);
    }

    ctx.client
        .send_json(
            HttpMethod::Patch,
            &ctx.repo_path(repo, &[]),
            &DESIRED_TOGGLES,
        )
        .await?;

    Ok(ToggleOutcome::Applied)
}
