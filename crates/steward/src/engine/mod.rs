//! Run orchestration.
//!
//! A run resolves the role teams, lists the matching repositories, then walks
//! each repository through the reconcilers in a fixed order:
//!
//! ```text
//! branch → collaborator → team-access → protect-primary → protect-secondary → toggles
//! ```
//!
//! Setup, team resolution and discovery failures stop the run before any
//! write. A failed step only marks that step as a warning; the remaining
//! steps and repositories still run. A transport failure anywhere aborts.
//! Nothing is rolled back.
//!
//! # Module Structure
//!
//! - [`config`] - Run configuration and branch policies
//! - [`report`] - Per-repository outcomes and the run summary

pub mod config;
pub mod report;

use thiserror::Error;

use crate::discovery::list_repositories;
use crate::github::{GitHubClient, GitHubError};
use crate::progress::{ProgressCallback, RunProgress, emit};
use crate::reconcile::{
    Classify, ProtectionPolicy, ReconcileContext, ReconcileError, Step, StepOutcome,
    apply_toggles, ensure_branch, ensure_collaborator, grant_team_access, protect_branch,
};
use crate::teams::{ResolveError, RoleBinding, resolve_teams};

pub use config::{BranchPolicy, DEFAULT_BOT_PERMISSION, RunConfig};
pub use report::{RepositoryReport, RunReport, RunSummary};

/// Failures that end a run. Everything else is recorded as a step warning.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Teams(#[from] ResolveError),

    #[error("failed to list repositories for {org}: {source}")]
    Discovery {
        org: String,
        #[source]
        source: GitHubError,
    },

    #[error("aborted while reconciling {repo} ({step}): {source}")]
    Aborted {
        repo: String,
        step: Step,
        #[source]
        source: ReconcileError,
    },
}

/// Apply the policy to every repository of `config.org` matching `config.prefix`.
///
/// Zero matching repositories is a successful, empty run.
pub async fn run(
    client: &GitHubClient,
    config: &RunConfig,
    on_progress: Option<&ProgressCallback>,
) -> Result<RunReport, RunError> {
    config.validate()?;

    let binding = resolve_teams(client, &config.org, &config.team_overrides, on_progress).await?;

    let repositories = list_repositories(client, &config.org, &config.prefix, on_progress)
        .await
        .map_err(|source| RunError::Discovery {
            org: config.org.clone(),
            source,
        })?;

    tracing::info!(
        org = %config.org,
        prefix = %config.prefix,
        repositories = repositories.len(),
        dry_run = config.dry_run,
        "Starting policy run"
    );

    let ctx = ReconcileContext {
        client,
        org: &config.org,
        dry_run: config.dry_run,
    };

    let mut report = RunReport {
        repositories: Vec::with_capacity(repositories.len()),
        dry_run: config.dry_run,
    };

    let total = repositories.len();
    for (index, name) in repositories.iter().enumerate() {
        emit(
            on_progress,
            RunProgress::RepoStarted {
                name: name.clone(),
                index,
                total,
            },
        );

        let repo_report = reconcile_repository(&ctx, config, &binding, name, on_progress).await?;

        emit(
            on_progress,
            RunProgress::RepoFinished {
                name: name.clone(),
                warnings: repo_report.warnings(),
            },
        );
        report.repositories.push(repo_report);
    }

    emit(
        on_progress,
        RunProgress::RunComplete {
            summary: report.summary(),
        },
    );

    Ok(report)
}

/// Run every step against one repository, recording each outcome.
async fn reconcile_repository(
    ctx: &ReconcileContext<'_>,
    config: &RunConfig,
    binding: &RoleBinding,
    repo: &str,
    on_progress: Option<&ProgressCallback>,
) -> Result<RepositoryReport, RunError> {
    let mut report = RepositoryReport::new(repo);

    let result = ensure_branch(ctx, repo, &config.secondary.branch).await;
    record(&mut report, Step::Branch, result, on_progress)?;

    let result = ensure_collaborator(ctx, repo, &config.bot_account, &config.bot_permission).await;
    record(&mut report, Step::Collaborator, result, on_progress)?;

    let result = grant_team_access(ctx, repo, binding).await;
    record(&mut report, Step::TeamAccess, result, on_progress)?;

    for (step, branch) in [
        (Step::ProtectPrimary, &config.primary),
        (Step::ProtectSecondary, &config.secondary),
    ] {
        let policy = ProtectionPolicy::new(
            branch.required_approvals,
            config.required_check.as_deref(),
            binding.slugs(&branch.push_roles),
            vec![config.bot_account.clone()],
        );
        let result = protect_branch(
            ctx,
            repo,
            &branch.branch,
            &policy,
            &config.protection_retry,
            on_progress,
        )
        .await;
        record(&mut report, step, result, on_progress)?;
    }

    let result = apply_toggles(ctx, repo).await;
    record(&mut report, Step::Toggles, result, on_progress)?;

    Ok(report)
}

/// Fold a step result into the report, or abort the run on a fatal error.
fn record<T: Classify>(
    report: &mut RepositoryReport,
    step: Step,
    result: Result<T, ReconcileError>,
    on_progress: Option<&ProgressCallback>,
) -> Result<(), RunError> {
    let outcome = StepOutcome::from_result(step, result).map_err(|source| RunError::Aborted {
        repo: report.name.clone(),
        step,
        source,
    })?;

    if outcome.status.is_warning() {
        tracing::warn!(repo = %report.name, step = %step, detail = %outcome.detail, "Step failed");
    } else {
        tracing::debug!(repo = %report.name, step = %step, status = ?outcome.status, "Step finished");
    }

    emit(
        on_progress,
        RunProgress::StepFinished {
            repo: report.name.clone(),
            outcome: outcome.clone(),
        },
    );
    report.steps.push(outcome);
    Ok(())
}
