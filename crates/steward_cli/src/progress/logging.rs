use steward::reconcile::StepStatus;
use steward::teams::describe_team;
use steward::RunProgress;

/// Logging reporter using tracing for structured output.
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, event: RunProgress) {
        match event {
            RunProgress::FetchingTeams { org } => {
                tracing::info!(org = %org, "Resolving role teams");
            }

            RunProgress::FetchedPage {
                resource,
                page,
                count,
                total_so_far,
                expected_pages,
            } => {
                tracing::debug!(resource = %resource, page, count, total_so_far, expected_pages = ?expected_pages, "Fetched page");
            }

            RunProgress::TeamsResolved { bindings } => {
                for (role, slug) in bindings {
                    tracing::info!(role = %role, team = %slug, "Bound role");
                }
            }

            RunProgress::TeamsUnresolved { missing, available } => {
                let available: Vec<String> = available.iter().map(describe_team).collect();
                tracing::error!(
                    missing = ?missing.iter().map(|r| r.as_str()).collect::<Vec<_>>(),
                    available = ?available,
                    "Could not resolve every role to a team"
                );
            }

            RunProgress::FetchingRepos { org, prefix } => {
                tracing::info!(org = %org, prefix = %prefix, "Listing repositories");
            }

            RunProgress::ReposListed { matched, total } => {
                tracing::info!(matched, total, "Repositories matched");
            }

            RunProgress::RepoStarted { name, index, total } => {
                tracing::info!(repo = %name, position = index + 1, total, "Reconciling repository");
            }

            RunProgress::StepFinished { repo, outcome } => {
                let line = outcome.line(&repo);
                let glyph = outcome.status.glyph();
                if outcome.status == StepStatus::Warning {
                    tracing::warn!(repo = %repo, step = %outcome.step, glyph, "{}", line);
                } else {
                    tracing::info!(repo = %repo, step = %outcome.step, glyph, "{}", line);
                }
            }

            RunProgress::RepoFinished { name, warnings } => {
                if warnings > 0 {
                    tracing::warn!(repo = %name, warnings, "Repository finished with warnings");
                } else {
                    tracing::debug!(repo = %name, "Repository finished");
                }
            }

            RunProgress::RetryBackoff {
                label,
                retry_after_ms,
                attempt,
            } => {
                tracing::warn!(
                    operation = %label,
                    retry_after_ms,
                    attempt,
                    "Transient failure, backing off"
                );
            }

            RunProgress::RunComplete { summary } => {
                tracing::info!(
                    repositories = summary.repositories,
                    with_warnings = summary.with_warnings,
                    changed = summary.changed,
                    warnings = summary.warnings,
                    dry_run = summary.dry_run,
                    "{}",
                    summary.line()
                );
            }

            _ => {}
        }
    }
}

impl Default for LoggingReporter {
    fn default() -> Self {
        Self::new()
    }
}
