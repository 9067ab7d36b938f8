//! Progress reporting for policy runs.
//!
//! The library never prints. Every observable step of a run is emitted as a
//! [`RunProgress`] event through an optional callback, and the caller decides
//! how to render it (interactive terminal, structured logs, nothing at all).

use crate::engine::RunSummary;
use crate::github::Team;
use crate::reconcile::StepOutcome;
use crate::teams::Role;

/// Progress events emitted during a run.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum RunProgress {
    /// Starting to list the organization's teams.
    FetchingTeams {
        /// The organization being resolved.
        org: String,
    },

    /// Fetched one page of a paginated listing.
    FetchedPage {
        /// What is being listed ("teams", "repositories").
        resource: String,
        /// Page number (1-indexed).
        page: u32,
        /// Number of items on this page.
        count: usize,
        /// Running total of items fetched so far.
        total_so_far: usize,
        /// Expected total pages, when the server advertised a last page.
        expected_pages: Option<u32>,
    },

    /// Every role was bound to a team.
    TeamsResolved {
        /// Role → team slug, in role order.
        bindings: Vec<(Role, String)>,
    },

    /// At least one role could not be bound; the run stops here.
    TeamsUnresolved {
        /// Roles without a team.
        missing: Vec<Role>,
        /// Every team the organization has, for diagnosis.
        available: Vec<Team>,
    },

    /// Starting repository discovery.
    FetchingRepos {
        org: String,
        prefix: String,
    },

    /// Discovery finished.
    ReposListed {
        /// Repositories whose names matched the prefix.
        matched: usize,
        /// Repositories in the organization.
        total: usize,
    },

    /// Starting to reconcile one repository.
    RepoStarted {
        name: String,
        /// Position in the run (0-indexed).
        index: usize,
        total: usize,
    },

    /// One reconciliation step finished.
    StepFinished {
        repo: String,
        outcome: StepOutcome,
    },

    /// All steps for one repository finished.
    RepoFinished {
        name: String,
        /// Number of steps that ended in a warning.
        warnings: usize,
    },

    /// A transient failure is being retried after a backoff.
    RetryBackoff {
        /// What is being retried, e.g. `app-a protect master`.
        label: String,
        /// Milliseconds until the next attempt.
        retry_after_ms: u64,
        /// Attempt that just failed (1-indexed).
        attempt: u32,
    },

    /// The run finished without a fatal error.
    RunComplete {
        summary: RunSummary,
    },
}

/// Callback for receiving run progress updates.
pub type ProgressCallback = Box<dyn Fn(RunProgress) + Send + Sync>;

/// Emit a progress event if a callback is set.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: RunProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}
