//! Per-repository reconcilers.
//!
//! Each reconciler owns one policy dimension, reads current state where it
//! needs to, and writes the desired state. Every reconciler returns its own
//! outcome type, which the engine folds into a [`StepOutcome`] through
//! [`Classify`]; the engine never looks inside a failure beyond asking
//! whether it is fatal.
//!
//! # Module Structure
//!
//! - [`branch`] - Ensure a branch exists, creating it from the default branch
//! - [`collaborator`] - Ensure the bot account is a collaborator
//! - [`team_access`] - Grant the role teams their repository permission
//! - [`protection`] - Overwrite branch protection rules
//! - [`toggles`] - Overwrite merge-strategy toggles

pub mod branch;
pub mod collaborator;
pub mod protection;
pub mod team_access;
pub mod toggles;

use std::fmt;

use thiserror::Error;
use urlencoding::encode;

use crate::github::{GitHubClient, GitHubError, short_error_message};

pub use branch::{BranchOutcome, ensure_branch};
pub use collaborator::{CollaboratorOutcome, ensure_collaborator};
pub use protection::{ProtectionOutcome, ProtectionPolicy, protect_branch};
pub use team_access::{TeamAccessOutcome, grant_team_access};
pub use toggles::{DESIRED_TOGGLES, ToggleOutcome, apply_toggles};

/// Shared inputs for every reconciler call within one run.
#[derive(Clone, Copy)]
pub struct ReconcileContext<'a> {
    pub client: &'a GitHubClient,
    pub org: &'a str,
    /// Skip every mutating call and report what would have been done.
    pub dry_run: bool,
}

impl ReconcileContext<'_> {
    /// `/repos/{org}/{repo}` followed by `rest`, every segment percent-encoded.
    pub(crate) fn repo_path(&self, repo: &str, rest: &[&str]) -> String {
        let mut path = format!("/repos/{}/{}", encode(self.org), encode(repo));
        for segment in rest {
            path.push('/');
            path.push_str(&encode(segment));
        }
        path
    }
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    GitHub(#[from] GitHubError),

    #[error("default branch of {repo} could not be resolved: {reason}")]
    DefaultBranch { repo: String, reason: String },
}

impl ReconcileError {
    /// Fatal errors abort the run; everything else is a per-repository warning.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ReconcileError::GitHub(e) if e.is_transport())
    }

    /// Short message for one-line progress output.
    pub fn short_message(&self) -> String {
        match self {
            ReconcileError::GitHub(e) => short_error_message(e),
            ReconcileError::DefaultBranch { reason, .. } => {
                format!("default branch unresolved: {}", reason)
            }
        }
    }
}

/// A reconciliation step, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Branch,
    Collaborator,
    TeamAccess,
    ProtectPrimary,
    ProtectSecondary,
    Toggles,
}

impl Step {
    pub fn as_str(self) -> &'static str {
        match self {
            Step::Branch => "branch",
            Step::Collaborator => "collaborator",
            Step::TeamAccess => "team-access",
            Step::ProtectPrimary => "protect-primary",
            Step::ProtectSecondary => "protect-secondary",
            Step::Toggles => "toggles",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of a finished step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepStatus {
    /// Desired state already held; nothing written.
    Unchanged,
    /// Desired state written.
    Applied,
    /// A missing resource was created.
    Created,
    /// Intentionally not performed (expected absence).
    Skipped,
    /// Dry run: would have been written.
    Planned,
    /// Failed; the run continues.
    Warning,
}

impl StepStatus {
    /// Status glyph prefixed to progress lines.
    pub fn glyph(self) -> &'static str {
        match self {
            StepStatus::Unchanged => "=",
            StepStatus::Applied => "✓",
            StepStatus::Created => "+",
            StepStatus::Skipped => "-",
            StepStatus::Planned => "~",
            StepStatus::Warning => "!",
        }
    }

    pub fn is_warning(self) -> bool {
        matches!(self, StepStatus::Warning)
    }
}

/// Result of one step against one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub step: Step,
    pub status: StepStatus,
    pub detail: String,
}

impl StepOutcome {
    pub fn new(step: Step, status: StepStatus, detail: impl Into<String>) -> Self {
        Self {
            step,
            status,
            detail: detail.into(),
        }
    }

    /// Fold a reconciler result into an outcome.
    ///
    /// Non-fatal errors become warnings; fatal errors are handed back.
    pub fn from_result<T: Classify>(
        step: Step,
        result: Result<T, ReconcileError>,
    ) -> Result<Self, ReconcileError> {
        match result {
            Ok(outcome) => {
                let (status, detail) = outcome.classify();
                Ok(Self::new(step, status, detail))
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => Ok(Self::new(step, StepStatus::Warning, e.short_message())),
        }
    }

    /// Human-readable progress line, e.g. `✓ app-a: toggles applied`.
    pub fn line(&self, repo: &str) -> String {
        format!(
            "{} {}: {} {}",
            self.status.glyph(),
            repo,
            self.step,
            self.detail
        )
    }
}

/// Maps a reconciler's outcome to a status and a short description.
pub trait Classify {
    fn classify(&self) -> (StepStatus, String);
}
