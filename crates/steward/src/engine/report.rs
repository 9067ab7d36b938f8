//! In-memory run report.

use crate::reconcile::{StepOutcome, StepStatus};

/// Outcomes of every step against one repository, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryReport {
    pub name: String,
    pub steps: Vec<StepOutcome>,
}

impl RepositoryReport {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    pub fn warnings(&self) -> usize {
        self.count(StepStatus::Warning)
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings() > 0
    }

    pub fn count(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|s| s.status == status).count()
    }
}

/// Every repository processed in one run, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub repositories: Vec<RepositoryReport>,
    pub dry_run: bool,
}

impl RunReport {
    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary {
            dry_run: self.dry_run,
            ..RunSummary::default()
        };
        for repo in &self.repositories {
            summary.repositories += 1;
            if repo.has_warnings() {
                summary.with_warnings += 1;
            }
            for step in &repo.steps {
                match step.status {
                    StepStatus::Unchanged => summary.unchanged += 1,
                    StepStatus::Applied | StepStatus::Created => summary.changed += 1,
                    StepStatus::Skipped => summary.skipped += 1,
                    StepStatus::Planned => summary.planned += 1,
                    StepStatus::Warning => summary.warnings += 1,
                }
            }
        }
        summary
    }
}

/// Step counts across a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub repositories: usize,
    pub with_warnings: usize,
    pub changed: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub planned: usize,
    pub warnings: usize,
    pub dry_run: bool,
}

impl RunSummary {
    /// One-line summary, e.g. `2 repositories, 1 with warnings: 9 changed, 1 warning`.
    pub fn line(&self) -> String {
        let mut parts = Vec::new();
        if self.changed > 0 {
            parts.push(format!("{} changed", self.changed));
        }
        if self.unchanged > 0 {
            parts.push(format!("{} unchanged", self.unchanged));
        }
        if self.planned > 0 {
            parts.push(format!("{} planned", self.planned));
        }
        if self.skipped > 0 {
            parts.push(format!("{} skipped", self.skipped));
        }
        if self.warnings > 0 {
            parts.push(format!(
                "{} warning{}",
                self.warnings,
                if self.warnings == 1 { "" } else { "s" }
            ));
        }

        let head = format!(
            "{}{} repositor{}, {} with warnings",
            if self.dry_run { "[dry run] " } else { "" },
            self.repositories,
            if self.repositories == 1 { "y" } else { "ies" },
            self.with_warnings
        );
        if parts.is_empty() {
            head
        } else {
            format!("{}: {}", head, parts.join(", "))
        }
    }
}
