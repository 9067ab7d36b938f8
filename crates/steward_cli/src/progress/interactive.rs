use std::sync::Mutex;

use console::{Style, style};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use steward::reconcile::{Step, StepOutcome, StepStatus};
use steward::teams::describe_team;
use steward::{RunProgress, RunSummary};
use tabled::Tabled;

/// One summary table row per repository, one glyph per step.
#[derive(Debug, Clone, Tabled)]
pub struct SummaryRow {
    #[tabled(rename = "Repository")]
    pub repository: String,
    #[tabled(rename = "Branch")]
    pub branch: String,
    #[tabled(rename = "Bot")]
    pub collaborator: String,
    #[tabled(rename = "Teams")]
    pub team_access: String,
    #[tabled(rename = "Primary")]
    pub protect_primary: String,
    #[tabled(rename = "Secondary")]
    pub protect_secondary: String,
    #[tabled(rename = "Toggles")]
    pub toggles: String,
}

impl SummaryRow {
    fn new(repository: String) -> Self {
        Self {
            repository,
            branch: String::new(),
            collaborator: String::new(),
            team_access: String::new(),
            protect_primary: String::new(),
            protect_secondary: String::new(),
            toggles: String::new(),
        }
    }

    fn record(&mut self, outcome: &StepOutcome) {
        let cell = match outcome.step {
            Step::Branch => &mut self.branch,
            Step::Collaborator => &mut self.collaborator,
            Step::TeamAccess => &mut self.team_access,
            Step::ProtectPrimary => &mut self.protect_primary,
            Step::ProtectSecondary => &mut self.protect_secondary,
            Step::Toggles => &mut self.toggles,
        };
        *cell = outcome.status.glyph().to_string();
    }
}

/// Render the per-repository summary table.
pub fn summary_table(rows: &[SummaryRow]) -> String {
    let mut table = tabled::Table::new(rows);
    table.with(tabled::settings::Style::rounded());
    table.to_string()
}

#[derive(Default)]
struct ReporterState {
    fetch_bar: Option<ProgressBar>,
    repo_bar: Option<ProgressBar>,
    rows: Vec<SummaryRow>,
}

/// Interactive progress reporter using indicatif and console styling.
pub struct InteractiveReporter {
    multi: MultiProgress,
    state: Mutex<ReporterState>,
}

impl InteractiveReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            state: Mutex::new(ReporterState::default()),
        }
    }

    /// Print a line above any active bars.
    fn println(&self, line: impl AsRef<str>) {
        if self.multi.println(line.as_ref()).is_err() {
            println!("{}", line.as_ref());
        }
    }

    pub fn handle(&self, event: RunProgress) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        match event {
            RunProgress::FetchingTeams { org } => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::spinner_style());
                pb.enable_steady_tick(std::time::Duration::from_millis(100));
                pb.set_prefix(format!("{:12}", org));
                pb.set_message("Resolving teams...");
                state.fetch_bar = Some(pb);
            }

            RunProgress::FetchedPage {
                resource,
                page,
                total_so_far,
                ..
            } => {
                if let Some(ref pb) = state.fetch_bar {
                    pb.set_message(format!("Page {} ({} {})", page, total_so_far, resource));
                }
            }

            RunProgress::TeamsResolved { bindings } => {
                if let Some(pb) = state.fetch_bar.take() {
                    pb.finish_and_clear();
                }
                for (role, slug) in bindings {
                    self.println(format!(
                        "{} {:13} → {}",
                        style("✓").green().bold(),
                        role.as_str(),
                        style(slug).cyan()
                    ));
                }
            }

            RunProgress::TeamsUnresolved { missing, available } => {
                if let Some(pb) = state.fetch_bar.take() {
                    pb.finish_and_clear();
                }
                for role in missing {
                    self.println(format!(
                        "{} no team found for {}",
                        style("✗").red().bold(),
                        style(role.as_str()).bold()
                    ));
                }
                self.println(format!("{}", style("Available teams:").yellow().bold()));
                for team in &available {
                    self.println(format!("  {}", describe_team(team)));
                }
            }

            RunProgress::FetchingRepos { org, prefix } => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::spinner_style());
                pb.enable_steady_tick(std::time::Duration::from_millis(100));
                pb.set_prefix(format!("{:12}", org));
                pb.set_message(format!("Listing repositories matching {}*...", prefix));
                state.fetch_bar = Some(pb);
            }

            RunProgress::ReposListed { matched, total } => {
                if let Some(pb) = state.fetch_bar.take() {
                    pb.finish_and_clear();
                }
                self.println(format!(
                    "{} {} of {} repositories match",
                    style("✓").green().bold(),
                    style(matched).cyan(),
                    total
                ));
                if matched > 0 {
                    let pb = self.multi.add(ProgressBar::new(matched as u64));
                    pb.set_style(Self::bar_style());
                    pb.set_prefix(format!("{:12}", "Reconciling"));
                    state.repo_bar = Some(pb);
                }
            }

            RunProgress::RepoStarted { name, .. } => {
                if let Some(ref pb) = state.repo_bar {
                    pb.set_message(name.clone());
                }
                state.rows.push(SummaryRow::new(name));
            }

            RunProgress::StepFinished { repo, outcome } => {
                let line = outcome.line(&repo);
                self.println(Self::status_style(outcome.status).apply_to(line).to_string());
                if let Some(row) = state.rows.iter_mut().rev().find(|r| r.repository == repo) {
                    row.record(&outcome);
                }
            }

            RunProgress::RepoFinished { .. } => {
                if let Some(ref pb) = state.repo_bar {
                    pb.inc(1);
                }
            }

            RunProgress::RetryBackoff {
                label,
                retry_after_ms,
                attempt,
            } => {
                self.println(format!(
                    "{} {}: retry {} in {:.1}s",
                    style("⟳").yellow().bold(),
                    label,
                    attempt,
                    retry_after_ms as f64 / 1000.0
                ));
            }

            RunProgress::RunComplete { summary } => {
                if let Some(pb) = state.repo_bar.take() {
                    pb.finish_and_clear();
                }
                if !state.rows.is_empty() {
                    self.println(summary_table(&state.rows));
                }
                self.println(Self::summary_line(&summary));
            }

            _ => {}
        }
    }

    pub fn finish(&self) {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        for pb in [&state.fetch_bar, &state.repo_bar].into_iter().flatten() {
            if !pb.is_finished() {
                pb.finish_and_clear();
            }
        }
    }

    fn status_style(status: StepStatus) -> Style {
        match status {
            StepStatus::Applied | StepStatus::Created => Style::new().green(),
            StepStatus::Unchanged => Style::new().dim(),
            StepStatus::Skipped | StepStatus::Planned => Style::new().yellow(),
            StepStatus::Warning => Style::new().red().bold(),
        }
    }

    fn summary_line(summary: &RunSummary) -> String {
        let marker = if summary.with_warnings > 0 {
            style("⚠").yellow().bold()
        } else {
            style("✓").green().bold()
        };
        format!("{} {}", marker, summary.line())
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.cyan} {spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos:>3}/{len:3} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░")
    }
}

impl Default for InteractiveReporter {
    fn default() -> Self {
        Self::new()
    }
}
