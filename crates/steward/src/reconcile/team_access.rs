//! Repository access for the role teams.

use super::{Classify, ReconcileContext, ReconcileError, StepStatus};
use crate::github::{PermissionRequest, short_error_message};
use crate::http::HttpMethod;
use crate::teams::{Role, RoleBinding};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamAccessOutcome {
    /// Every role team was granted its permission.
    Granted(usize),
    /// Dry run: this many grants would be written.
    Planned(usize),
    /// Some grants failed; the rest were written.
    Partial {
        granted: usize,
        failed: Vec<(Role, String)>,
    },
}

impl Classify for TeamAccessOutcome {
    fn classify(&self) -> (StepStatus, String) {
        match self {
            TeamAccessOutcome::Granted(n) => {
                (StepStatus::Applied, format!("{} teams granted", n))
            }
            TeamAccessOutcome::Planned(n) => {
                (StepStatus::Planned, format!("would grant {} teams", n))
            }
            TeamAccessOutcome::Partial { granted, failed } => {
                let reasons: Vec<String> = failed
                    .iter()
                    .map(|(role, msg)| format!("{}: {}", role, msg))
                    .collect();
                (
                    StepStatus::Warning,
                    format!("{} granted, failed {}", granted, reasons.join("; ")),
                )
            }
        }
    }
}

/// Grant each role team its repository permission on `repo`.
///
/// Developer gets push, Maintainer gets maintain and Administrator gets
/// admin. The grants are idempotent on the server side.
pub async fn grant_team_access(
    ctx: &ReconcileContext<'_>,
    repo: &str,
    binding: &RoleBinding,
) -> Result<TeamAccessOutcome, ReconcileError> {
    if ctx.dry_run {
        return Ok(TeamAccessOutcome::Planned(binding.iter().count()));
    }

    let mut granted = 0;
    let mut failed = Vec::new();

    for (role, slug) in binding.iter() {
        let path = format!(
            "/orgs/{org}/teams/{slug}/repos/{org}/{repo}",
            org = urlencoding::encode(ctx.org),
            slug = urlencoding::encode(slug),
            repo = urlencoding::encode(repo)
        );
        let body = PermissionRequest {
            permission: role.repository_permission(),
        };

        match ctx.client.send_json(HttpMethod::Put, &path, &body).await {
            Ok(_) => granted += 1,
            Err(e) if e.is_transport() => return Err(e.into()),
            Err(e) => {
                tracing::debug!(repo, team = slug, error = %e, "Team grant failed");
                failed.push((role, short_error_message(&e)));
            }
        }
    }

    if failed.is_empty() {
        Ok(TeamAccessOutcome::Granted(granted))
    } else {
        Ok(TeamAccessOutcome::Partial { granted, failed })
    }
}
