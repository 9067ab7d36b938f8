//! Bot collaborator membership.

use super::{Classify, ReconcileContext, ReconcileError, StepStatus};
use crate::github::{PermissionRequest, api_error_message};
use crate::http::HttpMethod;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorOutcome {
    /// 201: an invitation was created and awaits acceptance.
    Invited,
    /// 204: the account already had access.
    AlreadyMember,
    /// The account does not exist; nothing was written.
    AccountMissing,
    /// Dry run: the invitation or permission update would be sent.
    Planned,
    /// Any other answer from the server.
    Rejected { status: u16, message: String },
}

impl Classify for CollaboratorOutcome {
    fn classify(&self) -> (StepStatus, String) {
        match self {
            CollaboratorOutcome::Invited => (
                StepStatus::Applied,
                "invited (pending acceptance)".to_string(),
            ),
            CollaboratorOutcome::AlreadyMember => {
                (StepStatus::Unchanged, "already a collaborator".to_string())
            }
            CollaboratorOutcome::AccountMissing => {
                (StepStatus::Skipped, "account does not exist".to_string())
            }
            CollaboratorOutcome::Planned => (StepStatus::Planned, "would invite".to_string()),
            CollaboratorOutcome::Rejected { status, message } => {
                (StepStatus::Warning, format!("HTTP {}: {}", status, message))
            }
        }
    }
}

/// Ensure `bot` is a collaborator on `repo` with `permission`.
///
/// The account is looked up first; a 404 there means there is nobody to
/// invite and no write is attempted.
pub async fn ensure_collaborator(
    ctx: &ReconcileContext<'_>,
    repo: &str,
    bot: &str,
    permission: &str,
) -> Result<CollaboratorOutcome, ReconcileError> {
    let account = ctx.client.probe(&format!("/users/{}", urlencoding::encode(bot))).await?;
    match account {
        404 => return Ok(CollaboratorOutcome::AccountMissing),
        200 => {}
        status => {
            return Ok(CollaboratorOutcome::Rejected {
                status,
                message: format!("could not look up account {}", bot),
            });
        }
    }

    if ctx.dry_run {
        return Ok(CollaboratorOutcome::Planned);
    }

    let response = ctx
        .client
        .request(
            HttpMethod::Put,
            &ctx.repo_path(repo, &["collaborators", bot]),
            Some(&PermissionRequest { permission }),
        )
        .await?;

    Ok(match response.status {
        201 => CollaboratorOutcome::Invited,
        204 => CollaboratorOutcome::AlreadyMember,
        status => CollaboratorOutcome::Rejected {
            status,
            message: api_error_message(&response.body),
        },
    })
}
