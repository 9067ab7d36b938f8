//! Run configuration.

use crate::retry::RetryConfig;
use crate::teams::{Role, TeamOverrides};

use super::RunError;

/// Default permission granted to the bot collaborator.
pub const DEFAULT_BOT_PERMISSION: &str = "maintain";

/// Protection settings for one long-lived branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchPolicy {
    pub branch: String,
    pub required_approvals: u32,
    /// Roles whose teams may push.
    pub push_roles: Vec<Role>,
}

impl BranchPolicy {
    /// `master`, two approvals, developers and maintainers may push.
    pub fn primary() -> Self {
        Self {
            branch: "master".to_string(),
            required_approvals: 2,
            push_roles: vec![Role::Developer, Role::Maintainer],
        }
    }

    /// `development`, one approval, every role may push.
    pub fn secondary() -> Self {
        Self {
            branch: "development".to_string(),
            required_approvals: 1,
            push_roles: Role::ALL.to_vec(),
        }
    }
}

/// Everything one run needs, built once at startup.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub org: String,
    pub prefix: String,
    pub bot_account: String,
    pub bot_permission: String,
    pub required_check: Option<String>,
    pub primary: BranchPolicy,
    /// Created from the default branch when missing.
    pub secondary: BranchPolicy,
    pub team_overrides: TeamOverrides,
    /// Retry policy for the protection PUT.
    pub protection_retry: RetryConfig,
    pub dry_run: bool,
}

impl RunConfig {
    pub fn new(
        org: impl Into<String>,
        prefix: impl Into<String>,
        bot_account: impl Into<String>,
    ) -> Self {
        Self {
            org: org.into(),
            prefix: prefix.into(),
            bot_account: bot_account.into(),
            bot_permission: DEFAULT_BOT_PERMISSION.to_string(),
            required_check: None,
            primary: BranchPolicy::primary(),
            secondary: BranchPolicy::secondary(),
            team_overrides: TeamOverrides::default(),
            protection_retry: RetryConfig::default(),
            dry_run: false,
        }
    }

    /// Reject configurations that would make the run meaningless.
    pub fn validate(&self) -> Result<(), RunError> {
        let required = [
            ("organization", &self.org),
            ("prefix", &self.prefix),
            ("bot account", &self.bot_account),
            ("bot permission", &self.bot_permission),
            ("primary branch", &self.primary.branch),
            ("secondary branch", &self.secondary.branch),
        ];
        for (what, value) in required {
            if value.trim().is_empty() {
                return Err(RunError::Config(format!("{} must not be empty", what)));
            }
        }
        if self.primary.branch == self.secondary.branch {
            return Err(RunError::Config(format!(
                "primary and secondary branch are both {}",
                self.primary.branch
            )));
        }
        Ok(())
    }
}
