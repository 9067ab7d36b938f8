//! Steward - organization-wide repository policy for GitHub.
//!
//! Applies one policy to every repository of an organization whose name
//! starts with a prefix: a long-lived secondary branch, a bot collaborator,
//! role team access, branch protection on two branches and a fixed set of
//! merge-strategy toggles. Every write is a full overwrite, so a run can be
//! repeated safely.
//!
//! # Example
//!
//! ```ignore
//! use steward::{GitHubClient, RunConfig, run, DEFAULT_API_URL};
//!
//! let client = GitHubClient::new(DEFAULT_API_URL, &token)?;
//! let config = RunConfig::new("acme", "app-", "ci-bot");
//! let report = run(&client, &config, None).await?;
//! println!("{}", report.summary().line());
//! ```

pub mod discovery;
pub mod engine;
pub mod github;
pub mod http;
pub mod progress;
pub mod reconcile;
pub mod retry;
pub mod teams;

pub use engine::{
    BranchPolicy, RepositoryReport, RunConfig, RunError, RunReport, RunSummary, run,
};
pub use github::{DEFAULT_API_URL, GitHubClient, GitHubError};
pub use http::{HttpError, HttpMethod, HttpRequest, HttpResponse, HttpTransport};
pub use progress::{ProgressCallback, RunProgress};
pub use reconcile::{Step, StepOutcome, StepStatus};
pub use retry::RetryConfig;
pub use teams::{Role, RoleBinding, TeamOverrides};
