//! GitHub REST API client.
//!
//! A thin, typed layer over [`crate::http::HttpTransport`]: authentication
//! headers, status classification, `Link`-header pagination and the request
//! and response shapes the reconcilers exchange with the API.
//!
//! # Module Structure
//!
//! - [`error`] - Error types and short messages for progress output
//! - [`types`] - Serde request and response structures
//! - [`client`] - Client creation and request helpers
//! - [`pagination`] - `Link` header parsing
//!
//! # Example
//!
//! ```ignore
//! use steward::github::{GitHubClient, DEFAULT_API_URL};
//!
//! let client = GitHubClient::new(DEFAULT_API_URL, &token)?;
//! let status = client.probe("/users/ci-bot").await?;
//! ```

mod client;
mod error;
mod pagination;
mod types;

pub use error::{GitHubError, short_error_message};

pub use types::{
    Branch, CommitRef, CreateRefRequest, PermissionRequest, ProtectionRequest, Repository,
    RepositoryToggles, RequiredPullRequestReviews, RequiredStatusChecks, Restrictions, Team,
};

pub use client::{
    DEFAULT_API_URL, GitHubClient, PAGE_SIZE, api_error_message, check_status,
};

pub use pagination::{LinkPagination, parse_link_header};
