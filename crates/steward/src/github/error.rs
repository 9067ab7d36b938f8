//! GitHub API error types.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::http::HttpError;

/// Errors that can occur when interacting with the GitHub API.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// The request never produced an HTTP response (DNS, TLS, connection, timeout).
    #[error("HTTP transport error: {0}")]
    Transport(String),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Rate limit exhausted.
    #[error("Rate limit exceeded. Resets at {reset_at}")]
    RateLimited { reset_at: DateTime<Utc> },

    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<HttpError> for GitHubError {
    fn from(err: HttpError) -> Self {
        GitHubError::Transport(err.to_string())
    }
}

impl GitHubError {
    /// Whether this error means the API could not be reached at all.
    ///
    /// Transport failures abort the whole run; every other error is scoped to
    /// the step that triggered it.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, GitHubError::Transport(_))
    }

    /// Whether retrying the same request may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            GitHubError::RateLimited { .. } => true,
            GitHubError::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// HTTP status of an API error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            GitHubError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Get a short error message suitable for one-line progress output.
pub fn short_error_message(err: &GitHubError) -> String {
    match err {
        GitHubError::Transport(msg) => {
            let first = msg.lines().next().unwrap_or(msg);
            format!("Network error: {}", first)
        }
        GitHubError::Json(_) => "JSON parse error".to_string(),
        GitHubError::Api { status, message } => {
            if message.chars().count() > 60 {
                let truncated: String = message.chars().take(57).collect();
                format!("HTTP {}: {}...", status, truncated)
            } else {
                format!("HTTP {}: {}", status, message)
            }
        }
        GitHubError::RateLimited { .. } => "Rate limited".to_string(),
        GitHubError::Config(msg) => format!("Config: {}", msg),
    }
}
