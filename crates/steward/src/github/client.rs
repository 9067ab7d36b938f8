//! Authenticated GitHub REST client.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::GitHubError;
use super::pagination::parse_link_header;
use super::types::ApiErrorBody;
use crate::http::reqwest_transport::ReqwestTransport;
use crate::http::{HttpHeaders, HttpMethod, HttpRequest, HttpResponse, HttpTransport, header_get};
use crate::progress::{ProgressCallback, RunProgress, emit};

/// Public GitHub API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Page size requested from list endpoints (the API maximum).
pub const PAGE_SIZE: u32 = 100;

/// REST API version pinned on every request.
const API_VERSION: &str = "2022-11-28";

/// Per-request timeout applied by the reqwest transport.
const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// GitHub API client.
///
/// Every call carries the bearer token and the structured-data `Accept`
/// header. Paths are relative to the configured API base URL, so the same
/// client works against github.com and GitHub Enterprise Server.
#[derive(Clone)]
pub struct GitHubClient {
    transport: Arc<dyn HttpTransport>,
    api_url: String,
    token: String,
}

impl GitHubClient {
    /// Create a client backed by a reqwest transport.
    ///
    /// # Example
    ///
    /// ```ignore
    /// // Public GitHub
    /// let client = GitHubClient::new(DEFAULT_API_URL, &token)?;
    ///
    /// // GitHub Enterprise Server
    /// let client = GitHubClient::new("https://ghe.example.com/api/v3", &token)?;
    /// ```
    pub fn new(api_url: &str, token: &str) -> Result<Self, GitHubError> {
        if token.trim().is_empty() {
            return Err(GitHubError::Config("API token is empty".to_string()));
        }
        url::Url::parse(api_url)
            .map_err(|e| GitHubError::Config(format!("invalid API URL '{}': {}", api_url, e)))?;

        let transport = ReqwestTransport::with_timeout(REQUEST_TIMEOUT)
            .map_err(|e| GitHubError::Config(e.to_string()))?;

        Ok(Self::new_with_transport(api_url, token, Arc::new(transport)))
    }

    pub fn new_with_transport(
        api_url: &str,
        token: &str,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            transport,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    /// Get the API base URL (without trailing slash).
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Resolve a path against the base URL; absolute URLs pass through.
    fn url_for(&self, path: &str) -> String {
        if path.starts_with("https://") || path.starts_with("http://") {
            path.to_string()
        } else {
            format!("{}{}", self.api_url, path)
        }
    }

    fn headers(&self, has_body: bool) -> HttpHeaders {
        let mut headers = vec![
            (
                "Accept".to_string(),
                "application/vnd.github+json".to_string(),
            ),
            ("User-Agent".to_string(), "steward".to_string()),
            ("X-GitHub-Api-Version".to_string(), API_VERSION.to_string()),
            ("Authorization".to_string(), format!("Bearer {}", self.token)),
        ];
        if has_body {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        headers
    }

    /// Issue a request and return the raw response whatever its status.
    ///
    /// Only transport failures are errors here; status interpretation is left
    /// to the caller.
    pub async fn request<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
    ) -> Result<HttpResponse, GitHubError> {
        let url = self.url_for(path);
        let body = match body {
            Some(b) => serde_json::to_vec(b)?,
            None => Vec::new(),
        };

        let request = HttpRequest {
            method,
            url,
            headers: self.headers(!body.is_empty()),
            body,
        };

        let method_str = method.as_str();
        let url_for_log = request.url.clone();
        let response = self.transport.send(request).await?;

        tracing::debug!(
            method = method_str,
            url = %url_for_log,
            status = response.status,
            "GitHub API call"
        );

        Ok(response)
    }

    /// Issue a GET and return only the status code.
    ///
    /// Used for existence checks where 404 is an expected answer.
    pub async fn probe(&self, path: &str) -> Result<u16, GitHubError> {
        let response = self.request::<()>(HttpMethod::Get, path, None).await?;
        Ok(response.status)
    }

    /// GET a JSON document, failing on non-success statuses.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GitHubError> {
        let response = self.request::<()>(HttpMethod::Get, path, None).await?;
        check_status(&response)?;
        serde_json::from_slice(&response.body).map_err(GitHubError::Json)
    }

    /// Send a JSON body, failing on non-success statuses.
    ///
    /// Returns the success status so callers can tell e.g. 201 from 204.
    pub async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
    ) -> Result<u16, GitHubError> {
        let response = self.request(method, path, Some(body)).await?;
        check_status(&response)?;
        Ok(response.status)
    }

    /// Fetch every page of a list endpoint.
    ///
    /// Follows `rel="next"` links until none is present and concatenates the
    /// pages in server order. `resource` labels the progress events.
    pub async fn list_paginated<T: DeserializeOwned>(
        &self,
        path: &str,
        resource: &str,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Vec<T>, GitHubError> {
        let mut items: Vec<T> = Vec::new();
        let mut next = Some(path.to_string());
        let mut page = 0u32;
        let mut expected_pages = None;

        while let Some(current) = next.take() {
            page += 1;
            let response = self.request::<()>(HttpMethod::Get, &current, None).await?;
            check_status(&response)?;

            let batch: Vec<T> = serde_json::from_slice(&response.body)?;
            let count = batch.len();
            items.extend(batch);

            if let Some(link) = response.header("link") {
                let links = parse_link_header(link);
                if expected_pages.is_none() {
                    expected_pages = links.total_pages();
                }
                next = links.next;
            }

            emit(
                on_progress,
                RunProgress::FetchedPage {
                    resource: resource.to_string(),
                    page,
                    count,
                    total_so_far: items.len(),
                    expected_pages,
                },
            );
        }

        Ok(items)
    }
}

/// Map a non-success response to a [`GitHubError`].
///
/// Rate-limit exhaustion is distinguished from ordinary 403s by the
/// `x-ratelimit-remaining: 0` header.
pub fn check_status(response: &HttpResponse) -> Result<(), GitHubError> {
    if response.is_success() {
        return Ok(());
    }

    if matches!(response.status, 403 | 429)
        && header_get(&response.headers, "x-ratelimit-remaining") == Some("0")
    {
        let reset_at = header_get(&response.headers, "x-ratelimit-reset")
            .and_then(|v| v.parse::<i64>().ok())
            .and_then(|epoch| DateTime::from_timestamp(epoch, 0))
            .unwrap_or_else(Utc::now);
        return Err(GitHubError::RateLimited { reset_at });
    }

    Err(GitHubError::Api {
        status: response.status,
        message: api_error_message(&response.body),
    })
}

/// Extract the server's `message` from an error body, falling back to the raw text.
pub fn api_error_message(body: &[u8]) -> String {
    if let Ok(parsed) = serde_json::from_slice::<ApiErrorBody>(body) {
        return parsed.message;
    }
    let raw = String::from_utf8_lossy(body).trim().to_string();
    if raw.is_empty() {
        "empty response body".to_string()
    } else {
        raw
    }
}
