//! Repository discovery by name prefix.

use crate::github::{GitHubClient, GitHubError, PAGE_SIZE, Repository};
use crate::progress::{ProgressCallback, RunProgress, emit};

/// Whether `name` starts with `prefix`, compared byte-wise and case-sensitively.
///
/// The prefix is literal: no glob or regex interpretation. An empty prefix
/// matches everything.
pub fn matches_prefix(name: &str, prefix: &str) -> bool {
    name.as_bytes().starts_with(prefix.as_bytes())
}

/// Keep the names that start with `prefix`, preserving input order.
pub fn filter_by_prefix<'a, I>(names: I, prefix: &'a str) -> impl Iterator<Item = String> + 'a
where
    I: IntoIterator<Item = String>,
    I::IntoIter: 'a,
{
    names
        .into_iter()
        .filter(move |name| matches_prefix(name, prefix))
}

/// List every repository of `org` (public and private) whose name starts with `prefix`.
///
/// The full listing is fetched before filtering; the result keeps the order
/// the server returned. No match is not an error.
pub async fn list_repositories(
    client: &GitHubClient,
    org: &str,
    prefix: &str,
    on_progress: Option<&ProgressCallback>,
) -> Result<Vec<String>, GitHubError> {
    emit(
        on_progress,
        RunProgress::FetchingRepos {
            org: org.to_string(),
            prefix: prefix.to_string(),
        },
    );

    let repos: Vec<Repository> = client
        .list_paginated(
            &format!(
                "/orgs/{}/repos?type=all&per_page={}",
                urlencoding::encode(org),
                PAGE_SIZE
            ),
            "repositories",
            on_progress,
        )
        .await?;

    let total = repos.len();
    let matched: Vec<String> =
        filter_by_prefix(repos.into_iter().map(|r| r.name), prefix).collect();

    tracing::debug!(org, prefix, total, matched = matched.len(), "Filtered repositories");
    emit(
        on_progress,
        RunProgress::ReposListed {
            matched: matched.len(),
            total,
        },
    );

    Ok(matched)
}
