//! Integration tests for full policy runs.
//!
//! These drive [`steward::run`] against an in-memory organization that
//! answers like the GitHub REST API and keeps state between calls, so a run
//! can be repeated and the second pass observed.
//!
//! Key scenarios tested:
//! - Prefix discovery across pages, branch creation from the default head
//! - Re-running produces identical writes and creates nothing new
//! - A missing bot account skips the invite without failing the repository
//! - An unresolved role or a dry run issues no writes at all

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use steward::{
    GitHubClient, HttpError, HttpMethod, HttpRequest, HttpResponse, HttpTransport, ProgressCallback,
    RunConfig, RunError, RunProgress, Step, StepStatus, TeamOverrides, run,
};

const API: &str = "https://fake.test";

#[derive(Default)]
struct OrgState {
    teams: Vec<(String, String)>,
    /// Repository name → (default branch, branch name → head sha).
    repos: Vec<(String, String, HashMap<String, String>)>,
    users: HashSet<String>,
    collaborators: HashSet<(String, String)>,
    requests: Vec<HttpRequest>,
}

/// In-memory organization served over [`HttpTransport`].
#[derive(Clone, Default)]
struct FakeOrg {
    state: Arc<Mutex<OrgState>>,
}

impl FakeOrg {
    fn new() -> Self {
        let org = Self::default();
        {
            let mut state = org.lock();
            state.teams = vec![
                ("Developers".to_string(), "developers".to_string()),
                ("Maintainers".to_string(), "maintainers".to_string()),
                ("Admins".to_string(), "admins".to_string()),
            ];
            state.users.insert("ci-bot".to_string());
        }
        org.add_repo("app-a", &["master"]);
        org.add_repo("other-x", &["master", "development"]);
        org.add_repo("app-b", &["master", "development"]);
        org
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, OrgState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn add_repo(&self, name: &str, branches: &[&str]) {
        let heads = branches
            .iter()
            .map(|b| (b.to_string(), format!("{name}-{b}-sha")))
            .collect();
        self.lock()
            .repos
            .push((name.to_string(), "master".to_string(), heads));
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.lock().requests.clone()
    }

    fn writes(&self) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method != HttpMethod::Get)
            .collect()
    }

    fn has_branch(&self, repo: &str, branch: &str) -> bool {
        self.lock()
            .repos
            .iter()
            .any(|(name, _, heads)| name == repo && heads.contains_key(branch))
    }

    fn route(&self, request: &HttpRequest) -> HttpResponse {
        let path = request
            .url
            .strip_prefix(API)
            .unwrap_or(&request.url)
            .to_string();
        let (path, query) = match path.split_once('?') {
            Some((p, q)) => (p.to_string(), q.to_string()),
            None => (path, String::new()),
        };
        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        let mut state = self.lock();

        match (request.method, segments.as_slice()) {
            (HttpMethod::Get, ["orgs", "acme", "teams"]) => {
                let body: Vec<_> = state
                    .teams
                    .iter()
                    .map(|(name, slug)| serde_json::json!({"name": name, "slug": slug}))
                    .collect();
                json(200, serde_json::Value::Array(body))
            }
            (HttpMethod::Get, ["orgs", "acme", "repos"]) => {
                // Two repositories per page to exercise pagination.
                let page: usize = query
                    .split('&')
                    .find_map(|kv| kv.strip_prefix("page="))
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(1);
                let all: Vec<_> = state
                    .repos
                    .iter()
                    .map(|(name, default, _)| {
                        serde_json::json!({"name": name, "default_branch": default})
                    })
                    .collect();
                let chunk: Vec<_> = all.iter().skip((page - 1) * 2).take(2).cloned().collect();
                let mut response = json(200, serde_json::Value::Array(chunk));
                if page * 2 < all.len() {
                    response.headers.push((
                        "Link".to_string(),
                        format!(
                            "<{API}/orgs/acme/repos?type=all&per_page=100&page={}>; rel=\"next\"",
                            page + 1
                        ),
                    ));
                }
                response
            }
            (HttpMethod::Get, ["repos", "acme", repo]) => {
                match state.repos.iter().find(|(name, _, _)| name == repo) {
                    Some((name, default, _)) => json(
                        200,
                        serde_json::json!({"name": name, "default_branch": default}),
                    ),
                    None => not_found(),
                }
            }
            (HttpMethod::Get, ["repos", "acme", repo, "branches", branch]) => {
                let head = state
                    .repos
                    .iter()
                    .find(|(name, _, _)| name == repo)
                    .and_then(|(_, _, heads)| heads.get(*branch));
                match head {
                    Some(sha) => json(
                        200,
                        serde_json::json!({"name": branch, "commit": {"sha": sha}}),
                    ),
                    None => json(404, serde_json::json!({"message": "Branch not found"})),
                }
            }
            (HttpMethod::Post, ["repos", "acme", repo, "git", "refs"]) => {
                let body = request.json_body().unwrap_or_default();
                let branch = body["ref"]
                    .as_str()
                    .and_then(|r| r.strip_prefix("refs/heads/"))
                    .unwrap_or_default()
                    .to_string();
                let sha = body["sha"].as_str().unwrap_or_default().to_string();
                match state.repos.iter_mut().find(|(name, _, _)| name == repo) {
                    Some((_, _, heads)) => {
                        heads.insert(branch, sha);
                        json(201, serde_json::json!({}))
                    }
                    None => not_found(),
                }
            }
            (HttpMethod::Get, ["users", user]) => {
                if state.users.contains(*user) {
                    json(200, serde_json::json!({"login": user}))
                } else {
                    not_found()
                }
            }
            (HttpMethod::Put, ["repos", "acme", repo, "collaborators", user]) => {
                if state
                    .collaborators
                    .insert((repo.to_string(), user.to_string()))
                {
                    json(201, serde_json::json!({}))
                } else {
                    status(204)
                }
            }
            (HttpMethod::Put, ["orgs", "acme", "teams", _, "repos", "acme", _]) => status(204),
            (HttpMethod::Put, ["repos", "acme", repo, "branches", branch, "protection"]) => {
                let exists = state
                    .repos
                    .iter()
                    .any(|(name, _, heads)| name == repo && heads.contains_key(*branch));
                if exists {
                    json(200, serde_json::json!({}))
                } else {
                    json(404, serde_json::json!({"message": "Branch not found"}))
                }
            }
            (HttpMethod::Patch, ["repos", "acme", _]) => json(200, serde_json::json!({})),
            _ => not_found(),
        }
    }
}

fn json(code: u16, body: serde_json::Value) -> HttpResponse {
    HttpResponse {
        status: code,
        headers: vec![("Content-Type".to_string(), "application/json".to_string())],
        body: body.to_string().into_bytes(),
    }
}

fn status(code: u16) -> HttpResponse {
    HttpResponse {
        status: code,
        headers: Vec::new(),
        body: Vec::new(),
    }
}

fn not_found() -> HttpResponse {
    json(404, serde_json::json!({"message": "Not Found"}))
}

#[async_trait]
impl HttpTransport for FakeOrg {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let response = self.route(&request);
        self.lock().requests.push(request);
        Ok(response)
    }
}

fn client(org: &FakeOrg) -> GitHubClient {
    GitHubClient::new_with_transport(API, "test-token", Arc::new(org.clone()))
}

fn config() -> RunConfig {
    RunConfig::new("acme", "app-", "ci-bot")
}

#[tokio::test]
async fn full_run_reconciles_matching_repositories() {
    let org = FakeOrg::new();

    let report = run(&client(&org), &config(), None)
        .await
        .expect("run should succeed");

    let names: Vec<&str> = report
        .repositories
        .iter()
        .map(|r| r.name.as_str())
        .collect();
    assert_eq!(names, vec!["app-a", "app-b"]);

    let app_a = &report.repositories[0];
    assert_eq!(app_a.steps[0].step, Step::Branch);
    assert_eq!(app_a.steps[0].status, StepStatus::Created);
    assert!(org.has_branch("app-a", "development"));
    assert!(!report.repositories.iter().any(|r| r.has_warnings()));

    let refs: Vec<_> = org
        .writes()
        .into_iter()
        .filter(|r| r.url.ends_with("/git/refs"))
        .collect();
    assert_eq!(refs.len(), 1);
    assert_eq!(
        refs[0].json_body(),
        Some(serde_json::json!({
            "ref": "refs/heads/development",
            "sha": "app-a-master-sha"
        }))
    );

    assert!(
        !org.requests().iter().any(|r| r.url.contains("other-x")),
        "non-matching repositories must not be touched"
    );
}

#[tokio::test]
async fn every_request_is_authenticated() {
    let org = FakeOrg::new();
    run(&client(&org), &config(), None)
        .await
        .expect("run should succeed");

    for request in org.requests() {
        let auth = request
            .headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("authorization"))
            .map(|(_, v)| v.as_str());
        assert_eq!(auth, Some("Bearer test-token"), "{}", request.url);
    }
}

#[tokio::test]
async fn second_run_is_idempotent() {
    let org = FakeOrg::new();
    let client = client(&org);

    run(&client, &config(), None).await.expect("first run");
    let first = org.writes();

    let report = run(&client, &config(), None).await.expect("second run");
    let second: Vec<_> = org.writes().into_iter().skip(first.len()).collect();

    assert!(!second.iter().any(|r| r.url.ends_with("/git/refs")));

    let overwrites = |writes: &[HttpRequest]| -> Vec<(String, Vec<u8>)> {
        writes
            .iter()
            .filter(|r| r.url.ends_with("/protection") || r.method == HttpMethod::Patch)
            .map(|r| (r.url.clone(), r.body.clone()))
            .collect()
    };
    assert_eq!(overwrites(&first), overwrites(&second));

    for repo in &report.repositories {
        assert_eq!(repo.steps[0].status, StepStatus::Unchanged);
        assert_eq!(repo.steps[1].status, StepStatus::Unchanged);
    }
}

#[tokio::test]
async fn missing_bot_is_skipped_without_invite() {
    let org = FakeOrg::new();
    org.lock().users.clear();

    let report = run(&client(&org), &config(), None)
        .await
        .expect("run should succeed");

    assert!(
        !org.writes()
            .iter()
            .any(|r| r.url.contains("/collaborators/"))
    );
    for repo in &report.repositories {
        assert_eq!(repo.steps[1].status, StepStatus::Skipped);
        assert!(!repo.has_warnings());
    }
}

#[tokio::test]
async fn unresolved_role_issues_no_writes() {
    let org = FakeOrg::new();
    org.lock().teams.retain(|(name, _)| name != "Admins");

    let err = run(&client(&org), &config(), None)
        .await
        .expect_err("missing role is fatal");

    assert!(matches!(err, RunError::Teams(_)));
    assert!(err.to_string().contains("Administrator"));
    assert!(org.writes().is_empty());
}

#[tokio::test]
async fn override_resolves_unconventional_team_name() {
    let org = FakeOrg::new();
    org.lock().teams[1] = ("Platform Leads".to_string(), "platform-leads".to_string());

    let mut config = config();
    config.team_overrides = TeamOverrides {
        maintainer: Some("Platform Leads".to_string()),
        ..TeamOverrides::default()
    };

    run(&client(&org), &config, None)
        .await
        .expect("override binds the maintainer role");

    assert!(
        org.writes()
            .iter()
            .any(|r| r.url.contains("/teams/platform-leads/repos/acme/app-a"))
    );
}

#[tokio::test]
async fn dry_run_reads_but_never_writes() {
    let org = FakeOrg::new();
    let mut config = config();
    config.dry_run = true;

    let events: Arc<Mutex<Vec<RunProgress>>> = Arc::new(Mutex::new(Vec::new()));
    let capture = Arc::clone(&events);
    let callback: ProgressCallback = Box::new(move |event| {
        capture.lock().unwrap_or_else(|e| e.into_inner()).push(event);
    });

    let report = run(&client(&org), &config, Some(&callback))
        .await
        .expect("dry run succeeds");

    assert!(org.writes().is_empty());
    assert!(!org.has_branch("app-a", "development"));
    assert_eq!(report.repositories[0].steps[0].status, StepStatus::Planned);

    let events = events.lock().unwrap_or_else(|e| e.into_inner());
    let finished = events
        .iter()
        .filter(|e| matches!(e, RunProgress::StepFinished { .. }))
        .count();
    assert_eq!(finished, 12);
}

#[tokio::test]
async fn protection_on_missing_branch_warns_and_run_continues() {
    let org = FakeOrg::new();
    // app-a has no primary branch: its primary protection must fail.
    {
        let mut state = org.lock();
        if let Some((_, default, heads)) = state.repos.iter_mut().find(|(n, _, _)| n == "app-a") {
            heads.clear();
            heads.insert("main".to_string(), "app-a-main-sha".to_string());
            *default = "main".to_string();
        }
    }

    let report = run(&client(&org), &config(), None)
        .await
        .expect("warnings are not fatal");

    let app_a = &report.repositories[0];
    let primary = app_a
        .steps
        .iter()
        .find(|s| s.step == Step::ProtectPrimary)
        .expect("primary protection step recorded");
    assert_eq!(primary.status, StepStatus::Warning);
    assert_eq!(
        app_a.steps.last().map(|s| (s.step, s.status)),
        Some((Step::Toggles, StepStatus::Applied))
    );
    assert!(!report.repositories[1].has_warnings());
    assert_eq!(report.summary().with_warnings, 1);
}
