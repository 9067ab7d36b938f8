//! Team resolution for the three reviewer roles.
//!
//! The organization's team list is fetched once per run. Each [`Role`] is then
//! bound to a team slug by trying an ordered list of [`MatchStrategy`] values
//! against the role's candidate spellings, stopping at the first hit. If any
//! role stays unbound the run must not touch a single repository, because
//! branch protection without the right reviewer teams silently
//! under-protects branches.

use std::fmt;

use thiserror::Error;

use crate::github::{GitHubClient, GitHubError, PAGE_SIZE, Team};
use crate::progress::{ProgressCallback, RunProgress, emit};

/// Logical reviewer role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Developer,
    Maintainer,
    Administrator,
}

impl Role {
    /// Every role, in resolution and reporting order.
    pub const ALL: [Role; 3] = [Role::Developer, Role::Maintainer, Role::Administrator];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Developer => "Developer",
            Role::Maintainer => "Maintainer",
            Role::Administrator => "Administrator",
        }
    }

    /// Built-in spellings tried after any configured override.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Role::Developer => &["Developer", "Developers", "Dev", "Devs"],
            Role::Maintainer => &["Maintainer", "Maintainers"],
            Role::Administrator => &["Administrator", "Administrators", "Admin", "Admins"],
        }
    }

    /// Repository permission granted to the role's team.
    pub fn repository_permission(self) -> &'static str {
        match self {
            Role::Developer => "push",
            Role::Maintainer => "maintain",
            Role::Administrator => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a candidate spelling is compared against a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Case-insensitive equality with the display name.
    Name,
    /// Case-insensitive equality with the slug.
    Slug,
}

impl MatchStrategy {
    /// Strategies in the order they are tried.
    pub const ORDER: [MatchStrategy; 2] = [MatchStrategy::Name, MatchStrategy::Slug];

    pub fn matches(self, team: &Team, candidate: &str) -> bool {
        match self {
            MatchStrategy::Name => team.name.eq_ignore_ascii_case(candidate),
            MatchStrategy::Slug => team.slug.eq_ignore_ascii_case(candidate),
        }
    }
}

/// Team names configured per role, tried before the built-in aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamOverrides {
    pub developer: Option<String>,
    pub maintainer: Option<String>,
    pub administrator: Option<String>,
}

impl TeamOverrides {
    pub fn get(&self, role: Role) -> Option<&str> {
        match role {
            Role::Developer => self.developer.as_deref(),
            Role::Maintainer => self.maintainer.as_deref(),
            Role::Administrator => self.administrator.as_deref(),
        }
    }

    /// Candidate spellings for a role: override first, then aliases.
    fn candidates(&self, role: Role) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        if let Some(name) = self.get(role).map(str::trim).filter(|n| !n.is_empty()) {
            out.push(name);
        }
        out.extend(role.aliases().iter().copied());
        out
    }
}

/// Resolved role → team slug mapping. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleBinding {
    developer: String,
    maintainer: String,
    administrator: String,
}

impl RoleBinding {
    pub fn slug(&self, role: Role) -> &str {
        match role {
            Role::Developer => &self.developer,
            Role::Maintainer => &self.maintainer,
            Role::Administrator => &self.administrator,
        }
    }

    /// Slugs for the given roles, in the given order.
    pub fn slugs(&self, roles: &[Role]) -> Vec<String> {
        roles.iter().map(|r| self.slug(*r).to_string()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, &str)> + '_ {
        Role::ALL.into_iter().map(move |r| (r, self.slug(r)))
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to list teams for {org}: {source}")]
    Fetch {
        org: String,
        #[source]
        source: GitHubError,
    },

    #[error("no team found for role(s): {}", join_roles(.missing))]
    Unresolved {
        missing: Vec<Role>,
        /// Every team the organization returned, for diagnosis.
        available: Vec<Team>,
    },
}

fn join_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// One-line description of a team: name, slug and parent if nested.
pub fn describe_team(team: &Team) -> String {
    match &team.parent {
        Some(parent) => format!("{} (slug: {}, parent: {})", team.name, team.slug, parent.slug),
        None => format!("{} (slug: {})", team.name, team.slug),
    }
}

/// Find the team for a role.
///
/// Strategies are the outer loop so a name match on any spelling beats a
/// slug match. Teams with an empty slug are never selected.
pub fn find_team<'a>(teams: &'a [Team], role: Role, overrides: &TeamOverrides) -> Option<&'a Team> {
    let candidates = overrides.candidates(role);
    for strategy in MatchStrategy::ORDER {
        for candidate in &candidates {
            if let Some(team) = teams
                .iter()
                .filter(|t| !t.slug.is_empty())
                .find(|t| strategy.matches(t, candidate))
            {
                tracing::debug!(
                    role = role.as_str(),
                    team = %team.slug,
                    strategy = ?strategy,
                    candidate = %candidate,
                    "Resolved role"
                );
                return Some(team);
            }
        }
    }
    None
}

/// Bind every role against an already-fetched team list.
pub fn bind_roles(teams: &[Team], overrides: &TeamOverrides) -> Result<RoleBinding, ResolveError> {
    let developer = find_team(teams, Role::Developer, overrides);
    let maintainer = find_team(teams, Role::Maintainer, overrides);
    let administrator = find_team(teams, Role::Administrator, overrides);

    match (developer, maintainer, administrator) {
        (Some(d), Some(m), Some(a)) => Ok(RoleBinding {
            developer: d.slug.clone(),
            maintainer: m.slug.clone(),
            administrator: a.slug.clone(),
        }),
        (d, m, a) => {
            let missing = [
                (Role::Developer, d.is_none()),
                (Role::Maintainer, m.is_none()),
                (Role::Administrator, a.is_none()),
            ]
            .into_iter()
            .filter_map(|(role, missing)| missing.then_some(role))
            .collect();
            Err(ResolveError::Unresolved {
                missing,
                available: teams.to_vec(),
            })
        }
    }
}

/// Fetch the organization's teams and bind the three roles.
pub async fn resolve_teams(
    client: &GitHubClient,
    org: &str,
    overrides: &TeamOverrides,
    on_progress: Option<&ProgressCallback>,
) -> Result<RoleBinding, ResolveError> {
    emit(
        on_progress,
        RunProgress::FetchingTeams {
            org: org.to_string(),
        },
    );

    let teams: Vec<Team> = client
        .list_paginated(
            &format!(
                "/orgs/{}/teams?per_page={}",
                urlencoding::encode(org),
                PAGE_SIZE
            ),
            "teams",
            on_progress,
        )
        .await
        .map_err(|source| ResolveError::Fetch {
            org: org.to_string(),
            source,
        })?;

    match bind_roles(&teams, overrides) {
        Ok(binding) => {
            emit(
                on_progress,
                RunProgress::TeamsResolved {
                    bindings: binding
                        .iter()
                        .map(|(role, slug)| (role, slug.to_string()))
                        .collect(),
                },
            );
            Ok(binding)
        }
        Err(ResolveError::Unresolved { missing, available }) => {
            emit(
                on_progress,
                RunProgress::TeamsUnresolved {
                    missing: missing.clone(),
                    available: available.clone(),
                },
            );
            Err(ResolveError::Unresolved { missing, available })
        }
        Err(other) => Err(other),
    }
}
