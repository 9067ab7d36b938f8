//! Configuration file support for steward.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `STEWARD_`, nested keys joined by `__`,
//!    e.g. `STEWARD_POLICY__PRIMARY_BRANCH`)
//! 3. Config file (./steward.toml, then ~/.config/steward/config.toml)
//! 4. Built-in defaults
//!
//! The API token is resolved separately: `STEWARD_GITHUB_TOKEN`, then
//! `GITHUB_TOKEN`, then `[github] token`. It is never accepted as a flag.
//!
//! Example config file:
//! ```toml
//! [github]
//! api_url = "https://github.example.com/api/v3"  # GitHub Enterprise Server
//! token = "ghp_..."  # or use STEWARD_GITHUB_TOKEN / GITHUB_TOKEN
//!
//! [policy]
//! primary_branch = "master"
//! secondary_branch = "development"
//! primary_approvals = 2
//! secondary_approvals = 1
//! bot_permission = "maintain"
//! required_check = "ci/build"
//! protection_retries = 0
//!
//! [teams]
//! maintainer = "Platform Leads"  # team name used for the Maintainer role
//! ```

use std::path::PathBuf;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;
use steward::{DEFAULT_API_URL, TeamOverrides};
use thiserror::Error;

/// Environment variables consulted for the API token, in order.
pub const TOKEN_ENV_VARS: [&str; 2] = ["STEWARD_GITHUB_TOKEN", "GITHUB_TOKEN"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("no GitHub token configured; set STEWARD_GITHUB_TOKEN or GITHUB_TOKEN")]
    MissingToken,
}

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub github: GitHubConfig,
    pub policy: PolicyConfig,
    /// Team names per role, tried before the built-in spellings.
    pub teams: TeamsConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// API base URL. Defaults to the public endpoint.
    pub api_url: Option<String>,
    pub token: Option<String>,
}

/// Policy defaults applied to every repository.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub primary_branch: String,
    pub secondary_branch: String,
    pub primary_approvals: u32,
    pub secondary_approvals: u32,
    pub bot_permission: String,
    pub required_check: Option<String>,
    /// Retries for transient protection failures; 0 means a single attempt.
    pub protection_retries: usize,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            primary_branch: "master".to_string(),
            secondary_branch: "development".to_string(),
            primary_approvals: 2,
            secondary_approvals: 1,
            bot_permission: steward::engine::DEFAULT_BOT_PERMISSION.to_string(),
            required_check: None,
            protection_retries: 0,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TeamsConfig {
    pub developer: Option<String>,
    pub maintainer: Option<String>,
    pub administrator: Option<String>,
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/steward/config.toml)
    /// 3. Local config file (./steward.toml)
    /// 4. Environment variables with the STEWARD_ prefix
    ///
    /// A malformed file or value is an error rather than a silent default,
    /// since a defaulted policy would still be applied.
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(xdg_config) = Self::default_config_path()
            && xdg_config.exists()
        {
            tracing::debug!("Loading config from {:?}", xdg_config);
            builder = builder.add_source(
                File::from(xdg_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let local_config = PathBuf::from("steward.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./steward.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // STEWARD_POLICY__REQUIRED_CHECK -> policy.required_check
        builder = builder.add_source(
            Environment::with_prefix("STEWARD")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize::<Config>()?)
    }

    /// API base URL, falling back to the public endpoint.
    pub fn api_url(&self) -> String {
        self.github
            .api_url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    /// Resolve the API token from the process environment, then the config file.
    pub fn github_token(&self) -> Result<String, ConfigError> {
        self.github_token_from(|name| std::env::var(name).ok())
    }

    /// Token resolution against an arbitrary environment lookup.
    pub fn github_token_from(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<String, ConfigError> {
        TOKEN_ENV_VARS
            .iter()
            .filter_map(|name| env(name))
            .chain(self.github.token.clone())
            .map(|t| t.trim().to_string())
            .find(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)
    }

    pub fn team_overrides(&self) -> TeamOverrides {
        TeamOverrides {
            developer: self.teams.developer.clone(),
            maintainer: self.teams.maintainer.clone(),
            administrator: self.teams.administrator.clone(),
        }
    }

    /// Get the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "steward").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
