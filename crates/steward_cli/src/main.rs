//! Steward CLI - apply repository policy across a GitHub organization.

mod commands;
mod config;
mod progress;

use clap::{Parser, Subcommand};
use console::Term;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "steward")]
#[command(version)]
#[command(about = "Organization-wide repository policy for GitHub")]
#[command(
    long_about = "Steward applies one policy to every repository of a GitHub organization \
whose name starts with a prefix: a secondary branch, a bot collaborator, role team \
access, branch protection and merge-strategy toggles. Every write is a full \
overwrite, so runs can be repeated safely."
)]
#[command(after_long_help = r#"EXAMPLES
    Apply the policy to every repository starting with "app-":
        $ steward apply --org acme --prefix app- --bot acme-ci

    Require a status check on protected branches:
        $ steward apply --org acme --prefix app- --bot acme-ci --required-check ci/build

    Preview without writing anything:
        $ steward apply --org acme --prefix app- --bot acme-ci --dry-run

    Generate shell completions:
        $ steward completions bash > ~/.local/share/bash-completion/completions/steward

CONFIGURATION
    Steward reads configuration from:
      1. ~/.config/steward/config.toml (or $XDG_CONFIG_HOME/steward/config.toml)
      2. ./steward.toml
      3. Environment variables (STEWARD_ prefix, e.g. STEWARD_POLICY__PRIMARY_BRANCH)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    STEWARD_GITHUB_TOKEN      GitHub token (checked first)
    GITHUB_TOKEN              GitHub token (fallback)
    RUST_LOG                  Log filter for non-interactive output
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply the policy to every matching repository
    Apply(ApplyOptions),
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

/// Options for a policy run.
#[derive(Debug, Clone, clap::Args)]
struct ApplyOptions {
    /// Organization to reconcile
    #[arg(short, long)]
    org: String,

    /// Literal, case-sensitive repository name prefix
    #[arg(short, long)]
    prefix: String,

    /// Bot account added as a collaborator and allowed to push
    #[arg(short, long)]
    bot: String,

    /// API base URL (default from config or https://api.github.com)
    #[arg(long)]
    api_url: Option<String>,

    /// Status check required on protected branches
    #[arg(short = 'c', long)]
    required_check: Option<String>,

    /// Dry run - show what would be done without making changes
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Retries for transient branch protection failures (default from config or 0)
    #[arg(long)]
    protection_retries: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Structured logging only when not attached to a terminal
    if !Term::stdout().is_term() {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("steward=info,steward_cli=info"),
        };

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Completions { shell } => {
            commands::meta::handle_completions(shell)?;
        }
        Commands::Apply(opts) => {
            let config = config::Config::load()?;
            commands::apply::handle_apply(opts, &config).await?;
        }
    }

    Ok(())
}
