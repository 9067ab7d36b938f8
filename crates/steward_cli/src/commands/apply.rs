use std::sync::Arc;

use console::style;
use steward::{GitHubClient, RetryConfig, RunConfig};

use crate::ApplyOptions;
use crate::config::Config;
use crate::progress::ProgressReporter;

/// API endpoint from `--api-url`, else from config.
pub(crate) fn resolve_api_url(opts: &ApplyOptions, config: &Config) -> String {
    opts.api_url
        .clone()
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| config.api_url())
}

/// Merge CLI flags over configured policy defaults.
pub(crate) fn build_run_config(opts: &ApplyOptions, config: &Config) -> RunConfig {
    let mut run_config = RunConfig::new(&opts.org, &opts.prefix, &opts.bot);

    run_config.bot_permission = config.policy.bot_permission.clone();
    run_config.required_check = opts
        .required_check
        .clone()
        .or_else(|| config.policy.required_check.clone());
    run_config.primary.branch = config.policy.primary_branch.clone();
    run_config.primary.required_approvals = config.policy.primary_approvals;
    run_config.secondary.branch = config.policy.secondary_branch.clone();
    run_config.secondary.required_approvals = config.policy.secondary_approvals;
    run_config.team_overrides = config.team_overrides();
    run_config.protection_retry = RetryConfig::with_retries(
        opts.protection_retries
            .unwrap_or(config.policy.protection_retries),
    );
    run_config.dry_run = opts.dry_run;

    run_config
}

pub(crate) async fn handle_apply(
    opts: ApplyOptions,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let token = config.github_token()?;
    let client = GitHubClient::new(&resolve_api_url(&opts, config), &token)?;
    let run_config = build_run_config(&opts, config);

    let reporter = Arc::new(ProgressReporter::new());
    if reporter.is_interactive() {
        println!(
            "Applying policy to {}/{}*{}\n",
            style(&run_config.org).cyan().bold(),
            style(&run_config.prefix).cyan(),
            if run_config.dry_run {
                style(" (dry run)").yellow().to_string()
            } else {
                String::new()
            }
        );
    } else {
        tracing::info!(
            org = %run_config.org,
            prefix = %run_config.prefix,
            api_url = %client.api_url(),
            dry_run = run_config.dry_run,
            "Applying policy"
        );
    }

    let callback = reporter.as_callback();
    let result = steward::run(&client, &run_config, Some(&callback)).await;
    reporter.finish();

    result?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> ApplyOptions {
        ApplyOptions {
            org: "acme".to_string(),
            prefix: "app-".to_string(),
            bot: "ci-bot".to_string(),
            api_url: None,
            required_check: None,
            dry_run: false,
            protection_retries: None,
        }
    }

    #[test]
    fn defaults_come_from_config() {
        let config = Config::default();
        let run_config = build_run_config(&opts(), &config);

        assert_eq!(run_config.org, "acme");
        assert_eq!(run_config.bot_permission, "maintain");
        assert_eq!(run_config.primary.branch, "master");
        assert_eq!(run_config.primary.required_approvals, 2);
        assert_eq!(run_config.secondary.branch, "development");
        assert_eq!(run_config.secondary.required_approvals, 1);
        assert_eq!(run_config.protection_retry.max_retries, 0);
        assert!(run_config.required_check.is_none());
        assert!(run_config.validate().is_ok());
    }

    #[test]
    fn flags_override_config() {
        let mut config = Config::default();
        config.policy.required_check = Some("from-config".to_string());
        config.policy.protection_retries = 1;

        let mut opts = opts();
        opts.required_check = Some("ci/build".to_string());
        opts.protection_retries = Some(3);
        opts.dry_run = true;

        let run_config = build_run_config(&opts, &config);

        assert_eq!(run_config.required_check, Some("ci/build".to_string()));
        assert_eq!(run_config.protection_retry.max_retries, 3);
        assert!(run_config.dry_run);
    }

    #[test]
    fn configured_check_applies_without_flag() {
        let mut config = Config::default();
        config.policy.required_check = Some("from-config".to_string());

        let run_config = build_run_config(&opts(), &config);
        assert_eq!(run_config.required_check, Some("from-config".to_string()));
    }

    #[test]
    fn api_url_flag_overrides_config() {
        let mut config = Config::default();
        config.github.api_url = Some("https://github.example.com/api/v3".to_string());
        assert_eq!(resolve_api_url(&opts(), &config), "https://github.example.com/api/v3");

        let mut opts = opts();
        opts.api_url = Some("https://ghe.test/api/v3".to_string());
        assert_eq!(resolve_api_url(&opts, &config), "https://ghe.test/api/v3");
    }

    #[test]
    fn api_url_defaults_to_public_endpoint() {
        assert_eq!(
            resolve_api_url(&opts(), &Config::default()),
            steward::DEFAULT_API_URL
        );
    }
}
