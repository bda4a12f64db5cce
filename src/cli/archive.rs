//! The archive command

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::archive::{ArchiveReport, Archiver, GitMirror, ItemState, Selection};
use crate::fetcher::config::{DEFAULT_MAX_RETRIES, GITHUB_API_URL, GITHUB_CLONE_URL};
use crate::fetcher::{ClientConfig, GithubHttpClient};
use crate::output::ArchiveLayout;
use crate::repo::RepoRef;
use crate::shutdown::SharedShutdown;

use super::CliError;

/// Archive a GitHub repository: git history, wiki, issues, pull requests,
/// releases and other metadata
///
/// Re-running against the same output directory resumes: finished items are
/// skipped and failed ones are retried.
#[derive(Parser, Debug, Clone)]
#[command(name = "gitspoke", about, long_about = None, version)]
pub struct Cli {
    /// Repository URL, e.g. https://github.com/owner/repo
    pub url: String,

    /// GitHub API token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Archive anonymously, ignoring any token
    #[arg(long, default_value_t = false)]
    pub no_login: bool,

    /// Output directory (default: ./<owner>/<repo>)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Comma-separated items to archive, or "all"
    #[arg(long, default_value = "all")]
    pub include: Selection,

    /// Log level used when RUST_LOG is not set
    #[arg(
        long,
        default_value = "info",
        ignore_case = true,
        value_parser = ["trace", "debug", "info", "warn", "error"]
    )]
    pub log_level: String,

    /// Maximum attempts per request while rate limited (range: 1-20)
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES, value_parser = clap::value_parser!(u32).range(1..=20))]
    pub max_retries: u32,

    /// Longest single rate-limit wait, in seconds
    #[arg(long, default_value_t = 3600)]
    pub max_wait: u64,

    /// GitHub REST API base URL
    #[arg(long, default_value = GITHUB_API_URL)]
    pub api_url: String,

    /// Base URL git repositories are cloned from
    #[arg(long, default_value = GITHUB_CLONE_URL)]
    pub clone_url: String,

    /// Serve Prometheus metrics on this address
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,
}

impl Cli {
    /// Token to use, honouring `--no-login`
    pub fn effective_token(&self) -> Option<String> {
        if self.no_login {
            return None;
        }
        self.token.clone().filter(|t| !t.trim().is_empty())
    }

    /// Archive directory for `repo`
    pub fn output_dir(&self, repo: &RepoRef) -> PathBuf {
        match &self.output {
            Some(dir) => dir.clone(),
            None => PathBuf::from(repo.owner()).join(repo.name()),
        }
    }

    /// Transport configuration from the flags
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::default()
            .with_api_url(self.api_url.as_str())
            .with_token(self.effective_token())
            .with_max_retries(self.max_retries)
            .with_max_wait(Duration::from_secs(self.max_wait))
    }

    /// Run the archive
    ///
    /// Succeeds only when every processed item ended in a terminal state.
    pub async fn execute(&self, shutdown: SharedShutdown) -> Result<ArchiveReport, CliError> {
        let repo = RepoRef::parse(&self.url)?;
        let layout = ArchiveLayout::new(self.output_dir(&repo));

        if self.effective_token().is_none() {
            info!("No token configured, archiving anonymously (lower rate limits apply)");
        }

        let client = GithubHttpClient::new(self.client_config())?.with_shutdown(shutdown.clone());
        let mirror = GitMirror::new().with_secret(self.effective_token());
        let archiver = Archiver::new(client, Arc::new(mirror))
            .with_clone_base(self.clone_url.as_str())
            .with_shutdown(shutdown);

        info!(repo = %repo, output = %layout.root().display(), include = %self.include, "Starting archive");
        let report = archiver.archive(&repo, &layout, &self.include).await?;

        print_summary(&repo, &layout, &report);

        if report.was_interrupted() {
            return Err(CliError::Interrupted);
        }
        let failed = report.failed();
        if !failed.is_empty() {
            return Err(CliError::ItemsFailed(
                failed.into_iter().map(str::to_string).collect(),
            ));
        }
        Ok(report)
    }
}

fn print_summary(repo: &RepoRef, layout: &ArchiveLayout, report: &ArchiveReport) {
    println!("\nArchive of {repo} at {}", layout.root().display());
    for (name, state) in report.items() {
        match state {
            ItemState::Failed(_) => eprintln!("  {name:<20} {state}"),
            _ => println!("  {name:<20} {state}"),
        }
    }
    println!(
        "Succeeded: {}, skipped: {}, not found: {}, failed: {}",
        report.count("succeeded"),
        report.count("skipped"),
        report.count("not_found"),
        report.count("failed"),
    );
}
