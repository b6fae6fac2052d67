use anyhow::Result;
use clap::Parser;
use gh_housekeeping::config::Config;
use gh_housekeeping::github::GithubClient;
use gh_housekeeping::logging;
use gh_housekeeping::policy::{ListScope, PolicySetter};
use tracing::info;

/// Enforce repository settings across an account and prefix forks with `fork-`.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Account to manage (defaults to GITHUB_USERNAME / GITHUB_REPOSITORY_OWNER)
    #[arg(long)]
    username: Option<String>,

    /// Only touch the account's public repositories
    #[arg(long)]
    public_only: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let args = Args::parse();
    let config = Config::from_env(args.username)?;
    let client = GithubClient::new(&config)?;

    let scope = if args.public_only {
        ListScope::Public
    } else {
        ListScope::Authenticated
    };

    let summary = PolicySetter::new(&client, &config.username, scope)
        .run()
        .await?;

    info!(
        configured = summary.configured,
        renamed = summary.renamed,
        skipped = summary.skipped_forks,
        "Policies applied"
    );
    Ok(())
}
