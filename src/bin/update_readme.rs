use std::path::PathBuf;

use anyhow::Result;
use chrono::{Datelike, Utc};
use clap::Parser;
use gh_housekeeping::config::Config;
use gh_housekeeping::fetch::{fetch_notable_contributions, fetch_stats};
use gh_housekeeping::github::GithubClient;
use gh_housekeeping::logging;
use gh_housekeeping::readme::update_readme;
use gh_housekeeping::render::Fragments;
use gh_housekeeping::stats::NotableOptions;
use tracing::info;

/// Refresh the stats, notable contributions and updated-date regions of a README.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// README to rewrite
    #[arg(long, default_value = "README.md")]
    readme: PathBuf,

    /// Account to report on (defaults to GITHUB_USERNAME / GITHUB_REPOSITORY_OWNER)
    #[arg(long)]
    username: Option<String>,

    /// Minimum stars for a repository to count as notable
    #[arg(long, default_value_t = NotableOptions::default().min_stars)]
    min_stars: u64,

    /// Maximum notable contributions listed
    #[arg(long, default_value_t = NotableOptions::default().limit)]
    limit: usize,

    /// Pages of merged pull requests to scan
    #[arg(long, default_value_t = NotableOptions::default().max_pages)]
    max_pages: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let args = Args::parse();
    let config = Config::from_env(args.username)?;
    let client = GithubClient::new(&config)?;
    let username = config.username.as_str();
    let today = Utc::now().date_naive();

    let stats = fetch_stats(&client, username, today.year()).await?;

    info!("Fetching notable contributions...");
    let options = NotableOptions {
        min_stars: args.min_stars,
        limit: args.limit,
        max_pages: args.max_pages,
    };
    let notable = fetch_notable_contributions(&client, username, &options).await?;
    info!("Found {} notable contributions", notable.len());

    let fragments = Fragments::render(&stats, &notable, today);
    if update_readme(&args.readme, &fragments)? {
        info!("{} updated successfully", args.readme.display());
    }

    Ok(())
}
