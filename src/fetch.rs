use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::github::GithubApi;
use crate::stats::{Contribution, NotableCollector, NotableOptions, PrRepository, Stats};
use crate::years::{contribution_years, year_of, year_window};

#[derive(Deserialize)]
struct UserData<T> {
    user: Option<T>,
}

#[derive(Deserialize)]
struct CountObj {
    #[serde(rename = "totalCount")]
    total_count: u64,
}

#[derive(Deserialize)]
struct PageInfo {
    #[serde(rename = "hasNextPage")]
    has_next_page: bool,
    #[serde(rename = "endCursor")]
    end_cursor: Option<String>,
}

impl PageInfo {
    /// Cursor for the following page, or `None` once the listing is exhausted.
    fn next_cursor(self) -> Result<Option<String>> {
        if !self.has_next_page {
            return Ok(None);
        }
        match self.end_cursor {
            Some(cursor) => Ok(Some(cursor)),
            None => bail!("GitHub reported another page but no cursor"),
        }
    }
}

/// Unwrap `data.user` from a GraphQL response into `T`.
fn user_field<T: DeserializeOwned>(data: Value, username: &str, what: &str) -> Result<T> {
    let parsed: UserData<T> = serde_json::from_value(data)
        .with_context(|| format!("Failed to deserialize {what} response"))?;
    parsed
        .user
        .ok_or_else(|| anyhow!("GitHub user {username:?} not found"))
}

const STARS_QUERY: &str = r#"
query($login: String!, $cursor: String) {
  user(login: $login) {
    repositories(ownerAffiliations: OWNER, isFork: false, first: 100, after: $cursor) {
      nodes { stargazerCount }
      pageInfo { hasNextPage endCursor }
    }
  }
}
"#;

/// Total stargazers across every owned, non-fork repository.
pub async fn fetch_stars(api: &impl GithubApi, username: &str) -> Result<u64> {
    #[derive(Deserialize)]
    struct StarUser {
        repositories: StarRepos,
    }
    #[derive(Deserialize)]
    struct StarRepos {
        nodes: Vec<Option<StarNode>>,
        #[serde(rename = "pageInfo")]
        page_info: PageInfo,
    }
    #[derive(Deserialize)]
    struct StarNode {
        #[serde(rename = "stargazerCount")]
        stargazer_count: u64,
    }

    let mut total = 0u64;
    let mut cursor: Option<String> = None;

    loop {
        let data = api
            .graphql(STARS_QUERY, json!({ "login": username, "cursor": cursor }))
            .await?;
        let user: StarUser = user_field(data, username, "fetch_stars")?;
        let repos = user.repositories;

        let page: u64 = repos.nodes.iter().flatten().map(|n| n.stargazer_count).sum();
        debug!(page, "star page");
        total = total.saturating_add(page);

        match repos.page_info.next_cursor()? {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    Ok(total)
}

/// Year the account was created.
pub async fn fetch_account_year(api: &impl GithubApi, username: &str) -> Result<i32> {
    #[derive(Deserialize)]
    struct CreatedUser {
        #[serde(rename = "createdAt")]
        created_at: String,
    }

    let data = api
        .graphql(
            "query($login: String!) { user(login: $login) { createdAt } }",
            json!({ "login": username }),
        )
        .await?;
    let user: CreatedUser = user_field(data, username, "fetch_account_year")?;
    year_of(&user.created_at)
}

const COMMITS_QUERY: &str = r#"
query($login: String!, $from: DateTime!, $to: DateTime!) {
  user(login: $login) {
    contributionsCollection(from: $from, to: $to) {
      totalCommitContributions
      restrictedContributionsCount
    }
  }
}
"#;

/// Lifetime commit contributions, public and private, summed year by year
/// from account creation through `current_year`.
pub async fn fetch_commits(api: &impl GithubApi, username: &str, current_year: i32) -> Result<u64> {
    #[derive(Deserialize)]
    struct CommitsUser {
        #[serde(rename = "contributionsCollection")]
        contributions_collection: ContribCollection,
    }
    #[derive(Deserialize)]
    struct ContribCollection {
        #[serde(rename = "totalCommitContributions")]
        total_commit_contributions: u64,
        #[serde(rename = "restrictedContributionsCount")]
        restricted_contributions_count: u64,
    }

    let start_year = fetch_account_year(api, username).await?;
    let mut total = 0u64;

    for year in contribution_years(start_year, current_year) {
        let (from, to) = year_window(year);
        let data = api
            .graphql(
                COMMITS_QUERY,
                json!({ "login": username, "from": from, "to": to }),
            )
            .await?;
        let user: CommitsUser = user_field(data, username, "fetch_commits")?;
        let cc = user.contributions_collection;
        let year_total = cc
            .total_commit_contributions
            .saturating_add(cc.restricted_contributions_count);
        debug!(year, commits = year_total, "commit contributions");
        total = total.saturating_add(year_total);
    }

    Ok(total)
}

/// Total pull requests and issues opened by the account.
pub async fn fetch_activity(api: &impl GithubApi, username: &str) -> Result<(u64, u64)> {
    #[derive(Deserialize)]
    struct ActivityUser {
        #[serde(rename = "pullRequests")]
        pull_requests: CountObj,
        issues: CountObj,
    }

    let data = api
        .graphql(
            r#"
            query($login: String!) {
              user(login: $login) {
                pullRequests { totalCount }
                issues { totalCount }
              }
            }
            "#,
            json!({ "login": username }),
        )
        .await?;
    let user: ActivityUser = user_field(data, username, "fetch_activity")?;
    Ok((user.pull_requests.total_count, user.issues.total_count))
}

const NOTABLE_QUERY: &str = r#"
query($login: String!, $cursor: String) {
  user(login: $login) {
    pullRequests(
      states: MERGED
      first: 100
      after: $cursor
      orderBy: {field: CREATED_AT, direction: DESC}
    ) {
      pageInfo { hasNextPage endCursor }
      nodes {
        repository {
          nameWithOwner
          url
          stargazerCount
          owner { login }
        }
      }
    }
  }
}
"#;

/// Popular external repositories the account has merged PRs into.
pub async fn fetch_notable_contributions(
    api: &impl GithubApi,
    username: &str,
    options: &NotableOptions,
) -> Result<Vec<Contribution>> {
    #[derive(Deserialize)]
    struct PrUser {
        #[serde(rename = "pullRequests")]
        pull_requests: PrConnection,
    }
    #[derive(Deserialize)]
    struct PrConnection {
        #[serde(rename = "pageInfo")]
        page_info: PageInfo,
        nodes: Vec<Option<PrNode>>,
    }
    #[derive(Deserialize)]
    struct PrNode {
        repository: PrRepository,
    }

    let mut collector = NotableCollector::new(username, options.min_stars);
    let mut cursor: Option<String> = None;

    for page in 0..options.max_pages {
        let data = api
            .graphql(NOTABLE_QUERY, json!({ "login": username, "cursor": cursor }))
            .await?;
        let user: PrUser = user_field(data, username, "fetch_notable_contributions")?;
        let prs = user.pull_requests;

        let kept = prs
            .nodes
            .iter()
            .flatten()
            .filter(|pr| collector.offer(&pr.repository))
            .count();
        debug!(page, kept, "merged pull request page");

        match prs.page_info.next_cursor()? {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    Ok(collector.finish(options.limit))
}

/// Gather every README statistic for `username`.
pub async fn fetch_stats(api: &impl GithubApi, username: &str, current_year: i32) -> Result<Stats> {
    info!("Fetching stars...");
    let stars = fetch_stars(api, username).await?;
    info!(stars, "Stars");

    info!("Fetching commits...");
    let commits = fetch_commits(api, username, current_year).await?;
    info!(commits, "Commits");

    info!("Fetching PRs and issues...");
    let (pull_requests, issues) = fetch_activity(api, username).await?;
    info!(pull_requests, issues, "Activity");

    Ok(Stats {
        stars,
        commits,
        pull_requests,
        issues,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::fake::FakeGithub;

    fn star_page(stars: &[u64], has_next: bool, cursor: Option<&str>) -> Value {
        let nodes: Vec<Value> = stars.iter().map(|s| json!({ "stargazerCount": s })).collect();
        json!({
            "user": {
                "repositories": {
                    "nodes": nodes,
                    "pageInfo": { "hasNextPage": has_next, "endCursor": cursor }
                }
            }
        })
    }

    fn pr_page(repos: &[(&str, &str, u64)], has_next: bool, cursor: Option<&str>) -> Value {
        let nodes: Vec<Value> = repos
            .iter()
            .map(|(owner, name, stars)| {
                json!({
                    "repository": {
                        "nameWithOwner": format!("{owner}/{name}"),
                        "url": format!("https://github.com/{owner}/{name}"),
                        "stargazerCount": stars,
                        "owner": { "login": owner }
                    }
                })
            })
            .collect();
        json!({
            "user": {
                "pullRequests": {
                    "pageInfo": { "hasNextPage": has_next, "endCursor": cursor },
                    "nodes": nodes
                }
            }
        })
    }

    #[tokio::test]
    async fn stars_sum_across_pages() {
        let api = FakeGithub::new().with_graphql([
            star_page(&[10, 20], true, Some("c1")),
            star_page(&[5], true, Some("c2")),
            star_page(&[], false, None),
        ]);

        let total = fetch_stars(&api, "octocat").await.unwrap();

        assert_eq!(total, 35);
        let calls = api.graphql_calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0]["cursor"], Value::Null);
        assert_eq!(calls[1]["cursor"], "c1");
        assert_eq!(calls[2]["cursor"], "c2");
        assert_eq!(calls[0]["login"], "octocat");
    }

    #[tokio::test]
    async fn stars_tolerate_null_nodes() {
        let mut page = star_page(&[7], false, None);
        page["user"]["repositories"]["nodes"]
            .as_array_mut()
            .unwrap()
            .push(Value::Null);
        let api = FakeGithub::new().with_graphql([page]);

        assert_eq!(fetch_stars(&api, "octocat").await.unwrap(), 7);
    }

    #[tokio::test]
    async fn missing_cursor_with_more_pages_is_an_error() {
        let api = FakeGithub::new().with_graphql([star_page(&[1], true, None)]);
        assert!(fetch_stars(&api, "octocat").await.is_err());
    }

    #[tokio::test]
    async fn unknown_user_is_an_error() {
        let api = FakeGithub::new().with_graphql([json!({ "user": null })]);
        let err = fetch_stars(&api, "ghost").await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn commits_are_summed_per_calendar_year() {
        let year = |total: u64, restricted: u64| {
            json!({
                "user": {
                    "contributionsCollection": {
                        "totalCommitContributions": total,
                        "restrictedContributionsCount": restricted
                    }
                }
            })
        };
        let api = FakeGithub::new().with_graphql([
            json!({ "user": { "createdAt": "2022-05-01T10:00:00Z" } }),
            year(100, 10),
            year(200, 0),
            year(5, 5),
        ]);

        let total = fetch_commits(&api, "octocat", 2024).await.unwrap();

        assert_eq!(total, 320);
        let calls = api.graphql_calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[1]["from"], "2022-01-01T00:00:00Z");
        assert_eq!(calls[1]["to"], "2022-12-31T23:59:59Z");
        assert_eq!(calls[3]["from"], "2024-01-01T00:00:00Z");
    }

    #[tokio::test]
    async fn activity_reads_both_counts() {
        let api = FakeGithub::new().with_graphql([json!({
            "user": {
                "pullRequests": { "totalCount": 321 },
                "issues": { "totalCount": 45 }
            }
        })]);

        assert_eq!(fetch_activity(&api, "octocat").await.unwrap(), (321, 45));
    }

    #[tokio::test]
    async fn notable_contributions_filter_dedupe_and_sort() {
        let api = FakeGithub::new().with_graphql([pr_page(
            &[
                ("octocat", "dotfiles", 50),
                ("rust-lang", "cargo", 150),
                ("tokio-rs", "tokio", 300),
                ("rust-lang", "cargo", 150),
            ],
            false,
            None,
        )]);

        let found = fetch_notable_contributions(&api, "octocat", &NotableOptions::default())
            .await
            .unwrap();

        let names: Vec<&str> = found.iter().map(|c| c.repo.as_str()).collect();
        assert_eq!(names, vec!["tokio-rs/tokio", "rust-lang/cargo"]);
    }

    #[tokio::test]
    async fn notable_scan_stops_at_max_pages() {
        let api = FakeGithub::new().with_graphql([
            pr_page(&[("a", "one", 1000)], true, Some("p1")),
            pr_page(&[("b", "two", 2000)], true, Some("p2")),
            pr_page(&[("c", "three", 3000)], true, Some("p3")),
        ]);
        let options = NotableOptions {
            max_pages: 2,
            ..NotableOptions::default()
        };

        let found = fetch_notable_contributions(&api, "octocat", &options)
            .await
            .unwrap();

        assert_eq!(api.graphql_calls().len(), 2);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].repo, "b/two");
    }

    #[tokio::test]
    async fn notable_dedupes_across_pages() {
        let api = FakeGithub::new().with_graphql([
            pr_page(&[("a", "lib", 400)], true, Some("p1")),
            pr_page(&[("a", "lib", 400), ("b", "app", 150)], false, None),
        ]);

        let found = fetch_notable_contributions(&api, "octocat", &NotableOptions::default())
            .await
            .unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(api.graphql_calls()[1]["cursor"], "p1");
    }

    #[tokio::test]
    async fn fetch_stats_combines_all_queries() {
        let api = FakeGithub::new().with_graphql([
            star_page(&[1200], false, None),
            json!({ "user": { "createdAt": "2025-01-02T00:00:00Z" } }),
            json!({
                "user": {
                    "contributionsCollection": {
                        "totalCommitContributions": 42,
                        "restrictedContributionsCount": 8
                    }
                }
            }),
            json!({
                "user": {
                    "pullRequests": { "totalCount": 3 },
                    "issues": { "totalCount": 4 }
                }
            }),
        ]);

        let stats = fetch_stats(&api, "octocat", 2025).await.unwrap();

        assert_eq!(
            stats,
            Stats {
                stars: 1200,
                commits: 50,
                pull_requests: 3,
                issues: 4,
            }
        );
    }
}
