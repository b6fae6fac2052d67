use std::collections::HashSet;

use serde::Deserialize;

/// Aggregate account totals shown in the README.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub stars: u64,
    pub commits: u64,
    pub pull_requests: u64,
    pub issues: u64,
}

/// A popular repository outside the account that merged one of its PRs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contribution {
    /// `owner/name`
    pub repo: String,
    pub repo_url: String,
    pub stars: u64,
}

/// Limits for the notable-contributions scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotableOptions {
    pub min_stars: u64,
    pub limit: usize,
    pub max_pages: usize,
}

impl Default for NotableOptions {
    fn default() -> Self {
        Self {
            min_stars: 100,
            limit: 10,
            max_pages: 5,
        }
    }
}

/// Target repository of a merged pull request, as returned by GraphQL.
#[derive(Debug, Clone, Deserialize)]
pub struct PrRepository {
    #[serde(rename = "nameWithOwner")]
    pub name_with_owner: String,
    pub url: String,
    #[serde(rename = "stargazerCount")]
    pub stargazer_count: u64,
    pub owner: RepoOwner,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepoOwner {
    pub login: String,
}

/// Filters pull-request targets down to notable contributions.
///
/// Feed repositories newest PR first; the first sighting of a repository is
/// the one kept.
pub struct NotableCollector {
    username: String,
    min_stars: u64,
    seen: HashSet<String>,
    found: Vec<Contribution>,
}

impl NotableCollector {
    pub fn new(username: &str, min_stars: u64) -> Self {
        Self {
            username: username.to_lowercase(),
            min_stars,
            seen: HashSet::new(),
            found: Vec::new(),
        }
    }

    /// Record `repo` if it qualifies. Returns whether it was kept.
    pub fn offer(&mut self, repo: &PrRepository) -> bool {
        // Logins are case-insensitive on GitHub.
        if repo.owner.login.to_lowercase() == self.username {
            return false;
        }
        if repo.stargazer_count < self.min_stars {
            return false;
        }
        if !self.seen.insert(repo.name_with_owner.clone()) {
            return false;
        }

        self.found.push(Contribution {
            repo: repo.name_with_owner.clone(),
            repo_url: repo.url.clone(),
            stars: repo.stargazer_count,
        });
        true
    }

    /// Most-starred first, at most `limit` entries.
    pub fn finish(mut self, limit: usize) -> Vec<Contribution> {
        self.found.sort_by(|a, b| b.stars.cmp(&a.stars));
        self.found.truncate(limit);
        self.found
    }
}
