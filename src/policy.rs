use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::github::GithubApi;

pub const FORK_PREFIX: &str = "fork-";
const PER_PAGE: usize = 100;

/// A repository as listed by the REST API.
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    pub owner: Owner,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub archived: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Owner {
    pub login: String,
}

impl Repository {
    pub fn new(owner: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            owner: Owner {
                login: owner.to_string(),
            },
            fork: false,
            archived: false,
        }
    }

    /// `owner/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner.login, self.name)
    }

    /// REST path of this repository, addressed by the owner the listing reported.
    fn api_path(&self) -> String {
        format!("/repos/{}", self.full_name())
    }
}

/// Which repository listing to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListScope {
    /// Every repository the token's account owns, private ones included.
    #[default]
    Authenticated,
    /// Only the public repositories of the named account.
    Public,
}

impl ListScope {
    fn path(self, username: &str, page: usize) -> String {
        match self {
            ListScope::Authenticated => {
                format!("/user/repos?affiliation=owner&per_page={PER_PAGE}&page={page}")
            }
            ListScope::Public => {
                format!("/users/{username}/repos?type=owner&per_page={PER_PAGE}&page={page}")
            }
        }
    }
}

/// One repository setting enforced on every candidate repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    DisableWiki,
    DisableProjects,
    DisableDiscussions,
    RebaseOnly,
}

impl Policy {
    pub const ALL: [Policy; 4] = [
        Policy::DisableWiki,
        Policy::DisableProjects,
        Policy::DisableDiscussions,
        Policy::RebaseOnly,
    ];

    /// `PATCH /repos/{owner}/{repo}` body that enforces this policy.
    pub fn body(self) -> Value {
        match self {
            Policy::DisableWiki => json!({ "has_wiki": false }),
            Policy::DisableProjects => json!({ "has_projects": false }),
            Policy::DisableDiscussions => json!({ "has_discussions": false }),
            Policy::RebaseOnly => json!({
                "allow_merge_commit": false,
                "allow_squash_merge": false,
                "allow_rebase_merge": true,
            }),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Policy::DisableWiki => "wiki disabled",
            Policy::DisableProjects => "projects disabled",
            Policy::DisableDiscussions => "discussions disabled",
            Policy::RebaseOnly => "merge method set to rebase only",
        }
    }
}

/// Applies repository policies for one account.
pub struct PolicySetter<'a, A: GithubApi> {
    api: &'a A,
    username: &'a str,
    scope: ListScope,
}

impl<'a, A: GithubApi> PolicySetter<'a, A> {
    pub fn new(api: &'a A, username: &'a str, scope: ListScope) -> Self {
        Self {
            api,
            username,
            scope,
        }
    }

    /// Every repository in the listing, all pages.
    pub async fn list_all(&self) -> Result<Vec<Repository>> {
        let mut out = Vec::new();

        for page in 1.. {
            let json = self.api.get_json(&self.scope.path(self.username, page)).await?;
            let batch: Vec<Repository> = serde_json::from_value(json)
                .context("Failed to deserialize repository listing")?;
            let len = batch.len();
            out.extend(batch);
            if len < PER_PAGE {
                break;
            }
        }

        Ok(out)
    }

    /// Non-fork, non-archived repositories.
    pub async fn list_repositories(&self) -> Result<Vec<Repository>> {
        info!("Listing repositories for {}", self.username);
        let repos = self.list_all().await?;
        Ok(repos
            .into_iter()
            .filter(|r| !r.fork && !r.archived)
            .collect())
    }

    pub async fn list_forks(&self) -> Result<Vec<Repository>> {
        info!("Listing forked repositories for {}", self.username);
        let repos = self.list_all().await?;
        Ok(repos.into_iter().filter(|r| r.fork).collect())
    }

    pub async fn apply(&self, repo: &Repository, policy: Policy) -> Result<()> {
        let full_name = repo.full_name();
        info!("[{full_name}] applying {policy:?}");
        self.api
            .patch_json(&repo.api_path(), &policy.body())
            .await
            .with_context(|| format!("[{full_name}] failed to apply {policy:?}"))?;
        info!("[{full_name}] {}", policy.describe());
        Ok(())
    }

    /// Apply every policy to `repo`, stopping at the first failure.
    pub async fn apply_all(&self, repo: &Repository) -> Result<()> {
        for policy in Policy::ALL {
            self.apply(repo, policy).await?;
        }
        Ok(())
    }

    pub async fn rename(&self, repo: &Repository, new_name: &str) -> Result<()> {
        let full_name = repo.full_name();
        if new_name.is_empty() || new_name.contains('/') {
            bail!("[{full_name}] invalid repository name {new_name:?}");
        }
        info!("[{full_name}] Renaming to {new_name}");
        self.api
            .patch_json(&repo.api_path(), &json!({ "name": new_name }))
            .await
            .with_context(|| format!("[{full_name}] failed to rename to {new_name}"))?;
        info!("[{full_name}] Renamed to {new_name}");
        Ok(())
    }

    /// Give a fork the `fork-` prefix. Returns whether a rename happened.
    pub async fn set_fork_name(&self, repo: &Repository) -> Result<bool> {
        if repo.name.starts_with(FORK_PREFIX) {
            warn!(
                "[{}] Already has '{FORK_PREFIX}' prefix, skipping",
                repo.full_name()
            );
            return Ok(false);
        }
        self.rename(repo, &format!("{FORK_PREFIX}{}", repo.name)).await?;
        Ok(true)
    }

    /// The whole run: enforce policies on candidates, then rename forks.
    pub async fn run(&self) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for repo in self.list_repositories().await? {
            self.apply_all(&repo).await?;
            summary.configured += 1;
        }

        for fork in self.list_forks().await? {
            if self.set_fork_name(&fork).await? {
                summary.renamed += 1;
            } else {
                summary.skipped_forks += 1;
            }
        }

        Ok(summary)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub configured: usize,
    pub renamed: usize,
    pub skipped_forks: usize,
}
