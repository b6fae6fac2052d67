//! Runtime configuration, read from the environment.
//!
//! Both binaries call [`Config::from_env`] after loading an optional `.env`
//! file. The lookup order mirrors the variable names GitHub Actions exposes,
//! so the tools run unchanged inside a workflow.

use anyhow::{Context, Result, bail};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const TOKEN_VARS: &[&str] = &["GITHUB_TOKEN", "GH_TOKEN", "ACCESS_TOKEN"];
const USERNAME_VARS: &[&str] = &["GITHUB_USERNAME", "GITHUB_REPOSITORY_OWNER"];

#[derive(Clone)]
pub struct Config {
    pub token: String,
    pub username: String,
    pub api_url: String,
}

impl Config {
    /// Load configuration from process environment variables.
    ///
    /// `username` overrides the environment when given (the `--username` flag).
    pub fn from_env(username: Option<String>) -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), username)
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F, username: Option<String>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| {
            keys.iter()
                .filter_map(|k| lookup(*k))
                .find(|v| !v.trim().is_empty())
        };

        let token = first(TOKEN_VARS)
            .with_context(|| format!("no API token set (tried {})", TOKEN_VARS.join(", ")))?;

        let username = match username.filter(|u| !u.trim().is_empty()) {
            Some(u) => u,
            None => first(USERNAME_VARS).with_context(|| {
                format!("no account username set (tried {})", USERNAME_VARS.join(", "))
            })?,
        };
        if username.contains('/') {
            bail!("invalid GitHub username {username:?}");
        }

        let api_url = lookup("GITHUB_API_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Ok(Self {
            token,
            username,
            api_url,
        })
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("username", &self.username)
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}
