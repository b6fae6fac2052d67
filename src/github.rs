use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

const USER_AGENT: &str = "gh-housekeeping";
const API_VERSION: &str = "2022-11-28";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Every way a GitHub call can fail. All of them are fatal to a run.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error calling GitHub: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("GitHub API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("GraphQL reported errors: {0}")]
    GraphQl(String),

    #[error("GraphQL response carried no `data` object")]
    MissingData,

    #[error("failed to parse JSON from GitHub: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The three calls the tools need from GitHub.
///
/// Everything above the transport takes `&impl GithubApi`, so tests can swap
/// in a recording fake instead of talking to the network.
#[async_trait]
pub trait GithubApi: Send + Sync {
    /// `GET` a REST path (including any query string) and return the JSON body.
    async fn get_json(&self, path: &str) -> Result<Value, ApiError>;

    /// `PATCH` a REST path with a JSON body.
    async fn patch_json(&self, path: &str, body: &Value) -> Result<Value, ApiError>;

    /// Run a GraphQL query and return its `data` object.
    async fn graphql(&self, query: &str, variables: Value) -> Result<Value, ApiError>;
}

#[derive(Clone)]
pub struct GithubClient {
    token: Arc<String>,
    base_url: Arc<String>,
    http: Arc<Client>,
}

impl GithubClient {
    /// Build a client for the API and token named in `config`.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            token: Arc::new(config.token.clone()),
            base_url: Arc::new(config.api_url.trim_end_matches('/').to_string()),
            http: Arc::new(http),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Read a REST response, failing on any non-2xx status.
async fn rest_body(resp: Response) -> Result<Value, ApiError> {
    let status = resp.status();
    let text = resp.text().await?;

    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            body: text,
        });
    }

    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text)?)
}

#[async_trait]
impl GithubApi for GithubClient {
    async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        debug!(path, "GET");
        let resp = self
            .http
            .get(self.url(path))
            .bearer_auth(&*self.token)
            .send()
            .await?;
        rest_body(resp).await
    }

    async fn patch_json(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        debug!(path, "PATCH");
        let resp = self
            .http
            .patch(self.url(path))
            .bearer_auth(&*self.token)
            .json(body)
            .send()
            .await?;
        rest_body(resp).await
    }

    async fn graphql(&self, query: &str, variables: Value) -> Result<Value, ApiError> {
        debug!("POST /graphql");
        let resp = self
            .http
            .post(self.url("/graphql"))
            .bearer_auth(&*self.token)
            .json(&serde_json::json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        // Parse even non-2xx bodies so GraphQL error payloads are reported.
        let json: Option<Value> = serde_json::from_str(&text).ok();

        if let Some(errors) = json.as_ref().and_then(|j| j.get("errors")) {
            return Err(ApiError::GraphQl(format!("{errors:#}")));
        }

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let mut json = match json {
            Some(json) => json,
            None => serde_json::from_str::<Value>(&text)?,
        };
        match json.get_mut("data").map(Value::take) {
            Some(data) if !data.is_null() => Ok(data),
            _ => Err(ApiError::MissingData),
        }
    }
}
