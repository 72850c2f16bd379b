//! Remote-repository adapter backed by the GitHub REST API.
//!
//! List-style calls report an HTTP error status as [`Listing::Error`] instead
//! of failing, so one unreachable listing does not abort a whole plan.
//! Single-object calls propagate failures. Listings follow `Link: rel="next"`
//! until the last page.

use std::time::Duration;

use anyhow::{Context, anyhow};
use reqwest::StatusCode;
use reqwest::blocking::{Client, ClientBuilder, Response};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, LINK};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::core::types::ReviewComment;
use crate::error::Result;
use crate::io::config::{GITHUB_TOKEN_VAR, Settings, missing_credential};

const USER_AGENT: &str = concat!("devmate/", env!("CARGO_PKG_VERSION"));
const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// Outcome of a list-style remote call.
#[derive(Debug, Clone, PartialEq)]
pub enum Listing<T> {
    Items(Vec<T>),
    /// `"GitHub error <status>: <message>"`.
    Error(String),
}

/// Open pull request as listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullSummary {
    pub number: u64,
    pub title: String,
    pub author: Option<String>,
    pub url: String,
}

/// Single pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullDetail {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub author: Option<String>,
}

/// Review comment as returned by `github_get_pr_comments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullComment {
    pub path: Option<String>,
    pub body: Option<String>,
    pub author: Option<String>,
}

/// Remote-repository operations used by the executor.
pub trait RemoteRepo {
    fn list_open_prs(&self, repo: &str) -> Result<Listing<PullSummary>>;
    fn get_pr(&self, repo: &str, number: u64) -> Result<PullDetail>;
    fn get_pr_comments(&self, repo: &str, number: u64) -> Result<Vec<PullComment>>;
    fn list_review_comments(&self, repo: &str, number: u64) -> Result<Listing<ReviewComment>>;
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct ApiPull {
    number: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    user: Option<ApiUser>,
    #[serde(default)]
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct ApiReviewComment {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    line: Option<u64>,
    #[serde(default)]
    user: Option<ApiUser>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl From<ApiPull> for PullSummary {
    fn from(pull: ApiPull) -> Self {
        Self {
            number: pull.number,
            title: pull.title,
            author: pull.user.map(|u| u.login),
            url: pull.html_url,
        }
    }
}

impl From<ApiPull> for PullDetail {
    fn from(pull: ApiPull) -> Self {
        Self {
            number: pull.number,
            title: pull.title,
            body: pull.body,
            author: pull.user.map(|u| u.login),
        }
    }
}

impl From<ApiReviewComment> for PullComment {
    fn from(c: ApiReviewComment) -> Self {
        Self {
            path: c.path,
            body: c.body,
            author: c.user.map(|u| u.login),
        }
    }
}

impl From<ApiReviewComment> for ReviewComment {
    fn from(c: ApiReviewComment) -> Self {
        Self {
            id: c.id,
            path: c.path,
            body: c.body,
            line: c.line,
        }
    }
}

/// Blocking GitHub REST client.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: Client,
    api_base: String,
    per_page: u32,
    token: Option<String>,
}

impl GithubClient {
    /// Build a client from settings. A missing token only fails when a call is made.
    pub fn new(settings: &Settings) -> Result<Self> {
        Self::with_builder(settings, Client::builder())
    }

    fn with_builder(settings: &Settings, builder: ClientBuilder) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));
        let mut builder = builder
            .user_agent(USER_AGENT)
            .default_headers(headers);
        builder = match settings.config.github.timeout_secs {
            Some(secs) => builder.timeout(Duration::from_secs(secs)),
            None => builder.timeout(None::<Duration>),
        };
        let http = builder.build().context("build github http client")?;
        Ok(Self {
            http,
            api_base: settings.config.github.api_base.trim_end_matches('/').to_string(),
            per_page: settings.config.github.per_page,
            token: settings.credentials.github_token.clone(),
        })
    }

    fn token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .ok_or_else(|| missing_credential(GITHUB_TOKEN_VAR))
    }

    #[instrument(skip(self))]
    fn get_url(&self, url: &str) -> Result<Response> {
        let token = self.token()?;
        debug!("github request");
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .with_context(|| format!("GET {url}"))?;
        Ok(response)
    }

    fn get(&self, path: &str) -> Result<Response> {
        self.get_url(&format!("{}{}", self.api_base, path))
    }

    /// Fetch every page of a list endpoint. An error status on any page ends
    /// the walk with its formatted message.
    fn get_pages<A: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<std::result::Result<Vec<A>, String>> {
        let mut url = format!("{}{}", self.api_base, path);
        let mut items = Vec::new();
        let mut pages = 0usize;
        loop {
            let response = self.get_url(&url)?;
            let status = response.status();
            if !status.is_success() {
                let message = api_error_message(status, &response.text().unwrap_or_default());
                warn!(%status, %url, "github list failed");
                return Ok(Err(message));
            }
            let next = next_link(response.headers());
            let page: Vec<A> = response
                .json()
                .with_context(|| format!("decode github response for {url}"))?;
            items.extend(page);
            pages += 1;
            match next {
                Some(next) => url = next,
                None => break,
            }
        }
        debug!(pages, items = items.len(), path, "github listing fetched");
        Ok(Ok(items))
    }

    fn get_list<A, T>(&self, path: &str) -> Result<Listing<T>>
    where
        A: DeserializeOwned,
        T: From<A>,
    {
        Ok(match self.get_pages::<A>(path)? {
            Ok(items) => Listing::Items(items.into_iter().map(T::from).collect()),
            Err(message) => Listing::Error(message),
        })
    }

    fn get_checked<A: DeserializeOwned>(&self, path: &str) -> Result<A> {
        let response = self.get(path)?;
        let status = response.status();
        if !status.is_success() {
            let message = api_error_message(status, &response.text().unwrap_or_default());
            return Err(anyhow!(message).into());
        }
        let value = response
            .json()
            .with_context(|| format!("decode github response for {path}"))?;
        Ok(value)
    }
}

impl RemoteRepo for GithubClient {
    fn list_open_prs(&self, repo: &str) -> Result<Listing<PullSummary>> {
        let path = format!("/repos/{repo}/pulls?state=open&per_page={}", self.per_page);
        self.get_list::<ApiPull, PullSummary>(&path)
    }

    fn get_pr(&self, repo: &str, number: u64) -> Result<PullDetail> {
        let pull: ApiPull = self.get_checked(&format!("/repos/{repo}/pulls/{number}"))?;
        Ok(pull.into())
    }

    fn get_pr_comments(&self, repo: &str, number: u64) -> Result<Vec<PullComment>> {
        let path = format!(
            "/repos/{repo}/pulls/{number}/comments?per_page={}",
            self.per_page
        );
        let comments = self
            .get_pages::<ApiReviewComment>(&path)?
            .map_err(|message| anyhow!(message))?;
        Ok(comments.into_iter().map(PullComment::from).collect())
    }

    fn list_review_comments(&self, repo: &str, number: u64) -> Result<Listing<ReviewComment>> {
        let path = format!(
            "/repos/{repo}/pulls/{number}/comments?per_page={}",
            self.per_page
        );
        self.get_list::<ApiReviewComment, ReviewComment>(&path)
    }
}

/// Target of the `rel="next"` entry in a `Link` header, if any.
fn next_link(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(LINK)?.to_str().ok()?;
    value.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts
            .next()?
            .trim()
            .strip_prefix('<')?
            .strip_suffix('>')?;
        let is_next = parts.any(|param| {
            param
                .trim()
                .strip_prefix("rel=")
                .is_some_and(|rel| rel.trim_matches('"').split_whitespace().any(|r| r == "next"))
        });
        is_next.then(|| target.to_string())
    })
}

/// Format an API failure as `GitHub error <status>: <message>`.
fn api_error_message(status: StatusCode, body: &str) -> String {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });
    format!("GitHub error {}: {}", status.as_u16(), message)
}
