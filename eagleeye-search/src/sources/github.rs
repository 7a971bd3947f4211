//! GitHub: issue and pull request search via the REST API.
//!
//! `GET /search/issues` covers both issues and pull requests; pull
//! requests are recognised by their `pull_request` member.

use async_trait::async_trait;
use serde_json::Value;

use super::fields::{person_name, records, scalar_field, str_field};
use crate::config::SearchConfig;
use crate::error::SourceError;
use crate::http;
use crate::source::SourceClient;
use crate::types::{NormalizedResult, SourceKind};

/// Default API base URL.
pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// GitHub issue/PR search adapter.
pub struct GitHubClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl GitHubClient {
    /// Create a client for the given personal access token.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn new(token: impl Into<String>, config: &SearchConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: http::build_client(config)?,
            token: token.into(),
            base_url: GITHUB_API_BASE.to_owned(),
        })
    }

    /// Set the base URL (useful for testing with mock servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }
}

#[async_trait]
impl SourceClient for GitHubClient {
    fn kind(&self) -> SourceKind {
        SourceKind::GitHub
    }

    async fn try_search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<NormalizedResult>, SourceError> {
        tracing::trace!(query, limit, "GitHub search");

        let per_page = limit.clamp(1, 100).to_string();
        let response = self
            .client
            .get(format!("{}/search/issues", self.base_url))
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .query(&[("q", query), ("per_page", per_page.as_str())])
            .send()
            .await?;
        let payload: Value = http::ensure_success(response).await?.json().await?;

        Ok(parse_github_payload(&payload, limit))
    }
}

/// Map a GitHub search payload into results.
pub(crate) fn parse_github_payload(payload: &Value, limit: usize) -> Vec<NormalizedResult> {
    let results: Vec<NormalizedResult> = records(payload)
        .into_iter()
        .filter_map(map_item)
        .take(limit)
        .collect();
    tracing::debug!(count = results.len(), "GitHub results parsed");
    results
}

/// Map one issue, pull request, or code search item.
pub(crate) fn map_item(item: &Value) -> Option<NormalizedResult> {
    if !item.is_object() {
        return None;
    }

    // Code search items have a path and a repository object instead of a title.
    let repo = repository_name(item);
    let title = match (str_field(item, "title"), scalar_field(item, "number"), &repo) {
        (Some(title), Some(number), Some(repo)) => format!("[{repo}#{number}] {title}"),
        (Some(title), _, _) => title.to_owned(),
        (None, _, Some(repo)) => match str_field(item, "path") {
            Some(path) => format!("{repo}/{path}"),
            None => repo.clone(),
        },
        (None, _, None) => str_field(item, "name").unwrap_or_default().to_owned(),
    };
    let kind = if item.get("pull_request").is_some() {
        Some("pull_request")
    } else if item.get("number").is_some() {
        Some("issue")
    } else if item.get("path").is_some() {
        Some("code")
    } else {
        None
    };

    Some(
        NormalizedResult::new(
            SourceKind::GitHub,
            title,
            str_field(item, "html_url").unwrap_or_default(),
            str_field(item, "body").unwrap_or_default(),
        )
        .with_author(person_name(item.get("user")))
        .with_timestamp(str_field(item, "created_at"))
        .with_extra_entry("state", str_field(item, "state"))
        .with_extra_entry("type", kind),
    )
}

/// `owner/repo` from `repository_url` or a nested `repository` object.
fn repository_name(item: &Value) -> Option<String> {
    if let Some(full_name) = item.get("repository").and_then(|r| str_field(r, "full_name")) {
        return Some(full_name.to_owned());
    }
    let url = str_field(item, "repository_url")?;
    let mut segments = url.trim_end_matches('/').rsplit('/');
    let repo = segments.next()?;
    let owner = segments.next()?;
    Some(format!("{owner}/{repo}"))
}
