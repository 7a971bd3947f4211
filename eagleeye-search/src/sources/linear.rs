//! Linear: issue search through the GraphQL API.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::fields::{person_name, records, str_field};
use crate::config::SearchConfig;
use crate::error::SourceError;
use crate::http;
use crate::source::SourceClient;
use crate::types::{NormalizedResult, SourceKind};

/// Default API base URL.
pub const LINEAR_API_BASE: &str = "https://api.linear.app";

const SEARCH_QUERY: &str = r"query SearchIssues($query: String!, $first: Int) {
  searchIssues(term: $query, first: $first) {
    nodes {
      id
      identifier
      title
      description
      url
      state { name }
      assignee { name }
      createdAt
    }
  }
}";

/// Linear issue search adapter.
pub struct LinearClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl LinearClient {
    /// Create a client for the given API key.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>, config: &SearchConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: http::build_client(config)?,
            api_key: api_key.into(),
            base_url: LINEAR_API_BASE.to_owned(),
        })
    }

    /// Set the base URL (useful for testing with mock servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }
}

#[async_trait]
impl SourceClient for LinearClient {
    fn kind(&self) -> SourceKind {
        SourceKind::Linear
    }

    async fn try_search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<NormalizedResult>, SourceError> {
        tracing::trace!(query, limit, "Linear search");

        let response = self
            .client
            .post(format!("{}/graphql", self.base_url))
            // Personal API keys are sent without a scheme.
            .header("Authorization", &self.api_key)
            .json(&json!({
                "query": SEARCH_QUERY,
                "variables": { "query": query, "first": limit },
            }))
            .send()
            .await?;
        let payload: Value = http::ensure_success(response).await?.json().await?;

        if let Some(message) = payload
            .get("errors")
            .and_then(Value::as_array)
            .and_then(|errors| errors.first())
            .and_then(|first| str_field(first, "message"))
        {
            return Err(SourceError::Status {
                status: 200,
                message: message.to_owned(),
            });
        }

        let nodes = payload
            .pointer("/data/searchIssues/nodes")
            .cloned()
            .unwrap_or(Value::Array(Vec::new()));
        Ok(parse_linear_issues(&nodes, limit))
    }
}

/// Map a list of Linear issue nodes into results.
pub(crate) fn parse_linear_issues(nodes: &Value, limit: usize) -> Vec<NormalizedResult> {
    let results: Vec<NormalizedResult> = records(nodes)
        .into_iter()
        .filter_map(map_issue)
        .take(limit)
        .collect();
    tracing::debug!(count = results.len(), "Linear results parsed");
    results
}

/// Map one Linear issue node.
pub(crate) fn map_issue(issue: &Value) -> Option<NormalizedResult> {
    if !issue.is_object() {
        return None;
    }
    let title = str_field(issue, "title").unwrap_or_default();
    let title = match str_field(issue, "identifier") {
        Some(identifier) => format!("[{identifier}] {title}"),
        None => title.to_owned(),
    };
    let status = issue.get("state").and_then(|state| str_field(state, "name"));

    Some(
        NormalizedResult::new(
            SourceKind::Linear,
            title,
            str_field(issue, "url").unwrap_or_default(),
            str_field(issue, "description").unwrap_or_default(),
        )
        .with_author(person_name(issue.get("assignee")))
        .with_timestamp(str_field(issue, "createdAt"))
        .with_extra_entry("status", status),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(identifier: &str, assignee: Value) -> Value {
        json!({
            "id": "uuid",
            "identifier": identifier,
            "title": "Login fails",
            "description": "Stack trace attached",
            "url": format!("https://linear.app/acme/issue/{identifier}"),
            "state": {"name": "In Progress"},
            "assignee": assignee,
            "createdAt": "2024-05-01T10:00:00.000Z"
        })
    }

    #[test]
    fn maps_issue_fields() {
        let result = map_issue(&issue("ENG-1", json!({"name": "Dana"}))).expect("mapped");
        assert_eq!(result.title(), "[ENG-1] Login fails");
        assert_eq!(result.url(), "https://linear.app/acme/issue/ENG-1");
        assert_eq!(result.snippet(), "Stack trace attached");
        assert_eq!(result.author(), Some("Dana"));
        assert_eq!(result.timestamp(), Some("2024-05-01T10:00:00.000Z"));
        assert_eq!(result.extra_value("status"), Some("In Progress"));
    }

    #[test]
    fn limit_one_with_two_issues_and_no_assignee() {
        let nodes = json!([issue("ENG-1", Value::Null), issue("ENG-2", Value::Null)]);
        let results = parse_linear_issues(&nodes, 1);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].author(), None);
    }

    #[test]
    fn null_description_becomes_empty_snippet() {
        let node = json!({"identifier": "ENG-3", "title": "t", "description": null});
        let result = map_issue(&node).expect("mapped");
        assert_eq!(result.snippet(), "");
        assert!(result.extra().is_none());
    }
}
