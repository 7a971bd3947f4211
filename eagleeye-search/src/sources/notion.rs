//! Notion: wiki pages and databases via the public search endpoint.
//!
//! `POST /v1/search` with an integration token. Titles live in a
//! title-typed property whose name varies per database, so extraction
//! probes the common names before falling back to the page-level title.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::fields::{records, str_field};
use crate::config::SearchConfig;
use crate::error::SourceError;
use crate::http;
use crate::source::SourceClient;
use crate::types::{NormalizedResult, SourceKind};

/// Default API base URL.
pub const NOTION_API_BASE: &str = "https://api.notion.com";

/// API version header value.
pub const NOTION_VERSION: &str = "2022-06-28";

const TITLE_PROPERTIES: &[&str] = &["title", "Title", "Name", "name"];
const SNIPPET_PROPERTIES: &[&str] = &["Description", "description", "Content", "content"];

/// Notion search adapter.
pub struct NotionClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl NotionClient {
    /// Create a client for the given integration token.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>, config: &SearchConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: http::build_client(config)?,
            api_key: api_key.into(),
            base_url: NOTION_API_BASE.to_owned(),
        })
    }

    /// Set the base URL (useful for testing with mock servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }
}

#[async_trait]
impl SourceClient for NotionClient {
    fn kind(&self) -> SourceKind {
        SourceKind::Notion
    }

    async fn try_search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<NormalizedResult>, SourceError> {
        tracing::trace!(query, limit, "Notion search");

        let response = self
            .client
            .post(format!("{}/v1/search", self.base_url))
            .bearer_auth(&self.api_key)
            .header("Notion-Version", NOTION_VERSION)
            .json(&json!({ "query": query, "page_size": limit }))
            .send()
            .await?;
        let payload: Value = http::ensure_success(response).await?.json().await?;

        Ok(parse_notion_payload(&payload, limit))
    }
}

/// Map a Notion search payload into results.
///
/// Records that are not JSON objects are skipped individually.
pub(crate) fn parse_notion_payload(payload: &Value, limit: usize) -> Vec<NormalizedResult> {
    let results: Vec<NormalizedResult> = records(payload)
        .into_iter()
        .filter_map(map_page)
        .take(limit)
        .collect();
    tracing::debug!(count = results.len(), "Notion results parsed");
    results
}

/// Map one Notion page or database object.
pub(crate) fn map_page(item: &Value) -> Option<NormalizedResult> {
    if !item.is_object() {
        return None;
    }
    let object_type = str_field(item, "object");
    let url = match str_field(item, "url") {
        Some(url) => url.to_owned(),
        None => str_field(item, "id")
            .map(|id| format!("https://notion.so/{}", id.replace('-', "")))
            .unwrap_or_default(),
    };

    Some(
        NormalizedResult::new(
            SourceKind::Notion,
            extract_title(item).unwrap_or_default(),
            url,
            extract_snippet(item).unwrap_or_default(),
        )
        .with_timestamp(str_field(item, "last_edited_time"))
        .with_extra_entry("type", object_type),
    )
}

fn extract_title(item: &Value) -> Option<String> {
    let properties = item.get("properties");
    let from_property = TITLE_PROPERTIES.iter().find_map(|name| {
        let prop = properties?.get(*name)?;
        if str_field(prop, "type") != Some("title") {
            return None;
        }
        first_plain_text(prop.get("title")?)
    });

    // Database objects carry their title at the top level.
    from_property.or_else(|| first_plain_text(item.get("title")?))
}

fn extract_snippet(item: &Value) -> Option<String> {
    let properties = item.get("properties")?;
    SNIPPET_PROPERTIES.iter().find_map(|name| {
        let prop = properties.get(*name)?;
        if str_field(prop, "type") != Some("rich_text") {
            return None;
        }
        first_plain_text(prop.get("rich_text")?)
    })
}

fn first_plain_text(rich_text: &Value) -> Option<String> {
    rich_text
        .as_array()?
        .first()
        .and_then(|span| str_field(span, "plain_text"))
        .map(str::to_owned)
}
