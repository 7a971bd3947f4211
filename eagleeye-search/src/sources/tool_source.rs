//! Search through a tool server's search tool.
//!
//! The tool returns one or more text content items, normally JSON. Each
//! JSON document is split into records; Notion and GitHub records are
//! shaped like their REST counterparts and reuse those mappers, anything
//! else goes through a field-probing generic mapper. Text that is not
//! JSON becomes a single "Search Result" item.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::fields::{first_str, person_name, records, scalar_field};
use super::{github, notion};
use crate::error::SourceError;
use crate::registry::SourceDescriptor;
use crate::source::SourceClient;
use crate::tool::{ToolInvoker, ToolOutput};
use crate::types::{NormalizedResult, SourceKind};

/// Title used for plain-text tool output.
pub const PLAIN_TEXT_TITLE: &str = "Search Result";

/// Adapter that calls a source's search tool.
pub struct ToolSourceClient {
    descriptor: SourceDescriptor,
    tools: Arc<dyn ToolInvoker>,
}

impl ToolSourceClient {
    /// Create an adapter for `descriptor` over a connected tool server.
    pub fn new(descriptor: SourceDescriptor, tools: Arc<dyn ToolInvoker>) -> Self {
        Self { descriptor, tools }
    }
}

#[async_trait]
impl SourceClient for ToolSourceClient {
    fn kind(&self) -> SourceKind {
        self.descriptor.kind
    }

    async fn try_search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<NormalizedResult>, SourceError> {
        let tool = self.descriptor.search_tool;
        tracing::trace!(source = %self.descriptor.kind, tool, query, limit, "tool search");

        let output = self
            .tools
            .call_tool(tool, self.descriptor.search_arguments(query, limit))
            .await?
            .into_result(tool)?;

        let mut results = parse_tool_output(self.descriptor.kind, &output);
        results.truncate(limit);
        Ok(results)
    }
}

/// Map every text item of a tool result into results for `kind`.
pub(crate) fn parse_tool_output(kind: SourceKind, output: &ToolOutput) -> Vec<NormalizedResult> {
    let mut results = Vec::new();
    for text in output.texts() {
        match serde_json::from_str::<Value>(text) {
            Ok(payload) => {
                results.extend(records(&payload).into_iter().filter_map(|r| map_record(kind, r)));
            }
            Err(_) => {
                results.push(NormalizedResult::new(kind, PLAIN_TEXT_TITLE, "", text));
            }
        }
    }
    results
}

fn map_record(kind: SourceKind, record: &Value) -> Option<NormalizedResult> {
    match kind {
        SourceKind::Notion => notion::map_page(record),
        SourceKind::GitHub => github::map_item(record),
        SourceKind::Slack | SourceKind::Linear => map_generic(kind, record),
    }
}

/// Probe common field names for each result field.
pub(crate) fn map_generic(kind: SourceKind, record: &Value) -> Option<NormalizedResult> {
    if !record.is_object() {
        return None;
    }
    let snippet = ["snippet", "description", "text", "content"]
        .iter()
        .find_map(|key| scalar_field(record, key))
        .unwrap_or_default();
    let author = ["author", "user", "assignee"]
        .iter()
        .find_map(|key| person_name(record.get(*key)));
    let timestamp = ["timestamp", "created_at", "createdAt", "ts"]
        .iter()
        .find_map(|key| scalar_field(record, key));

    Some(
        NormalizedResult::new(
            kind,
            first_str(record, &["title", "name"]).unwrap_or_default(),
            first_str(record, &["url", "permalink", "link"]).unwrap_or_default(),
            snippet,
        )
        .with_author(author)
        .with_timestamp(timestamp),
    )
}
