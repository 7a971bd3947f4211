//! Trait definition for pluggable source adapters.
//!
//! Each backend (Slack, Notion, Linear, GitHub) implements [`SourceClient`]
//! to provide a uniform `search(query, limit)` over its native API.

use async_trait::async_trait;

use crate::error::SourceError;
use crate::types::{NormalizedResult, SourceKind};

/// A pluggable search backend.
///
/// Implementors query one backend and map its payload into
/// [`NormalizedResult`] values. Each adapter handles its own:
///
/// - Request construction from the normalized `query` / `limit`
/// - HTTP or tool call with appropriate credentials and timeout
/// - Defensive parsing where missing fields become "no value"
///
/// Only [`try_search`](SourceClient::try_search) is fallible. Callers use
/// [`search`](SourceClient::search), which never fails: a backend error is
/// logged with the source identity and the query, and degrades to an empty
/// contribution.
///
/// All implementations must be `Send + Sync` and safe to call concurrently
/// with different queries.
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// Returns which backend this adapter talks to.
    fn kind(&self) -> SourceKind;

    /// Query the backend, returning at most `limit` results.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] on network, authentication, status or
    /// decode failures.
    async fn try_search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<NormalizedResult>, SourceError>;

    /// Query the backend, returning an empty list on any failure.
    async fn search(&self, query: &str, limit: usize) -> Vec<NormalizedResult> {
        match self.try_search(query, limit).await {
            Ok(mut results) => {
                results.truncate(limit);
                tracing::debug!(source = %self.kind(), count = results.len(), "source returned results");
                results
            }
            Err(err) => {
                tracing::warn!(source = %self.kind(), query, error = %err, "source search failed");
                Vec::new()
            }
        }
    }
}
