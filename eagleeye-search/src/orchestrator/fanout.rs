//! Parallel fan-out across sources.
//!
//! One task per active source is spawned on the caller-supplied runtime,
//! and outcomes are collected in completion order. A source that fails,
//! panics, or is cancelled contributes nothing; the others still return.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::runtime::Handle;

use crate::registry::SourceRegistry;
use crate::types::{NormalizedResult, SourceKind};

/// Results requested per source when the caller passes no limit.
pub const DEFAULT_LIMIT: usize = 3;

/// Parallel search over every registered source.
#[derive(Debug, Clone)]
pub struct UnifiedSearch {
    registry: Arc<SourceRegistry>,
    handle: Handle,
}

impl UnifiedSearch {
    /// Bind the orchestrator to a registry and the runtime its tasks run on.
    pub fn new(registry: Arc<SourceRegistry>, handle: Handle) -> Self {
        Self { registry, handle }
    }

    /// The registry searched by this orchestrator.
    pub fn registry(&self) -> &Arc<SourceRegistry> {
        &self.registry
    }

    /// Search the selected sources concurrently.
    ///
    /// - `limit` caps each source's contribution (default [`DEFAULT_LIMIT`]).
    /// - `sources: None` searches every registered source;
    ///   `Some(set)` searches the registered sources in `set` and logs the
    ///   rest; an empty set returns immediately without starting work.
    ///
    /// The result is the concatenation of per-source results in the order
    /// sources finished. Nothing is ranked or deduplicated, and the query is
    /// not validated.
    pub async fn unified_search(
        &self,
        query: &str,
        limit: Option<usize>,
        sources: Option<&BTreeSet<SourceKind>>,
    ) -> Vec<NormalizedResult> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        let active = self.active_sources(sources);
        if active.is_empty() {
            tracing::debug!("no active sources; skipping search");
            return Vec::new();
        }

        let start = std::time::Instant::now();
        let mut pending: FuturesUnordered<_> = active
            .into_iter()
            .filter_map(|kind| self.registry.client(kind).map(|client| (kind, client)))
            .map(|(kind, client)| {
                let q = query.to_owned();
                let task = self
                    .handle
                    .spawn(async move { client.search(&q, limit).await });
                async move { (kind, task.await) }
            })
            .collect();

        let mut results = Vec::new();
        while let Some((kind, outcome)) = pending.next().await {
            match outcome {
                Ok(source_results) => {
                    tracing::debug!(source = %kind, count = source_results.len(), "source finished");
                    results.extend(source_results);
                }
                Err(err) => {
                    let reason = if err.is_panic() { "panicked" } else { "cancelled" };
                    tracing::warn!(source = %kind, query, reason, "source task failed");
                }
            }
        }

        tracing::info!(
            count = results.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "unified search finished"
        );
        results
    }

    fn active_sources(&self, sources: Option<&BTreeSet<SourceKind>>) -> BTreeSet<SourceKind> {
        let registered = self.registry.kinds();
        match sources {
            None => registered,
            Some(requested) => {
                for kind in requested.difference(&registered) {
                    tracing::warn!(source = %kind, "requested source is not registered");
                }
                requested.intersection(&registered).copied().collect()
            }
        }
    }
}
