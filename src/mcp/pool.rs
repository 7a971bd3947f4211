//! Connections to every configured tool server.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;

use eagleeye_search::{SourceKind, SourceRegistry};
use futures_util::future::join_all;

use super::McpConnection;
use crate::config::McpConfig;

/// Live tool server connections keyed by source.
///
/// Sources whose server fails to start are left out; the rest keep working.
#[derive(Debug, Default)]
pub struct McpPool {
    connections: BTreeMap<SourceKind, Arc<McpConnection>>,
}

impl McpPool {
    /// Launch a server for every source configured in `registry`, concurrently.
    ///
    /// Failures are logged and skipped, so the pool may be empty.
    pub async fn connect_all(registry: &SourceRegistry, config: &McpConfig) -> Self {
        let attempts = registry.descriptors().map(|descriptor| async move {
            let started = Instant::now();
            let result = McpConnection::connect(descriptor, config).await;
            (descriptor.kind, started.elapsed(), result)
        });

        let mut pool = Self::default();
        for (kind, elapsed, result) in join_all(attempts).await {
            match result {
                Ok(connection) => {
                    tracing::info!(
                        source = %kind,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "tool server connected"
                    );
                    pool.insert(Arc::new(connection));
                }
                Err(e) => {
                    tracing::warn!(source = %kind, error = %e, "tool server unavailable, skipping");
                }
            }
        }
        pool
    }

    /// Add or replace the connection for its source.
    pub fn insert(&mut self, connection: Arc<McpConnection>) {
        self.connections.insert(connection.kind(), connection);
    }

    /// Connection for `kind`, if its server is up.
    pub fn connection(&self, kind: SourceKind) -> Option<Arc<McpConnection>> {
        self.connections.get(&kind).cloned()
    }

    /// Sources with a live connection.
    pub fn kinds(&self) -> BTreeSet<SourceKind> {
        self.connections.keys().copied().collect()
    }

    /// Whether no server is connected.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Stop every server and empty the pool.
    pub async fn disconnect_all(&mut self) {
        let connections = std::mem::take(&mut self.connections);
        join_all(connections.values().map(|c| c.disconnect())).await;
        if !connections.is_empty() {
            tracing::debug!(count = connections.len(), "tool servers disconnected");
        }
    }
}
