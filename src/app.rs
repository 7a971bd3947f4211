//! Application bootstrap.
//!
//! [`App::start`] wires the configured sources to both search paths:
//! the parallel [`UnifiedSearch`] and the agent-driven [`SearchAgent`].
//! All background work runs on the runtime handle passed in.

use std::sync::Arc;

use eagleeye_search::sources::{SlackHistoryClient, ToolSourceClient};
use eagleeye_search::{
    NormalizedResult, ProgressSink, SourceClient, SourceKind, SourceRegistry, ToolInvoker,
    Transport, UnifiedSearch,
};
use tokio::runtime::Handle;

use crate::agent::{AgentRuntime, ClaudeCliRuntime, SearchAgent};
use crate::config::Settings;
use crate::error::Result;
use crate::mcp::McpPool;
use crate::query::ParsedQuery;

/// A running EagleEye instance.
#[derive(Debug)]
pub struct App {
    settings: Settings,
    registry: Arc<SourceRegistry>,
    search: UnifiedSearch,
    agent: SearchAgent,
    pool: McpPool,
}

impl App {
    /// Start with the agent CLI named in `settings.agent.command`.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid settings or if HTTP clients cannot be
    /// built. Tool servers that fail to start are skipped, not errors.
    pub async fn start(settings: Settings, handle: Handle) -> Result<Self> {
        let runtime = Arc::new(ClaudeCliRuntime::new(settings.agent.command.clone()));
        Self::start_with_runtime(settings, handle, runtime).await
    }

    /// Start with a custom agent runtime.
    ///
    /// # Errors
    ///
    /// See [`App::start`].
    pub async fn start_with_runtime(
        settings: Settings,
        handle: Handle,
        runtime: Arc<dyn AgentRuntime>,
    ) -> Result<Self> {
        settings.validate()?;

        let (registry, pool) = match settings.search.transport {
            Transport::Http => {
                let registry = eagleeye_search::http_registry(&settings.sources, &settings.search)?;
                (registry, McpPool::default())
            }
            Transport::Mcp => {
                let mut registry = SourceRegistry::from_config(&settings.sources);
                let pool = McpPool::connect_all(&registry, &settings.mcp).await;
                register_tool_clients(&mut registry, &pool);
                (registry, pool)
            }
        };

        if registry.configured_kinds().is_empty() {
            tracing::warn!("no sources configured; set at least one token");
        }
        tracing::info!(
            transport = ?settings.search.transport,
            configured = ?registry.configured_kinds(),
            searchable = ?registry.kinds(),
            "eagleeye started"
        );

        let registry = Arc::new(registry);
        let search = UnifiedSearch::new(Arc::clone(&registry), handle);
        let agent = SearchAgent::new(runtime, Arc::clone(&registry), settings.agent.clone());

        Ok(Self {
            settings,
            registry,
            search,
            agent,
            pool,
        })
    }

    /// Settings this instance was started with.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The active sources.
    pub fn registry(&self) -> &Arc<SourceRegistry> {
        &self.registry
    }

    /// Parallel search across the sources selected by `query`'s flags.
    ///
    /// `limit` defaults to `search.default_limit`.
    pub async fn search(&self, query: &ParsedQuery, limit: Option<usize>) -> Vec<NormalizedResult> {
        let limit = limit.unwrap_or(self.settings.search.default_limit);
        self.search
            .unified_search(&query.query, Some(limit), query.selection())
            .await
    }

    /// Agent-written answer to `query`.
    ///
    /// # Errors
    ///
    /// Returns [`EagleEyeError::Agent`](crate::error::EagleEyeError::Agent) if the agent fails.
    pub async fn ask(&self, query: &str, progress: Option<&ProgressSink>) -> Result<String> {
        Ok(self.agent.search(query, progress).await?)
    }

    /// Stop tool servers.
    pub async fn shutdown(mut self) {
        self.pool.disconnect_all().await;
        tracing::debug!("eagleeye stopped");
    }
}

fn register_tool_clients(registry: &mut SourceRegistry, pool: &McpPool) {
    for kind in pool.kinds() {
        let (Some(descriptor), Some(connection)) =
            (registry.descriptor(kind).cloned(), pool.connection(kind))
        else {
            continue;
        };
        let tools: Arc<dyn ToolInvoker> = connection;
        let client: Arc<dyn SourceClient> = match kind {
            SourceKind::Slack => Arc::new(SlackHistoryClient::new(tools)),
            _ => Arc::new(ToolSourceClient::new(descriptor, tools)),
        };
        registry.register(client);
    }
}
