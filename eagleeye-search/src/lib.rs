//! # eagleeye-search
//!
//! Unified multi-source search for EagleEye.
//!
//! This crate turns one natural-language query into searches against the
//! team's chat (Slack), wiki (Notion), issue tracker (Linear) and code host
//! (GitHub), and returns every hit in a single [`NormalizedResult`] shape.
//!
//! ## Design
//!
//! - A source is active only when enabled and given a credential
//! - Active sources are queried concurrently on a caller-supplied runtime
//! - Graceful degradation: a failing source contributes nothing, the rest
//!   still return
//! - A keyword table narrows which sources a query is relevant to
//! - Adapters either call the public HTTP APIs or go through a tool server
//!   behind the [`ToolInvoker`] boundary
//!
//! ## Security
//!
//! - Credentials are read from configuration and sent only to their backend
//! - Queries are logged only alongside a failure, or at trace level

pub mod config;
pub mod error;
pub mod http;
pub mod orchestrator;
pub mod progress;
pub mod registry;
pub mod relevance;
pub mod source;
pub mod sources;
pub mod tool;
pub mod types;

pub use config::{SearchConfig, SourceConfig, SourcesConfig, Transport};
pub use error::{Result, SourceError};
pub use orchestrator::{UnifiedSearch, DEFAULT_LIMIT};
pub use progress::{progress_channel, ProgressSink, ProgressStatus, SearchProgress};
pub use registry::{SourceDescriptor, SourceRegistry};
pub use relevance::{select_sources, source_from_tool_name, RelevanceFilter};
pub use source::SourceClient;
pub use tool::{ToolContent, ToolInvoker, ToolOutput};
pub use types::{NormalizedResult, SourceKind};

/// Build a registry of HTTP adapters for every active source.
///
/// Convenience wrapper around [`SourceRegistry::from_config`] and
/// [`SourceRegistry::with_http_clients`], after validating both configs.
///
/// # Errors
///
/// Returns [`SourceError::Config`] for invalid settings, or
/// [`SourceError::Http`] if an HTTP client cannot be built.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> eagleeye_search::Result<()> {
/// use std::sync::Arc;
///
/// let mut sources = eagleeye_search::SourcesConfig::default();
/// sources.linear.token = Some("lin_api_...".into());
/// let registry = eagleeye_search::http_registry(&sources, &Default::default())?;
///
/// let search = eagleeye_search::UnifiedSearch::new(
///     Arc::new(registry),
///     tokio::runtime::Handle::current(),
/// );
/// for result in search.unified_search("login bug", None, None).await {
///     println!("[{}] {}: {}", result.source(), result.title(), result.url());
/// }
/// # Ok(())
/// # }
/// ```
pub fn http_registry(sources: &SourcesConfig, search: &SearchConfig) -> Result<SourceRegistry> {
    search.validate()?;
    sources.validate()?;
    SourceRegistry::from_config(sources).with_http_clients(sources, search)
}
