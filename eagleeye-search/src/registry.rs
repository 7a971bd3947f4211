//! The set of active sources and their launch/tool metadata.
//!
//! A source is active iff it is enabled and has a non-empty credential.
//! [`SourceRegistry::from_config`] records a [`SourceDescriptor`] for each
//! active source; adapters are attached afterwards, either HTTP clients via
//! [`SourceRegistry::with_http_clients`] or tool-backed clients registered
//! by the process that owns the tool server connections.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde_json::{json, Value};

use crate::config::{SearchConfig, SourceConfig, SourcesConfig};
use crate::error::SourceError;
use crate::source::SourceClient;
use crate::sources::{GitHubClient, LinearClient, NotionClient, SlackSearchClient};
use crate::types::SourceKind;

const SLACK_TOOLS: &[&str] = &[
    "slack_list_channels",
    "slack_get_channel_history",
    "slack_get_thread_replies",
];
const NOTION_TOOLS: &[&str] = &[
    "API-post-search",
    "API-retrieve-a-page",
    "API-get-block-children",
];
const LINEAR_TOOLS: &[&str] = &["linear_searchIssues", "linear_getIssueById", "linear_getIssues"];
const GITHUB_TOOLS: &[&str] = &[
    "search_repositories",
    "search_code",
    "search_issues",
    "get_file_contents",
    "list_commits",
    "get_issue",
    "get_pull_request",
    "list_issues",
    "list_pull_requests",
];

/// Static metadata for one active source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    /// Which backend.
    pub kind: SourceKind,
    /// Executable that starts the tool server.
    pub command: String,
    /// Arguments for [`command`](Self::command).
    pub args: Vec<String>,
    /// Environment for the tool server, carrying the credentials.
    pub env: BTreeMap<String, String>,
    /// Tool used for direct searches.
    pub search_tool: &'static str,
    /// Tools the agent may call on this server, without the `mcp__` prefix.
    pub agent_tools: &'static [&'static str],
    /// Override for the backend's HTTP API base URL.
    pub base_url: Option<String>,
}

impl SourceDescriptor {
    /// Build the descriptor for `kind` from its settings.
    ///
    /// Returns `None` when the source is disabled or has no credential.
    pub fn from_config(kind: SourceKind, config: &SourceConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let credential = config.credential()?;

        let mut env = BTreeMap::new();
        let (package, search_tool, agent_tools) = match kind {
            SourceKind::Slack => {
                env.insert("SLACK_BOT_TOKEN".to_owned(), credential.to_owned());
                if let Some(team) = config.team_id.as_deref().filter(|t| !t.is_empty()) {
                    env.insert("SLACK_TEAM_ID".to_owned(), team.to_owned());
                }
                ("@modelcontextprotocol/server-slack", "slack_get_channel_history", SLACK_TOOLS)
            }
            SourceKind::Notion => {
                let headers = json!({
                    "Authorization": format!("Bearer {credential}"),
                    "Notion-Version": crate::sources::notion::NOTION_VERSION,
                });
                env.insert("OPENAPI_MCP_HEADERS".to_owned(), headers.to_string());
                ("@notionhq/notion-mcp-server", "API-post-search", NOTION_TOOLS)
            }
            SourceKind::Linear => {
                env.insert("LINEAR_API_KEY".to_owned(), credential.to_owned());
                ("@tacticlaunch/mcp-linear", "linear_searchIssues", LINEAR_TOOLS)
            }
            SourceKind::GitHub => {
                env.insert(
                    "GITHUB_PERSONAL_ACCESS_TOKEN".to_owned(),
                    credential.to_owned(),
                );
                ("@modelcontextprotocol/server-github", "search_issues", GITHUB_TOOLS)
            }
        };

        let (command, args) = match config.server_command.as_deref() {
            Some([exe, rest @ ..]) => (exe.clone(), rest.to_vec()),
            _ => ("npx".to_owned(), vec!["-y".to_owned(), package.to_owned()]),
        };

        Some(Self {
            kind,
            command,
            args,
            env,
            search_tool,
            agent_tools,
            base_url: config.base_url.clone(),
        })
    }

    /// Arguments for [`search_tool`](Self::search_tool).
    pub fn search_arguments(&self, query: &str, limit: usize) -> Value {
        match self.kind {
            // History is fetched per channel; the query is applied locally.
            SourceKind::Slack => json!({ "limit": limit }),
            SourceKind::Notion => json!({
                "query": query,
                "page_size": limit,
                "filter": { "property": "object", "value": "page" },
            }),
            SourceKind::Linear => json!({ "query": query, "limit": limit }),
            SourceKind::GitHub => json!({ "q": query, "per_page": limit }),
        }
    }

    /// Fully qualified tool names as seen by the agent.
    pub fn qualified_agent_tools(&self) -> Vec<String> {
        self.agent_tools
            .iter()
            .map(|tool| format!("mcp__{}__{tool}", self.kind))
            .collect()
    }
}

/// Active sources and the adapters that search them.
#[derive(Default)]
pub struct SourceRegistry {
    descriptors: BTreeMap<SourceKind, SourceDescriptor>,
    clients: BTreeMap<SourceKind, Arc<dyn SourceClient>>,
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("sources", &self.descriptors.keys().collect::<Vec<_>>())
            .field("clients", &self.clients.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SourceRegistry {
    /// Record a descriptor for every enabled source that has a credential.
    ///
    /// Excluded sources are logged at debug level; they are not errors.
    pub fn from_config(config: &SourcesConfig) -> Self {
        let mut descriptors = BTreeMap::new();
        for kind in SourceKind::all() {
            let source = config.get(*kind);
            match SourceDescriptor::from_config(*kind, source) {
                Some(descriptor) => {
                    descriptors.insert(*kind, descriptor);
                }
                None if !source.enabled => {
                    tracing::debug!(source = %kind, "source disabled");
                }
                None => {
                    tracing::debug!(source = %kind, "source has no credential");
                }
            }
        }
        tracing::info!(
            sources = ?descriptors.keys().collect::<Vec<_>>(),
            "source registry built"
        );
        Self {
            descriptors,
            clients: BTreeMap::new(),
        }
    }

    /// Attach an HTTP adapter to every active source.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if an HTTP client cannot be built.
    pub fn with_http_clients(
        mut self,
        config: &SourcesConfig,
        search: &SearchConfig,
    ) -> Result<Self, SourceError> {
        let kinds: Vec<SourceKind> = self.descriptors.keys().copied().collect();
        for kind in kinds {
            let Some(token) = config.get(kind).credential() else {
                continue;
            };
            let base_url = config.get(kind).base_url.clone();
            let client: Arc<dyn SourceClient> = match kind {
                SourceKind::Slack => {
                    let c = SlackSearchClient::new(token, search)?;
                    Arc::new(match base_url {
                        Some(base) => c.with_base_url(base),
                        None => c,
                    })
                }
                SourceKind::Notion => {
                    let c = NotionClient::new(token, search)?;
                    Arc::new(match base_url {
                        Some(base) => c.with_base_url(base),
                        None => c,
                    })
                }
                SourceKind::Linear => {
                    let c = LinearClient::new(token, search)?;
                    Arc::new(match base_url {
                        Some(base) => c.with_base_url(base),
                        None => c,
                    })
                }
                SourceKind::GitHub => {
                    let c = GitHubClient::new(token, search)?;
                    Arc::new(match base_url {
                        Some(base) => c.with_base_url(base),
                        None => c,
                    })
                }
            };
            self.clients.insert(kind, client);
        }
        Ok(self)
    }

    /// Register (or replace) the adapter for its source.
    pub fn register(&mut self, client: Arc<dyn SourceClient>) {
        self.clients.insert(client.kind(), client);
    }

    /// The adapter for `kind`, if one is registered.
    pub fn client(&self, kind: SourceKind) -> Option<Arc<dyn SourceClient>> {
        self.clients.get(&kind).cloned()
    }

    /// Sources that have a registered adapter.
    pub fn kinds(&self) -> BTreeSet<SourceKind> {
        self.clients.keys().copied().collect()
    }

    /// Sources that passed the enablement and credential check.
    pub fn configured_kinds(&self) -> BTreeSet<SourceKind> {
        self.descriptors.keys().copied().collect()
    }

    /// The descriptor for `kind`, if the source is active.
    pub fn descriptor(&self, kind: SourceKind) -> Option<&SourceDescriptor> {
        self.descriptors.get(&kind)
    }

    /// Descriptors of all active sources in stable order.
    pub fn descriptors(&self) -> impl Iterator<Item = &SourceDescriptor> {
        self.descriptors.values()
    }

    /// Whether no source is active.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty() && self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NormalizedResult;
    use async_trait::async_trait;

    fn with_token(token: &str) -> SourceConfig {
        SourceConfig {
            token: Some(token.into()),
            ..Default::default()
        }
    }

    #[test]
    fn only_enabled_sources_with_credentials_are_active() {
        let config = SourcesConfig {
            slack: with_token("xoxb-1"),
            notion: SourceConfig {
                enabled: false,
                ..with_token("secret")
            },
            linear: with_token(""),
            github: SourceConfig::default(),
        };
        let registry = SourceRegistry::from_config(&config);
        assert_eq!(
            registry.configured_kinds(),
            BTreeSet::from([SourceKind::Slack])
        );
    }

    #[test]
    fn empty_config_gives_empty_registry() {
        let registry = SourceRegistry::from_config(&SourcesConfig::default());
        assert!(registry.is_empty());
        assert_eq!(registry.descriptors().count(), 0);
    }

    #[test]
    fn slack_descriptor_carries_team_id() {
        let config = SourceConfig {
            team_id: Some("T0123".into()),
            ..with_token("xoxb-1")
        };
        let d = SourceDescriptor::from_config(SourceKind::Slack, &config).expect("active");
        assert_eq!(d.command, "npx");
        assert_eq!(d.args, vec!["-y", "@modelcontextprotocol/server-slack"]);
        assert_eq!(d.env.get("SLACK_BOT_TOKEN").map(String::as_str), Some("xoxb-1"));
        assert_eq!(d.env.get("SLACK_TEAM_ID").map(String::as_str), Some("T0123"));
    }

    #[test]
    fn server_command_override_replaces_npx() {
        let config = SourceConfig {
            server_command: Some(vec!["/opt/mcp/linear".into(), "--stdio".into()]),
            ..with_token("lin_api")
        };
        let d = SourceDescriptor::from_config(SourceKind::Linear, &config).expect("active");
        assert_eq!(d.command, "/opt/mcp/linear");
        assert_eq!(d.args, vec!["--stdio"]);
        assert_eq!(d.env.get("LINEAR_API_KEY").map(String::as_str), Some("lin_api"));
    }

    #[test]
    fn notion_descriptor_passes_headers_as_json() {
        let d = SourceDescriptor::from_config(SourceKind::Notion, &with_token("ntn_x"))
            .expect("active");
        let headers: Value =
            serde_json::from_str(&d.env["OPENAPI_MCP_HEADERS"]).expect("json headers");
        assert_eq!(headers["Authorization"], "Bearer ntn_x");
        assert_eq!(headers["Notion-Version"], "2022-06-28");
    }

    #[test]
    fn search_arguments_per_source() {
        let notion =
            SourceDescriptor::from_config(SourceKind::Notion, &with_token("t")).expect("active");
        let args = notion.search_arguments("roadmap", 3);
        assert_eq!(args["query"], "roadmap");
        assert_eq!(args["page_size"], 3);
        assert_eq!(args["filter"]["value"], "page");

        let github =
            SourceDescriptor::from_config(SourceKind::GitHub, &with_token("t")).expect("active");
        assert_eq!(github.search_arguments("bug", 5), json!({"q": "bug", "per_page": 5}));
    }

    #[test]
    fn qualified_tools_use_server_prefix() {
        let linear =
            SourceDescriptor::from_config(SourceKind::Linear, &with_token("t")).expect("active");
        assert!(linear
            .qualified_agent_tools()
            .contains(&"mcp__linear__linear_searchIssues".to_owned()));
    }

    struct Fixed(SourceKind);

    #[async_trait]
    impl SourceClient for Fixed {
        fn kind(&self) -> SourceKind {
            self.0
        }

        async fn try_search(
            &self,
            _query: &str,
            _limit: usize,
        ) -> Result<Vec<NormalizedResult>, SourceError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn register_replaces_by_kind() {
        let mut registry = SourceRegistry::default();
        registry.register(Arc::new(Fixed(SourceKind::Linear)));
        registry.register(Arc::new(Fixed(SourceKind::Linear)));
        registry.register(Arc::new(Fixed(SourceKind::GitHub)));
        assert_eq!(registry.kinds().len(), 2);
        assert!(registry.client(SourceKind::Slack).is_none());
    }

    #[test]
    fn http_clients_attached_for_active_sources() {
        let config = SourcesConfig {
            linear: with_token("lin_api"),
            github: with_token("ghp_x"),
            ..Default::default()
        };
        let registry = SourceRegistry::from_config(&config)
            .with_http_clients(&config, &SearchConfig::default())
            .expect("clients");
        assert_eq!(
            registry.kinds(),
            BTreeSet::from([SourceKind::Linear, SourceKind::GitHub])
        );
    }
}
