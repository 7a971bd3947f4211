//! Keyword-based source selection.
//!
//! A query mentioning "issue" or "버그" probably wants the issue tracker;
//! one mentioning "wiki" or "문서" wants the document store. Matching is a
//! lower-cased substring test against a static table, so short keywords
//! such as `pr` also hit words that merely contain them. When nothing
//! matches, every configured source is searched.

use std::collections::BTreeSet;

use crate::types::SourceKind;

/// Keywords (English and Korean) that point at each source.
pub const SOURCE_KEYWORDS: &[(SourceKind, &[&str])] = &[
    (
        SourceKind::Slack,
        &["slack", "채널", "channel", "메시지", "message", "대화", "conversation"],
    ),
    (
        SourceKind::Notion,
        &["notion", "노션", "문서", "document", "페이지", "page", "wiki"],
    ),
    (
        SourceKind::Linear,
        &[
            "linear", "리니어", "이슈", "issue", "티켓", "ticket", "버그", "bug", "태스크",
            "task",
        ],
    ),
    (
        SourceKind::GitHub,
        &[
            "github",
            "깃허브",
            "코드",
            "code",
            "pr",
            "pull request",
            "커밋",
            "commit",
            "레포",
            "repo",
        ],
    ),
];

/// Prefix of tool names exposed to the agent: `mcp__<server>__<tool>`.
const TOOL_PREFIX: &str = "mcp__";

/// Select the sources relevant to `query` out of `universe`.
///
/// Returns the sources whose keywords occur in the query, restricted to
/// `universe`. If that leaves nothing, returns all of `universe`.
pub fn select_sources(query: &str, universe: &BTreeSet<SourceKind>) -> BTreeSet<SourceKind> {
    let lowered = query.to_lowercase();
    let matched: BTreeSet<SourceKind> = SOURCE_KEYWORDS
        .iter()
        .filter(|(kind, keywords)| {
            universe.contains(kind) && keywords.iter().any(|kw| lowered.contains(kw))
        })
        .map(|(kind, _)| *kind)
        .collect();

    if matched.is_empty() {
        universe.clone()
    } else {
        matched
    }
}

/// Extract the source of an agent tool name such as
/// `mcp__slack__slack_list_channels`.
///
/// Returns `None` for tools that do not follow the `mcp__<server>__`
/// convention or whose server is not a known source.
pub fn source_from_tool_name(tool_name: &str) -> Option<SourceKind> {
    let rest = tool_name.strip_prefix(TOOL_PREFIX)?;
    let (server, _tool) = rest.split_once("__")?;
    server.parse().ok()
}

/// Relevance filter bound to the set of configured sources.
#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    universe: BTreeSet<SourceKind>,
}

impl RelevanceFilter {
    /// Create a filter over the given configured sources.
    pub fn new(universe: impl IntoIterator<Item = SourceKind>) -> Self {
        Self {
            universe: universe.into_iter().collect(),
        }
    }

    /// The configured sources.
    pub fn universe(&self) -> &BTreeSet<SourceKind> {
        &self.universe
    }

    /// Sources relevant to `query`; see [`select_sources`].
    pub fn select(&self, query: &str) -> BTreeSet<SourceKind> {
        let selected = select_sources(query, &self.universe);
        tracing::debug!(?selected, "sources selected for query");
        selected
    }

    /// Keep only the tool names that belong to one of `selected`.
    pub fn filter_tools<'a>(
        selected: &BTreeSet<SourceKind>,
        tools: impl IntoIterator<Item = &'a str>,
    ) -> Vec<String> {
        tools
            .into_iter()
            .filter(|tool| source_from_tool_name(tool).is_some_and(|k| selected.contains(&k)))
            .map(str::to_owned)
            .collect()
    }
}
