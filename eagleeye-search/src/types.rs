//! Core types: the fixed set of source kinds and the normalized result record.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Maximum snippet length in characters.
pub const SNIPPET_MAX_CHARS: usize = 200;

/// Marker appended to snippets that were cut to [`SNIPPET_MAX_CHARS`].
pub const TRUNCATION_MARKER: &str = "...";

/// Title used when a backend provides no usable title.
pub const UNTITLED: &str = "Untitled";

/// Backends that EagleEye can search.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Slack: team chat messages.
    Slack,
    /// Notion: wiki pages and databases.
    Notion,
    /// Linear: issue tracker.
    Linear,
    /// GitHub: code, issues and pull requests.
    GitHub,
}

impl SourceKind {
    /// Returns the lower-case identifier used in config, flags and tool names.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Slack => "slack",
            Self::Notion => "notion",
            Self::Linear => "linear",
            Self::GitHub => "github",
        }
    }

    /// Returns the human-readable label for display grouping.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Slack => "Slack",
            Self::Notion => "Notion",
            Self::Linear => "Linear",
            Self::GitHub => "GitHub",
        }
    }

    /// Returns all source kinds in a stable order.
    pub fn all() -> &'static [SourceKind] {
        &[Self::Slack, Self::Notion, Self::Linear, Self::GitHub]
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SourceKind {
    type Err = crate::SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| crate::SourceError::Config(format!("unknown source: {s}")))
    }
}

/// A single search hit, normalized from any backend's native shape.
///
/// Values are immutable once built: fields are private and only
/// readable through accessors. Construct with [`NormalizedResult::new`]
/// and the consuming `with_*` builders, which enforce the title
/// placeholder, the snippet cap and the "no value" representation of
/// absent optional data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedResult {
    source: SourceKind,
    title: String,
    url: String,
    snippet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    extra: Option<BTreeMap<String, String>>,
}

impl NormalizedResult {
    /// Creates a result with the required fields.
    ///
    /// A blank `title` becomes [`UNTITLED`]; `snippet` is capped at
    /// [`SNIPPET_MAX_CHARS`] characters.
    pub fn new(
        source: SourceKind,
        title: impl Into<String>,
        url: impl Into<String>,
        snippet: impl AsRef<str>,
    ) -> Self {
        let title = title.into();
        let title = if title.trim().is_empty() {
            UNTITLED.to_owned()
        } else {
            title
        };
        Self {
            source,
            title,
            url: url.into(),
            snippet: truncate_snippet(snippet.as_ref()),
            timestamp: None,
            author: None,
            extra: None,
        }
    }

    /// Sets the original, un-reparsed timestamp. Empty strings mean "no value".
    pub fn with_timestamp(mut self, timestamp: Option<impl Into<String>>) -> Self {
        self.timestamp = non_empty(timestamp);
        self
    }

    /// Sets the flat author display name. Empty strings mean "no value".
    pub fn with_author(mut self, author: Option<impl Into<String>>) -> Self {
        self.author = non_empty(author);
        self
    }

    /// Replaces the source-specific metadata map. An empty map means "no value".
    pub fn with_extra(mut self, extra: BTreeMap<String, String>) -> Self {
        self.extra = if extra.is_empty() { None } else { Some(extra) };
        self
    }

    /// Adds one metadata entry; `None` or empty values are skipped.
    pub fn with_extra_entry(mut self, key: &str, value: Option<impl Into<String>>) -> Self {
        if let Some(value) = non_empty(value) {
            self.extra
                .get_or_insert_with(BTreeMap::new)
                .insert(key.to_owned(), value);
        }
        self
    }

    /// Which backend produced this result.
    pub fn source(&self) -> SourceKind {
        self.source
    }

    /// Short label, never empty.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Link to the original item; empty when the backend has no permalink.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Excerpt of at most [`SNIPPET_MAX_CHARS`] characters.
    pub fn snippet(&self) -> &str {
        &self.snippet
    }

    /// Timestamp in the backend's own format.
    pub fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }

    /// Author display name.
    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    /// Source-specific metadata such as status or object type.
    pub fn extra(&self) -> Option<&BTreeMap<String, String>> {
        self.extra.as_ref()
    }

    /// Looks up a single metadata value.
    pub fn extra_value(&self, key: &str) -> Option<&str> {
        self.extra.as_ref()?.get(key).map(String::as_str)
    }
}

/// Cap `text` at [`SNIPPET_MAX_CHARS`] characters, ending with
/// [`TRUNCATION_MARKER`] when it was cut.
pub fn truncate_snippet(text: &str) -> String {
    if text.chars().count() <= SNIPPET_MAX_CHARS {
        return text.to_owned();
    }
    let keep = SNIPPET_MAX_CHARS - TRUNCATION_MARKER.chars().count();
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}

fn non_empty(value: Option<impl Into<String>>) -> Option<String> {
    value.map(Into::into).filter(|v| !v.trim().is_empty())
}
