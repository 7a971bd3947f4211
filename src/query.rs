//! Source flags embedded in a query string.
//!
//! `--slack --notion api error` searches only Slack and Notion for
//! `api error`. Flags may appear anywhere and are case-insensitive; unknown
//! `--words` are kept as query text.

use std::collections::BTreeSet;

use eagleeye_search::SourceKind;

/// A query with its source flags separated out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    /// Query text with flags removed and whitespace collapsed.
    pub query: String,
    /// Sources named by flags; empty means all sources.
    pub sources: BTreeSet<SourceKind>,
}

impl ParsedQuery {
    /// Split `input` into query text and source flags.
    pub fn parse(input: &str) -> Self {
        let mut sources = BTreeSet::new();
        let mut words = Vec::new();
        for word in input.split_whitespace() {
            let flag = word
                .strip_prefix("--")
                .and_then(|name| name.parse::<SourceKind>().ok());
            match flag {
                Some(kind) => {
                    sources.insert(kind);
                }
                None => words.push(word),
            }
        }
        Self {
            query: words.join(" "),
            sources,
        }
    }

    /// The source selection for the orchestrator: `None` means all.
    pub fn selection(&self) -> Option<&BTreeSet<SourceKind>> {
        (!self.sources.is_empty()).then_some(&self.sources)
    }

    /// Whether no query text remains.
    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
    }
}
