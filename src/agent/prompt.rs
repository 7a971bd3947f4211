//! System prompt for the search agent.

use std::fmt::Write as _;

use eagleeye_search::{SourceDescriptor, SourceKind};

const PREAMBLE: &str = "\
You are EagleEye, a search assistant for a team's workspace tools.
Answer the user's question by searching the sources listed below with the
tools provided, then reply with a short summary of what you found.

Rules:
- Only call tools that are listed here.
- Group findings by source and cite every item with its link.
- Mention authors, assignees, status and dates when the tool returns them.
- Keep each item to one or two lines.
- If nothing relevant turns up, say so and suggest other search terms.
";

fn hint(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::Slack => {
            "List channels first, then read the history of the channels that \
             look relevant and keep messages matching the question."
        }
        SourceKind::Notion => "Search pages by keyword, then open the most relevant ones.",
        SourceKind::Linear => "Search issues by keyword; fetch an issue by id for details.",
        SourceKind::GitHub => {
            "Search code for identifiers and search issues for issues and pull \
             requests; read files or commits only when needed."
        }
    }
}

/// Build the system prompt for the sources offered to the agent.
pub fn system_prompt<'a>(sources: impl IntoIterator<Item = &'a SourceDescriptor>) -> String {
    let mut prompt = PREAMBLE.to_owned();
    let mut any = false;
    for descriptor in sources {
        if !any {
            prompt.push_str("\nSources:\n");
            any = true;
        }
        let _ = writeln!(
            prompt,
            "\n{} ({}): {}\nTools: {}",
            descriptor.kind.label(),
            descriptor.kind,
            hint(descriptor.kind),
            descriptor.qualified_agent_tools().join(", ")
        );
    }
    if !any {
        prompt.push_str("\nNo sources are available. Tell the user that nothing is configured.\n");
    }
    prompt
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use eagleeye_search::SourceConfig;

    fn descriptor(kind: SourceKind) -> SourceDescriptor {
        let config = SourceConfig {
            token: Some("t".into()),
            ..SourceConfig::default()
        };
        SourceDescriptor::from_config(kind, &config).unwrap()
    }

    #[test]
    fn lists_qualified_tools_of_offered_sources() {
        let linear = descriptor(SourceKind::Linear);
        let prompt = system_prompt([&linear]);
        assert!(prompt.contains("mcp__linear__linear_searchIssues"));
        assert!(!prompt.contains("mcp__slack__"));
    }

    #[test]
    fn empty_source_list_is_explicit() {
        let prompt = system_prompt(std::iter::empty());
        assert!(prompt.contains("No sources are available"));
    }
}
