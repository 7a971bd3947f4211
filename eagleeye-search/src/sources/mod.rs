//! Source adapter implementations.
//!
//! Each module provides structs implementing [`crate::source::SourceClient`]
//! for one backend. HTTP adapters call the backend's public API directly;
//! tool adapters go through a [`crate::tool::ToolInvoker`] connected to
//! the backend's tool server.

mod fields;

pub mod github;
pub mod linear;
pub mod notion;
pub mod slack;
pub mod tool_source;

pub use github::GitHubClient;
pub use linear::LinearClient;
pub use notion::NotionClient;
pub use slack::{SlackHistoryClient, SlackSearchClient};
pub use tool_source::ToolSourceClient;
