//! EagleEye: one question, searched across Slack, Notion, Linear and GitHub.
//!
//! Two search paths share one set of configured sources:
//!
//! - **Parallel search**: every relevant source is queried at once and the
//!   hits come back as [`eagleeye_search::NormalizedResult`] records.
//! - **Agent search**: an external agent picks which source tools to call
//!   and writes a single answer, reporting progress along the way.
//!
//! # Architecture
//!
//! - [`config`]: TOML settings with environment overrides
//! - [`mcp`]: stdio JSON-RPC client for per-source tool servers
//! - [`agent`]: agent runtime, event stream and progress state machine
//! - [`query`]: `--source` flags inside query text
//! - [`app`]: wires sources, transports and both search paths together
//!
//! Source adapters, the registry and the parallel orchestrator live in the
//! `eagleeye-search` crate.

pub mod agent;
pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod mcp;
pub mod paths;
pub mod query;

pub use app::App;
pub use config::Settings;
pub use error::{EagleEyeError, Result};
pub use query::ParsedQuery;
