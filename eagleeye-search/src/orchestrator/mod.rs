//! Search orchestration: concurrent fan-out across the registered sources.
//!
//! The streaming, agent-driven variant lives in the host application,
//! which owns the agent process; it shares the relevance filter and the
//! progress types with this crate.

pub mod fanout;

pub use fanout::{UnifiedSearch, DEFAULT_LIMIT};
