//! Progress events for the streaming search.
//!
//! Each emission is a fresh [`SearchProgress`] value. Delivery goes through
//! a bounded channel, so a slow consumer applies backpressure to the
//! producer instead of buffering without limit.

use serde::Serialize;
use tokio::sync::mpsc;

use crate::types::SourceKind;

/// Phase of a streaming search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    /// Planning, before any source is touched.
    Thinking,
    /// Querying [`SearchProgress::current_tool`].
    Searching,
    /// Writing the final answer.
    Consolidating,
}

/// One progress update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchProgress {
    /// Current phase.
    pub status: ProgressStatus,
    /// Source being queried, only while searching.
    pub current_tool: Option<SourceKind>,
    /// Sources already finished, in completion order.
    pub completed_tools: Vec<SourceKind>,
}

impl SearchProgress {
    /// The initial update.
    pub fn thinking() -> Self {
        Self {
            status: ProgressStatus::Thinking,
            current_tool: None,
            completed_tools: Vec::new(),
        }
    }

    /// Querying `current` after finishing `completed`.
    pub fn searching(current: SourceKind, completed: &[SourceKind]) -> Self {
        Self {
            status: ProgressStatus::Searching,
            current_tool: Some(current),
            completed_tools: completed.to_vec(),
        }
    }

    /// Writing the answer after finishing `completed`.
    pub fn consolidating(completed: &[SourceKind]) -> Self {
        Self {
            status: ProgressStatus::Consolidating,
            current_tool: None,
            completed_tools: completed.to_vec(),
        }
    }
}

/// Sending half of a progress channel.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    tx: mpsc::Sender<SearchProgress>,
}

impl ProgressSink {
    /// Deliver `progress`, waiting for channel capacity.
    ///
    /// A dropped receiver is not an error; the update is discarded.
    pub async fn emit(&self, progress: SearchProgress) {
        tracing::trace!(status = ?progress.status, current = ?progress.current_tool, "progress");
        if self.tx.send(progress).await.is_err() {
            tracing::debug!("progress receiver dropped");
        }
    }
}

/// Create a bounded progress channel.
///
/// `capacity` is clamped to at least 1.
pub fn progress_channel(capacity: usize) -> (ProgressSink, mpsc::Receiver<SearchProgress>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ProgressSink { tx }, rx)
}
