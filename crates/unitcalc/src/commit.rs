//! Commit Pipeline
//!
//! An explicit submission evaluates the buffer in context-mutating mode. A
//! failed evaluation has no side effect beyond showing the error; a
//! successful one becomes a permanent history entry.

use crate::engine::{Engine, PreviewResult};
use crate::history::HistoryEntry;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Blank input, or input the engine accepted without any statement
    /// (e.g. only a comment). Nothing is recorded.
    Ignored,
    /// The engine rejected the input; the buffer stays as it is.
    Rejected(PreviewResult),
    Committed(HistoryEntry),
}

/// Evaluate `buffer` with bindings kept and build the history entry.
pub async fn commit<E: Engine>(engine: &E, buffer: &str) -> CommitOutcome {
    if buffer.trim().is_empty() {
        return CommitOutcome::Ignored;
    }

    let result = engine.evaluate(buffer, true).await;
    if result.is_error {
        debug!(kind = ?result.error_kind, "commit rejected");
        return CommitOutcome::Rejected(result.preview());
    }

    if result.statements.is_empty() {
        debug!("commit produced no statements");
        return CommitOutcome::Ignored;
    }

    info!(statements = result.statements.len(), "committed input");
    CommitOutcome::Committed(HistoryEntry::from_eval(buffer, result))
}
