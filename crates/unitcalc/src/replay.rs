//! Context Replay Engine
//!
//! Rebuilds the engine's bindings after a restart by re-submitting every
//! stored input, oldest first, in commit mode. What gets displayed is the
//! stored rendering, never the fresh result: formatting may have drifted
//! between engine versions and the history must read as it did originally.

use crate::engine::Engine;
use crate::history::{HistoryEntry, HistoryStore};
use crate::store::KeyValueStore;
use tracing::{info, warn};

/// What a replay produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    /// Stored entries to render, in stored order.
    pub entries: Vec<HistoryEntry>,
    /// Indices of entries whose re-submission now fails.
    pub failures: Vec<usize>,
}

/// Replay the stored history into `engine`.
///
/// Strictly sequential: each input may depend on bindings made by the one
/// before it. A failing input is recorded and skipped; replay goes on.
pub async fn replay<E: Engine, S: KeyValueStore>(
    engine: &E,
    history: &mut HistoryStore<S>,
) -> ReplayReport {
    let entries = history.load_all().await;
    let mut failures = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        let fresh = engine.evaluate(&entry.input, true).await;
        if fresh.is_error {
            warn!(
                index,
                input = %entry.input,
                error = %fresh.output,
                "stored input no longer evaluates"
            );
            failures.push(index);
        }
    }

    info!(
        entries = entries.len(),
        failures = failures.len(),
        "replayed history"
    );

    ReplayReport { entries, failures }
}
