//! Messages delivered back to the event loop by background tasks.

use crate::completion::CompletionSet;
use crate::engine::PreviewResult;

/// Results of live-input work. `generation` identifies the buffer state the
/// work was started for; anything older than the current generation is stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveEvent {
    Preview {
        generation: u64,
        result: PreviewResult,
    },
    /// A debounced parse-incomplete preview whose quiet period elapsed.
    DeferredPreview {
        generation: u64,
        result: PreviewResult,
    },
    Completions {
        generation: u64,
        set: CompletionSet,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Live(LiveEvent),
    /// The long-press timer of history item `item` elapsed.
    LongPressElapsed { item: usize },
}
