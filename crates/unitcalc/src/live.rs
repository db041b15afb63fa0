//! Live Input Pipeline
//!
//! Every buffer change starts a preview evaluation and, for non-blank input,
//! a completion lookup. Both run as local tasks and report back through the
//! app event channel; the pipeline only updates what is shown when a result
//! for the current generation arrives.
//!
//! Parse-incomplete previews are expected while typing, so they are shown
//! only after a quiet period. A newer change cancels the pending display.

use crate::completion::CompletionSet;
use crate::engine::{Engine, PreviewResult};
use crate::event::{AppEvent, LiveEvent};
use crate::schedule::ScheduledTask;
use crate::word::word_at;
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, trace};

/// Quiet period before a parse-incomplete preview is shown.
pub const DEBOUNCE: Duration = Duration::from_millis(300);

pub struct LiveInputPipeline<E> {
    engine: Rc<E>,
    events: UnboundedSender<AppEvent>,
    debounce: Duration,
    /// Bumped on every change; results carry the value they were started with.
    generation: u64,
    pending_error: ScheduledTask,
    preview: Option<PreviewResult>,
    completions: CompletionSet,
}

impl<E: Engine + 'static> LiveInputPipeline<E> {
    pub fn new(engine: Rc<E>, events: UnboundedSender<AppEvent>) -> Self {
        Self::with_debounce(engine, events, DEBOUNCE)
    }

    pub fn with_debounce(
        engine: Rc<E>,
        events: UnboundedSender<AppEvent>,
        debounce: Duration,
    ) -> Self {
        Self {
            engine,
            events,
            debounce,
            generation: 0,
            pending_error: ScheduledTask::new(),
            preview: None,
            completions: CompletionSet::default(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The preview currently on screen.
    pub fn preview(&self) -> Option<&PreviewResult> {
        self.preview.as_ref()
    }

    /// Whether the input surface should be styled as an error.
    pub fn is_error(&self) -> bool {
        self.preview.as_ref().is_some_and(|p| p.is_error)
    }

    pub fn completions(&self) -> &CompletionSet {
        &self.completions
    }

    pub fn completions_mut(&mut self) -> &mut CompletionSet {
        &mut self.completions
    }

    pub fn has_pending_error(&self) -> bool {
        self.pending_error.is_pending()
    }

    /// React to a buffer change. Must be called from within a `LocalSet`.
    pub fn on_change(&mut self, buffer: &str, cursor: usize) {
        self.generation += 1;
        let generation = self.generation;
        self.pending_error.cancel();

        let engine = Rc::clone(&self.engine);
        let events = self.events.clone();
        let query = buffer.to_string();
        tokio::task::spawn_local(async move {
            let result = engine.evaluate(&query, false).await.preview();
            let _ = events.send(AppEvent::Live(LiveEvent::Preview { generation, result }));
        });

        if buffer.trim().is_empty() {
            self.completions.clear();
            return;
        }

        let engine = Rc::clone(&self.engine);
        let events = self.events.clone();
        let input = buffer.to_string();
        let span = word_at(buffer, cursor);
        tokio::task::spawn_local(async move {
            let symbol = async {
                if span.word.is_empty() {
                    None
                } else {
                    engine.symbol_for(&span.word).await
                }
            };
            let (candidates, symbol) = tokio::join!(engine.completions(&input), symbol);
            let set = CompletionSet::new(span.word, candidates, symbol);
            let _ = events.send(AppEvent::Live(LiveEvent::Completions { generation, set }));
        });
    }

    /// Apply a result delivered by one of the tasks. Returns whether anything
    /// shown changed.
    pub fn handle(&mut self, event: LiveEvent) -> bool {
        match event {
            LiveEvent::Preview { generation, result } => {
                if generation != self.generation {
                    trace!(generation, current = self.generation, "stale preview dropped");
                    return false;
                }
                self.pending_error.cancel();
                if result.is_parse_incomplete() {
                    debug!(generation, "parse incomplete, deferring display");
                    let events = self.events.clone();
                    self.pending_error.schedule(self.debounce, move || {
                        let _ = events.send(AppEvent::Live(LiveEvent::DeferredPreview {
                            generation,
                            result,
                        }));
                    });
                    return false;
                }
                self.preview = Some(result);
                true
            }
            LiveEvent::DeferredPreview { generation, result } => {
                if generation != self.generation {
                    return false;
                }
                self.preview = Some(result);
                true
            }
            LiveEvent::Completions { generation, set } => {
                if generation != self.generation {
                    trace!(generation, current = self.generation, "stale completions dropped");
                    return false;
                }
                self.completions = set;
                true
            }
        }
    }

    /// Show a result directly, e.g. a rejected commit's error.
    pub fn show(&mut self, result: PreviewResult) {
        self.pending_error.cancel();
        self.preview = Some(result);
    }

    /// Forget everything shown and invalidate in-flight work.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.pending_error.cancel();
        self.preview = None;
        self.completions.clear();
    }
}
