//! TUI Application
//!
//! Application state for the calculator session. Key and pointer events come
//! in from the event loop, background results arrive as `AppEvent`s, and
//! `render` draws the whole screen.

use crate::commit::{CommitOutcome, commit};
use crate::completion::CompletionSet;
use crate::config::Config;
use crate::engine::{Engine, PreviewResult};
use crate::event::AppEvent;
use crate::gesture::{GestureAction, GestureEvent, PressTracker};
use crate::history::{HistoryEntry, HistoryStore};
use crate::keys::{InputAction, convert_key};
use crate::live::LiveInputPipeline;
use crate::replay::replay;
use crate::store::KeyValueStore;
use crate::ui::chips::ChipBar;
use crate::ui::layout::{ComputedLayout, LayoutConfig, StatusContent};
use crate::ui::session_pane::{InputState, SessionPane};
use crossterm::event::{KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

const HELP: &[&str] = &[
    "COMMANDS",
    "  :reset        Forget bindings and history",
    "  :help, :h     Show this help",
    "  :q, :quit     Exit",
    "",
    "KEYS",
    "  Enter         Evaluate and keep",
    "  Shift+Enter   New line",
    "  Up, Down      Recall earlier input",
    "  Tab           Accept selected chip",
    "  Ctrl+N/P      Select next/previous chip",
    "  Ctrl+C/D      Exit",
    "",
    "MOUSE",
    "  Click result  Insert its value",
    "  Hold entry    Edit its input again",
];

/// Runtime settings taken from the configuration.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub debounce: Duration,
    pub long_press: Duration,
    /// Shown in the status bar.
    pub engine_label: String,
}

impl AppSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            debounce: config.debounce(),
            long_press: config.long_press(),
            engine_label: config.engine.command.clone(),
        }
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

pub struct App<E, S> {
    engine: Rc<E>,
    history: HistoryStore<S>,
    live: LiveInputPipeline<E>,
    events: UnboundedSender<AppEvent>,
    /// Input buffer and caret
    pub input: InputState,
    /// Gesture tracker per history entry; only entries with a value have one
    trackers: Vec<Option<PressTracker>>,
    long_press: Duration,
    /// Entry under an active press
    pressed: Option<usize>,
    /// Entries that failed to replay at startup
    replay_failures: Vec<usize>,
    /// Where the session pane was last drawn, and which entry owns each row
    session_area: Rect,
    row_items: Vec<Option<usize>>,
    layout_config: LayoutConfig,
    engine_label: String,
    /// Whether the help popup is open
    pub show_help: bool,
    /// Status message (clears after next key)
    pub status_message: Option<String>,
    pub should_quit: bool,
}

impl<E: Engine + 'static, S: KeyValueStore> App<E, S> {
    pub fn new(
        engine: Rc<E>,
        history: HistoryStore<S>,
        events: UnboundedSender<AppEvent>,
        settings: AppSettings,
    ) -> Self {
        let live = LiveInputPipeline::with_debounce(
            Rc::clone(&engine),
            events.clone(),
            settings.debounce,
        );
        Self {
            engine,
            history,
            live,
            events,
            input: InputState::new(),
            trackers: Vec::new(),
            long_press: settings.long_press,
            pressed: None,
            replay_failures: Vec::new(),
            session_area: Rect::default(),
            row_items: Vec::new(),
            layout_config: LayoutConfig::default(),
            engine_label: settings.engine_label,
            show_help: false,
            status_message: None,
            should_quit: false,
        }
    }

    /// Committed entries, oldest first.
    pub fn entries(&self) -> &[HistoryEntry] {
        self.history.entries()
    }

    pub fn history(&self) -> &HistoryStore<S> {
        &self.history
    }

    pub fn preview(&self) -> Option<&PreviewResult> {
        self.live.preview()
    }

    pub fn completions(&self) -> &CompletionSet {
        self.live.completions()
    }

    pub fn replay_failures(&self) -> &[usize] {
        &self.replay_failures
    }

    pub fn pressed(&self) -> Option<usize> {
        self.pressed
    }

    /// Bring the engine up to date with the stored history, or wipe it when
    /// `fresh` is set. Runs before the UI takes input.
    pub async fn start(&mut self, fresh: bool) {
        if fresh {
            info!("starting with an empty history");
            self.history.clear().await;
        } else {
            let report = replay(&*self.engine, &mut self.history).await;
            self.replay_failures = report.failures;
        }

        self.trackers = self
            .history
            .entries()
            .iter()
            .map(|entry| self.tracker_for(entry))
            .collect();

        if !self.replay_failures.is_empty() {
            self.status_message = Some(format!(
                "{} stored entries no longer evaluate",
                self.replay_failures.len()
            ));
        }
    }

    /// Handle a key press
    pub async fn handle_key(&mut self, key: KeyEvent) {
        self.status_message = None;
        if self.show_help {
            self.show_help = false;
            return;
        }

        let Some(action) = convert_key(key) else {
            return;
        };

        let before = self.input.text.clone();
        match action {
            InputAction::Insert(ch) => self.input.insert_char(ch),
            InputAction::Newline => self.input.insert_char('\n'),
            InputAction::Backspace => self.input.backspace(),
            InputAction::Delete => self.input.delete(),
            InputAction::Left => self.input.cursor_left(),
            InputAction::Right => self.input.cursor_right(),
            InputAction::Home => self.input.cursor_home(),
            InputAction::End => self.input.cursor_end(),
            InputAction::RecallPrev => self.input.recall_prev(self.history.entries()),
            InputAction::RecallNext => self.input.recall_next(self.history.entries()),
            InputAction::AcceptCompletion => self.accept_completion(),
            InputAction::NextCompletion => self.live.completions_mut().next(),
            InputAction::PrevCompletion => self.live.completions_mut().prev(),
            InputAction::Quit => self.should_quit = true,
            InputAction::Submit => {
                self.submit().await;
                return;
            }
        }

        if self.input.text != before {
            self.buffer_changed();
        }
    }

    /// Handle bracketed paste
    pub fn handle_paste(&mut self, text: &str) {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        if text.is_empty() {
            return;
        }
        self.input.insert_str(&text);
        self.buffer_changed();
    }

    /// Route pointer events to the gesture tracker of the entry under them
    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let hit = self.entry_at(mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                // A release we never saw ends the earlier press.
                if let Some(previous) = self.pressed.take() {
                    self.gesture(previous, GestureEvent::PressLeave);
                }
                if let Some(index) = hit {
                    self.pressed = Some(index);
                    self.gesture(index, GestureEvent::PressStart);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if let Some(index) = self.pressed.take() {
                    let event = if hit == Some(index) {
                        GestureEvent::PressEnd
                    } else {
                        GestureEvent::PressLeave
                    };
                    self.gesture(index, event);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
                if let Some(index) = self.pressed
                    && hit != Some(index)
                {
                    self.pressed = None;
                    self.gesture(index, GestureEvent::PressLeave);
                }
            }
            _ => {}
        }
    }

    /// Apply a result delivered by a background task
    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Live(event) => {
                self.live.handle(event);
            }
            AppEvent::LongPressElapsed { item } => {
                self.gesture(item, GestureEvent::TimerFired);
            }
        }
    }

    fn buffer_changed(&mut self) {
        self.live.on_change(&self.input.text, self.input.cursor);
    }

    fn accept_completion(&mut self) {
        if let Some((text, cursor)) = self
            .live
            .completions()
            .accept(&self.input.text, self.input.cursor)
        {
            self.input.text = text;
            self.input.cursor = cursor;
        }
    }

    async fn submit(&mut self) {
        let buffer = self.input.text.clone();
        let trimmed = buffer.trim();

        if trimmed.starts_with(':') {
            self.input.clear();
            self.live.reset();
            self.handle_command(trimmed).await;
            return;
        }

        match commit(&*self.engine, &buffer).await {
            CommitOutcome::Ignored => {
                if !trimmed.is_empty() {
                    self.input.clear();
                    self.live.reset();
                }
            }
            CommitOutcome::Rejected(preview) => {
                self.live.show(preview);
            }
            CommitOutcome::Committed(entry) => {
                let tracker = self.tracker_for(&entry);
                self.trackers.push(tracker);
                self.history.append(entry).await;
                self.input.clear();
                self.live.reset();
            }
        }
    }

    async fn handle_command(&mut self, cmd: &str) {
        match cmd {
            ":q" | ":quit" => {
                self.should_quit = true;
            }
            ":reset" => {
                self.reset_session().await;
                self.status_message = Some("Session reset.".to_string());
            }
            ":help" | ":h" => {
                self.show_help = true;
            }
            _ => {
                self.status_message = Some(format!("Unknown command: {}", cmd));
            }
        }
    }

    async fn reset_session(&mut self) {
        self.engine.reset().await;
        self.history.clear().await;
        self.trackers.clear();
        self.pressed = None;
        self.replay_failures.clear();
        self.row_items.clear();
        self.input.clear();
        self.live.reset();
        info!("session reset");
    }

    fn tracker_for(&self, entry: &HistoryEntry) -> Option<PressTracker> {
        entry
            .value
            .is_some()
            .then(|| PressTracker::new(self.long_press))
    }

    /// The entry under a screen cell, if it takes gestures
    fn entry_at(&self, column: u16, row: u16) -> Option<usize> {
        let area = self.session_area;
        if column < area.x || column >= area.right() || row < area.y {
            return None;
        }
        self.row_items
            .get(usize::from(row - area.y))
            .copied()
            .flatten()
            .filter(|&index| matches!(self.trackers.get(index), Some(Some(_))))
    }

    fn gesture(&mut self, index: usize, event: GestureEvent) {
        let Some(tracker) = self.trackers.get_mut(index).and_then(Option::as_mut) else {
            warn!(index, "gesture for entry without a tracker");
            return;
        };
        let events = self.events.clone();
        let action = tracker.handle(event, move || {
            let _ = events.send(AppEvent::LongPressElapsed { item: index });
        });
        if let Some(action) = action {
            self.apply_gesture(index, action);
        }
    }

    fn apply_gesture(&mut self, index: usize, action: GestureAction) {
        let Some(entry) = self.history.entries().get(index) else {
            return;
        };
        debug!(index, ?action, "gesture");
        match action {
            GestureAction::Click => {
                if let Some(value) = entry.value.clone() {
                    self.input.insert_str(&value);
                    self.buffer_changed();
                }
            }
            GestureAction::LongPress => {
                let input = entry.input.clone();
                self.input.set(input);
                self.buffer_changed();
            }
        }
    }

    /// Render the application
    pub fn render(&mut self, frame: &mut Frame) {
        let layout = ComputedLayout::compute(frame.area(), &self.layout_config);

        let pane = SessionPane::new(self.history.entries(), &self.input)
            .preview(self.live.preview())
            .stale(&self.replay_failures)
            .pressed(self.pressed);
        let rows = pane.row_map(layout.session);
        frame.render_widget(&pane, layout.session);
        self.session_area = layout.session;
        self.row_items = rows;

        frame.render_widget(&ChipBar::new(self.live.completions()), layout.chips);
        self.render_status_bar(frame, layout.status);

        if self.show_help {
            self.render_help(frame, layout.session);
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let status_text = if let Some(msg) = &self.status_message {
            msg.clone()
        } else {
            StatusContent::new()
                .engine(&self.engine_label)
                .entries(self.history.entries().len())
                .replay_failures(self.replay_failures.len())
                .format(area.width)
        };

        let style = Style::default().bg(Color::DarkGray).fg(Color::White);
        let paragraph = Paragraph::new(Line::from(Span::styled(status_text, style)));
        frame.render_widget(paragraph, area);
    }

    fn render_help(&self, frame: &mut Frame, area: Rect) {
        let width = HELP.iter().map(|l| l.len()).max().unwrap_or(20) as u16 + 4;
        let height = HELP.len() as u16 + 2;
        let popup = Rect {
            x: area.x + area.width.saturating_sub(width) / 2,
            y: area.y + area.height.saturating_sub(height) / 2,
            width: width.min(area.width),
            height: height.min(area.height),
        };

        let lines: Vec<Line> = HELP.iter().map(|l| Line::from(*l)).collect();
        let help = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" unitcalc ")
                .border_style(Style::default().fg(Color::Cyan)),
        );

        frame.render_widget(Clear, popup);
        frame.render_widget(help, popup);
    }
}
