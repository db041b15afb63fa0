//! Layout Manager
//!
//! Stacks the session pane over the completion chips and the status bar.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Layout configuration
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Height reserved for the completion chips
    pub chips_height: u16,
    /// Height reserved for status bar
    pub status_bar_height: u16,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            chips_height: 1,
            status_bar_height: 1,
        }
    }
}

/// The computed layout areas
#[derive(Debug, Clone, Copy)]
pub struct ComputedLayout {
    pub session: Rect,
    pub chips: Rect,
    pub status: Rect,
}

impl ComputedLayout {
    /// Compute the layout for a given terminal area
    pub fn compute(area: Rect, config: &LayoutConfig) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(config.chips_height),
                Constraint::Length(config.status_bar_height),
            ])
            .split(area);

        Self {
            session: chunks[0],
            chips: chunks[1],
            status: chunks[2],
        }
    }
}

/// Status bar content
#[derive(Debug, Clone, Default)]
pub struct StatusContent {
    /// Engine command in use
    pub engine: String,
    /// Number of committed entries
    pub entries: usize,
    /// Entries that failed to replay at startup
    pub replay_failures: usize,
    /// Any additional status message
    pub message: Option<String>,
}

impl StatusContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = engine.into();
        self
    }

    pub fn entries(mut self, entries: usize) -> Self {
        self.entries = entries;
        self
    }

    pub fn replay_failures(mut self, failures: usize) -> Self {
        self.replay_failures = failures;
        self
    }

    pub fn message(mut self, msg: Option<impl Into<String>>) -> Self {
        self.message = msg.map(Into::into);
        self
    }

    /// Format for display
    pub fn format(&self, width: u16) -> String {
        let left = format!(" {} ", self.engine);
        let middle = self.message.clone().unwrap_or_default();
        let right = if self.replay_failures > 0 {
            format!(
                " {} entries | {} failed replay ",
                self.entries, self.replay_failures
            )
        } else {
            format!(" {} entries ", self.entries)
        };

        let padding_needed = (width as usize)
            .saturating_sub(left.chars().count())
            .saturating_sub(middle.chars().count())
            .saturating_sub(right.chars().count());

        let left_pad = padding_needed / 2;
        let right_pad = padding_needed - left_pad;

        format!(
            "{}{}{}{}{}",
            left,
            " ".repeat(left_pad),
            middle,
            " ".repeat(right_pad),
            right
        )
    }
}
