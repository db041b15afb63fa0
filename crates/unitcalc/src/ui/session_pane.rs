//! Session Pane Widget
//!
//! Displays the calculator session:
//! - Committed history entries (statements, printed output, result)
//! - Current input line with cursor
//! - Live preview of the input below it
//!
//! Also reports which screen rows belong to which history entry so pointer
//! gestures can be routed to the entry under them.

use crate::engine::PreviewResult;
use crate::history::HistoryEntry;
use crate::ui::wrap::wrap_line;
use crate::word::floor_char_boundary;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// Input buffer, caret and recall navigation
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Current input
    pub text: String,
    /// Byte offset of the caret, always on a char boundary
    pub cursor: usize,
    /// Recall index (None = editing, Some(i) = showing history input i)
    recall_index: Option<usize>,
    /// Input saved when recall started
    saved_input: String,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole buffer and put the caret at its end
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.text.len();
        self.recall_index = None;
    }

    /// Clear the input and reset recall navigation
    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
        self.recall_index = None;
        self.saved_input.clear();
    }

    pub fn insert_char(&mut self, ch: char) {
        self.text.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    pub fn insert_str(&mut self, s: &str) {
        self.text.insert_str(self.cursor, s);
        self.cursor += s.len();
    }

    /// Delete the character before the cursor
    pub fn backspace(&mut self) {
        if let Some(ch) = self.text[..self.cursor].chars().next_back() {
            self.cursor -= ch.len_utf8();
            self.text.remove(self.cursor);
        }
    }

    /// Delete the character at the cursor
    pub fn delete(&mut self) {
        if self.cursor < self.text.len() {
            self.text.remove(self.cursor);
        }
    }

    pub fn cursor_left(&mut self) {
        if let Some(ch) = self.text[..self.cursor].chars().next_back() {
            self.cursor -= ch.len_utf8();
        }
    }

    pub fn cursor_right(&mut self) {
        if let Some(ch) = self.text[self.cursor..].chars().next() {
            self.cursor += ch.len_utf8();
        }
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.text.len();
    }

    /// Show the previous committed input (up arrow)
    pub fn recall_prev(&mut self, history: &[HistoryEntry]) {
        if history.is_empty() {
            return;
        }

        match self.recall_index {
            None => {
                self.saved_input = self.text.clone();
                let last = history.len() - 1;
                self.recall_index = Some(last);
                self.text = history[last].input.clone();
            }
            Some(idx) if idx > 0 => {
                self.recall_index = Some(idx - 1);
                self.text = history[idx - 1].input.clone();
            }
            Some(_) => {}
        }
        self.cursor = self.text.len();
    }

    /// Move back towards the input being edited (down arrow)
    pub fn recall_next(&mut self, history: &[HistoryEntry]) {
        match self.recall_index {
            Some(idx) if idx + 1 < history.len() => {
                self.recall_index = Some(idx + 1);
                self.text = history[idx + 1].input.clone();
            }
            Some(_) => {
                self.recall_index = None;
                self.text = std::mem::take(&mut self.saved_input);
            }
            None => {}
        }
        self.cursor = self.text.len();
    }
}

/// The session pane widget
pub struct SessionPane<'a> {
    entries: &'a [HistoryEntry],
    input: &'a InputState,
    preview: Option<&'a PreviewResult>,
    /// Entries whose replay failed; drawn with a marker
    stale: &'a [usize],
    /// Entry currently held down
    pressed: Option<usize>,
    prompt: &'a str,
}

impl<'a> SessionPane<'a> {
    pub fn new(entries: &'a [HistoryEntry], input: &'a InputState) -> Self {
        Self {
            entries,
            input,
            preview: None,
            stale: &[],
            pressed: None,
            prompt: "> ",
        }
    }

    pub fn preview(mut self, preview: Option<&'a PreviewResult>) -> Self {
        self.preview = preview;
        self
    }

    pub fn stale(mut self, stale: &'a [usize]) -> Self {
        self.stale = stale;
        self
    }

    pub fn pressed(mut self, pressed: Option<usize>) -> Self {
        self.pressed = pressed;
        self
    }

    fn input_is_error(&self) -> bool {
        self.preview.is_some_and(|p| p.is_error)
    }

    /// Build the display lines, each tagged with the entry it belongs to
    fn build_lines(&self) -> Vec<(Line<'a>, Option<usize>)> {
        let mut lines = Vec::new();
        let continuation = "  ";

        for (index, entry) in self.entries.iter().enumerate() {
            let highlight = if self.pressed == Some(index) {
                Modifier::REVERSED
            } else {
                Modifier::empty()
            };

            for (i, statement) in entry.statements.iter().enumerate() {
                let marker = if i == 0 && self.stale.contains(&index) {
                    Span::styled("! ", Style::default().fg(Color::Yellow))
                } else if i == 0 {
                    Span::styled(self.prompt, Style::default().fg(Color::Green))
                } else {
                    Span::raw(continuation)
                };
                let spans = vec![
                    marker,
                    Span::styled(
                        statement.clone(),
                        Style::default().fg(Color::Cyan).add_modifier(highlight),
                    ),
                ];
                lines.push((Line::from(spans), Some(index)));
            }

            for printed in entry.print_output.lines() {
                lines.push((
                    Line::from(Span::styled(
                        format!("  {}", printed),
                        Style::default().fg(Color::DarkGray),
                    )),
                    Some(index),
                ));
            }

            if !entry.output.is_empty() {
                // Entries carrying a value can be clicked to insert it.
                let mut style = Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD | highlight);
                if entry.value.is_some() {
                    style = style.add_modifier(Modifier::UNDERLINED);
                }
                for output in entry.output.lines() {
                    lines.push((
                        Line::from(vec![
                            Span::styled("  = ", Style::default().fg(Color::DarkGray)),
                            Span::styled(output.to_string(), style),
                        ]),
                        Some(index),
                    ));
                }
            }
        }

        self.push_input_lines(&mut lines);

        if let Some(preview) = self.preview {
            let style = if preview.is_error {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            for printed in preview.print_output.lines() {
                lines.push((
                    Line::from(Span::styled(format!("  {}", printed), style)),
                    None,
                ));
            }
            for output in preview.output.lines() {
                let text = if preview.is_error {
                    format!("  {}", output)
                } else {
                    format!("  = {}", output)
                };
                lines.push((Line::from(Span::styled(text, style)), None));
            }
        }

        lines
    }

    fn push_input_lines(&self, lines: &mut Vec<(Line<'a>, Option<usize>)>) {
        let prompt_style = if self.input_is_error() {
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        };
        let text = self.input.text.as_str();
        let cursor = floor_char_boundary(text, self.input.cursor);
        let input_lines: Vec<&str> = text.split('\n').collect();

        // Line holding the caret and the caret's byte column in it
        let mut cursor_line = 0;
        let mut cursor_col = cursor;
        let mut pos = 0;
        for (i, line_text) in input_lines.iter().enumerate() {
            let line_end = pos + line_text.len();
            if cursor <= line_end {
                cursor_line = i;
                cursor_col = cursor - pos;
                break;
            }
            pos = line_end + 1;
        }

        for (i, line_text) in input_lines.iter().enumerate() {
            let prompt = if i == 0 { "calc> " } else { "....  " };
            let mut spans = vec![Span::styled(prompt, prompt_style)];

            if i == cursor_line {
                let (before, after) = line_text.split_at(cursor_col.min(line_text.len()));
                if !before.is_empty() {
                    spans.push(Span::raw(before.to_string()));
                }
                let cursor_len = after.chars().next().map_or(0, |c| c.len_utf8());
                let cursor_char = if cursor_len == 0 { " " } else { &after[..cursor_len] };
                spans.push(Span::styled(
                    cursor_char.to_string(),
                    Style::default().bg(Color::White).fg(Color::Black),
                ));
                if after.len() > cursor_len {
                    spans.push(Span::raw(after[cursor_len..].to_string()));
                }
            } else {
                spans.push(Span::raw(line_text.to_string()));
            }

            lines.push((Line::from(spans), None));
        }
    }

    /// Display rows for a pane `width` cells wide, each tagged with its entry
    fn rows(&self, width: u16) -> Vec<(Line<'static>, Option<usize>)> {
        self.build_lines()
            .iter()
            .flat_map(|(line, owner)| {
                wrap_line(line, width)
                    .into_iter()
                    .map(move |row| (row, *owner))
            })
            .collect()
    }

    /// Rows hidden above `area` so the input stays in view
    fn scroll(total: usize, area: Rect) -> usize {
        total.saturating_sub(usize::from(area.height))
    }

    /// For each row of `area`, the history entry drawn there (if any).
    pub fn row_map(&self, area: Rect) -> Vec<Option<usize>> {
        let rows = self.rows(area.width);
        let scroll = Self::scroll(rows.len(), area);
        rows.into_iter()
            .skip(scroll)
            .take(usize::from(area.height))
            .map(|(_, owner)| owner)
            .collect()
    }
}

impl Widget for &SessionPane<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let rows = self.rows(area.width);
        let scroll = SessionPane::scroll(rows.len(), area);
        let lines: Vec<Line> = rows.into_iter().skip(scroll).map(|(line, _)| line).collect();

        // Already wrapped to the area width
        Paragraph::new(lines).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(input: &str, output: &str) -> HistoryEntry {
        HistoryEntry {
            input: input.to_string(),
            statements: vec![input.to_string()],
            output: output.to_string(),
            print_output: String::new(),
            value: Some(output.to_string()),
        }
    }

    fn assignment(input: &str) -> HistoryEntry {
        HistoryEntry {
            input: input.to_string(),
            statements: vec![input.to_string()],
            output: String::new(),
            print_output: String::new(),
            value: None,
        }
    }

    fn row_text(buf: &Buffer, row: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, row)].symbol().to_string())
            .collect()
    }

    #[test]
    fn test_input_editing() {
        let mut state = InputState::new();

        state.insert_char('h');
        state.insert_char('i');
        assert_eq!(state.text, "hi");
        assert_eq!(state.cursor, 2);

        state.backspace();
        assert_eq!(state.text, "h");
        assert_eq!(state.cursor, 1);

        state.cursor_left();
        state.insert_char('x');
        assert_eq!(state.text, "xh");
    }

    #[test]
    fn test_multibyte_editing() {
        let mut state = InputState::new();
        state.insert_str("5 Ω");
        assert_eq!(state.cursor, "5 Ω".len());

        state.cursor_left();
        assert_eq!(state.cursor, 2);
        state.cursor_right();
        assert_eq!(state.cursor, "5 Ω".len());

        state.backspace();
        assert_eq!(state.text, "5 ");
        state.cursor_home();
        state.delete();
        assert_eq!(state.text, " ");
    }

    #[test]
    fn test_recall() {
        let history = vec![entry("a = 5 m", "5 m"), entry("a * 2", "10 m")];
        let mut state = InputState::new();
        state.insert_str("draft");

        state.recall_prev(&history);
        assert_eq!(state.text, "a * 2");
        state.recall_prev(&history);
        assert_eq!(state.text, "a = 5 m");
        state.recall_prev(&history);
        assert_eq!(state.text, "a = 5 m");

        state.recall_next(&history);
        assert_eq!(state.text, "a * 2");
        state.recall_next(&history);
        assert_eq!(state.text, "draft");
        assert_eq!(state.cursor, 5);
    }

    #[test]
    fn test_row_map_tracks_entries() {
        let history = vec![entry("a = 5 m", "5 m"), entry("a * 2", "10 m")];
        let input = InputState::new();
        let pane = SessionPane::new(&history, &input);

        let rows = pane.row_map(Rect::new(0, 0, 40, 10));
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0], Some(0));
        assert_eq!(rows[1], Some(0));
        assert_eq!(rows[2], Some(1));
        assert_eq!(rows[3], Some(1));
        assert_eq!(rows[4], None);
    }

    #[test]
    fn test_row_map_scrolls_to_bottom() {
        let history: Vec<_> = (0..10).map(|i| entry(&format!("x{}", i), "1")).collect();
        let input = InputState::new();
        let pane = SessionPane::new(&history, &input);

        // 20 history rows + input row, only the last 3 visible.
        let rows = pane.row_map(Rect::new(0, 0, 40, 3));
        assert_eq!(rows, vec![Some(9), Some(9), None]);
    }

    #[test]
    fn test_render_with_preview() {
        let history = vec![entry("a = 5 m", "5 m")];
        let mut input = InputState::new();
        input.insert_str("a");
        let preview = PreviewResult {
            output: "5 m".to_string(),
            ..PreviewResult::default()
        };
        let pane = SessionPane::new(&history, &input).preview(Some(&preview));

        let area = Rect::new(0, 0, 40, 10);
        let mut buf = Buffer::empty(area);
        (&pane).render(area, &mut buf);

        assert!(row_text(&buf, 3).contains("= 5 m"));
    }

    #[test]
    fn test_row_map_follows_word_wrap() {
        let history = vec![assignment("aaaaaa bbbbbb cccccc"), entry("zz", "7")];
        let input = InputState::new();
        let pane = SessionPane::new(&history, &input);
        let area = Rect::new(0, 0, 12, 10);

        let rows = pane.row_map(area);
        let mut buf = Buffer::empty(area);
        (&pane).render(area, &mut buf);

        assert_eq!(rows, vec![Some(0), Some(0), Some(0), Some(1), Some(1), None]);
        assert!(row_text(&buf, 1).starts_with("bbbbbb"));
        assert!(row_text(&buf, 2).starts_with("cccccc"));
        assert!(row_text(&buf, 3).starts_with("> zz"));
        assert!(row_text(&buf, 4).contains("= 7"));
    }

    #[test]
    fn test_wrapped_rows_scroll_with_the_map() {
        let history = vec![assignment("aaaaaa bbbbbb cccccc"), entry("zz", "7")];
        let input = InputState::new();
        let pane = SessionPane::new(&history, &input);
        let area = Rect::new(0, 0, 12, 3);

        let rows = pane.row_map(area);
        let mut buf = Buffer::empty(area);
        (&pane).render(area, &mut buf);

        assert_eq!(rows, vec![Some(1), Some(1), None]);
        assert!(row_text(&buf, 0).starts_with("> zz"));
        assert!(row_text(&buf, 1).contains("= 7"));
        assert!(row_text(&buf, 2).starts_with("calc>"));
    }
}
