//! Completion chips shown under the input.

use crate::completion::CompletionSet;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

pub struct ChipBar<'a> {
    set: &'a CompletionSet,
}

impl<'a> ChipBar<'a> {
    pub fn new(set: &'a CompletionSet) -> Self {
        Self { set }
    }

    fn build_line(&self) -> Line<'a> {
        let mut spans = Vec::new();
        for (i, item) in self.set.items().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            let style = if i == self.set.index() {
                Style::default()
                    .bg(Color::Blue)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD)
            } else if i == 0 && self.set.symbol().is_some() {
                Style::default().fg(Color::Magenta)
            } else {
                Style::default().fg(Color::Gray)
            };
            spans.push(Span::styled(format!(" {} ", item), style));
        }
        Line::from(spans)
    }
}

impl Widget for &ChipBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(self.build_line()).render(area, buf);
    }
}
