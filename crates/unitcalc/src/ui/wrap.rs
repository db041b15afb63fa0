//! Word wrapping for styled lines.
//!
//! The session pane wraps its lines here, at render time and with the real
//! width, then draws the rows unwrapped. Hit-testing uses the same rows, so
//! a row on screen and the entry it is attributed to always agree.

use ratatui::{
    style::Style,
    text::{Line, Span},
};
use unicode_width::UnicodeWidthChar;

/// Split `line` into rows no wider than `width` cells.
///
/// Rows break after the last whitespace that fits; a word longer than the
/// row is broken between characters. Styles carry over to every row. An
/// empty line still takes one row.
pub fn wrap_line(line: &Line<'_>, width: u16) -> Vec<Line<'static>> {
    let width = usize::from(width.max(1));
    let cells: Vec<(char, Style)> = line
        .spans
        .iter()
        .flat_map(|span| span.content.chars().map(move |ch| (ch, span.style)))
        .collect();

    let mut rows = Vec::new();
    let mut row: Vec<(char, Style)> = Vec::new();
    let mut row_width = 0;
    // Where the next row would start if we broke at a word boundary
    let mut break_at = 0;

    for (ch, style) in cells {
        let ch_width = ch.width().unwrap_or(0);
        if row_width + ch_width > width && !row.is_empty() {
            if break_at > 0 && break_at < row.len() {
                let carried = row.split_off(break_at);
                rows.push(to_line(&row, line.style));
                row = carried;
            } else {
                rows.push(to_line(&row, line.style));
                row.clear();
            }
            row_width = row.iter().map(|(c, _)| c.width().unwrap_or(0)).sum();
            break_at = 0;
        }

        row.push((ch, style));
        row_width += ch_width;
        if ch.is_whitespace() {
            break_at = row.len();
        }
    }

    rows.push(to_line(&row, line.style));
    rows
}

/// Regroup characters into spans of equal style.
fn to_line(cells: &[(char, Style)], line_style: Style) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut text = String::new();
    let mut current: Option<Style> = None;

    for &(ch, style) in cells {
        if current.is_some_and(|s| s != style) {
            spans.push(Span::styled(std::mem::take(&mut text), current.unwrap_or_default()));
        }
        current = Some(style);
        text.push(ch);
    }
    if let Some(style) = current {
        spans.push(Span::styled(text, style));
    }

    Line::from(spans).style(line_style)
}
