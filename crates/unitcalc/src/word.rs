//! Word Boundary Resolver
//!
//! Finds the token under the cursor. Completion lookup and chip acceptance
//! both work on this span, so the separator set has to match what the engine
//! treats as operator and punctuation characters.

/// Characters that end a word, in addition to whitespace.
const SEPARATORS: &[char] = &[
    '+', '-', '*', '/', '^', '(', ')', '=', '<', '>', ',', '.', ';', ':',
];

/// The token under the cursor, as a byte range into the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordSpan {
    pub start: usize,
    pub end: usize,
    pub word: String,
}

/// Whether `c` separates words.
pub fn is_separator(c: char) -> bool {
    c.is_whitespace() || SEPARATORS.contains(&c)
}

/// Find the largest byte index <= pos that is a valid char boundary.
/// This is a stable implementation of the nightly `str::floor_char_boundary`.
pub fn floor_char_boundary(s: &str, pos: usize) -> usize {
    if pos >= s.len() {
        s.len()
    } else if s.is_char_boundary(pos) {
        pos
    } else {
        let mut p = pos;
        while p > 0 && !s.is_char_boundary(p) {
            p -= 1;
        }
        p
    }
}

/// Locate the word around `cursor`.
///
/// Scans backward while the preceding character is not a separator, then
/// forward under the same rule. Never fails: a cursor sitting between two
/// separators (or in an empty buffer) yields an empty word at the cursor.
pub fn word_at(text: &str, cursor: usize) -> WordSpan {
    let cursor = floor_char_boundary(text, cursor);

    let start = text[..cursor]
        .char_indices()
        .rev()
        .find(|&(_, c)| is_separator(c))
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);

    let end = text[cursor..]
        .char_indices()
        .find(|&(_, c)| is_separator(c))
        .map(|(i, _)| cursor + i)
        .unwrap_or(text.len());

    WordSpan {
        start,
        end,
        word: text[start..end].to_string(),
    }
}
