//! Completion chips for the token under the cursor.
//!
//! A set is built only once both the completion list and the symbol lookup
//! have come back, and it never offers the token itself.

use crate::word::word_at;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionSet {
    /// The token the set was computed for.
    word: String,
    /// Symbol substitution (e.g. `ohm` -> `Ω`), shown first.
    symbol: Option<String>,
    candidates: Vec<String>,
    /// Selected chip index
    index: usize,
}

impl CompletionSet {
    pub fn new(word: impl Into<String>, candidates: Vec<String>, symbol: Option<String>) -> Self {
        let word = word.into();
        let symbol = symbol.filter(|s| !s.is_empty() && *s != word);

        let mut kept: Vec<String> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if candidate != word && !kept.contains(&candidate) {
                kept.push(candidate);
            }
        }

        Self {
            word,
            symbol,
            candidates: kept,
            index: 0,
        }
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// All chips in display order: the symbol first, then candidates.
    pub fn items(&self) -> impl Iterator<Item = &str> {
        self.symbol
            .as_deref()
            .into_iter()
            .chain(self.candidates.iter().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        self.candidates.len() + usize::from(self.symbol.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn selected(&self) -> Option<&str> {
        self.items().nth(self.index)
    }

    /// Move selection forward (wraps around).
    pub fn next(&mut self) {
        if !self.is_empty() {
            self.index = (self.index + 1) % self.len();
        }
    }

    /// Move selection back (wraps around).
    pub fn prev(&mut self) {
        if !self.is_empty() {
            self.index = self.index.checked_sub(1).unwrap_or(self.len() - 1);
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Replace the word under `cursor` with the selected chip.
    ///
    /// Returns the new buffer and cursor, or `None` when the caret is no
    /// longer on the word the set was fetched for.
    pub fn accept(&self, buffer: &str, cursor: usize) -> Option<(String, usize)> {
        let chip = self.selected()?;
        let span = word_at(buffer, cursor);
        if span.word != self.word {
            return None;
        }

        let mut text = String::with_capacity(buffer.len() + chip.len());
        text.push_str(&buffer[..span.start]);
        text.push_str(chip);
        text.push_str(&buffer[span.end..]);

        Some((text, span.start + chip.len()))
    }
}
