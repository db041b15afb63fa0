//! Calculation engine interface
//!
//! The engine parses and evaluates queries and keeps the session bindings.
//! This crate only drives it: every call is a suspension point, and engine
//! failures come back as data (`EvalResult::is_error`) rather than as `Err`.

mod process;

pub use process::ProcessEngine;

use serde::{Deserialize, Serialize};
use std::future::Future;

/// Classification of an evaluation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The input is a valid prefix of a longer valid expression.
    ParseIncomplete,
    Parse,
    Type,
    Runtime,
    #[serde(other)]
    Other,
}

/// Everything the engine reports about one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalResult {
    pub output: String,
    pub print_output: String,
    pub is_error: bool,
    pub error_kind: Option<ErrorKind>,
    pub statements: Vec<String>,
    pub value: Option<String>,
}

impl EvalResult {
    /// An error result produced on this side of the engine boundary.
    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            output: message.into(),
            is_error: true,
            error_kind: Some(kind),
            ..Self::default()
        }
    }

    /// Strip the commit-only fields.
    pub fn preview(&self) -> PreviewResult {
        PreviewResult {
            output: self.output.clone(),
            print_output: self.print_output.clone(),
            is_error: self.is_error,
            error_kind: self.error_kind,
        }
    }
}

/// Result of a non-mutating evaluation, shown below the input line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewResult {
    pub output: String,
    pub print_output: String,
    pub is_error: bool,
    pub error_kind: Option<ErrorKind>,
}

impl PreviewResult {
    /// Incomplete input is expected while typing and gets debounced.
    pub fn is_parse_incomplete(&self) -> bool {
        self.is_error && self.error_kind == Some(ErrorKind::ParseIncomplete)
    }
}

/// The external stateful calculator.
pub trait Engine {
    /// Evaluate `query`. With `mutate_context` the engine keeps any bindings
    /// the query introduces; without it the evaluation is a throwaway preview.
    fn evaluate(&self, query: &str, mutate_context: bool) -> impl Future<Output = EvalResult>;

    /// Completion candidates for the whole input.
    fn completions(&self, input: &str) -> impl Future<Output = Vec<String>>;

    /// Symbol substitution for a single word (e.g. a name to its glyph).
    fn symbol_for(&self, word: &str) -> impl Future<Output = Option<String>>;

    /// Drop all session bindings.
    fn reset(&self) -> impl Future<Output = ()>;
}
