//! Shared fixtures: an in-process engine with a tiny grammar and a store
//! that always fails.
//!
//! Grammar, one statement per line:
//!   `name = expr`, `expr`, where `expr` is `number [unit]`, `name`,
//!   optionally followed by `* number`. A trailing operator is a
//!   parse-incomplete error; an unknown name is a runtime error.
//!   Assignments produce no value.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use unitcalc::app::{App, AppSettings};
use unitcalc::engine::{Engine, ErrorKind, EvalResult};
use unitcalc::error::StoreError;
use unitcalc::event::AppEvent;
use unitcalc::history::HistoryStore;
use unitcalc::live::LiveInputPipeline;
use unitcalc::store::KeyValueStore;
use unitcalc::word::word_at;

const VOCABULARY: &[&str] = &["kelvin", "kg", "km", "kmh", "m", "meter", "mile", "ohm", "pi"];

#[derive(Debug, Clone, PartialEq)]
struct Quantity {
    amount: f64,
    unit: String,
}

impl Quantity {
    fn render(&self) -> String {
        let amount = if self.amount.fract() == 0.0 {
            format!("{}", self.amount as i64)
        } else {
            format!("{}", self.amount)
        };
        if self.unit.is_empty() {
            amount
        } else {
            format!("{} {}", amount, self.unit)
        }
    }
}

#[derive(Default)]
pub struct FakeEngine {
    bindings: RefCell<HashMap<String, Quantity>>,
    delays: RefCell<HashMap<String, Duration>>,
    calls: RefCell<Vec<(String, bool)>>,
    resets: RefCell<usize>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make evaluations of exactly `query` take `delay`.
    pub fn delay(&self, query: &str, delay: Duration) {
        self.delays.borrow_mut().insert(query.to_string(), delay);
    }

    /// Every `evaluate` call so far as `(query, mutate_context)`.
    pub fn calls(&self) -> Vec<(String, bool)> {
        self.calls.borrow().clone()
    }

    /// Inputs evaluated with bindings kept.
    pub fn committed(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter(|(_, mutate)| *mutate)
            .map(|(query, _)| query.clone())
            .collect()
    }

    pub fn binding(&self, name: &str) -> Option<String> {
        self.bindings.borrow().get(name).map(Quantity::render)
    }

    pub fn resets(&self) -> usize {
        *self.resets.borrow()
    }

    fn eval_expr(
        expr: &str,
        scope: &HashMap<String, Quantity>,
    ) -> Result<Quantity, (ErrorKind, String)> {
        let expr = expr.trim();
        if expr.is_empty() || expr.ends_with(['*', '=', '+', '-', '/']) {
            return Err((ErrorKind::ParseIncomplete, "unexpected end of input".into()));
        }

        let (term, factor) = match expr.split_once('*') {
            Some((term, factor)) => {
                let factor: f64 = factor
                    .trim()
                    .parse()
                    .map_err(|_| (ErrorKind::Parse, format!("expected a number: {}", factor)))?;
                (term.trim(), factor)
            }
            None => (expr, 1.0),
        };

        let mut parts = term.split_whitespace();
        let head = parts.next().unwrap_or_default();
        let mut quantity = if let Ok(amount) = head.parse::<f64>() {
            Quantity {
                amount,
                unit: parts.collect::<Vec<_>>().join(" "),
            }
        } else if parts.next().is_none() {
            scope
                .get(head)
                .cloned()
                .ok_or_else(|| (ErrorKind::Runtime, format!("unknown identifier '{}'", head)))?
        } else {
            return Err((ErrorKind::Parse, format!("unexpected input: {}", term)));
        };

        quantity.amount *= factor;
        Ok(quantity)
    }
}

impl Engine for FakeEngine {
    async fn evaluate(&self, query: &str, mutate_context: bool) -> EvalResult {
        self.calls
            .borrow_mut()
            .push((query.to_string(), mutate_context));

        let delay = self.delays.borrow().get(query).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut scope = self.bindings.borrow().clone();
        let mut statements = Vec::new();
        let mut last = None;

        for line in query.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let outcome = match line.split_once('=') {
                Some((name, expr)) if !name.trim().is_empty() => {
                    let name = name.trim().to_string();
                    Self::eval_expr(expr, &scope).map(|q| {
                        scope.insert(name, q);
                        None
                    })
                }
                _ => Self::eval_expr(line, &scope).map(Some),
            };
            match outcome {
                Ok(quantity) => {
                    statements.push(line.to_string());
                    last = quantity;
                }
                Err((kind, message)) => return EvalResult::failure(kind, message),
            }
        }

        if mutate_context {
            *self.bindings.borrow_mut() = scope;
        }

        let value = last.map(|q| q.render());
        EvalResult {
            output: value.clone().unwrap_or_default(),
            statements,
            value,
            ..EvalResult::default()
        }
    }

    async fn completions(&self, input: &str) -> Vec<String> {
        let word = word_at(input, input.len()).word;
        if word.is_empty() {
            return Vec::new();
        }
        let mut names: Vec<String> = VOCABULARY.iter().map(|w| w.to_string()).collect();
        names.extend(self.bindings.borrow().keys().cloned());
        names.retain(|name| name.starts_with(&word));
        names.sort();
        names
    }

    async fn symbol_for(&self, word: &str) -> Option<String> {
        match word {
            "ohm" => Some("Ω".to_string()),
            "pi" => Some("π".to_string()),
            _ => None,
        }
    }

    async fn reset(&self) {
        self.bindings.borrow_mut().clear();
        *self.resets.borrow_mut() += 1;
    }
}

/// A store whose every operation fails.
pub struct FailingStore;

impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("disk unplugged".into()))
    }

    async fn set(&mut self, _key: &str, _value: String) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("disk unplugged".into()))
    }

    async fn delete(&mut self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("disk unplugged".into()))
    }

    async fn save(&mut self) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("disk unplugged".into()))
    }
}

pub fn new_app<S: KeyValueStore>(
    engine: &Rc<FakeEngine>,
    store: S,
) -> (App<FakeEngine, S>, UnboundedReceiver<AppEvent>) {
    let (events, receiver) = mpsc::unbounded_channel();
    let app = App::new(
        Rc::clone(engine),
        HistoryStore::new(store),
        events,
        AppSettings::default(),
    );
    (app, receiver)
}

pub fn pipeline(
    engine: &Rc<FakeEngine>,
) -> (LiveInputPipeline<FakeEngine>, UnboundedReceiver<AppEvent>) {
    let (events, receiver) = mpsc::unbounded_channel();
    (LiveInputPipeline::new(Rc::clone(engine), events), receiver)
}

/// Deliver app events for `wait` of (paused) time.
pub async fn pump<S: KeyValueStore>(
    app: &mut App<FakeEngine, S>,
    receiver: &mut UnboundedReceiver<AppEvent>,
    wait: Duration,
) {
    let deadline = tokio::time::Instant::now() + wait;
    loop {
        tokio::select! {
            Some(event) = receiver.recv() => app.handle_event(event),
            _ = tokio::time::sleep_until(deadline) => break,
        }
    }
    while let Ok(event) = receiver.try_recv() {
        app.handle_event(event);
    }
}

/// Deliver live events to a bare pipeline for `wait` of (paused) time.
pub async fn pump_live(
    pipeline: &mut LiveInputPipeline<FakeEngine>,
    receiver: &mut UnboundedReceiver<AppEvent>,
    wait: Duration,
) {
    let deadline = tokio::time::Instant::now() + wait;
    loop {
        tokio::select! {
            Some(event) = receiver.recv() => {
                if let AppEvent::Live(event) = event {
                    pipeline.handle(event);
                }
            }
            _ = tokio::time::sleep_until(deadline) => break,
        }
    }
    while let Ok(AppEvent::Live(event)) = receiver.try_recv() {
        pipeline.handle(event);
    }
}

