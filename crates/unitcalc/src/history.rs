//! History Store
//!
//! Durable, ordered log of accepted calculations. The whole log is stored as
//! one JSON array under a single key and rewritten on every append. Storage
//! failures are logged and swallowed here so they never reach the UI.

use crate::engine::EvalResult;
use crate::error::StoreError;
use crate::store::KeyValueStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Default key holding the serialized log.
pub const HISTORY_KEY: &str = "history";

/// One accepted calculation, exactly as it was rendered when committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub input: String,
    pub statements: Vec<String>,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub print_output: String,
    #[serde(default)]
    pub value: Option<String>,
}

impl HistoryEntry {
    /// Build an entry from a successful commit evaluation.
    pub fn from_eval(input: impl Into<String>, result: EvalResult) -> Self {
        Self {
            input: input.into(),
            statements: result.statements,
            output: result.output,
            print_output: result.print_output,
            value: result.value,
        }
    }
}

/// Owner of the persisted history log and its in-memory mirror.
pub struct HistoryStore<S> {
    store: S,
    key: String,
    entries: Vec<HistoryEntry>,
}

impl<S: KeyValueStore> HistoryStore<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, HISTORY_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            entries: Vec::new(),
        }
    }

    /// The in-memory log, oldest first.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Append `entry` and flush the whole log to durable storage.
    pub async fn append(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
        if let Err(e) = self.persist().await {
            warn!(error = %e, entries = self.entries.len(), "could not persist history");
        }
    }

    async fn persist(&mut self) -> Result<(), StoreError> {
        let serialized = serde_json::to_string(&self.entries)?;
        self.store.set(&self.key, serialized).await?;
        self.store.save().await?;
        debug!(entries = self.entries.len(), "history persisted");
        Ok(())
    }

    /// Load the persisted log, replacing the in-memory mirror.
    ///
    /// A missing, unreadable, or malformed log yields an empty history.
    pub async fn load_all(&mut self) -> Vec<HistoryEntry> {
        let raw = match self.store.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => String::new(),
            Err(e) => {
                warn!(error = %e, "could not read history");
                String::new()
            }
        };

        let mut entries = if raw.is_empty() {
            Vec::new()
        } else {
            match serde_json::from_str::<Vec<HistoryEntry>>(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(error = %e, "history is malformed, starting empty");
                    Vec::new()
                }
            }
        };

        let before = entries.len();
        entries.retain(|entry| !entry.statements.is_empty());
        if entries.len() != before {
            warn!(dropped = before - entries.len(), "dropped history entries without statements");
        }

        self.entries = entries.clone();
        entries
    }

    /// Delete the persisted log and forget the in-memory one.
    pub async fn clear(&mut self) {
        self.entries.clear();
        if let Err(e) = self.remove().await {
            warn!(error = %e, "could not clear history");
        }
    }

    async fn remove(&mut self) -> Result<(), StoreError> {
        self.store.delete(&self.key).await?;
        self.store.save().await
    }
}
