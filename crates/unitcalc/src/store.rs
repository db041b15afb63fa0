//! Durable key-value storage.
//!
//! The backing store has no append primitive: callers `set` whole values and
//! then `save` to flush. `FileStore` keeps every key in one JSON object on
//! disk and replaces the file atomically on save, so a crash leaves either
//! the previous snapshot or the new one, never a torn write.

use crate::error::StoreError;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, warn};

/// File name used inside the data directory.
pub const STORE_FILE_NAME: &str = "store.json";

/// Minimal async key-value contract. Every call is a suspension point.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>>;

    fn set(&mut self, key: &str, value: String) -> impl Future<Output = Result<(), StoreError>>;

    fn delete(&mut self, key: &str) -> impl Future<Output = Result<(), StoreError>>;

    /// Flush pending changes to durable storage.
    fn save(&mut self) -> impl Future<Output = Result<(), StoreError>>;
}

/// JSON-file backed store.
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`.
    ///
    /// Never fails: a missing file starts empty, and an unreadable or
    /// malformed file is logged and treated as empty so startup proceeds.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "store file is malformed, starting empty");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read store file, starting empty");
                BTreeMap::new()
            }
        };
        debug!(path = %path.display(), keys = entries.len(), "opened store");
        Self { path, entries }
    }

    /// Open `store.json` inside `dir`.
    pub async fn open_in(dir: &Path) -> Self {
        Self::open(dir.join(STORE_FILE_NAME)).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    async fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn save(&mut self) -> Result<(), StoreError> {
        let content = serde_json::to_vec_pretty(&self.entries)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &content)).await??;
        Ok(())
    }
}

/// Write `content` to a temp file beside `path`, sync it, then rename over `path`.
fn write_atomic(path: &Path, content: &[u8]) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(io_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(io_err)?;
    tmp.write_all(content).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

/// In-memory store with explicit flush semantics.
///
/// Writes land in a pending map; `save` copies them into the durable map,
/// which is shared with every store produced by [`MemoryStore::reopen`].
/// Unsaved changes are lost on reopen, the same as a crash before flush.
#[derive(Default)]
pub struct MemoryStore {
    pending: HashMap<String, String>,
    durable: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh handle over the same durable contents, as after a restart.
    pub fn reopen(&self) -> Self {
        Self {
            pending: self.durable.borrow().clone(),
            durable: Rc::clone(&self.durable),
        }
    }

    /// Read a key from the durable side, ignoring unsaved changes.
    pub fn durable_value(&self, key: &str) -> Option<String> {
        self.durable.borrow().get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.pending.get(key).cloned())
    }

    async fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.pending.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        self.pending.remove(key);
        Ok(())
    }

    async fn save(&mut self) -> Result<(), StoreError> {
        *self.durable.borrow_mut() = self.pending.clone();
        Ok(())
    }
}
