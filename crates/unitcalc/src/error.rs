//! Error types for the storage, engine, and configuration layers.
//!
//! None of these cross into the rendering path: storage errors are swallowed
//! by the history store, engine errors are turned into error results by the
//! engine adapter, and config errors only surface at startup.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure talking to the durable key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error at {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("could not encode store contents: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("store write task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Failure talking to the calculation engine process.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no engine command configured")]
    NoCommand,

    #[error("failed to start engine `{command}`: {source}")]
    Spawn { command: String, source: io::Error },

    #[error("engine pipe error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed engine message: {0}")]
    Protocol(String),

    #[error("engine closed its output")]
    Closed,

    #[error("engine reported: {0}")]
    Remote(String),
}

/// Failure loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
