//! Engine child-process client
//!
//! Runs the calculation engine as a child process and talks to it with one
//! JSON object per line over stdin/stdout:
//!
//! ```text
//! -> {"id":1,"method":"evaluate","params":{"query":"2 m","update_context":false}}
//! <- {"id":1,"result":{"output":"2 m","statements":["2 m"],"value":"2 m",...}}
//! ```
//!
//! Requests are serialized through one connection lock, so concurrent callers
//! interleave at request granularity and never read each other's responses.

use super::{Engine, ErrorKind, EvalResult};
use crate::error::EngineError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::process::Stdio;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Messages without our id (logs, notifications) tolerated before giving up.
const MAX_SKIPPED_MESSAGES: usize = 100;

/// How long `shutdown` waits for the engine to exit on its own.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

#[derive(Serialize)]
struct Request<'a, T> {
    id: i64,
    method: &'a str,
    params: T,
}

#[derive(Deserialize, Debug)]
struct Response {
    id: Option<i64>,
    #[serde(default)]
    result: Value,
    error: Option<ResponseError>,
}

#[derive(Deserialize, Debug)]
struct ResponseError {
    message: String,
}

struct Connection {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

/// Calculation engine running in a child process.
pub struct ProcessEngine {
    command: String,
    conn: Mutex<Connection>,
    next_id: AtomicI64,
}

impl ProcessEngine {
    /// Spawn the engine. `command` is split on whitespace into program and
    /// arguments (so `"numbat-engine --prelude"` works).
    pub fn spawn(command: &str) -> Result<Self, EngineError> {
        let mut parts = command.split_whitespace();
        let program = parts.next().ok_or(EngineError::NoCommand)?;

        let mut child = Command::new(program)
            .args(parts)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EngineError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::Protocol("engine stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::Protocol("engine stdout unavailable".into()))?;

        info!(command, "started engine process");

        Ok(Self {
            command: command.to_string(),
            conn: Mutex::new(Connection {
                child,
                stdin,
                stdout: BufReader::new(stdout).lines(),
            }),
            next_id: AtomicI64::new(1),
        })
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Send a request and wait for the response with the same id.
    async fn request<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R, EngineError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut line = serde_json::to_string(&Request { id, method, params })
            .map_err(|e| EngineError::Protocol(e.to_string()))?;
        line.push('\n');

        let mut conn = self.conn.lock().await;
        conn.stdin.write_all(line.as_bytes()).await?;
        conn.stdin.flush().await?;

        let result = read_response(&mut conn.stdout, id).await?;
        serde_json::from_value(result)
            .map_err(|e| EngineError::Protocol(format!("{method} result: {e}")))
    }

    /// Close the engine's stdin and give it a moment to exit before killing it.
    pub async fn shutdown(self) {
        let mut conn = self.conn.into_inner();
        let _ = conn.stdin.shutdown().await;
        drop(conn.stdin);

        match tokio::time::timeout(SHUTDOWN_GRACE, conn.child.wait()).await {
            Ok(Ok(status)) => debug!(%status, "engine exited"),
            _ => {
                let _ = conn.child.kill().await;
            }
        }
    }
}

/// Read lines until the response for `expected_id` shows up.
async fn read_response(
    stdout: &mut Lines<BufReader<ChildStdout>>,
    expected_id: i64,
) -> Result<Value, EngineError> {
    let mut skipped = 0;

    loop {
        let line = stdout.next_line().await?.ok_or(EngineError::Closed)?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response: Response = serde_json::from_str(line)
            .map_err(|e| EngineError::Protocol(format!("{e} in: {line}")))?;

        if response.id == Some(expected_id) {
            if let Some(error) = response.error {
                return Err(EngineError::Remote(error.message));
            }
            return Ok(response.result);
        }

        skipped += 1;
        if skipped >= MAX_SKIPPED_MESSAGES {
            return Err(EngineError::Protocol(format!(
                "response {expected_id} not found after {MAX_SKIPPED_MESSAGES} messages"
            )));
        }
    }
}

impl Engine for ProcessEngine {
    async fn evaluate(&self, query: &str, mutate_context: bool) -> EvalResult {
        let params = json!({ "query": query, "update_context": mutate_context });
        match self.request("evaluate", params).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "evaluate failed");
                EvalResult::failure(ErrorKind::Other, format!("engine unavailable: {e}"))
            }
        }
    }

    async fn completions(&self, input: &str) -> Vec<String> {
        match self.request("completions", json!({ "input": input })).await {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "completions failed");
                Vec::new()
            }
        }
    }

    async fn symbol_for(&self, word: &str) -> Option<String> {
        match self.request("symbol_for", json!({ "word": word })).await {
            Ok(symbol) => symbol,
            Err(e) => {
                warn!(error = %e, "symbol lookup failed");
                None
            }
        }
    }

    async fn reset(&self) {
        if let Err(e) = self.request::<_, Value>("reset", json!({})).await {
            warn!(error = %e, "reset failed");
        }
    }
}
