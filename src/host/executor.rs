//! Host process execution
//!
//! One child process per call: no pooling, no session reuse, no retry. The
//! wait is bounded; a host that does not exit in time is killed and the call
//! fails with [`IndigoError::Timeout`].

use super::script::ScriptPayload;
use crate::config::HostConfig;
use crate::error::{IndigoError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, warn};

/// Captured outcome of a single host invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionResult {
    pub fn success<S: Into<String>>(stdout: S) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failure<S: Into<String>>(exit_code: i32, stderr: S) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    /// Decode stdout as the operation's JSON document.
    ///
    /// A nonzero exit yields [`IndigoError::HostExecution`] carrying stderr
    /// verbatim.
    pub fn into_document(self) -> Result<serde_json::Value> {
        if !self.is_success() {
            return Err(IndigoError::HostExecution {
                exit_code: self.exit_code,
                stderr: self.stderr,
            });
        }

        serde_json::from_str(self.stdout.trim()).map_err(|e| {
            IndigoError::decode(format!(
                "host stdout is not a JSON document ({e}): {}",
                truncate(&self.stdout, 200)
            ))
        })
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Runs host scripts
#[async_trait]
pub trait HostExecutor: Send + Sync {
    /// Run `payload` once and capture its output
    async fn execute(&self, payload: &ScriptPayload) -> Result<ExecutionResult>;

    /// Run `payload` and decode the resulting document
    async fn run(&self, payload: &ScriptPayload) -> Result<serde_json::Value> {
        self.execute(payload).await?.into_document()
    }
}

/// Executes scripts by spawning the host executable
#[derive(Debug, Clone)]
pub struct ProcessHostExecutor {
    executable: String,
    exec_flag: String,
    extra_args: Vec<String>,
    timeout: Duration,
}

impl ProcessHostExecutor {
    pub fn new(config: &HostConfig) -> Self {
        Self {
            executable: config.executable.clone(),
            exec_flag: config.exec_flag.clone(),
            extra_args: config.extra_args.clone(),
            timeout: config.timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl HostExecutor for ProcessHostExecutor {
    async fn execute(&self, payload: &ScriptPayload) -> Result<ExecutionResult> {
        let started = Instant::now();

        let child = Command::new(&self.executable)
            .args(&self.extra_args)
            .arg(&self.exec_flag)
            .arg(payload.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                IndigoError::host_unavailable(format!("failed to start {}: {e}", self.executable))
            })?;

        // Dropping the wait future on expiry drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                warn!(
                    executable = %self.executable,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Host process timed out, killing it"
                );
                return Err(IndigoError::timeout(format!(
                    "{} did not exit within {:?}",
                    self.executable, self.timeout
                )));
            }
        };

        let result = ExecutionResult {
            // Terminated by signal: no exit code, report as failure
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        debug!(
            exit_code = result.exit_code,
            stdout_bytes = result.stdout.len(),
            stderr_bytes = result.stderr.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Host process finished"
        );

        Ok(result)
    }
}
