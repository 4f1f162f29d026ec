//! External journal script bridge
//!
//! The script receives the entry as a single JSON argument and must print
//! exactly one line of JSON, `{"success": bool, "message"?: string}`.

use crate::entry::JournalEntry;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

pub const PARSE_FAILURE_MESSAGE: &str = "Failed to parse response";
const STDERR_PREVIEW_CHARS: usize = 2_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalReply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl JournalReply {
    pub fn parse_failure() -> Self {
        Self {
            success: false,
            message: Some(PARSE_FAILURE_MESSAGE.to_string()),
        }
    }
}

/// Parse the first non-empty line of the script's stdout.
pub fn parse_reply(stdout: &str) -> JournalReply {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .and_then(|line| serde_json::from_str(line).ok())
        .unwrap_or_else(JournalReply::parse_failure)
}

#[derive(Debug, Clone)]
pub struct JournalBridge {
    program: String,
    script: PathBuf,
    timeout: Option<Duration>,
}

impl JournalBridge {
    pub fn new(program: impl Into<String>, script: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            script: script.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Hand `entry` to the script. Never fails: every problem along the way
    /// is logged and reported as the parse-failure reply.
    pub async fn save(&self, entry: &JournalEntry) -> JournalReply {
        let payload = match serde_json::to_string(entry) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "serialize journal entry failed");
                return JournalReply::parse_failure();
            }
        };

        let mut cmd = Command::new(&self.program);
        cmd.arg(&self.script)
            .arg(&payload)
            .kill_on_drop(true)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::error!(
                    program = %self.program,
                    script = %self.script.display(),
                    error = %e,
                    "failed to launch journal script"
                );
                return JournalReply::parse_failure();
            }
        };

        let waited = match self.timeout {
            Some(limit) => match timeout(limit, child.wait_with_output()).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::error!(timeout_ms = limit.as_millis() as u64, "journal script timed out");
                    return JournalReply::parse_failure();
                }
            },
            None => child.wait_with_output().await,
        };

        let output = match waited {
            Ok(output) => output,
            Err(e) => {
                tracing::error!(error = %e, "wait for journal script failed");
                return JournalReply::parse_failure();
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(
                status = %output.status,
                stderr = %preview(&stderr, STDERR_PREVIEW_CHARS),
                "journal script exited unsuccessfully"
            );
        }

        let reply = parse_reply(&String::from_utf8_lossy(&output.stdout));
        tracing::info!(success = reply.success, "journal script replied");
        reply
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
