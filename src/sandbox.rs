//! Sandboxed subprocess execution.
//!
//! External analyzers run through here: bounded stdout/stderr capture, an
//! absolute deadline that force-kills the child, and cooperative cancellation
//! that propagates to the caller as [`ExtractError::Cancelled`] rather than
//! being folded into a result.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::ExtractError;

/// Default per-stream capture cap, in characters.
pub const DEFAULT_OUTPUT_CAP: usize = 10_000_000;

/// Exit code reported when the deadline fired and the child was killed.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Exit code reported when the program could not be launched at all.
pub const LAUNCH_FAILURE_EXIT_CODE: i32 = 127;

/// Prefix of the stderr message emitted on launch failure.
pub const LAUNCH_FAILURE_PREFIX: &str = "[sandbox] failed to launch";

/// Stable prefix of the truncation sentinel, used when scanning captures.
const TRUNCATION_PREFIX: &str = "[OUTPUT TRUNCATED - exceeded ";

fn truncation_marker(cap: usize) -> String {
    format!("[OUTPUT TRUNCATED - exceeded {}M char limit]", cap / 1_000_000)
}

/// Captured outcome of one sandboxed invocation.
#[derive(Clone, Debug)]
pub struct SandboxOutput {
    /// Child exit code, or a sentinel for timeout / launch failure.
    pub exit_code: i32,
    /// Captured stdout, possibly ending in the truncation sentinel.
    pub stdout: String,
    /// Captured stderr, possibly ending in the truncation sentinel.
    pub stderr: String,
    /// True when the deadline fired and the child was killed.
    pub timed_out: bool,
}

impl SandboxOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }

    /// Whether either stream hit the capture cap. Detected by scanning for
    /// the sentinel so the flag survives serialization of the streams.
    pub fn output_truncated(&self) -> bool {
        self.stdout.contains(TRUNCATION_PREFIX) || self.stderr.contains(TRUNCATION_PREFIX)
    }
}

async fn read_capped<R: AsyncRead + Unpin>(reader: Option<R>, cap: usize) -> String {
    let mut reader = match reader {
        Some(r) => r,
        None => return String::new(),
    };
    // Keep at most cap*4 bytes (worst-case UTF-8 width) and drain the rest so
    // the child never blocks on a full pipe.
    let byte_cap = cap.saturating_mul(4);
    let mut buf: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 8192];
    let mut overflowed = false;
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                if buf.len() < byte_cap {
                    let take = n.min(byte_cap - buf.len());
                    buf.extend_from_slice(&chunk[..take]);
                    if take < n {
                        overflowed = true;
                    }
                } else {
                    overflowed = true;
                }
            }
            Err(_) => break,
        }
    }

    let mut text = String::from_utf8_lossy(&buf).into_owned();
    let chars = text.chars().count();
    if chars > cap || overflowed {
        text = text.chars().take(cap).collect();
        text.push_str(&truncation_marker(cap));
    }
    text
}

/// Run `program` with `args`, capturing both streams under the default cap.
pub async fn execute(
    program: &str,
    args: &[&str],
    working_dir: Option<&Path>,
    env: &[(&str, &str)],
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<SandboxOutput, ExtractError> {
    execute_with_cap(program, args, working_dir, env, timeout, cancel, DEFAULT_OUTPUT_CAP).await
}

/// [`execute`] with an explicit per-stream capture cap.
#[allow(clippy::too_many_arguments)]
pub async fn execute_with_cap(
    program: &str,
    args: &[&str],
    working_dir: Option<&Path>,
    env: &[(&str, &str)],
    timeout: Duration,
    cancel: &CancellationToken,
    output_cap: usize,
) -> Result<SandboxOutput, ExtractError> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }
    for (key, value) in env {
        cmd.env(key, value);
    }

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            debug!(program, %err, "sandbox launch failed");
            return Ok(SandboxOutput {
                exit_code: LAUNCH_FAILURE_EXIT_CODE,
                stdout: String::new(),
                stderr: format!("{} {}: {}", LAUNCH_FAILURE_PREFIX, program, err),
                timed_out: false,
            });
        }
    };

    let stdout_task = tokio::spawn(read_capped(child.stdout.take(), output_cap));
    let stderr_task = tokio::spawn(read_capped(child.stderr.take(), output_cap));

    enum Outcome {
        Cancelled,
        TimedOut,
        Exited(std::io::Result<std::process::ExitStatus>),
    }

    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => Outcome::Cancelled,
        _ = tokio::time::sleep(timeout) => Outcome::TimedOut,
        status = child.wait() => Outcome::Exited(status),
    };

    match outcome {
        Outcome::Cancelled => {
            let _ = child.start_kill();
            Err(ExtractError::Cancelled)
        }
        Outcome::TimedOut => {
            let _ = child.start_kill();
            let _ = child.wait().await;
            let stdout = stdout_task.await.unwrap_or_default();
            let stderr = stderr_task.await.unwrap_or_default();
            debug!(program, "sandbox deadline expired, child killed");
            Ok(SandboxOutput {
                exit_code: TIMEOUT_EXIT_CODE,
                stdout,
                stderr,
                timed_out: true,
            })
        }
        Outcome::Exited(status) => {
            let stdout = stdout_task.await.unwrap_or_default();
            let stderr = stderr_task.await.unwrap_or_default();
            let exit_code = match status {
                Ok(s) => s.code().unwrap_or(-1),
                Err(_) => -1,
            };
            Ok(SandboxOutput {
                exit_code,
                stdout,
                stderr,
                timed_out: false,
            })
        }
    }
}
