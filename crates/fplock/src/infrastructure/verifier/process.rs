//! Subprocess-backed verifier using `tokio::process`.
//!
//! Each call to [`Verifier::start`] spawns a fresh child with stdout piped.
//! The returned run yields stdout lines until EOF, then `finish` waits for
//! the exit status, so no child outlives its iteration.
//!
//! Lines are split on raw bytes and decoded lossily.  The verifier's output
//! is not guaranteed to be UTF-8 (device names, localised messages), and an
//! undecodable line must be skipped like any other noise rather than end
//! the run.
//!
//! Children are spawned with `kill_on_drop(true)`: if a run is dropped
//! without `finish` (e.g. on an error path) the child is killed rather than
//! left behind.

use async_trait::async_trait;
use fplock_core::VerifierCommand;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tracing::debug;

use crate::application::verify_loop::{Verifier, VerifierError, VerifierRun};

/// Runs a [`VerifierCommand`] as a child process.
#[derive(Debug, Clone)]
pub struct ProcessVerifier {
    command: VerifierCommand,
}

impl ProcessVerifier {
    /// Creates a verifier for `command`.
    pub fn new(command: VerifierCommand) -> Self {
        Self { command }
    }

    fn spawn_error(&self, source: std::io::Error) -> VerifierError {
        VerifierError::Spawn {
            command: self.command.to_string(),
            source,
        }
    }
}

#[async_trait]
impl Verifier for ProcessVerifier {
    fn describe(&self) -> String {
        self.command.to_string()
    }

    async fn start(&self) -> Result<Box<dyn VerifierRun>, VerifierError> {
        let mut child = Command::new(self.command.program())
            .args(self.command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdout = child.stdout.take().ok_or_else(|| {
            self.spawn_error(std::io::Error::new(
                std::io::ErrorKind::Other,
                "stdout was not captured",
            ))
        })?;

        debug!("spawned `{}` (pid {:?})", self.command, child.id());
        Ok(Box::new(ProcessRun {
            child,
            stdout: Some(BufReader::new(stdout)),
            buf: Vec::new(),
        }))
    }
}

/// One spawned child and its stdout reader.
struct ProcessRun {
    child: Child,
    stdout: Option<BufReader<ChildStdout>>,
    buf: Vec<u8>,
}

#[async_trait]
impl VerifierRun for ProcessRun {
    async fn next_line(&mut self) -> Result<Option<String>, VerifierError> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };
        self.buf.clear();
        let n = stdout
            .read_until(b'\n', &mut self.buf)
            .await
            .map_err(VerifierError::Read)?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(decode_line(&self.buf)))
    }

    async fn finish(mut self: Box<Self>) -> Result<Option<i32>, VerifierError> {
        // Close our end of the pipe first so a child still writing gets
        // EPIPE instead of blocking forever.
        self.stdout.take();
        let status = self.child.wait().await.map_err(VerifierError::Wait)?;
        debug!("verifier exited with {status}");
        Ok(status.code())
    }
}

/// Strips the line terminator and replaces invalid UTF-8 with U+FFFD.
fn decode_line(raw: &[u8]) -> String {
    let line = raw.strip_suffix(b"\n").unwrap_or(raw);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
