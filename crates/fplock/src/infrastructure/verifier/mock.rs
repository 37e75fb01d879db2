//! Scripted verifier for unit and integration tests.
//!
//! # Why a scripted verifier?
//!
//! `fprintd-verify` needs a D-Bus system bus, a fingerprint reader and a
//! finger.  `ScriptedVerifier` replays one prepared transcript per
//! invocation instead, and records how many lines each run had read and
//! whether its exit status was collected, so tests can assert that no run
//! was abandoned half-read.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::application::verify_loop::{Verifier, VerifierError, VerifierRun};

/// One prepared verifier invocation.
#[derive(Debug, Clone)]
pub struct ScriptedRun {
    lines: Vec<String>,
    exit_code: Option<i32>,
    spawn_fails: bool,
    read_failure: bool,
}

impl ScriptedRun {
    /// A run that prints `text` (one line per `\n`) and exits 0.
    pub fn output(text: &str) -> Self {
        Self {
            lines: text.lines().map(str::to_string).collect(),
            exit_code: Some(0),
            spawn_fails: false,
            read_failure: false,
        }
    }

    /// A run whose program cannot be started.
    pub fn spawn_failure() -> Self {
        Self {
            spawn_fails: true,
            ..Self::output("")
        }
    }

    /// Overrides the exit code (`None`: killed by a signal).
    pub fn with_exit_code(mut self, code: Option<i32>) -> Self {
        self.exit_code = code;
        self
    }

    /// Makes the read after the last line fail instead of reporting EOF.
    pub fn with_read_failure(mut self) -> Self {
        self.read_failure = true;
        self
    }
}

/// What happened to one started run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunRecord {
    /// Lines handed out by `next_line`.
    pub lines_read: usize,
    /// Lines the script contained.
    pub lines_total: usize,
    /// Whether `finish` was called.
    pub finished: bool,
}

/// A [`Verifier`] that replays [`ScriptedRun`]s in order.
///
/// Once the script is exhausted every further start fails as if the program
/// were missing.
#[derive(Debug, Default)]
pub struct ScriptedVerifier {
    script: Mutex<VecDeque<ScriptedRun>>,
    records: Arc<Mutex<Vec<RunRecord>>>,
    starts: AtomicUsize,
}

impl ScriptedVerifier {
    pub fn new(script: Vec<ScriptedRun>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    /// Number of `start` calls, including failed ones.
    pub fn invocations(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    /// Records of every run that was successfully started.
    pub fn records(&self) -> Vec<RunRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn next_run(&self) -> Option<ScriptedRun> {
        self.script.lock().ok()?.pop_front()
    }
}

#[async_trait]
impl Verifier for ScriptedVerifier {
    fn describe(&self) -> String {
        "scripted verifier".to_string()
    }

    async fn start(&self) -> Result<Box<dyn VerifierRun>, VerifierError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        let run = match self.next_run() {
            Some(run) if !run.spawn_fails => run,
            Some(_) => return Err(spawn_error("scripted spawn failure")),
            None => return Err(spawn_error("script exhausted")),
        };

        let index = match self.records.lock() {
            Ok(mut records) => {
                records.push(RunRecord {
                    lines_total: run.lines.len(),
                    ..RunRecord::default()
                });
                records.len() - 1
            }
            Err(_) => return Err(spawn_error("record store poisoned")),
        };

        Ok(Box::new(ScriptedHandle {
            lines: run.lines.into(),
            exit_code: run.exit_code,
            read_failure: run.read_failure,
            records: Arc::clone(&self.records),
            index,
        }))
    }
}

fn spawn_error(reason: &str) -> VerifierError {
    VerifierError::Spawn {
        command: "scripted verifier".to_string(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, reason.to_string()),
    }
}

/// A started scripted run.
struct ScriptedHandle {
    lines: VecDeque<String>,
    exit_code: Option<i32>,
    read_failure: bool,
    records: Arc<Mutex<Vec<RunRecord>>>,
    index: usize,
}

impl ScriptedHandle {
    fn update(&self, f: impl FnOnce(&mut RunRecord)) {
        if let Ok(mut records) = self.records.lock() {
            if let Some(record) = records.get_mut(self.index) {
                f(record);
            }
        }
    }
}

#[async_trait]
impl VerifierRun for ScriptedHandle {
    async fn next_line(&mut self) -> Result<Option<String>, VerifierError> {
        match self.lines.pop_front() {
            Some(line) => {
                self.update(|r| r.lines_read += 1);
                Ok(Some(line))
            }
            None if self.read_failure => Err(VerifierError::Read(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "scripted read failure",
            ))),
            None => Ok(None),
        }
    }

    async fn finish(self: Box<Self>) -> Result<Option<i32>, VerifierError> {
        self.update(|r| r.finished = true);
        Ok(self.exit_code)
    }
}
