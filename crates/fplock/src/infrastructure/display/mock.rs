//! Mock display server for unit testing.
//!
//! # Why a mock display?
//!
//! The real adapter talks to an X server, which:
//!
//! - Requires a running display (`DISPLAY` set, server reachable).
//! - Actually blanks the screen and grabs the test machine's input.
//! - Cannot be made to refuse a grab on demand.
//!
//! `MockDisplay` replaces all of that with in-memory bookkeeping.  Every
//! live handle, held grab, raise and sync is recorded in public fields so
//! tests can assert on exactly what happened, including that failed outputs
//! leave nothing allocated.
//!
//! Grabs are modelled the way X does them: one pointer grab and one keyboard
//! grab per client connection.  A successful grab moves it to the latest
//! output, and destroying a handle only releases the grabs when it was the
//! last live one.
//!
//! # Scripting failures
//!
//! Builder methods make an output's overlay creation fail, or make its
//! pointer/keyboard grab refuse a number of attempts (or forever).

use std::collections::{BTreeSet, HashMap, HashSet};

use fplock_core::{GrabOutcome, OutputId};

use crate::application::acquire_grab::{DisplayError, DisplayServer, OutputHandle};

/// Handle returned by [`MockDisplay`].  Deliberately not `Clone`.
#[derive(Debug, PartialEq, Eq)]
pub struct MockLock {
    output: OutputId,
}

impl OutputHandle for MockLock {
    fn output(&self) -> OutputId {
        self.output
    }
}

/// A display that records calls instead of talking to an X server.
#[derive(Debug, Default)]
pub struct MockDisplay {
    /// Outputs reported by `outputs()`.
    pub outputs: Vec<OutputId>,
    /// Outputs whose overlay creation fails.
    pub setup_failures: HashSet<OutputId>,
    /// Refused pointer attempts before one succeeds (`u32::MAX`: never).
    pub pointer_busy: HashMap<OutputId, u32>,
    /// Refused keyboard attempts before one succeeds (`u32::MAX`: never).
    pub keyboard_busy: HashMap<OutputId, u32>,
    /// Pointer attempts made per output.
    pub pointer_tries: HashMap<OutputId, u32>,
    /// Keyboard attempts made per output.
    pub keyboard_tries: HashMap<OutputId, u32>,
    /// Outputs with a live (not yet destroyed) handle.
    pub live: BTreeSet<OutputId>,
    /// Output whose root holds the client's pointer grab.
    pub pointer_grab: Option<OutputId>,
    /// Output whose root holds the client's keyboard grab.
    pub keyboard_grab: Option<OutputId>,
    /// Outputs whose root window is being watched.
    pub watched: BTreeSet<OutputId>,
    /// Raise count per output.
    pub raises: HashMap<OutputId, u32>,
    /// Handles created so far.
    pub created: u32,
    /// Handles destroyed so far.
    pub destroyed: u32,
    /// `sync()` calls so far.
    pub syncs: u32,
}

impl MockDisplay {
    /// A display with outputs `0..count`, all of which lock first time.
    pub fn with_outputs(count: u32) -> Self {
        Self {
            outputs: (0..count).map(OutputId).collect(),
            ..Self::default()
        }
    }

    /// Makes overlay creation fail for `output`.
    pub fn failing_setup(mut self, output: OutputId) -> Self {
        self.setup_failures.insert(output);
        self
    }

    /// Refuses the first `refusals` pointer attempts on `output`.
    pub fn pointer_busy_for(mut self, output: OutputId, refusals: u32) -> Self {
        self.pointer_busy.insert(output, refusals);
        self
    }

    /// Refuses every pointer attempt on `output`.
    pub fn pointer_never_grabs(self, output: OutputId) -> Self {
        self.pointer_busy_for(output, u32::MAX)
    }

    /// Refuses the first `refusals` keyboard attempts on `output`.
    pub fn keyboard_busy_for(mut self, output: OutputId, refusals: u32) -> Self {
        self.keyboard_busy.insert(output, refusals);
        self
    }

    /// Refuses every keyboard attempt on `output`.
    pub fn keyboard_never_grabs(self, output: OutputId) -> Self {
        self.keyboard_busy_for(output, u32::MAX)
    }

    /// Pointer attempts made on `output`.
    pub fn pointer_attempts(&self, output: OutputId) -> u32 {
        self.pointer_tries.get(&output).copied().unwrap_or(0)
    }

    /// Keyboard attempts made on `output`.
    pub fn keyboard_attempts(&self, output: OutputId) -> u32 {
        self.keyboard_tries.get(&output).copied().unwrap_or(0)
    }

    /// Total grab attempts across all outputs and devices.
    pub fn total_grab_attempts(&self) -> u32 {
        self.pointer_tries.values().chain(self.keyboard_tries.values()).sum()
    }

    /// Whether the client holds both the pointer and the keyboard grab.
    pub fn holds_grabs(&self) -> bool {
        self.pointer_grab.is_some() && self.keyboard_grab.is_some()
    }

    /// Times the overlay for `output` was raised.
    pub fn raise_count(&self, output: OutputId) -> u32 {
        self.raises.get(&output).copied().unwrap_or(0)
    }
}

/// Counts one attempt and decides it against the refusal budget.
fn attempt(
    tries: &mut HashMap<OutputId, u32>,
    busy: &HashMap<OutputId, u32>,
    output: OutputId,
) -> GrabOutcome {
    let n = tries.entry(output).or_insert(0);
    *n += 1;
    let refusals = busy.get(&output).copied().unwrap_or(0);
    if *n > refusals {
        GrabOutcome::Acquired
    } else {
        GrabOutcome::Failed
    }
}

impl DisplayServer for MockDisplay {
    type Handle = MockLock;

    fn outputs(&self) -> Vec<OutputId> {
        self.outputs.clone()
    }

    fn create_output_lock(&mut self, output: OutputId) -> Result<MockLock, DisplayError> {
        if self.live.contains(&output) {
            return Err(DisplayError::AlreadyLocked(output));
        }
        if self.setup_failures.contains(&output) {
            return Err(DisplayError::Overlay {
                output,
                reason: "mock failure".into(),
            });
        }
        self.live.insert(output);
        self.created += 1;
        Ok(MockLock { output })
    }

    fn grab_pointer(&mut self, handle: &MockLock) -> GrabOutcome {
        let outcome = attempt(&mut self.pointer_tries, &self.pointer_busy, handle.output);
        if outcome.is_acquired() {
            self.pointer_grab = Some(handle.output);
        }
        outcome
    }

    fn grab_keyboard(&mut self, handle: &MockLock) -> GrabOutcome {
        let outcome = attempt(&mut self.keyboard_tries, &self.keyboard_busy, handle.output);
        if outcome.is_acquired() {
            self.keyboard_grab = Some(handle.output);
        }
        outcome
    }

    fn watch_root(&mut self, handle: &MockLock) {
        self.watched.insert(handle.output);
    }

    fn raise(&mut self, handle: &MockLock) {
        *self.raises.entry(handle.output).or_insert(0) += 1;
    }

    fn sync(&mut self) {
        self.syncs += 1;
    }

    fn destroy_output_lock(&mut self, handle: MockLock) {
        self.watched.remove(&handle.output);
        self.live.remove(&handle.output);
        if self.live.is_empty() {
            self.pointer_grab = None;
            self.keyboard_grab = None;
        }
        self.destroyed += 1;
    }
}
