//! The aggregate of all lock handles held across outputs.
//!
//! # Why an explicit session value?
//!
//! A screen locker has exactly two phases: acquire the locks, then wait for
//! verification.  Instead of a process-wide "running" flag, the acquisition
//! phase produces a `LockSession` that the verification phase borrows and
//! the release phase consumes.  Because release takes the session by value,
//! the compiler rules out releasing the same handles twice.

/// All successfully acquired lock handles plus the count of outputs that
/// could not be locked.
///
/// `H` is the display adapter's handle type.  Handles are not `Clone`; the
/// session is their only owner until release.
#[derive(Debug)]
pub struct LockSession<H> {
    handles: Vec<H>,
    failed: usize,
}

impl<H> LockSession<H> {
    /// Builds a session from acquired handles and the number of failures.
    pub fn new(handles: Vec<H>, failed: usize) -> Self {
        Self { handles, failed }
    }

    /// Returns `true` iff at least one output is locked.
    ///
    /// A non-viable session protects nothing; the caller must abort.
    pub fn is_viable(&self) -> bool {
        !self.handles.is_empty()
    }

    /// Number of locked outputs.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Returns `true` when no output is locked.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Number of outputs whose acquisition failed.
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Returns `true` when some outputs failed while others were locked.
    pub fn is_degraded(&self) -> bool {
        self.is_viable() && self.failed > 0
    }

    /// The held handles, in acquisition order.
    pub fn handles(&self) -> &[H] {
        &self.handles
    }

    /// Consumes the session and hands back its handles for release.
    pub fn into_handles(self) -> Vec<H> {
        self.handles
    }
}
