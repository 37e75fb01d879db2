//! LockAcquisitionCoordinator: locks every output and releases them again.
//!
//! # Best effort over all-or-nothing
//!
//! One locked output already blocks all input, because grabs are global to
//! the display.  So a session with some failed outputs still proceeds; the
//! failures are logged and left uncovered.  Only when *no* output could be
//! locked is the session non-viable, and the caller must exit.

use fplock_core::{LockSession, OutputId};
use tracing::{error, info, warn};

use super::acquire_grab::{DisplayServer, InputGrabAcquirer};

/// The LockAcquisitionCoordinator use case.
#[derive(Debug, Clone, Default)]
pub struct LockAcquisitionCoordinator {
    acquirer: InputGrabAcquirer,
}

impl LockAcquisitionCoordinator {
    /// Creates a coordinator that locks each output with `acquirer`.
    pub fn new(acquirer: InputGrabAcquirer) -> Self {
        Self { acquirer }
    }

    /// Locks every output in `outputs`, in order.
    ///
    /// Failed outputs are counted and skipped; they hold no resources
    /// afterwards.  The returned session is viable iff at least one output
    /// was locked.
    pub async fn lock_all<D: DisplayServer>(
        &self,
        display: &mut D,
        outputs: &[OutputId],
    ) -> LockSession<D::Handle> {
        let mut handles = Vec::with_capacity(outputs.len());
        let mut failed = 0;

        for &output in outputs {
            match self.acquirer.acquire(display, output).await {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    warn!("{e}; leaving {output} unlocked");
                    failed += 1;
                }
            }
        }
        display.sync();

        let session = LockSession::new(handles, failed);
        if !session.is_viable() {
            error!("could not lock any of {} output(s); nothing to protect", outputs.len());
        } else if session.is_degraded() {
            warn!(
                "locked {} of {} output(s); continuing with partial coverage",
                session.len(),
                outputs.len()
            );
        } else {
            info!("locked {} output(s)", session.len());
        }
        session
    }

    /// Releases every handle of `session` and returns how many there were.
    ///
    /// Takes the session by value so it can only be released once.
    pub fn unlock_all<D: DisplayServer>(
        &self,
        display: &mut D,
        session: LockSession<D::Handle>,
    ) -> usize {
        let handles = session.into_handles();
        let released = handles.len();
        for handle in handles {
            display.destroy_output_lock(handle);
        }
        display.sync();
        info!("released {released} output lock(s)");
        released
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
