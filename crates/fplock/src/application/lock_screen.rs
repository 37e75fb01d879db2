//! The complete lock session: lock every output, wait for a match, unlock.

use super::acquire_grab::DisplayServer;
use super::lock_outputs::LockAcquisitionCoordinator;
use super::verify_loop::{TerminalReason, VerificationLoop, Verifier};

/// How a lock session ended, as reported to the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionExit {
    /// The user was verified and every output was released.
    Unlocked,
    /// No output could be locked.
    NothingToProtect,
}

impl SessionExit {
    /// Process exit status for this result.
    pub fn exit_code(self) -> u8 {
        match self {
            SessionExit::Unlocked => 0,
            SessionExit::NothingToProtect => 1,
        }
    }
}

/// The LockScreen use case: coordinator plus verification loop.
pub struct LockScreenUseCase<V> {
    coordinator: LockAcquisitionCoordinator,
    verification: VerificationLoop<V>,
}

impl<V: Verifier> LockScreenUseCase<V> {
    /// Wires the two halves together.
    pub fn new(coordinator: LockAcquisitionCoordinator, verification: VerificationLoop<V>) -> Self {
        Self {
            coordinator,
            verification,
        }
    }

    /// The verification half.
    pub fn verification(&self) -> &VerificationLoop<V> {
        &self.verification
    }

    /// Locks every output of `display` and blocks until verification.
    ///
    /// All handles are released before this returns, whichever way it ends.
    pub async fn run<D: DisplayServer>(&self, display: &mut D) -> SessionExit {
        let outputs = display.outputs();
        let session = self.coordinator.lock_all(display, &outputs).await;

        let reason = self.verification.run(display, &session).await;
        self.coordinator.unlock_all(display, session);

        match reason {
            TerminalReason::Verified => SessionExit::Unlocked,
            TerminalReason::Aborted => SessionExit::NothingToProtect,
        }
    }
}
