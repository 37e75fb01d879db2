//! InputGrabAcquirer: locks a single output.
//!
//! This use case sits at the application layer and delegates every
//! windowing-system call to a [`DisplayServer`] implementation.  The Xlib
//! implementation lives in the infrastructure layer.
//!
//! # Sequence for one output
//!
//! ```text
//! create_output_lock ──► grab pointer (retry) ──► grab keyboard (retry) ──► watch root
//!        │ error                │ exhausted               │ exhausted
//!        ▼                      ▼                         ▼
//!    Setup failure        destroy handle            destroy handle
//! ```
//!
//! A failed output is simply left out of the session; it never aborts the
//! whole program on its own.

use fplock_core::{retry_with_delay, GrabOutcome, GrabTarget, OutputId, RetryPolicy};
use thiserror::Error;
use tracing::debug;

/// Error type for windowing-system operations.
#[derive(Debug, Error)]
pub enum DisplayError {
    /// The connection to the display server could not be opened.
    #[error("cannot open display: {0}")]
    Open(String),
    /// The overlay window or its resources could not be created.
    #[error("failed to create overlay for {output}: {reason}")]
    Overlay { output: OutputId, reason: String },
    /// The output is already locked by a live handle.
    #[error("{0} is already locked")]
    AlreadyLocked(OutputId),
}

/// Why one output could not be locked.
#[derive(Debug, Error)]
pub enum AcquisitionFailure {
    /// The overlay window could not be created.
    #[error("could not prepare {output}: {source}")]
    Setup {
        output: OutputId,
        #[source]
        source: DisplayError,
    },
    /// A grab stayed refused for the whole retry budget.
    #[error("could not grab {target} on {output} after {attempts} attempts")]
    Grab {
        output: OutputId,
        target: GrabTarget,
        attempts: u32,
    },
}

impl AcquisitionFailure {
    /// The output that failed.
    pub fn output(&self) -> OutputId {
        match self {
            AcquisitionFailure::Setup { output, .. } | AcquisitionFailure::Grab { output, .. } => {
                *output
            }
        }
    }
}

/// A held lock on one output.
pub trait OutputHandle {
    /// The output this handle covers.
    fn output(&self) -> OutputId;
}

/// Windowing-system operations needed to lock outputs.
///
/// All calls happen on the single control thread, so implementations are
/// free to hold non-`Send` connection pointers.
pub trait DisplayServer {
    /// Owner of one output's overlay window, pixmap, cursor and colours.
    type Handle: OutputHandle;

    /// Enumerates the outputs of the session.
    fn outputs(&self) -> Vec<OutputId>;

    /// Creates and maps the overlay window for `output`.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError`] if the window or its resources cannot be
    /// allocated, or if `output` already has a live handle.
    fn create_output_lock(&mut self, output: OutputId) -> Result<Self::Handle, DisplayError>;

    /// Makes one attempt at grabbing the pointer onto the output's root.
    fn grab_pointer(&mut self, handle: &Self::Handle) -> GrabOutcome;

    /// Makes one attempt at grabbing the keyboard onto the output's root.
    fn grab_keyboard(&mut self, handle: &Self::Handle) -> GrabOutcome;

    /// Subscribes to window-stacking changes on the output's root window.
    fn watch_root(&mut self, handle: &Self::Handle);

    /// Raises the overlay window above every other window.
    fn raise(&mut self, handle: &Self::Handle);

    /// Flushes queued requests and waits for the server to process them.
    fn sync(&mut self);

    /// Frees every resource the handle owns.
    ///
    /// Grabs are held per client, not per output, so they are released only
    /// together with the last live handle.
    fn destroy_output_lock(&mut self, handle: Self::Handle);
}

/// The InputGrabAcquirer use case.
#[derive(Debug, Clone, Default)]
pub struct InputGrabAcquirer {
    policy: RetryPolicy,
}

impl InputGrabAcquirer {
    /// Creates an acquirer that grabs under `policy`.
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Locks `output`: overlay first, then pointer, then keyboard.
    ///
    /// The keyboard is only attempted once the pointer is held.  On any
    /// failure the partially built handle is destroyed before returning, so
    /// a failed output owns nothing afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`AcquisitionFailure`] naming the step that failed.
    pub async fn acquire<D: DisplayServer>(
        &self,
        display: &mut D,
        output: OutputId,
    ) -> Result<D::Handle, AcquisitionFailure> {
        let handle = display
            .create_output_lock(output)
            .map_err(|source| AcquisitionFailure::Setup { output, source })?;

        for target in [GrabTarget::Pointer, GrabTarget::Keyboard] {
            let result = retry_with_delay(&self.policy, || {
                let outcome = match target {
                    GrabTarget::Pointer => display.grab_pointer(&handle),
                    GrabTarget::Keyboard => display.grab_keyboard(&handle),
                };
                outcome.is_acquired()
            })
            .await;

            if !result.succeeded {
                display.destroy_output_lock(handle);
                return Err(AcquisitionFailure::Grab {
                    output,
                    target,
                    attempts: result.attempts,
                });
            }
            debug!("{target} grabbed on {output} after {} attempt(s)", result.attempts);
        }

        display.watch_root(&handle);
        Ok(handle)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
