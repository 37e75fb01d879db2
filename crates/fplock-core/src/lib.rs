//! # fplock-core
//!
//! Shared library for fplock containing the lock-session domain types, the
//! verifier output classifier, verifier command construction, and the
//! bounded retry primitive used for input grabs.
//!
//! It has zero dependencies on OS APIs or display servers.  The only runtime
//! facility it touches is the Tokio timer, for the delay between retry
//! attempts.
//!
//! # Architecture overview (for beginners)
//!
//! fplock is a screen locker.  It covers every screen with a black window,
//! seizes ("grabs") the pointer and keyboard so no other program receives
//! input, and then waits for an external fingerprint verifier to report a
//! match.  Only a match releases the lock.
//!
//! This crate is the pure foundation:
//!
//! - **`domain`** – Value types with no side effects: which outputs exist,
//!   what a grab attempt returned, the set of held locks (`LockSession`), and
//!   how a line of verifier output is classified (`VerificationOutcome`).
//!
//! - **`retry`** – A reusable "try up to N times with a fixed delay"
//!   primitive.  Grabs fail transiently while another client briefly holds
//!   them, so every grab goes through this.

pub mod domain;
pub mod retry;

// Re-export the most-used types at the crate root so callers can write
// `fplock_core::LockSession` instead of `fplock_core::domain::session::LockSession`.
pub use domain::command::{VerifierCommand, VerifierTarget};
pub use domain::output::{GrabOutcome, GrabTarget, OutputId};
pub use domain::session::LockSession;
pub use domain::verification::{classify_line, VerificationOutcome};
pub use retry::{retry_with_delay, RetryPolicy, RetryResult};
