//! fplock library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does fplock do? (for beginners)
//!
//! fplock is a screen locker gated by a fingerprint reader.  When started it:
//!
//! 1. Covers every X screen with a black, override-redirect window and hides
//!    the cursor.
//! 2. Grabs the pointer and then the keyboard on each screen, retrying for
//!    about a second because other clients hold grabs briefly all the time.
//! 3. Gives up on screens it could not grab, and exits with status 1 if that
//!    was every screen.
//! 4. Runs `fprintd-verify` over and over, reading its output line by line,
//!    until a line says `verify-match`.
//! 5. Releases every grab and window and exits with status 0.
//!
//! Nothing but a match ends step 4.  Failed matches and a busy reader just
//! add a three-second cooldown.

/// Application layer: the lock and verification use cases.
pub mod application;

/// Infrastructure layer: Xlib display adapter, verifier subprocess, config.
pub mod infrastructure;
