//! Application layer use cases for the locker.
//!
//! # What use cases does the locker have?
//!
//! - **`acquire_grab`** – Locks one output: creates its overlay window and
//!   grabs pointer then keyboard under a bounded retry.  Defines the
//!   [`DisplayServer`](acquire_grab::DisplayServer) trait that the Xlib
//!   adapter implements.
//!
//! - **`lock_outputs`** – Runs `acquire_grab` across every output, builds the
//!   `LockSession`, and releases it again at the end.
//!
//! - **`verify_loop`** – Runs the external verifier until it reports a
//!   match.  Defines the [`Verifier`](verify_loop::Verifier) trait that the
//!   subprocess adapter implements.
//!
//! - **`enrolment`** – Pre-flight check that the targeted user has enrolled
//!   fingerprints, so the locker never locks a user out for good.
//!
//! - **`lock_screen`** – The whole lock/verify/unlock sequence that `main`
//!   runs.

pub mod acquire_grab;
pub mod enrolment;
pub mod lock_outputs;
pub mod lock_screen;
pub mod verify_loop;
