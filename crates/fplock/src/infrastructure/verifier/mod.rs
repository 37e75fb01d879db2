//! Verifier adapters.
//!
//! Implementations of the application layer's
//! [`Verifier`](crate::application::verify_loop::Verifier) trait:
//!
//! - **`process`** – Spawns the real command (`fprintd-verify`,
//!   `fprintd-list`) with Tokio and streams its stdout line by line.
//! - **`mock`** – Replays scripted transcripts, one per invocation, and
//!   records how each run was consumed.

pub mod mock;
pub mod process;

pub use process::ProcessVerifier;
