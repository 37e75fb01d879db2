//! Domain layer: pure value types for lock sessions and verification.
//!
//! Nothing in here performs I/O.  The application crate moves these values
//! between the display adapter, the verifier, and the use cases.

pub mod command;
pub mod output;
pub mod session;
pub mod verification;
