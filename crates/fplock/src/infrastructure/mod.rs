//! Infrastructure layer for the locker.
//!
//! Contains OS-facing adapters: the Xlib display connection, the verifier
//! subprocess, and configuration storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `fplock_core`, but MUST NOT be imported by the `application` or domain
//! layers.
//!
//! # Sub-modules
//!
//! - **`display`** – Implementations of `DisplayServer`.  The Xlib one is
//!   compiled on Linux only; a `MockDisplay` is always available for tests.
//!
//! - **`verifier`** – `Verifier` implementations: a Tokio subprocess runner
//!   for `fprintd-verify` / `fprintd-list`, and a scripted mock.
//!
//! - **`storage`** – TOML configuration file loading.

pub mod display;
pub mod storage;
pub mod verifier;
