//! Storage infrastructure: configuration file loading.
//!
//! The `config` sub-module reads the locker's TOML configuration from the
//! XDG config directory (or an explicit `--config` path), fills in defaults
//! for anything missing and validates the result.  The locker never writes
//! its configuration back.

pub mod config;
