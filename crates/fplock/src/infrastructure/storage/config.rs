//! TOML-based configuration for the locker.
//!
//! Read from `$XDG_CONFIG_HOME/fplock/config.toml`, falling back to
//! `~/.config/fplock/config.toml`.  A missing file is not an error: every
//! field has a default, so the locker works on first run.
//!
//! ```toml
//! [general]
//! log_level = "info"
//!
//! [verifier]
//! command = "/usr/bin/fprintd-verify"
//! list_command = "/usr/bin/fprintd-list"
//! target_user = "alice"
//! require_enrolment = true
//!
//! [timing]
//! grab_attempts = 1000
//! grab_retry_delay_ms = 1
//! cooldown_ms = 3000
//! throttle_ms = 1000
//!
//! [appearance]
//! background_color = "black"
//! cursor_color = "#005577"
//! ```
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return value
//! of `some_fn()` when the field is absent, and whole sections carry
//! `#[serde(default)]`, so a file holding only `[timing]` is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use fplock_core::{RetryPolicy, VerifierCommand, VerifierTarget};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::verify_loop::VerificationTiming;
use crate::infrastructure::display::OverlayStyle;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The TOML parsed but a value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level locker configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LockConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub verifier: VerifierConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub appearance: AppearanceConfig,
}

/// Process-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    /// `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Which programs verify and list fingerprints, and for whom.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerifierConfig {
    /// Verification program, run once per attempt.
    #[serde(default = "default_verify_command")]
    pub command: PathBuf,
    /// Enrolment listing program, run once before locking.
    #[serde(default = "default_list_command")]
    pub list_command: PathBuf,
    /// User to verify when neither `--user` nor `--current-user` is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_user: Option<String>,
    /// Refuse to lock when the target user has no enrolled fingerprints.
    #[serde(default = "default_true")]
    pub require_enrolment: bool,
}

/// Retry and pacing parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimingConfig {
    /// Attempts per device grab.  Must be at least 1.
    #[serde(default = "default_grab_attempts")]
    pub grab_attempts: u32,
    /// Pause between grab attempts, in milliseconds.
    #[serde(default = "default_grab_retry_delay_ms")]
    pub grab_retry_delay_ms: u64,
    /// Pause after a rejected finger or busy reader, in milliseconds.
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    /// Pause after every unsuccessful verification attempt, in milliseconds.
    /// Must be at least 1, so a verifier that exits at once cannot spin.
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
}

/// Overlay colours, as X11 colour names or `#rrggbb`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppearanceConfig {
    #[serde(default = "default_background_color")]
    pub background_color: String,
    #[serde(default = "default_cursor_color")]
    pub cursor_color: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_verify_command() -> PathBuf {
    PathBuf::from("/usr/bin/fprintd-verify")
}
fn default_list_command() -> PathBuf {
    PathBuf::from("/usr/bin/fprintd-list")
}
fn default_true() -> bool {
    true
}
fn default_grab_attempts() -> u32 {
    RetryPolicy::DEFAULT_ATTEMPTS
}
fn default_grab_retry_delay_ms() -> u64 {
    RetryPolicy::DEFAULT_DELAY.as_millis() as u64
}
fn default_cooldown_ms() -> u64 {
    3000
}
fn default_throttle_ms() -> u64 {
    1000
}
fn default_background_color() -> String {
    OverlayStyle::default().background
}
fn default_cursor_color() -> String {
    OverlayStyle::default().cursor
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            command: default_verify_command(),
            list_command: default_list_command(),
            target_user: None,
            require_enrolment: default_true(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            grab_attempts: default_grab_attempts(),
            grab_retry_delay_ms: default_grab_retry_delay_ms(),
            cooldown_ms: default_cooldown_ms(),
            throttle_ms: default_throttle_ms(),
        }
    }
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            background_color: default_background_color(),
            cursor_color: default_cursor_color(),
        }
    }
}

// ── Conversions into runtime types ────────────────────────────────────────────

impl LockConfig {
    /// Checks values that parse but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timing.grab_attempts == 0 {
            return Err(ConfigError::Invalid(
                "timing.grab_attempts must be at least 1".to_string(),
            ));
        }
        if self.timing.throttle_ms == 0 {
            return Err(ConfigError::Invalid(
                "timing.throttle_ms must be at least 1".to_string(),
            ));
        }
        if self.verifier.command.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("verifier.command is empty".to_string()));
        }
        Ok(())
    }

    /// Retry policy for each device grab.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.timing.grab_attempts,
            Duration::from_millis(self.timing.grab_retry_delay_ms),
        )
    }

    /// Pacing of the verification loop.
    pub fn verification_timing(&self) -> VerificationTiming {
        VerificationTiming {
            cooldown: Duration::from_millis(self.timing.cooldown_ms),
            throttle: Duration::from_millis(self.timing.throttle_ms),
        }
    }

    /// Overlay colours.
    pub fn overlay_style(&self) -> OverlayStyle {
        OverlayStyle {
            background: self.appearance.background_color.clone(),
            cursor: self.appearance.cursor_color.clone(),
        }
    }

    /// The configured fallback target; blank means any enrolled finger.
    pub fn target(&self) -> VerifierTarget {
        VerifierTarget::from_user(self.verifier.target_user.as_deref())
    }

    /// The verification command for `target`.
    pub fn verify_command(&self, target: &VerifierTarget) -> VerifierCommand {
        VerifierCommand::new(self.verifier.command.clone(), target)
    }

    /// The enrolment listing command for `target`.
    pub fn list_command(&self, target: &VerifierTarget) -> VerifierCommand {
        VerifierCommand::new(self.verifier.list_command.clone(), target)
    }
}

// ── Config loading ────────────────────────────────────────────────────────────

/// Determines the directory holding `config.toml`.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when neither
/// `XDG_CONFIG_HOME` nor `HOME` is set.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    xdg_config_dir(|key| std::env::var_os(key).map(PathBuf::from))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads and validates the configuration.
///
/// With `path` the given file is read; without it the default location is
/// used.  In both cases a file that does not exist yields
/// `LockConfig::default()`.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// [`ConfigError::Parse`] if the TOML is malformed and
/// [`ConfigError::Invalid`] if a value is out of range.
pub fn load_config(path: Option<&Path>) -> Result<LockConfig, ConfigError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_file_path()?,
    };

    let cfg = match std::fs::read_to_string(&path) {
        Ok(content) => toml::from_str::<LockConfig>(&content)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => LockConfig::default(),
        Err(e) => return Err(ConfigError::Io { path, source: e }),
    };
    cfg.validate()?;
    Ok(cfg)
}

/// `$XDG_CONFIG_HOME/fplock`, or `$HOME/.config/fplock`.
fn xdg_config_dir<F>(lookup: F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<PathBuf>,
{
    let base = lookup("XDG_CONFIG_HOME")
        .filter(|p| p.is_absolute())
        .or_else(|| lookup("HOME").map(|h| h.join(".config")))?;
    Some(base.join("fplock"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
