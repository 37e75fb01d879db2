//! fplock entry point.
//!
//! Blanks every X screen, grabs the pointer and keyboard, and keeps running
//! the fingerprint verifier until it reports a match.
//!
//! # Usage
//!
//! ```text
//! fplock [OPTIONS]
//!
//! Options:
//!   -c, --config <PATH>   Config file [default: $XDG_CONFIG_HOME/fplock/config.toml]
//!   -u, --user <NAME>     Verify this user's fingerprints
//!       --current-user    Verify the session user ($USER, then $LOGNAME)
//!   -v, --version         Print version and exit
//!   -h, --help            Print help
//! ```
//!
//! # Exit status
//!
//! | Code | Meaning                                                     |
//! |------|-------------------------------------------------------------|
//! | 0    | A fingerprint matched and every screen was released          |
//! | 1    | No screen could be locked                                    |
//! | 2    | Setup failed (config, display, user, enrolment)              |
//!
//! # Architecture overview
//!
//! ```text
//! main()
//!  └─ load_config()                     -- TOML + defaults
//!  └─ ensure_enrolled()                 -- fprintd-list <user>, per-user only
//!  └─ LockScreenUseCase::run()
//!       ├─ LockAcquisitionCoordinator   -- overlay + bounded grab retry per screen
//!       ├─ VerificationLoop             -- fprintd-verify until verify-match
//!       └─ unlock_all()                 -- release every screen
//! ```
//!
//! The runtime is single-threaded: the Xlib connection is not `Send` and
//! there is never more than one verifier child at a time.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{ArgAction, Parser};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use fplock::application::enrolment::ensure_enrolled;
use fplock::application::lock_screen::SessionExit;
use fplock::infrastructure::storage::config::{load_config, LockConfig};
use fplock::infrastructure::verifier::ProcessVerifier;
use fplock_core::VerifierTarget;

/// Exit status for failures before anything was locked.
const SETUP_FAILURE: u8 = 2;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Fingerprint screen locker for X11.
#[derive(Debug, Parser)]
#[command(
    name = "fplock",
    about = "X11 screen locker unlocked by fingerprint",
    version,
    disable_version_flag = true
)]
struct Cli {
    /// Print version and exit.
    #[arg(short = 'v', long, action = ArgAction::Version)]
    version: Option<bool>,

    /// Path to the TOML config file.
    #[arg(short, long, env = "FPLOCK_CONFIG")]
    config: Option<PathBuf>,

    /// Verify this user's enrolled fingerprints.
    #[arg(short, long, conflicts_with = "current_user")]
    user: Option<String>,

    /// Verify the fingerprints of the user running the session.
    #[arg(long)]
    current_user: bool,
}

impl Cli {
    /// Picks the verification target: `--user`, then `--current-user`, then
    /// the config file.
    fn target(&self, cfg: &LockConfig) -> anyhow::Result<VerifierTarget> {
        if let Some(user) = self.user.as_deref() {
            return Ok(VerifierTarget::from_user(Some(user)));
        }
        if self.current_user {
            return VerifierTarget::current_user(|key| std::env::var(key).ok())
                .context("--current-user: neither USER nor LOGNAME is set");
        }
        Ok(cfg.target())
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // The config supplies the log level, so its errors are only reported
    // once logging is up.
    let config = load_config(cli.config.as_deref());
    let level = config
        .as_ref()
        .map(|c| c.general.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    init_tracing(&level);

    let result = match config {
        Ok(cfg) => run(&cli, cfg).await,
        Err(e) => Err(anyhow::Error::new(e).context("failed to load configuration")),
    };

    match result {
        Ok(exit) => ExitCode::from(exit.exit_code()),
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(SETUP_FAILURE)
        }
    }
}

/// `RUST_LOG` wins; otherwise the configured level.  Logs go to stderr.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: &Cli, cfg: LockConfig) -> anyhow::Result<SessionExit> {
    let target = cli.target(&cfg)?;
    match target.user() {
        Some(user) => info!("verifying fingerprints of user '{user}'"),
        None => info!("verifying any enrolled fingerprint"),
    }

    if let Some(user) = target.user() {
        if cfg.verifier.require_enrolment {
            let lister = ProcessVerifier::new(cfg.list_command(&target));
            ensure_enrolled(&lister, user).await?;
        }
    }

    let verifier = ProcessVerifier::new(cfg.verify_command(&target));
    lock(&cfg, verifier).await
}

#[cfg(target_os = "linux")]
async fn lock(cfg: &LockConfig, verifier: ProcessVerifier) -> anyhow::Result<SessionExit> {
    use fplock::application::acquire_grab::InputGrabAcquirer;
    use fplock::application::lock_outputs::LockAcquisitionCoordinator;
    use fplock::application::lock_screen::LockScreenUseCase;
    use fplock::application::verify_loop::VerificationLoop;
    use fplock::infrastructure::display::NativeDisplay;

    let mut display = NativeDisplay::open(cfg.overlay_style()).context("cannot open display")?;

    let coordinator = LockAcquisitionCoordinator::new(InputGrabAcquirer::new(cfg.retry_policy()));
    let verification = VerificationLoop::new(verifier, cfg.verification_timing());
    let use_case = LockScreenUseCase::new(coordinator, verification);

    Ok(use_case.run(&mut display).await)
}

#[cfg(not(target_os = "linux"))]
async fn lock(_cfg: &LockConfig, _verifier: ProcessVerifier) -> anyhow::Result<SessionExit> {
    anyhow::bail!("fplock requires an X11 display server (Linux only)")
}
