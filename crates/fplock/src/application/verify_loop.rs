//! VerificationLoop: keeps the session locked until the verifier reports a match.
//!
//! # State machine
//!
//! ```text
//!            ┌──────────────── throttle ◄──────────────┐
//!            ▼                                         │
//!        Waiting ── raise windows, run verifier ──► outcome
//!                                                      │
//!     Match ──► Terminal(Verified)                     │
//!     NoMatch / DeviceUnavailable ──► Cooldown ────────┤
//!     Inconclusive / ProcessError ─────────────────────┘
//! ```
//!
//! The cooldown (3 s by default) follows a rejected finger or a busy reader.
//! The throttle (1 s by default) follows *every* non-terminal iteration, so a
//! verifier that exits immediately cannot spin the CPU or hammer the reader.
//!
//! There is no cancellation: the only way out is a match.
//!
//! # Subprocess ownership
//!
//! Each iteration starts one verifier run, reads it to end of stream, and
//! collects its exit status before the next iteration begins.  Lines after
//! the first classifying line are read and discarded.

use std::time::Duration;

use async_trait::async_trait;
use fplock_core::{classify_line, LockSession, VerificationOutcome};
use thiserror::Error;
use tokio::time;
use tracing::{debug, error, info, warn};

use super::acquire_grab::DisplayServer;

/// Error type for verifier process operations.
#[derive(Debug, Error)]
pub enum VerifierError {
    /// The verifier could not be started.
    #[error("failed to start verifier `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    /// Reading the verifier's output failed.
    #[error("failed to read verifier output: {0}")]
    Read(#[source] std::io::Error),
    /// Collecting the verifier's exit status failed.
    #[error("failed to collect verifier exit status: {0}")]
    Wait(#[source] std::io::Error),
}

/// An external program that can be started once per verification attempt.
#[async_trait]
pub trait Verifier: Send + Sync {
    /// Human-readable command line, for logs.
    fn describe(&self) -> String;

    /// Starts a fresh run.
    ///
    /// # Errors
    ///
    /// Returns [`VerifierError::Spawn`] if the program cannot be started.
    async fn start(&self) -> Result<Box<dyn VerifierRun>, VerifierError>;
}

/// One running verifier invocation: a finite sequence of lines, then an
/// exit status.
#[async_trait]
pub trait VerifierRun: Send {
    /// Returns the next output line, or `None` once the stream is closed.
    ///
    /// # Errors
    ///
    /// Returns [`VerifierError::Read`] if the stream cannot be read.
    async fn next_line(&mut self) -> Result<Option<String>, VerifierError>;

    /// Waits for the process to exit and returns its exit code.
    ///
    /// `None` means the process was terminated by a signal.
    ///
    /// # Errors
    ///
    /// Returns [`VerifierError::Wait`] if the status cannot be collected.
    async fn finish(self: Box<Self>) -> Result<Option<i32>, VerifierError>;
}

/// How the loop paces itself between verifier runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationTiming {
    /// Delay after a `NoMatch` or `DeviceUnavailable` outcome.
    pub cooldown: Duration,
    /// Delay after every non-terminal iteration.
    pub throttle: Duration,
}

impl Default for VerificationTiming {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(3),
            throttle: Duration::from_secs(1),
        }
    }
}

/// Why the loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalReason {
    /// The verifier reported a match.
    Verified,
    /// The session was not viable, so there was nothing to guard.
    Aborted,
}

/// Loop states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Waiting,
    Cooldown,
    Terminal(TerminalReason),
}

impl LoopState {
    /// The state that follows a verifier run with `outcome`.
    pub fn after(outcome: VerificationOutcome) -> Self {
        if outcome.is_match() {
            LoopState::Terminal(TerminalReason::Verified)
        } else if outcome.requires_cooldown() {
            LoopState::Cooldown
        } else {
            LoopState::Waiting
        }
    }
}

/// The VerificationLoop use case.
pub struct VerificationLoop<V> {
    verifier: V,
    timing: VerificationTiming,
}

impl<V: Verifier> VerificationLoop<V> {
    /// Creates a loop around `verifier`.
    pub fn new(verifier: V, timing: VerificationTiming) -> Self {
        Self { verifier, timing }
    }

    /// The wrapped verifier.
    pub fn verifier(&self) -> &V {
        &self.verifier
    }

    /// Runs until the verifier reports a match.
    ///
    /// Returns [`TerminalReason::Aborted`] straight away, without starting
    /// the verifier, if `session` is not viable.
    pub async fn run<D: DisplayServer>(
        &self,
        display: &mut D,
        session: &LockSession<D::Handle>,
    ) -> TerminalReason {
        if !session.is_viable() {
            warn!("verification requested for an empty lock session");
            return TerminalReason::Aborted;
        }

        info!("waiting for verification via `{}`", self.verifier.describe());
        let mut iteration: u64 = 0;
        loop {
            iteration += 1;
            for handle in session.handles() {
                display.raise(handle);
            }
            display.sync();

            let outcome = self.verify_once().await;
            match LoopState::after(outcome) {
                LoopState::Terminal(reason) => {
                    info!("verification succeeded after {iteration} attempt(s)");
                    return reason;
                }
                LoopState::Cooldown => {
                    if outcome == VerificationOutcome::DeviceUnavailable {
                        warn!("fingerprint reader unavailable; retrying after cooldown");
                    } else {
                        info!("fingerprint did not match; retrying after cooldown");
                    }
                    time::sleep(self.timing.cooldown).await;
                }
                LoopState::Waiting if outcome == VerificationOutcome::ProcessError => {
                    warn!("verification attempt {iteration} failed; retrying");
                }
                LoopState::Waiting => {
                    info!("verification attempt {iteration} was {outcome}; retrying");
                }
            }
            time::sleep(self.timing.throttle).await;
        }
    }

    /// Runs the verifier once and classifies its output.
    ///
    /// The first classifying line decides the outcome.  A match additionally
    /// requires the process to exit successfully; anything else that ends
    /// without a marker is `Inconclusive` on a clean exit and `ProcessError`
    /// otherwise.
    pub async fn verify_once(&self) -> VerificationOutcome {
        let mut run = match self.verifier.start().await {
            Ok(run) => run,
            Err(e) => {
                error!("{e}");
                return VerificationOutcome::ProcessError;
            }
        };

        let mut classified = None;
        let mut read_failed = false;
        loop {
            match run.next_line().await {
                Ok(Some(line)) => {
                    debug!("verifier: {}", line.trim_end());
                    if classified.is_none() {
                        classified = classify_line(&line);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("{e}");
                    read_failed = true;
                    break;
                }
            }
        }

        let exit_code = match run.finish().await {
            Ok(code) => code,
            Err(e) => {
                warn!("{e}");
                None
            }
        };
        let clean_exit = exit_code == Some(0);

        match classified {
            Some(VerificationOutcome::Match) if !clean_exit => {
                warn!("verifier printed a match but exited with {exit_code:?}; ignoring it");
                VerificationOutcome::ProcessError
            }
            Some(outcome) => outcome,
            None if read_failed || !clean_exit => VerificationOutcome::ProcessError,
            None => VerificationOutcome::Inconclusive,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::verifier::mock::{ScriptedRun, ScriptedVerifier};

    fn make_loop(script: Vec<ScriptedRun>) -> VerificationLoop<ScriptedVerifier> {
        VerificationLoop::new(ScriptedVerifier::new(script), VerificationTiming::default())
    }

    #[test]
    fn test_loop_state_after_match_is_terminal() {
        assert_eq!(
            LoopState::after(VerificationOutcome::Match),
            LoopState::Terminal(TerminalReason::Verified)
        );
    }

    #[test]
    fn test_loop_state_after_negative_outcomes_is_cooldown() {
        assert_eq!(LoopState::after(VerificationOutcome::NoMatch), LoopState::Cooldown);
        assert_eq!(
            LoopState::after(VerificationOutcome::DeviceUnavailable),
            LoopState::Cooldown
        );
    }

    #[test]
    fn test_loop_state_after_inconclusive_or_error_is_waiting() {
        assert_eq!(LoopState::after(VerificationOutcome::Inconclusive), LoopState::Waiting);
        assert_eq!(LoopState::after(VerificationOutcome::ProcessError), LoopState::Waiting);
    }

    #[tokio::test]
    async fn test_verify_once_classifies_match() {
        let lp = make_loop(vec![ScriptedRun::output("Capturing fingerprint\nverify-match\n")]);
        assert_eq!(lp.verify_once().await, VerificationOutcome::Match);
    }

    #[tokio::test]
    async fn test_verify_once_drains_lines_after_first_marker() {
        // Arrange
        let lp = make_loop(vec![ScriptedRun::output(
            "verify-no-match\nverify-match\ntrailing noise\n",
        )]);

        // Act
        let outcome = lp.verify_once().await;

        // Assert
        assert_eq!(outcome, VerificationOutcome::NoMatch);
        let records = lp.verifier().records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].lines_read, 3);
        assert!(records[0].finished);
    }

    #[tokio::test]
    async fn test_verify_once_silent_clean_exit_is_inconclusive() {
        let lp = make_loop(vec![ScriptedRun::output("")]);
        assert_eq!(lp.verify_once().await, VerificationOutcome::Inconclusive);
    }

    #[tokio::test]
    async fn test_verify_once_silent_failing_exit_is_process_error() {
        let lp = make_loop(vec![ScriptedRun::output("Verify started!\n").with_exit_code(Some(1))]);
        assert_eq!(lp.verify_once().await, VerificationOutcome::ProcessError);
    }

    #[tokio::test]
    async fn test_verify_once_spawn_failure_is_process_error() {
        let lp = make_loop(vec![ScriptedRun::spawn_failure()]);
        assert_eq!(lp.verify_once().await, VerificationOutcome::ProcessError);
    }

    #[tokio::test]
    async fn test_verify_once_read_failure_is_process_error() {
        let lp = make_loop(vec![ScriptedRun::output("Verify started!\n").with_read_failure()]);
        assert_eq!(lp.verify_once().await, VerificationOutcome::ProcessError);
    }

    #[tokio::test]
    async fn test_verify_once_match_with_failing_exit_does_not_unlock() {
        let lp = make_loop(vec![ScriptedRun::output("verify-match\n").with_exit_code(Some(1))]);
        assert_eq!(lp.verify_once().await, VerificationOutcome::ProcessError);
    }

    #[tokio::test]
    async fn test_verify_once_keeps_negative_outcome_despite_failing_exit() {
        let lp = make_loop(vec![ScriptedRun::output("verify-no-match\n").with_exit_code(Some(1))]);
        assert_eq!(lp.verify_once().await, VerificationOutcome::NoMatch);
    }
}
