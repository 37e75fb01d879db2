//! Integration tests for a complete lock session.
//!
//! These tests drive `LockScreenUseCase` end-to-end against `MockDisplay`
//! and `ScriptedVerifier`.  Tokio's clock is paused, so cooldowns, throttles
//! and grab retries complete instantly while `Instant` still reports the
//! virtual time that passed.

use std::time::Duration;

use fplock::application::acquire_grab::InputGrabAcquirer;
use fplock::application::lock_outputs::LockAcquisitionCoordinator;
use fplock::application::lock_screen::{LockScreenUseCase, SessionExit};
use fplock::application::verify_loop::{TerminalReason, VerificationLoop, VerificationTiming};
use fplock::infrastructure::display::mock::MockDisplay;
use fplock::infrastructure::verifier::mock::{ScriptedRun, ScriptedVerifier};
use fplock_core::{OutputId, RetryPolicy};
use tokio::time::Instant;

// ── Helpers ───────────────────────────────────────────────────────────────────

fn use_case(policy: RetryPolicy, script: Vec<ScriptedRun>) -> LockScreenUseCase<ScriptedVerifier> {
    LockScreenUseCase::new(
        LockAcquisitionCoordinator::new(InputGrabAcquirer::new(policy)),
        VerificationLoop::new(ScriptedVerifier::new(script), VerificationTiming::default()),
    )
}

fn assert_elapsed_about(elapsed: Duration, expected: Duration) {
    assert!(
        elapsed >= expected && elapsed < expected + Duration::from_millis(50),
        "elapsed {elapsed:?}, expected about {expected:?}"
    );
}

// ── Verification scenarios ────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_no_match_then_match_unlocks_after_one_cooldown() {
    // Arrange
    let mut display = MockDisplay::with_outputs(2);
    let uc = use_case(
        RetryPolicy::default(),
        vec![
            ScriptedRun::output("device busy\nverify-no-match\n"),
            ScriptedRun::output("verify-match\n"),
        ],
    );
    let start = Instant::now();

    // Act
    let exit = uc.run(&mut display).await;

    // Assert: cooldown (3 s) + throttle (1 s) after the first attempt only.
    assert_eq!(exit, SessionExit::Unlocked);
    assert_eq!(uc.verification().verifier().invocations(), 2);
    assert_elapsed_about(start.elapsed(), Duration::from_secs(4));
    assert!(display.live.is_empty(), "every output must be released");
}

#[tokio::test(start_paused = true)]
async fn test_immediate_match_unlocks_without_waiting() {
    let mut display = MockDisplay::with_outputs(1);
    let uc = use_case(
        RetryPolicy::default(),
        vec![ScriptedRun::output("Capturing fingerprint\nverify-match\n")],
    );
    let start = Instant::now();

    let exit = uc.run(&mut display).await;

    assert_eq!(exit, SessionExit::Unlocked);
    assert_eq!(uc.verification().verifier().invocations(), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_device_unavailable_keeps_screens_locked_until_match() {
    // Arrange
    let mut display = MockDisplay::with_outputs(2);
    let uc = use_case(
        RetryPolicy::default(),
        vec![
            ScriptedRun::output("failed to claim device\n"),
            ScriptedRun::output("failed to claim device\n"),
            ScriptedRun::output("verify-match\n"),
        ],
    );
    let start = Instant::now();

    // Act
    let exit = uc.run(&mut display).await;

    // Assert: two cooldown + throttle rounds; both screens were raised on
    // every attempt and released only at the end.
    assert_eq!(exit, SessionExit::Unlocked);
    assert_elapsed_about(start.elapsed(), Duration::from_secs(8));
    assert_eq!(display.raise_count(OutputId(0)), 3);
    assert_eq!(display.raise_count(OutputId(1)), 3);
    assert_eq!(display.created, 2);
    assert_eq!(display.destroyed, 2);
}

#[tokio::test(start_paused = true)]
async fn test_silent_and_failing_runs_are_throttled_without_cooldown() {
    let mut display = MockDisplay::with_outputs(1);
    let uc = use_case(
        RetryPolicy::default(),
        vec![
            ScriptedRun::output(""),
            ScriptedRun::spawn_failure(),
            ScriptedRun::output("verify-match\n"),
        ],
    );
    let start = Instant::now();

    let exit = uc.run(&mut display).await;

    assert_eq!(exit, SessionExit::Unlocked);
    assert_elapsed_about(start.elapsed(), Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_every_started_run_is_read_to_end_and_reaped() {
    let mut display = MockDisplay::with_outputs(1);
    let uc = use_case(
        RetryPolicy::default(),
        vec![
            ScriptedRun::output("verify-no-match\nextra\n").with_exit_code(Some(1)),
            ScriptedRun::output("verify-match\ntrailer\n"),
        ],
    );

    uc.run(&mut display).await;

    let records = uc.verification().verifier().records();
    assert_eq!(records.len(), 2);
    for record in records {
        assert_eq!(record.lines_read, record.lines_total);
        assert!(record.finished);
    }
}

// ── Acquisition scenarios ─────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_all_grabs_exhausted_means_nothing_to_protect() {
    // Arrange
    let mut display = MockDisplay::with_outputs(2)
        .pointer_never_grabs(OutputId(0))
        .keyboard_never_grabs(OutputId(1));
    let uc = use_case(
        RetryPolicy::new(10, Duration::from_millis(1)),
        vec![ScriptedRun::output("verify-match\n")],
    );

    // Act
    let exit = uc.run(&mut display).await;

    // Assert
    assert_eq!(exit, SessionExit::NothingToProtect);
    assert_eq!(exit.exit_code(), 1);
    assert_eq!(uc.verification().verifier().invocations(), 0);
    assert_eq!(display.pointer_attempts(OutputId(0)), 10);
    assert_eq!(display.keyboard_attempts(OutputId(1)), 10);
    assert!(display.live.is_empty());
    assert_eq!(display.created, display.destroyed);
}

#[tokio::test(start_paused = true)]
async fn test_no_outputs_means_nothing_to_protect() {
    let mut display = MockDisplay::with_outputs(0);
    let uc = use_case(RetryPolicy::default(), vec![ScriptedRun::output("verify-match\n")]);

    let exit = uc.run(&mut display).await;

    assert_eq!(exit, SessionExit::NothingToProtect);
    assert_eq!(display.created, 0);
}

#[tokio::test(start_paused = true)]
async fn test_partial_lock_still_runs_verification() {
    // Arrange: output 1 cannot create its overlay, output 2 never yields
    // the keyboard.
    let mut display = MockDisplay::with_outputs(3)
        .failing_setup(OutputId(1))
        .keyboard_never_grabs(OutputId(2));
    let uc = use_case(
        RetryPolicy::new(5, Duration::from_millis(1)),
        vec![ScriptedRun::output("verify-match\n")],
    );

    // Act
    let exit = uc.run(&mut display).await;

    // Assert: only output 0 was guarded and raised.
    assert_eq!(exit, SessionExit::Unlocked);
    assert_eq!(display.raise_count(OutputId(0)), 1);
    assert_eq!(display.raise_count(OutputId(1)), 0);
    assert_eq!(display.raise_count(OutputId(2)), 0);
    assert!(display.live.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_busy_grabs_are_retried_with_delay() {
    let mut display = MockDisplay::with_outputs(1)
        .pointer_busy_for(OutputId(0), 3)
        .keyboard_busy_for(OutputId(0), 2);
    let uc = use_case(
        RetryPolicy::new(1000, Duration::from_millis(1)),
        vec![ScriptedRun::output("verify-match\n")],
    );
    let start = Instant::now();

    let exit = uc.run(&mut display).await;

    assert_eq!(exit, SessionExit::Unlocked);
    assert_eq!(display.pointer_attempts(OutputId(0)), 4);
    assert_eq!(display.keyboard_attempts(OutputId(0)), 3);
    // Five refused attempts, each followed by a 1 ms pause.
    assert!(start.elapsed() >= Duration::from_millis(5));
}

// ── Raising and unlocking ─────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_raising_never_regrabs_or_changes_locked_set() {
    // Arrange
    let mut display = MockDisplay::with_outputs(2);
    let uc = use_case(
        RetryPolicy::default(),
        vec![
            ScriptedRun::output("verify-no-match\n"),
            ScriptedRun::output("verify-no-match\n"),
            ScriptedRun::output("verify-no-match\n"),
            ScriptedRun::output("verify-match\n"),
        ],
    );

    // Act
    uc.run(&mut display).await;

    // Assert: one pointer and one keyboard grab per output, however many
    // times the overlays were raised.
    assert_eq!(display.total_grab_attempts(), 4);
    assert_eq!(display.raise_count(OutputId(0)), 4);
    assert_eq!(display.raise_count(OutputId(1)), 4);
    assert_eq!(display.created, 2);
}

#[tokio::test(start_paused = true)]
async fn test_unlock_all_releases_every_handle() {
    // Arrange
    let mut display = MockDisplay::with_outputs(3);
    let coordinator = LockAcquisitionCoordinator::default();
    let outputs = display.outputs.clone();
    let session = coordinator.lock_all(&mut display, &outputs).await;
    assert_eq!(display.live.len(), 3);
    assert!(display.holds_grabs());

    // Act
    let released = coordinator.unlock_all(&mut display, session);

    // Assert
    assert_eq!(released, 3);
    assert!(display.live.is_empty());
    assert_eq!(display.pointer_grab, None);
    assert_eq!(display.keyboard_grab, None);
    assert!(display.watched.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_degraded_session_keeps_input_grabbed_while_verifying() {
    // Arrange: output 0 locks, output 1 takes the pointer but never the
    // keyboard, so its partial lock is torn down.
    let mut display = MockDisplay::with_outputs(2).keyboard_never_grabs(OutputId(1));
    let coordinator = LockAcquisitionCoordinator::new(InputGrabAcquirer::new(RetryPolicy::new(
        5,
        Duration::from_millis(1),
    )));
    let verification = VerificationLoop::new(
        ScriptedVerifier::new(vec![
            ScriptedRun::output("verify-no-match\n"),
            ScriptedRun::output("verify-match\n"),
        ]),
        VerificationTiming::default(),
    );
    let outputs = display.outputs.clone();

    // Act
    let session = coordinator.lock_all(&mut display, &outputs).await;
    let held_after_lock = display.holds_grabs();
    let reason = verification.run(&mut display, &session).await;
    let held_after_verify = display.holds_grabs();
    coordinator.unlock_all(&mut display, session);

    // Assert
    assert!(held_after_lock, "a failed output must not drop the session's grabs");
    assert!(held_after_verify);
    assert_eq!(reason, TerminalReason::Verified);
    assert!(!display.holds_grabs());
    assert!(display.live.is_empty());
}
