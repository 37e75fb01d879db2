//! Bounded retry with a fixed inter-attempt delay.
//!
//! # Why retry at all? (for beginners)
//!
//! An X11 grab fails with `AlreadyGrabbed` when another client holds it at
//! that instant.  Window managers and menus grab briefly all the time, so
//! the first attempt failing is normal.  Retrying for about a second
//! (1000 attempts, 1 ms apart) rides out that churn without ever blocking
//! forever.
//!
//! The operation is an `FnMut` returning `bool`, so callers can wrap any
//! synchronous attempt, including ones that borrow a display connection
//! mutably.

use std::time::Duration;

use tokio::time;

/// How many times to attempt an operation and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.  Zero means "never attempt".
    pub max_attempts: u32,
    /// Sleep between two consecutive failed attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    /// Attempt count used for input grabs.
    pub const DEFAULT_ATTEMPTS: u32 = 1000;
    /// Delay between grab attempts.
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(1);

    /// Creates a policy.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ATTEMPTS, Self::DEFAULT_DELAY)
    }
}

/// What happened across all attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryResult {
    /// Whether some attempt succeeded.
    pub succeeded: bool,
    /// Number of attempts actually made.
    pub attempts: u32,
}

/// Calls `attempt` until it returns `true` or the policy's budget is spent.
///
/// Sleeps `policy.delay` after each failed attempt except the last, so a
/// fully failing run of N attempts sleeps N-1 times.
pub async fn retry_with_delay<F>(policy: &RetryPolicy, mut attempt: F) -> RetryResult
where
    F: FnMut() -> bool,
{
    for n in 1..=policy.max_attempts {
        if attempt() {
            return RetryResult {
                succeeded: true,
                attempts: n,
            };
        }
        if n < policy.max_attempts {
            time::sleep(policy.delay).await;
        }
    }
    RetryResult {
        succeeded: false,
        attempts: policy.max_attempts,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
