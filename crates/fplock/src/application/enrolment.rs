//! Enrolment pre-check for per-user verification.
//!
//! Locking the screen for a user who has no enrolled fingerprints would lock
//! them out until the process is killed.  Before locking for a specific user
//! the locker runs the listing command (`fprintd-list <user>`) and requires
//! a `Fingerprints for user` header in its output.

use fplock_core::domain::verification::is_enrolment_line;
use thiserror::Error;
use tracing::{debug, info};

use super::verify_loop::{Verifier, VerifierError};

/// Error type for the enrolment check.
#[derive(Debug, Error)]
pub enum EnrolmentError {
    /// The listing command failed to run or to be read.
    #[error("could not list fingerprints: {0}")]
    Verifier(#[from] VerifierError),
    /// The listing ran but reported no enrolled fingerprints.
    #[error("fingerprint not found for user '{0}'")]
    NotEnrolled(String),
}

/// Succeeds iff `lister`'s output announces enrolled prints for `user`.
///
/// The listing is always read to the end and its exit status collected.
///
/// # Errors
///
/// Returns [`EnrolmentError::NotEnrolled`] when no header line is printed,
/// or [`EnrolmentError::Verifier`] when the listing cannot be run.
pub async fn ensure_enrolled(lister: &dyn Verifier, user: &str) -> Result<(), EnrolmentError> {
    let mut run = lister.start().await?;
    let mut enrolled = false;
    while let Some(line) = run.next_line().await? {
        debug!("{}: {}", lister.describe(), line.trim_end());
        enrolled |= is_enrolment_line(&line);
    }
    run.finish().await?;

    if enrolled {
        info!("found enrolled fingerprints for user '{user}'");
        Ok(())
    } else {
        Err(EnrolmentError::NotEnrolled(user.to_string()))
    }
}
