//! Classification of verifier output.
//!
//! The external verifier (normally `fprintd-verify`) prints free-form text.
//! Exactly three substrings carry meaning; every other line is noise such as
//! "Using device /net/reactivated/Fprint/Device/0" or "Verify started!".
//!
//! | Substring                | Outcome             |
//! |--------------------------|---------------------|
//! | `verify-match`           | `Match`             |
//! | `verify-no-match`        | `NoMatch`           |
//! | `failed to claim device` | `DeviceUnavailable` |
//!
//! Markers are tested in that order and the first hit wins.  Note that
//! `verify-no-match` does not contain `verify-match`, so the order only
//! matters for a line that happens to carry two markers.

use std::fmt;

/// Line substring reported by the verifier on a successful match.
pub const MATCH_MARKER: &str = "verify-match";
/// Line substring reported when the presented finger did not match.
pub const NO_MATCH_MARKER: &str = "verify-no-match";
/// Line substring reported when the reader is busy or missing.
pub const DEVICE_UNAVAILABLE_MARKER: &str = "failed to claim device";
/// Header printed by `fprintd-list` when the user has enrolled prints.
pub const ENROLMENT_MARKER: &str = "Fingerprints for user";

/// Result of one verifier invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerificationOutcome {
    /// Identity verified.  The only outcome that unlocks.
    Match,
    /// A finger was read but did not match.
    NoMatch,
    /// The verifier could not claim the reader.
    DeviceUnavailable,
    /// The verifier could not be started, its output could not be read, or
    /// it exited with a failure status without printing a marker.
    ProcessError,
    /// The stream closed cleanly without any marker line.
    Inconclusive,
}

impl VerificationOutcome {
    /// Returns `true` only for [`VerificationOutcome::Match`].
    pub fn is_match(self) -> bool {
        matches!(self, VerificationOutcome::Match)
    }

    /// Returns `true` for outcomes that are followed by the cooldown delay.
    pub fn requires_cooldown(self) -> bool {
        matches!(
            self,
            VerificationOutcome::NoMatch | VerificationOutcome::DeviceUnavailable
        )
    }
}

impl fmt::Display for VerificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VerificationOutcome::Match => "match",
            VerificationOutcome::NoMatch => "no match",
            VerificationOutcome::DeviceUnavailable => "device unavailable",
            VerificationOutcome::ProcessError => "process error",
            VerificationOutcome::Inconclusive => "inconclusive",
        };
        f.write_str(s)
    }
}

/// Classifies one line of verifier output.
///
/// Returns `None` for lines that carry no marker.  Only `Match`, `NoMatch`
/// and `DeviceUnavailable` can come out of this function; the other two
/// outcomes describe the process, not a line.
pub fn classify_line(line: &str) -> Option<VerificationOutcome> {
    if line.contains(MATCH_MARKER) {
        Some(VerificationOutcome::Match)
    } else if line.contains(NO_MATCH_MARKER) {
        Some(VerificationOutcome::NoMatch)
    } else if line.contains(DEVICE_UNAVAILABLE_MARKER) {
        Some(VerificationOutcome::DeviceUnavailable)
    } else {
        None
    }
}

/// Classifies a whole stream of lines, returning the first marker found.
///
/// Lines after the first classifying line are not inspected.  An exhausted
/// stream with no marker yields `None`; the caller decides between
/// `Inconclusive` and `ProcessError` from the exit status.
pub fn classify_lines<I, S>(lines: I) -> Option<VerificationOutcome>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .find_map(|line| classify_line(line.as_ref()))
}

/// Returns `true` if a line of `fprintd-list` output announces enrolled prints.
pub fn is_enrolment_line(line: &str) -> bool {
    line.contains(ENROLMENT_MARKER)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_line_recognises_match() {
        assert_eq!(
            classify_line("Verify result: verify-match (done)"),
            Some(VerificationOutcome::Match)
        );
    }

    #[test]
    fn test_classify_line_recognises_no_match() {
        assert_eq!(
            classify_line("Verify result: verify-no-match (done)"),
            Some(VerificationOutcome::NoMatch)
        );
    }

    #[test]
    fn test_classify_line_recognises_device_unavailable() {
        assert_eq!(
            classify_line("failed to claim device: Device was already claimed"),
            Some(VerificationOutcome::DeviceUnavailable)
        );
    }

    #[test]
    fn test_classify_line_ignores_unrelated_lines() {
        assert_eq!(classify_line("Using device /net/reactivated/Fprint/Device/0"), None);
        assert_eq!(classify_line(""), None);
        assert_eq!(classify_line("device busy"), None);
    }

    #[test]
    fn test_classify_line_match_marker_takes_priority() {
        // A line carrying two markers resolves to the higher-priority one.
        let line = "failed to claim device, then verify-match";
        assert_eq!(classify_line(line), Some(VerificationOutcome::Match));
    }

    #[test]
    fn test_classify_line_is_case_sensitive() {
        assert_eq!(classify_line("VERIFY-MATCH"), None);
    }

    #[test]
    fn test_classify_lines_first_marker_wins() {
        // Arrange
        let stream = ["device busy", "verify-no-match", "verify-match"];

        // Act
        let outcome = classify_lines(stream);

        // Assert
        assert_eq!(outcome, Some(VerificationOutcome::NoMatch));
    }

    #[test]
    fn test_classify_lines_without_marker_is_none() {
        assert_eq!(classify_lines(["Verify started!", "Listing done"]), None);
        assert_eq!(classify_lines(Vec::<String>::new()), None);
    }

    #[test]
    fn test_only_negative_device_outcomes_require_cooldown() {
        assert!(VerificationOutcome::NoMatch.requires_cooldown());
        assert!(VerificationOutcome::DeviceUnavailable.requires_cooldown());
        assert!(!VerificationOutcome::Match.requires_cooldown());
        assert!(!VerificationOutcome::Inconclusive.requires_cooldown());
        assert!(!VerificationOutcome::ProcessError.requires_cooldown());
    }

    #[test]
    fn test_only_match_is_match() {
        assert!(VerificationOutcome::Match.is_match());
        assert!(!VerificationOutcome::NoMatch.is_match());
        assert!(!VerificationOutcome::DeviceUnavailable.is_match());
    }

    #[test]
    fn test_is_enrolment_line_detects_list_header() {
        assert!(is_enrolment_line("Fingerprints for user alice on Synaptics (press):"));
        assert!(!is_enrolment_line("User alice has no fingers enrolled for Synaptics."));
    }
}
