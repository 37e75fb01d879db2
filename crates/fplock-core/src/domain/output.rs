//! Display outputs and grab attempt results.

use std::fmt;

/// Identifier of one display surface managed by the windowing session.
///
/// On X11 this is the screen number passed to `RootWindow(dpy, screen)`.
/// Outputs are enumerated once at startup and never change afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputId(pub u32);

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "output {}", self.0)
    }
}

/// The input device a grab attempt targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabTarget {
    Pointer,
    Keyboard,
}

impl fmt::Display for GrabTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrabTarget::Pointer => f.write_str("pointer"),
            GrabTarget::Keyboard => f.write_str("keyboard"),
        }
    }
}

/// Result of a single grab attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabOutcome {
    /// The windowing system now routes all events of the device to us.
    Acquired,
    /// Another client holds the grab, or the server refused it.
    Failed,
}

impl GrabOutcome {
    /// Returns `true` for [`GrabOutcome::Acquired`].
    pub fn is_acquired(self) -> bool {
        matches!(self, GrabOutcome::Acquired)
    }
}
