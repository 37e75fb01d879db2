//! Display server adapters.
//!
//! Each adapter implements [`DisplayServer`] from the application layer.
//! The production adapter is selected at compile time via
//! `#[cfg(target_os = ...)]` and re-exported as `NativeDisplay`:
//!
//! | Module  | OS    | API used                                         |
//! |---------|-------|--------------------------------------------------|
//! | `linux` | Linux | Xlib: `XCreateWindow`, `XGrabPointer`, `XGrabKeyboard` |
//!
//! A [`mock::MockDisplay`] is always compiled (not guarded by `#[cfg]`) so
//! tests on any platform can use it without an X server.
//!
//! [`DisplayServer`]: crate::application::acquire_grab::DisplayServer

pub mod mock;

// ── Linux implementation ──────────────────────────────────────────────────────

#[cfg(target_os = "linux")]
pub mod linux;

/// Re-export the Xlib adapter as `NativeDisplay` on Linux.
#[cfg(target_os = "linux")]
pub use linux::XlibDisplay as NativeDisplay;

/// Colours used for each overlay window.
///
/// Names are anything `XAllocNamedColor` accepts: `"black"`, `"#005577"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayStyle {
    /// Window background.
    pub background: String,
    /// Colour for the (invisible) cursor bitmap.
    pub cursor: String,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            background: "black".to_string(),
            cursor: "#005577".to_string(),
        }
    }
}
