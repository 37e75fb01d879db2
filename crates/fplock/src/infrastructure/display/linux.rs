//! Linux X11 display adapter via Xlib.
//!
//! Every X screen of the display is one output.  Locking an output means:
//!
//! 1. `XCreateWindow` a full-screen, override-redirect window on the
//!    screen's root so the window manager cannot move, decorate or restack
//!    it.
//! 2. `XAllocNamedColor` the background and cursor colours.
//! 3. Build an all-zero 8x8 bitmap and turn it into a cursor with
//!    `XCreatePixmapCursor`: an invisible pointer.
//! 4. `XMapRaised` the window.
//! 5. `XGrabPointer` / `XGrabKeyboard` on the root window (one attempt per
//!    call; the retry loop lives in the application layer).
//!
//! # What is a grab? (for beginners)
//!
//! A grab tells the X server to deliver all events of a device to one
//! client, whatever window is under the pointer or has focus.  While fplock
//! holds both grabs no other program sees a keystroke or click.  A grab is
//! refused with `AlreadyGrabbed` while another client holds it, which is why
//! callers retry.
//!
//! # Threading
//!
//! `XlibDisplay` holds a raw `*mut Display`, so it is neither `Send` nor
//! `Sync`.  The locker runs on a current-thread runtime and never moves it.
//!
//! # Grabs belong to the connection
//!
//! X keeps one pointer grab and one keyboard grab per client.  Grabbing on a
//! second screen's root moves the existing grab rather than adding one, and
//! `XUngrabPointer` drops it whichever screen it was taken on.  So the
//! adapter counts live locks and only ungrabs when the last one goes; a
//! screen that fails part-way must not release the grabs a locked screen
//! relies on.

use std::ffi::CString;
use std::mem;
use std::os::raw::{c_char, c_int, c_long, c_uint, c_ulong};
use std::ptr;

use fplock_core::{GrabOutcome, OutputId};
use tracing::{debug, warn};
use x11::xlib;

use super::OverlayStyle;
use crate::application::acquire_grab::{DisplayError, DisplayServer, OutputHandle};

// ── X11 constants ─────────────────────────────────────────────────────────────

/// `CurrentTime`: let the server timestamp the request.
const CURRENT_TIME: xlib::Time = 0;

/// `None` for window/cursor arguments.
const NONE: c_ulong = 0;

/// Bitmap data for the invisible cursor: 8x8, all bits clear.
const CURSOR_BITS: [c_char; 8] = [0; 8];

/// Pointer events routed to us while the pointer is grabbed.
const POINTER_EVENT_MASK: c_long =
    xlib::ButtonPressMask | xlib::ButtonReleaseMask | xlib::PointerMotionMask;

/// Lock on one X screen.  Owns the overlay window and its resources.
#[derive(Debug)]
pub struct XlibLock {
    output: OutputId,
    screen: c_int,
    root: xlib::Window,
    window: xlib::Window,
    pixmap: xlib::Pixmap,
    cursor: xlib::Cursor,
    /// Pixels successfully allocated from the default colormap.
    colors: Vec<c_ulong>,
}

impl OutputHandle for XlibLock {
    fn output(&self) -> OutputId {
        self.output
    }
}

/// Xlib implementation of [`DisplayServer`].
pub struct XlibDisplay {
    display: *mut xlib::Display,
    style: OverlayStyle,
    /// Locks created and not yet destroyed.
    live_locks: usize,
}

impl XlibDisplay {
    /// Opens the display named by `DISPLAY`.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError::Open`] if `XOpenDisplay` fails.
    pub fn open(style: OverlayStyle) -> Result<Self, DisplayError> {
        // SAFETY: a null name makes Xlib read `DISPLAY`.  The returned
        // pointer is released in `Drop` via `XCloseDisplay`.
        let display = unsafe { xlib::XOpenDisplay(ptr::null()) };
        if display.is_null() {
            let display_env = std::env::var("DISPLAY").unwrap_or_else(|_| "<unset>".to_string());
            return Err(DisplayError::Open(format!(
                "XOpenDisplay failed; DISPLAY={display_env}"
            )));
        }
        Ok(Self {
            display,
            style,
            live_locks: 0,
        })
    }

    /// Allocates a named colour from the screen's default colormap.
    ///
    /// Returns `None` (and logs) when the name is unknown or the colormap is
    /// full; the caller falls back to the screen's black pixel.
    fn alloc_named_color(&self, screen: c_int, name: &str) -> Option<xlib::XColor> {
        let c_name = CString::new(name).ok()?;
        // SAFETY: all-zero is a valid XColor; Xlib fills both out-params.
        let mut screen_def: xlib::XColor = unsafe { mem::zeroed() };
        let mut exact_def: xlib::XColor = unsafe { mem::zeroed() };
        // SAFETY: `self.display` is open and `screen` is in range.
        let status = unsafe {
            xlib::XAllocNamedColor(
                self.display,
                xlib::XDefaultColormap(self.display, screen),
                c_name.as_ptr(),
                &mut screen_def,
                &mut exact_def,
            )
        };
        if status == 0 {
            warn!("could not allocate colour '{name}' on screen {screen}");
            return None;
        }
        Some(screen_def)
    }

    fn screen_of(&self, output: OutputId) -> Option<c_int> {
        let screen = c_int::try_from(output.0).ok()?;
        // SAFETY: `self.display` is open.
        let count = unsafe { xlib::XScreenCount(self.display) };
        (screen < count).then_some(screen)
    }
}

impl Drop for XlibDisplay {
    fn drop(&mut self) {
        // SAFETY: `self.display` was opened in `open` and is not used after this.
        unsafe { xlib::XCloseDisplay(self.display) };
    }
}

impl DisplayServer for XlibDisplay {
    type Handle = XlibLock;

    fn outputs(&self) -> Vec<OutputId> {
        // SAFETY: `self.display` is open.
        let count = unsafe { xlib::XScreenCount(self.display) };
        (0..count.max(0) as u32).map(OutputId).collect()
    }

    fn create_output_lock(&mut self, output: OutputId) -> Result<XlibLock, DisplayError> {
        let screen = self.screen_of(output).ok_or_else(|| DisplayError::Overlay {
            output,
            reason: "no such X screen".to_string(),
        })?;
        let dpy = self.display;

        let background = self.alloc_named_color(screen, &self.style.background);
        let mut cursor_color = self.alloc_named_color(screen, &self.style.cursor);
        let mut colors: Vec<c_ulong> = background
            .iter()
            .chain(cursor_color.iter())
            .map(|c| c.pixel)
            .collect();

        // SAFETY: `dpy` is open and `screen` was range-checked above.  Every
        // resource created here is recorded in the returned handle and freed
        // in `destroy_output_lock`.
        unsafe {
            let root = xlib::XRootWindow(dpy, screen);

            let mut attrs: xlib::XSetWindowAttributes = mem::zeroed();
            attrs.override_redirect = xlib::True;
            attrs.background_pixel = background
                .map(|c| c.pixel)
                .unwrap_or_else(|| xlib::XBlackPixel(dpy, screen));

            let window = xlib::XCreateWindow(
                dpy,
                root,
                0,
                0,
                xlib::XDisplayWidth(dpy, screen) as c_uint,
                xlib::XDisplayHeight(dpy, screen) as c_uint,
                0,
                xlib::XDefaultDepth(dpy, screen),
                xlib::CopyFromParent as c_uint,
                xlib::XDefaultVisual(dpy, screen),
                xlib::CWOverrideRedirect | xlib::CWBackPixel,
                &mut attrs,
            );
            if window == NONE {
                free_colors(dpy, screen, &mut colors);
                return Err(DisplayError::Overlay {
                    output,
                    reason: "XCreateWindow returned no window".to_string(),
                });
            }

            let pixmap = xlib::XCreateBitmapFromData(dpy, window, CURSOR_BITS.as_ptr(), 8, 8);
            let mut fallback: xlib::XColor = mem::zeroed();
            let color = cursor_color.as_mut().unwrap_or(&mut fallback) as *mut xlib::XColor;
            let cursor = xlib::XCreatePixmapCursor(dpy, pixmap, pixmap, color, color, 0, 0);
            xlib::XDefineCursor(dpy, window, cursor);
            xlib::XMapRaised(dpy, window);

            debug!("overlay window {window:#x} mapped on screen {screen}");
            self.live_locks += 1;
            Ok(XlibLock {
                output,
                screen,
                root,
                window,
                pixmap,
                cursor,
                colors,
            })
        }
    }

    fn grab_pointer(&mut self, handle: &XlibLock) -> GrabOutcome {
        // SAFETY: `handle` came from this display and has not been destroyed.
        let status = unsafe {
            xlib::XGrabPointer(
                self.display,
                handle.root,
                xlib::False,
                POINTER_EVENT_MASK as c_uint,
                xlib::GrabModeAsync,
                xlib::GrabModeAsync,
                NONE,
                handle.cursor,
                CURRENT_TIME,
            )
        };
        grab_outcome(status)
    }

    fn grab_keyboard(&mut self, handle: &XlibLock) -> GrabOutcome {
        // SAFETY: as for `grab_pointer`.
        let status = unsafe {
            xlib::XGrabKeyboard(
                self.display,
                handle.root,
                xlib::True,
                xlib::GrabModeAsync,
                xlib::GrabModeAsync,
                CURRENT_TIME,
            )
        };
        grab_outcome(status)
    }

    fn watch_root(&mut self, handle: &XlibLock) {
        // SAFETY: `handle.root` is a valid root window of this display.
        unsafe { xlib::XSelectInput(self.display, handle.root, xlib::SubstructureNotifyMask) };
    }

    fn raise(&mut self, handle: &XlibLock) {
        // SAFETY: `handle.window` is alive until `destroy_output_lock`.
        unsafe { xlib::XRaiseWindow(self.display, handle.window) };
    }

    fn sync(&mut self) {
        // SAFETY: `self.display` is open.
        unsafe { xlib::XSync(self.display, xlib::False) };
    }

    fn destroy_output_lock(&mut self, mut handle: XlibLock) {
        let dpy = self.display;
        self.live_locks = self.live_locks.saturating_sub(1);
        let last = self.live_locks == 0;
        // SAFETY: every id in `handle` was created on `dpy` by
        // `create_output_lock` and is freed exactly once here, since the
        // handle is consumed.
        unsafe {
            if last {
                xlib::XUngrabPointer(dpy, CURRENT_TIME);
                xlib::XUngrabKeyboard(dpy, CURRENT_TIME);
            }
            free_colors(dpy, handle.screen, &mut handle.colors);
            xlib::XFreeCursor(dpy, handle.cursor);
            xlib::XFreePixmap(dpy, handle.pixmap);
            xlib::XDestroyWindow(dpy, handle.window);
        }
        debug!("released overlay window {:#x} on {}", handle.window, handle.output);
    }
}

/// Returns allocated pixels to the screen's default colormap.
///
/// # Safety
///
/// `dpy` must be open and every pixel must have been allocated on `screen`.
unsafe fn free_colors(dpy: *mut xlib::Display, screen: c_int, colors: &mut Vec<c_ulong>) {
    if colors.is_empty() {
        return;
    }
    xlib::XFreeColors(
        dpy,
        xlib::XDefaultColormap(dpy, screen),
        colors.as_mut_ptr(),
        colors.len() as c_int,
        0,
    );
    colors.clear();
}

fn grab_outcome(status: c_int) -> GrabOutcome {
    if status == xlib::GrabSuccess {
        GrabOutcome::Acquired
    } else {
        GrabOutcome::Failed
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
