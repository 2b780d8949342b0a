// SPDX-License-Identifier: MIT
//
// Terminal control for input: raw stdin plus SGR mouse reporting.
//
// termios, ioctl and isatty are only reachable through libc, hence the
// `unsafe` below.
#![allow(unsafe_code)]
//
// The decoder can only read what the terminal is asked to send. Raw mode
// delivers every byte as typed (Ctrl-C included, as 0x03) and the DEC
// private modes 1000/1006/1003 turn pointer activity into SGR reports.
// Leaving, dropping and panicking all put both back.

use std::io::{self, Write};
#[cfg(unix)]
use std::sync::Mutex;
use std::sync::Once;

use bitflags::bitflags;

// ─── Mouse Reporting ────────────────────────────────────────────────────────

bitflags! {
    /// Mouse reports requested from the terminal.
    ///
    /// The decoder needs [`SGR`](Self::SGR) encoding; without it the
    /// terminal falls back to the legacy X10 byte format, which we don't
    /// decode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MouseReporting: u8 {
        /// Button press / release and wheel (DEC 1000).
        const CLICKS     = 0b001;
        /// SGR extended coordinates (DEC 1006).
        const SGR        = 0b010;
        /// All pointer motion, with or without a button held (DEC 1003).
        const ALL_MOTION = 0b100;
    }
}

impl MouseReporting {
    /// `(flag, DEC private mode)` in the order modes are enabled.
    const MODES: [(Self, u16); 3] = [
        (Self::CLICKS, 1000),
        (Self::SGR, 1006),
        (Self::ALL_MOTION, 1003),
    ];

    /// Write the enable sequences (`CSI ? n h`) for every set flag.
    ///
    /// # Errors
    ///
    /// Propagates write errors from `w`.
    pub fn write_enable(self, w: &mut impl Write) -> io::Result<()> {
        for (flag, mode) in Self::MODES {
            if self.contains(flag) {
                write!(w, "\x1b[?{mode}h")?;
            }
        }
        Ok(())
    }

    /// Write the disable sequences (`CSI ? n l`), reverse order.
    ///
    /// # Errors
    ///
    /// Propagates write errors from `w`.
    pub fn write_disable(self, w: &mut impl Write) -> io::Result<()> {
        for (flag, mode) in Self::MODES.iter().rev() {
            if self.contains(*flag) {
                write!(w, "\x1b[?{mode}l")?;
            }
        }
        Ok(())
    }
}

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of columns (width in character cells).
    pub cols: u16,
    /// Number of rows (height in character cells).
    pub rows: u16,
}

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Query the current terminal size via `ioctl(TIOCGWINSZ)`.
///
/// Returns `None` if stdout is not a terminal or the query fails.
#[cfg(unix)]
#[must_use]
pub fn get_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some(Size {
            cols: ws.ws_col,
            rows: ws.ws_row,
        })
    } else {
        None
    }
}

#[cfg(not(unix))]
#[must_use]
pub fn get_size() -> Option<Size> {
    None
}

/// Check whether stdin is connected to a terminal (TTY).
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

// ─── Raw Mode ───────────────────────────────────────────────────────────────

/// Saved cooked-mode settings while stdin is raw.
///
/// Lives outside any struct so the panic hook can reach it.
#[cfg(unix)]
static COOKED: Mutex<Option<libc::termios>> = Mutex::new(None);

/// Stdin switched to raw input. Holds the settings to go back to.
#[cfg(unix)]
struct RawMode {
    cooked: libc::termios,
}

#[cfg(unix)]
impl RawMode {
    /// Switch stdin to raw mode. `None` when stdin isn't a terminal.
    ///
    /// `cfmakeraw` clears ISIG, so Ctrl-C arrives as byte 0x03 instead of
    /// raising SIGINT, and sets VMIN=1/VTIME=0. The decoder only reads
    /// after `poll` reports data, so a read never waits.
    fn enable() -> io::Result<Option<Self>> {
        if !is_tty() {
            return Ok(None);
        }

        let mut cooked: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(libc::STDIN_FILENO, &raw mut cooked) } != 0 {
            return Err(io::Error::last_os_error());
        }

        let mut settings = cooked;
        unsafe { libc::cfmakeraw(&raw mut settings) };
        set_attrs(&settings)?;

        if let Ok(mut saved) = COOKED.lock() {
            *saved = Some(cooked);
        }
        Ok(Some(Self { cooked }))
    }

    fn restore(self) -> io::Result<()> {
        if let Ok(mut saved) = COOKED.lock() {
            *saved = None;
        }
        set_attrs(&self.cooked)
    }
}

#[cfg(unix)]
fn set_attrs(termios: &libc::termios) -> io::Result<()> {
    if unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, termios) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Non-unix terminals have no termios; only the mouse modes apply.
#[cfg(not(unix))]
struct RawMode;

#[cfg(not(unix))]
impl RawMode {
    #[allow(clippy::unnecessary_wraps)]
    const fn enable() -> io::Result<Option<Self>> {
        Ok(None)
    }

    #[allow(clippy::unnecessary_wraps)]
    const fn restore(self) -> io::Result<()> {
        Ok(())
    }
}

// ─── Panic Restore ──────────────────────────────────────────────────────────

/// Every mouse mode we may have enabled, switched off in reverse order.
///
/// Disabling a mode that was never enabled is harmless, so the panic
/// path doesn't need to know which flags the session used.
const MOUSE_OFF: &[u8] = b"\x1b[?1003l\x1b[?1006l\x1b[?1000l";

static PANIC_HOOK: Once = Once::new();

/// Chain a panic hook that puts the terminal back before the message
/// prints, so the user can read it and their shell still works.
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            restore_after_panic();
            previous(info);
        }));
    });
}

/// Best effort, errors ignored. Writes straight to fd 1: the panicking
/// thread may be holding the `io::stdout()` lock.
fn restore_after_panic() {
    #[cfg(unix)]
    {
        unsafe {
            let _ = libc::write(
                libc::STDOUT_FILENO,
                MOUSE_OFF.as_ptr().cast::<libc::c_void>(),
                MOUSE_OFF.len(),
            );
        }
        let cooked = COOKED.lock().ok().and_then(|mut saved| saved.take());
        if let Some(cooked) = cooked {
            let _ = set_attrs(&cooked);
        }
    }

    #[cfg(not(unix))]
    {
        let mut out = io::stdout();
        let _ = out.write_all(MOUSE_OFF);
        let _ = out.flush();
    }
}

// ─── Terminal ───────────────────────────────────────────────────────────────

/// Input-mode controller.
///
/// [`enter`](Self::enter) makes stdin raw and asks for the configured
/// mouse reports; [`leave`](Self::leave) undoes both. Dropping an active
/// handle leaves too, and a panic restores the terminal through a hook.
///
/// # Example
///
/// ```no_run
/// use pixterm_input::terminal::{MouseReporting, Terminal};
///
/// let mut term = Terminal::new(MouseReporting::all());
/// term.enter()?;
/// // ... decode input ...
/// term.leave()?;
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct Terminal {
    mouse: MouseReporting,
    /// `Some` while raw mode is on (always `None` when stdin isn't a tty).
    raw: Option<RawMode>,
    active: bool,
}

impl Terminal {
    /// An inactive handle.
    #[must_use]
    pub const fn new(mouse: MouseReporting) -> Self {
        Self {
            mouse,
            raw: None,
            active: false,
        }
    }

    #[must_use]
    pub const fn mouse(&self) -> MouseReporting {
        self.mouse
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Current size, or 80x24 when it can't be queried.
    #[must_use]
    pub fn size(&self) -> Size {
        get_size().unwrap_or(Size { cols: 80, rows: 24 })
    }

    /// Go raw and enable mouse reporting. No-op when already active.
    ///
    /// # Errors
    ///
    /// The termios change or the terminal write failed. Raw mode is
    /// undone again if only the write failed.
    pub fn enter(&mut self) -> io::Result<()> {
        if self.active {
            return Ok(());
        }

        install_panic_hook();
        let raw = RawMode::enable()?;

        if let Err(err) = write_flushed(|w| self.mouse.write_enable(w)) {
            if let Some(raw) = raw {
                let _ = raw.restore();
            }
            return Err(err);
        }

        self.raw = raw;
        self.active = true;
        Ok(())
    }

    /// Disable mouse reporting, then restore cooked mode. No-op when
    /// inactive.
    ///
    /// # Errors
    ///
    /// The terminal write or the termios restore failed. The handle is
    /// inactive afterwards either way.
    pub fn leave(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;

        let written = write_flushed(|w| self.mouse.write_disable(w));
        let restored = self.raw.take().map_or(Ok(()), RawMode::restore);
        written.and(restored)
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

/// Run `f` against a locked stdout and flush.
fn write_flushed(f: impl FnOnce(&mut io::StdoutLock<'static>) -> io::Result<()>) -> io::Result<()> {
    let mut out = io::stdout().lock();
    f(&mut out)?;
    out.flush()
}

// ─── Tests ───────────────────────────────────────────────────────────────────
