// SPDX-License-Identifier: MIT
//
// Input event vocabulary.
//
// Two event kinds leave the decoder: keys and mouse reports. Both carry
// the raw bytes of the token they were decoded from. The decoder hands
// out a *view* into its buffer (`Cow::Borrowed`) that lives only until
// the next decode call; the borrow checker enforces this, since the
// event borrows the decoder. Call [`InputEvent::into_owned`] to keep an
// event around longer.

use std::borrow::Cow;

// ─── Events ─────────────────────────────────────────────────────────────────

/// A decoded terminal input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent<'a> {
    /// A keystroke (single byte or escape sequence).
    Key(KeyEvent<'a>),
    /// An SGR mouse report.
    Mouse(MouseEvent<'a>),
}

/// A keystroke with its classification and source bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent<'a> {
    /// Which key was recognized.
    pub kind: KeyKind,
    /// The bytes of the token, e.g. `b"a"` or `b"\x1b[A"`.
    pub raw: Cow<'a, [u8]>,
}

/// A mouse report with position and button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MouseEvent<'a> {
    /// What happened.
    pub kind: MouseKind,
    /// 0-indexed column. The wire value 0 (never sent by real terminals)
    /// decodes to -1.
    pub x: i32,
    /// 0-indexed row.
    pub y: i32,
    /// Button number 0–2 for button reports, 0 otherwise.
    pub button: u8,
    /// The bytes of the token, e.g. `b"\x1b[<0;10;5M"`.
    pub raw: Cow<'a, [u8]>,
}

impl InputEvent<'_> {
    /// Copy the raw bytes out of the decoder buffer.
    #[must_use]
    pub fn into_owned(self) -> InputEvent<'static> {
        match self {
            Self::Key(key) => InputEvent::Key(key.into_owned()),
            Self::Mouse(mouse) => InputEvent::Mouse(mouse.into_owned()),
        }
    }

    /// Re-borrow an event as a view.
    #[must_use]
    pub fn as_view(&self) -> InputEvent<'_> {
        match self {
            Self::Key(key) => InputEvent::Key(KeyEvent {
                kind: key.kind,
                raw: Cow::Borrowed(&key.raw),
            }),
            Self::Mouse(mouse) => InputEvent::Mouse(MouseEvent {
                raw: Cow::Borrowed(&mouse.raw),
                ..*mouse
            }),
        }
    }

    /// Raw token bytes, whichever kind of event this is.
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        match self {
            Self::Key(key) => &key.raw,
            Self::Mouse(mouse) => &mouse.raw,
        }
    }

    /// The key kind, if this is a key event.
    #[must_use]
    pub const fn key_kind(&self) -> Option<KeyKind> {
        match self {
            Self::Key(key) => Some(key.kind),
            Self::Mouse(_) => None,
        }
    }
}

impl KeyEvent<'_> {
    /// Detach from the decoder buffer.
    #[must_use]
    pub fn into_owned(self) -> KeyEvent<'static> {
        KeyEvent {
            kind: self.kind,
            raw: Cow::Owned(self.raw.into_owned()),
        }
    }
}

impl MouseEvent<'_> {
    /// Detach from the decoder buffer.
    #[must_use]
    pub fn into_owned(self) -> MouseEvent<'static> {
        MouseEvent {
            kind: self.kind,
            x: self.x,
            y: self.y,
            button: self.button,
            raw: Cow::Owned(self.raw.into_owned()),
        }
    }
}

// ─── Kinds ──────────────────────────────────────────────────────────────────

/// Identity of a decoded key.
///
/// A closed set: anything the decoder can frame as a token but not map
/// lands in [`Unrecognized`](KeyKind::Unrecognized). For
/// [`Char`](KeyKind::Char) the character is the token's single raw byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    /// A plain character byte.
    Char,
    Enter,
    Escape,
    CtrlC,
    // ── Arrows ──────────────────────────────────────────────────
    Up,
    Down,
    Left,
    Right,
    CtrlUp,
    CtrlDown,
    CtrlLeft,
    CtrlRight,
    ShiftUp,
    ShiftDown,
    ShiftLeft,
    ShiftRight,
    // ── Navigation ──────────────────────────────────────────────
    Home,
    End,
    CtrlHome,
    CtrlEnd,
    ShiftHome,
    ShiftEnd,
    PageUp,
    PageDown,
    // ── Function keys ───────────────────────────────────────────
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    // ── Editing ─────────────────────────────────────────────────
    Backspace,
    Delete,
    Tab,
    ShiftTab,
    // ── PrintScreen / Pause ─────────────────────────────────────
    PrintScreen,
    Pause,
    ShiftPrintScreen,
    ShiftPause,
    CtrlPrintScreen,
    CtrlPause,
    /// A framed token with no mapping.
    Unrecognized,
}

/// Mouse report classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseKind {
    /// Button 0–2 pressed (`M` terminator).
    ButtonDown,
    /// Button 0–2 released (`m` terminator).
    ButtonUp,
    WheelUp,
    WheelDown,
    /// Pointer motion, and any button code we don't classify.
    Move,
}

// ─── Tests ──────────────────────────────────────────────────────────────────
