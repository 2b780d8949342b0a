// SPDX-License-Identifier: MIT
//
// Key sequence decoder.
//
// Runs only when the mouse decoder declined the window. The rules below
// are tried in order and the first one that claims the window wins.
// Order matters: longer, more specific forms (numeric CSI, modifier
// forms) must come before the generic `ESC [ <letter>` fallback, or a
// Ctrl+Arrow would be read as a bare `[` followed by `1`.
//
//   1. incomplete prefix     ESC [ <params…>  / ESC O       → wait
//   2. numeric tilde         ESC [ <digits> ~               → key
//   3. mouse-fragment guard  `;` … `M`/`m` without ESC [ 1 ; → drop window
//   4. print/pause           ESC [ 5 7 3 6 (1|2) [; (2|5)] u → key
//   5. single byte           one byte, or not ESC [ / ESC O → key
//   6. modified arrow        ESC [ 1 ; (5|2) <A-D,H,F>      → key
//   7. csi letter            ESC [ <letter>                 → key
//   8. ss3                   ESC O <letter>                 → key
//   9. literal run           letters up to a stop byte      → key / drop 1
//
// Rule 9 always claims the window, so the table is total. `scan_final`
// skips rule 1, for a window that has stopped growing.

use tracing::debug;

use crate::event::KeyKind;

const ESC: u8 = 0x1b;

/// Prefix of the xterm "modified key" form: `ESC [ 1 ;`.
const MODIFIER_PREFIX: &[u8] = b"\x1b[1;";

/// Shared prefix of the PrintScreen / Pause numeric forms.
const PRINT_PAUSE_PREFIX: &[u8] = b"\x1b[5736";

/// Outcome of scanning the window for a key token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyScan {
    /// A key token of the given length.
    Key(KeyKind, usize),
    /// The window is the start of a longer token; consume nothing.
    Wait,
    /// Discard this many bytes without producing an event.
    Drop(usize),
}

/// A single matcher: `None` means "not mine, try the next rule".
type Rule = fn(&[u8]) -> Option<KeyScan>;

/// The rule table, in priority order.
const RULES: [(&str, Rule); 9] = [
    ("incomplete-prefix", incomplete_prefix),
    ("numeric-tilde", numeric_tilde),
    ("mouse-fragment-guard", mouse_fragment_guard),
    ("print-pause", print_pause),
    ("single-byte", single_byte),
    ("modified-arrow", modified_arrow),
    ("csi-letter", csi_letter),
    ("ss3", ss3),
    ("literal-run", literal_run),
];

/// Decode one key token from the start of `window`.
///
/// `window` must not be empty.
#[must_use]
pub fn scan(window: &[u8]) -> KeyScan {
    run(&RULES, window)
}

/// Like [`scan`], but the window is known to be all there is: no more
/// bytes are coming, so an unfinished prefix is never waited on.
///
/// `ESC O` alone resolves as a dropped escape followed by `O`, the same
/// way any other escape the table doesn't know does. Never returns
/// [`KeyScan::Wait`].
#[must_use]
pub fn scan_final(window: &[u8]) -> KeyScan {
    run(&RULES[1..], window)
}

fn run(rules: &[(&str, Rule)], window: &[u8]) -> KeyScan {
    debug_assert!(!window.is_empty());

    for &(name, rule) in rules {
        if let Some(result) = rule(window) {
            if let KeyScan::Drop(len) = result {
                debug!(rule = name, len, "dropping undecodable input");
            }
            return result;
        }
    }

    // Unreachable: `literal_run` always answers. Drop a byte rather than
    // stall if that ever changes.
    KeyScan::Drop(1)
}

// ── 1. Incomplete prefix ────────────────────────────────────────────────────

/// Hold back a CSI/SS3 sequence whose final byte hasn't arrived yet.
///
/// `ESC [` followed only by parameter bytes (digits, `;`, `<`) can still
/// become any numeric, modifier or mouse form. Deciding now would split
/// it into garbage characters.
fn incomplete_prefix(window: &[u8]) -> Option<KeyScan> {
    if window == b"\x1bO" {
        return Some(KeyScan::Wait);
    }
    if !window.starts_with(b"\x1b[") {
        return None;
    }
    window[2..]
        .iter()
        .all(|&b| b.is_ascii_digit() || b == b';' || b == b'<')
        .then_some(KeyScan::Wait)
}

// ── 2. Numeric tilde ────────────────────────────────────────────────────────

/// `ESC [ <digits> ~`: editing and function keys.
fn numeric_tilde(window: &[u8]) -> Option<KeyScan> {
    let rest = window.strip_prefix(b"\x1b[")?;
    let digits = rest.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 || rest.get(digits) != Some(&b'~') {
        return None;
    }

    let kind = match parse_number(&rest[..digits]) {
        3 => KeyKind::Delete,
        5 => KeyKind::PageUp,
        6 => KeyKind::PageDown,
        15 => KeyKind::F5,
        17 => KeyKind::F6,
        18 => KeyKind::F7,
        19 => KeyKind::F8,
        20 => KeyKind::F9,
        21 => KeyKind::F10,
        23 => KeyKind::F11,
        24 => KeyKind::F12,
        _ => KeyKind::Unrecognized,
    };

    // ESC [ + digits + ~
    Some(KeyScan::Key(kind, 2 + digits + 1))
}

// ── 3. Mouse-fragment guard ─────────────────────────────────────────────────

/// Drop the whole window when it looks like a desynchronized mouse report.
///
/// Mouse and key tokens share the `ESC [` introducer and interleave under
/// heavy motion reporting. A window holding both `;` and an `M`/`m`
/// terminator that isn't a modifier form is treated as a broken mouse
/// fragment. This can take an innocent keystroke sharing the read with it.
fn mouse_fragment_guard(window: &[u8]) -> Option<KeyScan> {
    let suspicious = window.len() >= 5
        && window.contains(&b';')
        && window.iter().any(|&b| b == b'M' || b == b'm')
        && !window.starts_with(MODIFIER_PREFIX);

    suspicious.then_some(KeyScan::Drop(window.len()))
}

// ── 4. PrintScreen / Pause ──────────────────────────────────────────────────

/// `ESC [ 5 7 3 6 1 u` (PrintScreen) and `ESC [ 5 7 3 6 2 u` (Pause),
/// optionally with `; 2` (Shift) or `; 5` (Ctrl) before the `u`.
fn print_pause(window: &[u8]) -> Option<KeyScan> {
    if window.len() < 8 || !window.starts_with(PRINT_PAUSE_PREFIX) {
        return None;
    }

    let pause = match window[6] {
        b'1' => false,
        b'2' => true,
        _ => return None,
    };

    if window[7] == b'u' {
        let kind = if pause { KeyKind::Pause } else { KeyKind::PrintScreen };
        return Some(KeyScan::Key(kind, 8));
    }

    if window.len() < 10 || window[7] != b';' || window[9] != b'u' {
        return None;
    }

    let kind = match (window[8], pause) {
        (b'2', false) => KeyKind::ShiftPrintScreen,
        (b'2', true) => KeyKind::ShiftPause,
        (b'5', false) => KeyKind::CtrlPrintScreen,
        (b'5', true) => KeyKind::CtrlPause,
        _ => return None,
    };
    Some(KeyScan::Key(kind, 10))
}

// ── 5. Single byte ──────────────────────────────────────────────────────────

/// A lone byte, or a byte not followed by a CSI/SS3 introducer.
fn single_byte(window: &[u8]) -> Option<KeyScan> {
    if window.len() > 1 && matches!(window[1], b'[' | b'O') {
        return None;
    }

    let kind = match window[0] {
        0x03 => KeyKind::CtrlC,
        ESC => KeyKind::Escape,
        b'\r' | b'\n' => KeyKind::Enter,
        0x08 | 0x7f => KeyKind::Backspace,
        b'\t' => KeyKind::Tab,
        _ => KeyKind::Char,
    };
    Some(KeyScan::Key(kind, 1))
}

// ── 6. Modified arrows / Home / End ─────────────────────────────────────────

/// `ESC [ 1 ; 5 <L>` (Ctrl) and `ESC [ 1 ; 2 <L>` (Shift).
fn modified_arrow(window: &[u8]) -> Option<KeyScan> {
    if window.len() < 6 || !window.starts_with(MODIFIER_PREFIX) {
        return None;
    }

    let kind = match (window[4], window[5]) {
        (b'5', b'A') => KeyKind::CtrlUp,
        (b'5', b'B') => KeyKind::CtrlDown,
        (b'5', b'C') => KeyKind::CtrlRight,
        (b'5', b'D') => KeyKind::CtrlLeft,
        (b'5', b'H') => KeyKind::CtrlHome,
        (b'5', b'F') => KeyKind::CtrlEnd,
        (b'2', b'A') => KeyKind::ShiftUp,
        (b'2', b'B') => KeyKind::ShiftDown,
        (b'2', b'C') => KeyKind::ShiftRight,
        (b'2', b'D') => KeyKind::ShiftLeft,
        (b'2', b'H') => KeyKind::ShiftHome,
        (b'2', b'F') => KeyKind::ShiftEnd,
        _ => return None,
    };
    Some(KeyScan::Key(kind, 6))
}

// ── 7. CSI letter ───────────────────────────────────────────────────────────

/// `ESC [ <letter>`: plain arrows, Home/End, Shift+Tab.
fn csi_letter(window: &[u8]) -> Option<KeyScan> {
    let &letter = window.strip_prefix(b"\x1b[")?.first()?;
    if !letter.is_ascii_alphabetic() {
        return None;
    }

    let kind = match letter {
        b'A' => KeyKind::Up,
        b'B' => KeyKind::Down,
        b'C' => KeyKind::Right,
        b'D' => KeyKind::Left,
        b'H' => KeyKind::Home,
        b'F' => KeyKind::End,
        b'Z' => KeyKind::ShiftTab,
        _ => KeyKind::Unrecognized,
    };
    Some(KeyScan::Key(kind, 3))
}

// ── 8. SS3 ──────────────────────────────────────────────────────────────────

/// `ESC O <letter>`: F1–F4 on most terminals.
fn ss3(window: &[u8]) -> Option<KeyScan> {
    let &letter = window.strip_prefix(b"\x1bO")?.first()?;
    if !letter.is_ascii_alphabetic() {
        return None;
    }

    let kind = match letter {
        b'P' => KeyKind::F1,
        b'Q' => KeyKind::F2,
        b'R' => KeyKind::F3,
        b'S' => KeyKind::F4,
        _ => KeyKind::Unrecognized,
    };
    Some(KeyScan::Key(kind, 3))
}

// ── 9. Literal run ──────────────────────────────────────────────────────────

/// Bytes that end a literal run: sequence introducers and mouse terminators.
const fn is_stop_byte(b: u8) -> bool {
    matches!(b, ESC | b'[' | b'<' | b';' | b'M' | b'm')
}

/// Consume a run of ASCII letters as one token, or drop one poison byte.
#[allow(clippy::unnecessary_wraps)] // Same signature as every other rule.
fn literal_run(window: &[u8]) -> Option<KeyScan> {
    let run = window
        .iter()
        .take_while(|&&b| b.is_ascii_alphabetic() && !is_stop_byte(b))
        .count();

    Some(match run {
        0 => KeyScan::Drop(1),
        1 => KeyScan::Key(KeyKind::Char, 1),
        n => KeyScan::Key(KeyKind::Unrecognized, n),
    })
}

// ─── Helpers ────────────────────────────────────────────────────────────────

/// Decimal digits to a number, saturating.
fn parse_number(digits: &[u8]) -> u32 {
    digits.iter().fold(0u32, |acc, &b| {
        acc.saturating_mul(10).saturating_add(u32::from(b - b'0'))
    })
}

// ─── Tests ──────────────────────────────────────────────────────────────────
