// SPDX-License-Identifier: MIT
//
// SGR mouse report decoder.
//
// Format: ESC [ < Pb ; Px ; Py M    (press / motion / wheel)
//         ESC [ < Pb ; Px ; Py m    (release)
//
// Pb is the button code, Px/Py are 1-indexed cell coordinates. We only
// need a handful of button codes: 0–2 are real buttons, 64/65 the wheel,
// and everything else (35 = motion with no button) is reported as a move.
//
// Once the `ESC [ <` introducer matches, the token belongs to us. If its
// terminator hasn't arrived yet we report `Incomplete` and consume
// nothing, so the next call can retry from the same start with more
// bytes in the window.

use crate::event::MouseKind;

/// The three-byte SGR mouse introducer.
pub const INTRODUCER: &[u8] = b"\x1b[<";

/// Outcome of scanning the window for a mouse report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseScan {
    /// The window does not start with a mouse report.
    NotMouse,
    /// A mouse report has started but its terminator is missing.
    Incomplete,
    /// A complete report.
    Complete(MouseReport),
}

/// A decoded report, without its raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseReport {
    pub kind: MouseKind,
    pub x: i32,
    pub y: i32,
    pub button: u8,
    /// Token length in bytes, introducer and terminator included.
    pub len: usize,
}

/// Look for a complete SGR mouse report at the start of `window`.
#[must_use]
pub fn scan(window: &[u8]) -> MouseScan {
    if !window.starts_with(INTRODUCER) {
        return MouseScan::NotMouse;
    }

    let params_start = INTRODUCER.len();
    let Some(offset) = window[params_start..]
        .iter()
        .position(|&b| b == b'M' || b == b'm')
    else {
        return MouseScan::Incomplete;
    };

    let end = params_start + offset;
    let release = window[end] == b'm';
    let [code, col, row] = parse_fields(&window[params_start..end]);

    MouseScan::Complete(MouseReport {
        kind: classify(code, release),
        x: to_cell(col),
        y: to_cell(row),
        button: button_number(code),
        len: end + 1,
    })
}

/// Split `Pb ; Px ; Py` into three numbers.
///
/// Plain left-to-right digit accumulation. Missing fields are 0, extra
/// fields are ignored, and stray non-digit bytes are skipped.
fn parse_fields(params: &[u8]) -> [u32; 3] {
    let mut fields = [0u32; 3];
    let mut index = 0;

    for &b in params {
        match b {
            b';' => {
                index += 1;
                if index == fields.len() {
                    break;
                }
            }
            b'0'..=b'9' => {
                fields[index] = fields[index]
                    .saturating_mul(10)
                    .saturating_add(u32::from(b - b'0'));
            }
            _ => {}
        }
    }

    fields
}

/// Map a button code and terminator to a mouse kind.
const fn classify(code: u32, release: bool) -> MouseKind {
    match code {
        0..=2 if release => MouseKind::ButtonUp,
        0..=2 => MouseKind::ButtonDown,
        64 => MouseKind::WheelUp,
        65 => MouseKind::WheelDown,
        // 35 is motion without a button; unknown codes are treated alike.
        _ => MouseKind::Move,
    }
}

/// The reported button: the code itself for real buttons, else 0.
#[allow(clippy::cast_possible_truncation)] // code < 3
const fn button_number(code: u32) -> u8 {
    if code < 3 { code as u8 } else { 0 }
}

/// Wire coordinates are 1-indexed; ours are 0-indexed.
fn to_cell(wire: u32) -> i32 {
    i32::try_from(wire).unwrap_or(i32::MAX) - 1
}

// ─── Tests ──────────────────────────────────────────────────────────────────
