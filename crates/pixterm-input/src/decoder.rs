// SPDX-License-Identifier: MIT
//
// Decoder: the public entry point of the input layer.
//
// One call, at most one event:
//
//   decode() → refill buffer if drained (or topping up an incomplete
//              token) → mouse decoder → key decoder → event or nothing
//
// Mouse goes first because its `ESC [ <` introducer is unambiguous; once
// it matches, the token is a mouse report no matter what follows. Only
// when the mouse decoder declines does the key rule table run.
//
// Every call returns immediately. State lives in the owned buffer, so a
// sequence split across reads (`ESC [` now, `A` later) decodes to one
// event once the rest arrives. The decoder holds no global state: build
// as many as you like, each with its own source.

use std::borrow::Cow;

use tracing::{debug, trace};

use crate::buffer::InputBuffer;
use crate::config::DecoderConfig;
use crate::error::Result;
use crate::event::{InputEvent, KeyEvent, MouseEvent};
use crate::key::{self, KeyScan};
use crate::mouse::{self, MouseScan};
use crate::source::ByteSource;

/// Byte-stream input decoder.
///
/// Owns its [`InputBuffer`] and its [`ByteSource`]. Events returned by
/// [`decode`](Self::decode) borrow the buffer, so they must be dropped
/// (or [`into_owned`](InputEvent::into_owned)) before the next call.
///
/// # Example
///
/// ```
/// use pixterm_input::decoder::Decoder;
/// use pixterm_input::event::{InputEvent, MouseKind};
/// use pixterm_input::source::ChunkSource;
///
/// let mut decoder = Decoder::new(ChunkSource::from_chunks([b"\x1b[<0;10;5M"]));
/// let Some(InputEvent::Mouse(mouse)) = decoder.decode()? else { panic!() };
/// assert_eq!((mouse.kind, mouse.x, mouse.y), (MouseKind::ButtonDown, 9, 4));
/// # Ok::<(), pixterm_input::error::InputError>(())
/// ```
#[derive(Debug)]
pub struct Decoder<S> {
    buffer: InputBuffer,
    source: S,
    /// Decoding a flushed window: no rule waits for more bytes.
    flushing: bool,
}

impl<S: ByteSource> Decoder<S> {
    /// Decoder with the default configuration.
    #[must_use]
    pub fn new(source: S) -> Self {
        Self {
            buffer: InputBuffer::new(DecoderConfig::default().capacity),
            source,
            flushing: false,
        }
    }

    /// Decoder with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::CapacityTooSmall`](crate::error::InputError::CapacityTooSmall)
    /// if the configured buffer is too small.
    pub fn with_config(source: S, config: DecoderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            buffer: InputBuffer::new(config.capacity),
            source,
            flushing: false,
        })
    }

    /// Decode at most one event.
    ///
    /// Returns `Ok(None)` when nothing was produced this call: the source
    /// had no data, a token is still incomplete, or bytes were discarded.
    /// Calling again is always safe.
    ///
    /// # Errors
    ///
    /// [`ProbeFailed`](crate::error::InputError::ProbeFailed) or
    /// [`ReadFailed`](crate::error::InputError::ReadFailed) if the source
    /// fails. The decoder stays usable.
    pub fn decode(&mut self) -> Result<Option<InputEvent<'_>>> {
        if !self.buffer.ensure_data(&mut self.source)? {
            self.flushing = false;
            return Ok(None);
        }

        let mouse_scan = mouse::scan(self.buffer.pending());
        match mouse_scan {
            MouseScan::Complete(report) => {
                self.finish_flush_after(report.len);
                let raw = self.buffer.take(report.len);
                trace!(kind = ?report.kind, x = report.x, y = report.y, "decoded mouse report");
                return Ok(Some(InputEvent::Mouse(MouseEvent {
                    kind: report.kind,
                    x: report.x,
                    y: report.y,
                    button: report.button,
                    raw: Cow::Borrowed(raw),
                })));
            }
            MouseScan::Incomplete if self.flushing => {
                self.flushing = false;
                self.abandon_pending();
                return Ok(None);
            }
            MouseScan::Incomplete => {
                self.buffer.request_more();
                return Ok(None);
            }
            MouseScan::NotMouse => {}
        }

        let key_scan = if self.flushing {
            key::scan_final(self.buffer.pending())
        } else {
            key::scan(self.buffer.pending())
        };
        match key_scan {
            KeyScan::Key(kind, len) => {
                self.finish_flush_after(len);
                let raw = self.buffer.take(len);
                trace!(?kind, len, "decoded key");
                Ok(Some(InputEvent::Key(KeyEvent {
                    kind,
                    raw: Cow::Borrowed(raw),
                })))
            }
            KeyScan::Wait => {
                self.buffer.request_more();
                Ok(None)
            }
            KeyScan::Drop(len) => {
                self.finish_flush_after(len);
                self.buffer.consume(len);
                Ok(None)
            }
        }
    }

    /// End flush mode once the token about to be consumed is the last
    /// pending one.
    fn finish_flush_after(&mut self, len: usize) {
        if len >= self.buffer.pending().len() {
            self.flushing = false;
        }
    }

    /// Whether undecoded bytes are waiting in the buffer.
    #[must_use]
    pub const fn has_pending(&self) -> bool {
        !self.buffer.is_drained()
    }

    /// Give up on whatever is pending, typically a token that never
    /// completed. Returns how many bytes were dropped.
    ///
    /// The decoder has no clock; callers decide when a pending token has
    /// waited long enough. Prefer [`flush_pending`](Self::flush_pending)
    /// for key input: it keeps the keystrokes inside a stalled prefix.
    pub fn abandon_pending(&mut self) -> usize {
        self.flushing = false;
        let dropped = self.buffer.discard_pending();
        if dropped > 0 {
            debug!(dropped, "abandoned pending input");
        }
        dropped
    }

    /// Stop waiting for the rest of a stalled token.
    ///
    /// The pending bytes are decoded by the following `decode` calls as if
    /// nothing more will arrive: `ESC O` typed as Alt+O yields the `O`
    /// instead of hanging. An unterminated mouse report can't be salvaged
    /// and is dropped once it reaches the front of the window.
    ///
    /// Returns how many bytes were dropped right away (only when the window
    /// starts with an unterminated mouse report).
    pub fn flush_pending(&mut self) -> usize {
        if self.buffer.is_drained() {
            return 0;
        }
        if mouse::scan(self.buffer.pending()) == MouseScan::Incomplete {
            return self.abandon_pending();
        }
        debug!(pending = self.buffer.pending().len(), "flushing stalled input");
        self.buffer.stop_waiting();
        self.flushing = true;
        0
    }

    /// The input buffer, for inspection.
    #[must_use]
    pub const fn buffer(&self) -> &InputBuffer {
        &self.buffer
    }

    /// The byte source.
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// The byte source, mutably (e.g. to queue more scripted chunks).
    pub const fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Tear down the decoder and return its source.
    #[must_use]
    pub fn into_source(self) -> S {
        self.source
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InputError;
    use crate::event::{KeyKind, MouseKind};
    use crate::source::ChunkSource;
    use pretty_assertions::assert_eq;

    fn decoder(chunks: &[&[u8]]) -> Decoder<ChunkSource> {
        Decoder::new(ChunkSource::from_chunks(chunks.iter().copied()))
    }

    /// Run enough decode calls to exhaust `chunks`, keeping every event.
    fn collect(chunks: &[&[u8]]) -> Vec<InputEvent<'static>> {
        let total: usize = chunks.iter().map(|c| c.len()).sum();
        let mut decoder = decoder(chunks);
        let mut events = Vec::new();
        for _ in 0..(total * 2 + chunks.len() + 4) {
            if let Some(event) = decoder.decode().unwrap() {
                events.push(event.into_owned());
            }
        }
        events
    }

    fn key_kinds(events: &[InputEvent<'_>]) -> Vec<KeyKind> {
        events.iter().filter_map(InputEvent::key_kind).collect()
    }

    fn one_event(bytes: &[u8]) -> InputEvent<'static> {
        let events = collect(&[bytes]);
        assert_eq!(events.len(), 1, "expected one event, got {events:?}");
        events.into_iter().next().unwrap()
    }

    fn key(kind: KeyKind, raw: &[u8]) -> InputEvent<'static> {
        InputEvent::Key(KeyEvent {
            kind,
            raw: Cow::Owned(raw.to_vec()),
        })
    }

    // ── No data ─────────────────────────────────────────────────────────

    #[test]
    fn empty_source_yields_nothing_repeatedly() {
        let mut decoder = decoder(&[]);
        for _ in 0..10 {
            assert!(decoder.decode().unwrap().is_none());
        }
        assert!(!decoder.has_pending());
    }

    #[test]
    fn capacity_below_minimum_is_rejected() {
        let result = Decoder::with_config(
            ChunkSource::new(),
            DecoderConfig::default().with_capacity(8),
        );
        assert!(matches!(result, Err(InputError::CapacityTooSmall { .. })));
    }

    #[test]
    fn with_config_uses_capacity() {
        let decoder = Decoder::with_config(
            ChunkSource::new(),
            DecoderConfig::default().with_capacity(64),
        )
        .unwrap();
        assert_eq!(decoder.buffer().capacity(), 64);
    }

    // ── Keys ────────────────────────────────────────────────────────────

    #[test]
    fn plain_character_borrows_raw_byte() {
        let mut decoder = decoder(&[b"a"]);
        let event = decoder.decode().unwrap().unwrap();
        assert_eq!(event.key_kind(), Some(KeyKind::Char));
        assert_eq!(event.raw(), b"a");
        let InputEvent::Key(key) = event else {
            panic!("expected key");
        };
        assert!(matches!(key.raw, Cow::Borrowed(_)));
    }

    #[test]
    fn arrow_keys() {
        assert_eq!(one_event(b"\x1b[A"), key(KeyKind::Up, b"\x1b[A"));
        assert_eq!(one_event(b"\x1b[1;5A"), key(KeyKind::CtrlUp, b"\x1b[1;5A"));
        assert_eq!(
            one_event(b"\x1b[1;2D"),
            key(KeyKind::ShiftLeft, b"\x1b[1;2D")
        );
    }

    #[test]
    fn function_keys() {
        assert_eq!(one_event(b"\x1b[15~").key_kind(), Some(KeyKind::F5));
        assert_eq!(one_event(b"\x1bOP").key_kind(), Some(KeyKind::F1));
    }

    #[test]
    fn typed_word_is_one_char_per_call() {
        let events = collect(&[b"hi\r"]);
        assert_eq!(
            key_kinds(&events),
            [KeyKind::Char, KeyKind::Char, KeyKind::Enter]
        );
        assert_eq!(events[1].raw(), b"i");
    }

    #[test]
    fn ctrl_c_is_decoded() {
        assert_eq!(one_event(b"\x03").key_kind(), Some(KeyKind::CtrlC));
    }

    // ── Mouse ───────────────────────────────────────────────────────────

    #[test]
    fn mouse_press_round_trip() {
        for button in 0..3u8 {
            let token = format!("\x1b[<{button};10;5M");
            let event = one_event(token.as_bytes());
            let InputEvent::Mouse(mouse) = event else {
                panic!("expected mouse event");
            };
            assert_eq!(mouse.kind, MouseKind::ButtonDown);
            assert_eq!((mouse.x, mouse.y, mouse.button), (9, 4, button));
            assert_eq!(&*mouse.raw, token.as_bytes());
        }
    }

    #[test]
    fn wheel_up() {
        let InputEvent::Mouse(mouse) = one_event(b"\x1b[<64;1;1M") else {
            panic!("expected mouse event");
        };
        assert_eq!(
            (mouse.kind, mouse.x, mouse.y, mouse.button),
            (MouseKind::WheelUp, 0, 0, 0)
        );
    }

    #[test]
    fn burst_of_motion_reports_in_one_read() {
        let mut burst = Vec::new();
        for x in 1..=30 {
            burst.extend_from_slice(format!("\x1b[<35;{x};1M").as_bytes());
        }
        let events = collect(&[&burst]);
        assert_eq!(events.len(), 30);
        for (i, event) in events.iter().enumerate() {
            let InputEvent::Mouse(mouse) = event else {
                panic!("expected mouse event");
            };
            assert_eq!(mouse.kind, MouseKind::Move);
            assert_eq!(mouse.x, i32::try_from(i).unwrap());
        }
    }

    #[test]
    fn mouse_then_key_in_separate_reads() {
        let events = collect(&[b"\x1b[<0;3;3M", b"q"]);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], InputEvent::Mouse(_)));
        assert_eq!(events[1].key_kind(), Some(KeyKind::Char));
    }

    // ── Partial sequences ───────────────────────────────────────────────

    #[test]
    fn csi_split_across_reads() {
        let mut decoder = decoder(&[b"\x1b[", b"A"]);
        assert!(decoder.decode().unwrap().is_none());
        let event = decoder.decode().unwrap().unwrap();
        assert_eq!(event, key(KeyKind::Up, b"\x1b[A"));
        assert!(decoder.decode().unwrap().is_none());
    }

    #[test]
    fn csi_waits_until_rest_arrives() {
        let mut decoder = decoder(&[b"\x1b["]);
        for _ in 0..3 {
            assert!(decoder.decode().unwrap().is_none());
        }
        assert!(decoder.has_pending());

        decoder.source_mut().push(b"A");
        let event = decoder.decode().unwrap().unwrap();
        assert_eq!(event.key_kind(), Some(KeyKind::Up));
    }

    #[test]
    fn mouse_split_across_reads() {
        let mut decoder = decoder(&[b"\x1b[<0;10", b";5M"]);
        assert!(decoder.decode().unwrap().is_none());
        let Some(InputEvent::Mouse(mouse)) = decoder.decode().unwrap() else {
            panic!("expected mouse event");
        };
        assert_eq!((mouse.kind, mouse.x, mouse.y), (MouseKind::ButtonDown, 9, 4));
        assert_eq!(&*mouse.raw, b"\x1b[<0;10;5M");
    }

    #[test]
    fn modifier_form_split_across_reads() {
        let events = collect(&[b"\x1b[1;", b"5C"]);
        assert_eq!(key_kinds(&events), [KeyKind::CtrlRight]);
    }

    #[test]
    fn lone_escape_at_read_boundary_is_escape_key() {
        // A read ending in a bare ESC is taken as the Escape key.
        let events = collect(&[b"\x1b", b"x"]);
        assert_eq!(key_kinds(&events), [KeyKind::Escape, KeyKind::Char]);
    }

    #[test]
    fn abandon_pending_drops_incomplete_token() {
        let mut decoder = decoder(&[b"\x1b[<0;1"]);
        assert!(decoder.decode().unwrap().is_none());
        assert_eq!(decoder.abandon_pending(), 6);
        assert!(!decoder.has_pending());

        decoder.source_mut().push(b"z");
        let event = decoder.decode().unwrap().unwrap();
        assert_eq!(event.raw(), b"z");
    }

    /// Poll until the decoder goes quiet, keeping every event.
    fn drain(decoder: &mut Decoder<ChunkSource>) -> Vec<InputEvent<'static>> {
        let mut events = Vec::new();
        for _ in 0..16 {
            if let Some(event) = decoder.decode().unwrap() {
                events.push(event.into_owned());
            }
        }
        events
    }

    #[test]
    fn flushed_ss3_prefix_keeps_the_letter() {
        // Alt+O arrives as ESC O and nothing ever completes it.
        let mut decoder = decoder(&[b"\x1bO"]);
        assert!(drain(&mut decoder).is_empty());
        assert!(decoder.buffer().needs_more());

        assert_eq!(decoder.flush_pending(), 0);
        assert_eq!(drain(&mut decoder), [key(KeyKind::Char, b"O")]);
        assert!(!decoder.has_pending());
    }

    #[test]
    fn flushed_csi_prefix_keeps_the_bracket() {
        let mut decoder = decoder(&[b"\x1b["]);
        assert!(drain(&mut decoder).is_empty());
        decoder.flush_pending();
        assert_eq!(drain(&mut decoder), [key(KeyKind::Char, b"[")]);
    }

    #[test]
    fn flush_ends_once_the_window_is_decoded() {
        let mut decoder = decoder(&[b"\x1bO"]);
        drain(&mut decoder);
        decoder.flush_pending();
        drain(&mut decoder);

        // A fresh prefix waits again.
        decoder.source_mut().push(b"\x1b[");
        assert!(drain(&mut decoder).is_empty());
        decoder.source_mut().push(b"B");
        assert_eq!(drain(&mut decoder), [key(KeyKind::Down, b"\x1b[B")]);
    }

    #[test]
    fn flushing_an_unterminated_mouse_report_drops_it() {
        let mut decoder = decoder(&[b"\x1b[<0;10"]);
        drain(&mut decoder);
        assert_eq!(decoder.flush_pending(), 7);
        assert!(!decoder.has_pending());
    }

    #[test]
    fn flush_with_nothing_pending() {
        let mut decoder = decoder(&[]);
        assert_eq!(decoder.flush_pending(), 0);
        assert!(drain(&mut decoder).is_empty());
    }

    #[test]
    fn abandon_with_nothing_pending() {
        let mut decoder = decoder(&[]);
        assert_eq!(decoder.abandon_pending(), 0);
    }

    // ── Discards ────────────────────────────────────────────────────────

    #[test]
    fn malformed_fragment_discards_to_end() {
        let mut decoder = decoder(&[b"x;yzM"]);
        assert!(decoder.decode().unwrap().is_none());
        let buffer = decoder.buffer();
        assert_eq!(buffer.consumed(), buffer.filled());
        assert_eq!(buffer.filled(), 5);
    }

    #[test]
    fn key_and_mouse_sharing_a_read_are_discarded() {
        // The fragment guard cannot tell this from a corrupted report.
        let events = collect(&[b"\x1b[A\x1b[<0;1;1M"]);
        assert!(events.is_empty());
    }

    #[test]
    fn poison_byte_is_skipped() {
        let events = collect(&[b"\x1b[!"]);
        // ESC dropped, then '[' and '!' as characters.
        assert_eq!(key_kinds(&events), [KeyKind::Char, KeyKind::Char]);
        assert_eq!(events[0].raw(), b"[");
    }

    // ── Properties ──────────────────────────────────────────────────────

    #[test]
    fn every_call_makes_progress() {
        let junk: &[u8] = b"\x1b[!\x1b[1;3Aqq[<;\x01\x1b[99~z\x1bOA";
        let mut decoder = decoder(&[junk]);
        // First call fills the buffer.
        let _ = decoder.decode().unwrap().map(InputEvent::into_owned);

        while decoder.has_pending() {
            let before = decoder.buffer().consumed();
            let produced = decoder.decode().unwrap().is_some();
            let after = decoder.buffer().consumed();
            assert!(after > before, "no progress (event: {produced})");
        }
        assert!(decoder.decode().unwrap().is_none());
    }

    /// Every two-way split of `input`, skipping splits that leave a bare
    /// ESC at the end of the first read.
    fn assert_split_independent(input: &[u8]) {
        let whole = collect(&[input]);
        assert!(!whole.is_empty());
        for at in 1..input.len() {
            if input[at - 1] == 0x1b {
                continue;
            }
            let (head, tail) = input.split_at(at);
            assert_eq!(collect(&[head, tail]), whole, "split at {at}");
        }
    }

    #[test]
    fn key_stream_is_split_independent() {
        assert_split_independent(
            b"ab\x1b[A\x1b[1;5C\x1b[15~\x1bOPxyz\r\x7f\x1b[57361;2u\x1b[3~\t\x1b[Z",
        );
    }

    #[test]
    fn mouse_stream_is_split_independent() {
        assert_split_independent(b"\x1b[<0;10;5M\x1b[<35;11;5M\x1b[<0;11;5m\x1b[<65;2;2M");
    }

    #[test]
    fn key_stream_decodes_expected_kinds() {
        let events = collect(&[b"ab\x1b[A\x1b[1;5C\x1b[15~\x1bOP\x1b[57361;2u"]);
        assert_eq!(
            key_kinds(&events),
            [
                KeyKind::Char,
                KeyKind::Char,
                KeyKind::Up,
                KeyKind::CtrlRight,
                KeyKind::F5,
                KeyKind::F1,
                KeyKind::ShiftPrintScreen,
            ]
        );
    }

    #[test]
    fn independent_decoders_do_not_share_state() {
        let mut first = decoder(&[b"\x1b["]);
        let mut second = decoder(&[b"q"]);
        assert!(first.decode().unwrap().is_none());
        let event = second.decode().unwrap().unwrap();
        assert_eq!(event.raw(), b"q");
        assert!(first.has_pending());
    }

    #[test]
    fn into_source_returns_remaining_chunks() {
        let mut decoder = decoder(&[b"a", b"b"]);
        let _ = decoder.decode().unwrap().map(InputEvent::into_owned);
        let source = decoder.into_source();
        assert_eq!(source.remaining(), 1);
        assert_eq!(source.reads(), 1);
    }
}
