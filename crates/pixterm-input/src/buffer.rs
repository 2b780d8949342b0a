// SPDX-License-Identifier: MIT
//
// InputBuffer: the bounded byte window the decoder works on.
//
// Layout:
//
//   ┌──────────────────────────────────────────────────────────┐
//   │ [consumed bytes...][pending bytes...][free space...]     │
//   │                    ^                 ^                   │
//   │                    consumed          filled              │
//   └──────────────────────────────────────────────────────────┘
//
// Invariant: `consumed <= filled <= capacity`.
//
// The buffer is refilled only once it is fully drained. A refill
// replaces the whole window: both cursors go back to zero before the
// read, so a fresh read never lands behind stale consumed bytes.
//
// The one exception is a token that is still arriving (`ESC [` read in
// one chunk, `A` in the next). The decoder calls `request_more()`; on the
// next `ensure_data()` the pending prefix is moved to the front and one
// read tops it up in place. If such a prefix ever fills the whole
// capacity, no token we know can complete it, so it is abandoned.

use std::io;

use tracing::{debug, trace, warn};

use crate::error::{InputError, Result};
use crate::source::ByteSource;

/// Bounded input window with a read cursor.
#[derive(Debug)]
pub struct InputBuffer {
    /// Fixed-size backing storage.
    data: Box<[u8]>,
    /// Start of the pending region.
    consumed: usize,
    /// End of the pending region.
    filled: usize,
    /// The pending bytes are an incomplete token; top up on next call.
    needs_more: bool,
}

impl InputBuffer {
    /// Allocate a buffer of `capacity` bytes.
    ///
    /// Capacity is checked by [`DecoderConfig::validate`](crate::config::DecoderConfig::validate);
    /// this constructor trusts it.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity].into_boxed_slice(),
            consumed: 0,
            filled: 0,
            needs_more: false,
        }
    }

    /// Total size of the window.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Offset of the first pending byte.
    #[inline]
    #[must_use]
    pub const fn consumed(&self) -> usize {
        self.consumed
    }

    /// Offset one past the last pending byte.
    #[inline]
    #[must_use]
    pub const fn filled(&self) -> usize {
        self.filled
    }

    /// Whether every buffered byte has been consumed.
    #[inline]
    #[must_use]
    pub const fn is_drained(&self) -> bool {
        self.consumed == self.filled
    }

    /// Whether the decoder is waiting for the rest of a token.
    #[inline]
    #[must_use]
    pub const fn needs_more(&self) -> bool {
        self.needs_more
    }

    /// The bytes not yet consumed.
    #[inline]
    #[must_use]
    pub fn pending(&self) -> &[u8] {
        &self.data[self.consumed..self.filled]
    }

    /// Advance the read cursor by `n` bytes (clamped to what is pending).
    pub fn consume(&mut self, n: usize) {
        self.consumed = (self.consumed + n).min(self.filled);
    }

    /// Consume `n` bytes and return them.
    ///
    /// The slice stays valid until the buffer is touched again.
    pub fn take(&mut self, n: usize) -> &[u8] {
        let start = self.consumed;
        self.consume(n);
        &self.data[start..self.consumed]
    }

    /// Drop every pending byte. Returns how many were dropped.
    pub fn discard_pending(&mut self) -> usize {
        let dropped = self.filled - self.consumed;
        self.consumed = self.filled;
        self.needs_more = false;
        dropped
    }

    /// Mark the pending bytes as an incomplete token.
    ///
    /// The next [`ensure_data`](Self::ensure_data) will try to read more
    /// even though bytes are pending.
    pub const fn request_more(&mut self) {
        self.needs_more = true;
    }

    /// Withdraw a [`request_more`](Self::request_more): the pending bytes
    /// are decoded as they are, without waiting for another read.
    pub const fn stop_waiting(&mut self) {
        self.needs_more = false;
    }

    /// Make sure there is something to decode.
    ///
    /// Returns `true` immediately if bytes are pending and no top-up was
    /// requested. Otherwise probes `source` once and, if it has data,
    /// reads once. Never blocks (provided the source doesn't).
    ///
    /// Returns whether any bytes are pending afterwards.
    ///
    /// # Errors
    ///
    /// [`InputError::ProbeFailed`] if the readiness probe fails,
    /// [`InputError::ReadFailed`] if the read fails. `WouldBlock` and
    /// `Interrupted` reads count as "no data", not as errors.
    pub fn ensure_data<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> Result<bool> {
        if !self.is_drained() && !self.needs_more {
            return Ok(true);
        }

        self.compact();

        if self.filled == self.capacity() {
            warn!(
                pending = self.filled,
                "incomplete token fills the input buffer; abandoning it"
            );
            self.discard_pending();
            self.compact();
        }

        if !source.poll_available().map_err(InputError::ProbeFailed)? {
            return Ok(!self.is_drained());
        }

        let n = match source.read_into(&mut self.data[self.filled..]) {
            Ok(n) => n,
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                0
            }
            Err(err) => return Err(InputError::ReadFailed(err)),
        };

        if n > 0 {
            trace!(bytes = n, topped_up = self.filled, "read terminal input");
            self.filled += n;
            self.needs_more = false;
        }

        Ok(!self.is_drained())
    }

    /// Move pending bytes to the front and reset the cursors.
    ///
    /// When drained this is the plain "replace the whole window" reset.
    fn compact(&mut self) {
        if self.consumed == 0 {
            return;
        }
        if self.is_drained() {
            self.consumed = 0;
            self.filled = 0;
            return;
        }
        let len = self.filled - self.consumed;
        debug!(len, "keeping incomplete token for top-up");
        self.data.copy_within(self.consumed..self.filled, 0);
        self.consumed = 0;
        self.filled = len;
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
