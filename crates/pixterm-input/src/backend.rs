// SPDX-License-Identifier: MIT
//
// Event backends.
//
// The rest of the toolkit doesn't care whether events come from a byte
// stream we decode ourselves or from a platform that already delivers
// structured console events. Both plug in behind `EventSource`.
//
// - `Decoder<S>` is the byte-stream backend (unix terminals).
// - `EventQueue` accepts events that arrive already structured: a native
//   console API shim, a recorded session, or a test harness.

use std::collections::VecDeque;

use crate::decoder::Decoder;
use crate::error::Result;
use crate::event::InputEvent;
use crate::source::ByteSource;

/// A producer of input events.
pub trait EventSource {
    /// Return the next event if one is ready. Never blocks.
    ///
    /// The event may borrow the source; drop it before polling again.
    ///
    /// # Errors
    ///
    /// Backend-specific I/O failures.
    fn poll_event(&mut self) -> Result<Option<InputEvent<'_>>>;
}

impl<S: ByteSource> EventSource for Decoder<S> {
    fn poll_event(&mut self) -> Result<Option<InputEvent<'_>>> {
        self.decode()
    }
}

impl<E: EventSource + ?Sized> EventSource for Box<E> {
    fn poll_event(&mut self) -> Result<Option<InputEvent<'_>>> {
        (**self).poll_event()
    }
}

/// A backend fed with ready-made events.
///
/// Bounded: pushing onto a full queue drops the oldest event, so a
/// producer that outruns the consumer can never build an unbounded
/// backlog.
#[derive(Debug)]
pub struct EventQueue {
    queue: VecDeque<InputEvent<'static>>,
    /// The event handed out by the last `poll_event`.
    current: Option<InputEvent<'static>>,
    limit: usize,
}

impl EventQueue {
    /// Default number of events held before the oldest is dropped.
    pub const DEFAULT_LIMIT: usize = 256;

    /// An empty queue with [`DEFAULT_LIMIT`](Self::DEFAULT_LIMIT).
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(Self::DEFAULT_LIMIT)
    }

    /// An empty queue holding at most `limit` events (at least one).
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            queue: VecDeque::with_capacity(limit.min(Self::DEFAULT_LIMIT)),
            current: None,
            limit,
        }
    }

    /// Queue an event. Returns `true` if an older event had to be dropped.
    pub fn push(&mut self, event: InputEvent<'_>) -> bool {
        let overflow = self.queue.len() == self.limit;
        if overflow {
            self.queue.pop_front();
        }
        self.queue.push_back(event.into_owned());
        overflow
    }

    /// Events waiting to be polled.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether no events are waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for EventQueue {
    fn poll_event(&mut self) -> Result<Option<InputEvent<'_>>> {
        self.current = self.queue.pop_front();
        Ok(self.current.as_ref().map(InputEvent::as_view))
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
