// SPDX-License-Identifier: MIT
//
// Input session: raw mode and a decoder, paired.
//
// Opening a session validates the config, builds the decoder and only
// then switches the terminal into raw mode with mouse reporting. Closing
// (or dropping) it tears things down in the opposite order: the decoder
// and its buffer go first, then the terminal is restored.

use tracing::debug;

use crate::backend::EventSource;
use crate::config::SessionConfig;
use crate::decoder::Decoder;
use crate::error::Result;
use crate::event::InputEvent;
use crate::source::{ByteSource, StdinSource};
use crate::terminal::Terminal;

/// One interactive input session.
///
/// Field order matters: Rust drops fields top to bottom, so the decoder
/// is always released before the terminal leaves raw mode.
pub struct InputSession<S: ByteSource = StdinSource> {
    decoder: Decoder<S>,
    terminal: Terminal,
}

impl InputSession<StdinSource> {
    /// Open a session on the process's stdin.
    ///
    /// # Errors
    ///
    /// [`InputError::UnsupportedPlatform`](crate::error::InputError) off
    /// unix, `CapacityTooSmall` for a bad config, or a terminal error if
    /// raw mode can't be entered.
    pub fn open(config: SessionConfig) -> Result<Self> {
        Self::open_with(StdinSource::new()?, config)
    }
}

impl<S: ByteSource> InputSession<S> {
    /// Open a session reading from `source`.
    ///
    /// # Errors
    ///
    /// See [`open`](InputSession::open).
    pub fn open_with(source: S, config: SessionConfig) -> Result<Self> {
        let decoder = Decoder::with_config(source, config.decoder)?;
        let mut terminal = Terminal::new(config.mouse);
        terminal.enter()?;
        debug!(
            capacity = config.decoder.capacity,
            mouse = ?config.mouse,
            "input session opened"
        );
        Ok(Self { decoder, terminal })
    }

    /// Decode the next event, if one is ready. Never blocks.
    ///
    /// # Errors
    ///
    /// Byte source failures, see [`Decoder::decode`].
    pub fn decode(&mut self) -> Result<Option<InputEvent<'_>>> {
        self.decoder.decode()
    }

    /// Whether undecoded bytes are waiting in the buffer.
    #[must_use]
    pub const fn has_pending(&self) -> bool {
        self.decoder.has_pending()
    }

    /// Throw away a pending partial token. Returns the bytes dropped.
    pub fn abandon_pending(&mut self) -> usize {
        self.decoder.abandon_pending()
    }

    /// Decode a stalled partial token as it stands, see
    /// [`Decoder::flush_pending`].
    pub fn flush_pending(&mut self) -> usize {
        self.decoder.flush_pending()
    }

    #[must_use]
    pub const fn decoder(&self) -> &Decoder<S> {
        &self.decoder
    }

    pub const fn decoder_mut(&mut self) -> &mut Decoder<S> {
        &mut self.decoder
    }

    #[must_use]
    pub const fn terminal(&self) -> &Terminal {
        &self.terminal
    }

    /// End the session, reporting any failure to restore the terminal.
    ///
    /// Dropping the session restores the terminal too, but silently.
    ///
    /// # Errors
    ///
    /// The terminal write or termios restore failed.
    pub fn close(self) -> Result<()> {
        let Self {
            decoder,
            mut terminal,
        } = self;
        drop(decoder);
        terminal.leave()?;
        debug!("input session closed");
        Ok(())
    }
}

impl<S: ByteSource> EventSource for InputSession<S> {
    fn poll_event(&mut self) -> Result<Option<InputEvent<'_>>> {
        self.decode()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
