// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Byte sources: where raw terminal input comes from.
//
// The decoder never blocks, so its source must not either. A source
// answers two questions: "is anything readable right now?" and "copy
// what is readable into this slice". Both map directly onto POSIX
// `poll()` with a zero timeout followed by `read()`.
//
// `StdinSource` is the real thing (unix only). `ChunkSource` replays a
// scripted sequence of reads, one chunk per read. That's what lets the
// tests pin down exactly where a read boundary falls inside an escape
// sequence.

use std::collections::VecDeque;
use std::io;

use crate::error::Result;
#[cfg(not(unix))]
use crate::error::InputError;

// ─── Trait ──────────────────────────────────────────────────────────────────

/// A non-blocking supplier of raw input bytes.
pub trait ByteSource {
    /// Whether at least one byte can be read without blocking.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the readiness probe itself fails.
    fn poll_available(&mut self) -> io::Result<bool>;

    /// Copy available bytes into `buf`, returning how many were written.
    ///
    /// `Ok(0)` means nothing was available.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the read fails.
    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn poll_available(&mut self) -> io::Result<bool> {
        (**self).poll_available()
    }

    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_into(buf)
    }
}

// ─── Stdin ──────────────────────────────────────────────────────────────────

/// Standard input as a non-blocking byte source.
///
/// Readiness is probed with `poll()` and a zero timeout, so neither call
/// ever waits. Raw mode (see [`Terminal`](crate::terminal::Terminal)) must
/// be active for keys to arrive one at a time.
#[derive(Debug)]
pub struct StdinSource {
    #[cfg(unix)]
    fd: libc::c_int,
}

impl StdinSource {
    /// Open standard input.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::UnsupportedPlatform`] where no byte-stream
    /// terminal input exists (non-unix targets use a native console
    /// event API instead).
    #[cfg(unix)]
    pub fn new() -> Result<Self> {
        Ok(Self {
            fd: libc::STDIN_FILENO,
        })
    }

    #[cfg(not(unix))]
    pub fn new() -> Result<Self> {
        Err(InputError::UnsupportedPlatform)
    }
}

#[cfg(unix)]
impl ByteSource for StdinSource {
    fn poll_available(&mut self) -> io::Result<bool> {
        let mut pfd = libc::pollfd {
            fd: self.fd,
            events: libc::POLLIN,
            revents: 0,
        };

        // Zero timeout: report readiness, never wait.
        let ready = unsafe { libc::poll(&raw mut pfd, 1, 0) };

        if ready < 0 {
            let err = io::Error::last_os_error();
            // A signal (e.g. SIGWINCH) landing mid-poll is not a failure.
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(false);
            }
            return Err(err);
        }

        Ok(ready > 0 && pfd.revents & libc::POLLIN != 0)
    }

    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let n = unsafe { libc::read(self.fd, buf.as_mut_ptr().cast(), buf.len()) };

        if n < 0 {
            return Err(io::Error::last_os_error());
        }

        #[allow(clippy::cast_sign_loss)] // n >= 0 checked above.
        Ok(n as usize)
    }
}

#[cfg(not(unix))]
impl ByteSource for StdinSource {
    fn poll_available(&mut self) -> io::Result<bool> {
        Ok(false)
    }

    fn read_into(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Ok(0)
    }
}

// ─── Scripted chunks ────────────────────────────────────────────────────────

/// A byte source that replays pre-recorded reads.
///
/// Each pushed chunk is delivered by exactly one read (truncated to the
/// caller's buffer, with the remainder kept for the next read). An empty
/// queue reports "nothing available" forever.
///
/// # Example
///
/// ```
/// use pixterm_input::decoder::Decoder;
/// use pixterm_input::event::KeyKind;
/// use pixterm_input::source::ChunkSource;
///
/// let mut decoder = Decoder::new(ChunkSource::from_chunks([&b"\x1b["[..], b"A"]));
/// assert!(decoder.decode()?.is_none());
/// let event = decoder.decode()?.unwrap();
/// assert_eq!(event.key_kind(), Some(KeyKind::Up));
/// # Ok::<(), pixterm_input::error::InputError>(())
/// ```
#[derive(Debug, Default, Clone)]
pub struct ChunkSource {
    chunks: VecDeque<Vec<u8>>,
    reads: usize,
}

impl ChunkSource {
    /// An empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A source preloaded with one chunk per read.
    #[must_use]
    pub fn from_chunks<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let mut source = Self::new();
        for chunk in chunks {
            source.push(chunk);
        }
        source
    }

    /// Queue another read. Empty chunks are ignored.
    pub fn push(&mut self, chunk: impl AsRef<[u8]>) {
        let chunk = chunk.as_ref();
        if !chunk.is_empty() {
            self.chunks.push_back(chunk.to_vec());
        }
    }

    /// Number of chunks not yet delivered.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.chunks.len()
    }

    /// Number of successful non-empty reads served so far.
    #[must_use]
    pub const fn reads(&self) -> usize {
        self.reads
    }
}

impl ByteSource for ChunkSource {
    fn poll_available(&mut self) -> io::Result<bool> {
        Ok(!self.chunks.is_empty())
    }

    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(chunk) = self.chunks.front_mut() else {
            return Ok(0);
        };

        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);

        if n == chunk.len() {
            self.chunks.pop_front();
        } else {
            chunk.drain(..n);
        }
        if n > 0 {
            self.reads += 1;
        }

        Ok(n)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
