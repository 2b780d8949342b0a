// SPDX-License-Identifier: MIT
//
// Error types for the input layer.
//
// Only the byte source and the terminal controller can fail. Everything
// the decoder sees on the wire (malformed sequences, truncated tokens,
// escape forms we don't know) resolves to an `Unrecognized` key or a
// dropped byte instead, so a noisy terminal never stops the input loop.

use std::io;

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, InputError>;

/// Everything that can go wrong while reading terminal input.
#[derive(Debug, Error)]
pub enum InputError {
    /// The byte-stream backend was requested on a platform without one.
    #[error("byte-stream terminal input is not supported on this platform")]
    UnsupportedPlatform,

    /// Probing the byte source for readable data failed.
    #[error("failed to poll terminal input")]
    ProbeFailed(#[source] io::Error),

    /// Reading available bytes from the source failed.
    #[error("failed to read terminal input")]
    ReadFailed(#[source] io::Error),

    /// The configured buffer cannot hold the longest supported token.
    #[error("input buffer capacity {capacity} is below the minimum of {minimum} bytes")]
    CapacityTooSmall {
        /// Requested capacity.
        capacity: usize,
        /// Smallest accepted capacity.
        minimum: usize,
    },

    /// Entering or leaving raw / mouse-reporting mode failed.
    #[error("terminal mode change failed")]
    Terminal(#[from] io::Error),
}

impl InputError {
    /// Whether the error came from the byte source (probe or read).
    ///
    /// These are fatal to the current decode call only; the session
    /// stays usable and the caller may simply try again.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::ProbeFailed(_) | Self::ReadFailed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_and_read_failures_are_transient() {
        let probe = InputError::ProbeFailed(io::Error::other("poll"));
        let read = InputError::ReadFailed(io::Error::other("read"));
        assert!(probe.is_transient());
        assert!(read.is_transient());
    }

    #[test]
    fn configuration_errors_are_not_transient() {
        let err = InputError::CapacityTooSmall {
            capacity: 16,
            minimum: 64,
        };
        assert!(!err.is_transient());
        assert!(!InputError::UnsupportedPlatform.is_transient());
    }

    #[test]
    fn display_mentions_capacity_numbers() {
        let msg = InputError::CapacityTooSmall {
            capacity: 16,
            minimum: 64,
        }
        .to_string();
        assert!(msg.contains("16"));
        assert!(msg.contains("64"));
    }

    #[test]
    fn io_error_converts_to_terminal() {
        let err: InputError = io::Error::other("tcsetattr").into();
        assert!(matches!(err, InputError::Terminal(_)));
    }

    #[test]
    fn source_is_preserved() {
        use std::error::Error as _;
        let err = InputError::ReadFailed(io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
        let source = err.source().unwrap();
        assert!(source.to_string().contains("gone"));
    }

    #[test]
    fn io_detail_lives_only_in_the_source() {
        let errors = [
            InputError::ProbeFailed(io::Error::other("gone")),
            InputError::ReadFailed(io::Error::other("gone")),
            InputError::Terminal(io::Error::other("gone")),
        ];
        for err in errors {
            assert!(!err.to_string().contains("gone"), "{err}");
        }
    }
}
