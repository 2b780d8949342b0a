// SPDX-License-Identifier: MIT
//
// Configuration for the decoder and the input session.
//
// Plain structs with sensible `Default`s. The buffer capacity is the only
// knob the decoder itself has; the session adds which mouse reports the
// terminal should send.

use crate::error::{InputError, Result};
use crate::terminal::MouseReporting;

/// Smallest accepted input buffer, in bytes.
///
/// Must exceed the longest token the decoder recognizes. The longest
/// fixed-form key is 10 bytes; SGR mouse reports with four-digit
/// coordinates stay under 20.
pub const MIN_CAPACITY: usize = 64;

/// Default input buffer size, in bytes.
///
/// Sized for bursts of all-motion mouse reports: a fast drag can deliver
/// a few dozen reports in a single read.
pub const DEFAULT_CAPACITY: usize = 512;

/// Decoder configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Size of the input buffer window in bytes. At least [`MIN_CAPACITY`].
    pub capacity: usize,
}

impl DecoderConfig {
    /// Builder-style capacity override.
    #[must_use]
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::CapacityTooSmall`] if `capacity` is below
    /// [`MIN_CAPACITY`].
    pub const fn validate(&self) -> Result<()> {
        if self.capacity < MIN_CAPACITY {
            return Err(InputError::CapacityTooSmall {
                capacity: self.capacity,
                minimum: MIN_CAPACITY,
            });
        }
        Ok(())
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Configuration for an [`InputSession`](crate::session::InputSession).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Decoder settings.
    pub decoder: DecoderConfig,
    /// Mouse reports requested from the terminal on entry.
    pub mouse: MouseReporting,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            decoder: DecoderConfig::default(),
            mouse: MouseReporting::all(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_capacity_is_recommended_size() {
        assert_eq!(DecoderConfig::default().capacity, 512);
    }

    #[test]
    fn default_validates() {
        DecoderConfig::default().validate().unwrap();
    }

    #[test]
    fn minimum_capacity_validates() {
        DecoderConfig::default()
            .with_capacity(MIN_CAPACITY)
            .validate()
            .unwrap();
    }

    #[test]
    fn below_minimum_is_rejected() {
        let err = DecoderConfig::default()
            .with_capacity(MIN_CAPACITY - 1)
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            InputError::CapacityTooSmall {
                capacity: 63,
                minimum: 64
            }
        ));
    }

    #[test]
    fn session_default_requests_all_mouse_reports() {
        let config = SessionConfig::default();
        assert!(config.mouse.contains(MouseReporting::CLICKS));
        assert!(config.mouse.contains(MouseReporting::SGR));
        assert!(config.mouse.contains(MouseReporting::ALL_MOTION));
    }
}
