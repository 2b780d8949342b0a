// SPDX-License-Identifier: MIT
//
// pixterm-input: terminal input decoding for pixterm.
//
// Turns the raw byte stream of a terminal in raw mode into structured key
// and mouse events. Reads never block: each `decode()` call does at most
// one non-blocking read and yields at most one event, so the caller keeps
// full control of its loop.
//
// Layering, bottom up:
//
//   source   -> where bytes come from (stdin, or scripted chunks in tests)
//   buffer   -> bounded window of pending bytes
//   mouse    -> SGR mouse reports (ESC [ < b ; x ; y M/m)
//   key      -> ordered table of key sequence rules
//   decoder  -> ties the three together, one event per call
//   backend  -> `EventSource`, so structured producers plug in too
//   terminal -> raw mode and mouse reporting, restored on drop or panic
//   session  -> terminal and decoder paired for one interactive session

pub mod backend;
pub mod buffer;
pub mod config;
pub mod decoder;
pub mod error;
pub mod event;
pub mod key;
pub mod mouse;
pub mod session;
pub mod source;
pub mod terminal;

pub use backend::{EventQueue, EventSource};
pub use config::{DecoderConfig, SessionConfig};
pub use decoder::Decoder;
pub use error::{InputError, Result};
pub use event::{InputEvent, KeyEvent, KeyKind, MouseEvent, MouseKind};
pub use session::InputSession;
pub use terminal::MouseReporting;
