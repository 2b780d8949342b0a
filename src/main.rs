// SPDX-License-Identifier: MIT
//
// pixterm: interactive input event viewer.
//
// Opens an input session on the controlling terminal and prints one line
// per decoded event until Ctrl-C:
//
//   key Up raw=\x1b[A
//   mouse ButtonDown x=9 y=4 button=0 raw=\x1b[<0;10;5M
//
// Raw mode turns off output post-processing, so every line ends in an
// explicit "\r\n". Logs never go to the terminal; pass --log-file to
// capture them (filter via PIXTERM_LOG, default "debug").

use std::error::Error;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use unicode_width::UnicodeWidthChar;

use pixterm_input::config::DEFAULT_CAPACITY;
use pixterm_input::{
    DecoderConfig, EventSource, InputEvent, InputSession, KeyKind, MouseReporting, SessionConfig,
};

/// Print every key and mouse event the terminal sends.
#[derive(Debug, Parser)]
#[command(name = "pixterm", version, about)]
struct Args {
    /// Input buffer size in bytes.
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    capacity: usize,

    /// Sleep between polls when no event is ready, in milliseconds.
    #[arg(long, default_value_t = 8)]
    interval_ms: u64,

    /// Give up waiting on a partial escape sequence after this long and
    /// decode what arrived.
    #[arg(long, default_value_t = 50)]
    pending_timeout_ms: u64,

    /// Don't ask for pointer motion reports (clicks and wheel only).
    #[arg(long)]
    no_motion: bool,

    /// Write logs to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn session_config(&self) -> SessionConfig {
        let mut mouse = MouseReporting::all();
        if self.no_motion {
            mouse.remove(MouseReporting::ALL_MOTION);
        }
        SessionConfig {
            decoder: DecoderConfig::default().with_capacity(self.capacity),
            mouse,
        }
    }
}

// ─── Logging ────────────────────────────────────────────────────────────────

/// Install the file logger. Without a path, logging stays off.
fn init_logging(path: Option<&Path>) -> io::Result<()> {
    let Some(path) = path else {
        return Ok(());
    };

    let file = File::create(path)?;
    let filter =
        EnvFilter::try_from_env("PIXTERM_LOG").unwrap_or_else(|_| EnvFilter::new("debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

// ─── Formatting ─────────────────────────────────────────────────────────────

/// One display line for an event.
fn describe(event: &InputEvent<'_>) -> String {
    let mut line = String::new();
    match event {
        InputEvent::Key(key) => {
            let _ = write!(line, "key {:?}", key.kind);
            if key.kind == KeyKind::Char {
                let text = String::from_utf8_lossy(&key.raw);
                if !text.chars().any(char::is_control) {
                    let _ = write!(line, " {text:?}");
                }
            }
        }
        InputEvent::Mouse(mouse) => {
            let _ = write!(
                line,
                "mouse {:?} x={} y={} button={}",
                mouse.kind, mouse.x, mouse.y, mouse.button
            );
        }
    }
    let _ = write!(line, " raw={}", event.raw().escape_ascii());
    line
}

/// The longest prefix of `line` that fits in `width` terminal columns.
fn clip(line: &str, width: usize) -> &str {
    let mut used = 0;
    for (i, ch) in line.char_indices() {
        used += ch.width().unwrap_or(0);
        if used > width {
            return &line[..i];
        }
    }
    line
}

/// `err` followed by each of its sources, `: `-separated.
fn report(err: &dyn Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let _ = write!(msg, ": {cause}");
        source = cause.source();
    }
    msg
}

// ─── Viewer ─────────────────────────────────────────────────────────────────

/// Poll once. A failed probe or read costs this call only; the session
/// carries on and the next poll tries again.
fn poll<E: EventSource + ?Sized>(
    source: &mut E,
) -> pixterm_input::Result<Option<InputEvent<'_>>> {
    match source.poll_event() {
        Err(err) if err.is_transient() => {
            warn!(error = %report(&err), "terminal input failed; retrying");
            Ok(None)
        }
        other => other,
    }
}

/// Print events until Ctrl-C.
fn view(session: &mut InputSession, args: &Args) -> Result<(), Box<dyn Error>> {
    let interval = Duration::from_millis(args.interval_ms);
    let timeout = Duration::from_millis(args.pending_timeout_ms);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write!(out, "pixterm: press keys or use the mouse, Ctrl-C quits\r\n")?;
    out.flush()?;

    // When the decoder started waiting on an unfinished sequence.
    let mut waiting_since: Option<Instant> = None;

    loop {
        let width = usize::from(session.terminal().size().cols);

        if let Some(event) = poll(session)? {
            let quit = event.key_kind() == Some(KeyKind::CtrlC);
            write!(out, "{}\r\n", clip(&describe(&event), width))?;
            out.flush()?;
            if quit {
                return Ok(());
            }
            waiting_since = None;
            continue;
        }

        if session.decoder().buffer().needs_more() {
            let since = *waiting_since.get_or_insert_with(Instant::now);
            if since.elapsed() >= timeout {
                let dropped = session.flush_pending();
                debug!(dropped, "partial sequence timed out");
                waiting_since = None;
                continue;
            }
        } else {
            waiting_since = None;
            if session.has_pending() {
                // A byte was dropped or a flush is under way; the rest is
                // decodable right away.
                continue;
            }
        }

        thread::sleep(interval);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let mut session = InputSession::open(args.session_config())?;
    info!(?args, "viewer started");

    let outcome = view(&mut session, args);
    let closed = session.close();
    outcome?;
    closed?;
    Ok(())
}

fn main() {
    let args = Args::parse();

    if let Err(e) = init_logging(args.log_file.as_deref()) {
        eprintln!("pixterm: cannot open log file: {}", report(&e));
        process::exit(1);
    }

    if let Err(e) = run(&args) {
        eprintln!("pixterm: {}", report(e.as_ref()));
        process::exit(1);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
