//! Terminal runtime: raw mode, alternate screen, palette discovery,
//! OSC-response filtering, resize/suspend signals, idempotent teardown.
//!
//! The engine refuses to start when stdin/stdout is not a TTY. All frame
//! bytes go through [`Terminal::write_bytes`]; input bytes come from a
//! reader thread and pass through the [`OscFilter`] before they ever
//! reach the key decoder.

use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::time::Duration;

use crossterm::tty::IsTty;

use crate::color::{self, Color};
use crate::error::{GlyphError, Result};
use crate::geometry::Size;

/// How long the engine waits for all 16 palette replies.
pub const PALETTE_TIMEOUT: Duration = Duration::from_millis(200);

/// How long a standalone ESC may wait for a continuation byte.
pub const ESC_TIMEOUT: Duration = Duration::from_millis(50);

// ---------------------------------------------------------------------
// OSC response filtering
// ---------------------------------------------------------------------

/// Filter state: `normal → esc → osc → osc_esc → normal`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FilterState {
    Normal,
    Esc,
    Osc,
    OscEsc,
}

/// Strips OSC replies out of the input stream so the key decoder never
/// sees them. Terminators are BEL and ESC `\` (ST).
#[derive(Debug)]
pub struct OscFilter {
    state: FilterState,
    reply: Vec<u8>,
}

/// Output of one filter pass.
#[derive(Debug, Default)]
pub struct Filtered {
    /// Bytes to hand to the key decoder.
    pub bytes: Vec<u8>,
    /// Complete OSC reply payloads (without the `ESC ]` prefix or the
    /// terminator).
    pub replies: Vec<String>,
}

impl OscFilter {
    /// Create a filter in the normal state.
    pub fn new() -> Self {
        Self {
            state: FilterState::Normal,
            reply: Vec::new(),
        }
    }

    /// Run a chunk of input through the filter.
    pub fn feed(&mut self, input: &[u8]) -> Filtered {
        let mut out = Filtered::default();
        for &b in input {
            match self.state {
                FilterState::Normal => {
                    if b == 0x1b {
                        self.state = FilterState::Esc;
                    } else {
                        out.bytes.push(b);
                    }
                }
                FilterState::Esc => {
                    if b == b']' {
                        self.reply.clear();
                        self.state = FilterState::Osc;
                    } else if b == 0x1b {
                        // ESC ESC: the first was a real keypress.
                        out.bytes.push(0x1b);
                    } else {
                        out.bytes.push(0x1b);
                        out.bytes.push(b);
                        self.state = FilterState::Normal;
                    }
                }
                FilterState::Osc => {
                    if b == 0x07 {
                        out.replies.push(self.take_reply());
                        self.state = FilterState::Normal;
                    } else if b == 0x1b {
                        self.state = FilterState::OscEsc;
                    } else {
                        self.reply.push(b);
                    }
                }
                FilterState::OscEsc => {
                    if b == b'\\' {
                        out.replies.push(self.take_reply());
                        self.state = FilterState::Normal;
                    } else {
                        // Not a terminator: both bytes belong to the reply.
                        self.reply.push(0x1b);
                        self.reply.push(b);
                        self.state = FilterState::Osc;
                    }
                }
            }
        }
        out
    }

    fn take_reply(&mut self) -> String {
        String::from_utf8_lossy(&std::mem::take(&mut self.reply)).into_owned()
    }
}

impl Default for OscFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply an `OSC 4` palette reply (`4;index;rgb:..../..../....`).
///
/// Returns true when the palette entry changed (the caller should force
/// a full redraw).
pub fn apply_palette_reply(reply: &str) -> bool {
    let mut parts = reply.splitn(3, ';');
    if parts.next() != Some("4") {
        return false;
    }
    let Some(index) = parts.next().and_then(|i| i.parse::<u8>().ok()) else {
        return false;
    };
    let Some(rgb) = parts.next().and_then(color::parse_osc4_color) else {
        return false;
    };
    color::set_palette_entry(index, rgb)
}

// ---------------------------------------------------------------------
// Multiplexer passthrough and image protocol surface
// ---------------------------------------------------------------------

/// Wrap an escape sequence in a tmux DCS passthrough (escapes doubled).
pub fn wrap_tmux_passthrough(sequence: &str) -> String {
    let doubled = sequence.replace('\x1b', "\x1b\x1b");
    format!("\x1bPtmux;{doubled}\x1b\\")
}

/// True when the session runs inside tmux (Kitty image sequences must be
/// wrapped with [`wrap_tmux_passthrough`]).
pub fn in_tmux() -> bool {
    std::env::var_os("TMUX").is_some()
}

// ---------------------------------------------------------------------
// Unix signal flags
// ---------------------------------------------------------------------

#[cfg(unix)]
mod signals {
    use super::*;

    pub static RESIZED: AtomicBool = AtomicBool::new(false);
    pub static INTERRUPTED: AtomicBool = AtomicBool::new(false);
    pub static SUSPENDED: AtomicBool = AtomicBool::new(false);
    pub static CONTINUED: AtomicBool = AtomicBool::new(false);

    extern "C" fn on_winch(_: libc::c_int) {
        RESIZED.store(true, Ordering::SeqCst);
    }

    extern "C" fn on_int(_: libc::c_int) {
        INTERRUPTED.store(true, Ordering::SeqCst);
    }

    extern "C" fn on_tstp(_: libc::c_int) {
        SUSPENDED.store(true, Ordering::SeqCst);
    }

    extern "C" fn on_cont(_: libc::c_int) {
        CONTINUED.store(true, Ordering::SeqCst);
    }

    /// Install flag-setting handlers. Safe to call repeatedly.
    pub fn install() {
        unsafe {
            libc::signal(libc::SIGWINCH, on_winch as libc::sighandler_t);
            libc::signal(libc::SIGINT, on_int as libc::sighandler_t);
            libc::signal(libc::SIGTERM, on_int as libc::sighandler_t);
            libc::signal(libc::SIGTSTP, on_tstp as libc::sighandler_t);
            libc::signal(libc::SIGCONT, on_cont as libc::sighandler_t);
        }
    }

    /// Re-raise a signal with its default disposition (after teardown).
    pub fn reraise_default(sig: libc::c_int) {
        unsafe {
            libc::signal(sig, libc::SIG_DFL);
            libc::raise(sig);
        }
    }
}

/// Pending signal events observed since the last poll.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SignalEvents {
    /// The window changed size (`SIGWINCH`).
    pub resized: bool,
    /// `SIGINT`/`SIGTERM` arrived.
    pub interrupted: bool,
    /// `SIGTSTP` arrived.
    pub suspended: bool,
    /// `SIGCONT` arrived after a suspension.
    pub continued: bool,
}

// ---------------------------------------------------------------------
// Terminal
// ---------------------------------------------------------------------

/// Owns the terminal state for the lifetime of the render loop.
pub struct Terminal {
    stdout: std::io::Stdout,
    active: AtomicBool,
}

impl Terminal {
    /// Create a terminal handle. Fails when stdin/stdout is not a TTY.
    pub fn new() -> Result<Self> {
        if !std::io::stdin().is_tty() || !std::io::stdout().is_tty() {
            return Err(GlyphError::NotATty);
        }
        Ok(Self {
            stdout: std::io::stdout(),
            active: AtomicBool::new(false),
        })
    }

    /// Enter raw mode, the alternate screen, hide the cursor, clear, and
    /// install signal handlers.
    pub fn setup(&mut self) -> Result<()> {
        if self.active.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        crossterm::terminal::enable_raw_mode()?;
        self.write_bytes("\x1b[?1049h\x1b[?25l\x1b[2J\x1b[H")?;
        self.flush()?;
        #[cfg(unix)]
        signals::install();
        Ok(())
    }

    /// Undo everything [`Self::setup`] did. Idempotent: only the first
    /// call after a setup performs work.
    pub fn teardown(&mut self) -> Result<()> {
        if !self.active.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        // Reset colours and cursor before leaving the alt screen.
        let _ = self.write_bytes("\x1b[0m\x1b]112\x07\x1b[?25h\x1b[?1049l");
        let _ = self.flush();
        crossterm::terminal::disable_raw_mode()?;
        Ok(())
    }

    /// Whether setup ran and teardown has not.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Current terminal size in cells.
    pub fn size(&self) -> Result<Size> {
        let (w, h) = crossterm::terminal::size()?;
        Ok(Size::new(w, h))
    }

    /// Queue frame bytes.
    pub fn write_bytes(&mut self, bytes: &str) -> Result<()> {
        self.stdout.write_all(bytes.as_bytes())?;
        Ok(())
    }

    /// Flush queued bytes to the terminal.
    pub fn flush(&mut self) -> Result<()> {
        self.stdout.flush()?;
        Ok(())
    }

    /// Ask for the terminal's 16 ANSI colours (`OSC 4;i;?`). Replies are
    /// harvested from the input stream by the [`OscFilter`]; the caller
    /// waits at most [`PALETTE_TIMEOUT`] before proceeding with the
    /// fallback palette.
    pub fn query_palette(&mut self) -> Result<()> {
        let mut query = String::new();
        for i in 0..16 {
            query.push_str(&format!("\x1b]4;{i};?\x07"));
        }
        self.write_bytes(&query)?;
        self.flush()
    }

    /// Place, colour, and show the native cursor.
    pub fn show_cursor_at(&mut self, x: u16, y: u16, color: Option<Color>) -> Result<()> {
        let mut bytes = format!("\x1b[{};{}H", y + 1, x + 1);
        if let Some(c) = color {
            let (r, g, b) = c.contrast_fg().to_rgb();
            bytes.push_str(&format!("\x1b]12;rgb:{r:02x}/{g:02x}/{b:02x}\x07"));
        }
        bytes.push_str("\x1b[?25h");
        self.write_bytes(&bytes)?;
        self.flush()
    }

    /// Hide the native cursor and reset its colour.
    pub fn hide_cursor(&mut self) -> Result<()> {
        self.write_bytes("\x1b]112\x07\x1b[?25l")?;
        self.flush()
    }

    /// Poll and clear pending signal flags.
    pub fn poll_signals(&self) -> SignalEvents {
        #[cfg(unix)]
        {
            SignalEvents {
                resized: signals::RESIZED.swap(false, Ordering::SeqCst),
                interrupted: signals::INTERRUPTED.swap(false, Ordering::SeqCst),
                suspended: signals::SUSPENDED.swap(false, Ordering::SeqCst),
                continued: signals::CONTINUED.swap(false, Ordering::SeqCst),
            }
        }
        #[cfg(not(unix))]
        {
            SignalEvents::default()
        }
    }

    /// Tear down, stop the process (`SIGTSTP` default), and re-enter the
    /// terminal when the process continues.
    ///
    /// Called from the render loop when the user hits Ctrl+Z or an
    /// external `SIGTSTP` arrives.
    #[cfg(unix)]
    pub fn suspend(&mut self) -> Result<()> {
        self.teardown()?;
        signals::reraise_default(libc::SIGTSTP);
        // Execution resumes here after SIGCONT.
        signals::install();
        self.setup()?;
        Ok(())
    }

    /// Tear down and re-raise a fatal signal with default disposition.
    #[cfg(unix)]
    pub fn die_on_signal(&mut self, sig: i32) -> Result<()> {
        self.teardown()?;
        signals::reraise_default(sig);
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = self.teardown();
    }
}

/// Spawn the stdin reader thread. Raw chunks arrive on the channel; the
/// render loop drains it with a timeout so the standalone-ESC rule can
/// fire.
pub fn spawn_input_reader() -> mpsc::Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut stdin = std::io::stdin();
        let mut buf = [0u8; 1024];
        loop {
            match stdin.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
    });
    rx
}
