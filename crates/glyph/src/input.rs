//! Input decoder: terminal byte stream to key events.
//!
//! Pure and streaming. [`InputDecoder::feed`] consumes complete sequences
//! and keeps an incomplete ESC-prefixed tail pending; the caller flushes
//! the tail when the standalone-ESC disambiguation window (50 ms) expires
//! without further bytes. Every decoded event carries the original bytes.

use bitflags::bitflags;

bitflags! {
    /// Keyboard modifier flags.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// Shift.
        const SHIFT = 1;
        /// Alt / Option.
        const ALT = 2;
        /// Control.
        const CTRL = 4;
        /// Meta / Super / Command.
        const META = 8;
    }
}

impl Modifiers {
    /// Decode an xterm/Kitty modifier parameter (`mod - 1` bitfield).
    pub fn from_param(param: u32) -> Self {
        Self::from_bits_truncate(param.saturating_sub(1) as u8)
    }
}

/// A decoded key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A printable character (letters are lower-case; shift is a flag).
    Char(char),
    /// Enter / Return.
    Enter,
    /// Tab.
    Tab,
    /// Backspace.
    Backspace,
    /// Delete.
    Delete,
    /// Escape.
    Escape,
    /// Insert.
    Insert,
    /// Arrow up.
    Up,
    /// Arrow down.
    Down,
    /// Arrow left.
    Left,
    /// Arrow right.
    Right,
    /// Home.
    Home,
    /// End.
    End,
    /// Page up.
    PageUp,
    /// Page down.
    PageDown,
    /// Function key (F1-F24).
    F(u8),
    /// Keypad digit or operator.
    Keypad(char),
    /// Keypad enter.
    KpEnter,
    /// Media play.
    MediaPlay,
    /// Media pause.
    MediaPause,
    /// Media play/pause toggle.
    MediaPlayPause,
    /// Media stop.
    MediaStop,
    /// Next track.
    MediaNext,
    /// Previous track.
    MediaPrev,
    /// Volume up.
    VolumeUp,
    /// Volume down.
    VolumeDown,
    /// Mute.
    Mute,
    /// Unrecognised sequence; the raw bytes ride along on the event.
    Unknown,
}

impl KeyCode {
    /// Canonical lower-case name.
    pub fn name(&self) -> String {
        match self {
            Self::Char(' ') => "space".into(),
            Self::Char(c) => c.to_string(),
            Self::Enter => "return".into(),
            Self::Tab => "tab".into(),
            Self::Backspace => "backspace".into(),
            Self::Delete => "delete".into(),
            Self::Escape => "escape".into(),
            Self::Insert => "insert".into(),
            Self::Up => "up".into(),
            Self::Down => "down".into(),
            Self::Left => "left".into(),
            Self::Right => "right".into(),
            Self::Home => "home".into(),
            Self::End => "end".into(),
            Self::PageUp => "pageup".into(),
            Self::PageDown => "pagedown".into(),
            Self::F(n) => format!("f{n}"),
            Self::Keypad(c) => format!("kp{c}"),
            Self::KpEnter => "kpenter".into(),
            Self::MediaPlay => "mediaplay".into(),
            Self::MediaPause => "mediapause".into(),
            Self::MediaPlayPause => "mediaplaypause".into(),
            Self::MediaStop => "mediastop".into(),
            Self::MediaNext => "medianext".into(),
            Self::MediaPrev => "mediaprev".into(),
            Self::VolumeUp => "volumeup".into(),
            Self::VolumeDown => "volumedown".into(),
            Self::Mute => "mute".into(),
            Self::Unknown => "unknown".into(),
        }
    }
}

/// A decoded keyboard event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key.
    pub code: KeyCode,
    /// Active modifiers.
    pub modifiers: Modifiers,
    /// The original bytes this event was decoded from.
    pub sequence: String,
}

impl KeyEvent {
    /// Create a key event.
    pub fn new(code: KeyCode, modifiers: Modifiers, sequence: impl Into<String>) -> Self {
        Self {
            code,
            modifiers,
            sequence: sequence.into(),
        }
    }

    /// Plain event with no modifiers and an empty sequence (for tests and
    /// synthetic dispatch).
    pub fn plain(code: KeyCode) -> Self {
        Self::new(code, Modifiers::empty(), "")
    }

    /// Check if Ctrl is held.
    pub fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    /// Check if Alt is held.
    pub fn alt(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }

    /// Check if Shift is held.
    pub fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    /// Check if Meta is held.
    pub fn meta(&self) -> bool {
        self.modifiers.contains(Modifiers::META)
    }
}

/// Streaming byte-to-event decoder.
#[derive(Clone, Debug, Default)]
pub struct InputDecoder {
    pending: Vec<u8>,
}

impl InputDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes, returning every event that completed.
    ///
    /// An ESC-prefixed tail that could still grow into a longer sequence
    /// is retained; see [`Self::flush_pending`].
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<KeyEvent> {
        self.pending.extend_from_slice(bytes);
        self.drain(false)
    }

    /// True when bytes are waiting on the disambiguation timeout.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Resolve pending bytes after the 50 ms window: a lone ESC becomes
    /// an escape keypress, any other stub decodes best-effort.
    pub fn flush_pending(&mut self) -> Vec<KeyEvent> {
        self.drain(true)
    }

    fn drain(&mut self, flush: bool) -> Vec<KeyEvent> {
        let mut events = Vec::new();
        let mut buf = std::mem::take(&mut self.pending);
        let mut pos = 0;

        while pos < buf.len() {
            match decode_one(&buf[pos..], flush) {
                Step::Event(event, used) => {
                    events.push(event);
                    pos += used;
                }
                Step::Incomplete => {
                    break;
                }
            }
        }

        self.pending = buf.split_off(pos);
        events
    }
}

enum Step {
    /// An event was decoded from the first `usize` bytes.
    Event(KeyEvent, usize),
    /// More bytes are required (only possible when not flushing).
    Incomplete,
}

fn seq(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn event(code: KeyCode, modifiers: Modifiers, bytes: &[u8]) -> Step {
    Step::Event(KeyEvent::new(code, modifiers, seq(bytes)), bytes.len())
}

/// Decode one event from the front of `bytes`.
fn decode_one(bytes: &[u8], flush: bool) -> Step {
    let first = bytes[0];

    if first == 0x1b {
        return decode_escape(bytes, flush);
    }

    // Control bytes.
    match first {
        0x00 => return event(KeyCode::Char(' '), Modifiers::CTRL, &bytes[..1]),
        b'\r' => return event(KeyCode::Enter, Modifiers::empty(), &bytes[..1]),
        b'\t' => return event(KeyCode::Tab, Modifiers::empty(), &bytes[..1]),
        0x08 => return event(KeyCode::Backspace, Modifiers::empty(), &bytes[..1]),
        0x7f => return event(KeyCode::Backspace, Modifiers::empty(), &bytes[..1]),
        0x01..=0x1a => {
            let c = (b'a' + first - 1) as char;
            return event(KeyCode::Char(c), Modifiers::CTRL, &bytes[..1]);
        }
        0x1c => return event(KeyCode::Char('\\'), Modifiers::CTRL, &bytes[..1]),
        0x1d => return event(KeyCode::Char(']'), Modifiers::CTRL, &bytes[..1]),
        0x1e => return event(KeyCode::Char('^'), Modifiers::CTRL, &bytes[..1]),
        0x1f => return event(KeyCode::Char('_'), Modifiers::CTRL, &bytes[..1]),
        _ => {}
    }

    // Printable ASCII and UTF-8.
    decode_char(bytes, flush)
}

fn decode_char(bytes: &[u8], flush: bool) -> Step {
    let len = utf8_len(bytes[0]);
    if len == 0 {
        // Not a valid UTF-8 leading byte.
        return event(KeyCode::Unknown, Modifiers::empty(), &bytes[..1]);
    }
    if bytes.len() < len {
        if flush {
            return event(KeyCode::Unknown, Modifiers::empty(), bytes);
        }
        return Step::Incomplete;
    }
    match std::str::from_utf8(&bytes[..len]) {
        Ok(s) => {
            let Some(c) = s.chars().next() else {
                return event(KeyCode::Unknown, Modifiers::empty(), &bytes[..len]);
            };
            let (code, modifiers) = char_key(c);
            event(code, modifiers, &bytes[..len])
        }
        Err(_) => event(KeyCode::Unknown, Modifiers::empty(), &bytes[..len]),
    }
}

/// Letters report lower-case names with a shift flag.
fn char_key(c: char) -> (KeyCode, Modifiers) {
    if c.is_ascii_uppercase() {
        (
            KeyCode::Char(c.to_ascii_lowercase()),
            Modifiers::SHIFT,
        )
    } else {
        (KeyCode::Char(c), Modifiers::empty())
    }
}

fn utf8_len(first: u8) -> usize {
    match first {
        0x00..=0x7f => 1,
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf7 => 4,
        _ => 0,
    }
}

fn decode_escape(bytes: &[u8], flush: bool) -> Step {
    if bytes.len() == 1 {
        if flush {
            // The 50 ms window elapsed: a standalone escape keypress.
            return event(KeyCode::Escape, Modifiers::empty(), &bytes[..1]);
        }
        return Step::Incomplete;
    }

    match bytes[1] {
        b'[' => decode_csi(bytes, flush),
        b'O' => decode_ss3(bytes, flush),
        0x1b => {
            // ESC ESC: the first is a keypress on its own.
            event(KeyCode::Escape, Modifiers::empty(), &bytes[..1])
        }
        b if (0x20..=0x7e).contains(&b) => {
            // Alt-modified printable.
            let (code, mods) = char_key(b as char);
            event(code, mods | Modifiers::ALT, &bytes[..2])
        }
        _ => {
            // ESC followed by a control byte: treat the ESC as its own
            // keypress and let the next byte decode normally.
            event(KeyCode::Escape, Modifiers::empty(), &bytes[..1])
        }
    }
}

/// `ESC [ params... final`
fn decode_csi(bytes: &[u8], flush: bool) -> Step {
    // bytes[0] = ESC, bytes[1] = '['.
    let mut i = 2;
    while i < bytes.len() {
        let b = bytes[i];
        if (0x40..=0x7e).contains(&b) {
            let consumed = &bytes[..=i];
            let ev = csi_event(&bytes[2..i], b, consumed);
            return Step::Event(ev, consumed.len());
        }
        if !(0x20..=0x3f).contains(&b) {
            // Not a legal parameter/intermediate byte: malformed.
            return event(KeyCode::Unknown, Modifiers::empty(), &bytes[..=i]);
        }
        i += 1;
    }
    if flush {
        return event(KeyCode::Unknown, Modifiers::empty(), bytes);
    }
    Step::Incomplete
}

/// Parse `;`-separated numeric parameters. A Kitty `code:alternates`
/// field keeps only its first component.
fn csi_params(params: &[u8]) -> Vec<u32> {
    let text = String::from_utf8_lossy(params);
    text.split(';')
        .map(|p| {
            let first = p.split(':').next().unwrap_or("");
            first.parse::<u32>().unwrap_or(0)
        })
        .collect()
}

fn csi_event(params: &[u8], final_byte: u8, raw: &[u8]) -> KeyEvent {
    let nums = csi_params(params);
    let modifiers = nums
        .get(1)
        .copied()
        .map(Modifiers::from_param)
        .unwrap_or_default();
    let sequence = seq(raw);

    let code = match final_byte {
        b'A' => KeyCode::Up,
        b'B' => KeyCode::Down,
        b'C' => KeyCode::Right,
        b'D' => KeyCode::Left,
        b'H' => KeyCode::Home,
        b'F' => KeyCode::End,
        b'Z' => {
            return KeyEvent::new(KeyCode::Tab, modifiers | Modifiers::SHIFT, sequence);
        }
        b'P' => KeyCode::F(1),
        b'Q' => KeyCode::F(2),
        b'R' => KeyCode::F(3),
        b'S' => KeyCode::F(4),
        b'u' => {
            // Kitty protocol: keycode;mods u
            let keycode = nums.first().copied().unwrap_or(0);
            return KeyEvent::new(kitty_key(keycode), modifiers, sequence);
        }
        b'~' => {
            let selector = nums.first().copied().unwrap_or(0);
            if selector == 27 {
                // xterm modifyOtherKeys: CSI 27;mods;code ~
                let mods = nums
                    .get(1)
                    .copied()
                    .map(Modifiers::from_param)
                    .unwrap_or_default();
                let code = nums.get(2).copied().unwrap_or(0);
                return KeyEvent::new(kitty_key(code), mods, sequence);
            }
            return KeyEvent::new(vt_key(selector), modifiers, sequence);
        }
        _ => KeyCode::Unknown,
    };
    KeyEvent::new(code, modifiers, sequence)
}

/// VT-style `CSI n ~` parameter table.
fn vt_key(n: u32) -> KeyCode {
    match n {
        1 | 7 => KeyCode::Home,
        2 => KeyCode::Insert,
        3 => KeyCode::Delete,
        4 | 8 => KeyCode::End,
        5 => KeyCode::PageUp,
        6 => KeyCode::PageDown,
        11..=15 => KeyCode::F((n - 10) as u8),
        17..=21 => KeyCode::F((n - 11) as u8),
        23 | 24 => KeyCode::F((n - 12) as u8),
        25 | 26 => KeyCode::F((n - 12) as u8),
        28 | 29 => KeyCode::F((n - 13) as u8),
        31..=34 => KeyCode::F((n - 14) as u8),
        _ => KeyCode::Unknown,
    }
}

/// Map a Kitty / modifyOtherKeys code point to a key.
fn kitty_key(code: u32) -> KeyCode {
    match code {
        9 => KeyCode::Tab,
        13 => KeyCode::Enter,
        27 => KeyCode::Escape,
        127 => KeyCode::Backspace,
        // Keypad digits (Kitty functional range).
        57399..=57408 => {
            let digit = (code - 57399) as u8;
            KeyCode::Keypad((b'0' + digit) as char)
        }
        57414 => KeyCode::KpEnter,
        57428 => KeyCode::MediaPlay,
        57429 => KeyCode::MediaPause,
        57430 => KeyCode::MediaPlayPause,
        57432 => KeyCode::MediaStop,
        57435 => KeyCode::MediaNext,
        57436 => KeyCode::MediaPrev,
        57438 => KeyCode::VolumeDown,
        57439 => KeyCode::VolumeUp,
        57440 => KeyCode::Mute,
        _ => match char::from_u32(code) {
            Some(c) if !c.is_control() => char_key(c).0,
            _ => KeyCode::Unknown,
        },
    }
}

/// `ESC O final` (SS3): function and keypad keys.
fn decode_ss3(bytes: &[u8], flush: bool) -> Step {
    if bytes.len() < 3 {
        if flush {
            return event(KeyCode::Unknown, Modifiers::empty(), bytes);
        }
        return Step::Incomplete;
    }
    let code = match bytes[2] {
        b'A' => KeyCode::Up,
        b'B' => KeyCode::Down,
        b'C' => KeyCode::Right,
        b'D' => KeyCode::Left,
        b'H' => KeyCode::Home,
        b'F' => KeyCode::End,
        b'P' => KeyCode::F(1),
        b'Q' => KeyCode::F(2),
        b'R' => KeyCode::F(3),
        b'S' => KeyCode::F(4),
        b'M' => KeyCode::KpEnter,
        b'j' => KeyCode::Keypad('*'),
        b'k' => KeyCode::Keypad('+'),
        b'l' => KeyCode::Keypad(','),
        b'm' => KeyCode::Keypad('-'),
        b'n' => KeyCode::Keypad('.'),
        b'o' => KeyCode::Keypad('/'),
        b'X' => KeyCode::Keypad('='),
        b @ b'p'..=b'y' => KeyCode::Keypad((b'0' + (b - b'p')) as char),
        _ => KeyCode::Unknown,
    };
    event(code, Modifiers::empty(), &bytes[..3])
}
