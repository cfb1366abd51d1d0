//! Colour model: named / indexed / RGB colours and the process-wide palette.
//!
//! Named colours resolve through a palette that the terminal runtime can
//! overwrite with the real values reported by `OSC 4` queries. Until the
//! replies arrive a fallback table (the xterm defaults) is used; installing
//! a reply forces the next frame to redraw fully.

use std::sync::RwLock;

/// The 16 ANSI named colours.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NamedColor {
    /// ANSI 0.
    Black,
    /// ANSI 1.
    Red,
    /// ANSI 2.
    Green,
    /// ANSI 3.
    Yellow,
    /// ANSI 4.
    Blue,
    /// ANSI 5.
    Magenta,
    /// ANSI 6.
    Cyan,
    /// ANSI 7.
    White,
    /// ANSI 8.
    BrightBlack,
    /// ANSI 9.
    BrightRed,
    /// ANSI 10.
    BrightGreen,
    /// ANSI 11.
    BrightYellow,
    /// ANSI 12.
    BrightBlue,
    /// ANSI 13.
    BrightMagenta,
    /// ANSI 14.
    BrightCyan,
    /// ANSI 15.
    BrightWhite,
}

impl NamedColor {
    /// Palette index (0..=15).
    pub const fn index(self) -> u8 {
        match self {
            Self::Black => 0,
            Self::Red => 1,
            Self::Green => 2,
            Self::Yellow => 3,
            Self::Blue => 4,
            Self::Magenta => 5,
            Self::Cyan => 6,
            Self::White => 7,
            Self::BrightBlack => 8,
            Self::BrightRed => 9,
            Self::BrightGreen => 10,
            Self::BrightYellow => 11,
            Self::BrightBlue => 12,
            Self::BrightMagenta => 13,
            Self::BrightCyan => 14,
            Self::BrightWhite => 15,
        }
    }

    /// SGR foreground code (30-37 / 90-97).
    pub const fn fg_code(self) -> u8 {
        let i = self.index();
        if i < 8 { 30 + i } else { 90 + (i - 8) }
    }

    /// SGR background code (40-47 / 100-107).
    pub const fn bg_code(self) -> u8 {
        let i = self.index();
        if i < 8 { 40 + i } else { 100 + (i - 8) }
    }
}

/// A colour value as understood by the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    /// One of the 16 ANSI palette entries.
    Named(NamedColor),
    /// An 8-bit indexed colour (0..=255).
    Indexed(u8),
    /// A 24-bit RGB colour.
    Rgb {
        /// Red channel.
        r: u8,
        /// Green channel.
        g: u8,
        /// Blue channel.
        b: u8,
    },
}

impl Color {
    /// Resolve to concrete RGB through the process palette.
    pub fn to_rgb(self) -> (u8, u8, u8) {
        match self {
            Self::Rgb { r, g, b } => (r, g, b),
            Self::Named(n) => palette_entry(n.index()),
            Self::Indexed(i) if i < 16 => palette_entry(i),
            Self::Indexed(i) => indexed_to_rgb(i),
        }
    }

    /// Perceptual luminance in 0.0..=1.0 (ITU-R BT.709 weights).
    pub fn luminance(self) -> f32 {
        let (r, g, b) = self.to_rgb();
        (0.2126 * f32::from(r) + 0.7152 * f32::from(g) + 0.0722 * f32::from(b)) / 255.0
    }

    /// A background counts as "light" above 0.6 luminance.
    pub fn is_light(self) -> bool {
        self.luminance() > 0.6
    }

    /// Foreground that contrasts with this colour used as a background.
    pub fn contrast_fg(self) -> Color {
        if self.is_light() {
            Color::Named(NamedColor::Black)
        } else {
            Color::Named(NamedColor::White)
        }
    }
}

/// Convert a 256-colour index outside the named range to RGB.
///
/// 16-231 is the 6x6x6 cube, 232-255 the grayscale ramp.
fn indexed_to_rgb(idx: u8) -> (u8, u8, u8) {
    if idx >= 232 {
        let gray = 8 + 10 * (idx - 232);
        (gray, gray, gray)
    } else {
        let idx = idx - 16;
        let r_idx = idx / 36;
        let g_idx = (idx / 6) % 6;
        let b_idx = idx % 6;
        let step = |i: u8| if i == 0 { 0 } else { 55 + 40 * i };
        (step(r_idx), step(g_idx), step(b_idx))
    }
}

/// The xterm default values for the 16 ANSI colours.
const FALLBACK_PALETTE: [(u8, u8, u8); 16] = [
    (0, 0, 0),       // Black
    (205, 0, 0),     // Red
    (0, 205, 0),     // Green
    (205, 205, 0),   // Yellow
    (0, 0, 238),     // Blue
    (205, 0, 205),   // Magenta
    (0, 205, 205),   // Cyan
    (229, 229, 229), // White
    (127, 127, 127), // BrightBlack
    (255, 0, 0),     // BrightRed
    (0, 255, 0),     // BrightGreen
    (255, 255, 0),   // BrightYellow
    (92, 92, 255),   // BrightBlue
    (255, 0, 255),   // BrightMagenta
    (0, 255, 255),   // BrightCyan
    (255, 255, 255), // BrightWhite
];

static PALETTE: RwLock<[(u8, u8, u8); 16]> = RwLock::new(FALLBACK_PALETTE);

/// Read one palette entry. Out-of-range indices fall back to white.
pub fn palette_entry(index: u8) -> (u8, u8, u8) {
    let guard = match PALETTE.read() {
        Ok(g) => g,
        Err(poisoned) => poisoned.into_inner(),
    };
    guard
        .get(usize::from(index))
        .copied()
        .unwrap_or((255, 255, 255))
}

/// Overwrite one palette entry with a terminal-reported value.
///
/// Returns true if the entry actually changed (the caller forces a full
/// redraw in that case).
pub fn set_palette_entry(index: u8, rgb: (u8, u8, u8)) -> bool {
    if index > 15 {
        return false;
    }
    let mut guard = match PALETTE.write() {
        Ok(g) => g,
        Err(poisoned) => poisoned.into_inner(),
    };
    let slot = &mut guard[usize::from(index)];
    if *slot == rgb {
        false
    } else {
        *slot = rgb;
        true
    }
}

/// Reset the palette to the fallback table.
pub fn reset_palette() {
    let mut guard = match PALETTE.write() {
        Ok(g) => g,
        Err(poisoned) => poisoned.into_inner(),
    };
    *guard = FALLBACK_PALETTE;
}

/// Parse the colour spec from an `OSC 4` reply: `rgb:rrrr/gggg/bbbb`.
///
/// Channels may be 1-4 hex digits; only the most significant 8 bits are
/// kept, matching how xterm scales its replies.
pub fn parse_osc4_color(spec: &str) -> Option<(u8, u8, u8)> {
    let rest = spec.strip_prefix("rgb:")?;
    let mut parts = rest.split('/');
    let r = parse_channel(parts.next()?)?;
    let g = parse_channel(parts.next()?)?;
    let b = parse_channel(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    Some((r, g, b))
}

fn parse_channel(text: &str) -> Option<u8> {
    if text.is_empty() || text.len() > 4 {
        return None;
    }
    let value = u16::from_str_radix(text, 16).ok()?;
    // Scale to 8 bits based on digit count: "f" => 0xff, "ffff" => 0xff.
    let scaled = match text.len() {
        1 => value * 17,
        2 => value,
        3 => value >> 4,
        _ => value >> 8,
    };
    Some(scaled as u8)
}
