//! ANSI escape sequence renderer.
//!
//! Takes cell changes from the buffer diff and produces the minimal
//! terminal byte stream: one cursor move per run of adjacent changes and
//! an SGR delta only when the style actually changes between cells.

use std::fmt::Write;

use crate::buffer::CellChange;
use crate::color::Color;
use crate::style::{Attrs, Style};

/// Renders cell changes into ANSI escape sequences.
#[derive(Clone, Copy, Debug, Default)]
pub struct Renderer;

impl Renderer {
    /// Create a renderer.
    pub fn new() -> Self {
        Self
    }

    /// Render a set of cell changes into a byte string.
    ///
    /// Changes must arrive in row-major order (the buffer diff produces
    /// them that way). Equal frames produce the empty string.
    pub fn render(&self, changes: &[CellChange]) -> String {
        if changes.is_empty() {
            return String::new();
        }

        let mut output = String::with_capacity(changes.len() * 16);
        let mut last_x: Option<u16> = None;
        let mut last_y: Option<u16> = None;
        let mut last_style = Style::default();
        let mut style_active = false;

        for change in changes {
            // Continuation cells produce no output; the preceding wide
            // glyph already advanced the cursor over them.
            if change.cell.is_continuation() {
                continue;
            }

            let need_move = !matches!(
                (last_x, last_y),
                (Some(lx), Some(ly)) if ly == change.y && lx == change.x
            );
            if need_move {
                // ANSI cursor position is 1-based.
                let _ = write!(output, "\x1b[{};{}H", change.y + 1, change.x + 1);
            }

            write_style_diff(&mut output, &last_style, &change.cell.style, style_active);
            last_style = change.cell.style;
            style_active = true;

            output.push_str(&change.cell.grapheme);

            last_x = Some(change.x + u16::from(change.cell.width));
            last_y = Some(change.y);
        }

        if style_active && !last_style.is_empty() {
            output.push_str("\x1b[0m");
        }

        output
    }
}

/// Write the minimal SGR sequence to transition from `prev` to `next`.
fn write_style_diff(output: &mut String, prev: &Style, next: &Style, active: bool) {
    if !active || needs_reset(prev, next) {
        if active && !prev.is_empty() {
            output.push_str("\x1b[0m");
        }
        write_full_style(output, next);
        return;
    }

    if prev.fg != next.fg {
        write_fg(output, next.fg);
    }
    if prev.bg != next.bg {
        write_bg(output, next.bg);
    }
    let added = next.attrs.difference(prev.attrs);
    write_attrs(output, added);
}

/// A transition needs a full reset when it turns any attribute off or
/// drops a colour back to the default.
fn needs_reset(prev: &Style, next: &Style) -> bool {
    !prev.attrs.difference(next.attrs).is_empty()
        || (prev.fg.is_some() && next.fg.is_none())
        || (prev.bg.is_some() && next.bg.is_none())
}

fn write_full_style(output: &mut String, style: &Style) {
    write_fg(output, style.fg);
    write_bg(output, style.bg);
    write_attrs(output, style.attrs);
}

fn write_attrs(output: &mut String, attrs: Attrs) {
    if attrs.contains(Attrs::BOLD) {
        output.push_str("\x1b[1m");
    }
    if attrs.contains(Attrs::DIM) {
        output.push_str("\x1b[2m");
    }
    if attrs.contains(Attrs::ITALIC) {
        output.push_str("\x1b[3m");
    }
    if attrs.contains(Attrs::UNDERLINE) {
        output.push_str("\x1b[4m");
    }
    if attrs.contains(Attrs::REVERSE) {
        output.push_str("\x1b[7m");
    }
    if attrs.contains(Attrs::STRIKETHROUGH) {
        output.push_str("\x1b[9m");
    }
}

/// Emit a foreground colour using the shortest matching SGR form.
fn write_fg(output: &mut String, color: Option<Color>) {
    match color {
        None => {}
        Some(Color::Named(n)) => {
            let _ = write!(output, "\x1b[{}m", n.fg_code());
        }
        Some(Color::Indexed(i)) => {
            let _ = write!(output, "\x1b[38;5;{i}m");
        }
        Some(Color::Rgb { r, g, b }) => {
            let _ = write!(output, "\x1b[38;2;{r};{g};{b}m");
        }
    }
}

/// Emit a background colour using the shortest matching SGR form.
fn write_bg(output: &mut String, color: Option<Color>) {
    match color {
        None => {}
        Some(Color::Named(n)) => {
            let _ = write!(output, "\x1b[{}m", n.bg_code());
        }
        Some(Color::Indexed(i)) => {
            let _ = write!(output, "\x1b[48;5;{i}m");
        }
        Some(Color::Rgb { r, g, b }) => {
            let _ = write!(output, "\x1b[48;2;{r};{g};{b}m");
        }
    }
}
