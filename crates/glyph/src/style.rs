//! Visual style carried by every painted cell.

use bitflags::bitflags;

use crate::color::Color;

bitflags! {
    /// Text attribute flags for a cell.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Attrs: u8 {
        /// Bold weight.
        const BOLD = 1 << 0;
        /// Dim / faint.
        const DIM = 1 << 1;
        /// Italic slant.
        const ITALIC = 1 << 2;
        /// Underline.
        const UNDERLINE = 1 << 3;
        /// Strikethrough.
        const STRIKETHROUGH = 1 << 4;
        /// Reverse video (used for the software input cursor).
        const REVERSE = 1 << 5;
    }
}

/// Style attributes for a cell: colours plus attribute flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Style {
    /// Foreground colour, `None` for the terminal default.
    pub fg: Option<Color>,
    /// Background colour, `None` for the terminal default.
    pub bg: Option<Color>,
    /// Attribute flags.
    pub attrs: Attrs,
}

impl Style {
    /// Create an empty style with no attributes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the foreground colour.
    #[must_use]
    pub fn fg(mut self, color: Color) -> Self {
        self.fg = Some(color);
        self
    }

    /// Set the background colour.
    #[must_use]
    pub fn bg(mut self, color: Color) -> Self {
        self.bg = Some(color);
        self
    }

    /// Set or clear bold.
    #[must_use]
    pub fn bold(mut self, on: bool) -> Self {
        self.attrs.set(Attrs::BOLD, on);
        self
    }

    /// Set or clear dim.
    #[must_use]
    pub fn dim(mut self, on: bool) -> Self {
        self.attrs.set(Attrs::DIM, on);
        self
    }

    /// Set or clear italic.
    #[must_use]
    pub fn italic(mut self, on: bool) -> Self {
        self.attrs.set(Attrs::ITALIC, on);
        self
    }

    /// Set or clear underline.
    #[must_use]
    pub fn underline(mut self, on: bool) -> Self {
        self.attrs.set(Attrs::UNDERLINE, on);
        self
    }

    /// Set or clear strikethrough.
    #[must_use]
    pub fn strikethrough(mut self, on: bool) -> Self {
        self.attrs.set(Attrs::STRIKETHROUGH, on);
        self
    }

    /// Set or clear reverse video.
    #[must_use]
    pub fn reverse(mut self, on: bool) -> Self {
        self.attrs.set(Attrs::REVERSE, on);
        self
    }

    /// Merge another style on top of this one. The `other` style's set
    /// values take priority; attribute flags are unioned.
    #[must_use]
    pub fn merge(&self, other: &Style) -> Style {
        Style {
            fg: other.fg.or(self.fg),
            bg: other.bg.or(self.bg),
            attrs: self.attrs | other.attrs,
        }
    }

    /// Returns true if no attributes are set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::NamedColor;

    #[test]
    fn builder_pattern() {
        let s = Style::new()
            .fg(Color::Named(NamedColor::Red))
            .bold(true)
            .italic(true);
        assert_eq!(s.fg, Some(Color::Named(NamedColor::Red)));
        assert!(s.attrs.contains(Attrs::BOLD));
        assert!(s.attrs.contains(Attrs::ITALIC));
        assert!(!s.attrs.contains(Attrs::UNDERLINE));
    }

    #[test]
    fn default_is_empty() {
        assert!(Style::new().is_empty());
        assert!(!Style::new().bold(true).is_empty());
    }

    #[test]
    fn merge_fg_override() {
        let base = Style::new().fg(Color::Named(NamedColor::Red));
        let over = Style::new().fg(Color::Named(NamedColor::Blue));
        assert_eq!(base.merge(&over).fg, Some(Color::Named(NamedColor::Blue)));
    }

    #[test]
    fn merge_preserves_base() {
        let base = Style::new().fg(Color::Named(NamedColor::Red)).bold(true);
        let over = Style::new().italic(true);
        let merged = base.merge(&over);
        assert_eq!(merged.fg, Some(Color::Named(NamedColor::Red)));
        assert!(merged.attrs.contains(Attrs::BOLD | Attrs::ITALIC));
    }

    #[test]
    fn builder_can_clear() {
        let s = Style::new().bold(true).bold(false);
        assert!(!s.attrs.contains(Attrs::BOLD));
    }
}
