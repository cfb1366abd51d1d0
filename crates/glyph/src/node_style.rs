//! Declared node styles and responsive value resolution.
//!
//! Every property is either a concrete value or a map from breakpoint to
//! value. Resolution is mobile-first: the largest breakpoint whose
//! threshold fits the current column count and whose key is present wins;
//! with no match the property is unset.

use std::collections::BTreeMap;

use crate::color::Color;
use crate::text::WrapMode;

/// Named column thresholds for responsive values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Breakpoint {
    /// 0 columns and up.
    Base,
    /// 40 columns and up.
    Sm,
    /// 80 columns and up.
    Md,
    /// 120 columns and up.
    Lg,
    /// 160 columns and up.
    Xl,
}

impl Breakpoint {
    /// Minimum column count at which this breakpoint applies.
    pub const fn threshold(self) -> u16 {
        match self {
            Self::Base => 0,
            Self::Sm => 40,
            Self::Md => 80,
            Self::Lg => 120,
            Self::Xl => 160,
        }
    }

    /// All breakpoints, ascending.
    pub const ALL: [Breakpoint; 5] = [Self::Base, Self::Sm, Self::Md, Self::Lg, Self::Xl];
}

/// A style value that may vary by breakpoint.
#[derive(Clone, Debug, PartialEq)]
pub enum Responsive<T> {
    /// A single concrete value.
    Value(T),
    /// Per-breakpoint values (mobile-first).
    Breakpoints(BTreeMap<Breakpoint, T>),
}

impl<T: Clone> Responsive<T> {
    /// Resolve against the current column count.
    pub fn resolve(&self, columns: u16) -> Option<T> {
        match self {
            Self::Value(v) => Some(v.clone()),
            Self::Breakpoints(map) => {
                let mut best = None;
                for bp in Breakpoint::ALL {
                    if bp.threshold() <= columns
                        && let Some(v) = map.get(&bp)
                    {
                        best = Some(v.clone());
                    }
                }
                best
            }
        }
    }
}

impl<T> From<T> for Responsive<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

/// Construct a responsive value from `(breakpoint, value)` pairs.
pub fn breakpoints<T, I>(pairs: I) -> Responsive<T>
where
    I: IntoIterator<Item = (Breakpoint, T)>,
{
    Responsive::Breakpoints(pairs.into_iter().collect())
}

/// A sizing dimension.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Dim {
    /// Fixed cell count.
    Cells(u16),
    /// Percentage of the parent dimension (0.0..=100.0).
    Percent(f32),
    /// Content-based sizing.
    Auto,
}

/// Main-axis direction of a flex container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FlexDirection {
    /// Lay children out left to right.
    #[default]
    Row,
    /// Lay children out top to bottom.
    Column,
}

/// Main-axis distribution of free space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JustifyContent {
    /// Pack at the start.
    #[default]
    Start,
    /// Centre the children.
    Center,
    /// Pack at the end.
    End,
    /// Equal gaps between children.
    SpaceBetween,
    /// Equal gaps around children.
    SpaceAround,
    /// Equal gaps including the edges.
    SpaceEvenly,
}

/// Cross-axis alignment of children.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AlignItems {
    /// Stretch to fill the cross axis.
    #[default]
    Stretch,
    /// Align at the start.
    Start,
    /// Centre.
    Center,
    /// Align at the end.
    End,
}

/// Layout positioning scheme.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PositionKind {
    /// Participates in parent flex flow.
    #[default]
    Static,
    /// Removed from flow; offsets resolve against the parent padding box.
    Absolute,
}

/// Border character set selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BorderKind {
    /// No border.
    #[default]
    None,
    /// Light box drawing.
    Single,
    /// Double lines.
    Double,
    /// Rounded corners.
    Round,
    /// Heavy lines.
    Heavy,
}

/// Horizontal text alignment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextAlign {
    /// Flush left.
    #[default]
    Left,
    /// Centred.
    Center,
    /// Flush right.
    Right,
}

/// Per-edge cell counts (padding, margin).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Edges {
    /// Top edge.
    pub top: u16,
    /// Right edge.
    pub right: u16,
    /// Bottom edge.
    pub bottom: u16,
    /// Left edge.
    pub left: u16,
}

impl Edges {
    /// Uniform edges.
    pub const fn all(n: u16) -> Self {
        Self {
            top: n,
            right: n,
            bottom: n,
            left: n,
        }
    }
}

macro_rules! style_props {
    ($($(#[$doc:meta])* $name:ident : $ty:ty),* $(,)?) => {
        /// Declared style for a node. Unset properties fall back to the
        /// painter/layout defaults.
        #[derive(Clone, Debug, Default, PartialEq)]
        pub struct NodeStyle {
            $($(#[$doc])* pub $name: Option<Responsive<$ty>>,)*
        }

        impl NodeStyle {
            $(
                $(#[$doc])*
                #[must_use]
                pub fn $name(mut self, value: impl Into<Responsive<$ty>>) -> Self {
                    self.$name = Some(value.into());
                    self
                }
            )*
        }
    };
}

style_props! {
    /// Preferred width.
    width: Dim,
    /// Preferred height.
    height: Dim,
    /// Minimum width.
    min_width: Dim,
    /// Maximum width.
    max_width: Dim,
    /// Minimum height.
    min_height: Dim,
    /// Maximum height.
    max_height: Dim,
    /// Padding, all edges.
    padding: u16,
    /// Horizontal padding (left and right).
    padding_x: u16,
    /// Vertical padding (top and bottom).
    padding_y: u16,
    /// Top padding.
    padding_top: u16,
    /// Right padding.
    padding_right: u16,
    /// Bottom padding.
    padding_bottom: u16,
    /// Left padding.
    padding_left: u16,
    /// Margin, all edges.
    margin: u16,
    /// Horizontal margin.
    margin_x: u16,
    /// Vertical margin.
    margin_y: u16,
    /// Top margin.
    margin_top: u16,
    /// Right margin.
    margin_right: u16,
    /// Bottom margin.
    margin_bottom: u16,
    /// Left margin.
    margin_left: u16,
    /// Flex main axis.
    flex_direction: FlexDirection,
    /// Growth factor.
    flex_grow: f32,
    /// Shrink factor.
    flex_shrink: f32,
    /// Whether children wrap onto new lines.
    flex_wrap: bool,
    /// Main-axis distribution.
    justify_content: JustifyContent,
    /// Cross-axis alignment.
    align_items: AlignItems,
    /// Gap between children, both axes.
    gap: u16,
    /// Positioning scheme.
    position: PositionKind,
    /// Offset from the top of the parent padding box.
    top: i32,
    /// Offset from the right.
    right: i32,
    /// Offset from the bottom.
    bottom: i32,
    /// Offset from the left.
    left: i32,
    /// Shorthand for all four offsets.
    inset: i32,
    /// Painter stacking order; inherited by descendants.
    z_index: i32,
    /// Background colour.
    bg: Color,
    /// Foreground colour.
    color: Color,
    /// Bold text.
    bold: bool,
    /// Dim text.
    dim: bool,
    /// Italic text.
    italic: bool,
    /// Underlined text.
    underline: bool,
    /// Strikethrough text.
    strikethrough: bool,
    /// Border character set.
    border: BorderKind,
    /// Border colour.
    border_color: Color,
    /// Clip children to the padding box.
    clip: bool,
    /// Text alignment within the content box.
    text_align: TextAlign,
    /// Wrapping behaviour for text content.
    wrap: WrapMode,
}

/// A declared style collapsed against a concrete column count.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedStyle {
    /// Preferred width.
    pub width: Option<Dim>,
    /// Preferred height.
    pub height: Option<Dim>,
    /// Minimum width.
    pub min_width: Option<Dim>,
    /// Maximum width.
    pub max_width: Option<Dim>,
    /// Minimum height.
    pub min_height: Option<Dim>,
    /// Maximum height.
    pub max_height: Option<Dim>,
    /// Padding per edge.
    pub padding: Edges,
    /// Margin per edge.
    pub margin: Edges,
    /// Flex main axis.
    pub flex_direction: FlexDirection,
    /// Growth factor.
    pub flex_grow: f32,
    /// Shrink factor (defaults to 1, as in CSS).
    pub flex_shrink: f32,
    /// Whether children wrap.
    pub flex_wrap: bool,
    /// Main-axis distribution.
    pub justify_content: JustifyContent,
    /// Cross-axis alignment.
    pub align_items: AlignItems,
    /// Gap between children.
    pub gap: u16,
    /// Positioning scheme.
    pub position: PositionKind,
    /// Top offset for absolute positioning.
    pub top: Option<i32>,
    /// Right offset.
    pub right: Option<i32>,
    /// Bottom offset.
    pub bottom: Option<i32>,
    /// Left offset.
    pub left: Option<i32>,
    /// Stacking order override.
    pub z_index: Option<i32>,
    /// Background colour.
    pub bg: Option<Color>,
    /// Foreground colour.
    pub color: Option<Color>,
    /// Bold text.
    pub bold: bool,
    /// Dim text.
    pub dim: bool,
    /// Italic text.
    pub italic: bool,
    /// Underlined text.
    pub underline: bool,
    /// Strikethrough text.
    pub strikethrough: bool,
    /// Border character set.
    pub border: BorderKind,
    /// Border colour.
    pub border_color: Option<Color>,
    /// Clip children to the padding box.
    pub clip: bool,
    /// Text alignment.
    pub text_align: TextAlign,
    /// Wrap mode for text content.
    pub wrap: WrapMode,
}

impl NodeStyle {
    /// Collapse every responsive property against the current columns.
    pub fn resolve(&self, columns: u16) -> ResolvedStyle {
        fn get<T: Clone>(prop: &Option<Responsive<T>>, columns: u16) -> Option<T> {
            prop.as_ref().and_then(|r| r.resolve(columns))
        }

        let pad_all = get(&self.padding, columns).unwrap_or(0);
        let pad_x = get(&self.padding_x, columns).unwrap_or(pad_all);
        let pad_y = get(&self.padding_y, columns).unwrap_or(pad_all);
        let padding = Edges {
            top: get(&self.padding_top, columns).unwrap_or(pad_y),
            right: get(&self.padding_right, columns).unwrap_or(pad_x),
            bottom: get(&self.padding_bottom, columns).unwrap_or(pad_y),
            left: get(&self.padding_left, columns).unwrap_or(pad_x),
        };

        let m_all = get(&self.margin, columns).unwrap_or(0);
        let m_x = get(&self.margin_x, columns).unwrap_or(m_all);
        let m_y = get(&self.margin_y, columns).unwrap_or(m_all);
        let margin = Edges {
            top: get(&self.margin_top, columns).unwrap_or(m_y),
            right: get(&self.margin_right, columns).unwrap_or(m_x),
            bottom: get(&self.margin_bottom, columns).unwrap_or(m_y),
            left: get(&self.margin_left, columns).unwrap_or(m_x),
        };

        let inset = get(&self.inset, columns);

        ResolvedStyle {
            width: get(&self.width, columns),
            height: get(&self.height, columns),
            min_width: get(&self.min_width, columns),
            max_width: get(&self.max_width, columns),
            min_height: get(&self.min_height, columns),
            max_height: get(&self.max_height, columns),
            padding,
            margin,
            flex_direction: get(&self.flex_direction, columns).unwrap_or_default(),
            flex_grow: get(&self.flex_grow, columns).unwrap_or(0.0),
            flex_shrink: get(&self.flex_shrink, columns).unwrap_or(1.0),
            flex_wrap: get(&self.flex_wrap, columns).unwrap_or(false),
            justify_content: get(&self.justify_content, columns).unwrap_or_default(),
            align_items: get(&self.align_items, columns).unwrap_or_default(),
            gap: get(&self.gap, columns).unwrap_or(0),
            position: get(&self.position, columns).unwrap_or_default(),
            top: get(&self.top, columns).or(inset),
            right: get(&self.right, columns).or(inset),
            bottom: get(&self.bottom, columns).or(inset),
            left: get(&self.left, columns).or(inset),
            z_index: get(&self.z_index, columns),
            bg: get(&self.bg, columns),
            color: get(&self.color, columns),
            bold: get(&self.bold, columns).unwrap_or(false),
            dim: get(&self.dim, columns).unwrap_or(false),
            italic: get(&self.italic, columns).unwrap_or(false),
            underline: get(&self.underline, columns).unwrap_or(false),
            strikethrough: get(&self.strikethrough, columns).unwrap_or(false),
            border: get(&self.border, columns).unwrap_or_default(),
            border_color: get(&self.border_color, columns),
            clip: get(&self.clip, columns).unwrap_or(false),
            text_align: get(&self.text_align, columns).unwrap_or_default(),
            wrap: get(&self.wrap, columns).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::NamedColor;

    #[test]
    fn breakpoint_thresholds() {
        assert_eq!(Breakpoint::Base.threshold(), 0);
        assert_eq!(Breakpoint::Sm.threshold(), 40);
        assert_eq!(Breakpoint::Md.threshold(), 80);
        assert_eq!(Breakpoint::Lg.threshold(), 120);
        assert_eq!(Breakpoint::Xl.threshold(), 160);
    }

    #[test]
    fn concrete_value_always_resolves() {
        let r: Responsive<u16> = 5.into();
        assert_eq!(r.resolve(0), Some(5));
        assert_eq!(r.resolve(300), Some(5));
    }

    #[test]
    fn mobile_first_picks_largest_applicable() {
        let r = breakpoints([(Breakpoint::Base, 1u16), (Breakpoint::Md, 2)]);
        assert_eq!(r.resolve(79), Some(1));
        assert_eq!(r.resolve(80), Some(2));
        assert_eq!(r.resolve(200), Some(2));
    }

    #[test]
    fn missing_base_is_unset_below_threshold() {
        let r = breakpoints([(Breakpoint::Lg, 9u16)]);
        assert_eq!(r.resolve(100), None);
        assert_eq!(r.resolve(120), Some(9));
    }

    #[test]
    fn direction_flip_at_md() {
        let style = NodeStyle::default().flex_direction(breakpoints([
            (Breakpoint::Base, FlexDirection::Column),
            (Breakpoint::Md, FlexDirection::Row),
        ]));
        assert_eq!(style.resolve(79).flex_direction, FlexDirection::Column);
        assert_eq!(style.resolve(80).flex_direction, FlexDirection::Row);
    }

    #[test]
    fn padding_shorthand_layering() {
        let style = NodeStyle::default()
            .padding(2u16)
            .padding_x(4u16)
            .padding_top(1u16);
        let resolved = style.resolve(80);
        assert_eq!(
            resolved.padding,
            Edges {
                top: 1,
                right: 4,
                bottom: 2,
                left: 4
            }
        );
    }

    #[test]
    fn inset_fills_unset_offsets() {
        let style = NodeStyle::default()
            .position(PositionKind::Absolute)
            .inset(2)
            .top(0);
        let resolved = style.resolve(80);
        assert_eq!(resolved.top, Some(0));
        assert_eq!(resolved.left, Some(2));
        assert_eq!(resolved.right, Some(2));
        assert_eq!(resolved.bottom, Some(2));
    }

    #[test]
    fn defaults_match_css() {
        let resolved = NodeStyle::default().resolve(80);
        assert_eq!(resolved.flex_grow, 0.0);
        assert_eq!(resolved.flex_shrink, 1.0);
        assert_eq!(resolved.flex_direction, FlexDirection::Row);
        assert!(!resolved.clip);
        assert_eq!(resolved.border, BorderKind::None);
    }

    #[test]
    fn colors_resolve() {
        let style = NodeStyle::default().bg(Color::Named(NamedColor::Blue));
        assert_eq!(
            style.resolve(10).bg,
            Some(Color::Named(NamedColor::Blue))
        );
    }
}
