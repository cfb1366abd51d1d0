//! Painter: rasterise the retained tree into a frame buffer.
//!
//! Two passes. Collection walks the tree depth-first and produces a flat
//! list of paint entries carrying each node's effective clip, z-index and
//! inherited visual style. Paint stable-sorts the entries by z (ties keep
//! tree order) and draws background, border, then content for each.

use unicode_segmentation::UnicodeSegmentation;

use crate::buffer::FrameBuffer;
use crate::cell::Cell;
use crate::color::Color;
use crate::geometry::{Position, Rect};
use crate::node_style::{BorderKind, TextAlign};
use crate::style::Style;
use crate::text::{self, WrapMode, display_width};
use crate::tree::{Dom, FocusId, NodeId, NodeKind, visual_style};

/// Border character set: top-left, top-right, bottom-left, bottom-right,
/// horizontal, vertical.
pub type BorderChars = (
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
);

impl BorderKind {
    /// Box-drawing characters for this border, `None` for no border.
    pub fn chars(self) -> Option<BorderChars> {
        match self {
            Self::None => None,
            Self::Single => Some((
                "\u{250c}", "\u{2510}", "\u{2514}", "\u{2518}", "\u{2500}", "\u{2502}",
            )),
            Self::Double => Some((
                "\u{2554}", "\u{2557}", "\u{255a}", "\u{255d}", "\u{2550}", "\u{2551}",
            )),
            Self::Round => Some((
                "\u{256d}", "\u{256e}", "\u{2570}", "\u{256f}", "\u{2500}", "\u{2502}",
            )),
            Self::Heavy => Some((
                "\u{250f}", "\u{2513}", "\u{2517}", "\u{251b}", "\u{2501}", "\u{2503}",
            )),
        }
    }
}

/// One collected node, ready to paint.
#[derive(Clone, Debug)]
struct PaintEntry {
    id: NodeId,
    /// Clip applied to this node's own cells (ancestor clips only).
    clip: Rect,
    z: i32,
    /// Visual style inherited from ancestors.
    inherited: Style,
    /// Nearest ancestor (or own) background, for auto-contrast.
    effective_bg: Option<Color>,
}

/// Where the render loop should place the terminal cursor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CursorInfo {
    /// Cell under the cursor.
    pub position: Position,
    /// Background colour at the cursor cell, for contrast colouring.
    pub bg: Option<Color>,
}

/// Result of a paint pass.
#[derive(Clone, Copy, Debug, Default)]
pub struct PaintResult {
    /// Cursor placement when a focused input exists and the native
    /// cursor is in use.
    pub cursor: Option<CursorInfo>,
}

/// Tree-to-buffer rasteriser.
#[derive(Clone, Copy, Debug)]
pub struct Painter {
    /// When set, the focused input's cursor is reported to the render
    /// loop for `CSI H` placement instead of being drawn as a reverse
    /// video cell.
    pub use_native_cursor: bool,
}

impl Default for Painter {
    fn default() -> Self {
        Self {
            use_native_cursor: false,
        }
    }
}

impl Painter {
    /// Create a painter drawing a software cursor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Paint the tree into `buf`.
    ///
    /// Runs the pre-clear pass first: every rect vacated since the last
    /// frame (removed subtrees, moved nodes) is erased, because absolute
    /// overlays may have left areas no new paint will touch.
    pub fn paint(
        &self,
        dom: &mut Dom,
        buf: &mut FrameBuffer,
        focused: Option<FocusId>,
    ) -> PaintResult {
        for rect in dom.take_pending_clears() {
            buf.clear_rect(rect);
        }

        let screen = Rect::new(0, 0, buf.width(), buf.height());
        let mut entries = Vec::new();
        for &root in &dom.roots().to_vec() {
            collect(dom, root, screen, 0, Style::default(), None, &mut entries);
        }

        // Stable by z: ties keep tree (source) order.
        entries.sort_by_key(|e| e.z);

        let mut result = PaintResult::default();
        for entry in &entries {
            if let Some(cursor) = self.paint_entry(dom, buf, entry, focused) {
                result.cursor = Some(cursor);
            }
        }
        result
    }

    /// Draw one entry. Returns cursor info when this is the focused input
    /// and the native cursor is in use.
    fn paint_entry(
        &self,
        dom: &Dom,
        buf: &mut FrameBuffer,
        entry: &PaintEntry,
        focused: Option<FocusId>,
    ) -> Option<CursorInfo> {
        let node = dom.get(entry.id)?;
        let rs = &node.resolved_style;
        let layout = node.layout;
        let rect = layout.rect();
        if rect.is_empty() {
            return None;
        }

        // Background fill.
        if let Some(bg) = rs.bg {
            let style = Style::default().bg(bg);
            fill_clipped(buf, rect, entry.clip, style);
        }

        // Border.
        if let Some((tl, tr, bl, br, h, v)) = rs.border.chars() {
            let style = Style {
                fg: rs
                    .border_color
                    .or(rs.color)
                    .or(entry.inherited.fg)
                    .or_else(|| entry.effective_bg.map(Color::contrast_fg)),
                bg: rs.bg.or(entry.effective_bg),
                ..Style::default()
            };
            draw_border(buf, rect, entry.clip, (tl, tr, bl, br, h, v), style);
        }

        match node.kind {
            NodeKind::Text => {
                self.paint_text(dom, buf, entry, node.layout, rs.text_align, rs.wrap);
                None
            }
            NodeKind::Input => self.paint_input(buf, entry, node, focused),
            NodeKind::Box => None,
        }
    }

    fn paint_text(
        &self,
        dom: &Dom,
        buf: &mut FrameBuffer,
        entry: &PaintEntry,
        layout: crate::tree::Layout,
        align: TextAlign,
        wrap: WrapMode,
    ) {
        let node = match dom.get(entry.id) {
            Some(n) => n,
            None => return,
        };
        let base = entry
            .inherited
            .merge(&visual_style(&node.resolved_style));
        let base = contrast_defaulted(base, entry.effective_bg);

        let runs = dom.collect_styled_segments(entry.id, base);
        if runs.is_empty() {
            return;
        }

        let combined: String = runs.iter().map(|(t, _)| t.as_str()).collect();
        let logical: Vec<&str> = combined.split('\n').collect();
        let lines = text::wrap_lines(&logical, layout.inner_width.max(1), wrap);

        // Per-grapheme styles in source order, for re-attribution after
        // wrapping (wrapping only drops break spaces).
        let mut flat: Vec<(&str, Style)> = Vec::new();
        for (run_text, style) in &runs {
            for g in run_text.graphemes(true) {
                flat.push((g, *style));
            }
        }
        let mut cursor = 0usize;

        // Content is clipped to the node's own content box as well as the
        // ancestor clip; overflow lines and `WrapMode::None` tails drop out.
        let text_clip = entry
            .clip
            .intersection(&layout.inner_rect())
            .unwrap_or(Rect::new(0, 0, 0, 0));

        for (line_idx, line) in lines.iter().enumerate() {
            let y = layout.inner_y.saturating_add(line_idx as u16);
            let visible = display_width(line).min(usize::from(layout.inner_width)) as u16;
            let offset = align_offset(align, layout.inner_width, visible);
            let mut x = layout.inner_x.saturating_add(offset);

            for g in line.graphemes(true) {
                // Skip flattened graphemes the wrapper dropped (spaces
                // and the newlines separating logical lines).
                while cursor < flat.len() && flat[cursor].0 != g {
                    let dropped = flat[cursor].0;
                    if dropped == " " || dropped == "\n" {
                        cursor += 1;
                    } else {
                        break;
                    }
                }
                let style = if cursor < flat.len() && flat[cursor].0 == g {
                    let s = flat[cursor].1;
                    cursor += 1;
                    s
                } else {
                    base
                };
                let style = Style {
                    bg: style.bg.or(entry.effective_bg),
                    ..style
                };
                let width = display_width(g) as u16;
                write_clipped(buf, x, y, Cell::new(g, style), text_clip);
                x = x.saturating_add(width.max(1));
            }
        }
    }

    fn paint_input(
        &self,
        buf: &mut FrameBuffer,
        entry: &PaintEntry,
        node: &crate::tree::Node,
        focused: Option<FocusId>,
    ) -> Option<CursorInfo> {
        let layout = node.layout;
        if layout.inner_width == 0 || layout.inner_height == 0 {
            return None;
        }

        let value = node.props.value.clone().unwrap_or_default();
        let is_placeholder = value.is_empty();
        let shown = if is_placeholder {
            node.props.placeholder.clone().unwrap_or_default()
        } else {
            value
        };

        let mut style = entry
            .inherited
            .merge(&visual_style(&node.resolved_style));
        style = contrast_defaulted(style, entry.effective_bg.or(node.resolved_style.bg));
        if is_placeholder {
            style = style.dim(true);
        }
        let style = Style {
            bg: style.bg.or(node.resolved_style.bg).or(entry.effective_bg),
            ..style
        };

        let visible = text::truncate_to_width(&shown, usize::from(layout.inner_width));
        let mut x = layout.inner_x;
        for g in visible.graphemes(true) {
            let width = display_width(g) as u16;
            write_clipped(buf, x, layout.inner_y, Cell::new(g, style), entry.clip);
            x = x.saturating_add(width.max(1));
        }

        // Cursor handling for the focused input.
        let has_focus = focused.is_some() && focused == node.focus_id;
        if !has_focus {
            return None;
        }

        let value_len = node
            .props
            .value
            .as_deref()
            .map(|v| v.graphemes(true).count())
            .unwrap_or(0);
        let cursor_col = node
            .props
            .cursor
            .unwrap_or(value_len)
            .min(usize::from(layout.inner_width.saturating_sub(1)));
        let cx = layout.inner_x.saturating_add(cursor_col as u16);
        let cy = layout.inner_y;

        if self.use_native_cursor {
            let bg = buf.get(cx, cy).and_then(|c| c.style.bg).or(style.bg);
            return Some(CursorInfo {
                position: Position::new(cx, cy),
                bg,
            });
        }

        // Software cursor: reverse the cell under the cursor.
        if entry.clip.contains(Position::new(cx, cy)) {
            let cell = match buf.get(cx, cy) {
                Some(c) if !c.is_continuation() => {
                    let mut c = c.clone();
                    c.style = c.style.reverse(true);
                    c
                }
                _ => Cell::new(" ", style.reverse(true)),
            };
            buf.set(cx, cy, cell);
        }
        None
    }
}

/// Depth-first collection of paint entries.
fn collect(
    dom: &Dom,
    id: NodeId,
    clip: Rect,
    inherited_z: i32,
    inherited: Style,
    effective_bg: Option<Color>,
    entries: &mut Vec<PaintEntry>,
) {
    let Some(node) = dom.get(id) else {
        return;
    };
    if node.props.hidden {
        return;
    }

    let rs = &node.resolved_style;
    let z = rs.z_index.unwrap_or(inherited_z);
    let bg = rs.bg.or(effective_bg);

    entries.push(PaintEntry {
        id,
        clip,
        z,
        inherited,
        effective_bg: bg,
    });

    // Children are clipped to this node's padding box when requested.
    let child_clip = if rs.clip {
        clip.intersection(&node.layout.inner_rect())
            .unwrap_or(Rect::new(0, 0, 0, 0))
    } else {
        clip
    };

    // Children of a text node are composition material, not independent
    // paint entries; the text pass walks them via styled segments.
    if node.kind == NodeKind::Text {
        return;
    }

    let child_inherited = inherited.merge(&visual_style(rs));
    for &child in &node.children {
        collect(dom, child, child_clip, z, child_inherited, bg, entries);
    }
}

/// Default an unset foreground to black/white against the effective
/// background.
fn contrast_defaulted(style: Style, bg: Option<Color>) -> Style {
    if style.fg.is_some() {
        return style;
    }
    match style.bg.or(bg) {
        Some(b) => Style {
            fg: Some(b.contrast_fg()),
            ..style
        },
        None => style,
    }
}

fn align_offset(align: TextAlign, inner_width: u16, visible: u16) -> u16 {
    let free = inner_width.saturating_sub(visible);
    match align {
        TextAlign::Left => 0,
        TextAlign::Center => free / 2,
        TextAlign::Right => free,
    }
}

fn write_clipped(buf: &mut FrameBuffer, x: u16, y: u16, cell: Cell, clip: Rect) {
    if clip.contains(Position::new(x, y)) {
        buf.set(x, y, cell);
    }
}

fn fill_clipped(buf: &mut FrameBuffer, rect: Rect, clip: Rect, style: Style) {
    if let Some(r) = rect.intersection(&clip) {
        buf.fill_rect(r, style);
    }
}

fn draw_border(
    buf: &mut FrameBuffer,
    rect: Rect,
    clip: Rect,
    chars: BorderChars,
    style: Style,
) {
    let (tl, tr, bl, br, h, v) = chars;
    if rect.size.width == 0 || rect.size.height == 0 {
        return;
    }
    let x1 = rect.position.x;
    let y1 = rect.position.y;
    let x2 = rect.right().saturating_sub(1);
    let y2 = rect.bottom().saturating_sub(1);

    write_clipped(buf, x1, y1, Cell::new(tl, style), clip);
    write_clipped(buf, x2, y1, Cell::new(tr, style), clip);
    write_clipped(buf, x1, y2, Cell::new(bl, style), clip);
    write_clipped(buf, x2, y2, Cell::new(br, style), clip);

    for x in (x1 + 1)..x2 {
        write_clipped(buf, x, y1, Cell::new(h, style), clip);
        write_clipped(buf, x, y2, Cell::new(h, style), clip);
    }
    for y in (y1 + 1)..y2 {
        write_clipped(buf, x1, y, Cell::new(v, style), clip);
        write_clipped(buf, x2, y, Cell::new(v, style), clip);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::NamedColor;
    use crate::geometry::Size;
    use crate::layout::LayoutEngine;
    use crate::layout::fixed_size;
    use crate::node_style::NodeStyle;
    use crate::tree::{NodeProps, NodeKind};

    fn setup(cols: u16, rows: u16) -> (Dom, LayoutEngine, FrameBuffer) {
        (
            Dom::new(),
            LayoutEngine::new(),
            FrameBuffer::new(Size::new(cols, rows)),
        )
    }

    fn grapheme_at(buf: &FrameBuffer, x: u16, y: u16) -> String {
        buf.get(x, y).map(|c| c.grapheme.clone()).unwrap_or_default()
    }

    #[test]
    fn paints_background_fill() {
        let (mut dom, mut engine, mut buf) = setup(10, 4);
        let root = dom.create_node(NodeKind::Box, NodeProps::default());
        dom.update_props(
            root,
            NodeProps::default(),
            fixed_size(4, 2).bg(Color::Named(NamedColor::Blue)),
        )
        .ok();
        dom.add_root(root);
        engine.compute(&mut dom, 10, 4).ok();
        Painter::new().paint(&mut dom, &mut buf, None);

        assert_eq!(
            buf.get(0, 0).and_then(|c| c.style.bg),
            Some(Color::Named(NamedColor::Blue))
        );
        assert_eq!(buf.get(4, 0).and_then(|c| c.style.bg), None);
    }

    #[test]
    fn paints_border_glyphs() {
        let (mut dom, mut engine, mut buf) = setup(10, 4);
        let root = dom.create_node(NodeKind::Box, NodeProps::default());
        dom.update_props(
            root,
            NodeProps::default(),
            fixed_size(5, 3).border(crate::node_style::BorderKind::Single),
        )
        .ok();
        dom.add_root(root);
        engine.compute(&mut dom, 10, 4).ok();
        Painter::new().paint(&mut dom, &mut buf, None);

        assert_eq!(grapheme_at(&buf, 0, 0), "\u{250c}");
        assert_eq!(grapheme_at(&buf, 4, 0), "\u{2510}");
        assert_eq!(grapheme_at(&buf, 0, 2), "\u{2514}");
        assert_eq!(grapheme_at(&buf, 4, 2), "\u{2518}");
        assert_eq!(grapheme_at(&buf, 2, 0), "\u{2500}");
        assert_eq!(grapheme_at(&buf, 0, 1), "\u{2502}");
    }

    #[test]
    fn paints_wrapped_text() {
        let (mut dom, mut engine, mut buf) = setup(10, 5);
        let root = dom.create_node(NodeKind::Box, NodeProps::default());
        dom.update_props(root, NodeProps::default(), fixed_size(5, 4)).ok();
        let t = dom.create_node(NodeKind::Text, NodeProps::default());
        let f = dom.create_text_fragment("one two");
        dom.append_child(t, f).ok();
        dom.append_child(root, t).ok();
        dom.add_root(root);
        engine.compute(&mut dom, 10, 5).ok();
        Painter::new().paint(&mut dom, &mut buf, None);

        assert_eq!(grapheme_at(&buf, 0, 0), "o");
        assert_eq!(grapheme_at(&buf, 1, 0), "n");
        assert_eq!(grapheme_at(&buf, 2, 0), "e");
        assert_eq!(grapheme_at(&buf, 0, 1), "t");
        assert_eq!(grapheme_at(&buf, 1, 1), "w");
        assert_eq!(grapheme_at(&buf, 2, 1), "o");
    }

    #[test]
    fn text_align_right_offsets_line() {
        let (mut dom, mut engine, mut buf) = setup(10, 2);
        let root = dom.create_node(NodeKind::Box, NodeProps::default());
        dom.update_props(root, NodeProps::default(), fixed_size(10, 1)).ok();
        let t = dom.create_node(NodeKind::Text, NodeProps::default());
        dom.update_props(
            t,
            NodeProps::default(),
            NodeStyle::default()
                .flex_grow(1.0)
                .text_align(TextAlign::Right),
        )
        .ok();
        let f = dom.create_text_fragment("hi");
        dom.append_child(t, f).ok();
        dom.append_child(root, t).ok();
        dom.add_root(root);
        engine.compute(&mut dom, 10, 2).ok();
        Painter::new().paint(&mut dom, &mut buf, None);

        assert_eq!(grapheme_at(&buf, 8, 0), "h");
        assert_eq!(grapheme_at(&buf, 9, 0), "i");
    }

    #[test]
    fn clip_constrains_children() {
        let (mut dom, mut engine, mut buf) = setup(20, 5);
        let root = dom.create_node(NodeKind::Box, NodeProps::default());
        dom.update_props(
            root,
            NodeProps::default(),
            fixed_size(5, 2).clip(true),
        )
        .ok();
        // Overlay child escapes the parent rect but must be clipped.
        let child = dom.create_node(NodeKind::Box, NodeProps::default());
        dom.update_props(
            child,
            NodeProps::default(),
            fixed_size(10, 4)
                .position(crate::node_style::PositionKind::Absolute)
                .top(0)
                .left(0)
                .bg(Color::Named(NamedColor::Red)),
        )
        .ok();
        dom.append_child(root, child).ok();
        dom.add_root(root);
        engine.compute(&mut dom, 20, 5).ok();
        Painter::new().paint(&mut dom, &mut buf, None);

        // Inside the parent's padding box: painted.
        assert_eq!(
            buf.get(2, 1).and_then(|c| c.style.bg),
            Some(Color::Named(NamedColor::Red))
        );
        // Outside: clipped.
        assert_eq!(buf.get(7, 1).and_then(|c| c.style.bg), None);
        assert_eq!(buf.get(2, 3).and_then(|c| c.style.bg), None);
    }

    #[test]
    fn z_order_sorts_overlays_on_top() {
        let (mut dom, mut engine, mut buf) = setup(10, 3);
        let root = dom.create_node(NodeKind::Box, NodeProps::default());
        dom.update_props(root, NodeProps::default(), fixed_size(10, 3)).ok();
        let low = dom.create_node(NodeKind::Box, NodeProps::default());
        dom.update_props(
            low,
            NodeProps::default(),
            fixed_size(4, 1)
                .position(crate::node_style::PositionKind::Absolute)
                .top(0)
                .left(0)
                .z_index(5)
                .bg(Color::Named(NamedColor::Red)),
        )
        .ok();
        let high = dom.create_node(NodeKind::Box, NodeProps::default());
        dom.update_props(
            high,
            NodeProps::default(),
            fixed_size(4, 1)
                .position(crate::node_style::PositionKind::Absolute)
                .top(0)
                .left(0)
                .z_index(9)
                .bg(Color::Named(NamedColor::Green)),
        )
        .ok();
        // Register the higher-z node first: z must win over tree order.
        dom.append_child(root, high).ok();
        dom.append_child(root, low).ok();
        dom.add_root(root);
        engine.compute(&mut dom, 10, 3).ok();
        Painter::new().paint(&mut dom, &mut buf, None);

        assert_eq!(
            buf.get(1, 0).and_then(|c| c.style.bg),
            Some(Color::Named(NamedColor::Green))
        );
    }

    #[test]
    fn sibling_ties_paint_in_source_order() {
        let (mut dom, mut engine, mut buf) = setup(10, 3);
        let root = dom.create_node(NodeKind::Box, NodeProps::default());
        dom.update_props(root, NodeProps::default(), fixed_size(10, 3)).ok();
        let first = dom.create_node(NodeKind::Box, NodeProps::default());
        dom.update_props(
            first,
            NodeProps::default(),
            fixed_size(4, 1)
                .position(crate::node_style::PositionKind::Absolute)
                .top(0)
                .left(0)
                .bg(Color::Named(NamedColor::Red)),
        )
        .ok();
        let second = dom.create_node(NodeKind::Box, NodeProps::default());
        dom.update_props(
            second,
            NodeProps::default(),
            fixed_size(4, 1)
                .position(crate::node_style::PositionKind::Absolute)
                .top(0)
                .left(0)
                .bg(Color::Named(NamedColor::Green)),
        )
        .ok();
        dom.append_child(root, first).ok();
        dom.append_child(root, second).ok();
        dom.add_root(root);
        engine.compute(&mut dom, 10, 3).ok();
        Painter::new().paint(&mut dom, &mut buf, None);

        // Later sibling wins the tie.
        assert_eq!(
            buf.get(1, 0).and_then(|c| c.style.bg),
            Some(Color::Named(NamedColor::Green))
        );
    }

    #[test]
    fn pre_clear_erases_vacated_rects() {
        let (mut dom, mut engine, mut buf) = setup(10, 3);
        let root = dom.create_node(NodeKind::Box, NodeProps::default());
        dom.update_props(root, NodeProps::default(), fixed_size(10, 3)).ok();
        let overlay = dom.create_node(NodeKind::Box, NodeProps::default());
        dom.update_props(
            overlay,
            NodeProps::default(),
            fixed_size(3, 1)
                .position(crate::node_style::PositionKind::Absolute)
                .top(0)
                .left(6)
                .bg(Color::Named(NamedColor::Red)),
        )
        .ok();
        dom.append_child(root, overlay).ok();
        dom.add_root(root);
        engine.compute(&mut dom, 10, 3).ok();
        Painter::new().paint(&mut dom, &mut buf, None);
        assert!(buf.get(7, 0).and_then(|c| c.style.bg).is_some());

        dom.remove_child(root, overlay).ok();
        engine.compute(&mut dom, 10, 3).ok();
        Painter::new().paint(&mut dom, &mut buf, None);
        assert_eq!(buf.get(7, 0).and_then(|c| c.style.bg), None);
    }

    #[test]
    fn input_renders_value_and_software_cursor() {
        let (mut dom, mut engine, mut buf) = setup(12, 2);
        let root = dom.create_node(NodeKind::Box, NodeProps::default());
        dom.update_props(root, NodeProps::default(), fixed_size(12, 1)).ok();
        let input = dom.create_node(NodeKind::Input, NodeProps::default());
        dom.update_props(
            input,
            NodeProps {
                value: Some("abc".into()),
                cursor: Some(1),
                ..Default::default()
            },
            NodeStyle::default().flex_grow(1.0),
        )
        .ok();
        dom.append_child(root, input).ok();
        dom.add_root(root);
        engine.compute(&mut dom, 12, 2).ok();
        let focus = dom.get(input).and_then(|n| n.focus_id);
        Painter::new().paint(&mut dom, &mut buf, focus);

        assert_eq!(grapheme_at(&buf, 0, 0), "a");
        assert_eq!(grapheme_at(&buf, 1, 0), "b");
        let under_cursor = buf.get(1, 0).map(|c| c.style);
        assert!(
            under_cursor.is_some_and(|s| s.attrs.contains(crate::style::Attrs::REVERSE)),
            "cursor cell should be reverse video"
        );
    }

    #[test]
    fn input_placeholder_is_dim() {
        let (mut dom, mut engine, mut buf) = setup(12, 2);
        let root = dom.create_node(NodeKind::Box, NodeProps::default());
        dom.update_props(root, NodeProps::default(), fixed_size(12, 1)).ok();
        let input = dom.create_node(NodeKind::Input, NodeProps::default());
        dom.update_props(
            input,
            NodeProps {
                placeholder: Some("type here".into()),
                ..Default::default()
            },
            NodeStyle::default().flex_grow(1.0),
        )
        .ok();
        dom.append_child(root, input).ok();
        dom.add_root(root);
        engine.compute(&mut dom, 12, 2).ok();
        Painter::new().paint(&mut dom, &mut buf, None);

        assert_eq!(grapheme_at(&buf, 0, 0), "t");
        assert!(
            buf.get(0, 0)
                .is_some_and(|c| c.style.attrs.contains(crate::style::Attrs::DIM))
        );
    }

    #[test]
    fn native_cursor_reports_position() {
        let (mut dom, mut engine, mut buf) = setup(12, 2);
        let root = dom.create_node(NodeKind::Box, NodeProps::default());
        dom.update_props(root, NodeProps::default(), fixed_size(12, 1)).ok();
        let input = dom.create_node(NodeKind::Input, NodeProps::default());
        dom.update_props(
            input,
            NodeProps {
                value: Some("hi".into()),
                cursor: Some(2),
                ..Default::default()
            },
            NodeStyle::default().flex_grow(1.0),
        )
        .ok();
        dom.append_child(root, input).ok();
        dom.add_root(root);
        engine.compute(&mut dom, 12, 2).ok();
        let focus = dom.get(input).and_then(|n| n.focus_id);
        let painter = Painter {
            use_native_cursor: true,
        };
        let result = painter.paint(&mut dom, &mut buf, focus);
        assert_eq!(
            result.cursor.map(|c| c.position),
            Some(Position::new(2, 0))
        );
    }

    #[test]
    fn hidden_subtree_not_painted() {
        let (mut dom, mut engine, mut buf) = setup(10, 2);
        let root = dom.create_node(NodeKind::Box, NodeProps::default());
        dom.update_props(root, NodeProps::default(), fixed_size(10, 2)).ok();
        let child = dom.create_node(NodeKind::Box, NodeProps::default());
        dom.update_props(
            child,
            NodeProps {
                hidden: true,
                ..Default::default()
            },
            fixed_size(5, 1).bg(Color::Named(NamedColor::Red)),
        )
        .ok();
        dom.append_child(root, child).ok();
        dom.add_root(root);
        engine.compute(&mut dom, 10, 2).ok();
        Painter::new().paint(&mut dom, &mut buf, None);
        assert_eq!(buf.get(0, 0).and_then(|c| c.style.bg), None);
    }

    #[test]
    fn auto_contrast_on_light_background() {
        let (mut dom, mut engine, mut buf) = setup(10, 2);
        let root = dom.create_node(NodeKind::Box, NodeProps::default());
        dom.update_props(
            root,
            NodeProps::default(),
            fixed_size(10, 1).bg(Color::Rgb {
                r: 250,
                g: 250,
                b: 250,
            }),
        )
        .ok();
        let t = dom.create_node(NodeKind::Text, NodeProps::default());
        dom.update_props(t, NodeProps::default(), NodeStyle::default().flex_grow(1.0))
            .ok();
        let f = dom.create_text_fragment("x");
        dom.append_child(t, f).ok();
        dom.append_child(root, t).ok();
        dom.add_root(root);
        engine.compute(&mut dom, 10, 2).ok();
        Painter::new().paint(&mut dom, &mut buf, None);

        assert_eq!(
            buf.get(0, 0).and_then(|c| c.style.fg),
            Some(Color::Named(NamedColor::Black))
        );
    }
}
