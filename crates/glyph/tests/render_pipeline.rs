//! End-to-end pipeline tests: tree → layout → paint → diff → bytes.

use glyph::app::App;
use glyph::color::{Color, NamedColor};
use glyph::geometry::Size;
use glyph::layout::fixed_size;
use glyph::node_style::{Breakpoint, Dim, FlexDirection, NodeStyle, PositionKind, breakpoints};
use glyph::tree::{Layout, NodeId, NodeKind, NodeProps};

fn render(app: &mut App, cols: u16, rows: u16) -> glyph::Frame {
    match app.render_frame(Size::new(cols, rows)) {
        Ok(f) => f,
        Err(e) => unreachable!("render failed: {e}"),
    }
}

fn layout_of(app: &App, id: NodeId) -> Layout {
    app.dom().get(id).map(|n| n.layout).unwrap_or_default()
}

fn boxed(app: &mut App, style: NodeStyle) -> NodeId {
    let id = app
        .dom_mut()
        .create_node(NodeKind::Box, NodeProps::default());
    let _ = app.dom_mut().update_props(id, NodeProps::default(), style);
    id
}

#[test]
fn flex_row_two_grow_children_in_ten_columns() {
    let mut app = App::new(Size::new(80, 24));
    let root = boxed(&mut app, fixed_size(10, 1));
    let a = boxed(&mut app, NodeStyle::default().flex_grow(1.0));
    let b = boxed(&mut app, NodeStyle::default().flex_grow(1.0));
    let _ = app.dom_mut().append_child(root, a);
    let _ = app.dom_mut().append_child(root, b);
    app.dom_mut().add_root(root);
    render(&mut app, 80, 24);

    let la = layout_of(&app, a);
    let lb = layout_of(&app, b);
    assert_eq!((la.x, la.y, la.width), (0, 0, 5));
    assert_eq!((lb.x, lb.y, lb.width), (5, 0, 5));
    assert_eq!(la.x + la.width, lb.x, "no gap, no overlap");
}

#[test]
fn responsive_direction_flips_at_md_boundary() {
    let mut app = App::new(Size::new(79, 24));
    let root = boxed(
        &mut app,
        NodeStyle::default().flex_direction(breakpoints([
            (Breakpoint::Base, FlexDirection::Column),
            (Breakpoint::Md, FlexDirection::Row),
        ])),
    );
    let a = boxed(&mut app, fixed_size(10, 2));
    let b = boxed(&mut app, fixed_size(10, 2));
    let _ = app.dom_mut().append_child(root, a);
    let _ = app.dom_mut().append_child(root, b);
    app.dom_mut().add_root(root);

    render(&mut app, 79, 24);
    let (la, lb) = (layout_of(&app, a), layout_of(&app, b));
    assert_eq!(la.x, lb.x, "at 79 cols children stack vertically");
    assert!(lb.y > la.y);

    render(&mut app, 80, 24);
    let (la, lb) = (layout_of(&app, a), layout_of(&app, b));
    assert_eq!(la.y, lb.y, "at 80 cols children sit side by side");
    assert!(lb.x > la.x);
}

#[test]
fn layout_round_trip_is_stable() {
    // Building at columns A, then B, then back at A must equal a fresh
    // build at A.
    let build = |cols: u16| -> Vec<Layout> {
        let mut app = App::new(Size::new(cols, 24));
        let root = boxed(
            &mut app,
            NodeStyle::default().flex_direction(breakpoints([
                (Breakpoint::Base, FlexDirection::Column),
                (Breakpoint::Md, FlexDirection::Row),
            ])),
        );
        let a = boxed(&mut app, NodeStyle::default().flex_grow(1.0));
        let b = boxed(&mut app, fixed_size(7, 3));
        let _ = app.dom_mut().append_child(root, a);
        let _ = app.dom_mut().append_child(root, b);
        app.dom_mut().add_root(root);
        render(&mut app, cols, 24);
        vec![layout_of(&app, root), layout_of(&app, a), layout_of(&app, b)]
    };

    let fresh = build(100);

    let mut app = App::new(Size::new(100, 24));
    let root = boxed(
        &mut app,
        NodeStyle::default().flex_direction(breakpoints([
            (Breakpoint::Base, FlexDirection::Column),
            (Breakpoint::Md, FlexDirection::Row),
        ])),
    );
    let a = boxed(&mut app, NodeStyle::default().flex_grow(1.0));
    let b = boxed(&mut app, fixed_size(7, 3));
    let _ = app.dom_mut().append_child(root, a);
    let _ = app.dom_mut().append_child(root, b);
    app.dom_mut().add_root(root);
    render(&mut app, 100, 24);
    render(&mut app, 60, 24);
    render(&mut app, 100, 24);

    let round_tripped = vec![layout_of(&app, root), layout_of(&app, a), layout_of(&app, b)];
    assert_eq!(fresh, round_tripped);
}

#[test]
fn text_wraps_at_word_boundaries_in_five_columns() {
    let mut app = App::new(Size::new(20, 10));
    let root = boxed(
        &mut app,
        fixed_size(5, 5).flex_direction(FlexDirection::Column),
    );
    let t = app
        .dom_mut()
        .create_node(NodeKind::Text, NodeProps::default());
    let f = app.dom_mut().create_text_fragment("one two three");
    let _ = app.dom_mut().append_child(t, f);
    let _ = app.dom_mut().append_child(root, t);
    app.dom_mut().add_root(root);
    let frame = render(&mut app, 20, 10);

    // Three visual lines, each a word.
    assert!(frame.bytes.contains("one"));
    assert!(frame.bytes.contains("two"));
    assert!(frame.bytes.contains("three"));
    assert_eq!(layout_of(&app, t).height, 3);
}

#[test]
fn single_cell_change_emits_compact_bytes() {
    let mut app = App::new(Size::new(40, 10));
    let root = boxed(&mut app, fixed_size(40, 10));
    let t = app
        .dom_mut()
        .create_node(NodeKind::Text, NodeProps::default());
    let _ = app.dom_mut().update_props(
        t,
        NodeProps::default(),
        NodeStyle::default().color(Color::Named(NamedColor::Red)),
    );
    let f = app.dom_mut().create_text_fragment("A");
    let _ = app.dom_mut().append_child(t, f);
    let _ = app.dom_mut().append_child(root, t);
    app.dom_mut().add_root(root);
    render(&mut app, 40, 10);

    let _ = app.dom_mut().set_fragment_text(f, "X");
    app.commit();
    let frame = render(&mut app, 40, 10);

    assert!(frame.bytes.contains("\x1b[1;1H"), "{:?}", frame.bytes);
    assert!(frame.bytes.contains("\x1b[31m"));
    assert!(frame.bytes.contains('X'));
    assert!(frame.bytes.ends_with("\x1b[0m"));
    assert!(frame.bytes.len() < 20, "{} bytes", frame.bytes.len());
}

#[test]
fn identical_frames_emit_empty_diff() {
    let mut app = App::new(Size::new(30, 8));
    let root = boxed(
        &mut app,
        fixed_size(30, 8).bg(Color::Named(NamedColor::Blue)),
    );
    app.dom_mut().add_root(root);
    render(&mut app, 30, 8);
    let frame = render(&mut app, 30, 8);
    assert!(frame.bytes.is_empty());
}

#[test]
fn focus_trap_restricts_tab_cycle() {
    let mut app = App::new(Size::new(100, 4));
    let root = boxed(&mut app, fixed_size(100, 1));
    let mut focus_ids = Vec::new();
    for _ in 0..5 {
        let input = app
            .dom_mut()
            .create_node(NodeKind::Input, NodeProps::default());
        let _ = app.dom_mut().update_props(
            input,
            NodeProps::default(),
            NodeStyle::default().width(Dim::Cells(10)),
        );
        let _ = app.dom_mut().append_child(root, input);
        if let Some(fid) = app.dom().get(input).and_then(|n| n.focus_id) {
            focus_ids.push(fid);
        }
    }
    app.dom_mut().add_root(root);
    render(&mut app, 100, 4);

    // Full cycle covers all five, in visual order.
    let active = app.focus().active_focusables(app.dom());
    assert_eq!(active, focus_ids);

    // Trap the last three: Tab cycles strictly inside the trap.
    app.focus_mut().push_trap(focus_ids[2..].iter().copied());
    app.focus_mut().request_focus(focus_ids[2]);
    let dom_active = app.focus().active_focusables(app.dom());
    assert_eq!(dom_active, &focus_ids[2..]);

    for expected in [focus_ids[3], focus_ids[4], focus_ids[2], focus_ids[3]] {
        let event = glyph::KeyEvent::plain(glyph::KeyCode::Tab);
        app.dispatch_key(&event);
        assert_eq!(app.focus().focused(), Some(expected));
    }

    // Popping the trap restores the five-element cycle.
    app.focus_mut().pop_trap();
    assert_eq!(app.focus().active_focusables(app.dom()).len(), 5);
}

#[test]
fn overlay_outside_parent_is_erased_after_removal() {
    let mut app = App::new(Size::new(30, 6));
    let root = boxed(&mut app, fixed_size(10, 2));
    // Absolute overlay positioned outside the root's rect.
    let overlay = boxed(
        &mut app,
        fixed_size(5, 1)
            .position(PositionKind::Absolute)
            .top(4)
            .left(20)
            .bg(Color::Named(NamedColor::Red)),
    );
    let _ = app.dom_mut().append_child(root, overlay);
    app.dom_mut().add_root(root);
    let first = render(&mut app, 30, 6);
    assert!(first.bytes.contains("\x1b[5;21H"), "overlay painted");

    let _ = app.remove_child(root, overlay);
    app.commit();
    let second = render(&mut app, 30, 6);
    // The vacated area repaints back to blanks.
    assert!(second.bytes.contains("\x1b[5;21H"), "{:?}", second.bytes);

    let third = render(&mut app, 30, 6);
    assert!(third.bytes.is_empty(), "steady state after erase");
}

#[test]
fn clipped_overlay_cells_stay_inside_ancestor_padding_box() {
    let mut app = App::new(Size::new(30, 6));
    let root = boxed(&mut app, fixed_size(8, 3).clip(true));
    let overlay = boxed(
        &mut app,
        fixed_size(20, 5)
            .position(PositionKind::Absolute)
            .top(0)
            .left(0)
            .bg(Color::Named(NamedColor::Green)),
    );
    let _ = app.dom_mut().append_child(root, overlay);
    app.dom_mut().add_root(root);
    let frame = render(&mut app, 30, 6);

    // No painted cell may land right of column 8 or below row 3: the
    // emitted moves stay within the clip region.
    for row in 4..=6 {
        let needle = format!("\x1b[{row};");
        assert!(
            !frame.bytes.contains(&needle),
            "row {row} painted outside clip: {:?}",
            frame.bytes
        );
    }
}

#[test]
fn hidden_toggle_repaints_region() {
    let mut app = App::new(Size::new(20, 4));
    let root = boxed(&mut app, fixed_size(20, 4));
    let badge = boxed(
        &mut app,
        fixed_size(6, 1)
            .position(PositionKind::Absolute)
            .top(1)
            .left(2)
            .bg(Color::Named(NamedColor::Yellow)),
    );
    let _ = app.dom_mut().append_child(root, badge);
    app.dom_mut().add_root(root);
    render(&mut app, 20, 4);

    let _ = app.dom_mut().update_props(
        badge,
        NodeProps {
            hidden: true,
            ..Default::default()
        },
        fixed_size(6, 1)
            .position(PositionKind::Absolute)
            .top(1)
            .left(2)
            .bg(Color::Named(NamedColor::Yellow)),
    );
    app.commit();
    let frame = render(&mut app, 20, 4);
    assert!(
        frame.bytes.contains("\x1b[2;3H"),
        "hidden badge area repaints: {:?}",
        frame.bytes
    );
}
