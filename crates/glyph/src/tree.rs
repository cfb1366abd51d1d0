//! Retained node tree and the mutation protocol the host framework uses.
//!
//! Parents own children exclusively; `parent` is a back reference for
//! traversal only. Raw text fragments are separate entities that share the
//! id space with nodes but never participate in layout. Mutations are only
//! legal between frames; a commit boundary schedules the next render.

use std::collections::HashMap;

use crate::error::GlyphError;
use crate::geometry::Rect;
use crate::node_style::{NodeStyle, ResolvedStyle};
use crate::style::Style;

/// Identifier for a node or text fragment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Stable identifier for a focusable node, unique for the process lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FocusId(pub u64);

/// The kind of a retained node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// A container box.
    Box,
    /// A text leaf composed from raw fragments and nested text nodes.
    Text,
    /// An editable single-line input with a cursor.
    Input,
}

/// Host-supplied properties.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeProps {
    /// Current value (inputs).
    pub value: Option<String>,
    /// Placeholder shown when the value is empty (inputs).
    pub placeholder: Option<String>,
    /// Cursor column within the value (inputs).
    pub cursor: Option<usize>,
    /// Whether the node participates in tab order even when not an input.
    pub focusable: bool,
    /// Painter skips the subtree when set.
    pub hidden: bool,
}

/// Computed layout rect of a node, in cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Layout {
    /// Absolute column of the border box.
    pub x: u16,
    /// Absolute row of the border box.
    pub y: u16,
    /// Border box width.
    pub width: u16,
    /// Border box height.
    pub height: u16,
    /// Absolute column of the content box.
    pub inner_x: u16,
    /// Absolute row of the content box.
    pub inner_y: u16,
    /// Content box width.
    pub inner_width: u16,
    /// Content box height.
    pub inner_height: u16,
}

impl Layout {
    /// Border box as a [`Rect`].
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Content box as a [`Rect`].
    pub fn inner_rect(&self) -> Rect {
        Rect::new(self.inner_x, self.inner_y, self.inner_width, self.inner_height)
    }
}

/// A retained node.
#[derive(Clone, Debug)]
pub struct Node {
    /// Node kind.
    pub kind: NodeKind,
    /// Host-supplied properties.
    pub props: NodeProps,
    /// Declared style (may contain responsive values).
    pub style: NodeStyle,
    /// Style collapsed against the current columns.
    pub resolved_style: ResolvedStyle,
    /// Layout-participating children, in source order.
    pub children: Vec<NodeId>,
    /// Raw text fragments, in source order.
    pub raw_text_children: Vec<NodeId>,
    /// Merged insertion-order sequence of children and fragments.
    pub all_children: Vec<NodeId>,
    /// Back reference; never used for ownership.
    pub parent: Option<NodeId>,
    /// Concatenated raw fragment text (text/input leaves).
    pub text: String,
    /// Computed layout from the last solve.
    pub layout: Layout,
    /// Tab-order identity, present for inputs and focusable boxes.
    pub focus_id: Option<FocusId>,
    /// Monotonic style generation, bumped when `style` is replaced.
    pub style_gen: u64,
    /// `(columns, style_gen)` the resolved style was computed for.
    pub resolved_for: Option<(u16, u64)>,
}

/// A raw text fragment.
#[derive(Clone, Debug)]
pub struct Fragment {
    /// Fragment text.
    pub text: String,
    /// Owning node, if attached.
    pub parent: Option<NodeId>,
}

/// Result of removing a subtree.
#[derive(Clone, Debug)]
pub struct RemovedSubtree {
    /// Removed node ids in post-order (leaves first), fragments excluded.
    pub nodes: Vec<NodeId>,
    /// The subtree root's last-known border box.
    pub rect: Rect,
}

/// The retained tree plus the reconciliation surface.
pub struct Dom {
    next_id: u64,
    next_focus_id: u64,
    nodes: HashMap<NodeId, Node>,
    fragments: HashMap<NodeId, Fragment>,
    roots: Vec<NodeId>,
    layout_dirty: bool,
    pending_clears: Vec<Rect>,
}

impl Dom {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            next_id: 1,
            next_focus_id: 1,
            nodes: HashMap::new(),
            fragments: HashMap::new(),
            roots: Vec::new(),
            layout_dirty: true,
            pending_clears: Vec::new(),
        }
    }

    fn alloc_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Create a detached node. Inputs and `focusable` nodes receive a
    /// fresh, never-reused focus id.
    pub fn create_node(&mut self, kind: NodeKind, props: NodeProps) -> NodeId {
        let focus_id = if kind == NodeKind::Input || props.focusable {
            let fid = FocusId(self.next_focus_id);
            self.next_focus_id += 1;
            Some(fid)
        } else {
            None
        };
        let id = self.alloc_id();
        self.nodes.insert(
            id,
            Node {
                kind,
                props,
                style: NodeStyle::default(),
                resolved_style: ResolvedStyle::default(),
                children: Vec::new(),
                raw_text_children: Vec::new(),
                all_children: Vec::new(),
                parent: None,
                text: String::new(),
                layout: Layout::default(),
                focus_id,
                style_gen: 0,
                resolved_for: None,
            },
        );
        self.layout_dirty = true;
        id
    }

    /// Create a detached raw text fragment.
    pub fn create_text_fragment(&mut self, text: impl Into<String>) -> NodeId {
        let id = self.alloc_id();
        self.fragments.insert(
            id,
            Fragment {
                text: text.into(),
                parent: None,
            },
        );
        id
    }

    /// Returns true if the id names a fragment rather than a node.
    pub fn is_fragment(&self, id: NodeId) -> bool {
        self.fragments.contains_key(&id)
    }

    /// Look up a node.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Look up a node mutably.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Look up a fragment.
    pub fn fragment(&self, id: NodeId) -> Option<&Fragment> {
        self.fragments.get(&id)
    }

    /// The ordered forest of root nodes the painter walks.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Append a node to the root forest.
    pub fn add_root(&mut self, id: NodeId) {
        if !self.roots.contains(&id) {
            self.roots.push(id);
            self.layout_dirty = true;
        }
    }

    /// True when any mutation since the last solve requires a re-layout.
    pub fn layout_dirty(&self) -> bool {
        self.layout_dirty
    }

    /// Mark the tree as needing a layout pass.
    pub fn mark_layout_dirty(&mut self) {
        self.layout_dirty = true;
    }

    /// Clear the layout-dirty flag after a solve.
    pub fn clear_layout_dirty(&mut self) {
        self.layout_dirty = false;
    }

    /// Push a vacated rect for the painter's pre-clear pass.
    pub fn push_pending_clear(&mut self, rect: Rect) {
        if !rect.is_empty() {
            self.pending_clears.push(rect);
        }
    }

    /// Drain the pending-clear list.
    pub fn take_pending_clears(&mut self) -> Vec<Rect> {
        std::mem::take(&mut self.pending_clears)
    }

    /// Move `child` (node or fragment) to the end of `parent`'s list.
    ///
    /// A child attached elsewhere is detached first; order among existing
    /// siblings is otherwise preserved.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), GlyphError> {
        self.insert_child_at(parent, child, None)
    }

    /// Insert `child` before `reference` in `parent`'s list.
    ///
    /// Falls back to an append when `reference` is not a child of `parent`.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: NodeId,
    ) -> Result<(), GlyphError> {
        self.insert_child_at(parent, child, Some(reference))
    }

    fn insert_child_at(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: Option<NodeId>,
    ) -> Result<(), GlyphError> {
        if !self.nodes.contains_key(&parent) {
            return Err(GlyphError::UnknownNode(parent));
        }
        if child == parent {
            return Err(GlyphError::UnknownNode(child));
        }

        let is_fragment = self.fragments.contains_key(&child);
        if !is_fragment && !self.nodes.contains_key(&child) {
            return Err(GlyphError::UnknownNode(child));
        }

        self.detach(child);

        if is_fragment {
            if let Some(f) = self.fragments.get_mut(&child) {
                f.parent = Some(parent);
            }
        } else if let Some(n) = self.nodes.get_mut(&child) {
            n.parent = Some(parent);
        }

        if let Some(p) = self.nodes.get_mut(&parent) {
            let list = if is_fragment {
                &mut p.raw_text_children
            } else {
                &mut p.children
            };
            let pos = before.and_then(|r| list.iter().position(|&c| c == r));
            match pos {
                Some(i) => list.insert(i, child),
                None => list.push(child),
            }

            let all_pos = before.and_then(|r| p.all_children.iter().position(|&c| c == r));
            match all_pos {
                Some(i) => p.all_children.insert(i, child),
                None => p.all_children.push(child),
            }
        }

        self.recompute_text(parent);
        self.layout_dirty = true;
        Ok(())
    }

    /// Unlink a child (node or fragment) from its parent's lists.
    fn detach(&mut self, child: NodeId) {
        let parent = if let Some(f) = self.fragments.get(&child) {
            f.parent
        } else {
            self.nodes.get(&child).and_then(|n| n.parent)
        };
        let Some(pid) = parent else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(&pid) {
            p.children.retain(|&c| c != child);
            p.raw_text_children.retain(|&c| c != child);
            p.all_children.retain(|&c| c != child);
        }
        if let Some(f) = self.fragments.get_mut(&child) {
            f.parent = None;
        } else if let Some(n) = self.nodes.get_mut(&child) {
            n.parent = None;
        }
        self.recompute_text(pid);
    }

    /// Detach `child` from `parent` and free its whole subtree.
    ///
    /// Nodes are freed bottom-up; the vacated border box is queued on the
    /// pending-clear list so the painter erases the screen area next frame
    /// (absolute overlays can sit outside the parent rect).
    pub fn remove_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
    ) -> Result<RemovedSubtree, GlyphError> {
        let actual_parent = if let Some(f) = self.fragments.get(&child) {
            f.parent
        } else {
            self.nodes
                .get(&child)
                .ok_or(GlyphError::UnknownNode(child))?
                .parent
        };
        if actual_parent != Some(parent) {
            return Err(GlyphError::UnknownNode(child));
        }

        self.detach(child);
        self.roots.retain(|&r| r != child);

        if self.fragments.remove(&child).is_some() {
            self.layout_dirty = true;
            return Ok(RemovedSubtree {
                nodes: Vec::new(),
                rect: Rect::default(),
            });
        }

        let rect = self
            .nodes
            .get(&child)
            .map(|n| n.layout.rect())
            .unwrap_or_default();

        let mut order = Vec::new();
        self.post_order(child, &mut order);
        for &id in &order {
            if let Some(node) = self.nodes.remove(&id) {
                for frag in node.raw_text_children {
                    self.fragments.remove(&frag);
                }
            }
        }

        self.push_pending_clear(rect);
        self.layout_dirty = true;
        Ok(RemovedSubtree { nodes: order, rect })
    }

    /// Replace a node's props and style.
    ///
    /// A structural style change bumps the style generation and marks
    /// layout dirty; a props-only change (value, cursor) leaves layout
    /// alone unless the node measures its own text.
    pub fn update_props(
        &mut self,
        id: NodeId,
        props: NodeProps,
        style: NodeStyle,
    ) -> Result<(), GlyphError> {
        let node = self.nodes.get_mut(&id).ok_or(GlyphError::UnknownNode(id))?;
        let style_changed = node.style != style;
        let text_changed = node.kind != NodeKind::Box && node.props.value != props.value;
        let hidden_changed = node.props.hidden != props.hidden;
        node.props = props;
        if style_changed {
            node.style = style;
            node.style_gen += 1;
            node.resolved_for = None;
        }
        if style_changed || text_changed || hidden_changed {
            self.layout_dirty = true;
        }
        Ok(())
    }

    /// Recompute a node's composed `text` from its raw fragments.
    fn recompute_text(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        if node.kind == NodeKind::Box {
            return;
        }
        let mut text = String::new();
        for frag_id in node.raw_text_children.clone() {
            if let Some(f) = self.fragments.get(&frag_id) {
                text.push_str(&f.text);
            }
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.text = text;
        }
    }

    /// Update a fragment's text and recompute the owner's composition.
    pub fn set_fragment_text(
        &mut self,
        id: NodeId,
        text: impl Into<String>,
    ) -> Result<(), GlyphError> {
        let frag = self
            .fragments
            .get_mut(&id)
            .ok_or(GlyphError::UnknownNode(id))?;
        frag.text = text.into();
        let parent = frag.parent;
        if let Some(pid) = parent {
            self.recompute_text(pid);
        }
        self.layout_dirty = true;
        Ok(())
    }

    /// Node ids of the subtree rooted at `id`, post-order (leaves first).
    pub fn post_order(&self, id: NodeId, out: &mut Vec<NodeId>) {
        if let Some(node) = self.nodes.get(&id) {
            for &child in &node.children {
                self.post_order(child, out);
            }
            out.push(id);
        }
    }

    /// Node ids of the subtree rooted at `id`, pre-order.
    pub fn pre_order(&self, id: NodeId, out: &mut Vec<NodeId>) {
        if let Some(node) = self.nodes.get(&id) {
            out.push(id);
            for &child in &node.children {
                self.pre_order(child, out);
            }
        }
    }

    /// Every live node id, unordered.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Live node count (fragments excluded).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the tree holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Walk `all_children` of a text node, carrying the inherited style
    /// stack, and emit `(text, style)` runs.
    ///
    /// Fragments contribute the inherited style; nested text nodes merge
    /// their own visual style on top. When no run was produced the node's
    /// own composed `text` is the fallback.
    pub fn collect_styled_segments(&self, id: NodeId, base: Style) -> Vec<(String, Style)> {
        let mut runs = Vec::new();
        self.collect_segments_into(id, base, &mut runs);
        if runs.is_empty()
            && let Some(node) = self.nodes.get(&id)
            && !node.text.is_empty()
        {
            runs.push((node.text.clone(), base));
        }
        runs
    }

    fn collect_segments_into(&self, id: NodeId, inherited: Style, runs: &mut Vec<(String, Style)>) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        for &child in &node.all_children {
            if let Some(f) = self.fragments.get(&child) {
                if !f.text.is_empty() {
                    runs.push((f.text.clone(), inherited));
                }
            } else if let Some(n) = self.nodes.get(&child) {
                if n.props.hidden {
                    continue;
                }
                let style = inherited.merge(&visual_style(&n.resolved_style));
                self.collect_segments_into(child, style, runs);
            }
        }
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

/// The cell style a resolved node style implies for its text.
pub fn visual_style(resolved: &ResolvedStyle) -> Style {
    let mut style = Style::default();
    style.fg = resolved.color;
    style.bg = resolved.bg;
    style = style
        .bold(resolved.bold)
        .dim(resolved.dim)
        .italic(resolved.italic)
        .underline(resolved.underline)
        .strikethrough(resolved.strikethrough);
    style
}
