//! Flexbox layout over the retained tree.
//!
//! Wraps a [`taffy::TaffyTree`] with rounding disabled: the solver emits
//! raw float positions and this module performs edge-based rounding
//! afterwards, so adjacent siblings always share an edge (no gaps, no
//! overlaps). Text and input leaves are measured by wrapping their content
//! against the solver-proposed width.

pub mod style_converter;

pub use style_converter::resolved_to_taffy;

use std::collections::HashMap;

use taffy::prelude::*;
use taffy::{AvailableSpace, TaffyTree};

use crate::error::GlyphError;
#[cfg(test)]
use crate::geometry::Rect;
use crate::node_style::Dim;
use crate::text::{self, WrapMode, display_width};
use crate::tree::{Dom, Layout, NodeId as DomNodeId, NodeKind};

/// Content carried by text/input leaves for the measure callback.
#[derive(Clone, Debug, Default)]
pub struct MeasureContext {
    /// Text to be wrapped.
    pub text: String,
    /// Wrap behaviour.
    pub wrap: WrapMode,
}

/// Measure wrapped text against the solver-proposed width.
fn measure_text_content(
    known: taffy::Size<Option<f32>>,
    available: taffy::Size<AvailableSpace>,
    ctx: &MeasureContext,
) -> taffy::Size<f32> {
    let limit = known.width.or(match available.width {
        AvailableSpace::Definite(w) => Some(w),
        AvailableSpace::MaxContent => None,
        AvailableSpace::MinContent => Some(0.0),
    });

    let logical: Vec<&str> = ctx.text.split('\n').collect();
    let lines = match limit {
        Some(w) => {
            let w = w.max(0.0).floor() as u16;
            text::wrap_lines(&logical, w.max(1), ctx.wrap)
        }
        None => logical.iter().map(|l| (*l).to_string()).collect(),
    };

    let width = lines.iter().map(|l| display_width(l)).max().unwrap_or(0) as f32;
    let height = known.height.unwrap_or(lines.len().max(1) as f32);
    taffy::Size {
        width: known.width.unwrap_or(width),
        height,
    }
}

/// Layout engine bridging the retained tree and the Taffy solver.
pub struct LayoutEngine {
    taffy: TaffyTree<MeasureContext>,
    handles: HashMap<DomNodeId, NodeId>,
    last_viewport: Option<(u16, u16)>,
}

impl LayoutEngine {
    /// Create an empty engine.
    pub fn new() -> Self {
        let mut taffy = TaffyTree::new();
        taffy.disable_rounding();
        Self {
            taffy,
            handles: HashMap::new(),
            last_viewport: None,
        }
    }

    /// Whether a node has a solver handle.
    pub fn has_node(&self, id: DomNodeId) -> bool {
        self.handles.contains_key(&id)
    }

    /// Number of solver handles.
    pub fn node_count(&self) -> usize {
        self.handles.len()
    }

    /// Allocate a solver handle for a node (no-op when present).
    pub fn ensure_node(&mut self, id: DomNodeId) -> Result<(), GlyphError> {
        if self.handles.contains_key(&id) {
            return Ok(());
        }
        let handle = self
            .taffy
            .new_leaf(taffy::Style::default())
            .map_err(|e| GlyphError::Layout(e.to_string()))?;
        self.handles.insert(id, handle);
        Ok(())
    }

    /// Free solver handles for removed nodes. The list arrives post-order
    /// from the tree, so children are freed before their parents.
    pub fn remove_nodes(&mut self, ids: &[DomNodeId]) {
        for id in ids {
            if let Some(handle) = self.handles.remove(id) {
                let _ = self.taffy.remove(handle);
            }
        }
    }

    /// Run the full layout pass: responsive resolution, style sync,
    /// solve, edge rounding, and pending-clear bookkeeping.
    ///
    /// Short-circuits when the tree is clean and the viewport unchanged.
    pub fn compute(
        &mut self,
        dom: &mut Dom,
        columns: u16,
        rows: u16,
    ) -> Result<(), GlyphError> {
        if !dom.layout_dirty() && self.last_viewport == Some((columns, rows)) {
            return Ok(());
        }

        self.resolve_styles(dom, columns);
        self.sync(dom, columns, rows)?;

        let roots: Vec<DomNodeId> = dom.roots().to_vec();
        let available = taffy::Size {
            width: AvailableSpace::Definite(f32::from(columns)),
            height: AvailableSpace::Definite(f32::from(rows)),
        };
        for root in &roots {
            let handle = self
                .handles
                .get(root)
                .copied()
                .ok_or(GlyphError::UnknownNode(*root))?;
            self.taffy
                .compute_layout_with_measure(
                    handle,
                    available,
                    |known, avail, _node, ctx, _style| match ctx {
                        Some(c) => measure_text_content(known, avail, c),
                        None => taffy::Size {
                            width: known.width.unwrap_or(0.0),
                            height: known.height.unwrap_or(0.0),
                        },
                    },
                )
                .map_err(|e| GlyphError::Layout(e.to_string()))?;
        }

        for root in &roots {
            self.apply_rounded(dom, *root, 0.0, 0.0)?;
        }

        self.last_viewport = Some((columns, rows));
        dom.clear_layout_dirty();
        Ok(())
    }

    /// Recompute `resolved_style` for nodes whose `(columns, style_gen)`
    /// cache key no longer matches.
    fn resolve_styles(&mut self, dom: &mut Dom, columns: u16) {
        let ids: Vec<DomNodeId> = dom.node_ids().collect();
        for id in ids {
            if let Some(node) = dom.get_mut(id) {
                let key = (columns, node.style_gen);
                if node.resolved_for != Some(key) {
                    node.resolved_style = node.style.resolve(columns);
                    node.resolved_for = Some(key);
                }
            }
        }
    }

    /// Mirror the tree structure and styles into the solver.
    fn sync(&mut self, dom: &mut Dom, columns: u16, rows: u16) -> Result<(), GlyphError> {
        let ids: Vec<DomNodeId> = dom.node_ids().collect();

        // Drop handles for nodes that no longer exist.
        let stale: Vec<DomNodeId> = self
            .handles
            .keys()
            .filter(|id| dom.get(**id).is_none())
            .copied()
            .collect();
        self.remove_nodes(&stale);

        for &id in &ids {
            self.ensure_node(id)?;
        }

        let roots: Vec<DomNodeId> = dom.roots().to_vec();
        for &id in &ids {
            let Some(node) = dom.get(id) else { continue };
            let mut style = resolved_to_taffy(&node.resolved_style);

            // A root with no declared size fills the viewport.
            if roots.contains(&id) {
                if node.resolved_style.width.is_none() {
                    style.size.width = Dimension::Length(f32::from(columns));
                }
                if node.resolved_style.height.is_none() {
                    style.size.height = Dimension::Length(f32::from(rows));
                }
            }

            // Hidden subtrees take no space.
            if node.props.hidden {
                style.display = Display::None;
            }

            let handle = self
                .handles
                .get(&id)
                .copied()
                .ok_or(GlyphError::UnknownNode(id))?;
            self.taffy
                .set_style(handle, style)
                .map_err(|e| GlyphError::Layout(e.to_string()))?;

            let context = match node.kind {
                NodeKind::Text => {
                    // Measure the composed text: raw fragments plus any
                    // nested styled text nodes, in document order.
                    let composed: String = dom
                        .collect_styled_segments(id, crate::style::Style::default())
                        .into_iter()
                        .map(|(t, _)| t)
                        .collect();
                    Some(MeasureContext {
                        text: composed,
                        wrap: node.resolved_style.wrap,
                    })
                }
                NodeKind::Input => {
                    let value = node.props.value.clone().unwrap_or_default();
                    let shown = if value.is_empty() {
                        node.props.placeholder.clone().unwrap_or_default()
                    } else {
                        value
                    };
                    Some(MeasureContext {
                        text: shown,
                        wrap: WrapMode::Truncate,
                    })
                }
                NodeKind::Box => None,
            };
            self.taffy
                .set_node_context(handle, context)
                .map_err(|e| GlyphError::Layout(e.to_string()))?;

            // Text and input nodes are measured leaves: their nested
            // content participates in composition, not in flex flow.
            let children: Vec<NodeId> = if node.kind == NodeKind::Box {
                node.children
                    .iter()
                    .filter_map(|c| self.handles.get(c).copied())
                    .collect()
            } else {
                Vec::new()
            };
            self.taffy
                .set_children(handle, &children)
                .map_err(|e| GlyphError::Layout(e.to_string()))?;
        }
        Ok(())
    }

    /// Walk the solved subtree, rounding absolute edges and storing the
    /// result on each node. A node whose border box moved since the last
    /// frame queues its old rect for the pre-clear pass.
    fn apply_rounded(
        &self,
        dom: &mut Dom,
        id: DomNodeId,
        parent_x: f32,
        parent_y: f32,
    ) -> Result<(), GlyphError> {
        // Hidden subtrees vacate their area: zero the stored layout and
        // queue the old rect so the painter erases it.
        if dom.get(id).is_some_and(|n| n.props.hidden) {
            let old = dom.get(id).map(|n| n.layout.rect()).unwrap_or_default();
            if !old.is_empty() {
                dom.push_pending_clear(old);
            }
            if let Some(node) = dom.get_mut(id) {
                node.layout = Layout::default();
            }
            return Ok(());
        }

        let handle = self
            .handles
            .get(&id)
            .copied()
            .ok_or(GlyphError::UnknownNode(id))?;
        let solved = self
            .taffy
            .layout(handle)
            .map_err(|e| GlyphError::Layout(e.to_string()))?;

        let abs_x = parent_x + solved.location.x;
        let abs_y = parent_y + solved.location.y;

        let left = round_edge(abs_x);
        let top = round_edge(abs_y);
        let right = round_edge(abs_x + solved.size.width);
        let bottom = round_edge(abs_y + solved.size.height);

        let inner_left = round_edge(abs_x + solved.border.left + solved.padding.left);
        let inner_top = round_edge(abs_y + solved.border.top + solved.padding.top);
        let inner_right =
            round_edge(abs_x + solved.size.width - solved.border.right - solved.padding.right);
        let inner_bottom =
            round_edge(abs_y + solved.size.height - solved.border.bottom - solved.padding.bottom);

        let layout = Layout {
            x: clamp_cell(left),
            y: clamp_cell(top),
            width: clamp_cell(right - left),
            height: clamp_cell(bottom - top),
            inner_x: clamp_cell(inner_left),
            inner_y: clamp_cell(inner_top),
            inner_width: clamp_cell(inner_right - inner_left),
            inner_height: clamp_cell(inner_bottom - inner_top),
        };

        let old_rect = dom.get(id).map(|n| n.layout.rect());
        if let Some(old) = old_rect
            && !old.is_empty()
            && old != layout.rect()
        {
            dom.push_pending_clear(old);
        }
        // Text/input leaves own their nested content; only boxes have
        // solver-positioned children to visit.
        let children: Vec<DomNodeId> = match dom.get_mut(id) {
            Some(node) => {
                node.layout = layout;
                if node.kind == NodeKind::Box {
                    node.children.clone()
                } else {
                    Vec::new()
                }
            }
            None => Vec::new(),
        };

        for child in children {
            self.apply_rounded(dom, child, abs_x, abs_y)?;
        }
        Ok(())
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Round an absolute edge coordinate to the nearest cell boundary.
fn round_edge(value: f32) -> i64 {
    value.round() as i64
}

/// Clamp a rounded cell count or coordinate into the u16 grid.
fn clamp_cell(value: i64) -> u16 {
    value.clamp(0, i64::from(u16::MAX)) as u16
}

/// A solver-facing description of a fixed rect, used by tests.
pub fn fixed_size(width: u16, height: u16) -> crate::node_style::NodeStyle {
    crate::node_style::NodeStyle::default()
        .width(Dim::Cells(width))
        .height(Dim::Cells(height))
}
