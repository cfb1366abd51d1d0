//! Frame buffer — a 2D grid of terminal cells.
//!
//! Two buffers (`prev`, `current`) live for the whole render loop.
//! `clear`, `resize` and `copy_from` mutate in place and allocate nothing
//! once the backing storage has reached its working size.

use crate::cell::Cell;
use crate::geometry::{Rect, Size};
use crate::style::Style;

/// A 2D grid of terminal cells representing one frame of output.
#[derive(Clone, Debug)]
pub struct FrameBuffer {
    cells: Vec<Cell>,
    width: u16,
    height: u16,
}

impl FrameBuffer {
    /// Create a new frame buffer filled with blank cells.
    pub fn new(size: Size) -> Self {
        let len = usize::from(size.width) * usize::from(size.height);
        Self {
            cells: vec![Cell::blank(); len],
            width: size.width,
            height: size.height,
        }
    }

    /// Get the buffer dimensions.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Get the buffer width.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Get the buffer height.
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Clear the buffer, resetting all cells to blank.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            *cell = Cell::blank();
        }
    }

    /// Resize the buffer and clear it. The backing vector is only
    /// reallocated when the cell count actually changes.
    pub fn resize(&mut self, size: Size) {
        let len = usize::from(size.width) * usize::from(size.height);
        self.width = size.width;
        self.height = size.height;
        if len == self.cells.len() {
            self.clear();
        } else {
            self.cells.clear();
            self.cells.resize(len, Cell::blank());
        }
    }

    /// Copy every cell from `other` into this buffer, field by field.
    ///
    /// Adopts `other`'s dimensions when they differ.
    pub fn copy_from(&mut self, other: &FrameBuffer) {
        if self.cells.len() != other.cells.len() {
            self.cells.resize(other.cells.len(), Cell::blank());
        }
        self.width = other.width;
        self.height = other.height;
        for (dst, src) in self.cells.iter_mut().zip(other.cells.iter()) {
            dst.clone_from(src);
        }
    }

    /// Get a reference to the cell at (x, y), or `None` if out of bounds.
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        if x < self.width && y < self.height {
            self.cells.get(self.index(x, y))
        } else {
            None
        }
    }

    /// Set a cell at (x, y). If the cell is wide, the next cell becomes a
    /// continuation cell. No-op if out of bounds.
    ///
    /// Wide-character edge cases:
    /// - Writing over a continuation cell blanks the preceding wide
    ///   character's primary cell.
    /// - Writing over a wide character's primary cell blanks its old
    ///   continuation cell.
    /// - A wide character whose continuation would fall past the last
    ///   column is replaced with a blank.
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        if x >= self.width || y >= self.height {
            return;
        }

        let is_wide = cell.is_wide();
        if is_wide && x + 1 >= self.width {
            let idx = self.index(x, y);
            if let Some(c) = self.cells.get_mut(idx) {
                *c = Cell::blank();
            }
            return;
        }

        let idx = self.index(x, y);
        if let Some(existing) = self.cells.get(idx)
            && existing.is_continuation()
            && x > 0
        {
            let prev_idx = self.index(x - 1, y);
            if let Some(prev) = self.cells.get_mut(prev_idx) {
                *prev = Cell::blank();
            }
        }

        if let Some(existing) = self.cells.get(idx)
            && existing.is_wide()
            && x + 1 < self.width
        {
            let next_idx = self.index(x + 1, y);
            if let Some(cont) = self.cells.get_mut(next_idx) {
                *cont = Cell::blank();
            }
        }

        if let Some(c) = self.cells.get_mut(idx) {
            *c = cell;
        }

        if is_wide {
            let next_x = x + 1;
            let next_idx = self.index(next_x, y);
            // If the continuation lands on another wide char's primary
            // cell, that character's own continuation must be blanked too.
            if let Some(next_cell) = self.cells.get(next_idx)
                && next_cell.is_wide()
                && next_x + 1 < self.width
            {
                let after_idx = self.index(next_x + 1, y);
                if let Some(after) = self.cells.get_mut(after_idx) {
                    *after = Cell::blank();
                }
            }
            if let Some(c) = self.cells.get_mut(next_idx) {
                *c = Cell::continuation();
            }
        }
    }

    /// Fill a rectangle with styled blanks, clipped to the buffer.
    pub fn fill_rect(&mut self, rect: Rect, style: Style) {
        let x2 = rect.right().min(self.width);
        let y2 = rect.bottom().min(self.height);
        for y in rect.position.y..y2 {
            for x in rect.position.x..x2 {
                self.set(x, y, Cell::blank_styled(style));
            }
        }
    }

    /// Erase a rectangle back to default blanks, clipped to the buffer.
    pub fn clear_rect(&mut self, rect: Rect) {
        self.fill_rect(rect, Style::default());
    }

    /// Compute the differences between this buffer and the previous frame.
    ///
    /// When `force_full` is set, or the sizes differ, every cell is
    /// reported so the terminal repaints from scratch.
    pub fn diff(&self, previous: &FrameBuffer, force_full: bool) -> Vec<CellChange> {
        if force_full || self.width != previous.width || self.height != previous.height {
            return self.full_diff();
        }

        let mut changes = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = self.index(x, y);
                let current = &self.cells[idx];
                if current != &previous.cells[idx] {
                    changes.push(CellChange {
                        x,
                        y,
                        cell: current.clone(),
                    });
                }
            }
        }
        changes
    }

    /// Generate changes for every cell.
    fn full_diff(&self) -> Vec<CellChange> {
        let mut changes = Vec::with_capacity(self.cells.len());
        for y in 0..self.height {
            for x in 0..self.width {
                changes.push(CellChange {
                    x,
                    y,
                    cell: self.cells[self.index(x, y)].clone(),
                });
            }
        }
        changes
    }

    fn index(&self, x: u16, y: u16) -> usize {
        usize::from(y) * usize::from(self.width) + usize::from(x)
    }
}

/// A single cell change: position + new cell value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellChange {
    /// Column position.
    pub x: u16,
    /// Row position.
    pub y: u16,
    /// New cell value.
    pub cell: Cell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{Color, NamedColor};

    #[test]
    fn new_buffer_all_blank() {
        let buf = FrameBuffer::new(Size::new(10, 5));
        for y in 0..5 {
            for x in 0..10 {
                assert!(buf.get(x, y).is_some_and(Cell::is_blank));
            }
        }
    }

    #[test]
    fn set_and_get() {
        let mut buf = FrameBuffer::new(Size::new(10, 5));
        let cell = Cell::new("A", Style::new().fg(Color::Named(NamedColor::Red)));
        buf.set(3, 2, cell.clone());
        assert_eq!(buf.get(3, 2), Some(&cell));
    }

    #[test]
    fn out_of_bounds_set_is_noop() {
        let mut buf = FrameBuffer::new(Size::new(5, 3));
        buf.set(10, 10, Cell::new("X", Style::default()));
        assert!(buf.get(10, 10).is_none());
    }

    #[test]
    fn resize_same_area_reuses_storage() {
        let mut buf = FrameBuffer::new(Size::new(10, 6));
        buf.set(0, 0, Cell::new("X", Style::default()));
        let ptr_before = buf.cells.as_ptr();
        buf.resize(Size::new(6, 10));
        assert_eq!(buf.cells.as_ptr(), ptr_before);
        assert_eq!(buf.size(), Size::new(6, 10));
        assert!(buf.get(0, 0).is_some_and(Cell::is_blank));
    }

    #[test]
    fn resize_different_area_clears() {
        let mut buf = FrameBuffer::new(Size::new(5, 3));
        buf.set(2, 1, Cell::new("X", Style::default()));
        buf.resize(Size::new(10, 8));
        assert_eq!(buf.size(), Size::new(10, 8));
        for y in 0..8 {
            for x in 0..10 {
                assert!(buf.get(x, y).is_some_and(Cell::is_blank));
            }
        }
    }

    #[test]
    fn copy_from_matches_source() {
        let mut a = FrameBuffer::new(Size::new(5, 3));
        let mut b = FrameBuffer::new(Size::new(5, 3));
        a.set(1, 1, Cell::new("Z", Style::new().bold(true)));
        b.copy_from(&a);
        assert_eq!(b.get(1, 1), a.get(1, 1));
        assert!(a.diff(&b, false).is_empty());
    }

    #[test]
    fn fill_rect_clips_to_bounds() {
        let mut buf = FrameBuffer::new(Size::new(5, 5));
        let style = Style::new().bg(Color::Named(NamedColor::Blue));
        buf.fill_rect(Rect::new(3, 3, 10, 10), style);
        assert_eq!(buf.get(4, 4).map(|c| c.style), Some(style));
        assert_eq!(buf.get(2, 2).map(|c| c.style), Some(Style::default()));
    }

    #[test]
    fn wide_char_sets_continuation() {
        let mut buf = FrameBuffer::new(Size::new(10, 5));
        buf.set(3, 1, Cell::new("\u{4e16}", Style::default()));
        assert!(buf.get(4, 1).is_some_and(Cell::is_continuation));
    }

    #[test]
    fn wide_char_at_right_edge_becomes_blank() {
        let mut buf = FrameBuffer::new(Size::new(5, 1));
        buf.set(4, 0, Cell::new("\u{4e16}", Style::default()));
        assert!(buf.get(4, 0).is_some_and(Cell::is_blank));
    }

    #[test]
    fn overwrite_continuation_blanks_preceding_wide() {
        let mut buf = FrameBuffer::new(Size::new(10, 1));
        buf.set(3, 0, Cell::new("\u{4e16}", Style::default()));
        buf.set(4, 0, Cell::new("X", Style::default()));
        assert!(buf.get(3, 0).is_some_and(Cell::is_blank));
        assert_eq!(buf.get(4, 0).map(|c| c.grapheme.as_str()), Some("X"));
    }

    #[test]
    fn overwrite_wide_blanks_old_continuation() {
        let mut buf = FrameBuffer::new(Size::new(10, 1));
        buf.set(3, 0, Cell::new("\u{4e16}", Style::default()));
        buf.set(3, 0, Cell::new("A", Style::default()));
        assert!(buf.get(4, 0).is_some_and(Cell::is_blank));
    }

    #[test]
    fn diff_no_changes() {
        let a = FrameBuffer::new(Size::new(5, 3));
        let b = FrameBuffer::new(Size::new(5, 3));
        assert!(a.diff(&b, false).is_empty());
    }

    #[test]
    fn diff_single_change() {
        let mut current = FrameBuffer::new(Size::new(5, 3));
        let previous = FrameBuffer::new(Size::new(5, 3));
        current.set(2, 1, Cell::new("A", Style::default()));
        let changes = current.diff(&previous, false);
        assert_eq!(changes.len(), 1);
        assert_eq!((changes[0].x, changes[0].y), (2, 1));
    }

    #[test]
    fn diff_force_full_reports_everything() {
        let current = FrameBuffer::new(Size::new(5, 3));
        let previous = FrameBuffer::new(Size::new(5, 3));
        assert_eq!(current.diff(&previous, true).len(), 15);
    }

    #[test]
    fn diff_size_mismatch_full_redraw() {
        let current = FrameBuffer::new(Size::new(5, 3));
        let previous = FrameBuffer::new(Size::new(10, 8));
        assert_eq!(current.diff(&previous, false).len(), 15);
    }

    #[test]
    fn diff_wide_char_has_continuation_entry() {
        let mut current = FrameBuffer::new(Size::new(10, 1));
        let previous = FrameBuffer::new(Size::new(10, 1));
        current.set(3, 0, Cell::new("\u{4e16}", Style::default()));
        let changes = current.diff(&previous, false);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].cell.width, 2);
        assert_eq!(changes[1].cell.width, 0);
    }
}
