//! Glyph — a retained-mode terminal UI renderer.
//!
//! A host application describes its UI as a tree of node descriptors
//! (boxes, text, inputs) with flexbox-style, breakpoint-responsive
//! styles. The engine computes layout, paints into an off-screen cell
//! buffer, diffs against the previously displayed frame, and writes the
//! minimal ANSI byte stream to the terminal. Keyboard input is decoded
//! into structured key events and routed to the node holding focus.
//!
//! # Pipeline
//!
//! ```text
//! host mutations → commit → layout (taffy) → paint → diff → terminal
//! terminal bytes → OSC filter → key decoder → focus dispatch → host
//! ```
//!
//! # Quick start
//!
//! ```no_run
//! use glyph::app::App;
//! use glyph::geometry::Size;
//! use glyph::layout::fixed_size;
//! use glyph::tree::{NodeKind, NodeProps};
//!
//! # fn main() -> Result<(), glyph::error::GlyphError> {
//! let mut app = App::new(Size::new(80, 24));
//! let root = app.dom_mut().create_node(NodeKind::Box, NodeProps::default());
//! app.dom_mut().update_props(root, NodeProps::default(), fixed_size(80, 24))?;
//! app.dom_mut().add_root(root);
//! app.commit();
//! app.run()
//! # }
//! ```

pub mod app;
pub mod buffer;
pub mod cell;
pub mod color;
pub mod error;
pub mod focus;
pub mod geometry;
pub mod input;
pub mod layout;
pub mod node_style;
pub mod painter;
pub mod renderer;
pub mod style;
pub mod terminal;
pub mod text;
pub mod tree;

pub use app::{App, Frame};
pub use buffer::{CellChange, FrameBuffer};
pub use cell::Cell;
pub use color::{Color, NamedColor};
pub use error::{GlyphError, Result};
pub use focus::{Dispatch, EventResult, FocusManager};
pub use geometry::{Position, Rect, Size};
pub use input::{InputDecoder, KeyCode, KeyEvent, Modifiers};
pub use node_style::{Breakpoint, NodeStyle, Responsive};
pub use painter::Painter;
pub use style::Style;
pub use tree::{Dom, FocusId, NodeId, NodeKind, NodeProps};
