//! Render loop: commit → layout → paint → diff → flush.
//!
//! The engine core is headless and synchronous: [`App::render_frame`]
//! produces the terminal byte stream for one frame against a given
//! viewport, which keeps every stage testable without a TTY. [`App::run`]
//! adds the real terminal: raw mode, the input reader, palette discovery,
//! signal handling, and the coalesced commit-to-frame scheduling.

use std::sync::mpsc;
use std::time::{Duration, Instant};

use crate::buffer::FrameBuffer;
use crate::error::Result;
use crate::focus::{Dispatch, FocusManager};
use crate::geometry::Size;
use crate::input::InputDecoder;
use crate::layout::LayoutEngine;
use crate::painter::{CursorInfo, Painter, PaintResult};
use crate::renderer::Renderer;
use crate::terminal::{
    ESC_TIMEOUT, OscFilter, PALETTE_TIMEOUT, Terminal, apply_palette_reply, spawn_input_reader,
};
use crate::tree::{Dom, NodeId};

/// One rendered frame.
#[derive(Clone, Debug, Default)]
pub struct Frame {
    /// Terminal bytes for this frame (empty when nothing changed).
    pub bytes: String,
    /// Native-cursor placement, when a focused input requested one.
    pub cursor: Option<CursorInfo>,
}

/// Layout-change subscriber.
pub type LayoutSubscriber = Box<dyn FnMut(&Dom)>;

/// The retained-mode engine.
pub struct App {
    dom: Dom,
    layout: LayoutEngine,
    painter: Painter,
    renderer: Renderer,
    focus: FocusManager,
    prev: FrameBuffer,
    current: FrameBuffer,
    viewport: Size,
    force_full: bool,
    render_scheduled: bool,
    layout_subscribers: Vec<LayoutSubscriber>,
}

impl App {
    /// Create an engine for the given viewport.
    pub fn new(viewport: Size) -> Self {
        Self {
            dom: Dom::new(),
            layout: LayoutEngine::new(),
            painter: Painter::new(),
            renderer: Renderer::new(),
            focus: FocusManager::new(),
            prev: FrameBuffer::new(viewport),
            current: FrameBuffer::new(viewport),
            viewport,
            force_full: true,
            render_scheduled: true,
            layout_subscribers: Vec::new(),
        }
    }

    /// Use the terminal's native cursor for focused inputs instead of a
    /// reverse-video cell.
    pub fn set_native_cursor(&mut self, native: bool) {
        self.painter.use_native_cursor = native;
    }

    /// Access the retained tree.
    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    /// Access the retained tree mutably (reconciliation API).
    pub fn dom_mut(&mut self) -> &mut Dom {
        &mut self.dom
    }

    /// Access the focus coordinator.
    pub fn focus(&self) -> &FocusManager {
        &self.focus
    }

    /// Access the focus coordinator mutably.
    pub fn focus_mut(&mut self) -> &mut FocusManager {
        &mut self.focus
    }

    /// Remove a child subtree, freeing solver handles bottom-up and
    /// unregistering any focusables it contained.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let removed = self.dom.remove_child(parent, child)?;
        self.layout.remove_nodes(&removed.nodes);
        self.sync_focus();
        Ok(())
    }

    /// Signal the end of a mutation batch. Multiple commits before the
    /// next frame coalesce into a single render.
    pub fn commit(&mut self) {
        self.render_scheduled = true;
    }

    /// Whether a commit is waiting for a frame.
    pub fn render_pending(&self) -> bool {
        self.render_scheduled
    }

    /// Force the next frame to repaint every cell.
    pub fn force_full_redraw(&mut self) {
        self.force_full = true;
        self.render_scheduled = true;
    }

    /// Subscribe to completed layout passes.
    pub fn on_layout(&mut self, f: impl FnMut(&Dom) + 'static) {
        self.layout_subscribers.push(Box::new(f));
    }

    /// Mirror the tree's focusable nodes into the focus registry.
    fn sync_focus(&mut self) {
        let mut pairs: Vec<(crate::tree::FocusId, NodeId)> = self
            .dom
            .node_ids()
            .filter_map(|id| {
                self.dom
                    .get(id)
                    .and_then(|n| n.focus_id.map(|f| (f, id)))
            })
            .collect();
        pairs.sort_by_key(|(f, _)| *f);
        let live: std::collections::HashSet<_> = pairs.iter().map(|(f, _)| *f).collect();

        for (fid, node) in pairs {
            self.focus.register(fid, node);
        }
        let stale: Vec<_> = self
            .focus
            .registered()
            .into_iter()
            .filter(|f| !live.contains(f))
            .collect();
        for fid in stale {
            self.focus.unregister(&self.dom, fid);
        }
    }

    /// Render one frame for the given viewport size.
    pub fn render_frame(&mut self, viewport: Size) -> Result<Frame> {
        // 1. Adopt a new viewport: both buffers resize, full repaint.
        if viewport != self.viewport {
            self.viewport = viewport;
            self.prev.resize(viewport);
            self.current.resize(viewport);
            self.force_full = true;
            self.dom.mark_layout_dirty();
        }

        // 2. Responsive resolution + layout (short-circuits when clean).
        self.layout
            .compute(&mut self.dom, viewport.width, viewport.height)?;

        // 3. Layout subscribers.
        for sub in &mut self.layout_subscribers {
            sub(&self.dom);
        }

        // 4-5. Focus registry, then paint (pre-clear pass included).
        self.sync_focus();
        self.current.clear();
        let PaintResult { cursor } =
            self.painter
                .paint(&mut self.dom, &mut self.current, self.focus.focused());

        // 6. Diff and emit.
        let changes = self.current.diff(&self.prev, self.force_full);
        let bytes = self.renderer.render(&changes);

        // 8. Swap by field copy; no allocation at steady state.
        self.prev.copy_from(&self.current);

        // 9. The full-redraw request is satisfied.
        self.force_full = false;
        self.render_scheduled = false;

        Ok(Frame { bytes, cursor })
    }

    /// Feed decoded key events through the dispatch pipeline.
    ///
    /// Returns the strongest outcome observed (`Exit` > `Suspend` >
    /// handled/ignored) so the run loop can react.
    pub fn dispatch_key(&mut self, event: &crate::input::KeyEvent) -> Dispatch {
        let result = self.focus.dispatch(&self.dom, event);
        if result == Dispatch::Consumed {
            // Handlers usually mutate host state and commit; a focus move
            // always needs a repaint.
            self.render_scheduled = true;
        }
        result
    }

    /// Run the full interactive loop on the real terminal.
    ///
    /// Blocks until Ctrl+C, SIGINT/SIGTERM, or an engine error. The
    /// terminal is restored in every exit path, including panics.
    pub fn run(&mut self) -> Result<()> {
        let mut terminal = Terminal::new()?;
        install_panic_teardown();
        terminal.setup()?;

        let input = spawn_input_reader();
        let mut filter = OscFilter::new();
        let mut decoder = InputDecoder::new();

        // Palette discovery: fire the queries, then harvest replies for
        // up to 200 ms before the first frame.
        terminal.query_palette()?;
        self.harvest_palette(&input, &mut filter, &mut decoder);

        let result = self.run_loop(&mut terminal, &input, &mut filter, &mut decoder);
        terminal.teardown()?;
        result
    }

    fn run_loop(
        &mut self,
        terminal: &mut Terminal,
        input: &mpsc::Receiver<Vec<u8>>,
        filter: &mut OscFilter,
        decoder: &mut InputDecoder,
    ) -> Result<()> {
        loop {
            // Drain signal flags first.
            let signals = terminal.poll_signals();
            if signals.interrupted {
                #[cfg(unix)]
                terminal.die_on_signal(libc::SIGTERM)?;
                return Ok(());
            }
            if signals.suspended {
                self.suspend(terminal)?;
            }
            if signals.continued || signals.resized {
                self.force_full_redraw();
            }

            // One frame per commit batch.
            if self.render_scheduled || self.force_full {
                let size = terminal.size()?;
                let frame = self.render_frame(size)?;
                if !frame.bytes.is_empty() {
                    terminal.write_bytes(&frame.bytes)?;
                }
                match frame.cursor {
                    Some(cursor) if self.painter.use_native_cursor => {
                        terminal.show_cursor_at(
                            cursor.position.x,
                            cursor.position.y,
                            cursor.bg,
                        )?;
                    }
                    _ => terminal.hide_cursor()?,
                }
                terminal.flush()?;
            }

            // Wait for input. A pending lone ESC shortens the wait to the
            // disambiguation window.
            let timeout = if decoder.has_pending() {
                ESC_TIMEOUT
            } else {
                Duration::from_millis(100)
            };
            match input.recv_timeout(timeout) {
                Ok(chunk) => {
                    let filtered = filter.feed(&chunk);
                    let mut palette_changed = false;
                    for reply in &filtered.replies {
                        palette_changed |= apply_palette_reply(reply);
                    }
                    if palette_changed {
                        self.force_full_redraw();
                    }
                    let events = decoder.feed(&filtered.bytes);
                    if self.process_events(terminal, events)? {
                        return Ok(());
                    }
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    if decoder.has_pending() {
                        let events = decoder.flush_pending();
                        if self.process_events(terminal, events)? {
                            return Ok(());
                        }
                    }
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    return Ok(());
                }
            }
        }
    }

    /// Dispatch a batch of events in arrival order. Returns true when
    /// the loop should exit.
    fn process_events(
        &mut self,
        terminal: &mut Terminal,
        events: Vec<crate::input::KeyEvent>,
    ) -> Result<bool> {
        for event in events {
            match self.dispatch_key(&event) {
                Dispatch::Exit => return Ok(true),
                Dispatch::Suspend => self.suspend(terminal)?,
                Dispatch::Consumed | Dispatch::Ignored => {}
            }
        }
        Ok(false)
    }

    #[cfg(unix)]
    fn suspend(&mut self, terminal: &mut Terminal) -> Result<()> {
        terminal.suspend()?;
        self.force_full_redraw();
        Ok(())
    }

    #[cfg(not(unix))]
    fn suspend(&mut self, _terminal: &mut Terminal) -> Result<()> {
        Ok(())
    }

    /// Collect palette replies until all 16 arrive or the timeout lapses.
    fn harvest_palette(
        &mut self,
        input: &mpsc::Receiver<Vec<u8>>,
        filter: &mut OscFilter,
        decoder: &mut InputDecoder,
    ) {
        let deadline = Instant::now() + PALETTE_TIMEOUT;
        let mut seen = 0u32;
        let mut changed = false;
        while seen < 16 {
            let now = Instant::now();
            if now >= deadline {
                tracing::debug!("palette query timed out after {seen} replies");
                break;
            }
            match input.recv_timeout(deadline - now) {
                Ok(chunk) => {
                    let filtered = filter.feed(&chunk);
                    for reply in &filtered.replies {
                        seen += 1;
                        changed |= apply_palette_reply(reply);
                    }
                    // Keystrokes racing the query are not lost: they park
                    // in the decoder until the loop starts.
                    let _ = decoder.feed(&filtered.bytes);
                }
                Err(_) => {
                    tracing::debug!("palette query timed out after {seen} replies");
                    break;
                }
            }
        }
        if changed {
            self.force_full_redraw();
        }
    }
}

/// Best-effort terminal restoration on panic, so a crashed renderer does
/// not leave the user's shell in raw mode on the alternate screen.
fn install_panic_teardown() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        use std::io::Write;
        let mut stdout = std::io::stdout();
        let _ = stdout.write_all(b"\x1b[0m\x1b[?25h\x1b[?1049l");
        let _ = stdout.flush();
        let _ = crossterm::terminal::disable_raw_mode();
        default_hook(info);
    }));
}
