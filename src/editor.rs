use egui::{Pos2, Rect, Vec2};
use image::RgbaImage;

use crate::canvas::{self, ERASER_RADIUS, MapCanvas, PEN_ALPHA, PenTip};
use crate::log_warn;
use crate::store::{self, MAP_RECORD_KEY, MapStore};

/// Distance between successive pen stamps along a stroke segment.
const PEN_STEP: f32 = 0.75;

/// Distance between successive eraser clears along a stroke segment. The
/// eraser radius is 8 px, so denser stepping buys nothing.
const ERASER_STEP: f32 = 4.0;

/// Spread of the per-stamp positional jitter (±0.125 px).
const STAMP_JITTER: f32 = 0.25;

/// A selection drag below this edge length (on either axis) is discarded.
const MIN_SELECTION_SIZE: f32 = 5.0;

// ============================================================================
// TOOLS
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Pen,
    Eraser,
    Select,
}

impl Tool {
    /// Cycle order of the "T" shortcut: Pen → Eraser → Select → Pen.
    pub fn next(self) -> Tool {
        match self {
            Tool::Pen => Tool::Eraser,
            Tool::Eraser => Tool::Select,
            Tool::Select => Tool::Pen,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tool::Pen => "Pen",
            Tool::Eraser => "Eraser",
            Tool::Select => "Select",
        }
    }

    pub fn all() -> &'static [Tool] {
        &[Tool::Pen, Tool::Eraser, Tool::Select]
    }
}

// ============================================================================
// SELECTION
// ============================================================================

/// A pending rectangular selection: pixels lifted out of the main buffer,
/// shown on the overlay until finalized back in.
pub struct Selection {
    /// Current rectangle in buffer coordinates, normalized (non-negative
    /// extent).
    pub rect: Rect,
    /// The captured pixels. The source region of the main buffer was cleared
    /// at capture time.
    pub pixels: RgbaImage,
    /// Full-buffer snapshot taken when the selection drag began. Nothing
    /// consumes it today (Escape merges rather than rolls back; see
    /// DESIGN.md), but it is the record a true cancel would restore from.
    pub rollback: Option<RgbaImage>,
    /// Pointer anchor minus rectangle origin, present while a move drag is
    /// in progress.
    drag_offset: Option<Vec2>,
}

// ============================================================================
// RENDER BINDING
// ============================================================================

/// Texture-producing layer consumed by the renderer.
///
/// The renderer reads pixels and re-uploads when the dirty flag fires; it
/// never mutates. The editor is the single writer.
pub trait Drawable {
    fn texture(&self) -> &RgbaImage;
    /// True once per mutation; reading clears the flag.
    fn take_dirty(&mut self) -> bool;
}

// ============================================================================
// MAP EDITOR
// ============================================================================

/// The parchment-map raster editor: drawing layer, selection overlay, tool
/// state machine and persistence.
///
/// All mutation happens synchronously inside the pointer/key handlers; the
/// caller guarantees events arrive in delivery order. Handlers take the
/// already-projected buffer point (`None` when the pointer ray missed the
/// parchment), so the editor never touches raw input or the camera.
pub struct MapEditor {
    canvas: MapCanvas,
    overlay: MapCanvas,
    tip: PenTip,
    tool: Tool,

    // Gesture state: at most one of the three flags is true at any instant.
    is_drawing: bool,
    is_selecting: bool,
    is_moving_selection: bool,
    last_point: Option<Pos2>,

    // Nascent selection drag (before capture).
    select_anchor: Option<Pos2>,
    select_cursor: Option<Pos2>,
    rollback: Option<RgbaImage>,

    selection: Option<Selection>,

    stamp_counter: u32,
    drawing_dirty: bool,
    overlay_dirty: bool,

    store: Box<dyn MapStore>,
}

impl MapEditor {
    /// Create an editor, restoring the persisted map record if one exists.
    pub fn new(width: u32, height: u32, store: Box<dyn MapStore>) -> Self {
        let mut canvas = MapCanvas::new(width, height);
        match store.get(MAP_RECORD_KEY) {
            Ok(Some(record)) => match store::decode_record(&record) {
                Ok(saved) => canvas.put_region(saved.pixels(), Pos2::ZERO),
                Err(e) => log_warn!("ignoring unreadable map record: {}", e),
            },
            Ok(None) => {}
            Err(e) => log_warn!("map record load failed: {}", e),
        }
        Self {
            canvas,
            overlay: MapCanvas::new(width, height),
            tip: PenTip::new(),
            tool: Tool::Pen,
            is_drawing: false,
            is_selecting: false,
            is_moving_selection: false,
            last_point: None,
            select_anchor: None,
            select_cursor: None,
            rollback: None,
            selection: None,
            stamp_counter: 0,
            drawing_dirty: true,
            overlay_dirty: true,
            store,
        }
    }

    // ---- accessors -------------------------------------------------------

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    pub fn height(&self) -> u32 {
        self.canvas.height()
    }

    pub fn drawing(&self) -> &MapCanvas {
        &self.canvas
    }

    pub fn overlay_texture(&self) -> &RgbaImage {
        self.overlay.pixels()
    }

    pub fn take_overlay_dirty(&mut self) -> bool {
        std::mem::take(&mut self.overlay_dirty)
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn is_drawing(&self) -> bool {
        self.is_drawing
    }

    pub fn is_selecting(&self) -> bool {
        self.is_selecting
    }

    pub fn is_moving_selection(&self) -> bool {
        self.is_moving_selection
    }

    // ---- tool switching --------------------------------------------------

    /// Switch the active tool, resolving any in-progress gesture first: a
    /// pending selection is finalized and all gesture flags drop, so the new
    /// tool never sees a half-finished gesture.
    pub fn set_tool(&mut self, tool: Tool) {
        if tool == self.tool {
            return;
        }
        self.finalize_selection();
        self.abort_gesture();
        self.tool = tool;
    }

    /// "T" shortcut: Pen → Eraser → Select → Pen.
    pub fn cycle_tool(&mut self) {
        self.set_tool(self.tool.next());
    }

    /// Reset all transient gesture state. A nascent (uncaptured) selection
    /// drag is discarded; a pending captured selection survives untouched.
    ///
    /// Also the window-blur / pointer-capture-loss path: a gesture abandoned
    /// off-window must not leak flags into the next frame.
    pub fn abort_gesture(&mut self) {
        self.is_drawing = false;
        self.last_point = None;
        if self.is_selecting {
            self.discard_nascent_selection();
        }
        self.is_selecting = false;
        self.is_moving_selection = false;
        if let Some(sel) = &mut self.selection {
            sel.drag_offset = None;
        }
    }

    // ---- pointer handlers ------------------------------------------------

    /// Primary-button press at the projected buffer point (`None` = ray
    /// missed the parchment; the press is ignored).
    pub fn pointer_down(&mut self, point: Option<Pos2>) {
        let Some(point) = point else {
            return;
        };
        if self.tool == Tool::Select {
            self.select_down(point);
        } else {
            // Drawing and an unresolved selection cannot coexist.
            self.finalize_selection();
            self.is_drawing = true;
            self.last_point = Some(point);
            self.draw_point(point);
        }
    }

    /// Pointer motion. A `None` point (ray off the parchment) skips the
    /// sample without ending the gesture; `last_point` survives, so a stroke
    /// that leaves and re-enters the surface stitches across the gap.
    pub fn pointer_move(&mut self, point: Option<Pos2>) {
        let Some(point) = point else {
            return;
        };
        if self.tool == Tool::Select {
            if self.is_selecting {
                self.select_cursor = Some(point);
                self.redraw_selection_drag();
            } else if self.is_moving_selection {
                self.move_selection(point);
            }
        } else if self.is_drawing
            && let Some(last) = self.last_point
        {
            self.draw_line(last, point);
            self.last_point = Some(point);
        }
    }

    /// Primary-button release.
    pub fn pointer_up(&mut self) {
        if self.tool == Tool::Select {
            if self.is_selecting {
                self.is_selecting = false;
                let rect = self.nascent_rect();
                if let Some(rect) = rect
                    && rect.width() > MIN_SELECTION_SIZE
                    && rect.height() > MIN_SELECTION_SIZE
                {
                    self.capture_selection(rect);
                } else {
                    self.discard_nascent_selection();
                }
            } else if self.is_moving_selection {
                // The move stops here; the selection stays pending until a
                // later finalize.
                self.is_moving_selection = false;
                if let Some(sel) = &mut self.selection {
                    sel.drag_offset = None;
                }
            }
        } else {
            self.is_drawing = false;
            self.last_point = None;
        }
    }

    /// Escape: resolve a pending selection. Merges rather than rolls back —
    /// see DESIGN.md. No-op without a selection.
    pub fn escape(&mut self) {
        self.finalize_selection();
    }

    // ---- drawing / erasing -----------------------------------------------

    fn draw_point(&mut self, point: Pos2) {
        match self.tool {
            Tool::Pen => self.canvas.stamp(&self.tip, point, PEN_ALPHA),
            Tool::Eraser => self.canvas.clear_circle(point, ERASER_RADIUS),
            Tool::Select => return,
        }
        self.drawing_dirty = true;
        self.persist();
    }

    fn draw_line(&mut self, start: Pos2, end: Pos2) {
        let delta = end - start;
        let distance = delta.length();
        match self.tool {
            Tool::Pen => {
                let steps = ((distance / PEN_STEP).floor() as u32).max(1);
                for i in 0..=steps {
                    let t = i as f32 / steps as f32;
                    let x = start.x + delta.x * t;
                    let y = start.y + delta.y * t;
                    self.stamp_counter = self.stamp_counter.wrapping_add(1);
                    let c = self.stamp_counter;
                    // Independent jitter and alpha per stamp keep the line
                    // reading as hand-drawn graphite, not a ruled stroke.
                    let jx = (canvas::stamp_hash01(x + 0.1, y + 0.2, c.wrapping_add(777)) - 0.5)
                        * STAMP_JITTER;
                    let jy = (canvas::stamp_hash01(x + 0.3, y + 0.4, c.wrapping_add(555)) - 0.5)
                        * STAMP_JITTER;
                    let alpha = 0.7 + canvas::stamp_hash01(x, y, c) * 0.3;
                    self.canvas
                        .stamp(&self.tip, Pos2::new(x + jx, y + jy), alpha);
                }
            }
            Tool::Eraser => {
                let steps = ((distance / ERASER_STEP).floor() as u32).max(1);
                for i in 0..=steps {
                    let t = i as f32 / steps as f32;
                    let point = Pos2::new(start.x + delta.x * t, start.y + delta.y * t);
                    self.canvas.clear_circle(point, ERASER_RADIUS);
                }
            }
            Tool::Select => return,
        }
        self.drawing_dirty = true;
        self.persist();
    }

    // ---- selection -------------------------------------------------------

    fn select_down(&mut self, point: Pos2) {
        if let Some(rect) = self.selection.as_ref().map(|s| s.rect) {
            if rect.contains(point) {
                // Clicked inside the pending selection: start moving it.
                if let Some(sel) = &mut self.selection {
                    sel.drag_offset = Some(point - rect.min);
                }
                self.is_moving_selection = true;
                return;
            }
            // Clicked outside: resolve the old selection, then start fresh.
            self.finalize_selection();
        }
        self.rollback = Some(self.canvas.pixels().clone());
        self.select_anchor = Some(point);
        self.select_cursor = Some(point);
        self.is_selecting = true;
    }

    fn nascent_rect(&self) -> Option<Rect> {
        Some(Rect::from_two_pos(self.select_anchor?, self.select_cursor?))
    }

    /// Redraw the dashed rectangle for an in-progress selection drag.
    fn redraw_selection_drag(&mut self) {
        let Some(rect) = self.nascent_rect() else {
            return;
        };
        self.overlay.clear_all();
        self.overlay.draw_dashed_rect(rect);
        self.overlay_dirty = true;
    }

    /// Lift the pixels under `rect` out of the main buffer onto the overlay.
    fn capture_selection(&mut self, rect: Rect) {
        let pixels = self.canvas.get_region(rect);
        self.canvas.clear_region(rect);
        self.drawing_dirty = true;

        self.overlay.clear_all();
        self.overlay.put_region(&pixels, rect.min);
        self.overlay.draw_dashed_rect(rect);
        self.overlay_dirty = true;

        self.selection = Some(Selection {
            rect,
            pixels,
            rollback: self.rollback.take(),
            drag_offset: None,
        });
        self.select_anchor = None;
        self.select_cursor = None;
    }

    fn discard_nascent_selection(&mut self) {
        self.select_anchor = None;
        self.select_cursor = None;
        self.rollback = None;
        self.overlay.clear_all();
        self.overlay_dirty = true;
    }

    /// Drag a pending selection: rectangle origin follows the pointer minus
    /// the grab offset, size stays fixed. Only the overlay changes — the
    /// main buffer is untouched until finalize.
    fn move_selection(&mut self, point: Pos2) {
        let Some(sel) = &mut self.selection else {
            return;
        };
        let Some(offset) = sel.drag_offset else {
            return;
        };
        sel.rect = Rect::from_min_size(point - offset, sel.rect.size());

        self.overlay.clear_all();
        self.overlay.put_region(&sel.pixels, sel.rect.min);
        self.overlay.draw_dashed_rect(sel.rect);
        self.overlay_dirty = true;
    }

    /// Merge a pending selection back into the main buffer at its current
    /// rectangle (source-over: transparent snapshot texels leave the buffer
    /// alone), clear the overlay and persist. No-op without a selection.
    pub fn finalize_selection(&mut self) {
        let Some(sel) = self.selection.take() else {
            return;
        };
        self.canvas.blend_region(&sel.pixels, sel.rect.min);
        self.overlay.clear_all();
        self.is_selecting = false;
        self.is_moving_selection = false;
        self.rollback = None;
        self.drawing_dirty = true;
        self.overlay_dirty = true;
        self.persist();
    }

    // ---- clear -----------------------------------------------------------

    /// "C": wipe both layers, drop all selection and gesture state, remove
    /// the persisted record. Idempotent.
    pub fn clear(&mut self) {
        self.canvas.clear_all();
        self.overlay.clear_all();
        self.selection = None;
        self.rollback = None;
        self.select_anchor = None;
        self.select_cursor = None;
        self.is_drawing = false;
        self.is_selecting = false;
        self.is_moving_selection = false;
        self.last_point = None;
        self.drawing_dirty = true;
        self.overlay_dirty = true;
        if let Err(e) = self.store.remove(MAP_RECORD_KEY) {
            log_warn!("map record remove failed: {}", e);
        }
    }

    // ---- persistence -----------------------------------------------------

    /// Write the drawing layer to the store. Best-effort: a failure is
    /// logged and the gesture continues on the in-memory buffer.
    fn persist(&mut self) {
        match store::encode_record(&self.canvas) {
            Ok(record) => {
                if let Err(e) = self.store.set(MAP_RECORD_KEY, &record) {
                    log_warn!("map save failed: {}", e);
                }
            }
            Err(e) => log_warn!("map encode failed: {}", e),
        }
    }
}

impl Drawable for MapEditor {
    fn texture(&self) -> &RgbaImage {
        self.canvas.pixels()
    }

    fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.drawing_dirty)
    }
}
