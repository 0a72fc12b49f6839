use egui::{Pos2, Rect};
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, Rgba, RgbaImage};

// ============================================================================
// INK CONSTANTS
// ============================================================================

/// Pen ink — the dark sepia of the parchment map.
pub const INK_COLOR: [u8; 3] = [80, 52, 25];

/// Global stamp opacity for a single pen mark.
pub const PEN_ALPHA: f32 = 0.8;

/// Eraser radius in buffer pixels.
pub const ERASER_RADIUS: f32 = 8.0;

/// Edge length of the square pen tip mask.
pub const PEN_TIP_SIZE: u32 = 3;

/// Dash pattern of the selection rectangle: 5 px on, 3 px off.
const DASH_ON: u32 = 5;
const DASH_OFF: u32 = 3;

// ============================================================================
// STAMP HASH — deterministic per-stamp randomness
// ============================================================================

/// Integer hash of a stamp position plus a running counter.
///
/// Drives the positional jitter and alpha variation of pen stamps without a
/// PRNG: the same stroke replayed at the same coordinates produces the same
/// marks, which keeps tests and headless runs reproducible.
pub fn stamp_hash(x: f32, y: f32, counter: u32) -> u32 {
    let ix = (x * 100.0) as u32;
    let iy = (y * 100.0) as u32;
    let mut h = ix
        .wrapping_mul(374761393)
        .wrapping_add(iy.wrapping_mul(668265263))
        .wrapping_add(counter.wrapping_mul(1013904223));
    h ^= h >> 13;
    h = h.wrapping_mul(1274126177);
    h ^= h >> 16;
    h
}

/// Hash folded to [0, 1).
pub fn stamp_hash01(x: f32, y: f32, counter: u32) -> f32 {
    stamp_hash(x, y, counter) as f32 / u32::MAX as f32
}

// ============================================================================
// PEN TIP — precomputed soft mark
// ============================================================================

/// Small alpha mask stamped along pen strokes.
///
/// A radial falloff (1.0 at the center, 0.8 halfway, 0 at the edge) with a
/// touch of per-texel noise, so repeated stamps read as graphite on paper
/// rather than a uniform dot.
pub struct PenTip {
    size: u32,
    alpha: Vec<f32>,
}

impl PenTip {
    pub fn new() -> Self {
        let size = PEN_TIP_SIZE;
        let half = size as f32 / 2.0;
        let mut alpha = Vec::with_capacity((size * size) as usize);
        for ty in 0..size {
            for tx in 0..size {
                let dx = tx as f32 + 0.5 - half;
                let dy = ty as f32 + 0.5 - half;
                let t = (dx * dx + dy * dy).sqrt() / half;
                // Gradient stops: 0.0 → 1.0, 0.5 → 0.8, 1.0 → 0.0
                let base = if t <= 0.5 {
                    1.0 - 0.2 * (t / 0.5)
                } else {
                    0.8 * (1.0 - (t - 0.5) / 0.5).max(0.0)
                };
                // Texture noise, deterministic per texel
                let noise = stamp_hash01(tx as f32, ty as f32, size) * 0.3;
                alpha.push((base * (1.0 + noise)).min(1.0));
            }
        }
        Self { size, alpha }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    fn alpha_at(&self, tx: u32, ty: u32) -> f32 {
        self.alpha[(ty * self.size + tx) as usize]
    }
}

impl Default for PenTip {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// MAP CANVAS — the raster surface the editor draws on
// ============================================================================

/// An RGBA pixel buffer with the small operation set the map editor needs.
///
/// Both the drawing layer and the selection overlay are `MapCanvas` values;
/// the editor owns them exclusively and the renderer only ever reads the
/// pixels back out.
pub struct MapCanvas {
    pixels: RgbaImage,
}

impl MapCanvas {
    /// Fully transparent canvas of the given dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width.max(1), height.max(1)),
        }
    }

    pub fn from_image(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// True when every pixel is fully transparent.
    pub fn is_blank(&self) -> bool {
        self.pixels.pixels().all(|p| p[3] == 0)
    }

    // ---- codec ----------------------------------------------------------

    /// Encode the buffer as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, String> {
        let mut out = Vec::new();
        PngEncoder::new(&mut out)
            .write_image(
                self.pixels.as_raw(),
                self.pixels.width(),
                self.pixels.height(),
                ColorType::Rgba8,
            )
            .map_err(|e| format!("PNG encode error: {}", e))?;
        Ok(out)
    }

    /// Decode PNG bytes into a canvas.
    pub fn from_png_bytes(bytes: &[u8]) -> Result<Self, String> {
        let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
            .map_err(|e| format!("PNG decode error: {}", e))?;
        Ok(Self {
            pixels: img.to_rgba8(),
        })
    }

    // ---- pen / eraser ----------------------------------------------------

    /// Stamp the pen tip centered at `center`, scaled by `alpha`, source-over.
    pub fn stamp(&mut self, tip: &PenTip, center: Pos2, alpha: f32) {
        let half = tip.size() as f32 / 2.0;
        for ty in 0..tip.size() {
            for tx in 0..tip.size() {
                let px = (center.x - half + tx as f32 + 0.5).floor() as i64;
                let py = (center.y - half + ty as f32 + 0.5).floor() as i64;
                if px < 0 || py < 0 || px >= self.width() as i64 || py >= self.height() as i64 {
                    continue;
                }
                let a = tip.alpha_at(tx, ty) * alpha;
                if a <= 0.0 {
                    continue;
                }
                let src = Rgba([
                    INK_COLOR[0],
                    INK_COLOR[1],
                    INK_COLOR[2],
                    (a * 255.0).round().min(255.0) as u8,
                ]);
                let dst = self.pixels.get_pixel_mut(px as u32, py as u32);
                *dst = blend_over(src, *dst);
            }
        }
    }

    /// Remove alpha in a circle around `center` (destination-out).
    ///
    /// Fully covered pixels go transparent; the rim keeps a soft edge via
    /// fractional coverage. Never writes color, only removes alpha.
    pub fn clear_circle(&mut self, center: Pos2, radius: f32) {
        let min_x = ((center.x - radius).floor().max(0.0)) as u32;
        let min_y = ((center.y - radius).floor().max(0.0)) as u32;
        let max_x = ((center.x + radius).ceil() as i64).min(self.width() as i64 - 1);
        let max_y = ((center.y + radius).ceil() as i64).min(self.height() as i64 - 1);
        if max_x < min_x as i64 || max_y < min_y as i64 {
            return;
        }
        for y in min_y..=max_y as u32 {
            for x in min_x..=max_x as u32 {
                let dx = x as f32 + 0.5 - center.x;
                let dy = y as f32 + 0.5 - center.y;
                let dist = (dx * dx + dy * dy).sqrt();
                let coverage = (radius + 0.5 - dist).clamp(0.0, 1.0);
                if coverage <= 0.0 {
                    continue;
                }
                let p = self.pixels.get_pixel_mut(x, y);
                let a = p[3] as f32 * (1.0 - coverage);
                p[3] = a.round() as u8;
                if p[3] == 0 {
                    *p = Rgba([0, 0, 0, 0]);
                }
            }
        }
    }

    // ---- regions ---------------------------------------------------------

    /// Copy the pixels under `rect` (clamped to the canvas) into a new image.
    pub fn get_region(&self, rect: Rect) -> RgbaImage {
        let (x0, y0, w, h) = self.clamp_rect(rect);
        let mut out = RgbaImage::new(w.max(1), h.max(1));
        for dy in 0..h {
            for dx in 0..w {
                out.put_pixel(dx, dy, *self.pixels.get_pixel(x0 + dx, y0 + dy));
            }
        }
        out
    }

    /// Overwrite pixels starting at `origin` with `src`, raw replace.
    ///
    /// `origin` may be negative or partially off-canvas; out-of-range texels
    /// are clipped.
    pub fn put_region(&mut self, src: &RgbaImage, origin: Pos2) {
        self.write_region(src, origin, false);
    }

    /// Source-over composite `src` starting at `origin`; transparent source
    /// texels leave the destination untouched.
    pub fn blend_region(&mut self, src: &RgbaImage, origin: Pos2) {
        self.write_region(src, origin, true);
    }

    fn write_region(&mut self, src: &RgbaImage, origin: Pos2, blend: bool) {
        let ox = origin.x.round() as i64;
        let oy = origin.y.round() as i64;
        for sy in 0..src.height() {
            let py = oy + sy as i64;
            if py < 0 || py >= self.height() as i64 {
                continue;
            }
            for sx in 0..src.width() {
                let px = ox + sx as i64;
                if px < 0 || px >= self.width() as i64 {
                    continue;
                }
                let s = *src.get_pixel(sx, sy);
                let dst = self.pixels.get_pixel_mut(px as u32, py as u32);
                *dst = if blend { blend_over(s, *dst) } else { s };
            }
        }
    }

    /// Set the pixels under `rect` fully transparent.
    pub fn clear_region(&mut self, rect: Rect) {
        let (x0, y0, w, h) = self.clamp_rect(rect);
        for dy in 0..h {
            for dx in 0..w {
                self.pixels.put_pixel(x0 + dx, y0 + dy, Rgba([0, 0, 0, 0]));
            }
        }
    }

    /// Wipe the whole canvas back to transparent.
    pub fn clear_all(&mut self) {
        for p in self.pixels.pixels_mut() {
            *p = Rgba([0, 0, 0, 0]);
        }
    }

    /// Rect → clamped integer bounds `(x0, y0, w, h)`.
    ///
    /// All region operations on the same `Rect` resolve to the same bounds,
    /// so a capture followed by a clear and a re-composite lines up exactly.
    fn clamp_rect(&self, rect: Rect) -> (u32, u32, u32, u32) {
        let x0 = rect.min.x.round().clamp(0.0, self.width() as f32) as u32;
        let y0 = rect.min.y.round().clamp(0.0, self.height() as f32) as u32;
        let x1 = rect.max.x.round().clamp(0.0, self.width() as f32) as u32;
        let y1 = rect.max.y.round().clamp(0.0, self.height() as f32) as u32;
        (x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
    }

    // ---- selection rectangle overlay -------------------------------------

    /// Draw a 1 px dashed black rectangle along the edge of `rect`.
    ///
    /// The dash phase runs continuously around the perimeter, the way a 2D
    /// path stroke would.
    pub fn draw_dashed_rect(&mut self, rect: Rect) {
        let x0 = rect.min.x.round() as i64;
        let y0 = rect.min.y.round() as i64;
        let x1 = rect.max.x.round() as i64;
        let y1 = rect.max.y.round() as i64;
        if x1 <= x0 || y1 <= y0 {
            return;
        }
        let mut phase: u32 = 0;
        let dash_pixel = |canvas: &mut Self, x: i64, y: i64, phase: u32| {
            if phase % (DASH_ON + DASH_OFF) < DASH_ON
                && x >= 0
                && y >= 0
                && x < canvas.width() as i64
                && y < canvas.height() as i64
            {
                canvas.pixels.put_pixel(x as u32, y as u32, Rgba([0, 0, 0, 255]));
            }
        };
        for x in x0..x1 {
            dash_pixel(self, x, y0, phase);
            phase += 1;
        }
        for y in y0..y1 {
            dash_pixel(self, x1, y, phase);
            phase += 1;
        }
        for x in (x0 + 1..=x1).rev() {
            dash_pixel(self, x, y1, phase);
            phase += 1;
        }
        for y in (y0 + 1..=y1).rev() {
            dash_pixel(self, x0, y, phase);
            phase += 1;
        }
    }
}

// ============================================================================
// ALPHA COMPOSITING
// ============================================================================

/// Straight-alpha source-over blend.
///
/// The fully-transparent and fully-opaque cases short-circuit to exact
/// copies, so compositing a snapshot back onto the cleared region it came
/// from reproduces the original bytes.
pub fn blend_over(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let sa = src[3] as u32;
    if sa == 0 {
        return dst;
    }
    let da = dst[3] as u32;
    if sa == 255 || da == 0 {
        return src;
    }
    let inv = 255 - sa;
    let out_a = sa + da * inv / 255;
    if out_a == 0 {
        return Rgba([0, 0, 0, 0]);
    }
    let ch = |s: u8, d: u8| -> u8 {
        let num = s as u32 * sa + d as u32 * da * inv / 255;
        (((num + out_a / 2) / out_a).min(255)) as u8
    };
    Rgba([
        ch(src[0], dst[0]),
        ch(src[1], dst[1]),
        ch(src[2], dst[2]),
        out_a as u8,
    ])
}
