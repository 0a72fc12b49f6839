use egui::ColorImage;
use image::RgbaImage;
use rayon::prelude::*;

/// Drawn ink never fully occludes the base map: the drawing layer is mixed
/// in at at most this fraction of its own alpha.
pub const INK_OPACITY: f32 = 0.8;

/// CPU evaluation of the map compositing stage:
///
/// ```text
/// mix(mix(base, drawing, drawing.a * 0.8), overlay, overlay.a)
/// ```
///
/// per pixel, all four channels. The output has the drawing layer's
/// dimensions; the base map is sampled at the same UV, so a base image of a
/// different resolution scales the way a texture sampler would. `overlay`
/// must match the drawing layer's dimensions (both are editor-owned layers).
///
/// Rows are composited in parallel. The WGSL source in [`crate::shaders`]
/// is the same function for embedders with a programmable pipeline; the two
/// must stay in agreement.
pub fn composite(base: &RgbaImage, drawing: &RgbaImage, overlay: &RgbaImage) -> RgbaImage {
    let width = drawing.width();
    let height = drawing.height();
    debug_assert_eq!(overlay.dimensions(), drawing.dimensions());

    let mut out = vec![0u8; (width * height * 4) as usize];
    let row_len = (width * 4) as usize;

    out.par_chunks_mut(row_len).enumerate().for_each(|(y, row)| {
        let y = y as u32;
        let base_y = (y as u64 * base.height() as u64 / height as u64) as u32;
        for x in 0..width {
            let base_x = (x as u64 * base.width() as u64 / width as u64) as u32;
            let b = base.get_pixel(base_x, base_y).0;
            let d = drawing.get_pixel(x, y).0;
            let o = overlay.get_pixel(x, y).0;

            let t_draw = d[3] as f32 / 255.0 * INK_OPACITY;
            let t_over = o[3] as f32 / 255.0;

            let px = &mut row[(x * 4) as usize..(x * 4 + 4) as usize];
            for c in 0..4 {
                let combined = mix(b[c], d[c], t_draw);
                px[c] = (mix_f(combined, o[c] as f32, t_over)).round() as u8;
            }
        }
    });

    RgbaImage::from_raw(width, height, out).unwrap_or_else(|| RgbaImage::new(width, height))
}

#[inline]
fn mix(a: u8, b: u8, t: f32) -> f32 {
    a as f32 * (1.0 - t) + b as f32 * t
}

#[inline]
fn mix_f(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

/// Repack a composited image for egui texture upload.
pub fn to_color_image(img: &RgbaImage) -> ColorImage {
    ColorImage::from_rgba_unmultiplied(
        [img.width() as usize, img.height() as usize],
        img.as_raw(),
    )
}
