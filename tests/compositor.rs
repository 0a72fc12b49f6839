use image::{Rgba, RgbaImage};
use mapquill::compositor::{self, INK_OPACITY};

fn solid(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
    let mut img = RgbaImage::new(width, height);
    for p in img.pixels_mut() {
        *p = Rgba(color);
    }
    img
}

#[test]
fn empty_layers_pass_the_base_through() {
    let base = solid(4, 4, [120, 90, 60, 255]);
    let drawing = RgbaImage::new(4, 4);
    let overlay = RgbaImage::new(4, 4);
    let out = compositor::composite(&base, &drawing, &overlay);
    assert_eq!(out.as_raw(), base.as_raw());
}

#[test]
fn opaque_ink_mixes_at_eighty_percent() {
    // mix(base, drawing, 1.0 * 0.8) per channel.
    let base = solid(2, 2, [100, 100, 100, 255]);
    let drawing = solid(2, 2, [0, 0, 0, 255]);
    let overlay = RgbaImage::new(2, 2);
    let out = compositor::composite(&base, &drawing, &overlay);
    let px = out.get_pixel(0, 0);
    assert_eq!(px[0], 20); // 100 * 0.2 + 0 * 0.8
    assert_eq!(px[1], 20);
    assert_eq!(px[2], 20);
    assert_eq!(px[3], 255);
}

#[test]
fn half_alpha_ink_scales_the_mix() {
    let base = solid(1, 1, [200, 0, 0, 255]);
    let drawing = solid(1, 1, [0, 0, 0, 128]);
    let overlay = RgbaImage::new(1, 1);
    let out = compositor::composite(&base, &drawing, &overlay);
    // t = 128/255 * 0.8 ≈ 0.4016 → r ≈ 200 * (1 - t) ≈ 119.7
    let expected = (200.0 * (1.0 - 128.0 / 255.0 * INK_OPACITY)).round() as u8;
    assert_eq!(out.get_pixel(0, 0)[0], expected);
}

#[test]
fn opaque_overlay_wins_over_everything() {
    let base = solid(2, 2, [10, 10, 10, 255]);
    let drawing = solid(2, 2, [200, 200, 200, 255]);
    let overlay = solid(2, 2, [0, 0, 0, 255]);
    let out = compositor::composite(&base, &drawing, &overlay);
    assert_eq!(*out.get_pixel(1, 1), Rgba([0, 0, 0, 255]));
}

#[test]
fn base_of_different_resolution_is_sampled_per_uv() {
    // Left half red, right half blue, at half the drawing resolution.
    let mut base = RgbaImage::new(2, 2);
    base.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
    base.put_pixel(0, 1, Rgba([255, 0, 0, 255]));
    base.put_pixel(1, 0, Rgba([0, 0, 255, 255]));
    base.put_pixel(1, 1, Rgba([0, 0, 255, 255]));
    let drawing = RgbaImage::new(4, 4);
    let overlay = RgbaImage::new(4, 4);
    let out = compositor::composite(&base, &drawing, &overlay);
    assert_eq!(*out.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
    assert_eq!(*out.get_pixel(1, 3), Rgba([255, 0, 0, 255]));
    assert_eq!(*out.get_pixel(2, 0), Rgba([0, 0, 255, 255]));
    assert_eq!(*out.get_pixel(3, 3), Rgba([0, 0, 255, 255]));
}

#[test]
fn output_matches_drawing_layer_dimensions() {
    let base = solid(100, 80, [1, 2, 3, 255]);
    let drawing = RgbaImage::new(512, 512);
    let overlay = RgbaImage::new(512, 512);
    let out = compositor::composite(&base, &drawing, &overlay);
    assert_eq!(out.dimensions(), (512, 512));
}

#[test]
fn wgsl_source_carries_the_same_blend() {
    // The GPU variant must express the identical mix; keep the constants in
    // sync with the CPU path.
    let src = mapquill::shaders::MAP_COMPOSITE_SHADER;
    assert!(src.contains("drawing_color.a * 0.8"));
    assert!(src.contains("mix(combined, overlay_color, overlay_color.a)"));
    assert!((INK_OPACITY - 0.8).abs() < f32::EPSILON);
}
