use egui::pos2;
use mapquill::projector::{self, Camera, MapSurface, Vec3};

const FOV_60: f32 = std::f32::consts::PI / 3.0;

fn camera() -> Camera {
    Camera::new(
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, -1.0),
        Vec3::new(0.0, 1.0, 0.0),
        FOV_60,
    )
}

/// 0.5 × 0.4 parchment quad facing the camera one unit away.
fn quad() -> MapSurface {
    MapSurface::new(
        Vec3::new(0.0, 0.0, -1.0),
        Vec3::new(0.25, 0.0, 0.0),
        Vec3::new(0.0, 0.2, 0.0),
    )
}

#[test]
fn center_of_screen_maps_to_center_of_buffer() {
    let point = projector::project(&camera(), &quad(), pos2(400.0, 300.0), (800.0, 600.0), 512, 512)
        .expect("center ray hits the quad");
    assert!((point.x - 256.0).abs() < 0.01);
    assert!((point.y - 256.0).abs() < 0.01);
}

#[test]
fn v_axis_is_flipped() {
    // A pointer in the upper half of the screen hits the upper half of the
    // quad, which is the *low-y* half of the image buffer.
    let point = projector::project(&camera(), &quad(), pos2(400.0, 200.0), (800.0, 600.0), 512, 512)
        .expect("ray hits the quad");
    assert!((point.x - 256.0).abs() < 0.01);
    assert!(point.y < 256.0);

    let lower = projector::project(&camera(), &quad(), pos2(400.0, 400.0), (800.0, 600.0), 512, 512)
        .expect("ray hits the quad");
    assert!(lower.y > 256.0);
    // Symmetric pointer positions land symmetrically around the middle row.
    assert!((point.y + lower.y - 512.0).abs() < 0.5);
}

#[test]
fn pointer_off_the_quad_misses() {
    // Screen corner: the ray passes well outside the 0.5 × 0.4 quad.
    assert!(
        projector::project(&camera(), &quad(), pos2(5.0, 5.0), (800.0, 600.0), 512, 512).is_none()
    );
}

#[test]
fn ray_parallel_to_surface_misses() {
    // Camera looking along +x, quad normal along z: center ray is parallel.
    let cam = Camera::new(
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        FOV_60,
    );
    assert!(quad().intersect(cam.position, Vec3::new(1.0, 0.0, 0.0)).is_none());
}

#[test]
fn surface_behind_the_camera_misses() {
    let behind = MapSurface::new(
        Vec3::new(0.0, 0.0, 1.0),
        Vec3::new(0.25, 0.0, 0.0),
        Vec3::new(0.0, 0.2, 0.0),
    );
    assert!(
        projector::project(&camera(), &behind, pos2(400.0, 300.0), (800.0, 600.0), 512, 512)
            .is_none()
    );
}

#[test]
fn quad_edges_map_to_uv_extremes() {
    let q = quad();
    // Straight at the right edge midpoint.
    let dir = (Vec3::new(0.25, 0.0, -1.0)).norm();
    let (u, v) = q.intersect(Vec3::new(0.0, 0.0, 0.0), dir).expect("edge hit");
    assert!((u - 1.0).abs() < 1e-4);
    assert!((v - 0.5).abs() < 1e-4);
    // Straight at the top edge midpoint.
    let dir = (Vec3::new(0.0, 0.2, -1.0)).norm();
    let (u, v) = q.intersect(Vec3::new(0.0, 0.0, 0.0), dir).expect("edge hit");
    assert!((u - 0.5).abs() < 1e-4);
    assert!((v - 1.0).abs() < 1e-4);
}

#[test]
fn tilted_quad_still_reports_uv() {
    // The lowered "on the table" pose: tilted away around the x axis.
    let (s, c) = 1.15_f32.sin_cos();
    let tilted = MapSurface::new(
        Vec3::new(0.0, -0.35, -0.9),
        Vec3::new(0.25, 0.0, 0.0),
        Vec3::new(0.0, 0.2 * c, -0.2 * s),
    );
    let (u, v) = tilted
        .intersect(Vec3::new(0.0, 0.0, 0.0), (tilted.center - Vec3::new(0.0, 0.0, 0.0)).norm())
        .expect("center ray hits");
    assert!((u - 0.5).abs() < 1e-4);
    assert!((v - 0.5).abs() < 1e-4);
}
