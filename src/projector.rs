//! Pointer-to-surface projection.
//!
//! Converts a 2D screen pointer position into drawing-buffer coordinates:
//! build the camera ray through the pointer, intersect it with the parchment
//! quad, read back the surface-local UV of the hit. A miss is `None`, never
//! an error — the caller skips that sample and keeps the gesture alive.

use egui::Pos2;

/// Rays shallower than this against the surface plane count as parallel.
const PLANE_EPS: f32 = 1e-6;

// ============================================================================
// MINIMAL 3D VECTOR
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    #[inline]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn dot(self, o: Self) -> f32 {
        self.x * o.x + self.y * o.y + self.z * o.z
    }

    #[inline]
    pub fn cross(self, o: Self) -> Self {
        Self::new(
            self.y * o.z - self.z * o.y,
            self.z * o.x - self.x * o.z,
            self.x * o.y - self.y * o.x,
        )
    }

    #[inline]
    pub fn len_sq(self) -> f32 {
        self.dot(self)
    }

    #[inline]
    pub fn norm(self) -> Self {
        let l = self.len_sq().sqrt();
        if l == 0.0 { self } else { self * (1.0 / l) }
    }
}

impl std::ops::Add for Vec3 {
    type Output = Vec3;
    #[inline]
    fn add(self, o: Vec3) -> Vec3 {
        Vec3::new(self.x + o.x, self.y + o.y, self.z + o.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Vec3;
    #[inline]
    fn sub(self, o: Vec3) -> Vec3 {
        Vec3::new(self.x - o.x, self.y - o.y, self.z - o.z)
    }
}

impl std::ops::Mul<f32> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn mul(self, s: f32) -> Vec3 {
        Vec3::new(self.x * s, self.y * s, self.z * s)
    }
}

// ============================================================================
// CAMERA
// ============================================================================

/// Perspective camera state: position, orientation basis and vertical fov.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub position: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
}

impl Camera {
    pub fn new(position: Vec3, forward: Vec3, up: Vec3, fov_y: f32) -> Self {
        Self {
            position,
            forward: forward.norm(),
            up: up.norm(),
            fov_y,
        }
    }

    #[inline]
    pub fn right(&self) -> Vec3 {
        self.forward.cross(self.up).norm()
    }

    /// Convert a screen-space pointer position (pixels, origin top-left) into
    /// a world-space ray through that point.
    pub fn screen_to_ray(&self, screen: Pos2, viewport: (f32, f32)) -> (Vec3, Vec3) {
        let (width, height) = viewport;
        let ndc_x = (2.0 * screen.x / width) - 1.0;
        let ndc_y = 1.0 - (2.0 * screen.y / height);
        let right = self.right();
        let up = right.cross(self.forward).norm();
        let aspect = width / height;
        let half_fov_tan = (self.fov_y / 2.0).tan();
        let dir = (self.forward
            + right * (ndc_x * half_fov_tan * aspect)
            + up * (ndc_y * half_fov_tan))
            .norm();
        (self.position, dir)
    }
}

// ============================================================================
// MAP SURFACE — the parchment quad
// ============================================================================

/// The in-scene drawing quad: a center plus two half-extent axes.
///
/// `axis_u` spans half the quad width (texture u = 1 at `center + axis_u`),
/// `axis_v` half the height (texture v = 1 at `center + axis_v`, which is the
/// *top* edge — texture v grows upward).
#[derive(Clone, Copy, Debug)]
pub struct MapSurface {
    pub center: Vec3,
    pub axis_u: Vec3,
    pub axis_v: Vec3,
}

impl MapSurface {
    pub fn new(center: Vec3, axis_u: Vec3, axis_v: Vec3) -> Self {
        Self {
            center,
            axis_u,
            axis_v,
        }
    }

    #[inline]
    pub fn normal(&self) -> Vec3 {
        self.axis_u.cross(self.axis_v).norm()
    }

    /// Intersect a world-space ray with the quad.
    ///
    /// Returns the surface UV in [0, 1]² of the hit, or `None` when the ray
    /// is parallel to the plane, points away from it, or hits the plane
    /// outside the quad.
    pub fn intersect(&self, ray_origin: Vec3, ray_dir: Vec3) -> Option<(f32, f32)> {
        let normal = self.normal();
        let denom = ray_dir.dot(normal);
        if denom.abs() < PLANE_EPS {
            return None; // Ray parallel to plane
        }
        let t = (self.center - ray_origin).dot(normal) / denom;
        if t <= 0.0 {
            return None; // Behind ray origin
        }
        let rel = ray_origin + ray_dir * t - self.center;
        let u = rel.dot(self.axis_u) / self.axis_u.len_sq();
        let v = rel.dot(self.axis_v) / self.axis_v.len_sq();
        if u.abs() > 1.0 || v.abs() > 1.0 {
            return None;
        }
        Some(((u + 1.0) / 2.0, (v + 1.0) / 2.0))
    }

    /// World-space quad corners, counter-clockwise from bottom-left.
    pub fn corners(&self) -> [Vec3; 4] {
        [
            self.center - self.axis_u - self.axis_v,
            self.center + self.axis_u - self.axis_v,
            self.center + self.axis_u + self.axis_v,
            self.center - self.axis_u + self.axis_v,
        ]
    }
}

// ============================================================================
// PROJECTION
// ============================================================================

/// Project a pointer position into buffer coordinates on the drawing raster.
///
/// The v axis is flipped: image rows grow downward while texture v grows
/// upward. Dropping the flip mirrors every stroke vertically.
pub fn project(
    camera: &Camera,
    surface: &MapSurface,
    screen: Pos2,
    viewport: (f32, f32),
    buffer_width: u32,
    buffer_height: u32,
) -> Option<Pos2> {
    let (origin, dir) = camera.screen_to_ray(screen, viewport);
    let (u, v) = surface.intersect(origin, dir)?;
    Some(Pos2::new(
        u * buffer_width as f32,
        (1.0 - v) * buffer_height as f32,
    ))
}
