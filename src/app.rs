use eframe::egui;
use egui::{Color32, Pos2, Rect, Sense, TextureFilter, TextureOptions};
use image::RgbaImage;

use crate::canvas::{MapCanvas, stamp_hash01};
use crate::compositor;
use crate::editor::{Drawable, MapEditor, Tool};
use crate::log_warn;
use crate::projector::{self, Camera, MapSurface, Vec3};
use crate::settings::Settings;
use crate::store::FileStore;

/// Vertical field of view of the harness camera (60°).
const CAMERA_FOV_Y: f32 = std::f32::consts::PI / 3.0;

/// Tilt of the lowered map, radians from vertical.
const MAP_DOWN_TILT: f32 = 1.15;

// ============================================================================
// MAPQUILL APP — hosts the editor on a parchment quad in a 3D scene
// ============================================================================

pub struct MapquillApp {
    editor: MapEditor,
    settings: Settings,
    base_map: RgbaImage,

    camera: Camera,
    /// Billboard pose: raised in front of the camera for drawing.
    surface_up: MapSurface,
    /// Lowered pose: tilted away on the table, input ignored.
    surface_down: MapSurface,
    map_up: bool,

    composite_tex: Option<egui::TextureHandle>,
    /// Last pointer position fed to the editor, used to suppress
    /// zero-motion move events while the button is held.
    last_cursor: Option<Pos2>,
}

impl MapquillApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let settings = Settings::load();
        let store = if settings.storage_dir.is_empty() {
            FileStore::new()
        } else {
            FileStore::with_dir(settings.storage_dir.clone().into())
        };
        let editor = MapEditor::new(settings.canvas_width, settings.canvas_height, Box::new(store));
        let base_map = load_base_map(&settings);

        let camera = Camera::new(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(0.0, 1.0, 0.0),
            CAMERA_FOV_Y,
        );
        // Same 0.5 × 0.4 parchment quad in both poses.
        let surface_up = MapSurface::new(
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(0.25, 0.0, 0.0),
            Vec3::new(0.0, 0.2, 0.0),
        );
        let (tilt_sin, tilt_cos) = MAP_DOWN_TILT.sin_cos();
        let surface_down = MapSurface::new(
            Vec3::new(0.0, -0.35, -0.9),
            Vec3::new(0.25, 0.0, 0.0),
            Vec3::new(0.0, 0.2 * tilt_cos, -0.2 * tilt_sin),
        );

        Self {
            editor,
            map_up: settings.start_map_up,
            settings,
            base_map,
            camera,
            surface_up,
            surface_down,
            composite_tex: None,
            last_cursor: None,
        }
    }

    fn surface(&self) -> &MapSurface {
        if self.map_up {
            &self.surface_up
        } else {
            &self.surface_down
        }
    }

    /// Project a screen-space pointer position into buffer coordinates.
    fn project_pointer(&self, pos: Pos2, viewport: Rect) -> Option<Pos2> {
        projector::project(
            &self.camera,
            self.surface(),
            pos - viewport.min.to_vec2(),
            (viewport.width(), viewport.height()),
            self.editor.width(),
            self.editor.height(),
        )
    }

    /// Re-composite and (re-)upload the map texture when a layer changed.
    fn refresh_composite(&mut self, ctx: &egui::Context) {
        let drawing_dirty = self.editor.take_dirty();
        let overlay_dirty = self.editor.take_overlay_dirty();
        if self.composite_tex.is_some() && !drawing_dirty && !overlay_dirty {
            return;
        }
        let composite = compositor::composite(
            &self.base_map,
            self.editor.texture(),
            self.editor.overlay_texture(),
        );
        let color_image = compositor::to_color_image(&composite);
        let options = TextureOptions {
            magnification: TextureFilter::Linear,
            minification: TextureFilter::Linear,
            ..Default::default()
        };
        match &mut self.composite_tex {
            Some(tex) => tex.set(color_image, options),
            None => {
                self.composite_tex =
                    Some(ctx.load_texture("map_composite", color_image, options));
            }
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        let events = ctx.input(|i| i.events.clone());
        for event in events {
            // A gesture abandoned when the window loses focus must not leak
            // into the next frame (there is no pointer-up to end it).
            if matches!(event, egui::Event::WindowFocused(false)) {
                self.editor.abort_gesture();
                self.last_cursor = None;
                continue;
            }
            let egui::Event::Key {
                key, pressed: true, ..
            } = event
            else {
                continue;
            };
            match key {
                egui::Key::M => {
                    self.toggle_map_up();
                }
                // Drawing shortcuts only act while the map is raised.
                egui::Key::C if self.map_up => self.editor.clear(),
                egui::Key::T if self.map_up => self.editor.cycle_tool(),
                egui::Key::Escape if self.map_up => self.editor.escape(),
                _ => {}
            }
        }
    }

    fn toggle_map_up(&mut self) {
        self.map_up = !self.map_up;
        // An in-flight gesture must not survive the map being lowered
        // mid-stroke.
        if !self.map_up {
            self.editor.abort_gesture();
            self.last_cursor = None;
        }
        if self.settings.start_map_up != self.map_up {
            self.settings.start_map_up = self.map_up;
            if let Err(e) = self.settings.save() {
                log_warn!("{}", e);
            }
        }
    }

    fn handle_pointer(&mut self, ui: &egui::Ui, viewport: Rect) {
        if !self.map_up {
            return;
        }
        let (pressed, released, down, pos) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.primary_down(),
                i.pointer.latest_pos(),
            )
        });

        if pressed && let Some(pos) = pos {
            let point = self.project_pointer(pos, viewport);
            self.editor.pointer_down(point);
            self.last_cursor = Some(pos);
        } else if down && let Some(pos) = pos {
            if self.last_cursor != Some(pos) {
                let point = self.project_pointer(pos, viewport);
                self.editor.pointer_move(point);
                self.last_cursor = Some(pos);
            }
        }
        if released {
            self.editor.pointer_up();
            self.last_cursor = None;
        }
    }

    /// Draw the textured parchment quad by projecting its corners to screen.
    fn paint_map(&self, painter: &egui::Painter, viewport: Rect) {
        let Some(tex) = &self.composite_tex else {
            return;
        };
        let corners = self.surface().corners();
        let mut screen = [Pos2::ZERO; 4];
        for (i, corner) in corners.iter().enumerate() {
            let Some(p) = world_to_screen(&self.camera, *corner, viewport) else {
                return; // Corner behind the camera: skip the frame.
            };
            screen[i] = p;
        }

        // Corner order is BL, BR, TR, TL; image row 0 is the map's top edge,
        // so texture v flips against surface v.
        let uvs = [
            Pos2::new(0.0, 1.0),
            Pos2::new(1.0, 1.0),
            Pos2::new(1.0, 0.0),
            Pos2::new(0.0, 0.0),
        ];
        let mut mesh = egui::Mesh::with_texture(tex.id());
        for (pos, uv) in screen.iter().zip(uvs.iter()) {
            mesh.vertices.push(egui::epaint::Vertex {
                pos: *pos,
                uv: *uv,
                color: Color32::WHITE,
            });
        }
        mesh.indices.extend_from_slice(&[0, 1, 2, 0, 2, 3]);
        painter.add(egui::Shape::mesh(mesh));
    }

    fn tool_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("tools")
            .resizable(false)
            .default_width(120.0)
            .show(ctx, |ui| {
                ui.heading("Mapquill");
                ui.separator();
                for tool in Tool::all() {
                    if ui
                        .selectable_label(self.editor.tool() == *tool, tool.label())
                        .clicked()
                    {
                        self.editor.set_tool(*tool);
                    }
                }
                ui.separator();
                if ui.button("Clear map").clicked() {
                    self.editor.clear();
                }
                if ui
                    .button(if self.map_up { "Lower map" } else { "Raise map" })
                    .clicked()
                {
                    self.toggle_map_up();
                }
                ui.separator();
                ui.label(format!("Tool: {}", self.editor.tool().label()));
                ui.small("C clear · T cycle tool");
                ui.small("Esc merge selection · M raise/lower");
            });
    }
}

impl eframe::App for MapquillApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_keys(ctx);
        self.tool_panel(ctx);

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(Color32::from_rgb(24, 20, 16)))
            .show(ctx, |ui| {
                let (response, painter) =
                    ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
                let viewport = response.rect;
                self.handle_pointer(ui, viewport);
                self.refresh_composite(ctx);
                self.paint_map(&painter, viewport);
            });
    }
}

// ============================================================================
// SCENE HELPERS
// ============================================================================

/// Project a world-space point to viewport coordinates with the same
/// perspective the pointer ray uses. `None` when the point is behind the
/// camera.
fn world_to_screen(camera: &Camera, world: Vec3, viewport: Rect) -> Option<Pos2> {
    let rel = world - camera.position;
    let cam_z = rel.dot(camera.forward);
    if cam_z <= 0.001 {
        return None;
    }
    let right = camera.right();
    let up = right.cross(camera.forward).norm();
    let aspect = viewport.width() / viewport.height();
    let half_fov_tan = (camera.fov_y / 2.0).tan();
    let ndc_x = rel.dot(right) / (cam_z * half_fov_tan * aspect);
    let ndc_y = rel.dot(up) / (cam_z * half_fov_tan);
    Some(Pos2::new(
        viewport.min.x + (ndc_x + 1.0) / 2.0 * viewport.width(),
        viewport.min.y + (1.0 - ndc_y) / 2.0 * viewport.height(),
    ))
}

/// Load the configured base map, or fall back to a procedural parchment
/// fill so the editor is usable with no assets on disk.
fn load_base_map(settings: &Settings) -> RgbaImage {
    if !settings.base_map_path.is_empty() {
        match std::fs::read(&settings.base_map_path)
            .map_err(|e| format!("cannot read {}: {}", settings.base_map_path, e))
            .and_then(|bytes| MapCanvas::from_png_bytes(&bytes))
        {
            Ok(canvas) => return canvas.pixels().clone(),
            Err(e) => log_warn!("base map load failed, using parchment fill: {}", e),
        }
    }
    parchment_fill(settings.canvas_width, settings.canvas_height)
}

/// Flat parchment: warm base tone, per-pixel grain, edges burnt slightly
/// darker.
fn parchment_fill(width: u32, height: u32) -> RgbaImage {
    let mut img = RgbaImage::new(width, height);
    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;
    let max_dist = (cx * cx + cy * cy).sqrt();
    for (x, y, px) in img.enumerate_pixels_mut() {
        let grain = (stamp_hash01(x as f32, y as f32, 7) - 0.5) * 14.0;
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        let edge = ((dx * dx + dy * dy).sqrt() / max_dist).powi(3) * 28.0;
        let shade = |c: f32| (c + grain - edge).clamp(0.0, 255.0) as u8;
        *px = image::Rgba([shade(214.0), shade(196.0), shade(158.0), 255]);
    }
    img
}
