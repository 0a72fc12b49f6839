//! Mapquill — the parchment-map raster editor of a dungeon cartographer.
//!
//! The player draws on an in-scene map quad: a freehand pen with a
//! hand-drawn texture, a circular eraser, a rectangular select/move tool,
//! and a clear command, persisted between sessions as a PNG record. The
//! crate owns the pixel pipeline end to end — pointer ray → surface UV →
//! buffer mutation → layer compositing — while the host scene supplies
//! camera, quad placement and raw input.

#![allow(clippy::too_many_arguments)]

pub mod app;
pub mod canvas;
pub mod cli;
pub mod compositor;
pub mod editor;
pub mod logger;
pub mod platform;
pub mod projector;
pub mod settings;
pub mod shaders;
pub mod store;

pub use canvas::MapCanvas;
pub use editor::{Drawable, MapEditor, Selection, Tool};
pub use projector::{Camera, MapSurface};
pub use settings::Settings;
pub use store::{FileStore, MAP_RECORD_KEY, MapStore, MemoryStore};
