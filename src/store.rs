//! Durable key-value persistence for the drawn map.
//!
//! One fixed key, one value: the whole drawing layer as a base64 PNG data
//! URI. Reads happen once at editor start-up, writes after every completed
//! mutation, removal on clear. Durability is best-effort — the in-memory
//! buffer is the source of truth and a failed write must never interrupt a
//! gesture.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use base64::Engine;

use crate::canvas::MapCanvas;
use crate::platform;

/// Storage key of the persisted map record.
pub const MAP_RECORD_KEY: &str = "dungeon-map-drawing-data";

const DATA_URI_PREFIX: &str = "data:image/png;base64,";

// ============================================================================
// RECORD CODEC
// ============================================================================

/// Encode a canvas as a `data:image/png;base64,…` record.
pub fn encode_record(canvas: &MapCanvas) -> Result<String, String> {
    let png = canvas.to_png_bytes()?;
    Ok(format!(
        "{}{}",
        DATA_URI_PREFIX,
        base64::engine::general_purpose::STANDARD.encode(&png)
    ))
}

/// Decode a persisted record back into a canvas.
///
/// Accepts the data-URI form written by [`encode_record`] and, leniently,
/// bare base64 PNG payloads.
pub fn decode_record(record: &str) -> Result<MapCanvas, String> {
    let payload = record.strip_prefix(DATA_URI_PREFIX).unwrap_or(record);
    let png = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| format!("map record is not valid base64: {}", e))?;
    MapCanvas::from_png_bytes(&png)
}

// ============================================================================
// STORE TRAIT + IMPLEMENTATIONS
// ============================================================================

/// Durable key-value store the editor persists through.
pub trait MapStore {
    /// Fetch a value; `Ok(None)` when the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>, String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), String>;
    /// Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), String>;
}

/// File-backed store: one file per key under a store directory.
///
/// Default location is `<OS data dir>/Mapquill/store`; the CLI and tests can
/// point it elsewhere.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new() -> Self {
        Self::with_dir(platform::data_dir().join("Mapquill").join("store"))
    }

    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        // Keys are fixed strings chosen by this crate, but sanitize anyway so
        // a hostile key can't escape the store directory.
        let safe: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.dat", safe))
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MapStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, String> {
        match fs::read_to_string(self.key_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(format!("store read failed for '{}': {}", key, e)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| format!("store dir {:?} unavailable: {}", self.dir, e))?;
        fs::write(self.key_path(key), value)
            .map_err(|e| format!("store write failed for '{}': {}", key, e))
    }

    fn remove(&mut self, key: &str) -> Result<(), String> {
        match fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(format!("store remove failed for '{}': {}", key, e)),
        }
    }
}

/// In-memory store for tests and headless experiments.
#[derive(Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MapStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, String> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), String> {
        self.values.remove(key);
        Ok(())
    }
}
