use std::path::PathBuf;

use crate::platform;

/// Harness configuration, persisted as a `key=value` file.
///
/// Location:
///   Linux:    `~/.config/Mapquill/mapquill_settings.cfg` (XDG respected)
///   Windows:  `%APPDATA%\Mapquill\mapquill_settings.cfg`
///   macOS:    `~/Library/Application Support/Mapquill/mapquill_settings.cfg`
///
/// Loading is lenient: a missing or corrupt file yields defaults, unknown
/// keys are skipped, so settings from older versions never block start-up.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    /// Drawing buffer dimensions.
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// PNG to show under the ink. Empty → procedural parchment fill.
    pub base_map_path: String,
    /// Override for the store directory. Empty → OS data dir.
    pub storage_dir: String,
    /// Whether the session starts with the map raised for drawing.
    pub start_map_up: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            canvas_width: 512,
            canvas_height: 512,
            base_map_path: String::new(),
            storage_dir: String::new(),
            start_map_up: true,
        }
    }
}

impl Settings {
    pub(crate) fn settings_path() -> PathBuf {
        let dir = platform::config_dir().join("Mapquill");
        let _ = std::fs::create_dir_all(&dir);
        dir.join("mapquill_settings.cfg")
    }

    /// Save settings to disk. Best-effort; failures are ignored by callers
    /// after logging.
    pub fn save(&self) -> Result<(), String> {
        let content = format!(
            "canvas_width={}\n\
             canvas_height={}\n\
             base_map_path={}\n\
             storage_dir={}\n\
             start_map_up={}\n",
            self.canvas_width,
            self.canvas_height,
            self.base_map_path,
            self.storage_dir,
            self.start_map_up,
        );
        std::fs::write(Self::settings_path(), content)
            .map_err(|e| format!("settings save failed: {}", e))
    }

    /// Load settings from disk (defaults if the file is missing or corrupt).
    pub fn load() -> Self {
        let Ok(content) = std::fs::read_to_string(Self::settings_path()) else {
            return Self::default();
        };
        Self::parse(&content)
    }

    /// Parse the `key=value` settings format.
    pub fn parse(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let Some((key, val)) = line.split_once('=') else {
                continue;
            };
            let val = val.trim();
            match key.trim() {
                "canvas_width" => {
                    if let Ok(v) = val.parse::<u32>()
                        && v > 0
                    {
                        s.canvas_width = v;
                    }
                }
                "canvas_height" => {
                    if let Ok(v) = val.parse::<u32>()
                        && v > 0
                    {
                        s.canvas_height = v;
                    }
                }
                "base_map_path" => s.base_map_path = val.to_string(),
                "storage_dir" => s.storage_dir = val.to_string(),
                "start_map_up" => s.start_map_up = val == "true",
                _ => {}
            }
        }
        s
    }
}
