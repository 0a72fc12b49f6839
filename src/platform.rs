//! Platform directory lookup shared by the logger, the settings file and the
//! file-backed map store.

use std::path::PathBuf;

/// OS user-data directory (without the app sub-folder).
///
/// Windows: `%APPDATA%`; macOS: `~/Library/Application Support`;
/// Linux: `$XDG_DATA_HOME` or `~/.local/share`. Falls back to the current
/// working directory when no environment is available.
pub fn data_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata);
        }
    }
    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support");
        }
    }
    // Linux / fallback
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    PathBuf::from(".")
}

/// OS user-config directory (without the app sub-folder).
///
/// Windows and macOS keep config next to data; Linux honours
/// `$XDG_CONFIG_HOME` and defaults to `~/.config`.
pub fn config_dir() -> PathBuf {
    #[cfg(any(target_os = "windows", target_os = "macos"))]
    {
        return data_dir();
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg);
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(".config");
        }
        PathBuf::from(".")
    }
}
