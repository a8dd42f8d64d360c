//! Profile directory resolution.
//!
//! All persisted profile data (settings, history, bookmarks, downloads)
//! lives in one per-user directory:
//!
//! 1. `AEGIS_PROFILE` environment variable (explicit override)
//! 2. `%APPDATA%\Aegis` on Windows
//! 3. `$XDG_CONFIG_HOME/aegis`, falling back to `~/.config/aegis`
//! 4. Current working directory as a last resort
//!
//! Stores also accept explicit paths, so tests never touch the real profile.

use std::path::PathBuf;

/// Returns the profile directory. Does not create it; callers create it
/// lazily on first write.
pub fn dir() -> PathBuf {
    if let Ok(path) = std::env::var("AEGIS_PROFILE") {
        return PathBuf::from(path);
    }
    platform_profile_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Path of a named file inside the profile directory.
pub fn file(name: &str) -> PathBuf {
    dir().join(name)
}

/// Returns the platform config directory without adding a dependency.
fn platform_profile_dir() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("APPDATA")
            .ok()
            .map(|appdata| PathBuf::from(appdata).join("Aegis"))
    }
    #[cfg(not(windows))]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .or_else(|| std::env::var("HOME").ok().map(|h| format!("{h}/.config")))
            .map(|dir| PathBuf::from(dir).join("aegis"))
    }
}
