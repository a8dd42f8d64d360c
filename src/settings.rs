//! Persisted user settings, TOML-backed.
//!
//! Every struct implements `Default` and carries `#[serde(default)]`, so a
//! missing or partial `settings.toml` merges over the defaults. Loading
//! never fails: an unreadable or invalid file logs a warning and yields the
//! defaults.
//!
//! The filtering core consumes `privacy.adblock_enabled` at startup
//! ([`crate::adblock::AdBlocker::from_settings`]); the shell writes the new
//! value back through [`Settings::save`] on toggle.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::profile;

const SETTINGS_FILE: &str = "settings.toml";

// ─────────────────────────────────────────────────────────────────────────────
// Settings structs
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub appearance: AppearanceSettings,
    pub privacy: PrivacySettings,
    pub downloads: DownloadSettings,
    pub search: SearchSettings,
}

/// Startup and tab behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// `"homepage"`, `"newtab"` or `"restore"`.
    pub startup_behavior: String,
    pub homepage_url: String,
    pub newtab_url: String,
    pub confirm_close_tabs: bool,
    pub open_links_new_tab: bool,
    /// Minutes of inactivity before a background tab is suspended.
    pub tab_suspension_timeout: u32,
}

/// Theme and layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceSettings {
    pub theme: String,
    pub accent_color: String,
    pub show_bookmarks_bar: bool,
    pub compact_mode: bool,
    pub font_size: String,
    pub default_zoom: String,
}

/// Privacy toggles. `adblock_enabled` seeds the filtering core's flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacySettings {
    pub adblock_enabled: bool,
    pub block_trackers: bool,
    pub anti_fingerprinting: bool,
    pub fingerprint_level: String,
    pub do_not_track: bool,
    pub block_third_party_cookies: bool,
    pub clear_on_exit: bool,
}

/// Download behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    /// Empty = platform default downloads directory.
    pub download_path: String,
    pub ask_download_location: bool,
    pub download_notifications: bool,
    pub auto_open_downloads: bool,
}

/// Address-bar search behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub default_engine: String,
    pub search_suggestions: bool,
    pub history_suggestions: bool,
    pub bookmark_suggestions: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Default impls — match the original application's defaults
// ─────────────────────────────────────────────────────────────────────────────

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            startup_behavior: "homepage".to_string(),
            homepage_url: "https://www.google.com".to_string(),
            newtab_url: "https://www.google.com".to_string(),
            confirm_close_tabs: true,
            open_links_new_tab: true,
            tab_suspension_timeout: 30,
        }
    }
}

impl Default for AppearanceSettings {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
            accent_color: "#4a9eff".to_string(),
            show_bookmarks_bar: false,
            compact_mode: false,
            font_size: "medium".to_string(),
            default_zoom: "1".to_string(),
        }
    }
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            adblock_enabled: true,
            block_trackers: true,
            anti_fingerprinting: true,
            fingerprint_level: "standard".to_string(),
            do_not_track: true,
            block_third_party_cookies: true,
            clear_on_exit: false,
        }
    }
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            download_path: String::new(),
            ask_download_location: false,
            download_notifications: true,
            auto_open_downloads: true,
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_engine: "google".to_string(),
            search_suggestions: true,
            history_suggestions: true,
            bookmark_suggestions: true,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Loading and saving
// ─────────────────────────────────────────────────────────────────────────────

impl Settings {
    /// Loads settings from the profile directory.
    pub fn load() -> Self {
        Self::load_from(profile::file(SETTINGS_FILE))
    }

    /// Loads settings from an explicit path. Never panics — returns defaults
    /// if the file is missing, unreadable, or invalid.
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.is_file() {
            info!("No settings file found, using defaults");
            return Settings::default();
        }
        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<Settings>(&content) {
                Ok(settings) => {
                    info!(path = %path.display(), "Settings loaded");
                    settings
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Invalid settings, using defaults");
                    Settings::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot read settings, using defaults");
                Settings::default()
            }
        }
    }

    /// Saves settings to the profile directory.
    pub fn save(&self) -> io::Result<()> {
        self.save_to(profile::file(SETTINGS_FILE))
    }

    /// Saves settings to an explicit path, creating parent directories.
    pub fn save_to(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(io::Error::other)?;
        fs::write(path, content)?;
        info!(path = %path.display(), "Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_original_values() {
        let s = Settings::default();
        assert_eq!(s.general.startup_behavior, "homepage");
        assert_eq!(s.general.homepage_url, "https://www.google.com");
        assert_eq!(s.general.tab_suspension_timeout, 30);
        assert_eq!(s.appearance.theme, "dark");
        assert_eq!(s.appearance.accent_color, "#4a9eff");
        assert!(s.privacy.adblock_enabled);
        assert!(s.privacy.block_trackers);
        assert!(!s.privacy.clear_on_exit);
        assert!(s.downloads.download_path.is_empty());
        assert_eq!(s.search.default_engine, "google");
    }

    #[test]
    fn test_empty_toml_returns_defaults() {
        let s: Settings = toml::from_str("").unwrap();
        assert!(s.privacy.adblock_enabled);
        assert_eq!(s.appearance.theme, "dark");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let toml = r#"
[privacy]
adblock_enabled = false
"#;
        let s: Settings = toml::from_str(toml).unwrap();
        assert!(!s.privacy.adblock_enabled);
        assert!(s.privacy.block_trackers); // default
        assert_eq!(s.general.homepage_url, "https://www.google.com"); // default
    }

    #[test]
    fn test_roundtrip_preserves_values() {
        let mut s = Settings::default();
        s.privacy.adblock_enabled = false;
        s.appearance.theme = "light".to_string();
        let serialized = toml::to_string_pretty(&s).unwrap();
        let back: Settings = toml::from_str(&serialized).unwrap();
        assert!(!back.privacy.adblock_enabled);
        assert_eq!(back.appearance.theme, "light");
        assert_eq!(back.search.default_engine, "google");
    }

    #[test]
    fn test_save_and_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let mut s = Settings::default();
        s.privacy.adblock_enabled = false;
        s.save_to(&path).unwrap();

        let back = Settings::load_from(&path);
        assert!(!back.privacy.adblock_enabled);
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let s = Settings::load_from("/nonexistent/aegis/settings.toml");
        assert!(s.privacy.adblock_enabled);
    }

    #[test]
    fn test_load_invalid_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "not [ valid toml").unwrap();
        let s = Settings::load_from(&path);
        assert!(s.privacy.adblock_enabled);
    }
}
