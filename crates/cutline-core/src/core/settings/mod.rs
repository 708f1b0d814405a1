//! Settings Persistence System
//!
//! Provides persistent application settings with:
//! - Atomic file writes (temp file + rename)
//! - Tolerant normalization with defaults
//! - Advisory locking against concurrent writers
//!
//! Storage location: {config_dir}/cutline/settings.json

use std::fs;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::fs::atomic_write_json_pretty;
use crate::core::{CoreError, CoreResult};

/// Settings schema version for migration support
pub const SETTINGS_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE: &str = "settings.json";

/// Lock file name (advisory lock to prevent concurrent writers)
pub const SETTINGS_LOCK_FILE: &str = "settings.json.lock";

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Schema version for migrations
    #[serde(default = "default_version")]
    pub version: u32,

    /// Timeline zoom and ruler settings
    #[serde(default)]
    pub timeline: TimelineSettings,

    /// External media tool settings
    #[serde(default)]
    pub media: MediaSettings,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            timeline: TimelineSettings::default(),
            media: MediaSettings::default(),
        }
    }
}

impl AppSettings {
    /// Normalizes and clamps settings so persisted state is always valid.
    ///
    /// Corrects bad values instead of failing, so corrupted or old configs
    /// still load.
    pub fn normalize(&mut self) {
        self.version = SETTINGS_VERSION;
        self.timeline.normalize();
        self.media.normalize();
    }
}

fn clamp_f64(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if !value.is_finite() {
        return fallback;
    }
    value.clamp(min, max)
}

// =============================================================================
// Timeline Settings
// =============================================================================

/// Timeline zoom bounds and ruler limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSettings {
    #[serde(default = "default_min_scale")]
    pub min_scale: f64,

    #[serde(default = "default_max_scale")]
    pub max_scale: f64,

    #[serde(default = "default_initial_scale")]
    pub initial_scale: f64,

    /// Increment for zoom in/out buttons
    #[serde(default = "default_scale_step")]
    pub scale_step: f64,

    /// Scale multiplier per wheel notch towards the user
    #[serde(default = "default_wheel_zoom_in")]
    pub wheel_zoom_in: f64,

    /// Scale multiplier per wheel notch away from the user
    #[serde(default = "default_wheel_zoom_out")]
    pub wheel_zoom_out: f64,

    /// Largest tick count a ruler may request for one window
    #[serde(default = "default_max_ticks")]
    pub max_ticks: usize,
}

fn default_min_scale() -> f64 {
    0.1
}

fn default_max_scale() -> f64 {
    2.0
}

fn default_initial_scale() -> f64 {
    1.0
}

fn default_scale_step() -> f64 {
    0.1
}

fn default_wheel_zoom_in() -> f64 {
    1.2
}

fn default_wheel_zoom_out() -> f64 {
    0.8
}

fn default_max_ticks() -> usize {
    10_000
}

impl Default for TimelineSettings {
    fn default() -> Self {
        Self {
            min_scale: default_min_scale(),
            max_scale: default_max_scale(),
            initial_scale: default_initial_scale(),
            scale_step: default_scale_step(),
            wheel_zoom_in: default_wheel_zoom_in(),
            wheel_zoom_out: default_wheel_zoom_out(),
            max_ticks: default_max_ticks(),
        }
    }
}

impl TimelineSettings {
    pub fn normalize(&mut self) {
        self.min_scale = clamp_f64(self.min_scale, 0.01, 10.0, default_min_scale());
        self.max_scale = clamp_f64(self.max_scale, 0.01, 100.0, default_max_scale());
        if self.max_scale <= self.min_scale {
            warn!(
                "Timeline scale bounds inverted ({} >= {}), restoring defaults",
                self.min_scale, self.max_scale
            );
            self.min_scale = default_min_scale();
            self.max_scale = default_max_scale();
        }
        self.initial_scale = clamp_f64(
            self.initial_scale,
            self.min_scale,
            self.max_scale,
            default_initial_scale().clamp(self.min_scale, self.max_scale),
        );
        self.scale_step = clamp_f64(self.scale_step, 0.01, 1.0, default_scale_step());
        self.wheel_zoom_in = clamp_f64(self.wheel_zoom_in, 1.01, 4.0, default_wheel_zoom_in());
        self.wheel_zoom_out = clamp_f64(self.wheel_zoom_out, 0.25, 0.99, default_wheel_zoom_out());
        self.max_ticks = self.max_ticks.clamp(100, 1_000_000);
    }
}

// =============================================================================
// Media Settings
// =============================================================================

/// External ffmpeg/ffprobe configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaSettings {
    /// Explicit ffmpeg binary; detected on PATH when unset
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Explicit ffprobe binary; detected on PATH when unset
    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,

    /// Frames per thumbnail strip
    #[serde(default = "default_thumbnail_count")]
    pub thumbnail_count: u32,

    /// Root directory for thumbnail strips
    #[serde(default)]
    pub thumbnails_dir: Option<PathBuf>,

    /// Kill an ffmpeg/ffprobe run after this many seconds; `null` or 0
    /// disables the limit
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: Option<u64>,
}

const MAX_TIMEOUT_SECS: u64 = 24 * 3600;

fn default_thumbnail_count() -> u32 {
    30
}

fn default_timeout_secs() -> Option<u64> {
    Some(3600)
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
            thumbnail_count: default_thumbnail_count(),
            thumbnails_dir: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl MediaSettings {
    pub fn normalize(&mut self) {
        self.thumbnail_count = self.thumbnail_count.clamp(1, 500);
        self.timeout_secs = self
            .timeout_secs
            .filter(|secs| *secs > 0)
            .map(|secs| secs.min(MAX_TIMEOUT_SECS));
        if self
            .ffmpeg_path
            .as_ref()
            .is_some_and(|p| p.as_os_str().is_empty())
        {
            self.ffmpeg_path = None;
        }
        if self
            .ffprobe_path
            .as_ref()
            .is_some_and(|p| p.as_os_str().is_empty())
        {
            self.ffprobe_path = None;
        }
    }

    /// Per-invocation limit for media tools.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Thumbnail root, falling back to `<base>/thumbnails`.
    pub fn thumbnails_root(&self, base: &Path) -> PathBuf {
        self.thumbnails_dir
            .clone()
            .unwrap_or_else(|| base.join("thumbnails"))
    }
}

// =============================================================================
// Settings Manager
// =============================================================================

/// Settings manager for loading, saving, and resetting settings
pub struct SettingsManager {
    settings_path: PathBuf,
}

impl SettingsManager {
    /// Create a new settings manager with the given config directory
    pub fn new(config_dir: PathBuf) -> Self {
        Self {
            settings_path: config_dir.join(SETTINGS_FILE),
        }
    }

    /// Platform config directory (`~/.config/cutline` on Linux).
    pub fn default_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cutline")
    }

    /// Get the settings file path
    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Directory holding the settings file
    pub fn config_dir(&self) -> &Path {
        self.settings_path.parent().unwrap_or_else(|| Path::new("."))
    }

    fn lock_path(&self) -> PathBuf {
        self.config_dir().join(SETTINGS_LOCK_FILE)
    }

    fn with_lock<T>(&self, exclusive: bool, op: impl FnOnce() -> CoreResult<T>) -> CoreResult<T> {
        fs::create_dir_all(self.config_dir())?;

        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())?;

        if exclusive {
            fs2::FileExt::lock_exclusive(&lock_file)?;
        } else {
            fs2::FileExt::lock_shared(&lock_file)?;
        }

        let result = op();

        if let Err(e) = fs2::FileExt::unlock(&lock_file) {
            warn!("Failed to unlock settings lock file: {}", e);
        }

        result
    }

    /// Load settings from disk, returning defaults if the file is missing
    /// or unreadable
    pub fn load(&self) -> AppSettings {
        match self.try_load() {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load settings, using defaults: {}", e);
                AppSettings::default()
            }
        }
    }

    /// Load settings from disk, surfacing read and parse errors
    pub fn try_load(&self) -> CoreResult<AppSettings> {
        self.with_lock(false, || {
            if !self.settings_path.exists() {
                info!("Settings file not found, using defaults");
                return Ok(AppSettings::default());
            }

            let content = fs::read_to_string(&self.settings_path)
                .map_err(|e| CoreError::SettingsLoadFailed(e.to_string()))?;

            let mut settings = serde_json::from_str::<AppSettings>(&content)
                .map_err(|e| CoreError::SettingsLoadFailed(e.to_string()))?;

            if settings.version < SETTINGS_VERSION {
                info!(
                    "Migrating settings from version {} to {}",
                    settings.version, SETTINGS_VERSION
                );
            }

            settings.normalize();
            Ok(settings)
        })
    }

    /// Save settings to disk using atomic write (temp file + rename)
    pub fn save(&self, settings: &AppSettings) -> CoreResult<AppSettings> {
        self.with_lock(true, || {
            let mut normalized = settings.clone();
            normalized.normalize();

            atomic_write_json_pretty(&self.settings_path, &normalized)
                .map_err(|e| CoreError::SettingsSaveFailed(e.to_string()))?;

            info!("Settings saved to {:?}", self.settings_path);
            Ok(normalized)
        })
    }

    /// Reset settings to defaults and delete the settings file
    pub fn reset(&self) -> CoreResult<AppSettings> {
        self.with_lock(true, || {
            if self.settings_path.exists() {
                fs::remove_file(&self.settings_path)?;
                info!("Settings file deleted");
            }
            Ok(AppSettings::default())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();
        assert_eq!(settings.version, SETTINGS_VERSION);
        assert_eq!(settings.timeline.min_scale, 0.1);
        assert_eq!(settings.timeline.max_scale, 2.0);
        assert_eq!(settings.timeline.wheel_zoom_in, 1.2);
        assert_eq!(settings.timeline.wheel_zoom_out, 0.8);
        assert_eq!(settings.media.thumbnail_count, 30);
        assert!(settings.media.ffmpeg_path.is_none());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: AppSettings =
            serde_json::from_str(r#"{ "timeline": { "maxScale": 4.0 } }"#).unwrap();
        assert_eq!(settings.timeline.max_scale, 4.0);
        assert_eq!(settings.timeline.min_scale, 0.1);
        assert_eq!(settings.media.thumbnail_count, 30);
    }

    #[test]
    fn test_normalize_repairs_bad_values() {
        let mut settings = AppSettings::default();
        settings.timeline.min_scale = 3.0;
        settings.timeline.max_scale = 1.0;
        settings.timeline.scale_step = f64::NAN;
        settings.timeline.wheel_zoom_in = 0.5;
        settings.timeline.max_ticks = 0;
        settings.media.thumbnail_count = 0;
        settings.media.ffmpeg_path = Some(PathBuf::new());

        settings.normalize();

        assert_eq!(settings.timeline.min_scale, 0.1);
        assert_eq!(settings.timeline.max_scale, 2.0);
        assert_eq!(settings.timeline.scale_step, 0.1);
        assert_eq!(settings.timeline.wheel_zoom_in, 1.01);
        assert_eq!(settings.timeline.max_ticks, 100);
        assert_eq!(settings.media.thumbnail_count, 1);
        assert!(settings.media.ffmpeg_path.is_none());
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(dir.path().to_path_buf());
        assert_eq!(manager.load(), AppSettings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(dir.path().join("cfg"));

        let mut settings = AppSettings::default();
        settings.timeline.initial_scale = 0.6;
        settings.media.thumbnail_count = 12;

        let saved = manager.save(&settings).unwrap();
        assert_eq!(saved, settings);
        assert!(manager.settings_path().exists());

        let loaded = manager.try_load().unwrap();
        assert_eq!(loaded.timeline.initial_scale, 0.6);
        assert_eq!(loaded.media.thumbnail_count, 12);
    }

    #[test]
    fn test_corrupted_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(dir.path().to_path_buf());
        fs::write(manager.settings_path(), "{ not json").unwrap();

        assert!(matches!(
            manager.try_load(),
            Err(CoreError::SettingsLoadFailed(_))
        ));
        assert_eq!(manager.load(), AppSettings::default());
    }

    #[test]
    fn test_reset_deletes_file() {
        let dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(dir.path().to_path_buf());
        manager.save(&AppSettings::default()).unwrap();

        let reset = manager.reset().unwrap();
        assert_eq!(reset, AppSettings::default());
        assert!(!manager.settings_path().exists());
    }

    #[test]
    fn test_media_timeout_normalization() {
        let mut media = MediaSettings::default();
        assert_eq!(media.timeout(), Some(Duration::from_secs(3600)));

        media.timeout_secs = Some(0);
        media.normalize();
        assert_eq!(media.timeout(), None);

        media.timeout_secs = Some(u64::MAX);
        media.normalize();
        assert_eq!(media.timeout_secs, Some(24 * 3600));

        let parsed: MediaSettings = serde_json::from_str(r#"{ "timeoutSecs": null }"#).unwrap();
        assert_eq!(parsed.timeout(), None);
        let parsed: MediaSettings = serde_json::from_str(r#"{ "timeoutSecs": 90 }"#).unwrap();
        assert_eq!(parsed.timeout(), Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_thumbnails_root_fallback() {
        let media = MediaSettings::default();
        assert_eq!(
            media.thumbnails_root(Path::new("/data")),
            PathBuf::from("/data/thumbnails")
        );
    }
}
