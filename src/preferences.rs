use crate::error::{EditorError, EditorResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// How the session finishes an edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    /// Run the transcode service locally and hand off the rendered media
    Render,
    /// Hand the edit descriptor downstream unprocessed
    Deferred,
}

/// Editor settings that can be configured by the user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorPreferences {
    /// Maximum number of undo entries kept per session
    pub history_depth: usize,
    /// Number of scrubber thumbnails sampled per load
    pub thumbnail_count: usize,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
    /// JPEG quality (1-100) for thumbnail data URLs
    pub thumbnail_quality: u8,
    /// Smallest allowed trim window in seconds
    pub min_trim_window: f64,
    /// Pause after a failed transcode before falling back to the source
    pub export_fallback_delay_ms: u64,
    pub export_mode: ExportMode,
    /// Interval of the voiceover level meter, roughly one display frame
    pub meter_interval_ms: u64,
    /// Offline cache size cap in bytes, None means unbounded
    pub max_offline_cache_bytes: Option<u64>,
    /// Durable store location, None means use default
    pub offline_store_path: Option<PathBuf>,
}

impl Default for EditorPreferences {
    fn default() -> Self {
        Self {
            history_depth: 30,
            thumbnail_count: 10,
            thumbnail_width: 60,
            thumbnail_height: 80,
            thumbnail_quality: 60,
            min_trim_window: 1.0,
            export_fallback_delay_ms: 1500,
            export_mode: ExportMode::Render,
            meter_interval_ms: 16,
            max_offline_cache_bytes: Some(512 * 1024 * 1024),
            offline_store_path: None,
        }
    }
}

impl EditorPreferences {
    /// Reject settings that would break session invariants
    pub fn validate(&self) -> EditorResult<()> {
        if self.history_depth == 0 {
            return Err(EditorError::ConfigError(
                "history_depth must be at least 1".to_string(),
            ));
        }
        if self.thumbnail_count == 0 {
            return Err(EditorError::ConfigError(
                "thumbnail_count must be at least 1".to_string(),
            ));
        }
        if self.thumbnail_width == 0 || self.thumbnail_height == 0 {
            return Err(EditorError::ConfigError(format!(
                "thumbnail size must be non-zero, got {}x{}",
                self.thumbnail_width, self.thumbnail_height
            )));
        }
        if !(self.min_trim_window.is_finite() && self.min_trim_window > 0.0) {
            return Err(EditorError::ConfigError(format!(
                "min_trim_window must be positive, got {}",
                self.min_trim_window
            )));
        }
        if self.meter_interval_ms == 0 {
            return Err(EditorError::ConfigError(
                "meter_interval_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn export_fallback_delay(&self) -> Duration {
        Duration::from_millis(self.export_fallback_delay_ms)
    }

    pub fn meter_interval(&self) -> Duration {
        Duration::from_millis(self.meter_interval_ms)
    }

    /// Store path for offline tracks, falling back to `default_dir/offline-tracks.sqlite3`
    pub fn offline_store_path(&self, default_dir: &std::path::Path) -> PathBuf {
        self.offline_store_path
            .clone()
            .unwrap_or_else(|| default_dir.join("offline-tracks.sqlite3"))
    }
}
