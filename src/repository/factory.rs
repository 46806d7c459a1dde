//! Repository factory for creating repository instances
//!
//! This factory provides a centralized way to create repository instances
//! with the appropriate backend based on configuration.

use super::file::FilePreferencesRepository;
use super::sqlite::SqliteTrackRepository;
use super::traits::{PreferencesRepository, TrackRepository};
use crate::error::EditorResult;
use crate::preferences::EditorPreferences;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const PREFERENCES_FILE: &str = "editor-preferences.json";

/// Repository factory for creating repository instances
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create a SQLite-backed track repository
    ///
    /// # Arguments
    /// * `store_path` - Path to the database file (created if missing)
    pub fn create_track_repository(store_path: &Path) -> EditorResult<Arc<dyn TrackRepository>> {
        Ok(Arc::new(SqliteTrackRepository::open(store_path)?))
    }

    /// Create a file-based preferences repository
    ///
    /// # Arguments
    /// * `store_path` - Path to the JSON file (e.g., "editor-preferences.json")
    pub fn create_preferences_repository(store_path: PathBuf) -> Arc<dyn PreferencesRepository> {
        Arc::new(FilePreferencesRepository::new(store_path))
    }
}

/// Unified repository manager that holds all repositories
///
/// This provides a single point of access to all repositories,
/// making it easy to inject into the session and the offline cache.
#[derive(Clone)]
pub struct RepositoryManager {
    tracks: Arc<dyn TrackRepository>,
    preferences: Arc<dyn PreferencesRepository>,
}

impl RepositoryManager {
    pub fn new(
        tracks: Arc<dyn TrackRepository>,
        preferences: Arc<dyn PreferencesRepository>,
    ) -> Self {
        Self {
            tracks,
            preferences,
        }
    }

    /// Open repositories under `data_dir`.
    ///
    /// Preferences are read first so a configured store path is honored.
    pub fn open(data_dir: &Path) -> EditorResult<(Self, EditorPreferences)> {
        let preferences =
            RepositoryFactory::create_preferences_repository(data_dir.join(PREFERENCES_FILE));
        let prefs = preferences.load_or_default()?;
        prefs.validate()?;

        let store_path = prefs.offline_store_path(data_dir);
        let tracks = RepositoryFactory::create_track_repository(&store_path)?;
        Ok((Self::new(tracks, preferences), prefs))
    }

    /// Get the track repository
    pub fn tracks(&self) -> Arc<dyn TrackRepository> {
        self.tracks.clone()
    }

    /// Get the preferences repository
    pub fn preferences(&self) -> Arc<dyn PreferencesRepository> {
        self.preferences.clone()
    }
}
