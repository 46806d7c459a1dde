//! Repository trait definitions
//!
//! These traits define the abstract interfaces for data access operations.
//! Different implementations can provide different storage backends.

use crate::error::EditorResult;
use crate::offline_cache::{OfflineTrack, TrackSummary};
use crate::preferences::EditorPreferences;

/// Durable store of downloaded tracks, keyed by track id.
///
/// Writes replace the whole record. Implementations must survive restarts.
pub trait TrackRepository: Send + Sync {
    /// Load every stored track
    fn get_all(&self) -> EditorResult<Vec<OfflineTrack>>;

    /// Metadata of every stored track, without payloads
    fn list(&self) -> EditorResult<Vec<TrackSummary>> {
        Ok(self.get_all()?.iter().map(OfflineTrack::summary).collect())
    }

    /// Load one track, None if absent
    fn get(&self, id: &str) -> EditorResult<Option<OfflineTrack>>;

    /// Insert or replace a track
    fn put(&self, track: &OfflineTrack) -> EditorResult<()>;

    /// Delete a track; missing ids are not an error
    fn delete(&self, id: &str) -> EditorResult<()>;

    /// Check if a track is stored
    fn contains(&self, id: &str) -> EditorResult<bool> {
        Ok(self.get(id)?.is_some())
    }

    /// Count stored tracks
    fn count(&self) -> EditorResult<usize> {
        Ok(self.get_all()?.len())
    }
}

/// Repository for editor preferences
///
/// Implementations can use different storage backends (file, database, cloud, etc.)
pub trait PreferencesRepository: Send + Sync {
    /// Save editor preferences
    fn save_preferences(&self, preferences: &EditorPreferences) -> EditorResult<()>;

    /// Load editor preferences
    fn load_preferences(&self) -> EditorResult<Option<EditorPreferences>>;

    /// Delete editor preferences
    fn delete_preferences(&self) -> EditorResult<()>;

    /// Check if preferences exist
    fn has_preferences(&self) -> EditorResult<bool> {
        Ok(self.load_preferences()?.is_some())
    }

    /// Stored preferences, or defaults when none were saved
    fn load_or_default(&self) -> EditorResult<EditorPreferences> {
        Ok(self.load_preferences()?.unwrap_or_default())
    }
}
