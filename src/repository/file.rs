//! File-based repository implementations
//!
//! Preferences are stored as a single pretty-printed JSON document. Writes go
//! to a sibling temp file first and are renamed into place.

use super::traits::PreferencesRepository;
use crate::error::{EditorError, EditorResult};
use crate::preferences::EditorPreferences;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// File-based preferences repository
pub struct FilePreferencesRepository {
    store_path: PathBuf,
    write_lock: Mutex<()>,
}

impl FilePreferencesRepository {
    /// Create a new file-based preferences repository
    pub fn new(store_path: PathBuf) -> Self {
        Self {
            store_path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .store_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.store_path.with_file_name(name)
    }
}

impl PreferencesRepository for FilePreferencesRepository {
    fn save_preferences(&self, preferences: &EditorPreferences) -> EditorResult<()> {
        preferences.validate()?;
        let _guard = self.write_lock.lock()?;

        if let Some(parent) = self.store_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(preferences)?;
        let temp = self.temp_path();
        std::fs::write(&temp, json)
            .map_err(|e| EditorError::StorageSaveFailed(e.to_string()))?;
        std::fs::rename(&temp, &self.store_path)
            .map_err(|e| EditorError::StorageSaveFailed(e.to_string()))?;
        Ok(())
    }

    fn load_preferences(&self) -> EditorResult<Option<EditorPreferences>> {
        let contents = match std::fs::read_to_string(&self.store_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(EditorError::StorageLoadFailed(e.to_string())),
        };
        let preferences: EditorPreferences = serde_json::from_str(&contents)?;
        Ok(Some(preferences))
    }

    fn delete_preferences(&self) -> EditorResult<()> {
        let _guard = self.write_lock.lock()?;
        match std::fs::remove_file(&self.store_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(EditorError::StorageSaveFailed(e.to_string())),
        }
    }
}
