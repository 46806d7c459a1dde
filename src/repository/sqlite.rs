//! SQLite-backed track repository
//!
//! One table keyed by track id. The audio payload is stored inline as a BLOB
//! so a record is always written and read whole.

use super::traits::TrackRepository;
use crate::app_log;
use crate::error::EditorResult;
use crate::logger::LogLevel;
use crate::offline_cache::{OfflineTrack, TrackSummary};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS offline_tracks (
    id            TEXT PRIMARY KEY NOT NULL,
    title         TEXT NOT NULL,
    artist        TEXT NOT NULL,
    source_url    TEXT NOT NULL,
    duration      REAL NOT NULL,
    genre         TEXT,
    mood          TEXT,
    mime_type     TEXT NOT NULL,
    downloaded_at TEXT NOT NULL,
    raw_bytes     BLOB NOT NULL
);";

const SELECT_COLUMNS: &str = "SELECT id, title, artist, source_url, duration, genre, mood, \
     mime_type, downloaded_at, raw_bytes FROM offline_tracks";

const SELECT_SUMMARY: &str = "SELECT id, title, artist, source_url, duration, genre, mood, \
     mime_type, downloaded_at, length(raw_bytes) FROM offline_tracks";

pub struct SqliteTrackRepository {
    conn: Mutex<Connection>,
}

impl SqliteTrackRepository {
    /// Open (or create) the store at `path`
    pub fn open(path: &Path) -> EditorResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        app_log!(
            LogLevel::Debug,
            "storage",
            "Opened offline track store at {}",
            path.display()
        );
        Self::with_connection(conn)
    }

    /// Store that lives only as long as this value
    pub fn open_in_memory() -> EditorResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> EditorResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn row_to_track(row: &Row<'_>) -> rusqlite::Result<OfflineTrack> {
        Ok(OfflineTrack {
            id: row.get(0)?,
            title: row.get(1)?,
            artist: row.get(2)?,
            source_url: row.get(3)?,
            duration: row.get(4)?,
            genre: row.get(5)?,
            mood: row.get(6)?,
            mime_type: row.get(7)?,
            downloaded_at: row.get(8)?,
            raw_bytes: Arc::new(row.get(9)?),
        })
    }

    fn row_to_summary(row: &Row<'_>) -> rusqlite::Result<TrackSummary> {
        let size: i64 = row.get(9)?;
        Ok(TrackSummary {
            id: row.get(0)?,
            title: row.get(1)?,
            artist: row.get(2)?,
            source_url: row.get(3)?,
            duration: row.get(4)?,
            genre: row.get(5)?,
            mood: row.get(6)?,
            mime_type: row.get(7)?,
            downloaded_at: row.get(8)?,
            size_bytes: size.max(0) as u64,
        })
    }
}

impl TrackRepository for SqliteTrackRepository {
    fn get_all(&self) -> EditorResult<Vec<OfflineTrack>> {
        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare(SELECT_COLUMNS)?;
        let tracks = stmt
            .query_map([], Self::row_to_track)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tracks)
    }

    fn list(&self) -> EditorResult<Vec<TrackSummary>> {
        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare(SELECT_SUMMARY)?;
        let summaries = stmt
            .query_map([], Self::row_to_summary)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(summaries)
    }

    fn get(&self, id: &str) -> EditorResult<Option<OfflineTrack>> {
        let conn = self.conn.lock()?;
        let track = conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                params![id],
                Self::row_to_track,
            )
            .optional()?;
        Ok(track)
    }

    fn put(&self, track: &OfflineTrack) -> EditorResult<()> {
        let conn = self.conn.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO offline_tracks \
             (id, title, artist, source_url, duration, genre, mood, \
              mime_type, downloaded_at, raw_bytes) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                track.id,
                track.title,
                track.artist,
                track.source_url,
                track.duration,
                track.genre,
                track.mood,
                track.mime_type,
                track.downloaded_at,
                track.raw_bytes.as_slice(),
            ],
        )?;
        Ok(())
    }

    fn delete(&self, id: &str) -> EditorResult<()> {
        let conn = self.conn.lock()?;
        conn.execute("DELETE FROM offline_tracks WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn count(&self) -> EditorResult<usize> {
        let conn = self.conn.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM offline_tracks", [], |row| {
            row.get(0)
        })?;
        Ok(count as usize)
    }
}
