//! Offline media cache
//!
//! Downloaded tracks persist in a [`TrackRepository`] across sessions. The
//! cache keeps an in-memory index ordered most recent first and an in-flight
//! set so a track is never fetched twice concurrently. When a size cap is
//! configured, the oldest downloads are evicted after each new download
//! until the total fits.

pub mod fetcher;
pub mod track;

pub use fetcher::{HttpTrackFetcher, TrackFetcher};
pub use track::{guess_mime_type, OfflineTrack, TrackDescriptor, TrackSummary};

use crate::app_log;
use crate::error::EditorResult;
use crate::events::{EventEmitter, EventSink};
use crate::logger::LogLevel;
use crate::media_url::{BlobUrlRegistry, MediaBlob, ObjectUrl};
use crate::repository::TrackRepository;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Result of [`OfflineTrackCache::download_track`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Downloaded,
    /// Another download of the same id is in flight; nothing was fetched
    AlreadyDownloading,
    Failed(String),
}

impl DownloadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Downloaded)
    }
}

/// Removes an id from the in-flight set when dropped
struct InFlight<'a> {
    ids: &'a Mutex<HashSet<String>>,
    id: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Ok(mut ids) = self.ids.lock() {
            ids.remove(&self.id);
        }
    }
}

pub struct OfflineTrackCache {
    repository: Arc<dyn TrackRepository>,
    fetcher: Arc<dyn TrackFetcher>,
    urls: BlobUrlRegistry,
    /// Metadata only; payloads are read from the repository on demand
    index: Mutex<Vec<TrackSummary>>,
    in_flight: Mutex<HashSet<String>>,
    max_bytes: Option<u64>,
    events: Option<Arc<dyn EventSink>>,
}

impl OfflineTrackCache {
    pub fn new(
        repository: Arc<dyn TrackRepository>,
        fetcher: Arc<dyn TrackFetcher>,
        urls: BlobUrlRegistry,
    ) -> Self {
        Self {
            repository,
            fetcher,
            urls,
            index: Mutex::new(Vec::new()),
            in_flight: Mutex::new(HashSet::new()),
            max_bytes: None,
            events: None,
        }
    }

    /// Cap the total stored payload; None leaves it unbounded
    pub fn with_max_bytes(mut self, max_bytes: Option<u64>) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    /// Read every persisted track into the index, most recent first
    pub fn load(&self) -> EditorResult<usize> {
        let mut tracks = self.repository.list()?;
        tracks.sort_by(|a, b| b.downloaded_at.cmp(&a.downloaded_at));
        let count = tracks.len();
        *self.index.lock()? = tracks;

        app_log!(
            LogLevel::Info,
            "offline_cache",
            "Loaded {} offline tracks",
            count
        );
        Ok(count)
    }

    /// Fetch and persist a track.
    ///
    /// Never returns an error: network and storage failures become
    /// [`DownloadOutcome::Failed`] and leave the cache as it was.
    pub async fn download_track(&self, descriptor: &TrackDescriptor) -> DownloadOutcome {
        let _in_flight = match self.claim(&descriptor.id) {
            Some(guard) => guard,
            None => {
                app_log!(
                    LogLevel::Debug,
                    "offline_cache",
                    "Download of {} already in flight",
                    descriptor.id
                );
                return DownloadOutcome::AlreadyDownloading;
            }
        };

        app_log!(
            LogLevel::Info,
            "offline_cache",
            "Downloading {} from {}",
            descriptor.id,
            descriptor.source_url
        );

        let bytes = match self.fetcher.fetch(&descriptor.source_url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                app_log!(
                    LogLevel::Warn,
                    "offline_cache",
                    "Download of {} failed: {}",
                    descriptor.id,
                    e
                );
                return DownloadOutcome::Failed(e.to_string());
            }
        };

        let track = OfflineTrack::from_download(descriptor, bytes, Utc::now());
        if let Err(e) = self.repository.put(&track) {
            app_log!(
                LogLevel::Error,
                "offline_cache",
                "Failed to persist {}: {}",
                descriptor.id,
                e
            );
            return DownloadOutcome::Failed(e.to_string());
        }

        let size = track.size_bytes();
        match self.index.lock() {
            Ok(mut index) => {
                index.retain(|t| t.id != track.id);
                index.insert(0, track.summary());
            }
            Err(e) => return DownloadOutcome::Failed(e.to_string()),
        }

        app_log!(
            LogLevel::Info,
            "offline_cache",
            "Stored {} ({} bytes)",
            descriptor.id,
            size
        );
        if let Some(events) = &self.events {
            let _ = EventEmitter::offline_track_downloaded(events.as_ref(), &descriptor.id);
        }

        self.evict_over_cap(&descriptor.id);
        DownloadOutcome::Downloaded
    }

    /// Delete a track; unknown ids are ignored
    pub fn remove_track(&self, id: &str) -> EditorResult<()> {
        self.repository.delete(id)?;
        let removed = {
            let mut index = self.index.lock()?;
            let before = index.len();
            index.retain(|t| t.id != id);
            before != index.len()
        };

        if removed {
            app_log!(LogLevel::Info, "offline_cache", "Removed {}", id);
            if let Some(events) = &self.events {
                let _ = EventEmitter::offline_track_removed(events.as_ref(), id);
            }
        }
        Ok(())
    }

    pub fn is_downloaded(&self, id: &str) -> bool {
        self.index
            .lock()
            .map(|index| index.iter().any(|t| t.id == id))
            .unwrap_or(false)
    }

    pub fn is_downloading(&self, id: &str) -> bool {
        self.in_flight
            .lock()
            .map(|ids| ids.contains(id))
            .unwrap_or(false)
    }

    /// Temporary URL over the stored payload, None if the track is absent
    pub fn get_offline_url(&self, id: &str) -> EditorResult<Option<ObjectUrl>> {
        let Some(track) = self.repository.get(id)? else {
            return Ok(None);
        };
        let blob = MediaBlob {
            bytes: track.raw_bytes.clone(),
            mime_type: track.mime_type.clone(),
        };
        Ok(Some(self.urls.create(blob)))
    }

    /// Indexed tracks, most recent first
    pub fn tracks(&self) -> Vec<TrackSummary> {
        self.index
            .lock()
            .map(|index| index.clone())
            .unwrap_or_default()
    }

    /// Sum of all stored payload sizes
    pub fn total_bytes(&self) -> u64 {
        self.index
            .lock()
            .map(|index| index.iter().map(|t| t.size_bytes).sum())
            .unwrap_or(0)
    }

    fn claim(&self, id: &str) -> Option<InFlight<'_>> {
        let mut ids = self.in_flight.lock().ok()?;
        if !ids.insert(id.to_string()) {
            return None;
        }
        Some(InFlight {
            ids: &self.in_flight,
            id: id.to_string(),
        })
    }

    /// Drop the oldest downloads until the total fits the cap.
    ///
    /// The track just downloaded is kept even if it alone exceeds the cap.
    fn evict_over_cap(&self, keep_id: &str) {
        let Some(max_bytes) = self.max_bytes else {
            return;
        };

        let victims: Vec<String> = match self.index.lock() {
            Ok(index) => {
                let mut total: u64 = index.iter().map(|t| t.size_bytes).sum();
                let mut victims = Vec::new();
                for track in index.iter().rev() {
                    if total <= max_bytes {
                        break;
                    }
                    if track.id == keep_id {
                        continue;
                    }
                    total -= track.size_bytes;
                    victims.push(track.id.clone());
                }
                victims
            }
            Err(_) => return,
        };

        for id in victims {
            app_log!(
                LogLevel::Info,
                "offline_cache",
                "Evicting {} to stay under {} bytes",
                id,
                max_bytes
            );
            if let Err(e) = self.remove_track(&id) {
                app_log!(
                    LogLevel::Warn,
                    "offline_cache",
                    "Eviction of {} failed: {}",
                    id,
                    e
                );
            }
        }
    }
}
