use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_AUDIO_MIME: &str = "audio/mpeg";

/// Remote track metadata, as listed by a music catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackDescriptor {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub source_url: String,
    /// Seconds
    pub duration: f64,
    pub genre: Option<String>,
    pub mood: Option<String>,
}

/// A downloaded track with its full audio payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineTrack {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub source_url: String,
    pub duration: f64,
    pub genre: Option<String>,
    pub mood: Option<String>,
    pub mime_type: String,
    pub downloaded_at: DateTime<Utc>,
    #[serde(skip)]
    pub raw_bytes: Arc<Vec<u8>>,
}

impl OfflineTrack {
    pub fn from_download(
        descriptor: &TrackDescriptor,
        raw_bytes: Vec<u8>,
        downloaded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: descriptor.id.clone(),
            title: descriptor.title.clone(),
            artist: descriptor.artist.clone(),
            source_url: descriptor.source_url.clone(),
            duration: descriptor.duration,
            genre: descriptor.genre.clone(),
            mood: descriptor.mood.clone(),
            mime_type: guess_mime_type(&descriptor.source_url).to_string(),
            downloaded_at,
            raw_bytes: Arc::new(raw_bytes),
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.raw_bytes.len() as u64
    }

    /// Index entry for this track, without the payload
    pub fn summary(&self) -> TrackSummary {
        TrackSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            artist: self.artist.clone(),
            source_url: self.source_url.clone(),
            duration: self.duration,
            genre: self.genre.clone(),
            mood: self.mood.clone(),
            mime_type: self.mime_type.clone(),
            downloaded_at: self.downloaded_at,
            size_bytes: self.size_bytes(),
        }
    }
}

/// Metadata of a stored track; the audio stays in the repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSummary {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub source_url: String,
    pub duration: f64,
    pub genre: Option<String>,
    pub mood: Option<String>,
    pub mime_type: String,
    pub downloaded_at: DateTime<Utc>,
    pub size_bytes: u64,
}

/// Audio MIME type from the URL's file extension
pub fn guess_mime_type(source_url: &str) -> &'static str {
    let path = match url::Url::parse(source_url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => source_url.to_string(),
    };
    let extension = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "mp3" => "audio/mpeg",
        "m4a" | "mp4" => "audio/mp4",
        "aac" => "audio/aac",
        "wav" => "audio/wav",
        "ogg" | "oga" => "audio/ogg",
        "opus" => "audio/opus",
        "webm" => "audio/webm",
        "flac" => "audio/flac",
        _ => DEFAULT_AUDIO_MIME,
    }
}
