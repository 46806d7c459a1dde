use crate::error::{EditorError, EditorResult};
use crate::overlay::{StickerOverlay, TextOverlay};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Event names - centralized for consistency
pub mod event_names {
    pub const EXPORT_PROGRESS: &str = "export:progress";
    pub const EXPORT_COMPLETED: &str = "export:completed";
    pub const HISTORY_CHANGED: &str = "history:changed";
    pub const VOICEOVER_STATE_CHANGED: &str = "voiceover:state-changed";
    pub const OFFLINE_TRACK_DOWNLOADED: &str = "offline:track-downloaded";
    pub const OFFLINE_TRACK_REMOVED: &str = "offline:track-removed";
}

/// Destination for events produced by the editor.
///
/// The hosting application implements this to forward events to its UI.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &str, payload: serde_json::Value) -> EditorResult<()>;
}

/// An event as delivered through [`ChannelEventSink`]
#[derive(Debug, Clone)]
pub struct EmittedEvent {
    pub name: String,
    pub payload: serde_json::Value,
}

/// Event sink that forwards into a tokio channel
pub struct ChannelEventSink {
    sender: mpsc::UnboundedSender<EmittedEvent>,
}

impl ChannelEventSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<EmittedEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: &str, payload: serde_json::Value) -> EditorResult<()> {
        self.sender
            .send(EmittedEvent {
                name: event.to_string(),
                payload,
            })
            .map_err(|_| EditorError::Internal("Event receiver dropped".to_string()))
    }
}

/// Export progress event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportProgressEvent {
    pub session_id: Uuid,
    pub stage: String, // "loading", "working", "done", "error"
    pub percent: u8,
    pub message: String,
    pub timestamp: String,
}

/// Export completed event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportCompletedEvent {
    pub session_id: Uuid,
    pub output_media_ref: String,
    pub rendered: bool,
    pub text_overlays: Vec<TextOverlay>,
    pub sticker_overlays: Vec<StickerOverlay>,
    pub timestamp: String,
}

/// History changed event (after snapshot, undo or redo)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryChangedEvent {
    pub session_id: Uuid,
    pub can_undo: bool,
    pub can_redo: bool,
    pub timestamp: String,
}

/// Voiceover state change event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceoverStateChangedEvent {
    pub status: String, // "Idle", "Recording", "Recorded"
    pub duration_seconds: u64,
    pub timestamp: String,
}

/// Offline track event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineTrackEvent {
    pub track_id: String,
    pub timestamp: String,
}

/// Event emitter helper functions
pub struct EventEmitter;

impl EventEmitter {
    fn send<T: Serialize>(sink: &dyn EventSink, name: &str, event: T) -> EditorResult<()> {
        let payload = serde_json::to_value(event)?;
        sink.emit(name, payload)
    }

    /// Emit export progress event
    pub fn export_progress(
        sink: &dyn EventSink,
        session_id: Uuid,
        stage: &str,
        percent: u8,
        message: &str,
    ) -> EditorResult<()> {
        let event = ExportProgressEvent {
            session_id,
            stage: stage.to_string(),
            percent,
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        Self::send(sink, event_names::EXPORT_PROGRESS, event)
    }

    /// Emit export completed event
    pub fn export_completed(
        sink: &dyn EventSink,
        session_id: Uuid,
        output_media_ref: &str,
        rendered: bool,
        text_overlays: &[TextOverlay],
        sticker_overlays: &[StickerOverlay],
    ) -> EditorResult<()> {
        let event = ExportCompletedEvent {
            session_id,
            output_media_ref: output_media_ref.to_string(),
            rendered,
            text_overlays: text_overlays.to_vec(),
            sticker_overlays: sticker_overlays.to_vec(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        Self::send(sink, event_names::EXPORT_COMPLETED, event)
    }

    /// Emit history changed event
    pub fn history_changed(
        sink: &dyn EventSink,
        session_id: Uuid,
        can_undo: bool,
        can_redo: bool,
    ) -> EditorResult<()> {
        let event = HistoryChangedEvent {
            session_id,
            can_undo,
            can_redo,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        Self::send(sink, event_names::HISTORY_CHANGED, event)
    }

    /// Emit voiceover state changed event
    pub fn voiceover_state_changed(
        sink: &dyn EventSink,
        status: &str,
        duration_seconds: u64,
    ) -> EditorResult<()> {
        let event = VoiceoverStateChangedEvent {
            status: status.to_string(),
            duration_seconds,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        Self::send(sink, event_names::VOICEOVER_STATE_CHANGED, event)
    }

    /// Emit offline track downloaded event
    pub fn offline_track_downloaded(sink: &dyn EventSink, track_id: &str) -> EditorResult<()> {
        let event = OfflineTrackEvent {
            track_id: track_id.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        Self::send(sink, event_names::OFFLINE_TRACK_DOWNLOADED, event)
    }

    /// Emit offline track removed event
    pub fn offline_track_removed(sink: &dyn EventSink, track_id: &str) -> EditorResult<()> {
        let event = OfflineTrackEvent {
            track_id: track_id.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        Self::send(sink, event_names::OFFLINE_TRACK_REMOVED, event)
    }
}
