//! Client-side video editing session.
//!
//! An [`EditSession`] owns one editing pass over a media asset: trim window
//! and playhead ([`timeline`]), text and sticker overlays ([`overlay`]),
//! filter and volume, snapshot undo/redo ([`history`]), an optional
//! microphone voiceover ([`voiceover`]) and the finish action that hands the
//! result to the host, transcoding it first when needed.
//!
//! Downloaded music lives in the [`offline_cache`], which is shared across
//! sessions and persisted through a [`repository::TrackRepository`].
//!
//! Everything the host application provides (media element, microphone,
//! transcode service, network) is a trait, so the crate runs the same under
//! a UI shell or in tests.

pub mod error;
pub mod events;
pub mod filters;
pub mod history;
pub mod logger;
pub mod media_url;
pub mod offline_cache;
pub mod overlay;
pub mod preferences;
pub mod repository;
pub mod session;
pub mod state_machine;
pub mod timeline;
pub mod voiceover;

pub use error::{EditorError, EditorResult};
pub use events::{ChannelEventSink, EventSink};
pub use history::{HistoryMode, HistoryStack};
pub use media_url::{BlobUrlRegistry, MediaBlob, ObjectUrl};
pub use offline_cache::{
    DownloadOutcome, OfflineTrack, OfflineTrackCache, TrackDescriptor, TrackSummary,
};
pub use overlay::{OverlayManager, StickerOverlay, TextOverlay};
pub use preferences::{EditorPreferences, ExportMode};
pub use session::{EditCompletion, EditDescriptor, EditOutput, EditSession};
pub use timeline::{DragHandle, MediaHandle, TimelineBounds, TimelineController};
pub use voiceover::{VoiceoverRecorder, VoiceoverTake};
