use crate::overlay::{StickerOverlay, TextOverlay};

/// The editable part of a session, captured for undo/redo.
///
/// Playback state (playhead, duration, media) is deliberately absent, so
/// scrubbing never creates or disturbs history.
#[derive(Debug, Clone, PartialEq)]
pub struct EditSnapshot {
    pub filter_index: usize,
    pub volume: f64,
    pub trim_start: f64,
    pub trim_end: f64,
    pub text_overlays: Vec<TextOverlay>,
    pub sticker_overlays: Vec<StickerOverlay>,
}
