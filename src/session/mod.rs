//! Editing session: the aggregate that ties timeline, overlays, history,
//! voiceover and export together for one pass over a media asset.
//!
//! Every edit goes through [`EditSession::record`], which captures the
//! editable state before the change and pushes it to history only when the
//! change actually altered something. Trim drags are recorded as a single
//! gesture from pointer down to pointer up.

pub mod descriptor;
pub mod snapshot;
pub mod transcode;

pub use descriptor::EditDescriptor;
pub use snapshot::EditSnapshot;
pub use transcode::{ExportProgress, ExportStage, ProgressCallback, Transcoder};

use crate::app_log;
use crate::error::{EditorError, EditorResult};
use crate::events::{EventEmitter, EventSink};
use crate::filters::{self, FilterPreset, IDENTITY_FILTER};
use crate::history::HistoryStack;
use crate::logger::LogLevel;
use crate::media_url::{BlobUrlRegistry, ObjectUrl};
use crate::overlay::{OverlayManager, StickerOverlay, TextOverlay};
use crate::preferences::{EditorPreferences, ExportMode};
use crate::state_machine::{CompletionKind, ExportPhase};
use crate::timeline::{
    DragHandle, MediaHandle, Thumbnail, ThumbnailSpec, TimelineBounds, TimelineController,
};
use crate::voiceover::{Microphone, VoiceoverRecorder, VoiceoverTake};
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

/// Media handed off when a session finishes
#[derive(Debug)]
pub enum EditOutput {
    /// The untouched source; any edits travel in the descriptor
    Source(String),
    /// Transcoded media with the edits applied
    Rendered(ObjectUrl),
}

impl EditOutput {
    pub fn media_ref(&self) -> &str {
        match self {
            EditOutput::Source(media_ref) => media_ref,
            EditOutput::Rendered(url) => url.as_str(),
        }
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self, EditOutput::Rendered(_))
    }
}

/// Everything the host receives when editing is done
#[derive(Debug)]
pub struct EditCompletion {
    pub session_id: Uuid,
    pub output: EditOutput,
    /// Edits still to apply downstream; identity once rendered
    pub descriptor: EditDescriptor,
    pub text_overlays: Vec<TextOverlay>,
    pub sticker_overlays: Vec<StickerOverlay>,
    pub voiceover: Option<VoiceoverTake>,
    pub kind: CompletionKind,
}

impl EditCompletion {
    pub fn output_media_ref(&self) -> &str {
        self.output.media_ref()
    }
}

pub struct EditSession {
    id: Uuid,
    media_ref: String,
    preferences: EditorPreferences,
    timeline: TimelineController,
    overlays: OverlayManager,
    history: HistoryStack<EditSnapshot>,
    filter_index: usize,
    volume: f64,
    /// State captured when a gesture began
    gesture: Option<EditSnapshot>,
    /// Whether the open gesture belongs to a trim drag
    trim_gesture: bool,
    phase: ExportPhase,
    transcoder: Arc<dyn Transcoder>,
    urls: BlobUrlRegistry,
    progress: Arc<watch::Sender<Option<ExportProgress>>>,
    voiceover: Option<VoiceoverRecorder>,
    events: Option<Arc<dyn EventSink>>,
}

impl EditSession {
    pub fn new(
        media_ref: impl Into<String>,
        transcoder: Arc<dyn Transcoder>,
        urls: BlobUrlRegistry,
        preferences: EditorPreferences,
    ) -> EditorResult<Self> {
        preferences.validate()?;

        let id = Uuid::new_v4();
        let thumbnail_spec = ThumbnailSpec {
            count: preferences.thumbnail_count,
            width: preferences.thumbnail_width,
            height: preferences.thumbnail_height,
            quality: preferences.thumbnail_quality,
        };
        let (progress, _) = watch::channel(None);

        Ok(Self {
            id,
            media_ref: media_ref.into(),
            timeline: TimelineController::new(preferences.min_trim_window, thumbnail_spec),
            overlays: OverlayManager::new(),
            history: HistoryStack::new(preferences.history_depth),
            filter_index: IDENTITY_FILTER,
            volume: 1.0,
            gesture: None,
            trim_gesture: false,
            phase: ExportPhase::new(id, preferences.export_mode),
            transcoder,
            urls,
            progress: Arc::new(progress),
            voiceover: None,
            events: None,
            preferences,
        })
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    /// Load the source media; fails if it reports no usable duration
    pub async fn load(&mut self, media: Arc<dyn MediaHandle>) -> EditorResult<()> {
        self.timeline.load(media).await?;
        self.history.clear();
        app_log!(
            LogLevel::Info,
            "session",
            "Session {} loaded {}",
            self.id,
            self.media_ref
        );
        self.notify_history();
        Ok(())
    }

    /// Enable voiceover recording for this session
    pub fn attach_voiceover(&mut self, microphone: Arc<dyn Microphone>) {
        let mut recorder = VoiceoverRecorder::new(
            microphone,
            self.urls.clone(),
            self.preferences.meter_interval(),
        );
        if let Some(events) = &self.events {
            recorder = recorder.with_events(events.clone());
        }
        if let Some(mut previous) = self.voiceover.replace(recorder) {
            previous.shutdown();
        }
    }

    pub fn voiceover(&self) -> Option<&VoiceoverRecorder> {
        self.voiceover.as_ref()
    }

    pub fn voiceover_mut(&mut self) -> Option<&mut VoiceoverRecorder> {
        self.voiceover.as_mut()
    }

    // ------------------------------------------------------------------
    // Edits
    // ------------------------------------------------------------------

    pub fn set_filter(&mut self, index: usize) -> EditorResult<()> {
        filters::preset(index).ok_or(EditorError::UnknownFilter(index))?;
        self.record(|s| s.filter_index = index);
        Ok(())
    }

    /// Set the gain, clamped to `[0, 1]`
    pub fn set_volume(&mut self, volume: f64) {
        if volume.is_nan() {
            return;
        }
        self.record(|s| s.volume = volume.clamp(0.0, 1.0));
    }

    /// Set both trim bounds programmatically
    pub fn set_trim(&mut self, start: f64, end: f64) {
        self.record(|s| s.timeline.set_trim(start, end));
    }

    pub fn add_text(&mut self, content: &str) -> Option<String> {
        self.record(|s| s.overlays.add_text(content))
    }

    pub fn set_pending_text(&mut self, draft: impl Into<String>) {
        self.overlays.set_pending_text(draft);
    }

    pub fn commit_pending_text(&mut self) -> Option<String> {
        self.record(|s| s.overlays.commit_pending_text())
    }

    pub fn remove_text(&mut self, id: &str) -> bool {
        self.record(|s| s.overlays.remove_text(id))
    }

    pub fn update_text_position(&mut self, id: &str, x: f64, y: f64) -> bool {
        self.record(|s| s.overlays.update_text_position(id, x, y))
    }

    pub fn update_text_style(
        &mut self,
        id: &str,
        color: Option<&str>,
        font_size: Option<u32>,
    ) -> bool {
        self.record(|s| s.overlays.update_text_style(id, color, font_size))
    }

    pub fn add_sticker(&mut self, symbol: &str) -> Option<String> {
        self.record(|s| s.overlays.add_sticker(symbol))
    }

    pub fn remove_sticker(&mut self, id: &str) -> bool {
        self.record(|s| s.overlays.remove_sticker(id))
    }

    pub fn update_sticker_position(&mut self, id: &str, x: f64, y: f64) -> bool {
        self.record(|s| s.overlays.update_sticker_position(id, x, y))
    }

    pub fn update_sticker_transform(&mut self, id: &str, scale: f64, rotation: f64) -> bool {
        self.record(|s| s.overlays.update_sticker_transform(id, scale, rotation))
    }

    /// Group the following edits into one history entry, e.g. an overlay drag
    pub fn begin_gesture(&mut self) {
        if self.gesture.is_none() {
            self.gesture = Some(self.capture());
        }
    }

    /// Close the open gesture; returns true if it produced a history entry
    pub fn end_gesture(&mut self) -> bool {
        self.trim_gesture = false;
        let Some(before) = self.gesture.take() else {
            return false;
        };
        if self.capture() == before {
            return false;
        }
        self.commit_snapshot(before);
        true
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    /// Restore the previous edit; playback position is left alone
    pub fn undo(&mut self) -> bool {
        if self.gesture.is_some() || !self.phase.is_editing() {
            return false;
        }
        let current = self.capture();
        let Some(previous) = self.history.undo(current) else {
            return false;
        };
        self.apply(previous);
        self.history.finish_restore();
        self.notify_history();
        true
    }

    pub fn redo(&mut self) -> bool {
        if self.gesture.is_some() || !self.phase.is_editing() {
            return false;
        }
        let current = self.capture();
        let Some(next) = self.history.redo(current) else {
            return false;
        };
        self.apply(next);
        self.history.finish_restore();
        self.notify_history();
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_count(&self) -> usize {
        self.history.undo_count()
    }

    /// Current editable state
    pub fn capture(&self) -> EditSnapshot {
        let (trim_start, trim_end) = self.timeline.trim_window();
        EditSnapshot {
            filter_index: self.filter_index,
            volume: self.volume,
            trim_start,
            trim_end,
            text_overlays: self.overlays.texts().to_vec(),
            sticker_overlays: self.overlays.stickers().to_vec(),
        }
    }

    fn apply(&mut self, snapshot: EditSnapshot) {
        self.filter_index = snapshot.filter_index;
        self.volume = snapshot.volume;
        self.timeline.set_trim(snapshot.trim_start, snapshot.trim_end);
        self.overlays
            .restore(snapshot.text_overlays, snapshot.sticker_overlays);
    }

    /// Run an edit, saving the prior state if the edit changed anything
    fn record<R>(&mut self, edit: impl FnOnce(&mut Self) -> R) -> R {
        if self.gesture.is_some() {
            return edit(self);
        }
        let before = self.capture();
        let result = edit(self);
        if self.capture() != before {
            self.commit_snapshot(before);
        }
        result
    }

    fn commit_snapshot(&mut self, before: EditSnapshot) {
        if self.history.save_snapshot(before) {
            self.notify_history();
        }
    }

    fn notify_history(&self) {
        if let Some(events) = &self.events {
            let _ = EventEmitter::history_changed(
                events.as_ref(),
                self.id,
                self.history.can_undo(),
                self.history.can_redo(),
            );
        }
    }

    // ------------------------------------------------------------------
    // Timeline
    // ------------------------------------------------------------------

    pub fn begin_drag(&mut self, handle: DragHandle, bounds: TimelineBounds) {
        if !self.timeline.is_loaded() {
            return;
        }
        if handle != DragHandle::Playhead && self.gesture.is_none() {
            self.begin_gesture();
            self.trim_gesture = true;
        }
        self.timeline.begin_drag(handle, bounds);
    }

    pub fn on_drag_move(&mut self, pointer_x: f64) -> Option<DragHandle> {
        self.timeline.on_drag_move(pointer_x)
    }

    pub fn end_drag(&mut self) -> Option<DragHandle> {
        let handle = self.timeline.end_drag();
        if self.trim_gesture {
            self.end_gesture();
        }
        handle
    }

    pub fn on_time_update(&mut self) {
        self.timeline.on_time_update();
    }

    pub fn toggle_play_pause(&mut self) -> EditorResult<bool> {
        self.timeline.toggle_play_pause()
    }

    pub fn seek_to(&mut self, time: f64) {
        self.timeline.seek_to(time);
    }

    pub async fn generate_thumbnails(&mut self) -> EditorResult<&[Thumbnail]> {
        self.timeline.generate_thumbnails().await
    }

    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    /// The non-default edits of the current state
    pub fn edit_descriptor(&self) -> EditDescriptor {
        let transform = self.filter().map(|f| f.transform).unwrap_or_default();
        EditDescriptor::from_edit(
            self.timeline.trim_start(),
            self.timeline.trim_end(),
            self.timeline.duration(),
            transform,
            self.volume,
        )
    }

    /// Finish editing and hand off the result.
    ///
    /// Identity edits skip processing. In deferred mode the descriptor is
    /// handed downstream unprocessed. Otherwise the transcode service runs;
    /// if it fails, an error stage is published and, after the configured
    /// delay, the source is handed off with the descriptor instead.
    pub async fn finish(&mut self) -> EditorResult<EditCompletion> {
        if !self.phase.is_editing() {
            return Err(EditorError::InvalidStateTransition(format!(
                "Cannot finish from {} state",
                self.phase.state_name()
            )));
        }
        if !self.timeline.is_loaded() {
            return Err(EditorError::MediaNotLoaded);
        }

        if self.timeline.is_dragging() {
            self.end_drag();
        }
        self.end_gesture();
        if let Some(media) = self.timeline.media() {
            media.pause();
        }

        self.advance(ExportPhase::evaluate)?;
        let descriptor = self.edit_descriptor();

        let (output, descriptor) = if descriptor.is_identity() {
            self.advance(ExportPhase::skip)?;
            (EditOutput::Source(self.media_ref.clone()), descriptor)
        } else if self.preferences.export_mode == ExportMode::Deferred {
            self.advance(ExportPhase::defer)?;
            (EditOutput::Source(self.media_ref.clone()), descriptor)
        } else {
            self.render(descriptor).await?
        };

        let kind = self
            .phase
            .completion_kind()
            .ok_or_else(|| EditorError::Internal("finish ended before Complete".to_string()))?;

        let voiceover = self.voiceover.as_mut().and_then(|recorder| {
            if recorder.is_recording() {
                let _ = recorder.stop_recording();
            }
            recorder.take_owned()
        });

        let completion = EditCompletion {
            session_id: self.id,
            output,
            descriptor,
            text_overlays: self.overlays.texts().to_vec(),
            sticker_overlays: self.overlays.stickers().to_vec(),
            voiceover,
            kind,
        };

        app_log!(
            LogLevel::Info,
            "export",
            "Session {} finished ({:?}) -> {}",
            self.id,
            kind,
            completion.output_media_ref()
        );
        if let Some(events) = &self.events {
            let _ = EventEmitter::export_completed(
                events.as_ref(),
                self.id,
                completion.output_media_ref(),
                completion.output.is_rendered(),
                &completion.text_overlays,
                &completion.sticker_overlays,
            );
        }

        self.release();
        Ok(completion)
    }

    async fn render(
        &mut self,
        descriptor: EditDescriptor,
    ) -> EditorResult<(EditOutput, EditDescriptor)> {
        self.advance(|phase| phase.process(descriptor.clone()))?;
        app_log!(
            LogLevel::Info,
            "export",
            "Transcoding {} with {:?}",
            self.media_ref,
            descriptor
        );

        let transcoder = self.transcoder.clone();
        let on_progress = self.progress_callback();
        let result = transcoder
            .transcode(&self.media_ref, &descriptor, on_progress.clone())
            .await;

        match result {
            Ok(blob) => {
                let url = self.urls.create(blob);
                self.advance(ExportPhase::complete)?;
                Ok((EditOutput::Rendered(url), EditDescriptor::default()))
            }
            Err(e) => {
                app_log!(
                    LogLevel::Error,
                    "export",
                    "Transcode failed, falling back to source: {}",
                    e
                );
                let last_percent = self
                    .progress
                    .borrow()
                    .as_ref()
                    .map(|p| p.percent)
                    .unwrap_or(0);
                on_progress(ExportProgress::new(
                    ExportStage::Error,
                    last_percent,
                    e.to_string(),
                ));
                tokio::time::sleep(self.preferences.export_fallback_delay()).await;

                self.advance(|phase| phase.fall_back(e.to_string()))?;
                Ok((EditOutput::Source(self.media_ref.clone()), descriptor))
            }
        }
    }

    fn progress_callback(&self) -> ProgressCallback {
        let sender = self.progress.clone();
        let events = self.events.clone();
        let session_id = self.id;

        Arc::new(move |update: ExportProgress| {
            app_log!(
                LogLevel::Debug,
                "export",
                "{} {}%: {}",
                update.stage.as_str(),
                update.percent,
                update.message
            );
            if let Some(events) = &events {
                let _ = EventEmitter::export_progress(
                    events.as_ref(),
                    session_id,
                    update.stage.as_str(),
                    update.percent,
                    &update.message,
                );
            }
            sender.send_replace(Some(update));
        })
    }

    fn advance(
        &mut self,
        step: impl FnOnce(ExportPhase) -> EditorResult<ExportPhase>,
    ) -> EditorResult<()> {
        let current = std::mem::replace(
            &mut self.phase,
            ExportPhase::new(self.id, self.preferences.export_mode),
        );
        self.phase = step(current)?;
        app_log!(
            LogLevel::Debug,
            "export",
            "Session {} is now {}",
            self.id,
            self.phase.state_name()
        );
        Ok(())
    }

    /// Abandon the session, releasing the device, URLs and media handle.
    ///
    /// Durable data such as offline tracks is not touched.
    pub fn discard(&mut self) {
        self.overlays.clear();
        self.release();
        app_log!(LogLevel::Info, "session", "Session {} discarded", self.id);
    }

    fn release(&mut self) {
        if let Some(recorder) = self.voiceover.as_mut() {
            recorder.shutdown();
        }
        self.timeline.unload();
        self.history.clear();
        self.gesture = None;
        self.trim_gesture = false;
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn media_ref(&self) -> &str {
        &self.media_ref
    }

    pub fn preferences(&self) -> &EditorPreferences {
        &self.preferences
    }

    pub fn timeline(&self) -> &TimelineController {
        &self.timeline
    }

    pub fn overlays(&self) -> &OverlayManager {
        &self.overlays
    }

    pub fn filter_index(&self) -> usize {
        self.filter_index
    }

    pub fn filter(&self) -> Option<&'static FilterPreset> {
        filters::preset(self.filter_index)
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn phase(&self) -> &ExportPhase {
        &self.phase
    }

    /// Latest export progress, None before processing starts
    pub fn progress(&self) -> Option<ExportProgress> {
        self.progress.borrow().clone()
    }

    pub fn subscribe_progress(&self) -> watch::Receiver<Option<ExportProgress>> {
        self.progress.subscribe()
    }
}
