//! Timeline controller: trim bounds, playhead and scrubber thumbnails.
//!
//! Pointer gestures arrive as x positions within the timeline's bounding box
//! and are mapped linearly onto `[0, duration]`. Trim bounds are clamped in
//! the mutating operation so `trim_end - trim_start` never drops below the
//! minimum window.

pub mod media;
pub mod thumbnails;

pub use media::MediaHandle;
pub use thumbnails::{Thumbnail, ThumbnailSpec};

use crate::app_log;
use crate::error::{EditorError, EditorResult};
use crate::logger::LogLevel;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default minimum trim window in seconds
pub const MIN_TRIM_WINDOW: f64 = 1.0;

/// Which part of the timeline is being dragged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragHandle {
    Start,
    End,
    Playhead,
}

/// Horizontal extent of the timeline element, in pointer coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineBounds {
    pub left: f64,
    pub width: f64,
}

impl TimelineBounds {
    pub fn new(left: f64, width: f64) -> Self {
        Self { left, width }
    }

    /// Fraction of the width at `pointer_x`, clamped to `[0, 1]`
    pub fn fraction_at(&self, pointer_x: f64) -> f64 {
        if self.width <= 0.0 {
            return 0.0;
        }
        ((pointer_x - self.left) / self.width).clamp(0.0, 1.0)
    }
}

/// Pointer tracking. Move events are only consumed while `Active`.
#[derive(Debug, Clone, Copy, PartialEq)]
enum DragState {
    Idle,
    Active {
        handle: DragHandle,
        bounds: TimelineBounds,
    },
}

pub struct TimelineController {
    media: Option<Arc<dyn MediaHandle>>,
    duration: f64,
    trim_start: f64,
    trim_end: f64,
    playhead_time: f64,
    min_window: f64,
    thumbnail_spec: ThumbnailSpec,
    thumbnails: Vec<Thumbnail>,
    drag: DragState,
}

impl TimelineController {
    pub fn new(min_window: f64, thumbnail_spec: ThumbnailSpec) -> Self {
        Self {
            media: None,
            duration: 0.0,
            trim_start: 0.0,
            trim_end: 0.0,
            playhead_time: 0.0,
            min_window,
            thumbnail_spec,
            thumbnails: Vec::new(),
            drag: DragState::Idle,
        }
    }

    /// Attach a media handle and reset the trim window to the full source.
    ///
    /// Fails if the handle cannot report a usable duration. Thumbnail
    /// sampling runs once here; a sampling failure is logged and can be
    /// retried with [`generate_thumbnails`](Self::generate_thumbnails).
    pub async fn load(&mut self, media: Arc<dyn MediaHandle>) -> EditorResult<()> {
        let duration = match media.duration() {
            Some(d) if d.is_finite() && d > 0.0 => d,
            other => {
                app_log!(
                    LogLevel::Error,
                    "timeline",
                    "Media reported unusable duration: {:?}",
                    other
                );
                return Err(EditorError::MediaLoadFailed(format!(
                    "media reported no usable duration ({:?})",
                    other
                )));
            }
        };

        self.media = Some(media);
        self.duration = duration;
        self.trim_start = 0.0;
        self.trim_end = duration;
        self.playhead_time = 0.0;
        self.thumbnails.clear();
        self.drag = DragState::Idle;

        app_log!(LogLevel::Info, "timeline", "Loaded media ({:.2}s)", duration);

        if let Err(e) = self.generate_thumbnails().await {
            app_log!(
                LogLevel::Warn,
                "timeline",
                "Thumbnail generation failed: {}",
                e
            );
        }
        Ok(())
    }

    /// Sample scrubber thumbnails; no-op while samples already exist
    pub async fn generate_thumbnails(&mut self) -> EditorResult<&[Thumbnail]> {
        if !self.thumbnails.is_empty() {
            return Ok(&self.thumbnails);
        }
        let media = self.media.clone().ok_or(EditorError::MediaNotLoaded)?;

        let thumbnails =
            thumbnails::generate(media.as_ref(), self.duration, &self.thumbnail_spec).await?;
        app_log!(
            LogLevel::Debug,
            "timeline",
            "Generated {} thumbnails",
            thumbnails.len()
        );
        self.thumbnails = thumbnails;
        Ok(&self.thumbnails)
    }

    /// Mirror the native playback clock, looping at the trim end.
    ///
    /// Ignored while a drag is active.
    pub fn on_time_update(&mut self) {
        if self.is_dragging() {
            return;
        }
        let Some(media) = self.media.as_ref() else {
            return;
        };

        let now = media.current_time();
        if now >= self.trim_end {
            media.set_current_time(self.trim_start);
            self.playhead_time = self.trim_start;
        } else {
            self.playhead_time = now.clamp(self.trim_start, self.trim_end);
        }
    }

    /// Start tracking pointer movement for `handle`
    pub fn begin_drag(&mut self, handle: DragHandle, bounds: TimelineBounds) {
        if self.media.is_none() {
            return;
        }
        self.drag = DragState::Active { handle, bounds };
    }

    /// Apply a pointer move; returns the dragged handle, or None when idle
    pub fn on_drag_move(&mut self, pointer_x: f64) -> Option<DragHandle> {
        let DragState::Active { handle, bounds } = self.drag else {
            return None;
        };
        let time = self.position_to_time(pointer_x, &bounds);

        match handle {
            DragHandle::Start => self.drag_start_to(time),
            DragHandle::End => self.drag_end_to(time),
            DragHandle::Playhead => self.seek_to(time),
        }
        Some(handle)
    }

    /// Stop tracking pointer movement; returns the handle that was released
    pub fn end_drag(&mut self) -> Option<DragHandle> {
        match std::mem::replace(&mut self.drag, DragState::Idle) {
            DragState::Active { handle, .. } => {
                app_log!(
                    LogLevel::Debug,
                    "timeline",
                    "Drag {:?} released at [{:.2}, {:.2}]",
                    handle,
                    self.trim_start,
                    self.trim_end
                );
                Some(handle)
            }
            DragState::Idle => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Active { .. })
    }

    pub fn active_drag(&self) -> Option<DragHandle> {
        match self.drag {
            DragState::Active { handle, .. } => Some(handle),
            DragState::Idle => None,
        }
    }

    /// Play or pause; returns true when playback is now running.
    ///
    /// Starting from outside the trim window jumps to the trim start first.
    pub fn toggle_play_pause(&mut self) -> EditorResult<bool> {
        let media = self.media.as_ref().ok_or(EditorError::MediaNotLoaded)?;

        if media.is_paused() {
            let now = media.current_time();
            if now < self.trim_start || now > self.trim_end {
                media.set_current_time(self.trim_start);
                self.playhead_time = self.trim_start;
            }
            media.play()?;
            Ok(true)
        } else {
            media.pause();
            Ok(false)
        }
    }

    /// Move the playhead, clamped to the trim window
    pub fn seek_to(&mut self, time: f64) {
        if time.is_nan() {
            return;
        }
        let clamped = time.clamp(self.trim_start, self.trim_end);
        if let Some(media) = self.media.as_ref() {
            media.set_current_time(clamped);
        }
        self.playhead_time = clamped;
    }

    /// Replace both trim bounds, keeping the window valid.
    ///
    /// Non-finite bounds are rejected and leave the window as it was.
    pub fn set_trim(&mut self, start: f64, end: f64) {
        if !(start.is_finite() && end.is_finite()) {
            app_log!(
                LogLevel::Warn,
                "timeline",
                "Ignoring non-finite trim [{}, {}]",
                start,
                end
            );
            return;
        }
        let window = self.effective_min_window();
        let start = start.clamp(0.0, (self.duration - window).max(0.0));
        let end = end.clamp(start + window, self.duration.max(start + window));
        self.trim_start = start;
        self.trim_end = end;
        self.playhead_time = self.playhead_time.clamp(self.trim_start, self.trim_end);
    }

    fn drag_start_to(&mut self, time: f64) {
        let limit = self.trim_end - self.effective_min_window();
        self.trim_start = time.min(limit).max(0.0);
    }

    fn drag_end_to(&mut self, time: f64) {
        let limit = self.trim_start + self.effective_min_window();
        self.trim_end = time.max(limit).min(self.duration);
    }

    /// The configured minimum, shrunk for sources shorter than it
    fn effective_min_window(&self) -> f64 {
        self.min_window.min(self.duration)
    }

    pub fn position_to_time(&self, pointer_x: f64, bounds: &TimelineBounds) -> f64 {
        bounds.fraction_at(pointer_x) * self.duration
    }

    pub fn time_to_position(&self, time: f64, bounds: &TimelineBounds) -> f64 {
        if self.duration <= 0.0 {
            return bounds.left;
        }
        bounds.left + (time / self.duration).clamp(0.0, 1.0) * bounds.width
    }

    pub fn is_loaded(&self) -> bool {
        self.media.is_some()
    }

    pub fn media(&self) -> Option<&Arc<dyn MediaHandle>> {
        self.media.as_ref()
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn trim_start(&self) -> f64 {
        self.trim_start
    }

    pub fn trim_end(&self) -> f64 {
        self.trim_end
    }

    pub fn trim_window(&self) -> (f64, f64) {
        (self.trim_start, self.trim_end)
    }

    pub fn trim_duration(&self) -> f64 {
        self.trim_end - self.trim_start
    }

    pub fn playhead_time(&self) -> f64 {
        self.playhead_time
    }

    /// Playhead position as a fraction of the full source
    pub fn playhead_fraction(&self) -> f64 {
        if self.duration <= 0.0 {
            0.0
        } else {
            self.playhead_time / self.duration
        }
    }

    pub fn thumbnails(&self) -> &[Thumbnail] {
        &self.thumbnails
    }

    /// Detach the media handle, pausing playback
    pub fn unload(&mut self) {
        if let Some(media) = self.media.take() {
            media.pause();
        }
        self.drag = DragState::Idle;
        self.thumbnails.clear();
    }
}

impl Default for TimelineController {
    fn default() -> Self {
        Self::new(MIN_TRIM_WINDOW, ThumbnailSpec::default())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use async_trait::async_trait;
    use image::RgbaImage;
    use std::sync::Mutex;

    /// Scripted media handle recording every seek
    pub struct FakeMedia {
        pub duration: Option<f64>,
        pub time: Mutex<f64>,
        pub paused: Mutex<bool>,
        pub seeks: Mutex<Vec<f64>>,
        pub in_flight: Mutex<usize>,
        pub max_in_flight: Mutex<usize>,
        pub fail_capture: bool,
    }

    impl FakeMedia {
        pub fn new(duration: Option<f64>) -> Self {
            Self {
                duration,
                time: Mutex::new(0.0),
                paused: Mutex::new(true),
                seeks: Mutex::new(Vec::new()),
                in_flight: Mutex::new(0),
                max_in_flight: Mutex::new(0),
                fail_capture: false,
            }
        }

        pub fn failing_capture(duration: f64) -> Self {
            Self {
                fail_capture: true,
                ..Self::new(Some(duration))
            }
        }

        pub fn set_time(&self, t: f64) {
            *self.time.lock().unwrap() = t;
        }
    }

    #[async_trait]
    impl MediaHandle for FakeMedia {
        fn duration(&self) -> Option<f64> {
            self.duration
        }

        fn current_time(&self) -> f64 {
            *self.time.lock().unwrap()
        }

        fn set_current_time(&self, time: f64) {
            *self.time.lock().unwrap() = time;
        }

        async fn seek(&self, time: f64) -> EditorResult<()> {
            {
                let mut in_flight = self.in_flight.lock().unwrap();
                *in_flight += 1;
                let mut max = self.max_in_flight.lock().unwrap();
                *max = (*max).max(*in_flight);
            }
            tokio::task::yield_now().await;
            *self.time.lock().unwrap() = time;
            self.seeks.lock().unwrap().push(time);
            *self.in_flight.lock().unwrap() -= 1;
            Ok(())
        }

        fn play(&self) -> EditorResult<()> {
            *self.paused.lock().unwrap() = false;
            Ok(())
        }

        fn pause(&self) {
            *self.paused.lock().unwrap() = true;
        }

        fn is_paused(&self) -> bool {
            *self.paused.lock().unwrap()
        }

        async fn capture_frame(&self) -> EditorResult<RgbaImage> {
            if self.fail_capture {
                return Err(EditorError::FrameCaptureFailed("decoder error".to_string()));
            }
            Ok(RgbaImage::from_pixel(120, 160, image::Rgba([0, 0, 0, 255])))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::FakeMedia;
    use super::*;

    const BOUNDS: TimelineBounds = TimelineBounds {
        left: 100.0,
        width: 300.0,
    };

    async fn loaded(duration: f64) -> (TimelineController, Arc<FakeMedia>) {
        let media = Arc::new(FakeMedia::new(Some(duration)));
        let mut timeline = TimelineController::default();
        timeline.load(media.clone()).await.unwrap();
        (timeline, media)
    }

    /// Pointer x that maps to `time` for a source of `duration`
    fn x_for(time: f64, duration: f64) -> f64 {
        BOUNDS.left + time / duration * BOUNDS.width
    }

    #[tokio::test]
    async fn test_load_sets_full_window() {
        let (timeline, _) = loaded(30.0).await;
        assert_eq!(timeline.trim_window(), (0.0, 30.0));
        assert_eq!(timeline.duration(), 30.0);
        assert_eq!(timeline.thumbnails().len(), 10);
    }

    #[tokio::test]
    async fn test_load_without_duration_fails() {
        let mut timeline = TimelineController::default();
        let result = timeline.load(Arc::new(FakeMedia::new(None))).await;
        assert!(matches!(result, Err(EditorError::MediaLoadFailed(_))));
        assert!(!timeline.is_loaded());

        let result = timeline
            .load(Arc::new(FakeMedia::new(Some(f64::NAN))))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_drag_scenario_clamps_start() {
        let (mut timeline, _) = loaded(30.0).await;

        timeline.begin_drag(DragHandle::End, BOUNDS);
        timeline.on_drag_move(x_for(10.0, 30.0));
        timeline.end_drag();
        assert!((timeline.trim_end() - 10.0).abs() < 1e-9);

        timeline.begin_drag(DragHandle::Start, BOUNDS);
        timeline.on_drag_move(x_for(15.0, 30.0));
        timeline.end_drag();
        assert!((timeline.trim_start() - 9.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_window_invariant_over_drag_sequence() {
        let (mut timeline, _) = loaded(30.0).await;
        let moves = [
            (DragHandle::End, 0.0),
            (DragHandle::Start, 400.0),
            (DragHandle::End, -50.0),
            (DragHandle::Start, 1000.0),
            (DragHandle::End, 250.0),
            (DragHandle::Start, 249.0),
        ];

        for (handle, x) in moves {
            timeline.begin_drag(handle, BOUNDS);
            timeline.on_drag_move(x);
            timeline.end_drag();
            assert!(timeline.trim_start() < timeline.trim_end());
            assert!(timeline.trim_duration() >= 1.0 - 1e-9);
            assert!(timeline.trim_start() >= 0.0);
            assert!(timeline.trim_end() <= 30.0);
        }
    }

    #[tokio::test]
    async fn test_non_finite_trim_is_ignored() {
        let (mut timeline, _) = loaded(30.0).await;
        timeline.set_trim(2.0, 20.0);

        timeline.set_trim(f64::NAN, 10.0);
        timeline.set_trim(5.0, f64::NAN);
        timeline.set_trim(f64::NEG_INFINITY, f64::INFINITY);
        assert_eq!(timeline.trim_window(), (2.0, 20.0));

        timeline.seek_to(f64::NAN);
        assert!(timeline.playhead_time().is_finite());
    }

    #[tokio::test]
    async fn test_move_without_drag_is_ignored() {
        let (mut timeline, _) = loaded(30.0).await;
        assert_eq!(timeline.on_drag_move(x_for(5.0, 30.0)), None);
        assert_eq!(timeline.trim_window(), (0.0, 30.0));

        timeline.begin_drag(DragHandle::End, BOUNDS);
        assert_eq!(timeline.end_drag(), Some(DragHandle::End));
        assert_eq!(timeline.on_drag_move(x_for(5.0, 30.0)), None);
        assert_eq!(timeline.end_drag(), None);
    }

    #[tokio::test]
    async fn test_pointer_outside_bounds_clamps() {
        let (mut timeline, _) = loaded(30.0).await;
        timeline.begin_drag(DragHandle::End, BOUNDS);
        timeline.on_drag_move(10_000.0);
        assert_eq!(timeline.trim_end(), 30.0);
        timeline.end_drag();
    }

    #[tokio::test]
    async fn test_playhead_drag_seeks_within_window() {
        let (mut timeline, media) = loaded(30.0).await;
        timeline.set_trim(5.0, 20.0);

        timeline.begin_drag(DragHandle::Playhead, BOUNDS);
        timeline.on_drag_move(x_for(25.0, 30.0));
        assert_eq!(media.current_time(), 20.0);
        timeline.on_drag_move(x_for(1.0, 30.0));
        assert_eq!(media.current_time(), 5.0);
        assert_eq!(timeline.playhead_time(), 5.0);
        timeline.end_drag();
    }

    #[tokio::test]
    async fn test_time_update_loops_at_trim_end() {
        let (mut timeline, media) = loaded(30.0).await;
        timeline.set_trim(2.0, 8.0);

        media.set_time(4.5);
        timeline.on_time_update();
        assert_eq!(timeline.playhead_time(), 4.5);

        media.set_time(8.0);
        timeline.on_time_update();
        assert_eq!(media.current_time(), 2.0);
        assert_eq!(timeline.playhead_time(), 2.0);
    }

    #[tokio::test]
    async fn test_time_update_ignored_while_dragging() {
        let (mut timeline, media) = loaded(30.0).await;
        timeline.begin_drag(DragHandle::Start, BOUNDS);
        media.set_time(12.0);
        timeline.on_time_update();
        assert_eq!(timeline.playhead_time(), 0.0);
    }

    #[tokio::test]
    async fn test_toggle_jumps_into_window() {
        let (mut timeline, media) = loaded(30.0).await;
        timeline.set_trim(10.0, 20.0);
        media.set_time(25.0);

        assert!(timeline.toggle_play_pause().unwrap());
        assert_eq!(media.current_time(), 10.0);
        assert!(!media.is_paused());

        assert!(!timeline.toggle_play_pause().unwrap());
        assert!(media.is_paused());
    }

    #[tokio::test]
    async fn test_toggle_inside_window_keeps_position() {
        let (mut timeline, media) = loaded(30.0).await;
        media.set_time(12.0);
        timeline.toggle_play_pause().unwrap();
        assert_eq!(media.current_time(), 12.0);
    }

    #[tokio::test]
    async fn test_thumbnails_serial_and_return_to_zero() {
        let (mut timeline, media) = loaded(30.0).await;

        assert_eq!(*media.max_in_flight.lock().unwrap(), 1);
        let seeks = media.seeks.lock().unwrap().clone();
        assert_eq!(seeks.len(), 11);
        assert_eq!(*seeks.last().unwrap(), 0.0);
        assert_eq!(media.current_time(), 0.0);

        // Second call is a no-op
        let count = timeline.generate_thumbnails().await.unwrap().len();
        assert_eq!(count, 10);
        assert_eq!(media.seeks.lock().unwrap().len(), 11);
    }

    #[tokio::test]
    async fn test_failed_sampling_still_returns_to_zero() {
        let media = Arc::new(FakeMedia::failing_capture(30.0));
        let mut timeline = TimelineController::default();
        timeline.load(media.clone()).await.unwrap();

        assert!(timeline.thumbnails().is_empty());
        assert_eq!(media.current_time(), 0.0);
        assert!(timeline.generate_thumbnails().await.is_err());
    }

    #[tokio::test]
    async fn test_short_source_window() {
        let (mut timeline, _) = loaded(0.5).await;
        timeline.begin_drag(DragHandle::Start, BOUNDS);
        timeline.on_drag_move(BOUNDS.left + BOUNDS.width);
        timeline.end_drag();
        assert_eq!(timeline.trim_window(), (0.0, 0.5));
    }

    #[tokio::test]
    async fn test_position_time_mapping() {
        let (timeline, _) = loaded(30.0).await;
        assert_eq!(timeline.position_to_time(100.0, &BOUNDS), 0.0);
        assert_eq!(timeline.position_to_time(400.0, &BOUNDS), 30.0);
        assert_eq!(timeline.time_to_position(15.0, &BOUNDS), 250.0);
    }
}
