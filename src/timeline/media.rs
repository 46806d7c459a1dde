use crate::error::EditorResult;
use async_trait::async_trait;
use image::RgbaImage;

/// Playable media element the timeline drives.
///
/// Implemented by the hosting application's player. A handle is only ever
/// seeked by one caller at a time; `seek` resolves once the new position has
/// been decoded.
#[async_trait]
pub trait MediaHandle: Send + Sync {
    /// Total length in seconds, None if the source could not be probed
    fn duration(&self) -> Option<f64>;

    /// Current position of the native playback clock
    fn current_time(&self) -> f64;

    /// Request a new position without waiting for it to be decoded
    fn set_current_time(&self, time: f64);

    /// Move to `time` and wait until the frame is available
    async fn seek(&self, time: f64) -> EditorResult<()>;

    fn play(&self) -> EditorResult<()>;

    fn pause(&self);

    fn is_paused(&self) -> bool;

    /// Grab the frame at the current position
    async fn capture_frame(&self) -> EditorResult<RgbaImage>;
}
