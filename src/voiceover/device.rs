use crate::error::EditorResult;
use async_trait::async_trait;

/// Audio input device.
///
/// Implemented by the hosting application. `open` fails with
/// `PermissionDenied` or `DeviceUnavailable` when capture cannot start.
#[async_trait]
pub trait Microphone: Send + Sync {
    async fn open(&self) -> EditorResult<Box<dyn CaptureStream>>;
}

/// A live capture opened by a [`Microphone`]
pub trait CaptureStream: Send {
    /// Current analyser frequency bins, each 0-255
    fn frequency_bins(&mut self) -> Vec<u8>;

    /// Encoded audio chunks produced since the last call
    fn drain_chunks(&mut self) -> Vec<Vec<u8>>;

    /// Container type of the encoded chunks, e.g. `audio/webm`
    fn mime_type(&self) -> String;

    /// Release the device. Called exactly once.
    fn stop(&mut self);
}

/// Owns a capture stream and stops it on every exit path
pub(crate) struct StreamGuard {
    stream: Box<dyn CaptureStream>,
    stopped: bool,
}

impl StreamGuard {
    pub(crate) fn new(stream: Box<dyn CaptureStream>) -> Self {
        Self {
            stream,
            stopped: false,
        }
    }

    /// Average bin magnitude normalized to `[0, 1]`
    pub(crate) fn level(&mut self) -> f32 {
        if self.stopped {
            return 0.0;
        }
        average_level(&self.stream.frequency_bins())
    }

    pub(crate) fn drain_chunks(&mut self) -> Vec<Vec<u8>> {
        if self.stopped {
            return Vec::new();
        }
        self.stream.drain_chunks()
    }

    pub(crate) fn mime_type(&self) -> String {
        self.stream.mime_type()
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub(crate) fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.stream.stop();
        }
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.stop();
    }
}

pub(crate) fn average_level(bins: &[u8]) -> f32 {
    if bins.is_empty() {
        return 0.0;
    }
    let sum: u32 = bins.iter().map(|&b| b as u32).sum();
    (sum as f32 / bins.len() as f32 / 255.0).clamp(0.0, 1.0)
}
