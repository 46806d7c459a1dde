//! Microphone voiceover capture with live level metering.
//!
//! While recording, two tasks run on the tokio runtime: a one-second ticker
//! that advances the duration counter and a meter that samples the stream's
//! analyser every `meter_interval`, publishing the level and buffering the
//! encoded chunks. Both are aborted on stop, on discard and when the recorder
//! is dropped; the capture device is released by [`StreamGuard`].

pub mod device;

pub use device::{CaptureStream, Microphone};

use crate::app_log;
use crate::error::{EditorError, EditorResult};
use crate::events::{EventEmitter, EventSink};
use crate::logger::LogLevel;
use crate::media_url::{BlobUrlRegistry, MediaBlob, ObjectUrl};
use chrono::{DateTime, Utc};
use device::StreamGuard;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};

const DURATION_TICK: Duration = Duration::from_secs(1);

/// A finished recording
#[derive(Debug)]
pub struct VoiceoverTake {
    pub blob: MediaBlob,
    /// Preview URL, revoked when the take is dropped
    pub url: ObjectUrl,
    pub duration_seconds: u64,
    pub recorded_at: DateTime<Utc>,
}

/// Resources that only exist while recording
struct ActiveCapture {
    stream: Arc<Mutex<StreamGuard>>,
    chunks: Arc<Mutex<Vec<Vec<u8>>>>,
    ticker: JoinHandle<()>,
    meter: JoinHandle<()>,
    started_at: DateTime<Utc>,
}

impl ActiveCapture {
    /// Stop both tasks and release the device, returning the buffered audio
    fn finish(self) -> (Vec<Vec<u8>>, String) {
        self.ticker.abort();
        self.meter.abort();

        let (remaining, mime_type) = match self.stream.lock() {
            Ok(mut guard) => {
                let remaining = guard.drain_chunks();
                guard.stop();
                (remaining, guard.mime_type())
            }
            Err(_) => (Vec::new(), String::new()),
        };

        let mut chunks = match self.chunks.lock() {
            Ok(mut buffered) => std::mem::take(&mut *buffered),
            Err(_) => Vec::new(),
        };
        chunks.extend(remaining);
        (chunks, mime_type)
    }
}

impl Drop for ActiveCapture {
    fn drop(&mut self) {
        self.ticker.abort();
        self.meter.abort();
        if let Ok(mut guard) = self.stream.lock() {
            guard.stop();
        }
    }
}

/// Recorder lifecycle
enum RecorderState {
    Idle,
    Recording(ActiveCapture),
    Recorded(VoiceoverTake),
}

impl RecorderState {
    fn state_name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Recording(_) => "Recording",
            Self::Recorded(_) => "Recorded",
        }
    }
}

pub struct VoiceoverRecorder {
    microphone: Arc<dyn Microphone>,
    urls: BlobUrlRegistry,
    meter_interval: Duration,
    state: RecorderState,
    amplitude: Arc<watch::Sender<f32>>,
    duration: Arc<watch::Sender<u64>>,
    error_message: Option<String>,
    events: Option<Arc<dyn EventSink>>,
}

impl VoiceoverRecorder {
    pub fn new(
        microphone: Arc<dyn Microphone>,
        urls: BlobUrlRegistry,
        meter_interval: Duration,
    ) -> Self {
        let (amplitude, _) = watch::channel(0.0);
        let (duration, _) = watch::channel(0);
        Self {
            microphone,
            urls,
            meter_interval,
            state: RecorderState::Idle,
            amplitude: Arc::new(amplitude),
            duration: Arc::new(duration),
            error_message: None,
            events: None,
        }
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    /// Open the microphone and begin capture.
    ///
    /// Returns false if recording did not start. Device failures leave the
    /// recorder as it was and are reported through
    /// [`error_message`](Self::error_message).
    pub async fn start_recording(&mut self) -> bool {
        if matches!(self.state, RecorderState::Recording(_)) {
            app_log!(
                LogLevel::Warn,
                "voiceover",
                "{}",
                EditorError::RecordingInProgress
            );
            return false;
        }

        let stream = match self.microphone.open().await {
            Ok(stream) => stream,
            Err(e) => {
                app_log!(
                    LogLevel::Warn,
                    "voiceover",
                    "Could not start recording: {}",
                    e
                );
                self.error_message = Some(device_message(&e));
                return false;
            }
        };

        self.error_message = None;
        self.duration.send_replace(0);
        self.amplitude.send_replace(0.0);

        let stream = Arc::new(Mutex::new(StreamGuard::new(stream)));
        let chunks = Arc::new(Mutex::new(Vec::new()));
        let ticker = spawn_duration_ticker(self.duration.clone());
        let meter = spawn_meter(
            stream.clone(),
            chunks.clone(),
            self.amplitude.clone(),
            self.meter_interval,
        );

        // Any previous take is superseded here and its URL released
        self.state = RecorderState::Recording(ActiveCapture {
            stream,
            chunks,
            ticker,
            meter,
            started_at: Utc::now(),
        });

        app_log!(LogLevel::Info, "voiceover", "Recording started");
        self.notify();
        true
    }

    /// Stop capture and assemble the take
    pub fn stop_recording(&mut self) -> EditorResult<&VoiceoverTake> {
        let capture = match std::mem::replace(&mut self.state, RecorderState::Idle) {
            RecorderState::Recording(capture) => capture,
            other => {
                self.state = other;
                return Err(EditorError::NoActiveRecording);
            }
        };

        let started_at = capture.started_at;
        let (chunks, mime_type) = capture.finish();
        self.amplitude.send_replace(0.0);

        let blob = MediaBlob::from_chunks(chunks, mime_type);
        let url = self.urls.create(blob.clone());
        let duration_seconds = *self.duration.borrow();

        app_log!(
            LogLevel::Info,
            "voiceover",
            "Recording stopped: {}s, {} bytes (started {})",
            duration_seconds,
            blob.len(),
            started_at.to_rfc3339()
        );

        self.state = RecorderState::Recorded(VoiceoverTake {
            blob,
            url,
            duration_seconds,
            recorded_at: Utc::now(),
        });
        self.notify();

        match &self.state {
            RecorderState::Recorded(take) => Ok(take),
            _ => Err(EditorError::Internal("take missing after stop".to_string())),
        }
    }

    /// Drop the current take or in-progress recording and return to idle
    pub fn discard(&mut self) {
        let previous = std::mem::replace(&mut self.state, RecorderState::Idle);
        if matches!(previous, RecorderState::Idle) {
            return;
        }
        drop(previous);

        self.amplitude.send_replace(0.0);
        self.duration.send_replace(0);
        app_log!(LogLevel::Debug, "voiceover", "Take discarded");
        self.notify();
    }

    /// Tear down everything; safe to call in any state
    pub fn shutdown(&mut self) {
        self.discard();
        self.error_message = None;
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, RecorderState::Recording(_))
    }

    pub fn state_name(&self) -> &'static str {
        self.state.state_name()
    }

    pub fn take(&self) -> Option<&VoiceoverTake> {
        match &self.state {
            RecorderState::Recorded(take) => Some(take),
            _ => None,
        }
    }

    /// Hand the take to the caller, leaving the recorder idle
    pub fn take_owned(&mut self) -> Option<VoiceoverTake> {
        match std::mem::replace(&mut self.state, RecorderState::Idle) {
            RecorderState::Recorded(take) => Some(take),
            other => {
                self.state = other;
                None
            }
        }
    }

    /// User-visible message from the last failed start
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn amplitude(&self) -> f32 {
        *self.amplitude.borrow()
    }

    pub fn duration_seconds(&self) -> u64 {
        *self.duration.borrow()
    }

    pub fn subscribe_amplitude(&self) -> watch::Receiver<f32> {
        self.amplitude.subscribe()
    }

    pub fn subscribe_duration(&self) -> watch::Receiver<u64> {
        self.duration.subscribe()
    }

    fn notify(&self) {
        if let Some(events) = &self.events {
            let _ = EventEmitter::voiceover_state_changed(
                events.as_ref(),
                self.state.state_name(),
                self.duration_seconds(),
            );
        }
    }
}

fn device_message(error: &EditorError) -> String {
    match error {
        EditorError::PermissionDenied => {
            "Microphone access was denied. Allow microphone access and try again.".to_string()
        }
        EditorError::DeviceUnavailable(reason) => {
            format!("No microphone available ({}). Connect one and try again.", reason)
        }
        other => format!("Could not start recording: {}", other),
    }
}

fn spawn_duration_ticker(duration: Arc<watch::Sender<u64>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + DURATION_TICK, DURATION_TICK);
        loop {
            ticker.tick().await;
            duration.send_modify(|seconds| *seconds += 1);
        }
    })
}

fn spawn_meter(
    stream: Arc<Mutex<StreamGuard>>,
    chunks: Arc<Mutex<Vec<Vec<u8>>>>,
    amplitude: Arc<watch::Sender<f32>>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            // Publish under the stream lock so nothing lands after stop
            let Ok(mut guard) = stream.lock() else {
                break;
            };
            if guard.is_stopped() {
                break;
            }
            let level = guard.level();
            let drained = guard.drain_chunks();
            if !drained.is_empty() {
                if let Ok(mut buffered) = chunks.lock() {
                    buffered.extend(drained);
                }
            }
            amplitude.send_replace(level);
        }
    })
}

impl Drop for VoiceoverRecorder {
    fn drop(&mut self) {
        if self.is_recording() {
            app_log!(
                LogLevel::Debug,
                "voiceover",
                "Recorder dropped mid-recording, releasing device"
            );
        }
    }
}
