use async_trait::async_trait;
use image::RgbaImage;
use reelcut::offline_cache::TrackFetcher;
use reelcut::repository::{PreferencesRepository, RepositoryManager};
use reelcut::session::{ExportProgress, ExportStage, ProgressCallback, Transcoder};
use reelcut::state_machine::CompletionKind;
use reelcut::voiceover::{CaptureStream, Microphone};
use reelcut::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

struct Player {
    duration: f64,
    time: Mutex<f64>,
    paused: Mutex<bool>,
}

impl Player {
    fn new(duration: f64) -> Arc<Self> {
        Arc::new(Self {
            duration,
            time: Mutex::new(0.0),
            paused: Mutex::new(true),
        })
    }

    fn advance_to(&self, time: f64) {
        *self.time.lock().unwrap() = time;
    }
}

#[async_trait]
impl MediaHandle for Player {
    fn duration(&self) -> Option<f64> {
        Some(self.duration)
    }

    fn current_time(&self) -> f64 {
        *self.time.lock().unwrap()
    }

    fn set_current_time(&self, time: f64) {
        *self.time.lock().unwrap() = time;
    }

    async fn seek(&self, time: f64) -> EditorResult<()> {
        self.set_current_time(time);
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
        Ok(RgbaImage::new(90, 120))
    }
}

struct Encoder {
    calls: AtomicUsize,
    fail: bool,
}

impl Encoder {
    fn new(fail: bool) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail,
        })
    }
}

#[async_trait]
impl Transcoder for Encoder {
    async fn transcode(
        &self,
        _source: &str,
        _descriptor: &EditDescriptor,
        on_progress: ProgressCallback,
    ) -> EditorResult<MediaBlob> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        on_progress(ExportProgress::new(ExportStage::Loading, 0, "Loading"));
        if self.fail {
            return Err(EditorError::TranscodeFailed("out of memory".to_string()));
        }
        on_progress(ExportProgress::new(ExportStage::Working, 60, "Encoding"));
        on_progress(ExportProgress::new(ExportStage::Done, 100, "Done"));
        Ok(MediaBlob::new(b"rendered".to_vec(), "video/mp4"))
    }
}

#[derive(Default)]
struct CannedFetcher {
    bodies: HashMap<String, Vec<u8>>,
}

#[async_trait]
impl TrackFetcher for CannedFetcher {
    async fn fetch(&self, url: &str) -> EditorResult<Vec<u8>> {
        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| EditorError::DownloadFailed(format!("404 for {}", url)))
    }
}

struct Mic;

struct MicStream;

impl CaptureStream for MicStream {
    fn frequency_bins(&mut self) -> Vec<u8> {
        vec![255; 8]
    }

    fn drain_chunks(&mut self) -> Vec<Vec<u8>> {
        vec![vec![1, 2]]
    }

    fn mime_type(&self) -> String {
        "audio/webm".to_string()
    }

    fn stop(&mut self) {}
}

#[async_trait]
impl Microphone for Mic {
    async fn open(&self) -> EditorResult<Box<dyn CaptureStream>> {
        Ok(Box::new(MicStream))
    }
}

fn track(id: &str, url: &str) -> TrackDescriptor {
    TrackDescriptor {
        id: id.to_string(),
        title: format!("Track {}", id),
        artist: "Artist".to_string(),
        source_url: url.to_string(),
        duration: 180.0,
        genre: None,
        mood: None,
    }
}

/// Trim, caption, undo, record a voiceover and render
#[tokio::test(start_paused = true)]
async fn test_complete_editing_workflow() {
    let urls = BlobUrlRegistry::new();
    let encoder = Encoder::new(false);
    let (events, mut received) = ChannelEventSink::new();

    let mut session = EditSession::new(
        "file:///holiday.mp4",
        encoder.clone(),
        urls.clone(),
        EditorPreferences::default(),
    )
    .unwrap()
    .with_events(Arc::new(events));

    let player = Player::new(20.0);
    session.load(player.clone()).await.unwrap();
    assert_eq!(session.timeline().thumbnails().len(), 10);
    assert_eq!(session.timeline().trim_end(), 20.0);

    // Drag the end handle to 15s across several moves
    let bounds = TimelineBounds {
        left: 0.0,
        width: 200.0,
    };
    session.begin_drag(DragHandle::End, bounds);
    session.on_drag_move(180.0);
    session.on_drag_move(150.0);
    session.end_drag();
    assert_eq!(session.timeline().trim_end(), 15.0);
    assert_eq!(session.undo_count(), 1);

    let caption = session.add_text("Summer").unwrap();
    session.update_text_position(&caption, 20.0, 80.0);
    session.set_filter(2).unwrap();
    assert_eq!(session.undo_count(), 4);

    // Undo the filter, keep the caption
    assert!(session.undo());
    assert_eq!(session.filter_index(), 0);
    assert_eq!(session.overlays().texts().len(), 1);
    assert!(session.redo());
    assert_eq!(session.filter_index(), 2);

    // Playback loops inside the trim window
    session.toggle_play_pause().unwrap();
    player.advance_to(15.2);
    session.on_time_update();
    assert_eq!(player.current_time(), 0.0);

    session.attach_voiceover(Arc::new(Mic));
    let recorder = session.voiceover_mut().unwrap();
    assert!(recorder.start_recording().await);
    tokio::time::sleep(Duration::from_millis(2500)).await;
    recorder.stop_recording().unwrap();

    let completion = session.finish().await.unwrap();
    assert_eq!(completion.kind, CompletionKind::Rendered);
    assert!(completion.output.is_rendered());
    assert!(completion.descriptor.is_identity());
    assert_eq!(completion.text_overlays[0].text, "Summer");
    assert_eq!(completion.voiceover.as_ref().unwrap().duration_seconds, 2);
    assert_eq!(encoder.calls.load(Ordering::SeqCst), 1);

    let rendered = urls.resolve(completion.output_media_ref()).unwrap();
    assert_eq!(rendered.bytes.as_slice(), b"rendered");

    let mut names = Vec::new();
    while let Ok(event) = received.try_recv() {
        names.push(event.name);
    }
    assert_eq!(names.last().map(String::as_str), Some("export:completed"));
}

/// A failed transcode hands off the source with the edits attached
#[tokio::test(start_paused = true)]
async fn test_failed_render_falls_back_to_source() {
    let encoder = Encoder::new(true);
    let mut session = EditSession::new(
        "file:///clip.mov",
        encoder,
        BlobUrlRegistry::new(),
        EditorPreferences::default(),
    )
    .unwrap();
    session.load(Player::new(12.0)).await.unwrap();
    session.set_trim(2.0, 8.0);
    session.set_volume(0.5);

    let completion = session.finish().await.unwrap();

    assert_eq!(completion.kind, CompletionKind::FellBack);
    assert_eq!(completion.output_media_ref(), "file:///clip.mov");
    assert_eq!(completion.descriptor.trim_start, Some(2.0));
    assert_eq!(completion.descriptor.trim_end, Some(8.0));
    assert_eq!(completion.descriptor.volume, Some(0.5));
    assert_eq!(session.progress().unwrap().stage, ExportStage::Error);
    assert!(session.finish().await.is_err());
}

/// Offline tracks survive a restart through the SQLite store
#[tokio::test]
async fn test_offline_tracks_persist_across_restarts() {
    let dir = TempDir::new().unwrap();
    let url = "https://cdn.example.com/tracks/sunrise.mp3";
    let mut fetcher = CannedFetcher::default();
    fetcher.bodies.insert(url.to_string(), vec![9; 64]);
    let fetcher = Arc::new(fetcher);

    {
        let (repos, prefs) = RepositoryManager::open(dir.path()).unwrap();
        let cache = OfflineTrackCache::new(repos.tracks(), fetcher.clone(), BlobUrlRegistry::new())
            .with_max_bytes(prefs.max_offline_cache_bytes);
        cache.load().unwrap();

        assert_eq!(cache.download_track(&track("sunrise", url)).await, DownloadOutcome::Downloaded);
        assert!(matches!(
            cache.download_track(&track("gone", "https://cdn.example.com/gone.mp3")).await,
            DownloadOutcome::Failed(_)
        ));
        repos.preferences().save_preferences(&prefs).unwrap();
    }

    let (repos, _) = RepositoryManager::open(dir.path()).unwrap();
    assert!(repos.preferences().has_preferences().unwrap());
    let urls = BlobUrlRegistry::new();
    let cache = OfflineTrackCache::new(repos.tracks(), fetcher, urls.clone());
    assert_eq!(cache.load().unwrap(), 1);
    assert!(cache.is_downloaded("sunrise"));
    assert_eq!(cache.total_bytes(), 64);

    let offline = cache.get_offline_url("sunrise").unwrap().unwrap();
    assert_eq!(urls.resolve(offline.as_str()).unwrap().mime_type, "audio/mpeg");

    cache.remove_track("sunrise").unwrap();
    assert!(cache.get_offline_url("sunrise").unwrap().is_none());
}
