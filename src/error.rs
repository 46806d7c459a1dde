use thiserror::Error;

/// Central error type for the editing session
#[derive(Error, Debug)]
pub enum EditorError {
    // ============================================================================
    // Media / Timeline Errors
    // ============================================================================
    #[error("Media failed to load: {0}")]
    MediaLoadFailed(String),

    #[error("No media loaded")]
    MediaNotLoaded,

    #[error("Failed to capture frame: {0}")]
    FrameCaptureFailed(String),

    #[error("Failed to create thumbnail: {0}")]
    ThumbnailCreationFailed(String),

    // ============================================================================
    // Voiceover / Device Errors
    // ============================================================================
    #[error("Microphone permission not granted")]
    PermissionDenied,

    #[error("Capture device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("A voiceover recording is already in progress")]
    RecordingInProgress,

    #[error("No active voiceover recording")]
    NoActiveRecording,

    // ============================================================================
    // Offline Cache / Network Errors
    // ============================================================================
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Track download failed: {0}")]
    DownloadFailed(String),

    #[error("Invalid track URL: {0}")]
    InvalidUrl(String),

    // ============================================================================
    // Storage Errors
    // ============================================================================
    #[error("Failed to save to storage: {0}")]
    StorageSaveFailed(String),

    #[error("Failed to load from storage: {0}")]
    StorageLoadFailed(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    // ============================================================================
    // Export Errors
    // ============================================================================
    #[error("Transcode failed: {0}")]
    TranscodeFailed(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Unknown filter preset: {0}")]
    UnknownFilter(usize),

    // ============================================================================
    // Generic/System Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Mutex lock error")]
    LockError,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

// Implement conversion from PoisonError for Mutex locks
impl<T> From<std::sync::PoisonError<T>> for EditorError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        EditorError::LockError
    }
}

// Conversion to String for a host command layer
impl From<EditorError> for String {
    fn from(error: EditorError) -> Self {
        error.to_string()
    }
}

impl From<reqwest::Error> for EditorError {
    fn from(err: reqwest::Error) -> Self {
        EditorError::NetworkError(err.to_string())
    }
}

impl From<url::ParseError> for EditorError {
    fn from(err: url::ParseError) -> Self {
        EditorError::InvalidUrl(err.to_string())
    }
}

// Helper type alias for Results
pub type EditorResult<T> = Result<T, EditorError>;
