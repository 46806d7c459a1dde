/// State type definitions for the export state machine
///
/// Each state is a distinct type, making invalid states impossible to represent.
/// State-specific data is stored in each state type.
use crate::session::EditDescriptor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Editing state - No finish requested yet
#[derive(Debug, Clone)]
pub struct Editing;

/// Evaluating state - Comparing the edit against the identity edit
#[derive(Debug, Clone)]
pub struct Evaluating {
    /// When finish was requested
    pub started_at: DateTime<Utc>,
}

/// Processing state - Transcode service is running
#[derive(Debug, Clone)]
pub struct Processing {
    /// When finish was requested
    pub started_at: DateTime<Utc>,

    /// When the transcode was started
    pub processing_started_at: DateTime<Utc>,

    /// Edit being applied
    pub descriptor: EditDescriptor,
}

/// Complete state - Result handed off
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Complete {
    /// When finish was requested
    pub started_at: DateTime<Utc>,

    /// When the result was handed off
    pub completed_at: DateTime<Utc>,

    /// How the result was produced
    pub kind: CompletionKind,

    /// Transcode error, when the source was handed off instead
    pub error: Option<String>,
}

/// How a finished session produced its output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionKind {
    /// Identity edit, nothing to process
    Skipped,

    /// Descriptor handed downstream unprocessed
    Deferred,

    /// Transcoded output handed off
    Rendered,

    /// Transcode failed; source handed off
    FellBack,
}

impl Editing {
    /// Create a new Editing state
    pub fn new() -> Self {
        Self
    }
}

impl Default for Editing {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluating {
    /// Create a new Evaluating state
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
        }
    }
}

impl Default for Evaluating {
    fn default() -> Self {
        Self::new()
    }
}

impl Processing {
    /// Create a new Processing state from Evaluating
    pub fn from_evaluating(evaluating: Evaluating, descriptor: EditDescriptor) -> Self {
        Self {
            started_at: evaluating.started_at,
            processing_started_at: Utc::now(),
            descriptor,
        }
    }

    /// Time spent transcoding so far
    pub fn elapsed(&self) -> chrono::Duration {
        Utc::now() - self.processing_started_at
    }
}

impl Complete {
    /// Create a new Complete state
    pub fn new(started_at: DateTime<Utc>, kind: CompletionKind, error: Option<String>) -> Self {
        Self {
            started_at,
            completed_at: Utc::now(),
            kind,
            error,
        }
    }

    /// Get total time from finish request to hand-off
    pub fn total_duration(&self) -> chrono::Duration {
        self.completed_at - self.started_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluating_creation() {
        let evaluating = Evaluating::new();
        assert!(evaluating.started_at <= Utc::now());
    }

    #[test]
    fn test_processing_keeps_start_time() {
        let evaluating = Evaluating::new();
        let started = evaluating.started_at;
        let descriptor = EditDescriptor {
            volume: Some(0.5),
            ..Default::default()
        };

        let processing = Processing::from_evaluating(evaluating, descriptor.clone());
        assert_eq!(processing.started_at, started);
        assert_eq!(processing.descriptor, descriptor);
        assert!(processing.processing_started_at >= started);
    }

    #[test]
    fn test_complete_duration() {
        let started = Utc::now() - chrono::Duration::seconds(3);
        let complete = Complete::new(started, CompletionKind::Rendered, None);
        assert!(complete.total_duration().num_seconds() >= 3);
    }
}
