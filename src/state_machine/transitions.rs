/// State transition implementations
///
/// Each transition is a method that consumes the current state and returns a new state.
/// This ensures that invalid transitions are impossible at compile time.
use super::states::*;
use super::ExportFlow;
use crate::preferences::ExportMode;
use crate::session::EditDescriptor;
use chrono::Utc;
use uuid::Uuid;

// ============================================================================
// Editing State Transitions
// ============================================================================

impl ExportFlow<Editing> {
    /// Create a new flow in the Editing state
    pub fn new(session_id: Uuid, mode: ExportMode) -> Self {
        Self {
            session_id,
            state: Editing::new(),
            created_at: Utc::now(),
            mode,
        }
    }

    /// Transition to Evaluating state
    pub fn evaluate(self) -> ExportFlow<Evaluating> {
        ExportFlow {
            session_id: self.session_id,
            state: Evaluating::new(),
            created_at: self.created_at,
            mode: self.mode,
        }
    }
}

// ============================================================================
// Evaluating State Transitions
// ============================================================================

impl ExportFlow<Evaluating> {
    /// Identity edit: complete without processing
    pub fn skip(self) -> ExportFlow<Complete> {
        self.finish(CompletionKind::Skipped)
    }

    /// Deferred mode: complete, leaving the descriptor for downstream
    pub fn defer(self) -> ExportFlow<Complete> {
        self.finish(CompletionKind::Deferred)
    }

    /// Transition to Processing state
    pub fn process(self, descriptor: EditDescriptor) -> ExportFlow<Processing> {
        ExportFlow {
            session_id: self.session_id,
            state: Processing::from_evaluating(self.state, descriptor),
            created_at: self.created_at,
            mode: self.mode,
        }
    }

    fn finish(self, kind: CompletionKind) -> ExportFlow<Complete> {
        ExportFlow {
            session_id: self.session_id,
            state: Complete::new(self.state.started_at, kind, None),
            created_at: self.created_at,
            mode: self.mode,
        }
    }
}

// ============================================================================
// Processing State Transitions
// ============================================================================

impl ExportFlow<Processing> {
    /// Transcode succeeded
    pub fn complete(self) -> ExportFlow<Complete> {
        ExportFlow {
            session_id: self.session_id,
            state: Complete::new(self.state.started_at, CompletionKind::Rendered, None),
            created_at: self.created_at,
            mode: self.mode,
        }
    }

    /// Transcode failed; the source is handed off instead
    pub fn fall_back(self, error: String) -> ExportFlow<Complete> {
        ExportFlow {
            session_id: self.session_id,
            state: Complete::new(
                self.state.started_at,
                CompletionKind::FellBack,
                Some(error),
            ),
            created_at: self.created_at,
            mode: self.mode,
        }
    }
}
