/// Type-erased wrapper for ExportFlow<S>
///
/// This enum allows storing any ExportFlow state in a single field of the
/// editing session while keeping transitions type-checked.
use super::states::*;
use super::ExportFlow;
use crate::error::{EditorError, EditorResult};
use crate::preferences::ExportMode;
use crate::session::EditDescriptor;
use uuid::Uuid;

/// Wrapper enum that can hold ExportFlow in any state
#[derive(Debug, Clone)]
pub enum ExportPhase {
    Editing(ExportFlow<Editing>),
    Evaluating(ExportFlow<Evaluating>),
    Processing(ExportFlow<Processing>),
    Complete(ExportFlow<Complete>),
}

impl ExportPhase {
    /// Create a new flow in the Editing state
    pub fn new(session_id: Uuid, mode: ExportMode) -> Self {
        Self::Editing(ExportFlow::new(session_id, mode))
    }

    /// Get the session ID
    pub fn session_id(&self) -> Uuid {
        match self {
            Self::Editing(f) => f.session_id(),
            Self::Evaluating(f) => f.session_id(),
            Self::Processing(f) => f.session_id(),
            Self::Complete(f) => f.session_id(),
        }
    }

    pub fn mode(&self) -> ExportMode {
        match self {
            Self::Editing(f) => f.mode(),
            Self::Evaluating(f) => f.mode(),
            Self::Processing(f) => f.mode(),
            Self::Complete(f) => f.mode(),
        }
    }

    /// Get the current state as a string
    pub fn state_name(&self) -> &'static str {
        match self {
            Self::Editing(_) => "Editing",
            Self::Evaluating(_) => "Evaluating",
            Self::Processing(_) => "Processing",
            Self::Complete(_) => "Complete",
        }
    }

    /// Check if a finish is underway
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Evaluating(_) | Self::Processing(_))
    }

    pub fn is_editing(&self) -> bool {
        matches!(self, Self::Editing(_))
    }

    /// Transition to Evaluating state (only from Editing)
    pub fn evaluate(self) -> EditorResult<Self> {
        match self {
            Self::Editing(flow) => Ok(Self::Evaluating(flow.evaluate())),
            _ => Err(self.invalid("evaluate")),
        }
    }

    /// Complete without processing (only from Evaluating)
    pub fn skip(self) -> EditorResult<Self> {
        match self {
            Self::Evaluating(flow) => Ok(Self::Complete(flow.skip())),
            _ => Err(self.invalid("skip")),
        }
    }

    /// Complete with the descriptor deferred (only from Evaluating)
    pub fn defer(self) -> EditorResult<Self> {
        match self {
            Self::Evaluating(flow) => Ok(Self::Complete(flow.defer())),
            _ => Err(self.invalid("defer")),
        }
    }

    /// Transition to Processing state (only from Evaluating)
    pub fn process(self, descriptor: EditDescriptor) -> EditorResult<Self> {
        match self {
            Self::Evaluating(flow) => Ok(Self::Processing(flow.process(descriptor))),
            _ => Err(self.invalid("process")),
        }
    }

    /// Transition to Complete state (only from Processing)
    pub fn complete(self) -> EditorResult<Self> {
        match self {
            Self::Processing(flow) => Ok(Self::Complete(flow.complete())),
            _ => Err(self.invalid("complete")),
        }
    }

    /// Hand off the source after a failed transcode (only from Processing)
    pub fn fall_back(self, error: String) -> EditorResult<Self> {
        match self {
            Self::Processing(flow) => Ok(Self::Complete(flow.fall_back(error))),
            _ => Err(self.invalid("fall back")),
        }
    }

    /// How the flow completed, None until Complete
    pub fn completion_kind(&self) -> Option<CompletionKind> {
        match self {
            Self::Complete(f) => Some(f.state.kind),
            _ => None,
        }
    }

    /// Descriptor being transcoded, while Processing
    pub fn descriptor(&self) -> Option<&EditDescriptor> {
        match self {
            Self::Processing(f) => Some(&f.state.descriptor),
            _ => None,
        }
    }

    /// Get the transcode error if the flow fell back
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Complete(f) => f.state.error.as_deref(),
            _ => None,
        }
    }

    fn invalid(&self, action: &str) -> EditorError {
        EditorError::InvalidStateTransition(format!(
            "Cannot {} from {} state",
            action,
            self.state_name()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_phase() -> ExportPhase {
        ExportPhase::new(Uuid::new_v4(), ExportMode::Render)
    }

    #[test]
    fn test_new_phase() {
        let phase = new_phase();

        assert_eq!(phase.state_name(), "Editing");
        assert!(phase.is_editing());
        assert!(!phase.is_active());
        assert!(phase.completion_kind().is_none());
    }

    #[test]
    fn test_full_render_path() {
        let phase = new_phase();
        let session_id = phase.session_id();

        let phase = phase.evaluate().unwrap();
        assert!(phase.is_active());

        let descriptor = EditDescriptor {
            trim_start: Some(1.0),
            ..Default::default()
        };
        let phase = phase.process(descriptor.clone()).unwrap();
        assert_eq!(phase.state_name(), "Processing");
        assert_eq!(phase.descriptor(), Some(&descriptor));

        let phase = phase.complete().unwrap();
        assert_eq!(phase.completion_kind(), Some(CompletionKind::Rendered));
        assert_eq!(phase.session_id(), session_id);
        assert!(!phase.is_active());
    }

    #[test]
    fn test_fall_back_records_error() {
        let phase = new_phase()
            .evaluate()
            .unwrap()
            .process(EditDescriptor::default())
            .unwrap()
            .fall_back("timeout".to_string())
            .unwrap();

        assert_eq!(phase.completion_kind(), Some(CompletionKind::FellBack));
        assert_eq!(phase.error(), Some("timeout"));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(matches!(
            new_phase().complete(),
            Err(EditorError::InvalidStateTransition(_))
        ));
        assert!(new_phase().skip().is_err());

        let done = new_phase().evaluate().unwrap().skip().unwrap();
        assert!(matches!(
            done.evaluate(),
            Err(EditorError::InvalidStateTransition(msg)) if msg.contains("Complete")
        ));
    }
}
