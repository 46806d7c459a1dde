/// State Machine Pattern for the export flow
///
/// This module implements a type-safe state machine over an editing session's
/// finish action. Each phase is its own type, so only the transitions valid
/// for the current phase can be called.
///
/// # States
///
/// - `Editing` - User is freely mutating the session
/// - `Evaluating` - Deciding whether the edit needs processing
/// - `Processing` - Transcode service is running
/// - `Complete` - Result handed off
///
/// # Example
///
/// ```ignore
/// let flow = ExportFlow::new(session_id, ExportMode::Render);
/// let flow = flow.evaluate();
/// let flow = flow.process(descriptor);
/// let flow = flow.complete();
/// assert_eq!(flow.state.kind, CompletionKind::Rendered);
/// ```
pub mod states;
pub mod transitions;
pub mod wrapper;

pub use states::*;
pub use wrapper::*;

use crate::preferences::ExportMode;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Export flow with type-safe state
///
/// The generic parameter `S` represents the current phase.
#[derive(Debug, Clone)]
pub struct ExportFlow<S> {
    /// Editing session this flow belongs to
    pub session_id: Uuid,

    /// Current state (type parameter ensures type safety)
    pub state: S,

    /// When the session started editing
    pub created_at: DateTime<Utc>,

    /// How a non-identity edit is finished
    pub mode: ExportMode,
}

impl<S> ExportFlow<S> {
    /// Get the session ID
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn mode(&self) -> ExportMode {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_access() {
        let id = Uuid::new_v4();
        let flow = ExportFlow::new(id, ExportMode::Render);

        assert_eq!(flow.session_id(), id);
        assert_eq!(flow.mode(), ExportMode::Render);
    }
}
