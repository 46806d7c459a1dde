use super::EditDescriptor;
use crate::error::EditorResult;
use crate::media_url::MediaBlob;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Stage reported by the transcode service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportStage {
    Loading,
    Working,
    Done,
    Error,
}

impl ExportStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportStage::Loading => "loading",
            ExportStage::Working => "working",
            ExportStage::Done => "done",
            ExportStage::Error => "error",
        }
    }
}

/// One progress update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportProgress {
    pub stage: ExportStage,
    /// 0-100
    pub percent: u8,
    pub message: String,
}

impl ExportProgress {
    pub fn new(stage: ExportStage, percent: u8, message: impl Into<String>) -> Self {
        Self {
            stage,
            percent: percent.min(100),
            message: message.into(),
        }
    }
}

pub type ProgressCallback = Arc<dyn Fn(ExportProgress) + Send + Sync>;

/// External service that applies an [`EditDescriptor`] to a source
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Produce the edited media. Progress is reported through `on_progress`
    /// in stage order: loading, working, done.
    async fn transcode(
        &self,
        source: &str,
        descriptor: &EditDescriptor,
        on_progress: ProgressCallback,
    ) -> EditorResult<MediaBlob>;
}
