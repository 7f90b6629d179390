use std::sync::Arc;

use crate::handle::ImageBlob;
use crate::mode::ProcessingMode;
use crate::state::JobId;

/// One candidate file handed over by the intake boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Arc<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User dropped or picked files at the intake boundary.
    FilesDropped(Vec<IncomingFile>),
    /// User clicked "Process" on one record.
    ProcessClicked { job_id: JobId },
    /// User clicked the bulk "Process All" action.
    ProcessAllClicked,
    /// User picked a different transform for one record.
    ModeSelected { job_id: JobId, mode: ProcessingMode },
    /// User removed one record.
    RemoveClicked { job_id: JobId },
    /// User cleared the whole collection.
    ClearAllClicked,
    /// Gateway resolved a single-shot edit for a job.
    JobResolved {
        job_id: JobId,
        result: Result<ImageBlob, String>,
    },
    /// Engine finished opening (or failing to open) a chat session.
    ChatOpenResolved {
        job_id: JobId,
        result: Result<(), String>,
    },
    /// User submitted a chat message for a job.
    ChatMessageSubmitted { job_id: JobId, text: String },
    /// Cumulative snapshot of the assistant reply streamed so far.
    ChatStreamed { job_id: JobId, content: String },
    /// The streaming reply terminated, normally or with a failure.
    ChatTurnResolved {
        job_id: JobId,
        result: Result<(), String>,
    },
    /// User dismissed the chat surface without applying a prompt.
    ChatClosed { job_id: JobId },
    /// User applied the finalized instruction offered by the assistant.
    ApplyPromptClicked { job_id: JobId },
    /// Fallback for placeholder wiring.
    NoOp,
}
