use crate::handle::ImageBlob;
use crate::state::JobId;

/// IO the update function asked for. The platform layer executes these
/// against the engine; the state machine itself never touches the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Single-shot gateway edit: one call, one image or one failure.
    SubmitEdit {
        job_id: JobId,
        image: ImageBlob,
        instruction: String,
    },
    /// Lazily open the gateway chat session for a job.
    OpenChat { job_id: JobId },
    /// Dispatch one conversational turn. `image` is set on the first turn
    /// of a session only.
    SendChatTurn {
        job_id: JobId,
        text: String,
        image: Option<ImageBlob>,
    },
    /// Drop the gateway session for a job (mode changed away, or removal).
    DiscardChat { job_id: JobId },
}
