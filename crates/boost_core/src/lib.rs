//! PhotoBoost core: pure state machine and view-model helpers.
mod effect;
mod handle;
mod mode;
mod msg;
mod prompt;
mod reconcile;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use handle::{HandleId, ImageBlob};
pub use mode::ProcessingMode;
pub use msg::{IncomingFile, Msg};
pub use prompt::{extract_final_prompt, strip_prompt_markers};
pub use reconcile::{diff, Alert, JobStamp, StatusSnapshot};
pub use state::{
    AppState, ChatPhase, ChatRole, ChatState, ChatTurn, JobId, JobRecord, JobStatus, MAX_FILES,
    MAX_FILE_SIZE_BYTES, MAX_FILE_SIZE_MB,
};
pub use update::{update, CHAT_GREETING, CHAT_OPEN_FAILED};
pub use view_model::{AppViewModel, ChatLine, ChatView, JobRowView, DOWNLOAD_PREFIX};
