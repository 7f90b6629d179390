//! PhotoBoost engine: AI gateway IO and effect execution.
mod engine;
mod export;
mod gateway;
mod types;
mod wire;

pub use engine::{EngineCommand, EngineHandle};
pub use export::{
    download_filename, ensure_output_dir, export_result, AtomicFileWriter, ExportError,
    DOWNLOAD_PREFIX,
};
pub use gateway::{
    ChannelEventSink, ChatSession, EventSink, Gateway, GatewaySettings, GeminiGateway,
    CHAT_SYSTEM_INSTRUCTION,
};
pub use types::{EditOutput, EngineEvent, FailureKind, GatewayError, ImagePayload, JobId};
