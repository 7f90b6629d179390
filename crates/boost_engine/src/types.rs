use std::fmt;
use std::sync::Arc;

pub type JobId = u64;

/// Source image handed to the gateway: raw bytes plus media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub bytes: Arc<Vec<u8>>,
    pub media_type: String,
}

impl ImagePayload {
    pub fn new(bytes: impl Into<Vec<u8>>, media_type: impl Into<String>) -> Self {
        Self {
            bytes: Arc::new(bytes.into()),
            media_type: media_type.into(),
        }
    }
}

/// Output image returned by a single-shot edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutput {
    pub bytes: Vec<u8>,
    pub media_type: String,
}

/// Everything the engine reports back to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A single-shot edit resolved, one way or the other.
    EditResolved {
        job_id: JobId,
        result: Result<EditOutput, GatewayError>,
    },
    /// A chat session finished opening (or failed to).
    ChatOpened {
        job_id: JobId,
        result: Result<(), GatewayError>,
    },
    /// Cumulative snapshot of the assistant reply streamed so far.
    ChatDelta { job_id: JobId, content: String },
    /// The streaming turn terminated, normally or with a failure.
    ChatTurnFinished {
        job_id: JobId,
        result: Result<(), GatewayError>,
    },
}

/// A gateway failure with a user-presentable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayError {
    pub kind: FailureKind,
    pub message: String,
}

impl GatewayError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for GatewayError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    Network,
    Timeout,
    HttpStatus(u16),
    /// The service refused the request, e.g. a safety filter.
    Blocked { reason: String },
    /// The model answered with text instead of an image.
    NoImage,
    /// The response carried neither an image nor an explanation.
    EmptyResponse,
    /// The response body could not be understood.
    InvalidResponse,
    /// A chat turn arrived for a job with no open session.
    NoSession,
    /// Missing api key or an unusable client configuration.
    Configuration,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Blocked { reason } => write!(f, "blocked ({reason})"),
            FailureKind::NoImage => write!(f, "no image in response"),
            FailureKind::EmptyResponse => write!(f, "empty response"),
            FailureKind::InvalidResponse => write!(f, "invalid response"),
            FailureKind::NoSession => write!(f, "no open session"),
            FailureKind::Configuration => write!(f, "configuration error"),
        }
    }
}
