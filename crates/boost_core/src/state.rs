use std::collections::BTreeMap;

use crate::handle::{HandleId, HandleRegistry, ImageBlob};
use crate::mode::ProcessingMode;
use crate::reconcile::{JobStamp, StatusSnapshot};
use crate::view_model::AppViewModel;

pub type JobId = u64;

/// Hard cap on the number of records the store will hold.
pub const MAX_FILES: usize = 30;
/// Per-file size limit at intake.
pub const MAX_FILE_SIZE_MB: u64 = 10;
pub const MAX_FILE_SIZE_BYTES: u64 = MAX_FILE_SIZE_MB * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Where the conversational sub-protocol currently stands for one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatPhase {
    /// Gateway session is being created.
    Opening,
    /// Awaiting user input; a new turn may be sent.
    Idle,
    /// A turn was dispatched and its reply is still streaming.
    AwaitingResponse,
}

/// Per-job conversation state for the custom-edit mode.
///
/// The gateway session itself lives engine-side; this tracks the transcript
/// and the two flags the protocol hinges on: whether a session is live and
/// whether the source image has already been sent on a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatState {
    pub turns: Vec<ChatTurn>,
    pub phase: ChatPhase,
    /// Whether the chat surface is currently shown to the user.
    pub surface_open: bool,
    /// Set once the gateway session opened successfully.
    pub session_live: bool,
    /// The image rides along on the first dispatched turn only.
    pub image_sent: bool,
}

impl ChatState {
    pub(crate) fn opening() -> Self {
        Self {
            turns: Vec::new(),
            phase: ChatPhase::Opening,
            surface_open: true,
            session_live: false,
            image_sent: false,
        }
    }

    pub fn last_assistant(&self) -> Option<&ChatTurn> {
        self.turns
            .last()
            .filter(|turn| turn.role == ChatRole::Assistant)
    }

    pub(crate) fn last_assistant_mut(&mut self) -> Option<&mut ChatTurn> {
        self.turns
            .last_mut()
            .filter(|turn| turn.role == ChatRole::Assistant)
    }
}

/// One uploaded image's end-to-end processing state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub id: JobId,
    pub name: String,
    /// Immutable source bytes as uploaded.
    pub source: ImageBlob,
    /// Renderable handle to the source, for preview.
    pub preview: HandleId,
    pub status: JobStatus,
    pub mode: ProcessingMode,
    /// Present exactly when `status == Completed`.
    pub result: Option<HandleId>,
    /// Present exactly when `status == Error`.
    pub error: Option<String>,
    pub chat: Option<ChatState>,
}

impl JobRecord {
    /// The "exactly one of result/error/neither" lifecycle invariant.
    pub fn invariant_holds(&self) -> bool {
        match self.status {
            JobStatus::Completed => self.result.is_some() && self.error.is_none(),
            JobStatus::Error => self.error.is_some() && self.result.is_none(),
            JobStatus::Pending | JobStatus::Processing => {
                self.result.is_none() && self.error.is_none()
            }
        }
    }
}

/// The job store plus everything it owns: records in insertion order (ids
/// ascend and are never reused, so the BTreeMap iterates in display order),
/// the renderable-handle registry, and the last intake report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    pub(crate) jobs: BTreeMap<JobId, JobRecord>,
    pub(crate) next_job_id: JobId,
    pub(crate) handles: HandleRegistry,
    pub(crate) intake_error: Option<String>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel::project(self)
    }

    pub fn job(&self, id: JobId) -> Option<&JobRecord> {
        self.jobs.get(&id)
    }

    pub fn jobs(&self) -> impl Iterator<Item = &JobRecord> {
        self.jobs.values()
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    pub fn intake_error(&self) -> Option<&str> {
        self.intake_error.as_deref()
    }

    /// Resolves a renderable handle to its blob, if still live.
    pub fn blob(&self, id: HandleId) -> Option<&ImageBlob> {
        self.handles.get(id)
    }

    /// Number of live renderable handles; zero once every record released
    /// its images.
    pub fn live_handles(&self) -> usize {
        self.handles.live_count()
    }

    /// Lightweight per-record status stamp for the completion reconciler.
    pub fn status_snapshot(&self) -> StatusSnapshot {
        self.jobs
            .values()
            .map(|job| JobStamp {
                id: job.id,
                name: job.name.clone(),
                status: job.status,
            })
            .collect()
    }

    pub(crate) fn job_mut(&mut self, id: JobId) -> Option<&mut JobRecord> {
        self.jobs.get_mut(&id)
    }

    pub(crate) fn allocate_job_id(&mut self) -> JobId {
        self.next_job_id += 1;
        self.next_job_id
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns whether a re-render is due and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    #[cfg(debug_assertions)]
    pub(crate) fn assert_invariants(&self) {
        for job in self.jobs.values() {
            debug_assert!(
                job.invariant_holds(),
                "job {} violates result/error invariant",
                job.id
            );
        }
    }
}
