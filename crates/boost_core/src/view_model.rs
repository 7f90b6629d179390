use crate::handle::HandleId;
use crate::mode::ProcessingMode;
use crate::prompt::{extract_final_prompt, strip_prompt_markers};
use crate::state::{AppState, ChatPhase, ChatRole, JobId, JobStatus};

/// Prefix for exported result filenames.
pub const DOWNLOAD_PREFIX: &str = "ai-boost-";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub jobs: Vec<JobRowView>,
    pub job_count: usize,
    pub pending_count: usize,
    pub processing_any: bool,
    pub intake_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRowView {
    pub job_id: JobId,
    pub name: String,
    pub size_bytes: u64,
    pub status: JobStatus,
    pub mode: ProcessingMode,
    pub preview: HandleId,
    pub result: Option<HandleId>,
    pub error: Option<String>,
    /// Suggested artifact name once the record completed.
    pub download_name: Option<String>,
    pub chat: Option<ChatView>,
}

/// One transcript line, with `[PROMPT]` markers already stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    pub role: ChatRole,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatView {
    pub surface_open: bool,
    /// True while the session opens or a reply streams; the send action is
    /// disabled meanwhile.
    pub busy: bool,
    pub lines: Vec<ChatLine>,
    /// Candidate finalized instruction offered by the last assistant turn.
    pub final_prompt: Option<String>,
}

impl AppViewModel {
    pub(crate) fn project(state: &AppState) -> Self {
        let jobs: Vec<JobRowView> = state
            .jobs()
            .map(|job| JobRowView {
                job_id: job.id,
                name: job.name.clone(),
                size_bytes: job.source.len(),
                status: job.status,
                mode: job.mode,
                preview: job.preview,
                result: job.result,
                error: job.error.clone(),
                download_name: job
                    .result
                    .map(|_| format!("{DOWNLOAD_PREFIX}{}", job.name)),
                chat: job.chat.as_ref().map(|chat| ChatView {
                    surface_open: chat.surface_open,
                    busy: chat.phase != ChatPhase::Idle,
                    lines: chat
                        .turns
                        .iter()
                        .map(|turn| ChatLine {
                            role: turn.role,
                            text: strip_prompt_markers(&turn.content),
                        })
                        .collect(),
                    final_prompt: chat
                        .last_assistant()
                        .and_then(|turn| extract_final_prompt(&turn.content)),
                }),
            })
            .collect();

        let pending_count = jobs
            .iter()
            .filter(|job| job.status == JobStatus::Pending)
            .count();
        let processing_any = jobs.iter().any(|job| job.status == JobStatus::Processing);

        Self {
            job_count: jobs.len(),
            pending_count,
            processing_any,
            intake_error: state.intake_error().map(ToOwned::to_owned),
            jobs,
        }
    }
}
