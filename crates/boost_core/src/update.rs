use crate::handle::ImageBlob;
use crate::mode::ProcessingMode;
use crate::msg::{IncomingFile, Msg};
use crate::prompt::extract_final_prompt;
use crate::state::{
    AppState, ChatPhase, ChatState, ChatTurn, JobId, JobRecord, JobStatus, MAX_FILES,
    MAX_FILE_SIZE_BYTES, MAX_FILE_SIZE_MB,
};
use crate::Effect;

/// Greeting seeded into a freshly opened chat session.
pub const CHAT_GREETING: &str = "Hello! How would you like to edit this image?";
/// Shown as the sole assistant turn when the session could not be opened.
pub const CHAT_OPEN_FAILED: &str =
    "Sorry, I couldn't start the chat session. Please try again.";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FilesDropped(files) => intake(&mut state, files),
        Msg::ProcessClicked { job_id } => process_clicked(&mut state, job_id),
        Msg::ProcessAllClicked => process_all(&mut state),
        Msg::ModeSelected { job_id, mode } => select_mode(&mut state, job_id, mode),
        Msg::RemoveClicked { job_id } => remove_job(&mut state, job_id),
        Msg::ClearAllClicked => clear_all(&mut state),
        Msg::JobResolved { job_id, result } => resolve_job(&mut state, job_id, result),
        Msg::ChatOpenResolved { job_id, result } => chat_open_resolved(&mut state, job_id, result),
        Msg::ChatMessageSubmitted { job_id, text } => chat_submit(&mut state, job_id, &text),
        Msg::ChatStreamed { job_id, content } => chat_streamed(&mut state, job_id, content),
        Msg::ChatTurnResolved { job_id, result } => chat_turn_resolved(&mut state, job_id, result),
        Msg::ChatClosed { job_id } => chat_closed(&mut state, job_id),
        Msg::ApplyPromptClicked { job_id } => apply_prompt(&mut state, job_id),
        Msg::NoOp => Vec::new(),
    };

    #[cfg(debug_assertions)]
    state.assert_invariants();

    (state, effects)
}

fn intake(state: &mut AppState, files: Vec<IncomingFile>) -> Vec<Effect> {
    if files.is_empty() {
        return Vec::new();
    }
    state.intake_error = None;
    state.mark_dirty();

    // The count cap rejects the whole batch up front; no partial additions.
    if state.jobs.len() + files.len() > MAX_FILES {
        state.intake_error = Some(format!(
            "Cannot add {} file(s), as the total would exceed the limit of {MAX_FILES}.",
            files.len()
        ));
        return Vec::new();
    }

    let mut rejected: Vec<String> = Vec::new();
    let mut accepted = 0usize;

    for file in files {
        if !file.media_type.starts_with("image/") {
            rejected.push(format!("\"{}\" was ignored (not an image).", file.name));
        } else if file.bytes.len() as u64 > MAX_FILE_SIZE_BYTES {
            rejected.push(format!(
                "\"{}\" was ignored (larger than {MAX_FILE_SIZE_MB}MB).",
                file.name
            ));
        } else {
            let source = ImageBlob {
                bytes: file.bytes,
                media_type: file.media_type,
            };
            let preview = state.handles.create(source.clone());
            let id = state.allocate_job_id();
            state.jobs.insert(
                id,
                JobRecord {
                    id,
                    name: file.name,
                    source,
                    preview,
                    status: JobStatus::Pending,
                    mode: ProcessingMode::Enhance,
                    result: None,
                    error: None,
                    chat: None,
                },
            );
            accepted += 1;
        }
    }

    if !rejected.is_empty() {
        let detail = rejected.join(" ");
        state.intake_error = Some(if accepted > 0 {
            format!("{} file(s) couldn't be added. {detail}", rejected.len())
        } else {
            format!("Couldn't add files. {detail}")
        });
    }

    Vec::new()
}

fn process_clicked(state: &mut AppState, job_id: JobId) -> Vec<Effect> {
    let Some(job) = state.job_mut(job_id) else {
        return Vec::new();
    };
    if job.status == JobStatus::Processing {
        return Vec::new();
    }

    if job.mode == ProcessingMode::CustomEdit {
        return open_chat(state, job_id);
    }

    let instruction = job.mode.instruction().to_string();
    start_edit(state, job_id, instruction)
}

/// Lazily opens the chat surface and, if needed, the gateway session.
fn open_chat(state: &mut AppState, job_id: JobId) -> Vec<Effect> {
    let Some(job) = state.job_mut(job_id) else {
        return Vec::new();
    };
    let effects = match job.chat.as_mut() {
        // Session already live or still being opened: just show the surface.
        Some(chat) if chat.session_live || chat.phase == ChatPhase::Opening => {
            chat.surface_open = true;
            Vec::new()
        }
        // Previous open attempt failed; retry from scratch.
        Some(chat) => {
            *chat = ChatState::opening();
            vec![Effect::OpenChat { job_id }]
        }
        None => {
            job.chat = Some(ChatState::opening());
            vec![Effect::OpenChat { job_id }]
        }
    };
    state.mark_dirty();
    effects
}

fn process_all(state: &mut AppState) -> Vec<Effect> {
    // Custom-edit records are skipped: without a finalized conversational
    // prompt there is no instruction to send.
    let pending: Vec<JobId> = state
        .jobs
        .values()
        .filter(|job| {
            job.status == JobStatus::Pending && job.mode != ProcessingMode::CustomEdit
        })
        .map(|job| job.id)
        .collect();

    let mut effects = Vec::with_capacity(pending.len());
    for job_id in pending {
        let instruction = match state.job(job_id) {
            Some(job) => job.mode.instruction().to_string(),
            None => continue,
        };
        effects.extend(start_edit(state, job_id, instruction));
    }
    effects
}

fn select_mode(state: &mut AppState, job_id: JobId, mode: ProcessingMode) -> Vec<Effect> {
    let mut effects = Vec::new();
    let released = {
        let Some(job) = state.job_mut(job_id) else {
            return Vec::new();
        };
        // The mode selector is disabled while a job processes.
        if job.status == JobStatus::Processing {
            return Vec::new();
        }
        if job.mode == ProcessingMode::CustomEdit && mode != ProcessingMode::CustomEdit {
            if let Some(chat) = job.chat.take() {
                if chat.session_live || chat.phase == ChatPhase::Opening {
                    effects.push(Effect::DiscardChat { job_id });
                }
            }
        }
        job.mode = mode;
        job.status = JobStatus::Pending;
        job.error = None;
        job.result.take()
    };
    if let Some(handle) = released {
        state.handles.release(handle);
    }
    state.mark_dirty();
    effects
}

fn remove_job(state: &mut AppState, job_id: JobId) -> Vec<Effect> {
    let Some(job) = state.jobs.remove(&job_id) else {
        return Vec::new();
    };
    state.handles.release(job.preview);
    if let Some(result) = job.result {
        state.handles.release(result);
    }
    state.mark_dirty();
    match job.chat {
        Some(chat) if chat.session_live || chat.phase == ChatPhase::Opening => {
            vec![Effect::DiscardChat { job_id }]
        }
        _ => Vec::new(),
    }
}

fn clear_all(state: &mut AppState) -> Vec<Effect> {
    if state.jobs.is_empty() && state.intake_error.is_none() {
        return Vec::new();
    }
    let ids: Vec<JobId> = state.jobs.keys().copied().collect();
    let mut effects = Vec::new();
    for job_id in ids {
        effects.extend(remove_job(state, job_id));
    }
    state.intake_error = None;
    state.mark_dirty();
    effects
}

/// Single-shot edit resolved on the gateway. A result for a record that no
/// longer exists, or that was reset in the meantime, is discarded.
fn resolve_job(
    state: &mut AppState,
    job_id: JobId,
    result: Result<ImageBlob, String>,
) -> Vec<Effect> {
    let processing = state
        .job(job_id)
        .map(|job| job.status == JobStatus::Processing)
        .unwrap_or(false);
    if !processing {
        return Vec::new();
    }

    match result {
        Ok(blob) => {
            let handle = state.handles.create(blob);
            if let Some(job) = state.job_mut(job_id) {
                job.status = JobStatus::Completed;
                job.result = Some(handle);
                job.error = None;
            }
        }
        Err(message) => {
            if let Some(job) = state.job_mut(job_id) {
                job.status = JobStatus::Error;
                job.error = Some(message);
                job.result = None;
            }
        }
    }
    state.mark_dirty();
    Vec::new()
}

fn chat_open_resolved(
    state: &mut AppState,
    job_id: JobId,
    result: Result<(), String>,
) -> Vec<Effect> {
    let Some(chat) = state
        .job_mut(job_id)
        .and_then(|job| job.chat.as_mut())
    else {
        return Vec::new();
    };
    if chat.phase != ChatPhase::Opening {
        return Vec::new();
    }
    match result {
        Ok(()) => {
            chat.session_live = true;
            chat.turns = vec![ChatTurn::assistant(CHAT_GREETING)];
        }
        Err(_) => {
            chat.turns = vec![ChatTurn::assistant(CHAT_OPEN_FAILED)];
        }
    }
    chat.phase = ChatPhase::Idle;
    state.mark_dirty();
    Vec::new()
}

fn chat_submit(state: &mut AppState, job_id: JobId, text: &str) -> Vec<Effect> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    let Some(job) = state.job_mut(job_id) else {
        return Vec::new();
    };
    let source = job.source.clone();
    let Some(chat) = job.chat.as_mut() else {
        return Vec::new();
    };
    // Turns are strictly sequential: nothing is sent while a reply streams.
    if !chat.session_live || chat.phase != ChatPhase::Idle {
        return Vec::new();
    }

    let first_turn = !chat.image_sent;
    chat.turns.push(ChatTurn::user(text));
    // Placeholder the streamed reply keeps replacing.
    chat.turns.push(ChatTurn::assistant(""));
    chat.phase = ChatPhase::AwaitingResponse;
    chat.image_sent = true;
    state.mark_dirty();

    vec![Effect::SendChatTurn {
        job_id,
        text: text.to_string(),
        image: first_turn.then_some(source),
    }]
}

fn chat_streamed(state: &mut AppState, job_id: JobId, content: String) -> Vec<Effect> {
    let Some(chat) = state
        .job_mut(job_id)
        .and_then(|job| job.chat.as_mut())
    else {
        return Vec::new();
    };
    if chat.phase != ChatPhase::AwaitingResponse {
        return Vec::new();
    }
    let replaced = match chat.last_assistant_mut() {
        Some(turn) => {
            // Snapshots are cumulative: replace, never append.
            turn.content = content;
            true
        }
        None => false,
    };
    if replaced {
        state.mark_dirty();
    }
    Vec::new()
}

fn chat_turn_resolved(
    state: &mut AppState,
    job_id: JobId,
    result: Result<(), String>,
) -> Vec<Effect> {
    let Some(chat) = state
        .job_mut(job_id)
        .and_then(|job| job.chat.as_mut())
    else {
        return Vec::new();
    };
    if chat.phase != ChatPhase::AwaitingResponse {
        return Vec::new();
    }
    if let Err(message) = result {
        if let Some(turn) = chat.last_assistant_mut() {
            turn.content = format!("Sorry, I encountered an error: {message}");
        }
    }
    // The session stays usable either way.
    chat.phase = ChatPhase::Idle;
    state.mark_dirty();
    Vec::new()
}

fn chat_closed(state: &mut AppState, job_id: JobId) -> Vec<Effect> {
    let closed = match state.job_mut(job_id).and_then(|job| job.chat.as_mut()) {
        Some(chat) => {
            chat.surface_open = false;
            true
        }
        None => false,
    };
    if closed {
        state.mark_dirty();
    }
    Vec::new()
}

fn apply_prompt(state: &mut AppState, job_id: JobId) -> Vec<Effect> {
    let instruction = {
        let Some(job) = state.job_mut(job_id) else {
            return Vec::new();
        };
        let Some(chat) = job.chat.as_mut() else {
            return Vec::new();
        };
        if chat.phase != ChatPhase::Idle {
            return Vec::new();
        }
        let Some(prompt) = chat
            .last_assistant()
            .and_then(|turn| extract_final_prompt(&turn.content))
        else {
            return Vec::new();
        };
        chat.surface_open = false;
        prompt
    };
    start_edit(state, job_id, instruction)
}

/// Moves one record into Processing and emits the single-shot gateway call.
fn start_edit(state: &mut AppState, job_id: JobId, instruction: String) -> Vec<Effect> {
    let released = {
        let Some(job) = state.job_mut(job_id) else {
            return Vec::new();
        };
        job.status = JobStatus::Processing;
        job.error = None;
        job.result.take()
    };
    if let Some(handle) = released {
        state.handles.release(handle);
    }
    state.mark_dirty();
    let image = match state.job(job_id) {
        Some(job) => job.source.clone(),
        None => return Vec::new(),
    };
    vec![Effect::SubmitEdit {
        job_id,
        image,
        instruction,
    }]
}
