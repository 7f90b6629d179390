use std::sync::Arc;

use boost_core::{
    update, AppState, ChatPhase, ChatRole, Effect, IncomingFile, JobId, JobStatus, Msg,
    ProcessingMode, CHAT_GREETING, CHAT_OPEN_FAILED,
};

fn init_logging() {
    boost_logging::initialize_for_tests();
}

/// One job already switched to the conversational mode.
fn custom_job() -> (AppState, JobId) {
    let (state, _) = update(
        AppState::new(),
        Msg::FilesDropped(vec![IncomingFile {
            name: "sky.png".to_string(),
            media_type: "image/png".to_string(),
            bytes: Arc::new(vec![7u8, 7, 7]),
        }]),
    );
    let job_id = state.jobs().next().unwrap().id;
    let (state, _) = update(
        state,
        Msg::ModeSelected {
            job_id,
            mode: ProcessingMode::CustomEdit,
        },
    );
    (state, job_id)
}

/// Drives the session to Idle with a greeting in the transcript.
fn opened_chat() -> (AppState, JobId) {
    let (state, job_id) = custom_job();
    let (state, effects) = update(state, Msg::ProcessClicked { job_id });
    assert_eq!(effects, vec![Effect::OpenChat { job_id }]);
    let (state, _) = update(
        state,
        Msg::ChatOpenResolved {
            job_id,
            result: Ok(()),
        },
    );
    (state, job_id)
}

#[test]
fn process_click_opens_the_session_instead_of_processing() {
    init_logging();
    let (state, job_id) = custom_job();
    let (state, effects) = update(state, Msg::ProcessClicked { job_id });

    assert_eq!(effects, vec![Effect::OpenChat { job_id }]);
    assert_eq!(state.job(job_id).unwrap().status, JobStatus::Pending);
    let chat = state.job(job_id).unwrap().chat.as_ref().unwrap();
    assert_eq!(chat.phase, ChatPhase::Opening);
    assert!(chat.surface_open);
}

#[test]
fn successful_open_seeds_the_greeting() {
    init_logging();
    let (state, job_id) = opened_chat();
    let chat = state.job(job_id).unwrap().chat.as_ref().unwrap();
    assert!(chat.session_live);
    assert_eq!(chat.phase, ChatPhase::Idle);
    assert_eq!(chat.turns.len(), 1);
    assert_eq!(chat.turns[0].role, ChatRole::Assistant);
    assert_eq!(chat.turns[0].content, CHAT_GREETING);
}

#[test]
fn failed_open_leaves_a_single_error_turn_and_allows_retry() {
    init_logging();
    let (state, job_id) = custom_job();
    let (state, _) = update(state, Msg::ProcessClicked { job_id });
    let (state, _) = update(
        state,
        Msg::ChatOpenResolved {
            job_id,
            result: Err("API key is not configured".into()),
        },
    );

    let chat = state.job(job_id).unwrap().chat.as_ref().unwrap();
    assert!(!chat.session_live);
    assert_eq!(chat.turns.len(), 1);
    assert_eq!(chat.turns[0].content, CHAT_OPEN_FAILED);

    // Clicking again retries the open.
    let (_, effects) = update(state, Msg::ProcessClicked { job_id });
    assert_eq!(effects, vec![Effect::OpenChat { job_id }]);
}

#[test]
fn reopening_a_live_session_is_a_noop() {
    init_logging();
    let (state, job_id) = opened_chat();
    let (state, _) = update(state, Msg::ChatClosed { job_id });
    assert!(!state.job(job_id).unwrap().chat.as_ref().unwrap().surface_open);

    let (state, effects) = update(state, Msg::ProcessClicked { job_id });
    assert!(effects.is_empty(), "no second gateway session");
    let chat = state.job(job_id).unwrap().chat.as_ref().unwrap();
    assert!(chat.surface_open);
    // Transcript kept, no second greeting.
    assert_eq!(chat.turns.len(), 1);
}

#[test]
fn first_turn_carries_the_image_exactly_once() {
    init_logging();
    let (state, job_id) = opened_chat();

    let (state, effects) = update(
        state,
        Msg::ChatMessageSubmitted {
            job_id,
            text: "make the sky purple".into(),
        },
    );
    match effects.as_slice() {
        [Effect::SendChatTurn { text, image, .. }] => {
            assert_eq!(text, "make the sky purple");
            assert!(image.is_some(), "first turn carries the image");
        }
        other => panic!("expected SendChatTurn, got {other:?}"),
    }

    let (state, _) = update(
        state,
        Msg::ChatTurnResolved {
            job_id,
            result: Ok(()),
        },
    );
    let (_, effects) = update(
        state,
        Msg::ChatMessageSubmitted {
            job_id,
            text: "a bit darker".into(),
        },
    );
    match effects.as_slice() {
        [Effect::SendChatTurn { image, .. }] => {
            assert!(image.is_none(), "later turns are text-only");
        }
        other => panic!("expected SendChatTurn, got {other:?}"),
    }
}

#[test]
fn streaming_replaces_the_placeholder_with_cumulative_snapshots() {
    init_logging();
    let (state, job_id) = opened_chat();
    let (state, _) = update(
        state,
        Msg::ChatMessageSubmitted {
            job_id,
            text: "make the sky purple".into(),
        },
    );

    // Placeholder assistant turn was appended.
    {
        let chat = state.job(job_id).unwrap().chat.as_ref().unwrap();
        assert_eq!(chat.phase, ChatPhase::AwaitingResponse);
        assert_eq!(chat.turns.len(), 3);
        assert_eq!(chat.turns[2].content, "");
    }

    let snapshots = [
        "I'll",
        "I'll make",
        "I'll make it purple. [PROMPT]Make the sky purple[/PROMPT]",
    ];
    let mut state = state;
    for snapshot in snapshots {
        let (next, _) = update(
            state,
            Msg::ChatStreamed {
                job_id,
                content: snapshot.to_string(),
            },
        );
        state = next;
        let chat = state.job(job_id).unwrap().chat.as_ref().unwrap();
        assert_eq!(chat.turns[2].content, snapshot, "replace, not append");
    }

    let (state, _) = update(
        state,
        Msg::ChatTurnResolved {
            job_id,
            result: Ok(()),
        },
    );

    let view = state.view();
    let chat = view.jobs[0].chat.as_ref().unwrap();
    assert!(!chat.busy);
    assert_eq!(chat.lines[2].text, "I'll make it purple.");
    assert_eq!(chat.final_prompt.as_deref(), Some("Make the sky purple"));
}

#[test]
fn send_is_blocked_while_a_reply_streams() {
    init_logging();
    let (state, job_id) = opened_chat();
    let (state, _) = update(
        state,
        Msg::ChatMessageSubmitted {
            job_id,
            text: "first".into(),
        },
    );

    let (state, effects) = update(
        state,
        Msg::ChatMessageSubmitted {
            job_id,
            text: "second".into(),
        },
    );
    assert!(effects.is_empty());
    // Only the first user turn and its placeholder exist.
    assert_eq!(state.job(job_id).unwrap().chat.as_ref().unwrap().turns.len(), 3);
}

#[test]
fn failed_turn_keeps_the_session_usable() {
    init_logging();
    let (state, job_id) = opened_chat();
    let (state, _) = update(
        state,
        Msg::ChatMessageSubmitted {
            job_id,
            text: "hello".into(),
        },
    );
    let (state, _) = update(
        state,
        Msg::ChatTurnResolved {
            job_id,
            result: Err("stream reset".into()),
        },
    );

    let chat = state.job(job_id).unwrap().chat.as_ref().unwrap();
    assert_eq!(chat.phase, ChatPhase::Idle);
    assert_eq!(
        chat.turns[2].content,
        "Sorry, I encountered an error: stream reset"
    );

    // Next turn can be dispatched.
    let (_, effects) = update(
        state,
        Msg::ChatMessageSubmitted {
            job_id,
            text: "try again".into(),
        },
    );
    assert_eq!(effects.len(), 1);
}

#[test]
fn apply_prompt_closes_the_chat_and_starts_processing() {
    init_logging();
    let (state, job_id) = opened_chat();
    let (state, _) = update(
        state,
        Msg::ChatMessageSubmitted {
            job_id,
            text: "make the sky purple".into(),
        },
    );
    let (state, _) = update(
        state,
        Msg::ChatStreamed {
            job_id,
            content: "Done thinking. [PROMPT]Make the sky purple[/PROMPT]".into(),
        },
    );
    let (state, _) = update(
        state,
        Msg::ChatTurnResolved {
            job_id,
            result: Ok(()),
        },
    );

    let (state, effects) = update(state, Msg::ApplyPromptClicked { job_id });

    assert_eq!(state.job(job_id).unwrap().status, JobStatus::Processing);
    assert!(!state.job(job_id).unwrap().chat.as_ref().unwrap().surface_open);
    match effects.as_slice() {
        [Effect::SubmitEdit { instruction, .. }] => {
            assert_eq!(instruction, "Make the sky purple");
        }
        other => panic!("expected SubmitEdit, got {other:?}"),
    }
    // Transcript survives the apply.
    assert_eq!(state.job(job_id).unwrap().chat.as_ref().unwrap().turns.len(), 3);
}

#[test]
fn apply_without_a_candidate_is_a_noop() {
    init_logging();
    let (state, job_id) = opened_chat();
    let (state, effects) = update(state, Msg::ApplyPromptClicked { job_id });
    assert!(effects.is_empty());
    assert_eq!(state.job(job_id).unwrap().status, JobStatus::Pending);
}

#[test]
fn switching_mode_away_discards_the_session() {
    init_logging();
    let (state, job_id) = opened_chat();
    let (state, effects) = update(
        state,
        Msg::ModeSelected {
            job_id,
            mode: ProcessingMode::Enhance,
        },
    );

    assert_eq!(effects, vec![Effect::DiscardChat { job_id }]);
    assert!(state.job(job_id).unwrap().chat.is_none());
}

#[test]
fn removing_the_job_discards_the_session() {
    init_logging();
    let (state, job_id) = opened_chat();
    let (state, effects) = update(state, Msg::RemoveClicked { job_id });
    assert_eq!(effects, vec![Effect::DiscardChat { job_id }]);
    assert_eq!(state.job_count(), 0);
    assert_eq!(state.live_handles(), 0);
}
