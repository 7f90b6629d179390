use std::sync::Arc;

use boost_core::{update, AppState, IncomingFile, JobStatus, Msg, ProcessingMode, MAX_FILES};

fn init_logging() {
    boost_logging::initialize_for_tests();
}

fn file(name: &str, media_type: &str, size: usize) -> IncomingFile {
    IncomingFile {
        name: name.to_string(),
        media_type: media_type.to_string(),
        bytes: Arc::new(vec![0u8; size]),
    }
}

fn drop_files(state: AppState, files: Vec<IncomingFile>) -> AppState {
    let (state, effects) = update(state, Msg::FilesDropped(files));
    assert!(effects.is_empty(), "intake never emits effects");
    state
}

#[test]
fn valid_images_become_pending_records_in_order() {
    init_logging();
    let state = drop_files(
        AppState::new(),
        vec![
            file("a.png", "image/png", 10),
            file("b.jpg", "image/jpeg", 10),
        ],
    );

    let view = state.view();
    assert_eq!(view.job_count, 2);
    assert_eq!(view.pending_count, 2);
    assert_eq!(view.jobs[0].name, "a.png");
    assert_eq!(view.jobs[1].name, "b.jpg");
    assert!(view
        .jobs
        .iter()
        .all(|job| job.status == JobStatus::Pending && job.mode == ProcessingMode::Enhance));
    assert!(view.intake_error.is_none());
    // One preview handle per record.
    assert_eq!(state.live_handles(), 2);
}

#[test]
fn oversized_file_is_rejected_and_named_in_the_report() {
    init_logging();
    let state = drop_files(
        AppState::new(),
        vec![
            file("ok1.png", "image/png", 10),
            file("ok2.png", "image/png", 10),
            file("huge.png", "image/png", 10 * 1024 * 1024 + 1),
        ],
    );

    let view = state.view();
    assert_eq!(view.job_count, 2);
    let error = view.intake_error.expect("aggregate error");
    assert!(error.contains("1 file(s) couldn't be added."));
    assert!(error.contains("\"huge.png\" was ignored (larger than 10MB)."));
}

#[test]
fn non_image_is_rejected_but_valid_files_pass_through() {
    init_logging();
    let state = drop_files(
        AppState::new(),
        vec![
            file("notes.txt", "text/plain", 10),
            file("photo.png", "image/png", 10),
        ],
    );

    let view = state.view();
    assert_eq!(view.job_count, 1);
    assert_eq!(view.jobs[0].name, "photo.png");
    let error = view.intake_error.expect("aggregate error");
    assert!(error.contains("\"notes.txt\" was ignored (not an image)."));
}

#[test]
fn when_nothing_is_accepted_the_report_says_so() {
    init_logging();
    let state = drop_files(AppState::new(), vec![file("notes.txt", "text/plain", 10)]);

    let view = state.view();
    assert_eq!(view.job_count, 0);
    assert!(view.intake_error.unwrap().starts_with("Couldn't add files."));
}

#[test]
fn batch_exceeding_the_cap_is_rejected_whole() {
    init_logging();
    let existing: Vec<IncomingFile> = (0..MAX_FILES - 1)
        .map(|i| file(&format!("img{i}.png"), "image/png", 10))
        .collect();
    let state = drop_files(AppState::new(), existing);
    assert_eq!(state.job_count(), MAX_FILES - 1);

    // Two more would exceed the cap: no partial addition, even though both
    // files are individually valid.
    let state = drop_files(
        state,
        vec![
            file("x.png", "image/png", 10),
            file("y.png", "image/png", 10),
        ],
    );

    let view = state.view();
    assert_eq!(view.job_count, MAX_FILES - 1);
    let error = view.intake_error.expect("aggregate error");
    assert!(error.contains("Cannot add 2 file(s)"));
    assert!(error.contains("limit of 30"));
}

#[test]
fn record_count_never_exceeds_the_cap() {
    init_logging();
    let full: Vec<IncomingFile> = (0..MAX_FILES)
        .map(|i| file(&format!("img{i}.png"), "image/png", 10))
        .collect();
    let state = drop_files(AppState::new(), full);
    assert_eq!(state.job_count(), MAX_FILES);

    let state = drop_files(state, vec![file("extra.png", "image/png", 10)]);
    assert_eq!(state.job_count(), MAX_FILES);
}

#[test]
fn next_intake_clears_previous_report() {
    init_logging();
    let state = drop_files(AppState::new(), vec![file("notes.txt", "text/plain", 10)]);
    assert!(state.view().intake_error.is_some());

    let state = drop_files(state, vec![file("photo.png", "image/png", 10)]);
    assert!(state.view().intake_error.is_none());
}
