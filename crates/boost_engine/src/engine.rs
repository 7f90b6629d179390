use std::collections::HashMap;
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};

use boost_logging::{boost_info, boost_warn};

use crate::gateway::{ChannelEventSink, ChatSession, Gateway, GatewaySettings, GeminiGateway};
use crate::types::{EngineEvent, GatewayError, FailureKind, ImagePayload, JobId};

/// Work the application hands to the engine.
#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// Run a single-shot edit of `image` under `instruction`.
    SubmitEdit {
        job_id: JobId,
        image: ImagePayload,
        instruction: String,
    },
    /// Establish a conversational session for a job.
    OpenChat { job_id: JobId },
    /// Dispatch one user turn on an open session. `image` accompanies the
    /// first turn only.
    SendChatTurn {
        job_id: JobId,
        text: String,
        image: Option<ImagePayload>,
    },
    /// Drop a job's session and its accumulated context.
    DiscardChat { job_id: JobId },
}

type SessionMap = Arc<Mutex<HashMap<JobId, Arc<tokio::sync::Mutex<ChatSession>>>>>;

/// Handle to the background engine thread. Commands go in over one channel,
/// events come back over another; the caller polls with
/// [`EngineHandle::try_recv`] from its own loop. Clones share both channels.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: Sender<EngineCommand>,
    event_rx: Arc<Mutex<Receiver<EngineEvent>>>,
}

impl EngineHandle {
    pub fn with_settings(settings: GatewaySettings) -> Result<Self, GatewayError> {
        let gateway = GeminiGateway::new(settings)?;
        Ok(Self::new(Arc::new(gateway)))
    }

    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        let (cmd_tx, cmd_rx) = std::sync::mpsc::channel::<EngineCommand>();
        let (event_tx, event_rx) = std::sync::mpsc::channel::<EngineEvent>();

        std::thread::Builder::new()
            .name("boost-engine".to_string())
            .spawn(move || run_engine(gateway, cmd_rx, event_tx))
            .expect("spawn engine thread");

        Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        }
    }

    /// Queues a command. Returns false if the engine thread has shut down.
    pub fn submit(&self, command: EngineCommand) -> bool {
        self.cmd_tx.send(command).is_ok()
    }

    /// Drains at most one pending event without blocking.
    pub fn try_recv(&self) -> Option<EngineEvent> {
        match self.event_rx.lock().expect("event channel lock").try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => None,
        }
    }
}

fn run_engine(
    gateway: Arc<dyn Gateway>,
    cmd_rx: Receiver<EngineCommand>,
    event_tx: Sender<EngineEvent>,
) {
    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            boost_warn!("engine runtime failed to start: {err}");
            return;
        }
    };

    let sessions: SessionMap = Arc::new(Mutex::new(HashMap::new()));

    while let Ok(command) = cmd_rx.recv() {
        // Discards take effect before any later command is dispatched.
        if let EngineCommand::DiscardChat { job_id } = &command {
            let job_id = *job_id;
            if sessions
                .lock()
                .expect("session map lock")
                .remove(&job_id)
                .is_some()
            {
                boost_info!("job {job_id}: chat session discarded");
            }
            continue;
        }
        let gateway = Arc::clone(&gateway);
        let event_tx = event_tx.clone();
        let sessions = Arc::clone(&sessions);
        runtime.spawn(async move {
            handle_command(gateway, sessions, command, event_tx).await;
        });
    }
    // Command sender dropped; let in-flight tasks finish before tearing down.
    runtime.shutdown_timeout(std::time::Duration::from_secs(5));
}

async fn handle_command(
    gateway: Arc<dyn Gateway>,
    sessions: SessionMap,
    command: EngineCommand,
    event_tx: Sender<EngineEvent>,
) {
    match command {
        EngineCommand::SubmitEdit {
            job_id,
            image,
            instruction,
        } => {
            boost_info!("job {job_id}: submitting edit ({} bytes)", image.bytes.len());
            let result = gateway.edit_image(&image, &instruction).await;
            if let Err(err) = &result {
                boost_warn!("job {job_id}: edit failed: {err}");
            }
            let _ = event_tx.send(EngineEvent::EditResolved { job_id, result });
        }
        EngineCommand::OpenChat { job_id } => {
            let already_open = sessions
                .lock()
                .expect("session map lock")
                .contains_key(&job_id);
            if already_open {
                let _ = event_tx.send(EngineEvent::ChatOpened {
                    job_id,
                    result: Ok(()),
                });
                return;
            }
            let result = match gateway.open_session() {
                Ok(session) => {
                    sessions
                        .lock()
                        .expect("session map lock")
                        .insert(job_id, Arc::new(tokio::sync::Mutex::new(session)));
                    boost_info!("job {job_id}: chat session opened");
                    Ok(())
                }
                Err(err) => {
                    boost_warn!("job {job_id}: chat open failed: {err}");
                    Err(err)
                }
            };
            let _ = event_tx.send(EngineEvent::ChatOpened { job_id, result });
        }
        EngineCommand::SendChatTurn {
            job_id,
            text,
            image,
        } => {
            let session = sessions
                .lock()
                .expect("session map lock")
                .get(&job_id)
                .cloned();
            let Some(session) = session else {
                let err = GatewayError::new(
                    FailureKind::NoSession,
                    "no open chat session for this image",
                );
                boost_warn!("job {job_id}: {err}");
                let _ = event_tx.send(EngineEvent::ChatTurnFinished {
                    job_id,
                    result: Err(err),
                });
                return;
            };

            // The per-session lock serializes turns; a stale in-flight turn
            // after DiscardChat mutates only its own Arc and is ignored.
            let mut session = session.lock().await;
            let sink = ChannelEventSink::new(event_tx.clone());
            let result = gateway
                .send_turn(job_id, &mut session, &text, image.as_ref(), &sink)
                .await
                .map(|_| ())
                .map_err(|err| {
                    boost_warn!("job {job_id}: chat turn failed: {err}");
                    err
                });
            let _ = event_tx.send(EngineEvent::ChatTurnFinished { job_id, result });
        }
        // Handled inline by the command loop.
        EngineCommand::DiscardChat { .. } => {}
    }
}
