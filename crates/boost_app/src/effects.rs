use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use boost_core::{Effect, ImageBlob, Msg};
use boost_engine::{
    EngineCommand, EngineEvent, EngineHandle, GatewaySettings, ImagePayload,
};
use boost_logging::{boost_info, boost_warn};

/// Bridges the pure state machine to the engine: queued effects go out as
/// engine commands, engine events come back as messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(settings: GatewaySettings, msg_tx: mpsc::Sender<Msg>) -> anyhow::Result<Self> {
        let engine = EngineHandle::with_settings(settings)?;
        let runner = Self { engine };
        runner.spawn_event_loop(msg_tx);
        Ok(runner)
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::SubmitEdit {
                    job_id,
                    image,
                    instruction,
                } => {
                    boost_info!(
                        "SubmitEdit job_id={} bytes={} instruction_len={}",
                        job_id,
                        image.len(),
                        instruction.len()
                    );
                    self.engine.submit(EngineCommand::SubmitEdit {
                        job_id,
                        image: to_payload(&image),
                        instruction,
                    });
                }
                Effect::OpenChat { job_id } => {
                    self.engine.submit(EngineCommand::OpenChat { job_id });
                }
                Effect::SendChatTurn {
                    job_id,
                    text,
                    image,
                } => {
                    self.engine.submit(EngineCommand::SendChatTurn {
                        job_id,
                        text,
                        image: image.as_ref().map(to_payload),
                    });
                }
                Effect::DiscardChat { job_id } => {
                    self.engine.submit(EngineCommand::DiscardChat { job_id });
                }
            }
        }
    }

    fn spawn_event_loop(&self, msg_tx: mpsc::Sender<Msg>) {
        let engine = self.engine.clone();
        thread::spawn(move || loop {
            if let Some(event) = engine.try_recv() {
                let msg = match event {
                    EngineEvent::EditResolved { job_id, result } => Msg::JobResolved {
                        job_id,
                        result: result
                            .map(|output| ImageBlob::new(output.bytes, output.media_type))
                            .map_err(|err| {
                                boost_warn!("Job {} failed: {}", job_id, err.kind);
                                err.message
                            }),
                    },
                    EngineEvent::ChatOpened { job_id, result } => Msg::ChatOpenResolved {
                        job_id,
                        result: result.map_err(|err| err.message),
                    },
                    EngineEvent::ChatDelta { job_id, content } => {
                        Msg::ChatStreamed { job_id, content }
                    }
                    EngineEvent::ChatTurnFinished { job_id, result } => Msg::ChatTurnResolved {
                        job_id,
                        result: result.map_err(|err| err.message),
                    },
                };
                if msg_tx.send(msg).is_err() {
                    return;
                }
            } else {
                thread::sleep(Duration::from_millis(20));
            }
        });
    }
}

fn to_payload(blob: &ImageBlob) -> ImagePayload {
    ImagePayload {
        bytes: blob.bytes.clone(),
        media_type: blob.media_type.clone(),
    }
}
