use std::time::Duration;

use base64::Engine as _;
use futures_util::StreamExt;

use crate::types::{EditOutput, EngineEvent, FailureKind, GatewayError, ImagePayload, JobId};
use crate::wire;

/// System instruction for the conversational prompt-refinement session.
pub const CHAT_SYSTEM_INSTRUCTION: &str = "You are an AI image editing assistant. Your goal is \
to help the user create a perfect text prompt to modify their image. Converse with them to \
understand their needs. When you have a clear instruction, provide ONLY the final prompt text \
itself, enclosed in a special block like this: [PROMPT]Your final prompt here[/PROMPT]. Do not \
add any other text before or after the block in that final message. For example, a final \
message should look exactly like: [PROMPT]Make the cat wear a tiny wizard hat and a monocle[/PROMPT]";

#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub api_key: String,
    /// Service root; tests point this at a mock server.
    pub base_url: String,
    pub image_model: String,
    pub chat_model: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            image_model: "gemini-2.5-flash-image-preview".to_string(),
            chat_model: "gemini-2.5-flash".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// Where the gateway pushes streaming events while a call runs.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// One conversational session: the turn history replayed to the service on
/// every call, so each turn is interpreted in context.
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    history: Vec<wire::Content>,
}

impl ChatSession {
    /// Number of committed turns (user and assistant).
    pub fn turn_count(&self) -> usize {
        self.history.len()
    }
}

/// The AI capability boundary: one-shot image edits and streaming chat turns.
#[async_trait::async_trait]
pub trait Gateway: Send + Sync {
    async fn edit_image(
        &self,
        image: &ImagePayload,
        instruction: &str,
    ) -> Result<EditOutput, GatewayError>;

    /// Creates a fresh session seeded with the fixed system instruction.
    fn open_session(&self) -> Result<ChatSession, GatewayError>;

    /// Dispatches one turn; cumulative reply snapshots are pushed through
    /// `sink` as [`EngineEvent::ChatDelta`]. Returns the full reply text.
    /// `image` must be given on the first turn of a session only.
    async fn send_turn(
        &self,
        job_id: JobId,
        session: &mut ChatSession,
        text: &str,
        image: Option<&ImagePayload>,
        sink: &dyn EventSink,
    ) -> Result<String, GatewayError>;
}

#[derive(Debug, Clone)]
pub struct GeminiGateway {
    settings: GatewaySettings,
    client: reqwest::Client,
}

impl GeminiGateway {
    pub fn new(settings: GatewaySettings) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| GatewayError::new(FailureKind::Configuration, err.to_string()))?;
        Ok(Self { settings, client })
    }

    fn url(&self, model: &str, method: &str, sse: bool) -> String {
        let mut url = format!(
            "{}/v1beta/models/{model}:{method}?key={}",
            self.settings.base_url, self.settings.api_key
        );
        if sse {
            url.push_str("&alt=sse");
        }
        url
    }

    fn inline_part(image: &ImagePayload) -> wire::Part {
        let encoded = base64::engine::general_purpose::STANDARD.encode(image.bytes.as_slice());
        wire::Part::inline(image.media_type.clone(), encoded)
    }
}

#[async_trait::async_trait]
impl Gateway for GeminiGateway {
    async fn edit_image(
        &self,
        image: &ImagePayload,
        instruction: &str,
    ) -> Result<EditOutput, GatewayError> {
        // The image part always precedes the instruction text.
        let request = wire::GenerateContentRequest {
            contents: vec![wire::Content::user(vec![
                Self::inline_part(image),
                wire::Part::text(instruction),
            ])],
            system_instruction: None,
            generation_config: Some(wire::GenerationConfig {
                response_modalities: vec!["IMAGE".to_string(), "TEXT".to_string()],
            }),
        };

        let response = self
            .client
            .post(self.url(&self.settings.image_model, "generateContent", false))
            .json(&request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::new(
                FailureKind::HttpStatus(status.as_u16()),
                format!("The AI service answered with {status}."),
            ));
        }

        let body: wire::GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| GatewayError::new(FailureKind::InvalidResponse, err.to_string()))?;

        parse_edit_response(body, &image.media_type)
    }

    fn open_session(&self) -> Result<ChatSession, GatewayError> {
        if self.settings.api_key.is_empty() {
            return Err(GatewayError::new(
                FailureKind::Configuration,
                "API key is not configured.",
            ));
        }
        Ok(ChatSession::default())
    }

    async fn send_turn(
        &self,
        job_id: JobId,
        session: &mut ChatSession,
        text: &str,
        image: Option<&ImagePayload>,
        sink: &dyn EventSink,
    ) -> Result<String, GatewayError> {
        let mut parts = Vec::new();
        if let Some(image) = image {
            parts.push(Self::inline_part(image));
        }
        parts.push(wire::Part::text(text));
        let user_turn = wire::Content::user(parts);

        let mut contents = session.history.clone();
        contents.push(user_turn.clone());
        let request = wire::GenerateContentRequest {
            contents,
            system_instruction: Some(wire::Content::system(CHAT_SYSTEM_INSTRUCTION)),
            generation_config: None,
        };

        let response = self
            .client
            .post(self.url(&self.settings.chat_model, "streamGenerateContent", true))
            .json(&request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::new(
                FailureKind::HttpStatus(status.as_u16()),
                format!("The AI service answered with {status}."),
            ));
        }

        let mut buffer: Vec<u8> = Vec::new();
        let mut full = String::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            buffer.extend_from_slice(&chunk);
            while let Some(data) = take_sse_data(&mut buffer) {
                if data.is_empty() || data == "[DONE]" {
                    continue;
                }
                let delta = chunk_text(&data)?;
                if delta.is_empty() {
                    continue;
                }
                full.push_str(&delta);
                sink.emit(EngineEvent::ChatDelta {
                    job_id,
                    content: full.clone(),
                });
            }
        }
        // A final event without a trailing blank line.
        if let Some(data) = sse_data(&buffer).filter(|data| data.as_str() != "[DONE]") {
            let delta = chunk_text(&data)?;
            if !delta.is_empty() {
                full.push_str(&delta);
                sink.emit(EngineEvent::ChatDelta {
                    job_id,
                    content: full.clone(),
                });
            }
        }

        // Only a completed turn becomes part of the session context.
        session.history.push(user_turn);
        session.history.push(wire::Content::model(full.clone()));
        Ok(full)
    }
}

/// Maps a single-shot response body to an image or a user-presentable error,
/// surfacing the service's block reason verbatim.
fn parse_edit_response(
    body: wire::GenerateContentResponse,
    fallback_media_type: &str,
) -> Result<EditOutput, GatewayError> {
    let parts = body
        .candidates
        .first()
        .and_then(|candidate| candidate.content.as_ref())
        .map(|content| content.parts.as_slice())
        .unwrap_or_default();

    if parts.is_empty() {
        let (reason, message) = match body.prompt_feedback {
            Some(feedback) => (
                feedback.block_reason.unwrap_or_else(|| "No content".to_string()),
                feedback.block_reason_message.unwrap_or_else(|| {
                    "The AI returned an empty response, possibly due to safety filters or an \
                     unsupported prompt."
                        .to_string()
                }),
            ),
            None => (
                "No content".to_string(),
                "The AI returned an empty response, possibly due to safety filters or an \
                 unsupported prompt."
                    .to_string(),
            ),
        };
        return Err(GatewayError::new(
            FailureKind::Blocked {
                reason: reason.clone(),
            },
            format!("Processing failed. Reason: {reason}. {message}"),
        ));
    }

    let mut texts: Vec<&str> = Vec::new();
    for part in parts {
        if let Some(inline) = &part.inline_data {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(&inline.data)
                .map_err(|err| {
                    GatewayError::new(FailureKind::InvalidResponse, err.to_string())
                })?;
            let media_type = if inline.mime_type.is_empty() {
                fallback_media_type.to_string()
            } else {
                inline.mime_type.clone()
            };
            return Ok(EditOutput { bytes, media_type });
        }
        if let Some(text) = &part.text {
            texts.push(text);
        }
    }

    if texts.is_empty() {
        Err(GatewayError::new(
            FailureKind::EmptyResponse,
            "No image was returned from the API and no reason was provided.",
        ))
    } else {
        let reason = texts.join(" ").trim().to_string();
        Err(GatewayError::new(
            FailureKind::NoImage,
            format!("AI failed to return an image. Reason: \"{reason}\""),
        ))
    }
}

/// Pops one complete SSE event payload off the front of `buffer`.
fn take_sse_data(buffer: &mut Vec<u8>) -> Option<String> {
    // Events end with a blank line; tolerate CRLF framing.
    let (pos, sep_len) = find_event_end(buffer)?;
    let event: Vec<u8> = buffer.drain(..pos + sep_len).collect();
    sse_data(&event).or(Some(String::new()))
}

fn find_event_end(buffer: &[u8]) -> Option<(usize, usize)> {
    if let Some(pos) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
        return Some((pos, 4));
    }
    buffer
        .windows(2)
        .position(|w| w == b"\n\n")
        .map(|pos| (pos, 2))
}

/// Joins the `data:` lines of one event. UTF-8 is safe to assume here:
/// multi-byte sequences never contain the newline byte the framing splits on.
fn sse_data(event: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(event);
    let mut data = String::new();
    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("data:") {
            data.push_str(rest.trim_start());
        }
    }
    (!data.is_empty()).then_some(data)
}

/// Extracts the concatenated text parts of one streamed chunk.
fn chunk_text(data: &str) -> Result<String, GatewayError> {
    let chunk: wire::GenerateContentResponse = serde_json::from_str(data)
        .map_err(|err| GatewayError::new(FailureKind::InvalidResponse, err.to_string()))?;
    let mut text = String::new();
    for candidate in &chunk.candidates {
        if let Some(content) = &candidate.content {
            for part in &content.parts {
                if let Some(t) = &part.text {
                    text.push_str(t);
                }
            }
        }
    }
    Ok(text)
}

fn map_reqwest_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        return GatewayError::new(FailureKind::Timeout, "The AI service timed out.");
    }
    GatewayError::new(FailureKind::Network, err.to_string())
}
