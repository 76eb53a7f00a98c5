use std::future::Future;
use std::io;

use salvo::http::body::BodySender;
use serde::Serialize;

use super::sink::EventSink;
use crate::constants::{ERROR_API, SSE_DATA_PREFIX, SSE_DONE};
use crate::models::{ApiErrorBody, ClaudeStreamEvent, OpenAiStreamChunk};

pub struct ClaudeSseWriter {
    sender: BodySender,
}

impl ClaudeSseWriter {
    pub fn new(sender: BodySender) -> Self {
        Self { sender }
    }

    pub async fn send_error(&mut self, message: &str) -> io::Result<()> {
        let event = ClaudeStreamEvent::Error {
            error: ApiErrorBody {
                error_type: ERROR_API.to_string(),
                message: message.to_string(),
            },
        };
        self.sender.send_data(claude_frame(&event)).await
    }
}

impl EventSink<ClaudeStreamEvent> for ClaudeSseWriter {
    fn emit(&mut self, event: ClaudeStreamEvent) -> impl Future<Output = io::Result<()>> + Send {
        async move { self.sender.send_data(claude_frame(&event)).await }
    }
}

pub struct OpenAiSseWriter {
    sender: BodySender,
}

impl OpenAiSseWriter {
    pub fn new(sender: BodySender) -> Self {
        Self { sender }
    }

    pub async fn finish(&mut self) -> io::Result<()> {
        self.sender.send_data(done_frame()).await
    }

    pub async fn send_error(&mut self, message: &str) -> io::Result<()> {
        let payload = ErrorPayload {
            error: ApiErrorBody {
                error_type: ERROR_API.to_string(),
                message: message.to_string(),
            },
        };
        self.sender.send_data(data_frame(&payload)).await
    }
}

impl EventSink<OpenAiStreamChunk> for OpenAiSseWriter {
    fn emit(&mut self, chunk: OpenAiStreamChunk) -> impl Future<Output = io::Result<()>> + Send {
        async move { self.sender.send_data(data_frame(&chunk)).await }
    }
}

#[derive(Serialize)]
struct ErrorPayload {
    error: ApiErrorBody,
}

pub fn claude_frame(event: &ClaudeStreamEvent) -> String {
    format!("event: {}\n{}", event.name(), data_frame(event))
}

pub fn data_frame<T: Serialize>(data: &T) -> String {
    format!(
        "{SSE_DATA_PREFIX}{}\n\n",
        serde_json::to_string(data).unwrap_or_else(|_| "{}".to_string())
    )
}

pub fn done_frame() -> String {
    format!("{SSE_DATA_PREFIX}{SSE_DONE}\n\n")
}
