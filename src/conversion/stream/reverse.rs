use std::fmt::Display;

use futures_util::Stream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::StreamOptions;
use super::lines::LineReader;
use super::sink::{EventSink, emit_event};
use super::state::ReverseState;
use crate::constants::{
    EVENT_CONTENT_BLOCK_DELTA, EVENT_CONTENT_BLOCK_START, EVENT_MESSAGE_START, EVENT_MESSAGE_STOP,
    FINISH_STOP, OBJECT_CHAT_COMPLETION_CHUNK, ROLE_ASSISTANT, SSE_DATA_FIELD, SSE_EVENT_FIELD,
    TOOL_FUNCTION,
};
use crate::errors::StreamError;
use crate::models::{
    BlockDelta, ClaudeContentBlock, ContentBlockDelta, ContentBlockStart, OpenAiStreamChunk,
    StreamChoice, StreamDelta, ToolCallDelta, ToolFunctionDelta,
};
use crate::utils::chunk_id;

/// Every chunk carries the same id. The closing `[DONE]` marker is left to
/// the caller.
pub async fn stream_claude_to_openai<S, B, E, K>(
    cancel: &CancellationToken,
    body: S,
    sink: &mut K,
    requested_model: &str,
    options: StreamOptions,
) -> Result<(), StreamError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
    K: EventSink<OpenAiStreamChunk>,
{
    let chunks = ChunkBuilder::new(requested_model);
    let mut state = ReverseState::default();
    let mut lines = LineReader::new(body);

    while let Some(line) = lines.next_line(cancel).await? {
        let Some(event_name) = line.trim().strip_prefix(SSE_EVENT_FIELD) else {
            continue;
        };
        let event_name = event_name.trim();

        let Some(data_line) = lines.next_line(cancel).await? else {
            debug!(
                phase = "stream_truncated",
                event = event_name,
                "Upstream stream ended before event data"
            );
            break;
        };
        let Some(payload) = data_line.trim().strip_prefix(SSE_DATA_FIELD) else {
            continue;
        };
        let payload = payload.trim();

        match event_name {
            EVENT_MESSAGE_START => {
                if !state.role_sent {
                    state.role_sent = true;
                    let delta = StreamDelta {
                        role: Some(ROLE_ASSISTANT.to_string()),
                        ..StreamDelta::default()
                    };
                    emit_event(sink, chunks.chunk(delta, None), options).await?;
                }
            }
            EVENT_CONTENT_BLOCK_START => {
                let Some(start) = parse_payload::<ContentBlockStart>(event_name, payload) else {
                    continue;
                };
                let ClaudeContentBlock::ToolUse { id, name, .. } = start.content_block else {
                    continue;
                };
                let tool_index = state.register_tool_block(start.index);
                let call = ToolCallDelta {
                    index: tool_index,
                    id: Some(id),
                    kind: Some(TOOL_FUNCTION.to_string()),
                    function: Some(ToolFunctionDelta {
                        name: Some(name),
                        arguments: None,
                    }),
                };
                emit_event(sink, chunks.chunk(tool_call_delta(call), None), options).await?;
            }
            EVENT_CONTENT_BLOCK_DELTA => {
                let Some(block_delta) = parse_payload::<ContentBlockDelta>(event_name, payload)
                else {
                    continue;
                };
                match block_delta.delta {
                    BlockDelta::TextDelta { text } if !text.is_empty() => {
                        let delta = StreamDelta {
                            content: Some(text),
                            ..StreamDelta::default()
                        };
                        emit_event(sink, chunks.chunk(delta, None), options).await?;
                    }
                    BlockDelta::InputJsonDelta { partial_json } => {
                        let Some(tool_index) =
                            state.record_arguments(block_delta.index, &partial_json)
                        else {
                            debug!(
                                phase = "drop_stream_delta",
                                block_index = block_delta.index,
                                "Dropping argument fragment for unknown tool block"
                            );
                            continue;
                        };
                        let call = ToolCallDelta {
                            index: tool_index,
                            id: None,
                            kind: Some(TOOL_FUNCTION.to_string()),
                            function: Some(ToolFunctionDelta {
                                name: None,
                                arguments: Some(partial_json),
                            }),
                        };
                        emit_event(sink, chunks.chunk(tool_call_delta(call), None), options)
                            .await?;
                    }
                    _ => {}
                }
            }
            EVENT_MESSAGE_STOP => {
                emit_event(
                    sink,
                    chunks.chunk(StreamDelta::default(), Some(FINISH_STOP)),
                    options,
                )
                .await?;
            }
            _ => {}
        }
    }

    Ok(())
}

struct ChunkBuilder {
    id: String,
    model: String,
}

impl ChunkBuilder {
    fn new(requested_model: &str) -> Self {
        Self {
            id: chunk_id(),
            model: requested_model.to_string(),
        }
    }

    fn chunk(&self, delta: StreamDelta, finish_reason: Option<&str>) -> OpenAiStreamChunk {
        OpenAiStreamChunk {
            id: self.id.clone(),
            object: OBJECT_CHAT_COMPLETION_CHUNK.to_string(),
            model: self.model.clone(),
            choices: vec![StreamChoice {
                index: 0,
                delta,
                finish_reason: finish_reason.map(str::to_string),
            }],
        }
    }
}

fn tool_call_delta(call: ToolCallDelta) -> StreamDelta {
    StreamDelta {
        tool_calls: Some(vec![call]),
        ..StreamDelta::default()
    }
}

fn parse_payload<T: serde::de::DeserializeOwned>(event_name: &str, payload: &str) -> Option<T> {
    match serde_json::from_str(payload) {
        Ok(parsed) => Some(parsed),
        Err(error) => {
            warn!(
                phase = "skip_stream_line",
                event = event_name,
                "Failed to parse upstream event payload: {error}"
            );
            None
        }
    }
}
