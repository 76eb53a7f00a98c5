use std::fmt::Display;

use futures_util::Stream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::StreamOptions;
use super::lines::LineReader;
use super::sink::{EventSink, emit_event};
use super::state::{ForwardState, TEXT_BLOCK_INDEX};
use crate::constants::{SSE_DATA_FIELD, SSE_DONE, STOP_END_TURN};
use crate::conversion::content::parse_arguments_or_empty;
use crate::errors::StreamError;
use crate::models::{
    BlockDelta, ClaudeContentBlock, ClaudeResponse, ClaudeStreamEvent, ClaudeUsage,
    ContentBlockDelta, ContentBlockStart, MessageDeltaBody, OpenAiStreamChunk,
};
use crate::utils::message_id;

pub async fn stream_openai_to_claude<S, B, E, K>(
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
    K: EventSink<ClaudeStreamEvent>,
{
    emit_event(sink, message_start(requested_model), options).await?;

    let mut state = ForwardState::default();
    let mut lines = LineReader::new(body);

    while let Some(line) = lines.next_line(cancel).await? {
        let Some(payload) = line.trim().strip_prefix(SSE_DATA_FIELD) else {
            continue;
        };
        let payload = payload.trim();
        if payload == SSE_DONE {
            break;
        }

        let chunk = match serde_json::from_str::<OpenAiStreamChunk>(payload) {
            Ok(chunk) => chunk,
            Err(error) => {
                warn!(
                    phase = "skip_stream_line",
                    "Failed to parse upstream stream line as JSON: {error}"
                );
                continue;
            }
        };
        let Some(choice) = chunk.choices.into_iter().next() else {
            continue;
        };

        if let Some(text) = choice.delta.content.filter(|text| !text.is_empty()) {
            if !state.text_started {
                emit_event(sink, text_block_start(), options).await?;
                state.text_started = true;
            }
            state.text_chars += text.chars().count();
            emit_event(sink, text_delta(text), options).await?;
        }

        for tool_delta in choice.delta.tool_calls.iter().flatten() {
            state.absorb_tool_delta(tool_delta);
        }
    }

    finish(sink, state, options).await
}

async fn finish<K>(
    sink: &mut K,
    state: ForwardState,
    options: StreamOptions,
) -> Result<(), StreamError>
where
    K: EventSink<ClaudeStreamEvent>,
{
    if state.text_started {
        emit_event(
            sink,
            ClaudeStreamEvent::ContentBlockStop {
                index: TEXT_BLOCK_INDEX,
            },
            options,
        )
        .await?;
    }

    let output_tokens = state.output_token_estimate();
    let mut block_index = state.first_tool_block_index();
    let tool_count = state.tool_calls.len();

    for (_, tool) in state.tool_calls {
        let start = ClaudeStreamEvent::ContentBlockStart(ContentBlockStart {
            index: block_index,
            content_block: ClaudeContentBlock::ToolUse {
                id: tool.id,
                name: tool.name,
                input: Some(parse_arguments_or_empty(&tool.arguments)),
            },
        });
        emit_event(sink, start, options).await?;
        emit_event(
            sink,
            ClaudeStreamEvent::ContentBlockStop { index: block_index },
            options,
        )
        .await?;
        block_index += 1;
    }

    emit_event(
        sink,
        ClaudeStreamEvent::MessageDelta {
            delta: MessageDeltaBody {
                stop_reason: Some(STOP_END_TURN.to_string()),
                stop_sequence: None,
            },
            usage: ClaudeUsage {
                input_tokens: 0,
                output_tokens,
            },
        },
        options,
    )
    .await?;
    emit_event(sink, ClaudeStreamEvent::MessageStop, options).await?;

    debug!(
        phase = "stream_complete",
        tool_calls = tool_count,
        output_tokens,
        "Finished translating upstream stream"
    );
    Ok(())
}

fn message_start(requested_model: &str) -> ClaudeStreamEvent {
    let mut message = ClaudeResponse::new(message_id(), requested_model.to_string(), Vec::new());
    message.usage = Some(ClaudeUsage::default());
    ClaudeStreamEvent::MessageStart { message }
}

fn text_block_start() -> ClaudeStreamEvent {
    ClaudeStreamEvent::ContentBlockStart(ContentBlockStart {
        index: TEXT_BLOCK_INDEX,
        content_block: ClaudeContentBlock::Text {
            text: String::new(),
        },
    })
}

fn text_delta(text: String) -> ClaudeStreamEvent {
    ClaudeStreamEvent::ContentBlockDelta(ContentBlockDelta {
        index: TEXT_BLOCK_INDEX,
        delta: BlockDelta::TextDelta { text },
    })
}
