use crate::constants::ROLE_ASSISTANT;
use crate::conversion::content::{ContentBlock, join_text, serialize_arguments};
use crate::models::{OpenAiContent, OpenAiMessage, OpenAiToolCall};

pub fn convert_assistant_blocks(blocks: Vec<ContentBlock>) -> OpenAiMessage {
    let mut text_parts = Vec::new();
    let mut tool_calls = Vec::new();

    for block in blocks {
        match block {
            ContentBlock::Text(text) => {
                if !text.is_empty() {
                    text_parts.push(text);
                }
            }
            ContentBlock::ToolInvocation {
                call_id,
                name,
                arguments,
            } => tool_calls.push(OpenAiToolCall::function(
                call_id,
                name,
                serialize_arguments(&arguments),
            )),
            ContentBlock::ToolResult { .. } => {}
        }
    }

    let content = if text_parts.is_empty() {
        None
    } else {
        Some(OpenAiContent::Text(join_text(
            text_parts.iter().map(String::as_str),
        )))
    };

    OpenAiMessage {
        role: ROLE_ASSISTANT.to_string(),
        content,
        tool_calls,
        ..OpenAiMessage::default()
    }
}
