use crate::constants::{
    FINISH_STOP, FINISH_TOOL_CALLS, OBJECT_CHAT_COMPLETION, ROLE_ASSISTANT, STOP_TOOL_USE,
};
use crate::conversion::content::{arguments_or_empty, join_text, serialize_arguments};
use crate::models::{
    ClaudeContentBlock, ClaudeResponse, OpenAiChatResponse, OpenAiChoice, OpenAiContent,
    OpenAiMessage, OpenAiToolCall,
};

pub fn convert_claude_to_openai_response(
    claude_response: &ClaudeResponse,
    requested_model: &str,
) -> OpenAiChatResponse {
    let mut text_parts: Vec<&str> = Vec::new();
    let mut tool_calls = Vec::new();

    for block in &claude_response.content {
        match block {
            ClaudeContentBlock::Text { text } => {
                if !text.is_empty() {
                    text_parts.push(text);
                }
            }
            ClaudeContentBlock::ToolUse { id, name, input } => {
                tool_calls.push(OpenAiToolCall::function(
                    id.clone(),
                    name.clone(),
                    serialize_arguments(&arguments_or_empty(input.as_ref())),
                ));
            }
            ClaudeContentBlock::ToolResult { .. } | ClaudeContentBlock::Unsupported => {}
        }
    }

    let text = join_text(text_parts);
    let finish_reason = if claude_response.stop_reason.as_deref() == Some(STOP_TOOL_USE) {
        FINISH_TOOL_CALLS
    } else {
        FINISH_STOP
    };

    OpenAiChatResponse {
        id: claude_response.id.clone(),
        object: OBJECT_CHAT_COMPLETION.to_string(),
        model: requested_model.to_string(),
        choices: vec![OpenAiChoice {
            index: 0,
            finish_reason: Some(finish_reason.to_string()),
            message: OpenAiMessage {
                role: ROLE_ASSISTANT.to_string(),
                content: (!text.is_empty()).then_some(OpenAiContent::Text(text)),
                tool_calls,
                ..OpenAiMessage::default()
            },
        }],
        usage: None,
    }
}
