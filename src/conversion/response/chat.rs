use tracing::debug;

use crate::constants::STOP_TOOL_USE;
use crate::conversion::content::{ContentBlock, join_text, parse_arguments_or_raw};
use crate::errors::ConversionError;
use crate::models::{
    ClaudeContentBlock, ClaudeResponse, ClaudeUsage, OpenAiChatResponse, OpenAiContent,
    OpenAiMessage, OpenAiUsage,
};
use crate::utils::message_id;

pub fn convert_openai_to_claude_response(
    openai_response: &OpenAiChatResponse,
    requested_model: &str,
) -> Result<ClaudeResponse, ConversionError> {
    let choice = openai_response
        .choices
        .first()
        .ok_or(ConversionError::NoChoices)?;

    let mut blocks = Vec::new();
    if let Some(text) = message_text(&choice.message) {
        blocks.push(ContentBlock::Text(text));
    }
    for tool_call in &choice.message.tool_calls {
        blocks.push(ContentBlock::ToolInvocation {
            call_id: tool_call.id.clone(),
            name: tool_call.function.name.clone(),
            arguments: parse_arguments_or_raw(&tool_call.function.arguments),
        });
    }

    let has_tool_use = !choice.message.tool_calls.is_empty();
    let stop_reason = if has_tool_use {
        Some(STOP_TOOL_USE.to_string())
    } else {
        choice
            .finish_reason
            .as_deref()
            .filter(|reason| !reason.is_empty())
            .map(str::to_string)
    };

    let content: Vec<ClaudeContentBlock> = blocks
        .into_iter()
        .map(ContentBlock::into_claude_block)
        .collect();
    debug!(
        phase = "convert_response",
        upstream_id = %openai_response.id,
        content_blocks = content.len(),
        stop_reason = ?stop_reason,
        "Converted upstream response"
    );

    let mut response = ClaudeResponse::new(message_id(), requested_model.to_string(), content);
    response.stop_reason = stop_reason;
    response.usage = openai_response.usage.map(usage_from_chat);
    Ok(response)
}

fn message_text(message: &OpenAiMessage) -> Option<String> {
    match message.content.as_ref()? {
        OpenAiContent::Text(text) => (!text.is_empty()).then(|| text.clone()),
        other => {
            let parts = other.text_parts();
            (!parts.is_empty()).then(|| join_text(parts))
        }
    }
}

fn usage_from_chat(usage: OpenAiUsage) -> ClaudeUsage {
    ClaudeUsage {
        input_tokens: usage.prompt_tokens,
        output_tokens: usage.completion_tokens,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::convert_openai_to_claude_response;
    use crate::conversion::response::convert_claude_to_openai_response;
    use crate::errors::ConversionError;
    use crate::models::{ClaudeContentBlock, ClaudeUsage, OpenAiChatResponse};

    fn make_response(value: serde_json::Value) -> OpenAiChatResponse {
        serde_json::from_value(value).expect("response should deserialize")
    }

    #[test]
    fn maps_text_and_usage() {
        let response = make_response(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "model": "gpt-4o",
            "choices": [{"index": 0, "finish_reason": "stop", "message": {"role": "assistant", "content": "Hello"}}],
            "usage": {"prompt_tokens": 11, "completion_tokens": 3, "total_tokens": 14}
        }));

        let converted =
            convert_openai_to_claude_response(&response, "claude-sonnet-4").expect("convert");

        assert!(converted.id.starts_with("msg_"));
        assert_eq!(converted.response_type, "message");
        assert_eq!(converted.role, "assistant");
        assert_eq!(converted.model, "claude-sonnet-4");
        assert_eq!(
            converted.content,
            vec![ClaudeContentBlock::Text {
                text: "Hello".to_string()
            }]
        );
        assert_eq!(converted.stop_reason.as_deref(), Some("stop"));
        assert_eq!(
            converted.usage,
            Some(ClaudeUsage {
                input_tokens: 11,
                output_tokens: 3
            })
        );
    }

    #[test]
    fn tool_calls_force_tool_use_stop_reason() {
        let response = make_response(json!({
            "choices": [{
                "index": 0,
                "finish_reason": "stop",
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{"id": "call_1", "type": "function", "function": {"name": "f", "arguments": "not_json"}}]
                }
            }]
        }));

        let converted = convert_openai_to_claude_response(&response, "claude").expect("convert");
        assert_eq!(converted.stop_reason.as_deref(), Some("tool_use"));
        assert_eq!(
            converted.content,
            vec![ClaudeContentBlock::ToolUse {
                id: "call_1".to_string(),
                name: "f".to_string(),
                input: Some(json!({"_": "not_json"})),
            }]
        );
        assert!(converted.usage.is_none());
    }

    #[test]
    fn joins_structured_text_parts() {
        let response = make_response(json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": [
                {"type": "text", "text": "A"},
                {"type": "text", "text": " "},
                {"type": "text", "text": "B"}
            ]}}]
        }));

        let converted = convert_openai_to_claude_response(&response, "claude").expect("convert");
        assert_eq!(
            converted.content,
            vec![ClaudeContentBlock::Text {
                text: "A\n\nB".to_string()
            }]
        );
        assert_eq!(converted.stop_reason, None);
    }

    #[test]
    fn empty_choices_fail() {
        let response = make_response(json!({"id": "x", "choices": []}));
        let error = convert_openai_to_claude_response(&response, "claude").expect_err("should fail");
        assert!(matches!(error, ConversionError::NoChoices));
    }

    #[test]
    fn responses_without_tool_calls_round_trip_to_stop() {
        for finish_reason in ["stop", "length"] {
            let openai_response = make_response(json!({
                "id": "chatcmpl-1",
                "object": "chat.completion",
                "model": "gpt-4o",
                "choices": [{
                    "index": 0,
                    "finish_reason": finish_reason,
                    "message": {"role": "assistant", "content": "done"}
                }]
            }));

            let claude_response = convert_openai_to_claude_response(&openai_response, "claude")
                .expect("conversion should succeed");
            let round_tripped = convert_claude_to_openai_response(&claude_response, "gpt-4o");

            assert_eq!(
                round_tripped.choices[0].finish_reason.as_deref(),
                Some("stop"),
                "finish reason {finish_reason}"
            );
        }
    }
}
