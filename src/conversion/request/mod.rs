mod assistant;
mod reverse;
mod system;
mod tools;
mod user;

pub use reverse::convert_openai_to_claude;

use tracing::{debug, trace};

use crate::conversion::content::{Role, parse_claude_content};
use crate::errors::ConversionError;
use crate::models::{ClaudeMessage, ClaudeMessagesRequest, OpenAiChatRequest, OpenAiMessage};
use assistant::convert_assistant_blocks;
use system::system_message;
use tools::convert_claude_tools;
use user::convert_user_blocks;

pub fn convert_claude_to_openai(
    request: &ClaudeMessagesRequest,
) -> Result<OpenAiChatRequest, ConversionError> {
    let mut openai_messages: Vec<OpenAiMessage> = Vec::new();

    if let Some(system) = request.system.as_ref().and_then(system_message) {
        openai_messages.push(system);
    }
    convert_message_list(&request.messages, &mut openai_messages)?;

    let openai_request = OpenAiChatRequest {
        model: request.model.clone(),
        messages: openai_messages,
        tools: convert_claude_tools(&request.tools),
        temperature: request.temperature,
        max_tokens: request.max_tokens,
        stop: request.stop_sequences.clone(),
        stream: request.stream,
    };

    trace!(
        phase = "upstream_request_full",
        openai_request = ?openai_request,
        "Converted request for upstream (full)"
    );
    debug!(
        phase = "upstream_request_summary",
        model = %openai_request.model,
        stream = openai_request.stream,
        max_tokens = ?openai_request.max_tokens,
        messages_len = openai_request.messages.len(),
        tools_len = openai_request.tools.len(),
        "Converted request for upstream (summary)"
    );

    Ok(openai_request)
}

fn convert_message_list(
    messages: &[ClaudeMessage],
    openai_messages: &mut Vec<OpenAiMessage>,
) -> Result<(), ConversionError> {
    for message in messages {
        let blocks = parse_claude_content(message.content.as_ref())?;
        match Role::parse(&message.role) {
            Some(Role::User) => convert_user_blocks(blocks, openai_messages),
            Some(Role::Assistant) => openai_messages.push(convert_assistant_blocks(blocks)),
            _ => debug!(
                phase = "drop_message",
                reason = "unsupported_role",
                role = %message.role,
                "Dropping message"
            ),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::conversion::content::ContentBlock;
    use crate::models::{ClaudeContent, ClaudeTool, OpenAiContent};

    fn make_request(messages: serde_json::Value) -> ClaudeMessagesRequest {
        serde_json::from_value(json!({
            "model": "claude-sonnet-4-20250514",
            "messages": messages,
        }))
        .expect("request should deserialize")
    }

    #[test]
    fn splits_user_text_around_tool_results() {
        let request = make_request(json!([{
            "role": "user",
            "content": [
                {"type": "text", "text": "A"},
                {"type": "tool_result", "tool_use_id": "call_1", "content": "RESULT"},
                {"type": "text", "text": "B"}
            ]
        }]));

        let converted = convert_claude_to_openai(&request).expect("convert");
        let messages = &converted.messages;

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[0].text_content(), Some("A"));
        assert_eq!(messages[1].role, "tool");
        assert_eq!(messages[1].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(messages[1].text_content(), Some("RESULT"));
        assert_eq!(messages[2].role, "user");
        assert_eq!(messages[2].text_content(), Some("B"));
    }

    fn flatten_blocks(messages: &[ClaudeMessage]) -> Vec<ContentBlock> {
        messages
            .iter()
            .flat_map(|message| {
                parse_claude_content(message.content.as_ref()).expect("content should parse")
            })
            .collect()
    }

    #[test]
    fn claude_request_survives_openai_round_trip() {
        let mut request = make_request(json!([
            {"role": "user", "content": "Find x"},
            {"role": "assistant", "content": [
                {"type": "text", "text": "Looking"},
                {"type": "tool_use", "id": "call_1", "name": "search", "input": {"q": "x"}}
            ]},
            {"role": "user", "content": [
                {"type": "text", "text": "A"},
                {"type": "tool_result", "tool_use_id": "call_1", "content": "RESULT"},
                {"type": "text", "text": "B"}
            ]}
        ]));
        request.system = Some(ClaudeContent::Text("Be terse".to_string()));

        let openai_request = convert_claude_to_openai(&request).expect("convert");
        let round_tripped = convert_openai_to_claude(&openai_request);

        assert_eq!(round_tripped.system, request.system);
        assert_eq!(
            flatten_blocks(&round_tripped.messages),
            flatten_blocks(&request.messages)
        );
        assert_eq!(
            flatten_blocks(&request.messages),
            vec![
                ContentBlock::Text("Find x".to_string()),
                ContentBlock::Text("Looking".to_string()),
                ContentBlock::ToolInvocation {
                    call_id: "call_1".to_string(),
                    name: "search".to_string(),
                    arguments: json!({"q": "x"}),
                },
                ContentBlock::Text("A".to_string()),
                ContentBlock::ToolResult {
                    call_id: "call_1".to_string(),
                    content: "RESULT".to_string(),
                },
                ContentBlock::Text("B".to_string()),
            ]
        );
    }

    #[test]
    fn hoists_system_prompt_to_front() {
        let mut request = make_request(json!([{"role": "user", "content": "hi"}]));
        request.system = Some(ClaudeContent::Text("You are helpful".to_string()));

        let converted = convert_claude_to_openai(&request).expect("convert");
        assert_eq!(converted.messages.len(), 2);
        assert_eq!(converted.messages[0].role, "system");
        assert_eq!(converted.messages[0].text_content(), Some("You are helpful"));
        assert_eq!(converted.messages[1].text_content(), Some("hi"));
    }

    #[test]
    fn joins_system_text_blocks_with_blank_line() {
        let mut request = make_request(json!([{"role": "user", "content": "hi"}]));
        request.system = Some(
            serde_json::from_value(json!([
                {"type": "text", "text": "A"},
                {"type": "text", "text": "B"}
            ]))
            .expect("system"),
        );

        let converted = convert_claude_to_openai(&request).expect("convert");
        assert_eq!(converted.messages[0].text_content(), Some("A\n\nB"));
    }

    #[test]
    fn omits_blank_system_prompt() {
        let mut request = make_request(json!([{"role": "user", "content": "hi"}]));
        request.system = Some(ClaudeContent::Text("   ".to_string()));

        let converted = convert_claude_to_openai(&request).expect("convert");
        assert_eq!(converted.messages.len(), 1);
        assert_eq!(converted.messages[0].role, "user");
    }

    #[test]
    fn maps_assistant_text_and_tool_use() {
        let request = make_request(json!([{
            "role": "assistant",
            "content": [
                {"type": "text", "text": "Thinking"},
                {"type": "tool_use", "id": "call_2", "name": "search", "input": {"q": "x"}}
            ]
        }]));

        let converted = convert_claude_to_openai(&request).expect("convert");
        let message = &converted.messages[0];

        assert_eq!(converted.messages.len(), 1);
        assert_eq!(message.role, "assistant");
        assert_eq!(message.text_content(), Some("Thinking"));
        assert_eq!(message.tool_calls.len(), 1);
        assert_eq!(message.tool_calls[0].id, "call_2");
        assert_eq!(message.tool_calls[0].kind, "function");
        assert_eq!(message.tool_calls[0].function.name, "search");
        assert_eq!(message.tool_calls[0].function.arguments, r#"{"q":"x"}"#);
    }

    #[test]
    fn tool_use_without_input_sends_empty_object_arguments() {
        let request = make_request(json!([{
            "role": "assistant",
            "content": [{"type": "tool_use", "id": "call_3", "name": "now"}]
        }]));

        let converted = convert_claude_to_openai(&request).expect("convert");
        let message = &converted.messages[0];
        assert!(message.content.is_none());
        assert_eq!(message.tool_calls[0].function.arguments, "{}");
    }

    #[test]
    fn structured_tool_result_is_sent_as_json_text() {
        let request = make_request(json!([{
            "role": "user",
            "content": [{"type": "tool_result", "tool_use_id": "call_1", "content": {"rows": 2}}]
        }]));

        let converted = convert_claude_to_openai(&request).expect("convert");
        assert_eq!(converted.messages.len(), 1);
        assert_eq!(converted.messages[0].text_content(), Some(r#"{"rows":2}"#));
    }

    #[test]
    fn unsupported_content_fails_the_whole_request() {
        let request = make_request(json!([
            {"role": "user", "content": "fine"},
            {"role": "user", "content": 42}
        ]));

        let error = convert_claude_to_openai(&request).expect_err("should fail");
        assert!(matches!(error, ConversionError::UnsupportedContent(_)));
    }

    #[test]
    fn maps_tools_and_sampling_parameters() {
        let mut request = make_request(json!([{"role": "user", "content": "hi"}]));
        request.tools = vec![ClaudeTool {
            name: "search".to_string(),
            description: Some("Search the web".to_string()),
            input_schema: Some(json!({"type": "object", "properties": {"q": {"type": "string"}}})),
        }];
        request.max_tokens = Some(128);
        request.temperature = Some(0.3);
        request.stop_sequences = Some(vec!["END".to_string()]);
        request.stream = true;

        let converted = convert_claude_to_openai(&request).expect("convert");

        assert_eq!(converted.model, "claude-sonnet-4-20250514");
        assert_eq!(converted.max_tokens, Some(128));
        assert_eq!(converted.temperature, Some(0.3));
        assert_eq!(converted.stop, Some(vec!["END".to_string()]));
        assert!(converted.stream);
        assert_eq!(converted.tools.len(), 1);
        assert_eq!(converted.tools[0].kind, "function");
        assert_eq!(converted.tools[0].function.name, "search");
        assert_eq!(
            converted.tools[0].function.parameters,
            request.tools[0].input_schema
        );
    }

    #[test]
    fn user_string_content_stays_a_string() {
        let request = make_request(json!([{"role": "user", "content": "hello"}]));
        let converted = convert_claude_to_openai(&request).expect("convert");
        assert_eq!(
            converted.messages[0].content,
            Some(OpenAiContent::Text("hello".to_string()))
        );
    }
}
