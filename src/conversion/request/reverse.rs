use tracing::{debug, trace};

use super::tools::convert_openai_tools;
use crate::conversion::content::{
    ContentBlock, Message, Role, empty_object, join_text, parse_arguments_or_raw,
    tool_result_text,
};
use crate::models::{
    ClaudeContent, ClaudeMessage, ClaudeMessagesRequest, OpenAiChatRequest, OpenAiContent,
    OpenAiMessage,
};

pub fn convert_openai_to_claude(request: &OpenAiChatRequest) -> ClaudeMessagesRequest {
    let mut system: Option<String> = None;
    let mut messages: Vec<ClaudeMessage> = Vec::new();

    for message in &request.messages {
        match Role::parse(&message.role) {
            // Only the first non-empty system message is kept; later ones are dropped.
            Some(Role::System) => {
                if system.is_none() {
                    system = system_text(message.content.as_ref());
                }
            }
            Some(Role::User) => {
                if let Some(blocks) = user_blocks(message.content.as_ref()) {
                    messages.push(Message::new(Role::User, blocks).into_claude_message());
                }
            }
            Some(Role::Assistant) => {
                let blocks = assistant_blocks(message);
                if !blocks.is_empty() {
                    messages.push(Message::new(Role::Assistant, blocks).into_claude_message());
                }
            }
            Some(Role::Tool) => {
                let block = ContentBlock::ToolResult {
                    call_id: message.tool_call_id.clone().unwrap_or_default(),
                    content: tool_content_text(message.content.as_ref()),
                };
                messages.push(Message::new(Role::User, vec![block]).into_claude_message());
            }
            None => debug!(
                phase = "drop_message",
                reason = "unsupported_role",
                role = %message.role,
                "Dropping message"
            ),
        }
    }

    let claude_request = ClaudeMessagesRequest {
        model: request.model.clone(),
        system: system.map(ClaudeContent::Text),
        messages,
        tools: convert_openai_tools(&request.tools),
        max_tokens: request.max_tokens,
        temperature: request.temperature,
        stop_sequences: request.stop.clone(),
        stream: request.stream,
    };

    trace!(
        phase = "upstream_request_full",
        claude_request = ?claude_request,
        "Converted request for upstream (full)"
    );
    debug!(
        phase = "upstream_request_summary",
        model = %claude_request.model,
        stream = claude_request.stream,
        messages_len = claude_request.messages.len(),
        tools_len = claude_request.tools.len(),
        "Converted request for upstream (summary)"
    );

    claude_request
}

fn system_text(content: Option<&OpenAiContent>) -> Option<String> {
    match content? {
        OpenAiContent::Text(text) => (!text.is_empty()).then(|| text.clone()),
        other => {
            let parts = other.text_parts();
            (!parts.is_empty()).then(|| join_text(parts))
        }
    }
}

fn user_blocks(content: Option<&OpenAiContent>) -> Option<Vec<ContentBlock>> {
    match content? {
        OpenAiContent::Text(text) => Some(vec![ContentBlock::Text(text.clone())]),
        other => {
            let blocks: Vec<ContentBlock> = other
                .text_parts()
                .into_iter()
                .map(|text| ContentBlock::Text(text.to_string()))
                .collect();
            (!blocks.is_empty()).then_some(blocks)
        }
    }
}

fn assistant_blocks(message: &OpenAiMessage) -> Vec<ContentBlock> {
    let mut blocks: Vec<ContentBlock> = match message.content.as_ref() {
        Some(OpenAiContent::Text(text)) if text.trim().is_empty() => Vec::new(),
        Some(content) => content
            .text_parts()
            .into_iter()
            .map(|text| ContentBlock::Text(text.to_string()))
            .collect(),
        None => Vec::new(),
    };

    blocks.extend(message.tool_calls.iter().map(|call| {
        let arguments = &call.function.arguments;
        ContentBlock::ToolInvocation {
            call_id: call.id.clone(),
            name: call.function.name.clone(),
            arguments: if arguments.is_empty() {
                empty_object()
            } else {
                parse_arguments_or_raw(arguments)
            },
        }
    }));

    blocks
}

fn tool_content_text(content: Option<&OpenAiContent>) -> String {
    match content {
        None => String::new(),
        Some(OpenAiContent::Text(text)) => text.clone(),
        Some(OpenAiContent::Parts(parts)) => {
            tool_result_text(Some(&serde_json::Value::Array(parts.clone())))
        }
        Some(OpenAiContent::Other(value)) => tool_result_text(Some(value)),
    }
}
