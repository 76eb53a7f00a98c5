use crate::constants::{ROLE_TOOL, ROLE_USER};
use crate::conversion::content::{ContentBlock, join_text};
use crate::models::{OpenAiContent, OpenAiMessage};

pub fn convert_user_blocks(blocks: Vec<ContentBlock>, openai_messages: &mut Vec<OpenAiMessage>) {
    let mut pending_text: Vec<String> = Vec::new();

    for block in blocks {
        match block {
            ContentBlock::Text(text) => {
                if !text.trim().is_empty() {
                    pending_text.push(text);
                }
            }
            ContentBlock::ToolResult { call_id, content } => {
                flush_user_text(&mut pending_text, openai_messages);
                openai_messages.push(tool_message(call_id, content));
            }
            ContentBlock::ToolInvocation { .. } => {}
        }
    }

    flush_user_text(&mut pending_text, openai_messages);
}

fn flush_user_text(pending_text: &mut Vec<String>, openai_messages: &mut Vec<OpenAiMessage>) {
    if pending_text.is_empty() {
        return;
    }
    let text = join_text(pending_text.iter().map(String::as_str));
    pending_text.clear();
    openai_messages.push(OpenAiMessage::text(ROLE_USER, text));
}

fn tool_message(call_id: String, content: String) -> OpenAiMessage {
    OpenAiMessage {
        role: ROLE_TOOL.to_string(),
        content: Some(OpenAiContent::Text(content)),
        tool_call_id: Some(call_id),
        ..OpenAiMessage::default()
    }
}
