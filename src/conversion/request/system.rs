use tracing::warn;

use crate::constants::ROLE_SYSTEM;
use crate::conversion::content::{ContentBlock, join_text, parse_claude_content};
use crate::models::{ClaudeContent, OpenAiMessage};

pub fn system_message(system: &ClaudeContent) -> Option<OpenAiMessage> {
    let text = extract_system_text(system)?;
    Some(OpenAiMessage::text(ROLE_SYSTEM, text))
}

fn extract_system_text(system: &ClaudeContent) -> Option<String> {
    if let ClaudeContent::Text(text) = system {
        return (!text.trim().is_empty()).then(|| text.clone());
    }

    let blocks = match parse_claude_content(Some(system)) {
        Ok(blocks) => blocks,
        Err(error) => {
            warn!(
                phase = "drop_system_prompt",
                reason = "unsupported_content",
                "Ignoring system prompt: {error}"
            );
            return None;
        }
    };

    let text_parts: Vec<&str> = blocks
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text(text) if !text.trim().is_empty() => Some(text.as_str()),
            _ => None,
        })
        .collect();
    if text_parts.is_empty() {
        return None;
    }
    Some(join_text(text_parts))
}
