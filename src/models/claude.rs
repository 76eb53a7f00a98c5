use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{
    EVENT_CONTENT_BLOCK_DELTA, EVENT_CONTENT_BLOCK_START, EVENT_CONTENT_BLOCK_STOP, EVENT_ERROR,
    EVENT_MESSAGE_DELTA, EVENT_MESSAGE_START, EVENT_MESSAGE_STOP, EVENT_PING, MESSAGE_TYPE,
    ROLE_ASSISTANT,
};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ClaudeMessagesRequest {
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<ClaudeContent>,
    #[serde(default)]
    pub messages: Vec<ClaudeMessage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ClaudeTool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ClaudeMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<ClaudeContent>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ClaudeContent {
    Text(String),
    Blocks(Vec<ClaudeContentBlock>),
    Other(Value),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClaudeContentBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    ToolUse {
        #[serde(default)]
        id: String,
        #[serde(default)]
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        input: Option<Value>,
    },
    ToolResult {
        #[serde(default)]
        tool_use_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<Value>,
    },
    #[serde(other, skip_serializing)]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ClaudeTool {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ClaudeResponse {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default = "message_type")]
    pub response_type: String,
    #[serde(default = "assistant_role")]
    pub role: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub content: Vec<ClaudeContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub stop_sequence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<ClaudeUsage>,
}

impl ClaudeResponse {
    pub fn new(id: String, model: String, content: Vec<ClaudeContentBlock>) -> Self {
        Self {
            id,
            response_type: message_type(),
            role: assistant_role(),
            model,
            content,
            stop_reason: None,
            stop_sequence: None,
            usage: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClaudeUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

fn message_type() -> String {
    MESSAGE_TYPE.to_string()
}

fn assistant_role() -> String {
    ROLE_ASSISTANT.to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClaudeStreamEvent {
    MessageStart { message: ClaudeResponse },
    ContentBlockStart(ContentBlockStart),
    ContentBlockDelta(ContentBlockDelta),
    ContentBlockStop { index: usize },
    MessageDelta {
        delta: MessageDeltaBody,
        usage: ClaudeUsage,
    },
    MessageStop,
    Ping,
    Error { error: ApiErrorBody },
}

impl ClaudeStreamEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::MessageStart { .. } => EVENT_MESSAGE_START,
            Self::ContentBlockStart(_) => EVENT_CONTENT_BLOCK_START,
            Self::ContentBlockDelta(_) => EVENT_CONTENT_BLOCK_DELTA,
            Self::ContentBlockStop { .. } => EVENT_CONTENT_BLOCK_STOP,
            Self::MessageDelta { .. } => EVENT_MESSAGE_DELTA,
            Self::MessageStop => EVENT_MESSAGE_STOP,
            Self::Ping => EVENT_PING,
            Self::Error { .. } => EVENT_ERROR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ContentBlockStart {
    pub index: usize,
    pub content_block: ClaudeContentBlock,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ContentBlockDelta {
    pub index: usize,
    pub delta: BlockDelta,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockDelta {
    TextDelta {
        #[serde(default)]
        text: String,
    },
    InputJsonDelta {
        #[serde(default, alias = "delta")]
        partial_json: String,
    },
    #[serde(other, skip_serializing)]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MessageDeltaBody {
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_sequence: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ApiErrorBody {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ClaudeContent, ClaudeContentBlock, ClaudeStreamEvent, ContentBlockStart};

    #[test]
    fn content_accepts_string_and_block_list() {
        let text: ClaudeContent = serde_json::from_value(json!("hi")).expect("string content");
        assert_eq!(text, ClaudeContent::Text("hi".to_string()));

        let blocks: ClaudeContent = serde_json::from_value(json!([
            {"type": "text", "text": "A"},
            {"type": "tool_use", "id": "call_1", "name": "search", "input": {"q": "x"}}
        ]))
        .expect("block content");
        let ClaudeContent::Blocks(blocks) = blocks else {
            panic!("expected block list");
        };
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn unknown_block_types_become_unsupported() {
        let blocks: ClaudeContent = serde_json::from_value(json!([
            {"type": "image", "source": {"type": "base64", "data": "..."}},
            {"type": "text", "text": "caption"}
        ]))
        .expect("block content");
        let ClaudeContent::Blocks(blocks) = blocks else {
            panic!("expected block list");
        };
        assert_eq!(blocks[0], ClaudeContentBlock::Unsupported);
    }

    #[test]
    fn numeric_content_falls_through_to_other() {
        let content: ClaudeContent = serde_json::from_value(json!(42)).expect("other content");
        assert!(matches!(content, ClaudeContent::Other(_)));
    }

    #[test]
    fn stream_event_serializes_with_type_tag() {
        let event = ClaudeStreamEvent::ContentBlockStart(ContentBlockStart {
            index: 1,
            content_block: ClaudeContentBlock::ToolUse {
                id: "call_1".to_string(),
                name: "alpha".to_string(),
                input: Some(json!({})),
            },
        });

        let payload = serde_json::to_value(&event).expect("serialize");
        assert_eq!(event.name(), "content_block_start");
        assert_eq!(
            payload,
            json!({
                "type": "content_block_start",
                "index": 1,
                "content_block": {"type": "tool_use", "id": "call_1", "name": "alpha", "input": {}}
            })
        );
    }
}
