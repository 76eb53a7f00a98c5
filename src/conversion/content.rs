use serde_json::{Map, Value};
use tracing::debug;

use crate::constants::{ROLE_ASSISTANT, ROLE_SYSTEM, ROLE_TOOL, ROLE_USER, TEXT_SEPARATOR};
use crate::errors::ConversionError;
use crate::models::{ClaudeContent, ClaudeContentBlock, ClaudeMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            ROLE_SYSTEM => Some(Self::System),
            ROLE_USER => Some(Self::User),
            ROLE_ASSISTANT => Some(Self::Assistant),
            ROLE_TOOL => Some(Self::Tool),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => ROLE_SYSTEM,
            Self::User => ROLE_USER,
            Self::Assistant => ROLE_ASSISTANT,
            Self::Tool => ROLE_TOOL,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Text(String),
    ToolInvocation {
        call_id: String,
        name: String,
        arguments: Value,
    },
    ToolResult {
        call_id: String,
        content: String,
    },
}

impl ContentBlock {
    pub fn into_claude_block(self) -> ClaudeContentBlock {
        match self {
            Self::Text(text) => ClaudeContentBlock::Text { text },
            Self::ToolInvocation {
                call_id,
                name,
                arguments,
            } => ClaudeContentBlock::ToolUse {
                id: call_id,
                name,
                input: Some(arguments),
            },
            Self::ToolResult { call_id, content } => ClaudeContentBlock::ToolResult {
                tool_use_id: call_id,
                content: Some(Value::String(content)),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub blocks: Vec<ContentBlock>,
}

impl Message {
    pub fn new(role: Role, blocks: Vec<ContentBlock>) -> Self {
        Self { role, blocks }
    }

    pub fn into_claude_message(self) -> ClaudeMessage {
        let blocks = self
            .blocks
            .into_iter()
            .map(ContentBlock::into_claude_block)
            .collect();
        ClaudeMessage {
            role: self.role.as_str().to_string(),
            content: Some(ClaudeContent::Blocks(blocks)),
        }
    }
}

pub fn parse_claude_content(
    content: Option<&ClaudeContent>,
) -> Result<Vec<ContentBlock>, ConversionError> {
    match content {
        None => Ok(Vec::new()),
        Some(ClaudeContent::Text(text)) => Ok(vec![ContentBlock::Text(text.clone())]),
        Some(ClaudeContent::Blocks(blocks)) => {
            Ok(blocks.iter().filter_map(from_claude_block).collect())
        }
        Some(ClaudeContent::Other(Value::Null)) => Ok(Vec::new()),
        Some(ClaudeContent::Other(other)) => {
            Err(ConversionError::UnsupportedContent(other.to_string()))
        }
    }
}

fn from_claude_block(block: &ClaudeContentBlock) -> Option<ContentBlock> {
    match block {
        ClaudeContentBlock::Text { text } => Some(ContentBlock::Text(text.clone())),
        ClaudeContentBlock::ToolUse { id, name, input } => Some(ContentBlock::ToolInvocation {
            call_id: id.clone(),
            name: name.clone(),
            arguments: arguments_or_empty(input.as_ref()),
        }),
        ClaudeContentBlock::ToolResult {
            tool_use_id,
            content,
        } => Some(ContentBlock::ToolResult {
            call_id: tool_use_id.clone(),
            content: tool_result_text(content.as_ref()),
        }),
        ClaudeContentBlock::Unsupported => {
            debug!(
                phase = "drop_content_block",
                reason = "unsupported_block_type",
                "Dropping content block"
            );
            None
        }
    }
}

pub fn empty_object() -> Value {
    Value::Object(Map::new())
}

pub fn arguments_or_empty(input: Option<&Value>) -> Value {
    match input {
        None | Some(Value::Null) => empty_object(),
        Some(value) => value.clone(),
    }
}

pub fn tool_result_text(content: Option<&Value>) -> String {
    match content {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

/// Complete-response policy: invalid JSON is preserved under `"_"`.
pub fn parse_arguments_or_raw(raw: &str) -> Value {
    serde_json::from_str::<Value>(raw).unwrap_or_else(|_| {
        let mut wrapped = Map::new();
        wrapped.insert("_".to_string(), Value::String(raw.to_string()));
        Value::Object(wrapped)
    })
}

/// Streaming policy: anything that is not JSON collapses to `{}`.
pub fn parse_arguments_or_empty(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return empty_object();
    }
    serde_json::from_str::<Value>(raw).unwrap_or_else(|_| empty_object())
}

pub fn serialize_arguments(arguments: &Value) -> String {
    if arguments.is_null() {
        return "{}".to_string();
    }
    serde_json::to_string(arguments).unwrap_or_else(|_| "{}".to_string())
}

pub fn join_text<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts.into_iter().collect::<Vec<_>>().join(TEXT_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        ContentBlock, Message, Role, parse_arguments_or_empty, parse_arguments_or_raw,
        parse_claude_content, serialize_arguments, tool_result_text,
    };
    use crate::errors::ConversionError;
    use crate::models::{ClaudeContent, ClaudeContentBlock};

    #[test]
    fn bare_string_is_a_single_text_block() {
        let content = ClaudeContent::Text("hello".to_string());
        let blocks = parse_claude_content(Some(&content)).expect("parse");
        assert_eq!(blocks, vec![ContentBlock::Text("hello".to_string())]);
    }

    #[test]
    fn missing_content_is_empty() {
        assert!(parse_claude_content(None).expect("parse").is_empty());
        let null = ClaudeContent::Other(serde_json::Value::Null);
        assert!(parse_claude_content(Some(&null)).expect("parse").is_empty());
    }

    #[test]
    fn unsupported_shape_fails() {
        let content = ClaudeContent::Other(json!({"text": "not a list"}));
        let error = parse_claude_content(Some(&content)).expect_err("should fail");
        assert!(matches!(error, ConversionError::UnsupportedContent(_)));
    }

    #[test]
    fn tool_use_without_input_defaults_to_empty_object() {
        let content = ClaudeContent::Blocks(vec![ClaudeContentBlock::ToolUse {
            id: "call_1".to_string(),
            name: "search".to_string(),
            input: None,
        }]);

        let blocks = parse_claude_content(Some(&content)).expect("parse");
        assert_eq!(
            blocks,
            vec![ContentBlock::ToolInvocation {
                call_id: "call_1".to_string(),
                name: "search".to_string(),
                arguments: json!({}),
            }]
        );
    }

    #[test]
    fn unsupported_blocks_are_dropped_in_order() {
        let content = ClaudeContent::Blocks(vec![
            ClaudeContentBlock::Text {
                text: "A".to_string(),
            },
            ClaudeContentBlock::Unsupported,
            ClaudeContentBlock::Text {
                text: "B".to_string(),
            },
        ]);

        let blocks = parse_claude_content(Some(&content)).expect("parse");
        assert_eq!(
            blocks,
            vec![
                ContentBlock::Text("A".to_string()),
                ContentBlock::Text("B".to_string())
            ]
        );
    }

    #[test]
    fn tool_result_payloads_become_text() {
        assert_eq!(tool_result_text(Some(&json!("ok"))), "ok");
        assert_eq!(tool_result_text(None), "");
        assert_eq!(
            tool_result_text(Some(&json!([{"type": "text", "text": "x"}]))),
            r#"[{"text":"x","type":"text"}]"#
        );
    }

    #[test]
    fn argument_fallbacks_differ_by_path() {
        assert_eq!(parse_arguments_or_raw("not_json"), json!({"_": "not_json"}));
        assert_eq!(parse_arguments_or_empty("NOT_JSON"), json!({}));
        assert_eq!(parse_arguments_or_empty(""), json!({}));
        assert_eq!(parse_arguments_or_raw(r#"{"a":1}"#), json!({"a": 1}));
    }

    #[test]
    fn null_arguments_serialize_as_empty_object() {
        assert_eq!(serialize_arguments(&serde_json::Value::Null), "{}");
        assert_eq!(serialize_arguments(&json!({"q": "x"})), r#"{"q":"x"}"#);
    }

    #[test]
    fn tool_result_renders_as_user_side_block() {
        let message = Message::new(
            Role::User,
            vec![ContentBlock::ToolResult {
                call_id: "call_1".to_string(),
                content: "RESULT".to_string(),
            }],
        );

        let rendered = message.into_claude_message();
        assert_eq!(rendered.role, "user");
        assert_eq!(
            rendered.content,
            Some(ClaudeContent::Blocks(vec![ClaudeContentBlock::ToolResult {
                tool_use_id: "call_1".to_string(),
                content: Some(json!("RESULT")),
            }]))
        );
    }
}
