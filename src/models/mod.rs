mod claude;
mod openai;

pub use claude::{
    ApiErrorBody, BlockDelta, ClaudeContent, ClaudeContentBlock, ClaudeMessage,
    ClaudeMessagesRequest, ClaudeResponse, ClaudeStreamEvent, ClaudeTool, ClaudeUsage,
    ContentBlockDelta, ContentBlockStart, MessageDeltaBody,
};
pub use openai::{
    OpenAiChatRequest, OpenAiChatResponse, OpenAiChoice, OpenAiContent, OpenAiFunction,
    OpenAiMessage, OpenAiStreamChunk, OpenAiTool, OpenAiToolCall, OpenAiUsage,
    StreamChoice, StreamDelta, ToolCallDelta, ToolFunctionDelta,
};
