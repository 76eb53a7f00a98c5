pub const ROLE_USER: &str = "user";
pub const ROLE_ASSISTANT: &str = "assistant";
pub const ROLE_SYSTEM: &str = "system";
pub const ROLE_TOOL: &str = "tool";

pub const CONTENT_TEXT: &str = "text";

pub const TOOL_FUNCTION: &str = "function";

pub const STOP_END_TURN: &str = "end_turn";
pub const STOP_TOOL_USE: &str = "tool_use";

pub const FINISH_STOP: &str = "stop";
pub const FINISH_TOOL_CALLS: &str = "tool_calls";

pub const OBJECT_CHAT_COMPLETION: &str = "chat.completion";
pub const OBJECT_CHAT_COMPLETION_CHUNK: &str = "chat.completion.chunk";
pub const MESSAGE_TYPE: &str = "message";

pub const EVENT_MESSAGE_START: &str = "message_start";
pub const EVENT_MESSAGE_STOP: &str = "message_stop";
pub const EVENT_MESSAGE_DELTA: &str = "message_delta";
pub const EVENT_CONTENT_BLOCK_START: &str = "content_block_start";
pub const EVENT_CONTENT_BLOCK_STOP: &str = "content_block_stop";
pub const EVENT_CONTENT_BLOCK_DELTA: &str = "content_block_delta";
pub const EVENT_PING: &str = "ping";
pub const EVENT_ERROR: &str = "error";

pub const ERROR_API: &str = "api_error";

pub const SSE_DATA_PREFIX: &str = "data: ";
pub const SSE_DATA_FIELD: &str = "data:";
pub const SSE_EVENT_FIELD: &str = "event:";
pub const SSE_DONE: &str = "[DONE]";

pub const TEXT_SEPARATOR: &str = "\n\n";
