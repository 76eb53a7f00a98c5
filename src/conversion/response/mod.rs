mod chat;
mod claude;

pub use chat::convert_openai_to_claude_response;
pub use claude::convert_claude_to_openai_response;
