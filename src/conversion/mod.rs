pub mod content;
pub mod request;
pub mod response;
pub mod stream;

pub use request::{convert_claude_to_openai, convert_openai_to_claude};
pub use response::{convert_claude_to_openai_response, convert_openai_to_claude_response};
pub use stream::{StreamOptions, stream_claude_to_openai, stream_openai_to_claude};
