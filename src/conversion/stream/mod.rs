mod lines;
mod pipeline;
mod reverse;
mod sink;
mod sse;
mod state;

pub use pipeline::stream_openai_to_claude;
pub use reverse::stream_claude_to_openai;
pub use sse::{ClaudeSseWriter, OpenAiSseWriter};

#[derive(Debug, Clone, Copy, Default)]
pub struct StreamOptions {
    pub log_events: bool,
}
