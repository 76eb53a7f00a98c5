use salvo::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("unsupported content: {0}")]
    UnsupportedContent(String),
    #[error("no choices in upstream response")]
    NoChoices,
}

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("stream translation cancelled")]
    Cancelled,
    #[error("failed to read upstream stream: {0}")]
    Read(String),
    #[error("failed to emit translated event: {0}")]
    Sink(#[from] std::io::Error),
}

#[derive(Debug)]
pub struct UpstreamError {
    pub status: StatusCode,
    pub message: String,
}

impl UpstreamError {
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: message.into(),
        }
    }
}
