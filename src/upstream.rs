use std::time::{Duration, Instant};

use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::errors::UpstreamError;
use crate::models::{ClaudeMessagesRequest, ClaudeResponse, OpenAiChatRequest, OpenAiChatResponse};

const ERROR_BODY_LIMIT: usize = 8 * 1024;

const ANTHROPIC_VERSION_HEADER: &str = "anthropic-version";
const ANTHROPIC_KEY_HEADER: &str = "x-api-key";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Upstream {
    OpenAi,
    Anthropic,
}

impl Upstream {
    pub fn name(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }

    fn url(self, config: &Config) -> String {
        match self {
            Self::OpenAi => format!(
                "{}/chat/completions",
                config.openai_base_url.trim_end_matches('/')
            ),
            Self::Anthropic => format!(
                "{}/v1/messages",
                config.anthropic_base_url.trim_end_matches('/')
            ),
        }
    }
}

#[derive(Clone, Debug)]
pub struct UpstreamClient {
    client: Client,
    config: Config,
}

impl UpstreamClient {
    pub fn new(config: Config) -> Result<Self, String> {
        let client = Client::builder()
            .build()
            .map_err(|error| format!("failed to initialize upstream HTTP client: {error}"))?;
        Ok(Self { client, config })
    }

    pub async fn chat_completion(
        &self,
        body: &OpenAiChatRequest,
    ) -> Result<OpenAiChatResponse, UpstreamError> {
        let response = self.send_request(Upstream::OpenAi, body, false).await?;
        decode_json_response(Upstream::OpenAi, response).await
    }

    pub async fn chat_completion_stream(
        &self,
        body: &OpenAiChatRequest,
    ) -> Result<reqwest::Response, UpstreamError> {
        self.send_request(Upstream::OpenAi, body, true).await
    }

    pub async fn messages(
        &self,
        body: &ClaudeMessagesRequest,
    ) -> Result<ClaudeResponse, UpstreamError> {
        let response = self.send_request(Upstream::Anthropic, body, false).await?;
        decode_json_response(Upstream::Anthropic, response).await
    }

    pub async fn messages_stream(
        &self,
        body: &ClaudeMessagesRequest,
    ) -> Result<reqwest::Response, UpstreamError> {
        self.send_request(Upstream::Anthropic, body, true).await
    }

    async fn send_request<T: Serialize + ?Sized>(
        &self,
        upstream: Upstream,
        body: &T,
        stream: bool,
    ) -> Result<reqwest::Response, UpstreamError> {
        let url = upstream.url(&self.config);
        let request_kind = if stream { "stream" } else { "non_stream" };

        let mut request_builder = self
            .client
            .post(&url)
            .headers(build_upstream_headers(&self.config, upstream, stream))
            .json(body);

        // Streams stay open for as long as the model keeps talking.
        let timeout = (!stream).then(|| Duration::from_secs(self.config.request_timeout));
        if let Some(duration) = timeout {
            request_builder = request_builder.timeout(duration);
        }

        debug!(
            phase = "upstream_request_start",
            upstream = upstream.name(),
            request_kind,
            url = %url,
            timeout_secs = ?timeout.map(|value| value.as_secs()),
            "Sending upstream request"
        );
        let request_started = Instant::now();
        let response = request_builder.send().await.map_err(|error| {
            log_send_error(&error, upstream, request_kind, request_started.elapsed());
            UpstreamError::bad_gateway(format!("{} request failed: {error}", upstream.name()))
        })?;

        debug!(
            phase = "upstream_response_headers",
            upstream = upstream.name(),
            request_kind,
            status = %response.status(),
            elapsed_ms = request_started.elapsed().as_millis() as u64,
            "Received upstream response headers"
        );

        if response.status().is_success() {
            return Ok(response);
        }

        Err(http_error(upstream, response).await)
    }
}

async fn http_error(upstream: Upstream, response: reqwest::Response) -> UpstreamError {
    let status = response.status();
    let body = read_body_prefix(response, ERROR_BODY_LIMIT).await;

    warn!(
        phase = "upstream_http_error",
        upstream = upstream.name(),
        upstream_status = %status,
        body_bytes = body.len(),
        "Upstream returned non-success status"
    );

    UpstreamError::bad_gateway(format!(
        "{} error {}: {}",
        upstream.name(),
        status.as_u16(),
        body
    ))
}

async fn read_body_prefix(response: reqwest::Response, limit: usize) -> String {
    let mut collected: Vec<u8> = Vec::new();
    let mut body = response.bytes_stream();
    while collected.len() < limit {
        match body.next().await {
            Some(Ok(chunk)) => collected.extend_from_slice(&chunk),
            Some(Err(error)) => {
                warn!(
                    phase = "upstream_error_body_read_failed",
                    "Failed to read upstream error response body: {error}"
                );
                break;
            }
            None => break,
        }
    }
    truncate_body(&collected, limit)
}

fn truncate_body(body: &[u8], limit: usize) -> String {
    let end = body.len().min(limit);
    String::from_utf8_lossy(&body[..end]).into_owned()
}

async fn decode_json_response<T: DeserializeOwned>(
    upstream: Upstream,
    response: reqwest::Response,
) -> Result<T, UpstreamError> {
    let body = response.bytes().await.map_err(|error| {
        error!(
            phase = "upstream_body_read_failed",
            upstream = upstream.name(),
            "Failed to read upstream response body: {error}"
        );
        UpstreamError::bad_gateway(format!(
            "failed to read {} response body: {error}",
            upstream.name()
        ))
    })?;
    decode_json_body(upstream, &body)
}

fn decode_json_body<T: DeserializeOwned>(upstream: Upstream, body: &[u8]) -> Result<T, UpstreamError> {
    serde_json::from_slice::<T>(body).map_err(|error| {
        warn!(
            phase = "upstream_body_decode_failed",
            upstream = upstream.name(),
            body_preview = %truncate_body(body, 512),
            "Failed to decode upstream response: {error}"
        );
        UpstreamError::bad_gateway(format!("invalid {} response: {error}", upstream.name()))
    })
}

fn log_send_error(
    error: &reqwest::Error,
    upstream: Upstream,
    request_kind: &str,
    elapsed: Duration,
) {
    let elapsed_ms = elapsed.as_millis() as u64;
    if error.is_timeout() {
        error!(
            phase = "upstream_connect_timeout",
            upstream = upstream.name(),
            request_kind,
            elapsed_ms,
            "Upstream timeout before response headers"
        );
        return;
    }

    if error.is_connect() {
        error!(
            phase = "upstream_connect_error",
            upstream = upstream.name(),
            request_kind,
            elapsed_ms,
            "Upstream connection failed before response headers: {error}"
        );
        return;
    }

    error!(
        phase = "upstream_request_error",
        upstream = upstream.name(),
        request_kind,
        elapsed_ms,
        "Upstream request failed before response headers: {error}"
    );
}

fn build_upstream_headers(config: &Config, upstream: Upstream, stream: bool) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!("claude-openai-adapter/", env!("CARGO_PKG_VERSION"))),
    );
    if stream {
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
    }

    match upstream {
        Upstream::OpenAi => {
            let auth = config
                .openai_api_key
                .as_deref()
                .and_then(|key| HeaderValue::from_str(&format!("Bearer {key}")).ok());
            if let Some(value) = auth {
                headers.insert(AUTHORIZATION, value);
            }
        }
        Upstream::Anthropic => {
            let key = config
                .anthropic_api_key
                .as_deref()
                .and_then(|key| HeaderValue::from_str(key).ok());
            if let Some(value) = key {
                headers.insert(ANTHROPIC_KEY_HEADER, value);
            }
            match HeaderValue::from_str(&config.anthropic_version) {
                Ok(value) => {
                    headers.insert(ANTHROPIC_VERSION_HEADER, value);
                }
                Err(_) => warn!(
                    "invalid ANTHROPIC_VERSION ignored: {}",
                    config.anthropic_version
                ),
            }
        }
    }

    headers
}
