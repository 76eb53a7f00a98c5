use std::time::Instant;

use salvo::http::StatusCode;
use salvo::prelude::*;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, trace, warn};

use crate::conversion::stream::{ClaudeSseWriter, OpenAiSseWriter};
use crate::conversion::{
    convert_claude_to_openai, convert_claude_to_openai_response, convert_openai_to_claude,
    convert_openai_to_claude_response, stream_claude_to_openai, stream_openai_to_claude,
};
use crate::errors::{StreamError, UpstreamError};
use crate::models::{ClaudeMessagesRequest, OpenAiChatRequest};
use crate::state::{AppState, app_state};
use crate::utils::is_truthy;

const NO_STREAM_HEADER: &str = "x-debug-no-stream";
const NO_STREAM_QUERY_KEYS: [&str; 2] = ["debug_no_stream", "no_stream"];

pub fn router() -> Router {
    Router::new()
        .hoop(access_log)
        .get(root)
        .push(Router::with_path("health").get(health_check))
        .push(Router::with_path("v1/messages").post(create_message))
        .push(Router::with_path("v1/chat/completions").post(create_chat_completion))
}

#[handler]
async fn access_log(req: &mut Request, depot: &mut Depot, res: &mut Response, ctrl: &mut FlowCtrl) {
    let started = Instant::now();
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    ctrl.call_next(req, depot, res).await;

    info!(
        phase = "access",
        method = %method,
        path = %path,
        status = res.status_code.map(|status| status.as_u16()).unwrap_or(200),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Handled request"
    );
}

#[handler]
pub async fn create_message(req: &mut Request, res: &mut Response) {
    let Some(state) = require_state(res) else {
        return;
    };
    let Some(mut request) =
        parse_json_body::<ClaudeMessagesRequest>(req, res, state.config.request_body_max_size).await
    else {
        return;
    };

    if request.stream && no_stream_requested(req, state) {
        debug!(phase = "no_stream_override", "Serving streaming request as non-streaming");
        request.stream = false;
    }

    trace!(
        phase = "downstream_request_full",
        claude_request = %serde_json::to_string(&request).unwrap_or_default(),
        "Received downstream request (full)"
    );

    let mut openai_request = match convert_claude_to_openai(&request) {
        Ok(value) => value,
        Err(error) => {
            bad_request(res, &error.to_string());
            return;
        }
    };
    openai_request.model = state.config.map_model(&request.model);

    debug!(
        phase = "downstream_request_summary",
        claude_model = %request.model,
        openai_model = %openai_request.model,
        stream = request.stream,
        messages_len = request.messages.len(),
        tools_len = request.tools.len(),
        "Routing messages request upstream"
    );

    if request.stream {
        stream_message(res, state, &openai_request, request.model).await;
        return;
    }

    let openai_response = match state.upstream.chat_completion(&openai_request).await {
        Ok(value) => value,
        Err(error) => {
            upstream_failed(res, error);
            return;
        }
    };

    match convert_openai_to_claude_response(&openai_response, &request.model) {
        Ok(value) => res.render(Json(value)),
        Err(error) => upstream_failed(res, UpstreamError::bad_gateway(error.to_string())),
    }
}

#[handler]
pub async fn create_chat_completion(req: &mut Request, res: &mut Response) {
    let Some(state) = require_state(res) else {
        return;
    };
    let Some(mut request) =
        parse_json_body::<OpenAiChatRequest>(req, res, state.config.request_body_max_size).await
    else {
        return;
    };

    if request.stream && no_stream_requested(req, state) {
        debug!(phase = "no_stream_override", "Serving streaming request as non-streaming");
        request.stream = false;
    }

    trace!(
        phase = "downstream_request_full",
        openai_request = %serde_json::to_string(&request).unwrap_or_default(),
        "Received downstream request (full)"
    );

    let claude_request = convert_openai_to_claude(&request);

    debug!(
        phase = "downstream_request_summary",
        openai_model = %request.model,
        stream = request.stream,
        messages_len = request.messages.len(),
        tools_len = request.tools.len(),
        "Routing chat completion request upstream"
    );

    if request.stream {
        stream_chat_completion(res, state, &claude_request, request.model).await;
        return;
    }

    match state.upstream.messages(&claude_request).await {
        Ok(value) => res.render(Json(convert_claude_to_openai_response(&value, &request.model))),
        Err(error) => upstream_failed(res, error),
    }
}

#[handler]
pub async fn health_check(res: &mut Response) {
    res.render(Text::Plain("ok\n"));
}

#[handler]
pub async fn root(res: &mut Response) {
    let Some(state) = require_state(res) else {
        return;
    };
    let config = &state.config;
    res.render(Json(RootResponse {
        message: "Claude/OpenAI protocol adapter".to_string(),
        status: "running".to_string(),
        config: RootConfig {
            openai_base_url: config.openai_base_url.clone(),
            openai_api_key_configured: config.openai_api_key.is_some(),
            anthropic_base_url: config.anthropic_base_url.clone(),
            anthropic_api_key_configured: config.anthropic_api_key.is_some(),
            default_openai_model: config.default_openai_model.clone(),
            mapped_models: config.model_map.len(),
        },
        endpoints: RootEndpoints {
            messages: "/v1/messages".to_string(),
            chat_completions: "/v1/chat/completions".to_string(),
            health: "/health".to_string(),
        },
    }));
}

async fn stream_message(
    res: &mut Response,
    state: &'static AppState,
    openai_request: &OpenAiChatRequest,
    requested_model: String,
) {
    let upstream_response = match state.upstream.chat_completion_stream(openai_request).await {
        Ok(value) => value,
        Err(error) => {
            upstream_failed(res, error);
            return;
        }
    };

    set_sse_headers(res);
    let mut writer = ClaudeSseWriter::new(res.channel());
    let cancel = state.shutdown.child_token();
    let options = state.config.stream_options();
    tokio::spawn(async move {
        let result = stream_openai_to_claude(
            &cancel,
            upstream_response.bytes_stream(),
            &mut writer,
            &requested_model,
            options,
        )
        .await;

        if let Some(message) = reportable_stream_error(result) {
            if let Err(error) = writer.send_error(&message).await {
                debug!(phase = "stream_error_event_failed", "Client went away: {error}");
            }
        }
    });
}

async fn stream_chat_completion(
    res: &mut Response,
    state: &'static AppState,
    claude_request: &ClaudeMessagesRequest,
    requested_model: String,
) {
    let upstream_response = match state.upstream.messages_stream(claude_request).await {
        Ok(value) => value,
        Err(error) => {
            upstream_failed(res, error);
            return;
        }
    };

    set_sse_headers(res);
    let mut writer = OpenAiSseWriter::new(res.channel());
    let cancel = state.shutdown.child_token();
    let options = state.config.stream_options();
    tokio::spawn(async move {
        let result = stream_claude_to_openai(
            &cancel,
            upstream_response.bytes_stream(),
            &mut writer,
            &requested_model,
            options,
        )
        .await;

        let client_gone = matches!(result, Err(StreamError::Sink(_)));
        if let Some(message) = reportable_stream_error(result) {
            if let Err(error) = writer.send_error(&message).await {
                debug!(phase = "stream_error_event_failed", "Client went away: {error}");
                return;
            }
        }
        if client_gone {
            return;
        }
        if let Err(error) = writer.finish().await {
            debug!(phase = "stream_done_failed", "Client went away before [DONE]: {error}");
        }
    });
}

fn reportable_stream_error(result: Result<(), StreamError>) -> Option<String> {
    match result {
        Ok(()) => None,
        Err(StreamError::Sink(error)) => {
            debug!(phase = "stream_client_gone", "Downstream client disconnected: {error}");
            None
        }
        Err(StreamError::Cancelled) => {
            info!(phase = "stream_cancelled", "Stream translation cancelled by shutdown");
            None
        }
        Err(error @ StreamError::Read(_)) => {
            error!(phase = "stream_read_failed", "Upstream stream failed: {error}");
            Some(error.to_string())
        }
    }
}

fn no_stream_requested(req: &Request, state: &AppState) -> bool {
    if state.config.no_stream {
        return true;
    }
    if req
        .header::<String>(NO_STREAM_HEADER)
        .is_some_and(|value| is_truthy(&value))
    {
        return true;
    }
    NO_STREAM_QUERY_KEYS.iter().any(|key| {
        req.query::<String>(key)
            .is_some_and(|value| is_truthy(&value))
    })
}

async fn parse_json_body<T: DeserializeOwned>(
    req: &mut Request,
    res: &mut Response,
    max_size: usize,
) -> Option<T> {
    match req.parse_json_with_max_size::<T>(max_size).await {
        Ok(value) => Some(value),
        Err(error) => {
            bad_request(res, &format!("invalid request body: {error}"));
            None
        }
    }
}

fn require_state(res: &mut Response) -> Option<&'static AppState> {
    let state = app_state();
    if state.is_none() {
        error!(phase = "state_missing", "Application state is not initialized");
        res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
        res.render(Json(DetailResponse {
            detail: "server not initialized".to_string(),
        }));
    }
    state
}

fn set_sse_headers(res: &mut Response) {
    res.status_code(StatusCode::OK);
    let _ = res.add_header("Cache-Control", "no-cache", true);
    let _ = res.add_header("Connection", "keep-alive", true);
    let _ = res.add_header("Access-Control-Allow-Origin", "*", true);
    let _ = res.add_header("Content-Type", "text/event-stream; charset=utf-8", true);
}

fn bad_request(res: &mut Response, message: &str) {
    warn!(phase = "bad_request", "Rejecting request: {message}");
    res.status_code(StatusCode::BAD_REQUEST);
    res.render(Json(DetailResponse {
        detail: message.to_string(),
    }));
}

fn upstream_failed(res: &mut Response, error: UpstreamError) {
    error!(phase = "upstream_failed", "Upstream error: {}", error.message);
    res.status_code(error.status);
    res.render(Json(DetailResponse {
        detail: error.message,
    }));
}

#[derive(Debug, Serialize)]
struct DetailResponse {
    detail: String,
}

#[derive(Debug, Serialize)]
struct RootResponse {
    message: String,
    status: String,
    config: RootConfig,
    endpoints: RootEndpoints,
}

#[derive(Debug, Serialize)]
struct RootConfig {
    openai_base_url: String,
    openai_api_key_configured: bool,
    anthropic_base_url: String,
    anthropic_api_key_configured: bool,
    default_openai_model: String,
    mapped_models: usize,
}

#[derive(Debug, Serialize)]
struct RootEndpoints {
    messages: String,
    chat_completions: String,
    health: String,
}
