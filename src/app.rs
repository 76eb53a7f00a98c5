use dotenvy::dotenv;
use salvo::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::handlers;
use crate::state::{AppState, set_app_state};
use crate::upstream::UpstreamClient;
use crate::utils::init_tracing;

pub async fn run() {
    let _ = dotenv();
    let config = load_config_or_exit();
    let _log_guard = init_tracing(&config.log_level, config.log_file.as_deref());
    warn_if_keys_missing(&config);

    let upstream = build_upstream_or_exit(config.clone());
    let shutdown = CancellationToken::new();
    if let Err(error) = set_app_state(AppState {
        config: config.clone(),
        upstream,
        shutdown: shutdown.clone(),
    }) {
        eprintln!("Initialization Error: {error}");
        std::process::exit(1);
    }

    info!(
        phase = "startup",
        openai_base_url = %config.openai_base_url,
        anthropic_base_url = %config.anthropic_base_url,
        mapped_models = config.model_map.len(),
        "Claude/OpenAI adapter starting on {}:{}",
        config.host,
        config.port
    );

    let acceptor = TcpListener::new((config.host.as_str(), config.port)).bind().await;
    let server = Server::new(acceptor);
    let handle = server.handle();
    tokio::spawn(async move {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for shutdown signal: {error}");
            return;
        }
        info!(phase = "shutdown", "Shutdown requested, closing open streams");
        shutdown.cancel();
        handle.stop_graceful(None);
    });

    server.serve(handlers::router()).await;
}

fn load_config_or_exit() -> Config {
    match Config::load() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("Configuration Error: {error}");
            std::process::exit(1);
        }
    }
}

fn warn_if_keys_missing(config: &Config) {
    if config.openai_api_key.is_none() {
        warn!("OPENAI_API_KEY not set. Requests to the Chat Completions upstream carry no credentials.");
    }
    if config.anthropic_api_key.is_none() {
        warn!("ANTHROPIC_API_KEY not set. Requests to the Messages upstream carry no credentials.");
    }
}

fn build_upstream_or_exit(config: Config) -> UpstreamClient {
    match UpstreamClient::new(config) {
        Ok(upstream) => upstream,
        Err(error) => {
            eprintln!("Initialization Error: {error}");
            std::process::exit(1);
        }
    }
}
