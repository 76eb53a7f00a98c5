use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::conversion::StreamOptions;

const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub openai_base_url: String,
    pub openai_api_key: Option<String>,
    pub anthropic_base_url: String,
    pub anthropic_api_key: Option<String>,
    pub anthropic_version: String,
    pub model_map: ModelMap,
    pub default_openai_model: String,
    pub log_level: String,
    pub log_file: Option<String>,
    pub log_events: bool,
    pub no_stream: bool,
    pub request_timeout: u64,
    pub request_body_max_size: usize,
}

#[derive(Debug, Default, Deserialize)]
struct TomlConfigRaw {
    host: Option<String>,
    port: Option<u16>,
    openai_base_url: Option<String>,
    openai_api_key: Option<String>,
    anthropic_base_url: Option<String>,
    anthropic_api_key: Option<String>,
    anthropic_version: Option<String>,
    model_map: Option<HashMap<String, String>>,
    openai_model: Option<String>,
    log_level: Option<String>,
    log_file: Option<String>,
    log_events: Option<bool>,
    no_stream: Option<bool>,
    request_timeout: Option<u64>,
    request_body_max_size: Option<usize>,
}

impl Config {
    pub fn load() -> Result<Self, String> {
        let toml_config = read_toml_config("config.toml")?.unwrap_or_default();
        Ok(Self::from_sources(
            |key| env::var(key).ok().filter(|value| !value.trim().is_empty()),
            toml_config,
        ))
    }

    fn from_sources(lookup: impl Fn(&str) -> Option<String>, toml_config: TomlConfigRaw) -> Self {
        let host = lookup("HOST")
            .or(toml_config.host)
            .unwrap_or_else(|| "0.0.0.0".to_string());

        let port = parse_with_fallback(
            lookup("ADAPTER_LISTEN").or_else(|| lookup("PORT")),
            toml_config.port.unwrap_or(8080),
        );

        let openai_base_url = lookup("OPENAI_BASE_URL")
            .or(toml_config.openai_base_url)
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string());
        let openai_api_key = lookup("OPENAI_API_KEY").or(toml_config.openai_api_key);

        let anthropic_base_url = lookup("ANTHROPIC_BASE_URL")
            .or(toml_config.anthropic_base_url)
            .unwrap_or_else(|| "https://api.anthropic.com".to_string());
        let anthropic_api_key = lookup("ANTHROPIC_API_KEY").or(toml_config.anthropic_api_key);
        let anthropic_version = lookup("ANTHROPIC_VERSION")
            .or(toml_config.anthropic_version)
            .unwrap_or_else(|| DEFAULT_ANTHROPIC_VERSION.to_string());

        let mut model_map = ModelMap::from_table(toml_config.model_map.unwrap_or_default());
        if let Some(raw_map) = lookup("MODEL_MAP") {
            model_map.extend(ModelMap::parse(&raw_map));
        }
        let default_openai_model = lookup("OPENAI_MODEL")
            .or(toml_config.openai_model)
            .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());

        let log_level = lookup("ADAPTER_LOG_LEVEL")
            .or(toml_config.log_level)
            .unwrap_or_else(|| "info".to_string());
        let log_file = lookup("ADAPTER_LOG_FILE")
            .or(toml_config.log_file)
            .map(|path| path.trim().to_string())
            .filter(|path| !path.is_empty() && path != "-");
        let log_events = bool_with_fallback(
            lookup("ADAPTER_LOG_EVENTS"),
            toml_config.log_events.unwrap_or(false),
        );
        let no_stream = bool_with_fallback(
            lookup("ADAPTER_NO_STREAM"),
            toml_config.no_stream.unwrap_or(false),
        );

        let request_timeout = parse_with_fallback(
            lookup("REQUEST_TIMEOUT"),
            toml_config.request_timeout.unwrap_or(90),
        );
        let request_body_max_size = parse_with_fallback(
            lookup("REQUEST_BODY_MAX_SIZE"),
            toml_config
                .request_body_max_size
                .unwrap_or(16 * 1024 * 1024),
        );

        Self {
            host,
            port,
            openai_base_url,
            openai_api_key,
            anthropic_base_url,
            anthropic_api_key,
            anthropic_version,
            model_map,
            default_openai_model,
            log_level,
            log_file,
            log_events,
            no_stream,
            request_timeout,
            request_body_max_size,
        }
    }

    pub fn map_model(&self, claude_model: &str) -> String {
        self.model_map
            .get(claude_model)
            .unwrap_or(&self.default_openai_model)
            .to_string()
    }

    pub fn stream_options(&self) -> StreamOptions {
        let verbose = matches!(
            self.log_level.trim().to_ascii_lowercase().as_str(),
            "debug" | "trace"
        );
        StreamOptions {
            log_events: self.log_events && verbose,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModelMap {
    entries: HashMap<String, String>,
}

impl ModelMap {
    pub fn parse(raw: &str) -> Self {
        let entries = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_once('='))
            .map(|(source, target)| (source.trim().to_string(), target.trim().to_string()))
            .filter(|(source, target)| !source.is_empty() && !target.is_empty())
            .collect();
        Self { entries }
    }

    fn from_table(table: HashMap<String, String>) -> Self {
        Self { entries: table }
    }

    fn extend(&mut self, other: ModelMap) {
        self.entries.extend(other.entries);
    }

    pub fn get(&self, source: &str) -> Option<&String> {
        self.entries.get(source)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

fn read_toml_config(path: &str) -> Result<Option<TomlConfigRaw>, String> {
    let config_path = Path::new(path);

    if !config_path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(config_path)
        .map_err(|error| format!("Failed to read {}: {}", config_path.display(), error))?;

    let parsed = toml::from_str::<TomlConfigRaw>(&content)
        .map_err(|error| format!("Failed to parse {}: {}", config_path.display(), error))?;

    Ok(Some(parsed))
}

fn parse_with_fallback<T: std::str::FromStr>(value: Option<String>, fallback: T) -> T {
    value
        .and_then(|value| value.trim().parse::<T>().ok())
        .unwrap_or(fallback)
}

fn bool_with_fallback(value: Option<String>, fallback: bool) -> bool {
    value
        .map(|value| crate::utils::is_truthy(&value))
        .unwrap_or(fallback)
}
