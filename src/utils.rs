use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use uuid::Uuid;

/// Installs the global subscriber. With a log file configured, output also
/// goes to a daily rolling file; the returned guard must outlive the server.
pub fn init_tracing(log_level: &str, log_file: Option<&str>) -> Option<WorkerGuard> {
    let normalized = log_level
        .split_whitespace()
        .next()
        .unwrap_or("info")
        .to_lowercase();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(normalized));

    let Some(log_file) = log_file else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return None;
    };

    let path = Path::new(log_file);
    let directory = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "adapter.log".to_string());

    let file_appender = tracing_appender::rolling::daily(directory, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(std::io::stdout.and(file_writer))
        .init();
    Some(guard)
}

pub fn message_id() -> String {
    format!(
        "msg_{}",
        Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(24)
            .collect::<String>()
    )
}

pub fn chunk_id() -> String {
    format!("chatcmpl-{}", Uuid::new_v4().simple())
}

pub fn preview(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}
