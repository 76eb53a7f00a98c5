use std::future::Future;
use std::io;

use serde::Serialize;
use tracing::debug;

use super::StreamOptions;
use crate::utils::preview;

const EVENT_PREVIEW_BYTES: usize = 256;

pub trait EventSink<T> {
    fn emit(&mut self, item: T) -> impl Future<Output = io::Result<()>> + Send;
}

impl<T: Send> EventSink<T> for Vec<T> {
    fn emit(&mut self, item: T) -> impl Future<Output = io::Result<()>> + Send {
        self.push(item);
        std::future::ready(Ok(()))
    }
}

pub(super) async fn emit_event<T, K>(
    sink: &mut K,
    item: T,
    options: StreamOptions,
) -> io::Result<()>
where
    T: Serialize,
    K: EventSink<T>,
{
    if options.log_events {
        let payload = serde_json::to_string(&item).unwrap_or_default();
        debug!(
            phase = "stream_emit",
            payload = %preview(&payload, EVENT_PREVIEW_BYTES),
            "Emitting translated stream event"
        );
    }
    sink.emit(item).await
}
