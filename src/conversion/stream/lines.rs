use std::fmt::Display;
use std::pin::Pin;

use futures_util::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::errors::StreamError;

pub struct LineReader<S> {
    body: Pin<Box<S>>,
    buffer: Vec<u8>,
    exhausted: bool,
}

impl<S, B, E> LineReader<S>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    pub fn new(body: S) -> Self {
        Self {
            body: Box::pin(body),
            buffer: Vec::new(),
            exhausted: false,
        }
    }

    pub async fn next_line(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, StreamError> {
        loop {
            if cancel.is_cancelled() {
                return Err(StreamError::Cancelled);
            }

            if let Some(newline_index) = self.buffer.iter().position(|byte| *byte == b'\n') {
                let line: Vec<u8> = self.buffer.drain(..=newline_index).collect();
                return Ok(Some(decode_line(&line)));
            }

            if self.exhausted {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                let line = std::mem::take(&mut self.buffer);
                return Ok(Some(decode_line(&line)));
            }

            let next_chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(StreamError::Cancelled),
                next_chunk = self.body.next() => next_chunk,
            };

            match next_chunk {
                Some(Ok(chunk)) => self.buffer.extend_from_slice(chunk.as_ref()),
                Some(Err(error)) => return Err(StreamError::Read(error.to_string())),
                None => self.exhausted = true,
            }
        }
    }
}

fn decode_line(raw: &[u8]) -> String {
    let line = raw.strip_suffix(b"\n").unwrap_or(raw);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}

#[cfg(test)]
mod tests {
    use futures_util::stream;
    use tokio_util::sync::CancellationToken;

    use super::LineReader;
    use crate::errors::StreamError;

    async fn collect_lines(chunks: Vec<Vec<u8>>) -> Vec<String> {
        let body = stream::iter(chunks.into_iter().map(Ok::<_, String>));
        let mut reader = LineReader::new(body);
        let cancel = CancellationToken::new();
        let mut lines = Vec::new();
        while let Some(line) = reader.next_line(&cancel).await.expect("line") {
            lines.push(line);
        }
        lines
    }

    #[tokio::test]
    async fn joins_lines_across_chunks() {
        let lines = collect_lines(vec![
            b"data: {\"a\"".to_vec(),
            b":1}\r\n\ndata: [DO".to_vec(),
            b"NE]\n".to_vec(),
        ])
        .await;
        assert_eq!(lines, vec!["data: {\"a\":1}", "", "data: [DONE]"]);
    }

    #[tokio::test]
    async fn keeps_multibyte_characters_split_across_chunks() {
        let text = "héllo\n".as_bytes();
        let (head, tail) = text.split_at(2);

        let lines = collect_lines(vec![head.to_vec(), tail.to_vec()]).await;
        assert_eq!(lines, vec!["héllo"]);
    }

    #[tokio::test]
    async fn returns_trailing_line_without_newline() {
        let lines = collect_lines(vec![b"first\nsecond".to_vec()]).await;
        assert_eq!(lines, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn read_errors_surface_as_stream_errors() {
        let body = stream::iter(vec![
            Ok::<Vec<u8>, String>(b"partial".to_vec()),
            Err("connection reset".to_string()),
        ]);
        let mut reader = LineReader::new(body);
        let cancel = CancellationToken::new();

        let error = reader.next_line(&cancel).await.expect_err("should fail");
        assert!(matches!(error, StreamError::Read(message) if message == "connection reset"));
    }

    #[tokio::test]
    async fn cancelled_token_stops_reading() {
        let body = stream::iter(vec![Ok::<Vec<u8>, String>(b"data: x\n".to_vec())]);
        let mut reader = LineReader::new(body);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let error = reader.next_line(&cancel).await.expect_err("should cancel");
        assert!(matches!(error, StreamError::Cancelled));
    }
}
