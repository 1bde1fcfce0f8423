//! Server-sent events transport.
//!
//! Subscribes with `GET /submission/{user_id}/{submission_id}/events` and
//! decodes the `text/event-stream` body incrementally.  Only the `data`
//! field matters to the judge protocol; `event`, `id`, `retry` and comment
//! lines are skipped.

use std::collections::VecDeque;

use async_trait::async_trait;
use bytes::BytesMut;
use futures_util::StreamExt;
use futures_util::stream;
use reqwest::Client;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use tracing::debug;
use url::Url;

use super::check_stream_response;
use crate::transport::{EventTransport, RawEventStream, StreamTarget, TransportError, endpoint};

/// Longest line the decoder buffers before giving up on the stream.
pub const MAX_LINE_LEN: usize = 4 * 1024 * 1024;

/// Incremental `text/event-stream` decoder.
///
/// Feed raw body chunks with [`push`](Self::push) and drain complete event
/// payloads with [`next_event`](Self::next_event).  Chunks may split lines
/// (and UTF-8 sequences) anywhere.  Lines end with `\n`, `\r\n` or a bare
/// `\r`.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: BytesMut,
    // Bytes of `buffer` already known to hold no line terminator.
    scanned: usize,
    // The previous chunk ended in `\r`; a leading `\n` belongs to it.
    skip_lf: bool,
    data: String,
    has_data: bool,
    ready: VecDeque<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a body chunk.  Fails once a single line grows past
    /// [`MAX_LINE_LEN`]; the partial line is discarded.
    pub fn push(&mut self, chunk: &[u8]) -> Result<(), TransportError> {
        if chunk.is_empty() {
            return Ok(());
        }
        let chunk = match chunk {
            [b'\n', rest @ ..] if std::mem::take(&mut self.skip_lf) => rest,
            _ => {
                self.skip_lf = false;
                chunk
            }
        };
        self.buffer.extend_from_slice(chunk);

        loop {
            let Some(offset) = self.buffer[self.scanned..]
                .iter()
                .position(|b| matches!(b, b'\n' | b'\r'))
            else {
                self.scanned = self.buffer.len();
                break;
            };
            let end = self.scanned + offset;
            let mut consumed = end + 1;
            if self.buffer[end] == b'\r' {
                match self.buffer.get(end + 1) {
                    Some(b'\n') => consumed += 1,
                    Some(_) => {}
                    None => self.skip_lf = true,
                }
            }
            let line = self.buffer.split_to(consumed);
            self.scanned = 0;
            self.process_line(&line[..end]);
        }

        if self.buffer.len() > MAX_LINE_LEN {
            self.buffer.clear();
            self.scanned = 0;
            return Err(TransportError::Connection(format!(
                "event stream line longer than {MAX_LINE_LEN} bytes"
            )));
        }
        Ok(())
    }

    /// Next complete event payload, if any.
    pub fn next_event(&mut self) -> Option<String> {
        self.ready.pop_front()
    }

    fn process_line(&mut self, line: &[u8]) {
        if line.is_empty() {
            self.dispatch();
            return;
        }
        if line[0] == b':' {
            return;
        }
        let (field, value) = match line.iter().position(|b| *b == b':') {
            Some(i) => {
                let value = &line[i + 1..];
                (&line[..i], value.strip_prefix(b" ").unwrap_or(value))
            }
            None => (line, &[][..]),
        };
        if field == b"data" {
            if self.has_data {
                self.data.push('\n');
            }
            self.data.push_str(&String::from_utf8_lossy(value));
            self.has_data = true;
        }
    }

    fn dispatch(&mut self) {
        if self.has_data && !self.data.is_empty() {
            self.ready.push_back(std::mem::take(&mut self.data));
        }
        self.data.clear();
        self.has_data = false;
    }
}

/// [`EventTransport`] over server-sent events.
#[derive(Debug, Clone)]
pub struct SseTransport {
    http: Client,
    base_url: Url,
}

impl SseTransport {
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    /// Replace the default `reqwest::Client`.  The client must not set a
    /// total request timeout, or long judge runs will be cut off.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }
}

#[async_trait]
impl EventTransport for SseTransport {
    async fn open(&self, target: &StreamTarget) -> Result<RawEventStream, TransportError> {
        let url = endpoint(&self.base_url, &target.events_path())?;
        debug!(%url, submission_id = %target.submission_id, "Opening SSE stream");

        let resp = self
            .http
            .get(url)
            .bearer_auth(target.token.expose())
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        let resp = check_stream_response(resp).await?;

        let body = resp.bytes_stream().boxed();
        let events = stream::unfold(
            (body, SseDecoder::new()),
            |(mut body, mut decoder)| async move {
                loop {
                    if let Some(payload) = decoder.next_event() {
                        return Some((Ok(payload), (body, decoder)));
                    }
                    match body.next().await {
                        Some(Ok(chunk)) => {
                            if let Err(err) = decoder.push(&chunk) {
                                return Some((Err(err), (body, decoder)));
                            }
                        }
                        Some(Err(e)) => {
                            let err = TransportError::Connection(e.to_string());
                            return Some((Err(err), (body, decoder)));
                        }
                        // A trailing event without its blank line is dropped.
                        None => return None,
                    }
                }
            },
        );
        Ok(events.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthToken;
    use crate::objects::{SubmissionId, UserId};
    use axum::Router;
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
    use axum::response::sse::{Event, Sse};
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use std::convert::Infallible;

    fn drain(decoder: &mut SseDecoder) -> Vec<String> {
        std::iter::from_fn(|| decoder.next_event()).collect()
    }

    #[test]
    fn test_decode_events_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        decoder.push(b"data: {\"status\":").unwrap();
        assert!(drain(&mut decoder).is_empty());
        decoder.push(b"\"connected\"}\n").unwrap();
        assert!(drain(&mut decoder).is_empty());
        decoder.push(b"\ndata: second\n\n").unwrap();
        assert_eq!(
            drain(&mut decoder),
            ["{\"status\":\"connected\"}", "second"]
        );
    }

    #[test]
    fn test_decode_multiline_data_and_crlf() {
        let mut decoder = SseDecoder::new();
        decoder.push(b"data: line one\r\ndata:line two\r\n\r\n").unwrap();
        assert_eq!(drain(&mut decoder), ["line one\nline two"]);
    }

    #[test]
    fn test_decode_ignores_comments_and_other_fields() {
        let mut decoder = SseDecoder::new();
        decoder.push(b": keep-alive\n\nevent: update\nid: 7\nretry: 1000\ndata: x\n\n").unwrap();
        assert_eq!(drain(&mut decoder), ["x"]);
    }

    #[test]
    fn test_decode_skips_empty_events() {
        let mut decoder = SseDecoder::new();
        decoder.push(b"data:\n\nevent: ping\n\n").unwrap();
        assert!(drain(&mut decoder).is_empty());
    }

    #[test]
    fn test_decode_handles_split_utf8() {
        let mut decoder = SseDecoder::new();
        let bytes = "data: héllo\n\n".as_bytes();
        let (a, b) = bytes.split_at(8);
        decoder.push(a).unwrap();
        decoder.push(b).unwrap();
        assert_eq!(drain(&mut decoder), ["héllo"]);
    }

    #[test]
    fn test_decode_bare_cr_line_endings() {
        let mut decoder = SseDecoder::new();
        decoder.push(b"data: one\r\rdata: two\r").unwrap();
        assert_eq!(drain(&mut decoder), ["one"]);
        // The CR ended the line; a following LF is part of the same ending.
        decoder.push(b"\n\r").unwrap();
        assert_eq!(drain(&mut decoder), ["two"]);
    }

    #[test]
    fn test_decode_long_line_over_many_chunks() {
        let mut decoder = SseDecoder::new();
        decoder.push(b"data: ").unwrap();
        for _ in 0..10_000 {
            decoder.push(b"xxxxxxxxxx").unwrap();
        }
        decoder.push(b"\n\n").unwrap();
        let events = drain(&mut decoder);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].len(), 100_000);
    }

    #[test]
    fn test_decode_rejects_oversized_line() {
        let mut decoder = SseDecoder::new();
        let chunk = vec![b'x'; 1024 * 1024];
        let mut result = Ok(());
        for _ in 0..5 {
            result = decoder.push(&chunk);
            if result.is_err() {
                break;
            }
        }
        assert!(matches!(result, Err(TransportError::Connection(_))));
        // The decoder recovers at the next line.
        decoder.push(b"\ndata: ok\n\n").unwrap();
        assert_eq!(drain(&mut decoder), ["ok"]);
    }

    async fn events_handler(
        Path((_user_id, submission_id)): Path<(String, String)>,
        headers: HeaderMap,
    ) -> Response {
        let authorized = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == "Bearer good");
        if !authorized {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        let events = vec![
            Ok::<_, Infallible>(Event::default().data(r#"{"status":"connected"}"#)),
            Ok(Event::default().comment("keep-alive")),
            Ok(Event::default().data(format!(
                r#"{{"submission_id":"{submission_id}","status":"completed","result":"AC","score":100}}"#
            ))),
        ];
        Sse::new(futures_util::stream::iter(events)).into_response()
    }

    async fn spawn_backend() -> Url {
        let app = Router::new().route(
            "/submission/{user_id}/{submission_id}/events",
            get(events_handler),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{addr}")).unwrap()
    }

    fn target(token: &str) -> StreamTarget {
        StreamTarget::new(UserId::from("U1"), SubmissionId::from("S1"), AuthToken::new(token))
    }

    #[tokio::test]
    async fn test_open_streams_payloads_then_ends() {
        let transport = SseTransport::new(spawn_backend().await);
        let stream = transport.open(&target("good")).await.unwrap();
        let payloads: Vec<_> = stream.collect().await;
        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[0].as_deref(), Ok(r#"{"status":"connected"}"#));
        assert!(payloads[1].as_ref().unwrap().contains(r#""result":"AC""#));
        assert!(payloads[1].as_ref().unwrap().contains(r#""submission_id":"S1""#));
    }

    #[tokio::test]
    async fn test_open_with_rejected_token() {
        let transport = SseTransport::new(spawn_backend().await);
        let err = match transport.open(&target("bad")).await {
            Ok(_) => panic!("stream opened with a rejected token"),
            Err(e) => e,
        };
        assert_eq!(err, TransportError::Unauthorized { status: 401 });
    }
}
