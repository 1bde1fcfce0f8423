//! WebSocket transport.
//!
//! Connects to the events path with the `ws`/`wss` scheme and treats every
//! text frame as one payload.  The socket is only read from; the judge never
//! expects client messages.

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::debug;
use url::Url;

use crate::transport::{EventTransport, RawEventStream, StreamTarget, TransportError, endpoint};

/// [`EventTransport`] over a WebSocket.
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    base_url: Url,
}

impl WebSocketTransport {
    /// `base_url` may use either the `http(s)` or the `ws(s)` scheme.
    pub fn new(base_url: Url) -> Self {
        Self { base_url }
    }

    fn socket_url(&self, target: &StreamTarget) -> Result<Url, TransportError> {
        let mut url = endpoint(&self.base_url, &target.events_path())?;
        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            _ => "ws",
        };
        url.set_scheme(scheme).map_err(|()| {
            TransportError::Connection(format!("cannot use {scheme} scheme for {url}"))
        })?;
        Ok(url)
    }
}

fn handshake_error(err: WsError) -> TransportError {
    match err {
        WsError::Http(resp) => {
            let status = resp.status();
            if status.as_u16() == 401 || status.as_u16() == 403 {
                TransportError::Unauthorized {
                    status: status.as_u16(),
                }
            } else {
                TransportError::Rejected {
                    status: status.as_u16(),
                    body: String::new(),
                }
            }
        }
        other => TransportError::Connection(other.to_string()),
    }
}

#[async_trait]
impl EventTransport for WebSocketTransport {
    async fn open(&self, target: &StreamTarget) -> Result<RawEventStream, TransportError> {
        let url = self.socket_url(target)?;
        debug!(%url, submission_id = %target.submission_id, "Opening WebSocket stream");

        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        let auth = HeaderValue::from_str(&target.token.header_value())
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        request.headers_mut().insert(AUTHORIZATION, auth);

        let (socket, _) = connect_async(request).await.map_err(handshake_error)?;

        let events = stream::unfold(socket, |mut socket| async move {
            loop {
                match socket.next().await? {
                    Ok(Message::Text(text)) => return Some((Ok(text), socket)),
                    // Not valid JSON either way; let the channel report it.
                    Ok(Message::Binary(bytes)) => {
                        let text = String::from_utf8_lossy(&bytes).into_owned();
                        return Some((Ok(text), socket));
                    }
                    Ok(Message::Close(_)) => return None,
                    Ok(_) => continue,
                    Err(e) => {
                        let err = TransportError::Connection(e.to_string());
                        return Some((Err(err), socket));
                    }
                }
            }
        });
        Ok(events.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthToken;
    use crate::objects::{SubmissionId, UserId};
    use axum::Router;
    use axum::extract::ws::{Message as AxumMessage, WebSocketUpgrade};
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;

    async fn events_handler(headers: HeaderMap, ws: WebSocketUpgrade) -> Response {
        let authorized = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == "Bearer good");
        if !authorized {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        ws.on_upgrade(|mut socket| async move {
            let _ = socket
                .send(AxumMessage::Text(r#"{"status":"connected"}"#.into()))
                .await;
            let _ = socket
                .send(AxumMessage::Text(r#"{"status":"running","result":"judging"}"#.into()))
                .await;
            let _ = socket.send(AxumMessage::Close(None)).await;
        })
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

    #[test]
    fn test_socket_url_maps_scheme() {
        let transport = WebSocketTransport::new(Url::parse("https://oj.example.com").unwrap());
        let url = transport.socket_url(&target("t")).unwrap();
        assert_eq!(url.as_str(), "wss://oj.example.com/submission/U1/S1/events");

        let prefixed = Url::parse("http://oj.example.com/backend").unwrap();
        let transport = WebSocketTransport::new(prefixed);
        let url = transport.socket_url(&target("t")).unwrap();
        assert_eq!(url.as_str(), "ws://oj.example.com/backend/submission/U1/S1/events");
    }

    #[tokio::test]
    async fn test_open_reads_text_frames_until_close() {
        let transport = WebSocketTransport::new(spawn_backend().await);
        let stream = transport.open(&target("good")).await.unwrap();
        let payloads: Vec<_> = stream.collect().await;
        assert_eq!(
            payloads,
            vec![
                Ok(r#"{"status":"connected"}"#.to_owned()),
                Ok(r#"{"status":"running","result":"judging"}"#.to_owned()),
            ]
        );
    }

    #[tokio::test]
    async fn test_open_with_rejected_token() {
        let transport = WebSocketTransport::new(spawn_backend().await);
        let err = match transport.open(&target("bad")).await {
            Ok(_) => panic!("socket opened with a rejected token"),
            Err(e) => e,
        };
        assert_eq!(err, TransportError::Unauthorized { status: 401 });
    }
}
